//! 周期边界 (wrap) 的可分离高斯滤波.

use crate::consts::GAUSSIAN_TRUNCATE;
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis, Zip};

/// 构建一维高斯核, 半径为 `round(GAUSSIAN_TRUNCATE * sigma)`, 权重之和为 1.
pub(crate) fn gaussian_kernel_1d(sigma: f64) -> Vec<f64> {
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as isize;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|x| (-((x * x) as f64) / denom).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// 对一条一维 lane 做周期边界的相关运算.
///
/// 核的半径可以超过 lane 长度, 此时索引会绕回多圈.
fn correlate_lane_wrap(src: ArrayView1<f64>, kernel: &[f64], mut dst: ArrayViewMut1<f64>) {
    let n = src.len() as isize;
    let radius = (kernel.len() / 2) as isize;
    for (i, out) in dst.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (k, &w) in kernel.iter().enumerate() {
            let idx = (i as isize + k as isize - radius).rem_euclid(n);
            acc += w * src[idx as usize];
        }
        *out = acc;
    }
}

/// 沿 `axis` 方向对每条 lane 做一维滤波.
fn filter_axis(image: ArrayView2<f64>, kernel: &[f64], axis: Axis) -> Array2<f64> {
    let mut out = Array2::zeros(image.raw_dim());
    let zip = Zip::from(image.lanes(axis)).and(out.lanes_mut(axis));

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            zip.par_for_each(|src, dst| correlate_lane_wrap(src, kernel, dst));
        } else {
            zip.for_each(|src, dst| correlate_lane_wrap(src, kernel, dst));
        }
    }
    out
}

/// 对二维图像做标准差为 `sigma` (单位: 像素) 的高斯平滑, 边界按周期延拓处理.
///
/// 由调用者保证 `sigma` 为正有限值且图像非空.
pub(crate) fn gaussian_filter_wrap(image: ArrayView2<f64>, sigma: f64) -> Array2<f64> {
    let kernel = gaussian_kernel_1d(sigma);
    let rows_done = filter_axis(image, &kernel, Axis(1));
    filter_axis(rows_done.view(), &kernel, Axis(0))
}
