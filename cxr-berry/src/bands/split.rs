use super::gaussian::gaussian_filter_wrap;
use crate::{Idx2d, NormError, NormResult};
use ndarray::{Array2, ArrayView2};
use std::ops::Index;

/// 多尺度能量带.
///
/// 共 `sigmas.len() + 1` 个与源图像同形状的能量带. 索引 0 为最平滑
/// (最低频) 的残差, 最后一个为最精细的细节带.
#[derive(Clone, Debug)]
pub struct EnergyBands {
    bands: Vec<Array2<f64>>,
}

impl EnergyBands {
    /// 直接初始化. `bands` 必须非空且形状一致, 否则返回 `Err`.
    pub fn from_bands(bands: Vec<Array2<f64>>) -> NormResult<Self> {
        let first = bands.first().ok_or(NormError::BandShapeMismatch)?;
        let dim = first.dim();
        if bands.iter().any(|b| b.dim() != dim) {
            return Err(NormError::BandShapeMismatch);
        }
        Ok(Self { bands })
    }

    /// 能量带个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    /// 是否不含任何能量带. 经由公开接口构造的实例总是返回 `false`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// 每个能量带的形状 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.bands[0].dim()
    }

    /// 依次迭代各能量带.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Array2<f64>> {
        self.bands.iter()
    }

    /// 逐元素求和. 对任意合法 sigma 序列, 结果与源图像相等 (在浮点误差内).
    pub fn sum(&self) -> Array2<f64> {
        let mut acc = Array2::zeros(self.bands[0].raw_dim());
        for b in self.bands.iter() {
            acc += b;
        }
        acc
    }

    /// 取出底层数据.
    #[inline]
    pub(crate) fn into_inner(self) -> Vec<Array2<f64>> {
        self.bands
    }
}

impl Index<usize> for EnergyBands {
    type Output = Array2<f64>;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.bands[index]
    }
}

/// 检查 sigma 序列: 非空, 每项为正有限值, 严格递增.
pub(crate) fn check_sigmas(sigmas: &[f64]) -> NormResult<()> {
    if sigmas.is_empty() {
        return Err(NormError::EmptySigmas);
    }
    let mut prev = 0.0;
    for &s in sigmas {
        if !s.is_finite() || s <= prev {
            return Err(NormError::InvalidSigma(s));
        }
        prev = s;
    }
    Ok(())
}

/// 将图像分解为多尺度能量带.
///
/// 依次以 `sigmas` 中的每个值对当前图像做周期边界高斯平滑, 平滑前后之差即为该尺度的能量带;
/// 最后一次平滑后的图像作为额外的最低频能量带. 返回前将顺序反转,
/// 使最低频能量带位于索引 0, 最精细的能量带 (sigma 最小) 位于末尾.
///
/// `sigmas` 须非空且严格递增, 否则返回 `Err`. 图像为空时同样返回 `Err`.
pub fn split_energy_bands(image: ArrayView2<f64>, sigmas: &[f64]) -> NormResult<EnergyBands> {
    check_sigmas(sigmas)?;
    if image.is_empty() {
        return Err(NormError::EmptyImage);
    }

    let mut bands = Vec::with_capacity(sigmas.len() + 1);
    let mut current = image.to_owned();
    for &sigma in sigmas {
        let smoothed = gaussian_filter_wrap(current.view(), sigma);
        bands.push(&current - &smoothed);
        current = smoothed;
    }
    bands.push(current);
    bands.reverse();

    Ok(EnergyBands { bands })
}
