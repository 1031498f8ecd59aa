use super::{non_empty_shape, SizeChange, SizeChanges};
use crate::{Idx2d, NormError, NormResult, Spacing};
use ndarray::{s, Array2, ArrayView2};

/// 一维重采样的查找表项: (左邻索引, 右邻索引, 右邻权重).
type Tap = (usize, usize, f64);

/// 以像素中心对齐的方式, 为长度 `out_len` 的输出计算每个位置在长度 `in_len` 输入上的插值位置.
/// 超出输入范围的位置被截断到边缘像素.
fn taps(in_len: usize, out_len: usize) -> Vec<Tap> {
    let scale = in_len as f64 / out_len as f64;
    let last = (in_len - 1) as f64;
    (0..out_len)
        .map(|i| {
            let src = ((i as f64 + 0.5) * scale - 0.5).clamp(0.0, last);
            let i0 = src.floor() as usize;
            let i1 = (i0 + 1).min(in_len - 1);
            (i0, i1, src - i0 as f64)
        })
        .collect()
}

/// 双线性重采样到形状 `to`. 由调用者保证输入和输出均非空.
pub(super) fn resize_bilinear(image: ArrayView2<f64>, to: Idx2d) -> Array2<f64> {
    let (h, w) = image.dim();
    if (h, w) == to {
        return image.to_owned();
    }
    let rows = taps(h, to.0);
    let cols = taps(w, to.1);
    Array2::from_shape_fn(to, |(oh, ow)| {
        let (r0, r1, ty) = rows[oh];
        let (c0, c1, tx) = cols[ow];
        let top = image[(r0, c0)] * (1.0 - tx) + image[(r0, c1)] * tx;
        let bottom = image[(r1, c0)] * (1.0 - tx) + image[(r1, c1)] * tx;
        top * (1.0 - ty) + bottom * ty
    })
}

/// 在四周填充 0. `(top, bottom, left, right)` 为各边填充量.
pub(super) fn pad_zeros(
    image: ArrayView2<f64>,
    (top, bottom, left, right): (usize, usize, usize, usize),
) -> Array2<f64> {
    let (h, w) = image.dim();
    let mut out = Array2::zeros((h + top + bottom, w + left + right));
    out.slice_mut(s![top..top + h, left..left + w]).assign(&image);
    out
}

/// 保持宽高比时, 使长边等于 `long_edge` 的新形状. 短边四舍五入, 至少为 1.
fn aspect_shape((h, w): Idx2d, long_edge: usize) -> Idx2d {
    let scale = long_edge as f64 / h.max(w) as f64;
    let short = |len: usize| ((len as f64 * scale).round() as usize).max(1);
    if h >= w {
        (long_edge, short(w))
    } else {
        (short(h), long_edge)
    }
}

/// 保持宽高比缩放, 使长边等于 `target_long_edge`.
///
/// 像素间距按各方向的 `旧长度 / 新长度` 更新. 若 `pad` 为 `true`,
/// 则随后在短边两侧对称地填充 0 (多出的一个像素放在下侧 / 右侧) 得到正方形,
/// 并产生一条 [`SizeChange::ResizePad`] 记录; 否则产生一条 [`SizeChange::Resize`] 记录.
pub fn resize_preserve_aspect(
    image: ArrayView2<f64>,
    spacing: Spacing,
    target_long_edge: usize,
    pad: bool,
) -> NormResult<(Array2<f64>, Spacing, SizeChanges)> {
    let from = non_empty_shape(image)?;
    if target_long_edge == 0 {
        return Err(NormError::InvalidTargetSize(target_long_edge));
    }

    let resized = aspect_shape(from, target_long_edge);
    let new_spacing = spacing.resampled(from, resized);
    let out = resize_bilinear(image, resized);
    log::debug!("缩放: {from:?} -> {resized:?}, 填充: {pad}");

    if !pad {
        let changes = SizeChanges::from(vec![SizeChange::Resize { from, to: resized }]);
        return Ok((out, new_spacing, changes));
    }

    let (rh, rw) = resized;
    let (dh, dw) = (target_long_edge - rh, target_long_edge - rw);
    let (top, left) = (dh / 2, dw / 2);
    let (bottom, right) = (dh - top, dw - left);
    let padded = pad_zeros(out.view(), (top, bottom, left, right));
    let changes = SizeChanges::from(vec![SizeChange::ResizePad {
        from,
        resized,
        top,
        bottom,
        left,
        right,
    }]);
    Ok((padded, new_spacing, changes))
}

/// 缩放使长边等于 `size` (保持宽高比), 再对称填充为 `size x size` 的正方形.
#[inline]
pub fn resize_long_edge_and_pad_to_square(
    image: ArrayView2<f64>,
    spacing: Spacing,
    size: usize,
) -> NormResult<(Array2<f64>, Spacing, SizeChanges)> {
    resize_preserve_aspect(image, spacing, size, true)
}

#[cfg(test)]
mod tests {
    use super::{
        aspect_shape, resize_bilinear, resize_long_edge_and_pad_to_square, resize_preserve_aspect,
    };
    use crate::geometry::SizeChange;
    use crate::{NormError, Spacing};
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_aspect_shape() {
        assert_eq!(aspect_shape((3000, 2500), 2048), (2048, 1707));
        assert_eq!(aspect_shape((2500, 3000), 2048), (1707, 2048));
        assert_eq!(aspect_shape((100, 100), 256), (256, 256));
        assert_eq!(aspect_shape((1, 5000), 256), (1, 256));
    }

    #[test]
    fn test_bilinear_identity_and_constant() {
        let img = Array2::from_shape_fn((5, 7), |(h, w)| (h * 7 + w) as f64);
        assert_eq!(resize_bilinear(img.view(), (5, 7)), img);

        let flat = Array2::from_elem((9, 4), -2.5);
        let out = resize_bilinear(flat.view(), (20, 3));
        assert!(out.iter().all(|&v| (v + 2.5).abs() < 1e-12));
    }

    #[test]
    fn test_bilinear_upsample_ramp() {
        // 2 -> 4 的线性插值, 像素中心对齐且边缘截断.
        let img = array![[0.0, 4.0]];
        let out = resize_bilinear(img.view(), (1, 4));
        assert_eq!(out, array![[0.0, 1.0, 3.0, 4.0]]);
    }

    #[test]
    fn test_spacing_consistency() {
        let img = Array2::from_elem((300, 400), 1.0);
        let spacing = Spacing::new(0.2, 0.25).unwrap();
        let (out, new_spacing, changes) =
            resize_preserve_aspect(img.view(), spacing, 256, false).unwrap();
        assert_eq!(out.dim(), (192, 256));
        assert_relative_eq!(new_spacing.col(), 0.25 * (400.0 / 256.0), epsilon = 1e-12);
        assert_relative_eq!(new_spacing.row(), 0.2 * (300.0 / 192.0), epsilon = 1e-12);
        assert_eq!(
            changes.as_slice(),
            &[SizeChange::Resize {
                from: (300, 400),
                to: (192, 256)
            }]
        );
    }

    #[test]
    fn test_pad_to_square() {
        for size in [256usize, 512, 1024] {
            for shape in [(300, 700), (701, 300), (50, 50), (3, 1)] {
                let img = Array2::from_elem(shape, 7.0);
                let spacing = Spacing::isotropic(0.3).unwrap();
                let (out, _, changes) =
                    resize_long_edge_and_pad_to_square(img.view(), spacing, size).unwrap();
                assert_eq!(out.dim(), (size, size));
                assert_eq!(changes.len(), 1);
                assert_eq!(changes.as_slice()[0].output_shape(), Some((size, size)));
            }
        }
    }

    #[test]
    fn test_pad_is_symmetric() {
        let img = Array2::from_elem((2, 5), 1.0);
        let spacing = Spacing::isotropic(1.0).unwrap();
        let (out, _, changes) =
            resize_long_edge_and_pad_to_square(img.view(), spacing, 10).unwrap();
        assert_eq!(
            changes.as_slice(),
            &[SizeChange::ResizePad {
                from: (2, 5),
                resized: (4, 10),
                top: 3,
                bottom: 3,
                left: 0,
                right: 0
            }]
        );
        assert_eq!(out[(2, 4)], 0.0);
        assert_eq!(out[(3, 4)], 1.0);
        assert_eq!(out[(6, 9)], 1.0);
        assert_eq!(out[(7, 0)], 0.0);
    }

    #[test]
    fn test_invalid_target() {
        let img = Array2::from_elem((2, 5), 1.0);
        let spacing = Spacing::isotropic(1.0).unwrap();
        assert_eq!(
            resize_preserve_aspect(img.view(), spacing, 0, false).unwrap_err(),
            NormError::InvalidTargetSize(0)
        );
        let empty = Array2::<f64>::zeros((0, 5));
        assert_eq!(
            resize_preserve_aspect(empty.view(), spacing, 10, true).unwrap_err(),
            NormError::EmptyImage
        );
    }
}
