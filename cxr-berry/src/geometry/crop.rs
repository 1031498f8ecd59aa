use super::{non_empty_shape, sub_image, SizeChange, SizeChanges};
use crate::{NormError, NormResult, Spacing};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// 四边分别去除的 (上, 下, 左, 右) 像素数.
type Margins = (usize, usize, usize, usize);

/// 按四边去除量裁剪. 由调用者保证不越界.
pub(super) fn crop_by(image: ArrayView2<f64>, (top, bottom, left, right): Margins) -> Array2<f64> {
    let (h, w) = image.dim();
    sub_image(image, top..h - bottom, left..w - right)
}

/// 最小值与最大值. NaN 被忽略.
fn min_max<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}

/// 一条 lane 的极差 (最大值 - 最小值).
#[inline]
fn lane_range(lane: ArrayView1<f64>) -> f64 {
    let (lo, hi) = min_max(lane.iter());
    hi - lo
}

/// 从两端向内数出连续满足 `homogeneous` 的 lane 个数, 返回 (头部个数, 尾部个数).
///
/// 如果全部 lane 都满足, 则返回 `None`.
fn homogeneous_ends(flags: &[bool]) -> Option<(usize, usize)> {
    let head = flags.iter().position(|&f| !f)?;
    let tail = flags.iter().rev().position(|&f| !f)?;
    Some((head, tail))
}

/// 去除图像四周的均匀边框 (通常是黑边).
///
/// 阈值为 `threshold_factor * (全图最大值 - 全图最小值)`. 一行 (列) 的极差不超过阈值时,
/// 视为均匀. 从四边向内去除连续的均匀行 / 列; 若全部行 (或全部列) 都均匀,
/// 则不做任何裁剪.
///
/// 总是返回恰好一条 [`SizeChange::Crop`] 记录 (可能四边均为 0).
pub fn crop_borders(
    image: ArrayView2<f64>,
    threshold_factor: f64,
) -> NormResult<(Array2<f64>, SizeChanges)> {
    let from = non_empty_shape(image)?;
    if !threshold_factor.is_finite() || threshold_factor < 0.0 {
        return Err(NormError::InvalidThreshold(threshold_factor));
    }

    let (lo, hi) = min_max(image.iter());
    let threshold = threshold_factor * (hi - lo);
    let rows: Vec<bool> = image
        .axis_iter(Axis(0))
        .map(|r| lane_range(r) <= threshold)
        .collect();
    let cols: Vec<bool> = image
        .axis_iter(Axis(1))
        .map(|c| lane_range(c) <= threshold)
        .collect();

    let margins = match (homogeneous_ends(&rows), homogeneous_ends(&cols)) {
        (Some((top, bottom)), Some((left, right))) => (top, bottom, left, right),
        _ => (0, 0, 0, 0),
    };
    let (top, bottom, left, right) = margins;
    log::debug!("去黑边: {from:?}, 上 {top}, 下 {bottom}, 左 {left}, 右 {right}");

    let cropped = crop_by(image, margins);
    let changes = SizeChanges::from(vec![SizeChange::Crop {
        from,
        top,
        bottom,
        left,
        right,
    }]);
    Ok((cropped, changes))
}

/// 将掩膜二值化为 `{0, 1}`.
///
/// 按掩膜自身的最小 / 最大值线性映射到 `[0, 1]` 后, 所有非零位置 (即原值大于最小值的位置)
/// 均为 1. 软掩膜中的低置信度像素因此也会计入肺部外接矩形.
/// 若掩膜为常数, 则值 > 0 的位置为 1, 其余为 0.
/// 对已经是 `{0, 1}` 的掩膜, 该操作不改变任何像素.
pub fn binarize(mask: ArrayView2<f64>) -> Array2<f64> {
    let (lo, hi) = min_max(mask.iter());
    if hi > lo {
        mask.mapv(|v| if v > lo { 1.0 } else { 0.0 })
    } else {
        mask.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
    }
}

/// 将图像裁剪到掩膜 (值 > 0) 的外接矩形, 四周各扩展 `margin_mm` 毫米.
///
/// 边距按 `spacing` 换算为像素 (四舍五入), 扩展后的矩形被截断到图像范围内.
/// 返回恰好一条 [`SizeChange::Crop`] 记录. 裁剪不改变像素间距.
///
/// # 错误
///
/// - 图像为空, 或掩膜形状与图像不符;
/// - `margin_mm` 为负或非有限值;
/// - 掩膜不含任何前景像素.
pub fn crop_to_mask(
    image: ArrayView2<f64>,
    spacing: Spacing,
    mask: ArrayView2<f64>,
    margin_mm: f64,
) -> NormResult<(Array2<f64>, SizeChanges)> {
    let from = non_empty_shape(image)?;
    if mask.dim() != from {
        return Err(NormError::ShapeMismatch {
            expected: from,
            actual: mask.dim(),
        });
    }
    if !margin_mm.is_finite() || margin_mm < 0.0 {
        return Err(NormError::InvalidMargin(margin_mm));
    }

    let mut bbox: Option<(usize, usize, usize, usize)> = None;
    for ((h, w), &m) in mask.indexed_iter() {
        if m > 0.0 {
            bbox = Some(match bbox {
                None => (h, h, w, w),
                Some((h0, h1, w0, w1)) => (h0.min(h), h1.max(h), w0.min(w), w1.max(w)),
            });
        }
    }
    let (h0, h1, w0, w1) = bbox.ok_or(NormError::EmptyMask)?;

    let (mh, mw) = spacing.mm_to_pixels(margin_mm);
    let (height, width) = from;
    let top = h0.saturating_sub(mh);
    let left = w0.saturating_sub(mw);
    let bottom = height - (h1 + mh + 1).min(height);
    let right = width - (w1 + mw + 1).min(width);
    log::debug!("肺部裁剪: {from:?}, 上 {top}, 下 {bottom}, 左 {left}, 右 {right}");

    let cropped = crop_by(image, (top, bottom, left, right));
    let changes = SizeChanges::from(vec![SizeChange::Crop {
        from,
        top,
        bottom,
        left,
        right,
    }]);
    Ok((cropped, changes))
}
