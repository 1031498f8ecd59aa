//! 几何变换 (裁剪, 缩放, 填充) 及其尺寸变化记录.
//!
//! 每个几何变换都会产生一条 [`SizeChange`]. 整条流水线按时间顺序累积这些记录
//! ([`SizeChanges`]), 以便调用者在配准的另一幅图像 (如掩膜) 上回放完全相同的操作.

mod crop;
mod resize;

pub use crop::{binarize, crop_borders, crop_to_mask};
pub use resize::{resize_long_edge_and_pad_to_square, resize_preserve_aspect};

use crate::{Idx2d, NormError, NormResult};
use ndarray::{s, Array2, ArrayView2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 一次几何变换的描述. 记录的参数足以复现该变换.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SizeChange {
    /// 从形状为 `from` 的图像四边分别去除若干行 / 列.
    Crop {
        /// 变换前形状 (高, 宽).
        from: Idx2d,
        /// 顶部去除的行数.
        top: usize,
        /// 底部去除的行数.
        bottom: usize,
        /// 左侧去除的列数.
        left: usize,
        /// 右侧去除的列数.
        right: usize,
    },

    /// 双线性重采样, 从 `from` 到 `to`.
    Resize {
        /// 变换前形状 (高, 宽).
        from: Idx2d,
        /// 变换后形状 (高, 宽).
        to: Idx2d,
    },

    /// 先双线性重采样到 `resized`, 再在四边填充 0.
    ResizePad {
        /// 变换前形状 (高, 宽).
        from: Idx2d,
        /// 重采样后, 填充前的形状 (高, 宽).
        resized: Idx2d,
        /// 顶部填充的行数.
        top: usize,
        /// 底部填充的行数.
        bottom: usize,
        /// 左侧填充的列数.
        left: usize,
        /// 右侧填充的列数.
        right: usize,
    },
}

impl SizeChange {
    /// 变换前的形状.
    #[inline]
    pub fn input_shape(&self) -> Idx2d {
        match *self {
            SizeChange::Crop { from, .. }
            | SizeChange::Resize { from, .. }
            | SizeChange::ResizePad { from, .. } => from,
        }
    }

    /// 变换后的形状.
    ///
    /// 记录自相矛盾时返回 `None`: 输入或输出不含像素, 裁剪量超过图像尺寸,
    /// 或尺寸溢出. 这样的记录通常来自损坏的持久化数据.
    pub fn output_shape(&self) -> Option<Idx2d> {
        let (h, w) = self.input_shape();
        if h == 0 || w == 0 {
            return None;
        }
        let out = match *self {
            SizeChange::Crop {
                top,
                bottom,
                left,
                right,
                ..
            } => (
                h.checked_sub(top)?.checked_sub(bottom)?,
                w.checked_sub(left)?.checked_sub(right)?,
            ),
            SizeChange::Resize { to, .. } => to,
            SizeChange::ResizePad {
                resized: (rh, rw),
                top,
                bottom,
                left,
                right,
                ..
            } => {
                if rh == 0 || rw == 0 {
                    return None;
                }
                (
                    rh.checked_add(top)?.checked_add(bottom)?,
                    rw.checked_add(left)?.checked_add(right)?,
                )
            }
        };
        (out.0 > 0 && out.1 > 0).then_some(out)
    }

    /// 是否为缩放类变换 (会改变像素间距).
    #[inline]
    pub fn is_resample(&self) -> bool {
        !matches!(self, SizeChange::Crop { .. })
    }

    /// 在 `image` 上复现该变换. `image` 的形状必须等于 [`Self::input_shape`],
    /// 且记录本身必须自洽 (见 [`Self::output_shape`]).
    pub fn apply(&self, image: ArrayView2<f64>) -> NormResult<Array2<f64>> {
        let expected = self.input_shape();
        if image.dim() != expected {
            return Err(NormError::ShapeMismatch {
                expected,
                actual: image.dim(),
            });
        }
        self.output_shape().ok_or(NormError::InvalidRecord(*self))?;
        Ok(match *self {
            SizeChange::Crop {
                top,
                bottom,
                left,
                right,
                ..
            } => crop::crop_by(image, (top, bottom, left, right)),
            SizeChange::Resize { to, .. } => resize::resize_bilinear(image, to),
            SizeChange::ResizePad {
                resized,
                top,
                bottom,
                left,
                right,
                ..
            } => {
                let r = resize::resize_bilinear(image, resized);
                resize::pad_zeros(r.view(), (top, bottom, left, right))
            }
        })
    }
}

/// 按时间顺序排列的尺寸变化记录.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SizeChanges(Vec<SizeChange>);

impl SizeChanges {
    /// 空记录.
    #[inline]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// 记录条数.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否没有任何记录.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 按时间顺序迭代.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, SizeChange> {
        self.0.iter()
    }

    /// 追加一条记录.
    #[inline]
    pub fn push(&mut self, change: SizeChange) {
        self.0.push(change);
    }

    /// 将 `other` 的全部记录按顺序追加到末尾.
    #[inline]
    pub fn extend(&mut self, other: SizeChanges) {
        self.0.extend(other.0);
    }

    /// 获取底层记录.
    #[inline]
    pub fn as_slice(&self) -> &[SizeChange] {
        &self.0
    }

    /// 在与原始输入配准的 `image` 上按顺序回放全部变换.
    ///
    /// 若某一步的输入形状与记录不符, 返回 [`NormError::ShapeMismatch`].
    pub fn replay(&self, image: ArrayView2<f64>) -> NormResult<Array2<f64>> {
        let mut current = image.to_owned();
        for change in self.iter() {
            current = change.apply(current.view())?;
        }
        Ok(current)
    }

    /// 以 `bincode` 格式序列化.
    #[cfg(feature = "serde")]
    pub fn to_bytes(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    /// 从 `bincode` 格式反序列化.
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(bytes)
    }
}

impl From<Vec<SizeChange>> for SizeChanges {
    #[inline]
    fn from(value: Vec<SizeChange>) -> Self {
        Self(value)
    }
}

impl<'a> IntoIterator for &'a SizeChanges {
    type Item = &'a SizeChange;
    type IntoIter = std::slice::Iter<'a, SizeChange>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// 校验图像非空, 并返回其形状.
#[inline]
pub(crate) fn non_empty_shape(image: ArrayView2<f64>) -> NormResult<Idx2d> {
    if image.is_empty() {
        Err(NormError::EmptyImage)
    } else {
        Ok(image.dim())
    }
}

/// 取 `image` 中 `rows` 行, `cols` 列构成的子图.
#[inline]
pub(crate) fn sub_image(
    image: ArrayView2<f64>,
    rows: std::ops::Range<usize>,
    cols: std::ops::Range<usize>,
) -> Array2<f64> {
    image.slice(s![rows, cols]).to_owned()
}
