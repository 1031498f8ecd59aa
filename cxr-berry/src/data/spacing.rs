use crate::Idx2d;

#[cfg(feature = "serde")]
use crate::NormError;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 像素间距 (单位: 毫米), 顺序与图像的 `(高, 宽)` 一致.
///
/// 图像被重采样时, 间距随之按比例更新, 使两者始终相互对应.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawSpacing"))]
pub struct Spacing {
    row: f64,
    col: f64,
}

/// 反序列化的中间形式, 经 [`Spacing::new`] 校验后才成为 [`Spacing`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawSpacing {
    row: f64,
    col: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSpacing> for Spacing {
    type Error = NormError;

    fn try_from(raw: RawSpacing) -> Result<Self, Self::Error> {
        Spacing::new(raw.row, raw.col).ok_or(NormError::InvalidSpacing)
    }
}

impl Spacing {
    /// 构建像素间距. `row` 和 `col` 必须是正有限值, 否则返回 `None`.
    pub fn new(row: f64, col: f64) -> Option<Spacing> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(row) && valid(col) {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// 各向同性的像素间距.
    #[inline]
    pub fn isotropic(mm: f64) -> Option<Spacing> {
        Self::new(mm, mm)
    }

    /// 垂直方向 (行) 间距.
    #[inline]
    pub fn row(&self) -> f64 {
        self.row
    }

    /// 水平方向 (列) 间距.
    #[inline]
    pub fn col(&self) -> f64 {
        self.col
    }

    /// 图像从 `from` 重采样为 `to` 之后的像素间距.
    ///
    /// 每个方向的间距乘以 `旧长度 / 新长度`. 由调用者保证两者均不含 0.
    pub fn resampled(&self, from: Idx2d, to: Idx2d) -> Spacing {
        Self {
            row: self.row * from.0 as f64 / to.0 as f64,
            col: self.col * from.1 as f64 / to.1 as f64,
        }
    }

    /// 将物理长度 `mm` 换算为 `(行, 列)` 两个方向上的像素个数 (四舍五入).
    pub fn mm_to_pixels(&self, mm: f64) -> Idx2d {
        (
            (mm / self.row).round() as usize,
            (mm / self.col).round() as usize,
        )
    }
}
