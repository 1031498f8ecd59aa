//! 肺部分割接口.
//!
//! 分割模型本身不属于本 crate. 调用者提供任意实现, 只需满足形状约定:
//! 输出掩膜与输入图像形状一致, 值不必是二值的.

use crate::{NormError, NormResult};
use ndarray::{Array2, ArrayView2};

/// 肺部分割能力.
///
/// 实现者应该可以被反复调用, 且不修改调用者的任何状态. 分割模型初始化代价较高,
/// 调用者通常只构建一个实例并复用 (见 [`crate::Standardizer`]).
pub trait LungSegmenter {
    /// 对 `image` 做肺部分割, 返回同形状的掩膜.
    fn run(&self, image: ArrayView2<f64>) -> Array2<f64>;
}

impl<F> LungSegmenter for F
where
    F: Fn(ArrayView2<f64>) -> Array2<f64>,
{
    #[inline]
    fn run(&self, image: ArrayView2<f64>) -> Array2<f64> {
        self(image)
    }
}

/// 调用 `segmenter` 并检查输出形状.
pub(crate) fn run_checked<S>(segmenter: &S, image: ArrayView2<f64>) -> NormResult<Array2<f64>>
where
    S: LungSegmenter + ?Sized,
{
    let mask = segmenter.run(image);
    if mask.dim() != image.dim() {
        return Err(NormError::ShapeMismatch {
            expected: image.dim(),
            actual: mask.dim(),
        });
    }
    Ok(mask)
}

/// 掩膜最大值是否恰好为 0, 即分割没有找到任何肺部.
pub(crate) fn is_empty_mask(mask: ArrayView2<f64>) -> bool {
    mask.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v)) == 0.0
}
