//! 胸片标准化: 强度归一化, 肺部裁剪, 缩放并填充为正方形, 量化.

use crate::consts::FINAL_SQUARE_SIZE;
use crate::geometry::{binarize, crop_to_mask, resize_long_edge_and_pad_to_square, SizeChanges};
use crate::norm::{Normalized, Normalizer, StandardizerConfig};
use crate::segment::{run_checked, LungSegmenter};
use crate::{IntensityWindow, NormError, NormResult, Spacing};
use ndarray::{Array2, ArrayView2};
use std::borrow::Cow;

/// 标准化结果.
#[derive(Clone, Debug)]
pub enum Standardized {
    /// 标准化完成. `image` 形状恰为 `(final_size, final_size)`, 取值 `[0, 4095]`.
    Success {
        /// 标准化图像.
        image: Array2<u16>,
        /// 像素间距.
        spacing: Spacing,
        /// 按时间顺序的全部尺寸变化记录:
        /// 去黑边, 缩放到 2048, (肺部裁剪), 缩放并填充为正方形.
        changes: SizeChanges,
    },

    /// 分割没有找到肺部. `mask` 即分割输出本身 (全零), 此时不做裁剪和最终缩放.
    NoLungsFound {
        /// 全零掩膜.
        mask: Array2<f64>,
        /// 第一阶段缩放后的像素间距.
        spacing: Spacing,
        /// 仅包含去黑边和缩放两条记录.
        changes: SizeChanges,
    },
}

impl Standardized {
    /// 是否标准化成功.
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Standardized::Success { .. })
    }

    /// 输出图像的像素间距.
    #[inline]
    pub fn spacing(&self) -> Spacing {
        match self {
            Standardized::Success { spacing, .. } | Standardized::NoLungsFound { spacing, .. } => {
                *spacing
            }
        }
    }

    /// 全部尺寸变化记录.
    #[inline]
    pub fn changes(&self) -> &SizeChanges {
        match self {
            Standardized::Success { changes, .. } | Standardized::NoLungsFound { changes, .. } => {
                changes
            }
        }
    }

    /// 成功时的标准化图像.
    #[inline]
    pub fn image(&self) -> Option<&Array2<u16>> {
        match self {
            Standardized::Success { image, .. } => Some(image),
            Standardized::NoLungsFound { .. } => None,
        }
    }
}

/// 胸片标准化器.
///
/// 持有一个分割器实例并在多次调用之间复用. 除此以外不保存任何跨调用状态.
pub struct Standardizer<S> {
    segmenter: S,
    normalizer: Normalizer,
    lung_margin_mm: f64,
}

impl<S: LungSegmenter> Standardizer<S> {
    /// 使用默认参数构建.
    #[inline]
    pub fn new(segmenter: S) -> Self {
        Self::with_config(segmenter, StandardizerConfig::default())
    }

    /// 使用给定参数构建.
    pub fn with_config(segmenter: S, config: StandardizerConfig) -> Self {
        Self {
            segmenter,
            normalizer: Normalizer::new(config.normalizer),
            lung_margin_mm: config.lung_margin_mm,
        }
    }

    /// 底层分割器.
    #[inline]
    pub fn segmenter(&self) -> &S {
        &self.segmenter
    }

    /// 底层强度归一化器.
    #[inline]
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// 标准化一张胸片.
    ///
    /// 1. 两阶段强度归一化 (其间必定调用一次分割);
    /// 2. 若 `crop_to_lung` 为 `true`, 在归一化图像上再次分割, 二值化后裁剪到肺部外接矩形
    ///    (四周扩展固定边距);
    /// 3. 缩放使长边为 `final_size` 并对称填充为正方形;
    /// 4. 截断到 `[0, 4095]` 并量化为 `u16`.
    ///
    /// 分割没有找到肺部时返回 [`Standardized::NoLungsFound`], 而不是错误.
    /// 几何步骤自身的错误 (如裁剪掩膜为空) 原样返回.
    pub fn standardize(
        &self,
        image: ArrayView2<f64>,
        spacing: Spacing,
        crop_to_lung: bool,
        final_size: usize,
    ) -> NormResult<Standardized> {
        if final_size == 0 {
            return Err(NormError::InvalidTargetSize(final_size));
        }

        let (normalized, spacing, mut changes) =
            match self
                .normalizer
                .full_normalization(image, spacing, &self.segmenter)?
            {
                Normalized::Success {
                    image,
                    spacing,
                    changes,
                } => (image, spacing, changes),
                Normalized::NoLungsFound {
                    mask,
                    spacing,
                    changes,
                } => {
                    return Ok(Standardized::NoLungsFound {
                        mask,
                        spacing,
                        changes,
                    })
                }
            };

        let cropped = if crop_to_lung {
            let mask = run_checked(&self.segmenter, normalized.view())?;
            let mask = binarize(mask.view());
            let (cropped, crop_changes) =
                crop_to_mask(normalized.view(), spacing, mask.view(), self.lung_margin_mm)?;
            changes.extend(crop_changes);
            Cow::Owned(cropped)
        } else {
            Cow::Borrowed(&normalized)
        };

        let (square, spacing, square_changes) =
            resize_long_edge_and_pad_to_square(cropped.view(), spacing, final_size)?;
        changes.extend(square_changes);

        let window = IntensityWindow::display();
        let image = square.mapv(|v| window.eval_f64(v) as u16);
        log::debug!(
            "标准化完成: {:?}, 共 {} 条尺寸变化记录",
            image.dim(),
            changes.len()
        );

        Ok(Standardized::Success {
            image,
            spacing,
            changes,
        })
    }

    /// 以默认方式标准化: 裁剪到肺部, 最终边长为 [`FINAL_SQUARE_SIZE`].
    #[inline]
    pub fn standardize_default(
        &self,
        image: ArrayView2<f64>,
        spacing: Spacing,
    ) -> NormResult<Standardized> {
        self.standardize(image, spacing, true, FINAL_SQUARE_SIZE)
    }
}

/// 使用默认参数标准化一张胸片. 见 [`Standardizer::standardize`].
///
/// 需要处理多张图像时, 应构建一个 [`Standardizer`] 复用分割器.
pub fn standardize<S: LungSegmenter>(
    segmenter: S,
    image: ArrayView2<f64>,
    spacing: Spacing,
    crop_to_lung: bool,
    final_size: usize,
) -> NormResult<Standardized> {
    Standardizer::new(segmenter).standardize(image, spacing, crop_to_lung, final_size)
}

#[cfg(test)]
mod tests {
    use super::{Standardized, Standardizer};
    use crate::bands::ReferenceCoefficients;
    use crate::geometry::SizeChange;
    use crate::norm::{NormalizerConfig, StandardizerConfig};
    use crate::{NormError, Spacing};
    use ndarray::{s, Array2, ArrayView2};

    fn small_config() -> StandardizerConfig {
        StandardizerConfig {
            normalizer: NormalizerConfig {
                sigmas: vec![1.0, 2.0],
                central_coefficients: ReferenceCoefficients::new(vec![1.0, 0.15, 0.09]).unwrap(),
                lung_coefficients: ReferenceCoefficients::new(vec![1.0, 0.26, 0.18]).unwrap(),
                stage1_long_edge: 64,
                ..Default::default()
            },
            lung_margin_mm: 1.0,
        }
    }

    fn fake_cxr() -> Array2<f64> {
        Array2::from_shape_fn((60, 80), |(h, w)| {
            if !(5..55).contains(&h) || !(8..72).contains(&w) {
                0.0
            } else {
                1000.0
                    + 8.0 * h as f64
                    + 300.0 * ((w as f64) / 7.0).sin()
                    + ((h * 37 + w * 11) % 17) as f64 * 20.0
            }
        })
    }

    /// 固定的矩形 "肺部", 与输入内容无关.
    fn box_lungs(img: ArrayView2<f64>) -> Array2<f64> {
        let mut mask = Array2::zeros(img.raw_dim());
        let (h, w) = img.dim();
        mask.slice_mut(s![h / 4..h * 3 / 4, w / 4..w / 2]).fill(0.9);
        mask
    }

    #[test]
    fn test_standardize_with_crop() {
        let st = Standardizer::with_config(box_lungs, small_config());
        let spacing = Spacing::isotropic(0.2).unwrap();
        let out = st.standardize(fake_cxr().view(), spacing, true, 32).unwrap();
        assert!(out.is_success());

        let changes = out.changes().as_slice();
        assert_eq!(changes.len(), 4);
        assert!(matches!(changes[0], SizeChange::Crop { .. }));
        assert!(matches!(changes[1], SizeChange::Resize { .. }));
        // 50x64 上的肺部为 [12, 37) x [16, 32), 边距 5 像素.
        assert_eq!(
            changes[2],
            SizeChange::Crop {
                from: (50, 64),
                top: 7,
                bottom: 8,
                left: 11,
                right: 27
            }
        );
        assert!(matches!(changes[3], SizeChange::ResizePad { .. }));
        for pair in changes.windows(2) {
            assert_eq!(pair[0].output_shape(), Some(pair[1].input_shape()));
        }

        let image = out.image().unwrap();
        assert_eq!(image.dim(), (32, 32));
        assert!(image.iter().all(|&v| v <= 4095));
    }

    #[test]
    fn test_standardize_without_crop() {
        let st = Standardizer::with_config(box_lungs, small_config());
        let spacing = Spacing::isotropic(0.2).unwrap();
        let out = st.standardize(fake_cxr().view(), spacing, false, 40).unwrap();
        assert_eq!(out.changes().len(), 3);
        assert_eq!(out.image().unwrap().dim(), (40, 40));
        // 50x64 -> 31x40, 上下共填充 9 行.
        assert_eq!(
            out.changes().as_slice()[2],
            SizeChange::ResizePad {
                from: (50, 64),
                resized: (31, 40),
                top: 4,
                bottom: 5,
                left: 0,
                right: 0
            }
        );
        let image = out.image().unwrap();
        assert!(image.row(0).iter().all(|&v| v == 0));
        assert!(image.row(39).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_no_lungs_found_short_circuits() {
        let nothing = |img: ArrayView2<f64>| Array2::<f64>::zeros(img.raw_dim());
        let st = Standardizer::with_config(nothing, small_config());
        let spacing = Spacing::isotropic(0.2).unwrap();
        let out = st.standardize(fake_cxr().view(), spacing, true, 32).unwrap();
        assert!(!out.is_success());
        assert!(out.image().is_none());
        assert_eq!(out.changes().len(), 2);
        let Standardized::NoLungsFound { mask, .. } = out else {
            unreachable!()
        };
        assert_eq!(mask, Array2::<f64>::zeros((50, 64)));
    }

    #[test]
    fn test_zero_final_size() {
        let st = Standardizer::with_config(box_lungs, small_config());
        let spacing = Spacing::isotropic(0.2).unwrap();
        assert_eq!(
            st.standardize(fake_cxr().view(), spacing, false, 0)
                .unwrap_err(),
            NormError::InvalidTargetSize(0)
        );
    }
}
