//! 两阶段能量带强度归一化.
//!
//! 1. 第一阶段: 去黑边, 缩放到长边 2048, 以图像中心 70% 区域为统计区域归一化;
//! 2. 对第一阶段的可读图像做肺部分割;
//! 3. 第二阶段: 以肺部掩膜为统计区域再次归一化.
//!
//! 若分割没有找到肺部, 则跳过第二阶段, 返回 [`Normalized::NoLungsFound`].

mod config;

pub use config::{NormalizerConfig, StandardizerConfig};

use crate::bands::{band_statistics, reconstruct, split_energy_bands};
use crate::bands::{ReferenceCoefficients, Region};
use crate::geometry::{crop_borders, resize_preserve_aspect, SizeChanges};
use crate::segment::{is_empty_mask, run_checked, LungSegmenter};
use crate::{IntensityWindow, NormError, NormResult, Spacing};
use either::Either;
use ndarray::{Array2, ArrayView2};

/// 第一阶段 (中心 70% 区域) 的归一化结果.
#[derive(Clone, Debug)]
pub struct CentralNorm {
    /// 未截断的归一化图像, 作为第二阶段的输入.
    pub norm: Array2<f64>,

    /// 以 `均值 ± 5` 为窗口映射到 `[0, 4095]` 并量化的可读图像, 作为分割的输入.
    pub readable: Array2<u16>,

    /// 缩放后的像素间距.
    pub spacing: Spacing,

    /// 去黑边和缩放两条尺寸变化记录.
    pub changes: SizeChanges,
}

/// 完整两阶段归一化的结果.
#[derive(Clone, Debug)]
pub enum Normalized {
    /// 两阶段均已完成. `image` 取值范围为 `[0, 4095]`, 尚未量化.
    Success {
        /// 归一化图像.
        image: Array2<f64>,
        /// 像素间距.
        spacing: Spacing,
        /// 去黑边和缩放两条尺寸变化记录.
        changes: SizeChanges,
    },

    /// 分割没有找到肺部 (掩膜最大值为 0). `mask` 即分割输出本身.
    NoLungsFound {
        /// 全零掩膜.
        mask: Array2<f64>,
        /// 像素间距.
        spacing: Spacing,
        /// 去黑边和缩放两条尺寸变化记录.
        changes: SizeChanges,
    },
}

impl Normalized {
    /// 是否两阶段均已完成.
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Normalized::Success { .. })
    }

    /// 输出图像的像素间距.
    #[inline]
    pub fn spacing(&self) -> Spacing {
        match self {
            Normalized::Success { spacing, .. } | Normalized::NoLungsFound { spacing, .. } => {
                *spacing
            }
        }
    }

    /// 迄今为止的尺寸变化记录.
    #[inline]
    pub fn changes(&self) -> &SizeChanges {
        match self {
            Normalized::Success { changes, .. } | Normalized::NoLungsFound { changes, .. } => {
                changes
            }
        }
    }
}

/// 两阶段强度归一化器. 不持有任何可变状态, 可以在多次调用之间复用.
#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// 使用给定参数构建.
    #[inline]
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// 当前参数.
    #[inline]
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// 分解 -> 区域统计 -> 重建.
    fn normalize_bands(
        &self,
        image: ArrayView2<f64>,
        region: Region,
        coefficients: &ReferenceCoefficients,
    ) -> NormResult<Array2<f64>> {
        let bands = split_energy_bands(image, &self.config.sigmas)?;
        let stats = band_statistics(&bands, region)?;
        log::debug!(
            "能量带统计: means = {:?}, stdevs = {:?}",
            stats.means(),
            stats.stdevs()
        );
        reconstruct(bands, &stats, coefficients, self.config.min_stdev)
    }

    /// 去黑边并缩放到第一阶段的长边.
    fn stage1_geometry(
        &self,
        image: ArrayView2<f64>,
        spacing: Spacing,
    ) -> NormResult<(Array2<f64>, Spacing, SizeChanges)> {
        let (cropped, mut changes) = crop_borders(image, self.config.border_threshold_factor)?;
        let (resized, spacing, resize_changes) =
            resize_preserve_aspect(cropped.view(), spacing, self.config.stage1_long_edge, false)?;
        changes.extend(resize_changes);
        Ok((resized, spacing, changes))
    }

    /// 以中心区域为统计区域归一化, 返回 (归一化图像, 可读图像).
    fn stage1_intensity(
        &self,
        resized: ArrayView2<f64>,
    ) -> NormResult<(Array2<f64>, Array2<u16>)> {
        let norm = self.normalize_bands(
            resized,
            Either::Right(self.config.central_box),
            &self.config.central_coefficients,
        )?;

        let mean = norm.mean().ok_or(NormError::EmptyImage)?;
        let half = self.config.stage1_half_window;
        let window = IntensityWindow::centered(mean, half).ok_or(NormError::InvalidWindow {
            lower: mean - half,
            upper: mean + half,
        })?;
        let readable = norm.mapv(|v| window.eval_f64(v) as u16);
        Ok((norm, readable))
    }

    /// 第一阶段: 去黑边, 缩放, 以中心区域为统计区域归一化.
    pub fn central_70(&self, image: ArrayView2<f64>, spacing: Spacing) -> NormResult<CentralNorm> {
        self.config.validate()?;
        let (resized, spacing, changes) = self.stage1_geometry(image, spacing)?;
        let (norm, readable) = self.stage1_intensity(resized.view())?;
        Ok(CentralNorm {
            norm,
            readable,
            spacing,
            changes,
        })
    }

    /// 第二阶段: 以 `lung_mask` (值 > 0) 为统计区域归一化, 并将 `[-5, 5]` 映射到 `[0, 4095]`.
    ///
    /// `norm70` 应为 [`Self::central_70`] 返回的 `norm`. 返回值为实数, 已截断但未量化.
    pub fn lung_masked(
        &self,
        norm70: ArrayView2<f64>,
        lung_mask: ArrayView2<f64>,
    ) -> NormResult<Array2<f64>> {
        self.config.validate()?;

        let norm = self.normalize_bands(
            norm70,
            Either::Left(lung_mask),
            &self.config.lung_coefficients,
        )?;
        let (lower, upper) = self.config.stage2_window;
        let window =
            IntensityWindow::new(lower, upper).ok_or(NormError::InvalidWindow { lower, upper })?;
        Ok(norm.mapv(|v| window.eval_f64(v)))
    }

    /// 完整的两阶段归一化, 中间调用 `segmenter` 做肺部分割.
    ///
    /// 分割结果全为 0 时不做第二阶段, 返回 [`Normalized::NoLungsFound`].
    /// 第一阶段能量带退化 (如常数图像) 时, 分割器收到全零图像; 若其结果同样全为 0,
    /// 仍返回 [`Normalized::NoLungsFound`], 否则返回 [`NormError::DegenerateBand`].
    pub fn full_normalization<S>(
        &self,
        image: ArrayView2<f64>,
        spacing: Spacing,
        segmenter: &S,
    ) -> NormResult<Normalized>
    where
        S: LungSegmenter + ?Sized,
    {
        self.config.validate()?;
        let (resized, spacing, changes) = self.stage1_geometry(image, spacing)?;

        // 第一阶段退化时不产生 NaN 图像, 而是以全零可读图像询问分割器.
        let stage1 = match self.stage1_intensity(resized.view()) {
            Ok(pair) => Ok(pair),
            Err(err @ NormError::DegenerateBand { .. }) => {
                log::debug!("第一阶段退化: {err}, 以全零图像分割");
                Err(err)
            }
            Err(err) => return Err(err),
        };

        let mask = match &stage1 {
            Ok((_, readable)) => run_checked(segmenter, readable.mapv(f64::from).view())?,
            Err(_) => run_checked(segmenter, Array2::<f64>::zeros(resized.raw_dim()).view())?,
        };
        if is_empty_mask(mask.view()) {
            log::warn!("肺部分割结果为空, 返回空图像");
            return Ok(Normalized::NoLungsFound {
                mask,
                spacing,
                changes,
            });
        }

        // 分割给出了肺部, 但第一阶段退化: 第二阶段没有可用的输入.
        let (norm, _) = stage1?;
        let image = self.lung_masked(norm.view(), mask.view())?;
        Ok(Normalized::Success {
            image,
            spacing,
            changes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Normalized, Normalizer, NormalizerConfig};
    use crate::bands::ReferenceCoefficients;
    use crate::geometry::SizeChange;
    use crate::{NormError, Spacing};
    use ndarray::{Array2, ArrayView2};

    /// 小尺寸配置, 使测试足够快.
    fn small_config() -> NormalizerConfig {
        NormalizerConfig {
            sigmas: vec![1.0, 2.0],
            central_coefficients: ReferenceCoefficients::new(vec![1.0, 0.15, 0.09]).unwrap(),
            lung_coefficients: ReferenceCoefficients::new(vec![1.0, 0.26, 0.18]).unwrap(),
            stage1_long_edge: 64,
            ..Default::default()
        }
    }

    /// 带黑边的伪胸片: 内容区域含低频梯度和高频纹理.
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

    /// 把可读图像中较暗的一半视为 "肺".
    fn dark_half(img: ArrayView2<f64>) -> Array2<f64> {
        let mean = img.mean().unwrap();
        img.mapv(|v| if v < mean { 0.8 } else { 0.0 })
    }

    #[test]
    fn test_central_70_stage() {
        let n = Normalizer::new(small_config());
        let spacing = Spacing::isotropic(0.2).unwrap();
        let out = n.central_70(fake_cxr().view(), spacing).unwrap();

        assert_eq!(out.norm.dim(), (50, 64));
        assert_eq!(out.readable.dim(), (50, 64));
        assert!(out.readable.iter().all(|&v| v <= 4095));
        assert!(out.norm.iter().all(|v| v.is_finite()));

        let changes = out.changes.as_slice();
        assert_eq!(changes.len(), 2);
        assert!(matches!(changes[0], SizeChange::Crop { top: 5, left: 8, .. }));
        assert_eq!(
            changes[1],
            SizeChange::Resize {
                from: (50, 64),
                to: (50, 64)
            }
        );
        assert_eq!(out.spacing, spacing);
    }

    #[test]
    fn test_full_normalization_success() {
        let n = Normalizer::new(small_config());
        let spacing = Spacing::isotropic(0.2).unwrap();
        let out = n
            .full_normalization(fake_cxr().view(), spacing, &dark_half)
            .unwrap();
        assert!(out.is_success());
        assert_eq!(out.changes().len(), 2);
        let Normalized::Success { image, .. } = out else {
            unreachable!()
        };
        assert_eq!(image.dim(), (50, 64));
        assert!(image.iter().all(|&v| (0.0..=4095.0).contains(&v)));
    }

    #[test]
    fn test_no_lungs_found() {
        let n = Normalizer::new(small_config());
        let spacing = Spacing::isotropic(0.2).unwrap();
        let nothing = |img: ArrayView2<f64>| Array2::<f64>::zeros(img.raw_dim());
        let out = n
            .full_normalization(fake_cxr().view(), spacing, &nothing)
            .unwrap();
        assert!(!out.is_success());
        assert_eq!(out.changes().len(), 2);
        let Normalized::NoLungsFound { mask, .. } = out else {
            unreachable!()
        };
        assert!(mask.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_degenerate_image_fails_loudly() {
        // 常数图像的能量带方差为 0, 必须报错而不是产生 NaN.
        let n = Normalizer::new(small_config());
        let flat = Array2::from_elem((30, 30), 100.0);
        let err = n
            .central_70(flat.view(), Spacing::isotropic(1.0).unwrap())
            .unwrap_err();
        assert!(matches!(err, NormError::DegenerateBand { .. }));
    }

    #[test]
    fn test_degenerate_image_without_lungs() {
        let n = Normalizer::new(small_config());
        let zeros = Array2::<f64>::zeros((30, 40));
        let spacing = Spacing::isotropic(0.5).unwrap();

        let seen = std::cell::Cell::new(f64::NAN);
        let nothing = |img: ArrayView2<f64>| {
            seen.set(img.fold(0.0, |acc: f64, &v| acc.max(v.abs())));
            Array2::<f64>::zeros(img.raw_dim())
        };
        let out = n.full_normalization(zeros.view(), spacing, &nothing).unwrap();
        // 分割器收到的是全零图像, 而不是 NaN.
        assert_eq!(seen.get(), 0.0);
        assert_eq!(out.changes().len(), 2);
        let Normalized::NoLungsFound { mask, .. } = out else {
            unreachable!()
        };
        assert_eq!(mask, Array2::<f64>::zeros((48, 64)));

        let everything = |img: ArrayView2<f64>| Array2::from_elem(img.raw_dim(), 1.0);
        let err = n
            .full_normalization(zeros.view(), spacing, &everything)
            .unwrap_err();
        assert!(matches!(err, NormError::DegenerateBand { band: 0, .. }));
    }

    #[test]
    fn test_config_checked_at_call_time() {
        let n = Normalizer::new(NormalizerConfig {
            sigmas: vec![1.0],
            ..Default::default()
        });
        let err = n
            .central_70(fake_cxr().view(), Spacing::isotropic(1.0).unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            NormError::CoefficientMismatch {
                expected: 2,
                actual: 6
            }
        );
    }
}
