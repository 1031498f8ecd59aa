use crate::bands::{check_sigmas, CentralBox, ReferenceCoefficients};
use crate::consts::*;
use crate::{NormError, NormResult};

/// 两阶段归一化的全部固定参数.
///
/// `Default` 给出论文与参考人群对应的取值. 替换其中的参考系数或 sigma
/// 序列即可在不修改算法代码的前提下使用另一套参考人群.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizerConfig {
    /// 能量带分解所用的 sigma 序列, 严格递增.
    pub sigmas: Vec<f64>,

    /// 第一阶段参考系数, 个数须为 `sigmas.len() + 1`.
    pub central_coefficients: ReferenceCoefficients,

    /// 第二阶段参考系数, 个数须为 `sigmas.len() + 1`.
    pub lung_coefficients: ReferenceCoefficients,

    /// 第一阶段的统计区域.
    pub central_box: CentralBox,

    /// 去黑边阈值比例.
    pub border_threshold_factor: f64,

    /// 第一阶段缩放后的长边边长 (单位: 像素).
    pub stage1_long_edge: usize,

    /// 第一阶段可读图像的窗口半宽.
    pub stage1_half_window: f64,

    /// 第二阶段输出窗口 (下限, 上限).
    pub stage2_window: (f64, f64),

    /// 标准差下限.
    pub min_stdev: f64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            sigmas: SIGMAS.to_vec(),
            central_coefficients: ReferenceCoefficients::central_70(),
            lung_coefficients: ReferenceCoefficients::lung_mask(),
            central_box: CentralBox::CENTRAL_70,
            border_threshold_factor: BORDER_THRESHOLD_FACTOR,
            stage1_long_edge: STAGE1_LONG_EDGE,
            stage1_half_window: STAGE1_HALF_WINDOW,
            stage2_window: (STAGE2_WINDOW_LOWER, STAGE2_WINDOW_UPPER),
            min_stdev: MIN_STDEV,
        }
    }
}

impl NormalizerConfig {
    /// 检查 sigma 序列, 以及两组参考系数与能量带个数是否一致.
    pub fn validate(&self) -> NormResult<()> {
        check_sigmas(&self.sigmas)?;
        let expected = self.sigmas.len() + 1;
        for coeffs in [&self.central_coefficients, &self.lung_coefficients] {
            if coeffs.len() != expected {
                return Err(NormError::CoefficientMismatch {
                    expected,
                    actual: coeffs.len(),
                });
            }
        }
        Ok(())
    }
}

/// 几何标准化的全部固定参数.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardizerConfig {
    /// 强度归一化参数.
    pub normalizer: NormalizerConfig,

    /// 肺部裁剪边距 (单位: 毫米).
    pub lung_margin_mm: f64,
}

impl Default for StandardizerConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            lung_margin_mm: LUNG_MARGIN_MM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NormalizerConfig, StandardizerConfig};
    use crate::bands::ReferenceCoefficients;
    use crate::NormError;

    #[test]
    fn test_default_is_valid() {
        let cfg = NormalizerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.sigmas, vec![1.0, 2.0, 4.0, 8.0, 16.0]);
        assert_eq!(cfg.stage1_long_edge, 2048);
        assert_eq!(StandardizerConfig::default().lung_margin_mm, 15.0);
    }

    #[test]
    fn test_mismatched_lengths() {
        let cfg = NormalizerConfig {
            sigmas: vec![1.0, 2.0],
            ..Default::default()
        };
        assert_eq!(
            cfg.validate().unwrap_err(),
            NormError::CoefficientMismatch {
                expected: 3,
                actual: 6
            }
        );

        let cfg = NormalizerConfig {
            sigmas: vec![1.0, 2.0],
            central_coefficients: ReferenceCoefficients::new(vec![1.0, 0.2, 0.1]).unwrap(),
            lung_coefficients: ReferenceCoefficients::new(vec![1.0, 0.3, 0.2]).unwrap(),
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());

        let cfg = NormalizerConfig {
            sigmas: vec![],
            ..Default::default()
        };
        assert_eq!(cfg.validate().unwrap_err(), NormError::EmptySigmas);
    }
}
