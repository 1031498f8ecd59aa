use super::{BandStatistics, EnergyBands};
use crate::consts::{COEFFS_CENTRAL_70, COEFFS_LUNG_MASK};
use crate::{NormError, NormResult};
use itertools::izip;
use ndarray::Array2;

/// 参考系数, 每个能量带一个. 由参考人群离线计算得出, 构建后不可修改.
///
/// 第一个系数按惯例为 1. 重建时最低频能量带只做标准化, 不使用该系数.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceCoefficients(Vec<f64>);

impl ReferenceCoefficients {
    /// 构建参考系数. `values` 必须非空且全部为有限值, 否则返回 `None`.
    pub fn new(values: Vec<f64>) -> Option<Self> {
        if !values.is_empty() && values.iter().all(|v| v.is_finite()) {
            Some(Self(values))
        } else {
            None
        }
    }

    /// 第一阶段 (中心 70% 区域) 的参考系数.
    pub fn central_70() -> Self {
        Self(COEFFS_CENTRAL_70.to_vec())
    }

    /// 第二阶段 (肺部掩膜区域) 的参考系数.
    pub fn lung_mask() -> Self {
        Self(COEFFS_LUNG_MASK.to_vec())
    }

    /// 系数个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否为空. 经由公开接口构造的实例总是返回 `false`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 获取底层系数.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// 由能量带、统计量和参考系数重建归一化图像.
///
/// 最低频能量带 (索引 0) 做标准化 `(band - mean) / stdev`;
/// 其余能量带 `j` 只乘以 `coefficients[j] / stdev[j]`, 不减去均值
/// (更高频的能量带被假定为零均值). 输出为各能量带逐元素之和, 不做截断.
///
/// # 错误
///
/// - 能量带、统计量、系数三者个数不一致;
/// - 任一标准差非有限, 或小于 `min_stdev`.
pub fn reconstruct(
    bands: EnergyBands,
    stats: &BandStatistics,
    coefficients: &ReferenceCoefficients,
    min_stdev: f64,
) -> NormResult<Array2<f64>> {
    let n = bands.len();
    if coefficients.len() != n {
        return Err(NormError::CoefficientMismatch {
            expected: n,
            actual: coefficients.len(),
        });
    }
    if stats.len() != n {
        return Err(NormError::BandShapeMismatch);
    }
    for (band, &stdev) in stats.stdevs().iter().enumerate() {
        if !stdev.is_finite() || stdev < min_stdev || stdev == 0.0 {
            return Err(NormError::DegenerateBand { band, stdev });
        }
    }

    let mut bands = bands.into_inner().into_iter();
    // `n >= 1` 已由 `EnergyBands` 保证.
    let mut out = bands.next().ok_or(NormError::BandShapeMismatch)?;
    let (mean0, stdev0) = (stats.means()[0], stats.stdevs()[0]);
    out.mapv_inplace(|v| (v - mean0) / stdev0);

    for (band, &coeff, &stdev) in izip!(
        bands,
        &coefficients.as_slice()[1..],
        &stats.stdevs()[1..]
    ) {
        out.scaled_add(coeff / stdev, &band);
    }
    Ok(out)
}
