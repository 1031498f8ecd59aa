use super::EnergyBands;
use crate::consts::{CENTRAL_HI, CENTRAL_LO};
use crate::{Idx2d, NormError, NormResult};
use either::Either;
use ndarray::{s, ArrayView2, Zip};
use std::ops::Range;

/// 按比例描述的中心矩形区域.
///
/// 对于高为 `h` 的图像, 行范围为 `[floor(lo * h), floor(hi * h))`, 列同理.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CentralBox {
    lo: f64,
    hi: f64,
}

impl CentralBox {
    /// 覆盖每个维度 15% 到 85% 的中心 70% 区域.
    pub const CENTRAL_70: CentralBox = CentralBox {
        lo: CENTRAL_LO,
        hi: CENTRAL_HI,
    };

    /// 构建中心区域. 要求 `0 <= lo < hi <= 1`, 否则返回 `None`.
    pub fn new(lo: f64, hi: f64) -> Option<CentralBox> {
        if (0.0..1.0).contains(&lo) && lo < hi && hi <= 1.0 {
            Some(Self { lo, hi })
        } else {
            None
        }
    }

    /// 在形状为 `(h, w)` 的图像上, 该区域对应的 (行范围, 列范围).
    pub fn ranges(&self, (h, w): Idx2d) -> (Range<usize>, Range<usize>) {
        let span = |len: usize| (self.lo * len as f64) as usize..(self.hi * len as f64) as usize;
        (span(h), span(w))
    }
}

impl Default for CentralBox {
    fn default() -> Self {
        Self::CENTRAL_70
    }
}

/// 统计区域: 左侧为掩膜 (值 > 0 的像素参与统计), 右侧为中心矩形区域.
pub type Region<'a> = Either<ArrayView2<'a, f64>, CentralBox>;

/// 每个能量带在统计区域内的均值和 (总体) 标准差, 按索引与能量带对齐.
#[derive(Clone, Debug, PartialEq)]
pub struct BandStatistics {
    means: Vec<f64>,
    stdevs: Vec<f64>,
}

impl BandStatistics {
    /// 直接初始化. `means` 和 `stdevs` 长度不一致时返回 `None`.
    pub fn new(means: Vec<f64>, stdevs: Vec<f64>) -> Option<Self> {
        (means.len() == stdevs.len()).then_some(Self { means, stdevs })
    }

    /// 各能量带均值.
    #[inline]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// 各能量带标准差.
    #[inline]
    pub fn stdevs(&self) -> &[f64] {
        &self.stdevs
    }

    /// 能量带个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.means.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }
}

/// 两遍法求均值与总体标准差. `values` 不能为空.
fn mean_std<I>(values: I) -> (f64, f64)
where
    I: Iterator<Item = f64> + Clone,
{
    let (sum, cnt) = values.clone().fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    let mean = sum / cnt as f64;
    let sq = values.map(|v| (v - mean).powi(2)).sum::<f64>();
    (mean, (sq / cnt as f64).sqrt())
}

/// 两遍法求 `mask > 0` 位置上的均值与总体标准差. 掩膜不选中任何像素时返回 `None`.
///
/// 由调用者保证两者形状一致.
fn masked_mean_std(band: ArrayView2<f64>, mask: ArrayView2<f64>) -> Option<(f64, f64)> {
    let (sum, cnt) = Zip::from(band)
        .and(mask)
        .fold((0.0, 0usize), |(s, c), &v, &m| {
            if m > 0.0 {
                (s + v, c + 1)
            } else {
                (s, c)
            }
        });
    if cnt == 0 {
        return None;
    }
    let mean = sum / cnt as f64;
    let sq = Zip::from(band).and(mask).fold(0.0, |acc, &v, &m| {
        if m > 0.0 {
            acc + (v - mean).powi(2)
        } else {
            acc
        }
    });
    Some((mean, (sq / cnt as f64).sqrt()))
}

/// 统计每个能量带在 `region` 内的均值和标准差.
///
/// - 掩膜区域: 仅统计掩膜值 > 0 的像素. 掩膜形状必须与能量带一致.
/// - 中心区域: 统计 [`CentralBox::ranges`] 给出的矩形.
///
/// 区域不含任何像素时返回 [`NormError::EmptyRegion`].
pub fn band_statistics(bands: &EnergyBands, region: Region) -> NormResult<BandStatistics> {
    let shape = bands.shape();
    let mut means = Vec::with_capacity(bands.len());
    let mut stdevs = Vec::with_capacity(bands.len());

    match region {
        Either::Left(mask) => {
            if mask.dim() != shape {
                return Err(NormError::ShapeMismatch {
                    expected: shape,
                    actual: mask.dim(),
                });
            }
            for band in bands.iter() {
                let (m, s) = masked_mean_std(band.view(), mask).ok_or(NormError::EmptyRegion)?;
                means.push(m);
                stdevs.push(s);
            }
        }
        Either::Right(central) => {
            let (rows, cols) = central.ranges(shape);
            if rows.is_empty() || cols.is_empty() {
                return Err(NormError::EmptyRegion);
            }
            for band in bands.iter() {
                let sub = band.slice(s![rows.clone(), cols.clone()]);
                let (m, s) = mean_std(sub.iter().copied());
                means.push(m);
                stdevs.push(s);
            }
        }
    }

    Ok(BandStatistics { means, stdevs })
}
