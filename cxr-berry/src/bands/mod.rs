//! 多尺度能量带: 分解, 区域统计与重建.
//!
//! 参考论文: Philipsen et al., "Localized Energy-Based Normalization of
//! Medical Images: Application to Chest Radiography", IEEE TMI 2015.

mod gaussian;
mod recon;
mod split;
mod stats;

pub use recon::{reconstruct, ReferenceCoefficients};
pub use split::{split_energy_bands, EnergyBands};
pub use stats::{band_statistics, BandStatistics, CentralBox, Region};

pub(crate) use split::check_sigmas;
