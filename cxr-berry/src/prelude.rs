//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx2d;

pub use crate::{IntensityWindow, Spacing};
pub use crate::{NormError, NormResult};

pub use crate::bands::{split_energy_bands, EnergyBands, ReferenceCoefficients};
pub use crate::geometry::{SizeChange, SizeChanges};
pub use crate::segment::LungSegmenter;

pub use crate::norm::{Normalized, Normalizer, NormalizerConfig, StandardizerConfig};
pub use crate::{standardize, Standardized, Standardizer};

pub use crate::consts::{FINAL_SQUARE_SIZE, LUNG_MARGIN_MM};
