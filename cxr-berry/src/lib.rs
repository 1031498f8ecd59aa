#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供胸部 X 光片 (CXR) 的强度归一化与几何标准化.
//!
//! 该 crate 只提供 `safe` 接口. 肺部分割模型不属于本 crate,
//! 由调用者通过 [`LungSegmenter`] 注入.
//!
//! # 注意
//!
//! 1. 输入图像为 `(height, width)` 的单通道二维数组, 不含通道维度.
//! 2. 数据相关的失败 (形状不符, 能量带退化等) 一律以 [`NormError`] 返回, 不会 panic.
//!   "分割未找到肺部" 不是错误, 而是 [`Standardized::NoLungsFound`].
//!
//! # 开发计划
//!
//! ### 能量带分解 ✅
//!
//! 以一组递增的 sigma 做循环边界高斯平滑, 相邻平滑结果之差即为能量带.
//! 全部能量带之和严格等于原图.
//!
//! 参考论文: Philipsen et al., "Localized Energy-Based Normalization of
//! Medical Images: Application to Chest Radiography", IEEE TMI 2015.
//!
//! 实现位于 `cxr-berry/src/bands`.
//!
//! ### 两阶段强度归一化 ✅
//!
//! 1. 中心 70% 区域统计, 得到可读图像; ✅
//! 2. 外部肺部分割; ✅
//! 3. 肺部掩膜区域统计, 得到最终归一化图像. ✅
//!
//! 实现位于 `cxr-berry/src/norm`.
//!
//! ### 几何标准化与尺寸变化记录 ✅
//!
//! 去黑边, 保持宽高比缩放, 肺部裁剪, 填充为正方形. 每一步都产生一条
//! [`SizeChange`] 记录, 可以在配准的其它图像 (如掩膜) 上按顺序重放.
//!
//! 实现位于 `cxr-berry/src/geometry`.
//!
//! ### 小功能 ✅
//!
//! 1. 尺寸变化记录的持久化 (`serde` feature, bincode). ✅
//! 2. 可替换的参考系数和 sigma 序列 ([`NormalizerConfig`]). ✅
//!
//! ### 完善代码文档 ✅
//!
//! 给每个 public API 提供文档, 并视情况给 private
//! API 提供文档.

/// 二维索引 `(h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 像素间距与强度窗口.
mod data;

pub use data::{IntensityWindow, Spacing};

mod error;

pub use error::{NormError, NormResult};

pub mod consts;

pub mod bands;

pub mod geometry;

pub mod norm;

pub use norm::{CentralNorm, Normalized, Normalizer, NormalizerConfig, StandardizerConfig};

pub mod segment;

pub use segment::LungSegmenter;

mod standardize;

pub use standardize::{standardize, Standardized, Standardizer};

pub mod prelude;
