//! 运行时错误.

use crate::geometry::SizeChange;
use crate::Idx2d;
use thiserror::Error;

/// 归一化或几何标准化的运行时错误.
///
/// "分割未找到肺部" 不属于错误, 它由 [`crate::Normalized::NoLungsFound`]
/// 和 [`crate::Standardized::NoLungsFound`] 表示.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormError {
    /// sigma 序列为空.
    #[error("sigma 序列不能为空")]
    EmptySigmas,

    /// sigma 非正、非有限, 或序列没有严格递增.
    #[error("非法 sigma 值: {0}")]
    InvalidSigma(f64),

    /// 参考系数个数与能量带个数不一致.
    #[error("参考系数个数 {actual} 与能量带个数 {expected} 不一致")]
    CoefficientMismatch {
        /// 能量带个数.
        expected: usize,
        /// 实际提供的系数个数.
        actual: usize,
    },

    /// 能量带之间形状不一致, 或能量带为空.
    #[error("能量带形状不一致")]
    BandShapeMismatch,

    /// 掩膜 / 分割结果 / 待回放图像的形状与期望不符.
    #[error("形状不符: 期望 {expected:?}, 实际 {actual:?}")]
    ShapeMismatch {
        /// 期望形状 (高, 宽).
        expected: Idx2d,
        /// 实际形状 (高, 宽).
        actual: Idx2d,
    },

    /// 统计区域不包含任何像素.
    #[error("统计区域为空")]
    EmptyRegion,

    /// 某能量带在统计区域内的标准差为零、过小或非有限值.
    #[error("第 {band} 个能量带的标准差退化: {stdev}")]
    DegenerateBand {
        /// 能量带索引.
        band: usize,
        /// 该能量带的标准差.
        stdev: f64,
    },

    /// 输入图像没有像素.
    #[error("输入图像为空")]
    EmptyImage,

    /// 像素间距非正或非有限.
    #[error("非法像素间距")]
    InvalidSpacing,

    /// 目标边长为 0.
    #[error("非法目标边长: {0}")]
    InvalidTargetSize(usize),

    /// 裁剪边距为负或非有限值 (单位: 毫米).
    #[error("非法裁剪边距: {0} mm")]
    InvalidMargin(f64),

    /// 去黑边阈值比例为负或非有限值.
    #[error("非法去黑边阈值比例: {0}")]
    InvalidThreshold(f64),

    /// 用于裁剪的掩膜不含前景像素.
    #[error("掩膜不含前景像素, 无法裁剪")]
    EmptyMask,

    /// 尺寸变化记录自相矛盾, 无法回放 (如裁剪量超过图像尺寸).
    #[error("非法尺寸变化记录: {0:?}")]
    InvalidRecord(SizeChange),

    /// 强度窗口上下限非法.
    #[error("非法强度窗口: [{lower}, {upper}]")]
    InvalidWindow {
        /// 窗下限.
        lower: f64,
        /// 窗上限.
        upper: f64,
    },
}

/// 归一化 / 标准化运行时结果.
pub type NormResult<T> = Result<T, NormError>;
