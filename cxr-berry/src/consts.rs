//! 通用常量.
//!
//! 这里的常量仅作为各配置结构 `Default` 实现的取值来源.
//! 算法代码本身不直接引用参考系数和 sigma 序列, 而是从注入的配置中读取.

/// 显示范围下限.
pub const DISPLAY_MIN: f64 = 0.0;

/// 显示范围上限 (12-bit).
pub const DISPLAY_MAX: f64 = 4095.0;

/// 能量带分解所用的 sigma 序列 (单位: 像素), 共 5 个尺度, 6 个能量带.
pub const SIGMAS: [f64; 5] = [1.0, 2.0, 4.0, 8.0, 16.0];

/// 第一阶段 (中心 70% 区域) 的参考系数.
///
/// 由 50 张参考 CXR 图像离线计算得出. 第一个系数恒为 1 且不参与计算.
pub const COEFFS_CENTRAL_70: [f64; 6] = [
    1.0, 0.15046743, 0.09473514, 0.06337214, 0.0451897, 0.03574716,
];

/// 第二阶段 (肺部掩膜区域) 的参考系数.
pub const COEFFS_LUNG_MASK: [f64; 6] = [
    1.0, 0.26093275, 0.18805708, 0.13976646, 0.1033522, 0.07498657,
];

/// 中心统计区域的起始比例.
pub const CENTRAL_LO: f64 = 0.15;

/// 中心统计区域的终止比例 (不含).
pub const CENTRAL_HI: f64 = 0.85;

/// 去除黑边时, 相对图像自身对比度范围的阈值比例.
pub const BORDER_THRESHOLD_FACTOR: f64 = 0.05;

/// 第一阶段缩放后的长边边长 (单位: 像素).
pub const STAGE1_LONG_EDGE: usize = 2048;

/// 第一阶段可读图像的窗口半宽, 窗口中心为归一化图像均值.
pub const STAGE1_HALF_WINDOW: f64 = 5.0;

/// 第二阶段输出的窗口下限.
pub const STAGE2_WINDOW_LOWER: f64 = -5.0;

/// 第二阶段输出的窗口上限.
pub const STAGE2_WINDOW_UPPER: f64 = 5.0;

/// 标准差下限. 低于该值的能量带被视为退化.
pub const MIN_STDEV: f64 = 1e-10;

/// 肺部裁剪边距 (单位: 毫米).
pub const LUNG_MARGIN_MM: f64 = 15.0;

/// 默认最终正方形边长 (单位: 像素).
pub const FINAL_SQUARE_SIZE: usize = 1024;

/// 高斯核截断半径, 以 sigma 为单位.
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;
