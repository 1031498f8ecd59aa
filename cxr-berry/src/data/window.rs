use crate::consts::{DISPLAY_MAX, DISPLAY_MIN};

/// 强度窗口, 包含窗下限和窗上限.
///
/// 窗口内的值被线性映射到显示范围 `[DISPLAY_MIN, DISPLAY_MAX]` (即 `[0, 4095]`),
/// 窗口外的值被截断到显示范围两端.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntensityWindow {
    lower: f64,
    upper: f64,
}

impl IntensityWindow {
    /// 构建强度窗.
    ///
    /// `lower` 和 `upper` 必须是有限值且 `lower < upper`, 否则返回 `None`.
    pub fn new(lower: f64, upper: f64) -> Option<IntensityWindow> {
        if lower.is_finite() && upper.is_finite() && lower < upper {
            Some(Self { lower, upper })
        } else {
            None
        }
    }

    /// 构建以 `center` 为中心, 半宽为 `half_width` 的强度窗.
    #[inline]
    pub fn centered(center: f64, half_width: f64) -> Option<IntensityWindow> {
        Self::new(center - half_width, center + half_width)
    }

    /// 与显示范围重合的窗口. 其作用仅为截断.
    #[inline]
    pub const fn display() -> IntensityWindow {
        Self {
            lower: DISPLAY_MIN,
            upper: DISPLAY_MAX,
        }
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f64 {
        self.lower
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f64 {
        self.upper
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// 求 `value` 映射到显示范围后的实数值 (0.0 <= ret <= 4095.0).
    ///
    /// NaN 会被映射为 NaN, 由调用者负责避免.
    #[inline]
    pub fn eval_f64(&self, value: f64) -> f64 {
        let scaled =
            (DISPLAY_MAX - DISPLAY_MIN) * ((value - self.lower) / self.width()) + DISPLAY_MIN;
        num::clamp(scaled, DISPLAY_MIN, DISPLAY_MAX)
    }

    /// 求 `value` 映射到显示范围后的整数值 (0 <= ret <= 4095). 小数部分被直接舍去.
    ///
    /// 如果 `value` 无意义 (如 NaN), 则返回 `None`.
    #[inline]
    pub fn eval(&self, value: f64) -> Option<u16> {
        if value.is_nan() {
            return None;
        }
        Some(self.eval_f64(value) as u16)
    }
}
