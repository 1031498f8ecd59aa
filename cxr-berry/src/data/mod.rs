//! 胸片的基础数据结构: 像素间距和强度窗口.

mod spacing;
mod window;

pub use spacing::Spacing;
pub use window::IntensityWindow;
