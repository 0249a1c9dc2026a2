//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::Priority;

/// Low priority
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
/// Medium priority
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// High priority
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Modal dialogs
pub const DARK_PURPLE: Color = Color::Rgb(86, 60, 92);

pub fn priority_color(p: Priority) -> Color {
    match p {
        Priority::Low => DARK_GREEN,
        Priority::Medium => GOLD,
        Priority::High => DARK_RED,
    }
}
