use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Theme data structure containing all colors used in the application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    // Panel borders
    pub active_border: Color,
    pub inactive_border: Color,

    // Search box
    pub search_text: Color,
    pub placeholder: Color,

    // Rows
    pub selected_bg: Color,
    pub selected_fg: Color,
    pub directory: Color,
    pub file_default: Color,
    pub sub_repository: Color,
    pub badge: Color,
    pub description: Color,
    pub empty_message: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_help_text: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            // Panel borders
            active_border: Color::Yellow,
            inactive_border: Color::DarkGray,

            // Search box
            search_text: Color::Reset,
            placeholder: Color::DarkGray,

            // Rows
            selected_bg: Color::White,
            selected_fg: Color::Black,
            directory: Color::Blue,
            file_default: Color::Reset,
            sub_repository: Color::Magenta,
            badge: Color::DarkGray,
            description: Color::Gray,
            empty_message: Color::Gray,

            // Status bar
            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_help_text: Color::Gray,
        }
    }
}
