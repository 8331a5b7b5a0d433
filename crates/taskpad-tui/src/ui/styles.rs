use ratatui::style::{Color, Modifier, Style};

use taskpad_core::models::{STATUS_DONE, STATUS_IN_PROGRESS};
use taskpad_core::ToastLevel;

// Color palette
pub const PRIMARY: Color = Color::Rgb(64, 128, 192);
pub const SECONDARY: Color = Color::Rgb(96, 160, 96);
pub const ACCENT: Color = Color::Rgb(192, 160, 64);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(48, 48, 64);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().bg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

/// Foreground for a todo's status column
pub fn status_style(status: &str) -> Style {
    match status {
        STATUS_DONE => Style::default().fg(SECONDARY),
        STATUS_IN_PROGRESS => Style::default().fg(ACCENT),
        _ => Style::default().fg(Color::White),
    }
}

/// Border and text color for a toast
pub fn toast_style(level: ToastLevel) -> Style {
    let color = match level {
        ToastLevel::Success => SECONDARY,
        ToastLevel::Error => ERROR,
        ToastLevel::Info => PRIMARY,
    };
    Style::default().fg(color)
}
