//! Theme system for the TUI.
//!
//! Semantic color roles map to ratatui `Style` values. `ThemeVariant`
//! selects the Dark or Light palette and `StyleMap` resolves role names to
//! concrete styles at draw time.

use ratatui::style::{Color, Modifier, Style};
use std::collections::HashMap;

// ============================================================================
// Theme Variant
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// Brand and gauge band colors shared by both variants.
const ACCENT: Color = Color::Rgb(255, 121, 0);
const BAND_NEGATIVE: Color = Color::Rgb(255, 107, 107);
const BAND_NEUTRAL: Color = Color::Rgb(255, 209, 102);
const BAND_POSITIVE: Color = Color::Rgb(6, 214, 160);

// ============================================================================
// Color Palette
// ============================================================================

/// Every semantic UI role mapped to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Lists and tables --
    pub list_normal: Style,
    pub list_selected: Style,
    pub table_header: Style,

    // -- Form fields --
    pub field_label: Style,
    pub field_value: Style,
    pub field_focused: Style,
    pub field_editing: Style,

    // -- Article preview --
    pub preview_heading: Style,
    pub preview_body: Style,
    pub preview_metadata: Style,
    pub preview_code_block: Style,
    pub preview_inline_code: Style,
    pub preview_emphasis: Style,
    pub preview_strong: Style,
    pub preview_link: Style,

    // -- Analytics --
    pub gauge_negative: Style,
    pub gauge_neutral: Style,
    pub gauge_positive: Style,
    pub keyword_bar: Style,
    pub keyword_tag: Style,

    // -- Chrome --
    pub status_bar: Style,
    pub status_busy: Style,
    pub banner_error: Style,
    pub banner_success: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub empty_state: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            list_normal: Style::default(),
            list_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            table_header: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),

            field_label: Style::default().fg(Color::Gray),
            field_value: Style::default(),
            field_focused: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            field_editing: Style::default().fg(Color::Black).bg(Color::Cyan),

            preview_heading: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            preview_body: Style::default(),
            preview_metadata: Style::default().fg(Color::DarkGray),
            preview_code_block: Style::default().fg(Color::Yellow).bg(Color::Black),
            preview_inline_code: Style::default().fg(Color::Yellow),
            preview_emphasis: Style::default().add_modifier(Modifier::ITALIC),
            preview_strong: Style::default().add_modifier(Modifier::BOLD),
            preview_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),

            gauge_negative: Style::default().fg(BAND_NEGATIVE).bg(Color::Black),
            gauge_neutral: Style::default().fg(BAND_NEUTRAL).bg(Color::Black),
            gauge_positive: Style::default().fg(BAND_POSITIVE).bg(Color::Black),
            keyword_bar: Style::default().fg(ACCENT),
            keyword_tag: Style::default().fg(Color::Black).bg(ACCENT),

            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            status_busy: Style::default()
                .bg(Color::DarkGray)
                .fg(ACCENT)
                .add_modifier(Modifier::BOLD),
            banner_error: Style::default().fg(Color::White).bg(Color::Red),
            banner_success: Style::default().fg(Color::Black).bg(Color::Green),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
            tab_active: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            empty_state: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        }
    }

    /// For light terminal backgrounds.
    fn light() -> Self {
        Self {
            list_normal: Style::default().fg(Color::Black),
            list_selected: Style::default().bg(Color::Blue).fg(Color::White),
            table_header: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),

            field_label: Style::default().fg(Color::DarkGray),
            field_value: Style::default().fg(Color::Black),
            field_focused: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            field_editing: Style::default().fg(Color::White).bg(Color::Blue),

            preview_heading: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            preview_body: Style::default().fg(Color::Black),
            preview_metadata: Style::default().fg(Color::DarkGray),
            preview_code_block: Style::default().fg(Color::DarkGray).bg(Color::White),
            preview_inline_code: Style::default().fg(Color::DarkGray),
            preview_emphasis: Style::default().add_modifier(Modifier::ITALIC),
            preview_strong: Style::default().add_modifier(Modifier::BOLD),
            preview_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),

            gauge_negative: Style::default().fg(BAND_NEGATIVE).bg(Color::Gray),
            gauge_neutral: Style::default().fg(BAND_NEUTRAL).bg(Color::Gray),
            gauge_positive: Style::default().fg(BAND_POSITIVE).bg(Color::Gray),
            keyword_bar: Style::default().fg(ACCENT),
            keyword_tag: Style::default().fg(Color::White).bg(ACCENT),

            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            status_busy: Style::default()
                .bg(Color::White)
                .fg(ACCENT)
                .add_modifier(Modifier::BOLD),
            banner_error: Style::default().fg(Color::White).bg(Color::Red),
            banner_success: Style::default().fg(Color::White).bg(Color::Green),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Blue),
            tab_active: Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            empty_state: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        }
    }
}

// ============================================================================
// Style Map
// ============================================================================

/// String-keyed style lookup built from a `ColorPalette`.
#[derive(Debug, Clone)]
pub struct StyleMap {
    map: HashMap<&'static str, Style>,
}

/// All semantic role names, in declaration order.
const ROLE_NAMES: [&str; 29] = [
    "list_normal",
    "list_selected",
    "table_header",
    "field_label",
    "field_value",
    "field_focused",
    "field_editing",
    "preview_heading",
    "preview_body",
    "preview_metadata",
    "preview_code_block",
    "preview_inline_code",
    "preview_emphasis",
    "preview_strong",
    "preview_link",
    "gauge_negative",
    "gauge_neutral",
    "gauge_positive",
    "keyword_bar",
    "keyword_tag",
    "status_bar",
    "status_busy",
    "banner_error",
    "banner_success",
    "panel_border",
    "panel_border_focused",
    "tab_active",
    "tab_inactive",
    "empty_state",
];

impl StyleMap {
    pub fn from_palette(p: &ColorPalette) -> Self {
        let styles: [Style; 29] = [
            p.list_normal,
            p.list_selected,
            p.table_header,
            p.field_label,
            p.field_value,
            p.field_focused,
            p.field_editing,
            p.preview_heading,
            p.preview_body,
            p.preview_metadata,
            p.preview_code_block,
            p.preview_inline_code,
            p.preview_emphasis,
            p.preview_strong,
            p.preview_link,
            p.gauge_negative,
            p.gauge_neutral,
            p.gauge_positive,
            p.keyword_bar,
            p.keyword_tag,
            p.status_bar,
            p.status_busy,
            p.banner_error,
            p.banner_success,
            p.panel_border,
            p.panel_border_focused,
            p.tab_active,
            p.tab_inactive,
            p.empty_state,
        ];

        let map = ROLE_NAMES.iter().copied().zip(styles).collect();
        Self { map }
    }

    /// Style for `role`, `Style::default()` when unknown.
    pub fn resolve(&self, role: &str) -> Style {
        self.map.get(role).copied().unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
