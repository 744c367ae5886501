//! Color theme system for planrev.
//!
//! A `Theme` holds named `ratatui::style::Color` fields covering every surface
//! planrev renders. Two built-in themes are provided:
//!
//! - `dark`: xterm 256-color indices tuned for dark backgrounds.
//! - `light`: the same layout with darker foregrounds for light backgrounds.
//!
//! Each theme also names the syntect theme used for fenced code blocks so that
//! highlighted code matches the surrounding palette.

use ratatui::style::Color;

/// All color values used across planrev's UI surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    // Panel borders
    /// Border color for the focused pane.
    pub border_active: Color,
    /// Border color for the unfocused pane.
    pub border_inactive: Color,

    // Step tree
    /// Plan title line above the panes.
    pub title: Color,
    /// Row under the cursor.
    pub selected_step: Color,
    pub normal_step: Color,
    /// `[*]` / `[*N]` comment count badge.
    pub comment_badge: Color,
    /// `[✓]` viewed badge.
    pub viewed_badge: Color,

    // Detail pane
    pub heading: Color,
    pub inline_code: Color,
    pub link: Color,
    pub quote: Color,
    pub rule: Color,
    /// Border of rendered review comment boxes.
    pub comment_border: Color,

    // Status bar and overlays
    pub status_fg: Color,
    /// Key names inside status hints.
    pub status_key: Color,
    pub help_fg: Color,
    /// Border of the search bar and modal dialogs.
    pub dialog_border: Color,

    /// Name of the syntect theme used for fenced code blocks.
    pub syntect_theme: &'static str,
}

impl Theme {
    /// Returns the built-in dark theme.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Indexed(62),
            border_inactive: Color::Indexed(240),

            title: Color::Indexed(170),
            selected_step: Color::Indexed(212),
            normal_step: Color::Indexed(252),
            comment_badge: Color::Indexed(170),
            viewed_badge: Color::Indexed(82),

            heading: Color::Indexed(75),
            inline_code: Color::Indexed(215),
            link: Color::Indexed(39),
            quote: Color::Indexed(245),
            rule: Color::Indexed(240),
            comment_border: Color::Indexed(62),

            status_fg: Color::Indexed(240),
            status_key: Color::Indexed(62),
            help_fg: Color::Indexed(250),
            dialog_border: Color::Indexed(170),

            syntect_theme: "base16-ocean.dark",
        }
    }

    /// Returns the built-in light theme.
    pub fn light() -> Self {
        Self {
            border_active: Color::Indexed(25),
            border_inactive: Color::Indexed(250),

            title: Color::Indexed(127),
            selected_step: Color::Indexed(161),
            normal_step: Color::Indexed(235),
            comment_badge: Color::Indexed(127),
            viewed_badge: Color::Indexed(28),

            heading: Color::Indexed(25),
            inline_code: Color::Indexed(130),
            link: Color::Indexed(26),
            quote: Color::Indexed(242),
            rule: Color::Indexed(250),
            comment_border: Color::Indexed(25),

            status_fg: Color::Indexed(242),
            status_key: Color::Indexed(25),
            help_fg: Color::Indexed(238),
            dialog_border: Color::Indexed(127),

            syntect_theme: "InspiredGitHub",
        }
    }

    /// Resolves a theme name to the corresponding built-in theme.
    ///
    /// Unknown names fall back to `dark()` so a typo in config never prevents
    /// startup. The fallback is logged, not treated as an error.
    ///
    /// # Arguments
    ///
    /// * `name`: theme name from the CLI or config, e.g. `"dark"` or `"light"`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to dark");
                Self::dark()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_resolves_builtins() {
        assert_eq!(Theme::from_name("light"), Theme::light());
        assert_eq!(Theme::from_name("dark"), Theme::dark());
        assert_eq!(Theme::from_name("solarized"), Theme::dark());
    }
}
