//! User configuration loaded from `config.toml`.
//!
//! Every key is optional; CLI flags override whatever is set here.

use std::path::PathBuf;

use serde::Deserialize;

use crate::output::OutputKind;

pub const DEFAULT_LEFT_RATIO: u16 = 30;
pub const MIN_LEFT_RATIO: u16 = 10;
pub const MAX_LEFT_RATIO: u16 = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `"dark"` or `"light"`.
    pub theme: Option<String>,
    pub output: Option<OutputKind>,
    pub track_viewed: bool,
    /// Left pane width in percent of the terminal.
    pub left_ratio: Option<u16>,
}

/// Returns the path to the planrev config file.
///
/// Prefers `$XDG_CONFIG_HOME/planrev/config.toml`; falls back to
/// `~/.config/planrev/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("planrev").join("config.toml")
}

impl Config {
    /// Loads the config file, or defaults when it is missing or malformed.
    ///
    /// A parse error is logged, never fatal.
    pub fn load() -> Self {
        let path = config_path();
        let raw = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(_) => return Self::default(),
        };
        match Self::from_toml(&raw) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config");
                Self::default()
            }
        }
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Configured left pane ratio clamped into the supported range.
    pub fn left_ratio(&self) -> u16 {
        self.left_ratio
            .unwrap_or(DEFAULT_LEFT_RATIO)
            .clamp(MIN_LEFT_RATIO, MAX_LEFT_RATIO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").expect("parse");
        assert_eq!(config, Config::default());
        assert_eq!(config.left_ratio(), DEFAULT_LEFT_RATIO);
    }

    #[test]
    fn all_keys_parse() {
        let config = Config::from_toml(
            "theme = \"light\"\noutput = \"file\"\ntrack_viewed = true\nleft_ratio = 40\n",
        )
        .expect("parse");
        assert_eq!(config.theme.as_deref(), Some("light"));
        assert_eq!(config.output, Some(OutputKind::File));
        assert!(config.track_viewed);
        assert_eq!(config.left_ratio(), 40);
    }

    #[test]
    fn left_ratio_is_clamped() {
        let low = Config {
            left_ratio: Some(2),
            ..Config::default()
        };
        let high = Config {
            left_ratio: Some(90),
            ..Config::default()
        };
        assert_eq!(low.left_ratio(), MIN_LEFT_RATIO);
        assert_eq!(high.left_ratio(), MAX_LEFT_RATIO);
    }

    #[test]
    fn unknown_output_is_an_error() {
        assert!(Config::from_toml("output = \"printer\"").is_err());
    }
}
