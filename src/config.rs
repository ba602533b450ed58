use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::message::Channel;
use crate::typing::TypingTimings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Name shown next to the coach's own messages
    #[serde(default = "default_coach_name")]
    pub coach_name: String,

    /// Reply channel for clients whose history carries no channel at all
    #[serde(default = "default_channel")]
    pub default_channel: Channel,

    /// Delay before the simulated typing indicator appears
    #[serde(default = "default_typing_show_delay_ms")]
    pub typing_show_delay_ms: u64,

    /// Delay (from the same trigger) before the indicator disappears again
    #[serde(default = "default_typing_hide_delay_ms")]
    pub typing_hide_delay_ms: u64,

    #[serde(default = "default_true")]
    pub show_receipts: bool,

    /// Colour read receipts with the channel's accent colour
    #[serde(default = "default_true")]
    pub color_receipts: bool,

    #[serde(default = "default_sidebar_width")]
    pub sidebar_width: u16,

    /// JSON message log to start from instead of the built-in demo data
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Loopback gateway: delay before a sent message is reported delivered
    #[serde(default = "default_demo_delivered_after_ms")]
    pub demo_delivered_after_ms: u64,

    /// Loopback gateway: delay before a sent message is reported read
    #[serde(default = "default_demo_read_after_ms")]
    pub demo_read_after_ms: u64,
}

fn default_coach_name() -> String {
    "Coach".to_string()
}

fn default_channel() -> Channel {
    Channel::Telegram
}

fn default_typing_show_delay_ms() -> u64 {
    500
}

fn default_typing_hide_delay_ms() -> u64 {
    3500
}

fn default_true() -> bool {
    true
}

fn default_sidebar_width() -> u16 {
    26
}

fn default_demo_delivered_after_ms() -> u64 {
    1200
}

fn default_demo_read_after_ms() -> u64 {
    4000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coach_name: default_coach_name(),
            default_channel: default_channel(),
            typing_show_delay_ms: default_typing_show_delay_ms(),
            typing_hide_delay_ms: default_typing_hide_delay_ms(),
            show_receipts: true,
            color_receipts: true,
            sidebar_width: default_sidebar_width(),
            snapshot_path: None,
            demo_delivered_after_ms: default_demo_delivered_after_ms(),
            demo_read_after_ms: default_demo_read_after_ms(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Serialize this config to TOML and write it to `path` (or the default path).
    pub fn save(&self, path: Option<&str>) -> Result<()> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path(),
        };
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
        Ok(())
    }

    pub fn typing_timings(&self) -> TypingTimings {
        TypingTimings {
            show_after: Duration::from_millis(self.typing_show_delay_ms),
            hide_after: Duration::from_millis(self.typing_hide_delay_ms.max(self.typing_show_delay_ms)),
        }
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("coach-inbox")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = Config::load(path.to_str()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.typing_timings(), TypingTimings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_channel = \"email\"\ntyping_show_delay_ms = 250\n").unwrap();

        let config = Config::load(path.to_str()).unwrap();
        assert_eq!(config.default_channel, Channel::Email);
        assert_eq!(config.typing_show_delay_ms, 250);
        assert_eq!(config.typing_hide_delay_ms, 3500);
        assert_eq!(config.coach_name, "Coach");
    }

    #[test]
    fn bad_channel_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_channel = \"pager\"\n").unwrap();
        let err = Config::load(path.to_str()).unwrap_err();
        assert!(format!("{err}").starts_with("Failed to parse config"));
    }

    #[test]
    fn hide_delay_never_precedes_show_delay() {
        let config = Config {
            typing_show_delay_ms: 900,
            typing_hide_delay_ms: 100,
            ..Config::default()
        };
        let t = config.typing_timings();
        assert_eq!(t.hide_after, t.show_after);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        let config = Config {
            coach_name: "Jess".to_string(),
            sidebar_width: 30,
            ..Config::default()
        };
        config.save(path.to_str()).unwrap();
        assert_eq!(Config::load(path.to_str()).unwrap(), config);
    }
}
