//! Configuration loading and management
//!
//! Handles parsing of `triage.toml` from the store's data directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::scan::{TicketPattern, DEFAULT_TICKET_PATTERN};

/// Name of the config file inside the data directory
pub const CONFIG_FILE: &str = "triage.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Sync configuration
    #[serde(default)]
    pub sync: SyncConfig,

    /// Reward configuration
    #[serde(default)]
    pub rewards: RewardsConfig,
}

/// Sync-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Look-back window in days for the very first sync
    #[serde(default = "default_initial_sync_days")]
    pub initial_sync_days: i64,

    /// Minimum look-back window in hours applied to every later sync
    #[serde(default = "default_safety_net_hours")]
    pub safety_net_hours: i64,

    /// Regex matched against subject/body text to discover ticket keys
    #[serde(default = "default_ticket_pattern")]
    pub ticket_pattern: String,

    /// Base URL used to render ticket links (e.g. a tracker's browse URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_base_url: Option<String>,
}

fn default_initial_sync_days() -> i64 {
    7
}

fn default_safety_net_hours() -> i64 {
    24
}

fn default_ticket_pattern() -> String {
    DEFAULT_TICKET_PATTERN.to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            initial_sync_days: default_initial_sync_days(),
            safety_net_hours: default_safety_net_hours(),
            ticket_pattern: default_ticket_pattern(),
            ticket_base_url: None,
        }
    }
}

/// Reward configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// Completed Q2 tasks per reward
    #[serde(default = "default_q2_milestone")]
    pub q2_milestone: u64,
}

fn default_q2_milestone() -> u64 {
    20
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            q2_milestone: default_q2_milestone(),
        }
    }
}

impl Config {
    /// Load configuration from a `triage.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a data directory, or return defaults
    pub fn load_from_dir(data_dir: &Path) -> Self {
        let config_path = data_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &PathBuf) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Compile the configured ticket pattern
    pub fn ticket_pattern(&self) -> crate::error::Result<TicketPattern> {
        TicketPattern::new(&self.sync.ticket_pattern)
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.sync.initial_sync_days <= 0 {
            return Err(crate::error::Error::InvalidConfig(
                "sync.initial_sync_days must be > 0".to_string(),
            ));
        }
        if self.sync.safety_net_hours <= 0 {
            return Err(crate::error::Error::InvalidConfig(
                "sync.safety_net_hours must be > 0".to_string(),
            ));
        }
        if self.rewards.q2_milestone == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "rewards.q2_milestone must be > 0".to_string(),
            ));
        }

        TicketPattern::new(&self.sync.ticket_pattern)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.sync.initial_sync_days, 7);
        assert_eq!(cfg.sync.safety_net_hours, 24);
        assert_eq!(cfg.sync.ticket_pattern, DEFAULT_TICKET_PATTERN);
        assert!(cfg.sync.ticket_base_url.is_none());
        assert_eq!(cfg.rewards.q2_milestone, 20);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
[sync]
initial_sync_days = 14
safety_net_hours = 48
ticket_pattern = '\b(BDC-|BM-)\d+\b'
ticket_base_url = "https://tracker.example.com/browse"

[rewards]
q2_milestone = 10
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.sync.initial_sync_days, 14);
        assert_eq!(cfg.sync.safety_net_hours, 48);
        assert_eq!(cfg.sync.ticket_pattern, r"\b(BDC-|BM-)\d+\b");
        assert_eq!(
            cfg.sync.ticket_base_url.as_deref(),
            Some("https://tracker.example.com/browse")
        );
        assert_eq!(cfg.rewards.q2_milestone, 10);
    }

    #[test]
    fn invalid_window_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[sync]\ninitial_sync_days = 0\n").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_pattern_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[sync]\nticket_pattern = '(['\n").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path());
        assert_eq!(cfg.sync.initial_sync_days, 7);
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        let cfg = Config::default();
        cfg.save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("initial_sync_days = 7"));
    }
}
