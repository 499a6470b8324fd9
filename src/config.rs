//! Relay configuration
//!
//! Loaded from a JSON file; every field has a default so a missing file or a
//! partial config is fine. The webhook URL is the one setting that has no
//! usable default and is validated at the point of use.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "crash-relay.json";
pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y (%A): %H:%M:%S [%z]";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Report fresh crash dumps to the webhook
    pub report_crash: bool,
    /// Discord webhook URL
    pub webhook_url: String,
    /// Send a short announcement before the detailed embed
    pub announce_crash_report: bool,
    /// Announce with the full data path instead of its last segment
    pub announce_full_path: bool,
    /// strftime format for the dump creation time
    pub date_format: String,
    /// Delete expired dump files during the old-dump sweep
    pub delete_files: bool,
    /// How long a dump stays relevant, hours
    pub validity_duration: u64,
    /// Attach the raw dump file to the webhook payload
    pub attach_dump_file: bool,
    /// Webhook request timeout, seconds
    pub timeout_secs: u64,
    /// Server data directory; dumps live under `<data_dir>/crashdumps`
    pub data_dir: PathBuf,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            report_crash: false,
            webhook_url: String::new(),
            announce_crash_report: true,
            announce_full_path: false,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            delete_files: false,
            validity_duration: 24,
            attach_dump_file: true,
            timeout_secs: 10,
            data_dir: PathBuf::from("."),
        }
    }
}

impl RelayConfig {
    /// Load from `path`, or from `crash-relay.json` in the working directory
    /// when no path is given. A missing default file yields the defaults; an
    /// explicitly named file must exist and parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Directory the server writes crash dumps into.
    pub fn crashdump_dir(&self) -> PathBuf {
        self.data_dir.join("crashdumps")
    }

    /// Validity window in seconds.
    pub fn validity_secs(&self) -> f64 {
        (self.validity_duration * 3600) as f64
    }
}
