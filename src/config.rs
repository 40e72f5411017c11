//! opstrack configuration.
//!
//! Loaded from `~/.opstrack/config.toml`. Every key is optional and a missing
//! file means defaults:
//!
//! ```toml
//! data-dir = "/srv/tracker/export"
//! timezone = "Europe/Paris"
//! default-days = 7
//! ```
//!
//! The data directory is resolved through a chain:
//!
//! 1. `--data <dir>`: explicit per-command override
//! 2. `OPSTRACK_DATA` env var
//! 3. `data-dir` in the config file
//! 4. `~/.opstrack/data`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};

use crate::window::WindowDays;

/// Environment variable naming the data directory.
pub const DATA_ENV: &str = "OPSTRACK_DATA";

/// opstrack configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Where `events.json` and `catalogs.json` live.
    pub data_dir: Option<PathBuf>,

    /// IANA time zone days are counted in. Defaults to the system zone.
    pub timezone: Option<String>,

    /// Window length for views that take `--days`.
    pub default_days: Option<u32>,
}

impl Config {
    /// Load config from `~/.opstrack/config.toml`, or defaults if there is
    /// none.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`. A missing file gives defaults; an unreadable
    /// or invalid one is an error.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if let Some(days) = config.default_days {
            WindowDays::new(days)
                .map_err(|e| format!("invalid default-days in {}: {e}", path.display()))?;
        }

        Ok(config)
    }

    /// The config file path: `~/.opstrack/config.toml`.
    pub fn path() -> Option<PathBuf> {
        home_dir().map(|h| h.join("config.toml"))
    }

    /// Resolve the data directory from the flag, the environment and this
    /// config, in that order.
    pub fn data_dir(&self, explicit: Option<&Path>) -> Result<PathBuf, String> {
        let from_env = std::env::var_os(DATA_ENV).map(PathBuf::from);
        self.resolve_data_dir(explicit, from_env)
    }

    fn resolve_data_dir(
        &self,
        explicit: Option<&Path>,
        from_env: Option<PathBuf>,
    ) -> Result<PathBuf, String> {
        if let Some(dir) = explicit {
            return Ok(dir.to_path_buf());
        }
        if let Some(dir) = from_env.filter(|d| !d.as_os_str().is_empty()) {
            return Ok(dir);
        }
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        home_dir().map(|h| h.join("data")).ok_or_else(|| {
            format!("could not determine home directory: pass --data or set {DATA_ENV}")
        })
    }

    /// The time zone to count days in: the flag, then the config, then the
    /// system zone.
    pub fn time_zone(&self, explicit: Option<&str>) -> Result<TimeZone, String> {
        match explicit.or(self.timezone.as_deref()) {
            Some(name) => {
                TimeZone::get(name).map_err(|e| format!("unknown time zone '{name}': {e}"))
            }
            None => Ok(TimeZone::system()),
        }
    }

    /// The window length to use when a command gets no `--days`.
    pub fn default_days(&self, fallback: WindowDays) -> WindowDays {
        self.default_days
            .and_then(|days| WindowDays::new(days).ok())
            .unwrap_or(fallback)
    }
}

/// `~/.opstrack`.
fn home_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".opstrack"))
}
