//! Operator configuration – reads/writes `~/.veritag/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use veritag_triage::TriageThresholds;

/// Persisted operator configuration stored in `~/.veritag/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Hours an open flag may age before it becomes medium priority.
    #[serde(default = "default_medium_hours")]
    pub triage_medium_hours: i64,

    /// Hours an open flag may age before it becomes high priority.
    #[serde(default = "default_high_hours")]
    pub triage_high_hours: i64,

    /// Minimum resolution-note length enforced by the transition gate.
    #[serde(default = "default_min_notes")]
    pub min_resolution_notes: usize,
}

fn default_medium_hours() -> i64 {
    24
}
fn default_high_hours() -> i64 {
    72
}
fn default_min_notes() -> usize {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            triage_medium_hours: default_medium_hours(),
            triage_high_hours: default_high_hours(),
            min_resolution_notes: default_min_notes(),
        }
    }
}

impl Config {
    /// Triage cutoffs as validated thresholds.
    pub fn thresholds(&self) -> Result<TriageThresholds, String> {
        TriageThresholds::from_hours(self.triage_medium_hours, self.triage_high_hours)
            .map_err(|e| format!("Invalid triage cutoffs in config: {e}"))
    }
}

/// Return the path to `~/.veritag/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".veritag").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `VERITAG_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `VERITAG_TRIAGE_MEDIUM_HOURS` | `triage_medium_hours` |
/// | `VERITAG_TRIAGE_HIGH_HOURS` | `triage_high_hours` |
/// | `VERITAG_MIN_RESOLUTION_NOTES` | `min_resolution_notes` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("VERITAG_TRIAGE_MEDIUM_HOURS")
        && let Ok(hours) = v.parse::<i64>()
    {
        cfg.triage_medium_hours = hours;
    }
    if let Ok(v) = std::env::var("VERITAG_TRIAGE_HIGH_HOURS")
        && let Ok(hours) = v.parse::<i64>()
    {
        cfg.triage_high_hours = hours;
    }
    if let Ok(v) = std::env::var("VERITAG_MIN_RESOLUTION_NOTES")
        && let Ok(len) = v.parse::<usize>()
    {
        cfg.min_resolution_notes = len;
    }
}

/// Save the config to disk, creating `~/.veritag/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Restrict the config directory to the owner only (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    // Write the file with owner-only read/write (rw-------) on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
