//! CLI configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/tripsync/config.toml` by default. Command-line flags and their
//! environment variables take precedence over file values.
//!
//! Credential values (`username`, `token`) support `env::VAR_NAME`
//! references, resolved from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::{ClientError, ClientResult};

// ---------------------------------------------------------------------------
// FileConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// TripIt credentials.
    pub tripit: TripItSettings,

    /// Google Calendar settings.
    pub google: GoogleSettings,

    /// Sync behavior settings.
    pub sync: SyncSettings,
}

/// TripIt credential settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TripItSettings {
    /// TripIt username (supports `env::` references).
    pub username: Option<String>,

    /// TripIt API token (supports `env::` references).
    pub token: Option<String>,
}

/// Google Calendar settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// Calendar identifier to mirror flights into.
    pub calendar_id: Option<String>,

    /// Path to the service account keyfile.
    pub keyfile: Option<PathBuf>,
}

/// Sync behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Interval between passes (e.g. "30s", "1m", "3h").
    pub interval: Option<String>,

    /// Also mirror past trips.
    pub include_past: bool,

    /// Maximum concurrent create/update operations per pass.
    pub apply_concurrency: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            interval: None,
            include_past: false,
            apply_concurrency: 4,
        }
    }
}

impl FileConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| format!("failed to read config: {}", e))?;
            toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tripsync")
    }

    /// Returns the default service account keyfile path.
    pub fn default_keyfile_path() -> PathBuf {
        Self::default_config_dir().join("google.json")
    }
}

// ---------------------------------------------------------------------------
// Secret references and interval parsing
// ---------------------------------------------------------------------------

/// Resolves a config value, expanding `env::VAR_NAME` references.
pub fn resolve_secret(value: &str) -> Result<String, String> {
    match value.strip_prefix("env::") {
        Some(var) => {
            std::env::var(var).map_err(|_| format!("environment variable {} is not set", var))
        }
        None => Ok(value.to_string()),
    }
}

/// Parses a humanized interval like "500ms", "30s", "1m" or "3h".
pub fn parse_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("interval {:?} is missing a unit (ms, s, m, h)", s))?;
    let (number, unit) = s.split_at(split);
    let value: u64 = number
        .parse()
        .map_err(|_| format!("interval {:?} has no numeric value", s))?;

    let duration = match unit {
        "ms" => Duration::from_millis(value),
        "s" => Duration::from_secs(value),
        "m" => Duration::from_secs(value * 60),
        "h" => Duration::from_secs(value * 3600),
        _ => return Err(format!("interval {:?} has unknown unit {:?}", s, unit)),
    };

    if duration.is_zero() {
        return Err(format!("interval {:?} must be non-zero", s));
    }
    Ok(duration)
}

// ---------------------------------------------------------------------------
// Resolved settings (CLI + env + file)
// ---------------------------------------------------------------------------

/// Fully resolved settings the daemon runs with.
#[derive(Debug, Clone)]
pub struct Settings {
    /// TripIt username.
    pub tripit_username: String,
    /// TripIt API token.
    pub tripit_token: String,
    /// Target calendar identifier.
    pub calendar_id: String,
    /// Path to the Google service account keyfile.
    pub google_keyfile: PathBuf,
    /// Interval between passes.
    pub poll_interval: Duration,
    /// Run a single pass and exit.
    pub run_once: bool,
    /// Also mirror past trips.
    pub include_past: bool,
    /// Maximum concurrent apply operations.
    pub apply_concurrency: usize,
}

impl Settings {
    /// Merges CLI flags (highest precedence) with file values.
    pub fn resolve(cli: &Cli, file: &FileConfig) -> ClientResult<Self> {
        let tripit_username = required(
            cli.tripit_username.clone(),
            file.tripit.username.as_deref(),
            "tripit username (--tripit-username, TRIPIT_USERNAME, or [tripit] username)",
        )?;
        let tripit_token = required(
            cli.tripit_token.clone(),
            file.tripit.token.as_deref(),
            "tripit token (--tripit-token, TRIPIT_TOKEN, or [tripit] token)",
        )?;
        let calendar_id = required(
            cli.calendar.clone(),
            file.google.calendar_id.as_deref(),
            "calendar id (--calendar, GOOGLE_CALENDAR_ID, or [google] calendar_id)",
        )?;

        let google_keyfile = cli
            .google_keyfile
            .clone()
            .or_else(|| file.google.keyfile.clone())
            .unwrap_or_else(FileConfig::default_keyfile_path);

        let interval = cli
            .interval
            .as_deref()
            .or(file.sync.interval.as_deref())
            .unwrap_or("1m");
        let poll_interval = parse_interval(interval).map_err(ClientError::Config)?;

        Ok(Self {
            tripit_username,
            tripit_token,
            calendar_id,
            google_keyfile,
            poll_interval,
            run_once: cli.once,
            include_past: cli.include_past || file.sync.include_past,
            apply_concurrency: file.sync.apply_concurrency.max(1),
        })
    }
}

fn required(
    cli_value: Option<String>,
    file_value: Option<&str>,
    what: &str,
) -> ClientResult<String> {
    let raw = match (cli_value, file_value) {
        (Some(value), _) => value,
        (None, Some(value)) => value.to_string(),
        (None, None) => return Err(ClientError::Config(format!("{} is not set", what))),
    };
    let resolved = resolve_secret(&raw).map_err(ClientError::Config)?;
    if resolved.trim().is_empty() {
        return Err(ClientError::Config(format!("{} is empty", what)));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tripsync").chain(args.iter().copied())).unwrap()
    }

    mod interval_parsing {
        use super::*;

        #[test]
        fn recognized_units() {
            assert_eq!(parse_interval("500ms").unwrap(), Duration::from_millis(500));
            assert_eq!(parse_interval("30s").unwrap(), Duration::from_secs(30));
            assert_eq!(parse_interval("1m").unwrap(), Duration::from_secs(60));
            assert_eq!(parse_interval("3h").unwrap(), Duration::from_secs(10800));
        }

        #[test]
        fn rejects_bad_input() {
            assert!(parse_interval("").is_err());
            assert!(parse_interval("10").is_err());
            assert!(parse_interval("m").is_err());
            assert!(parse_interval("10d").is_err());
            assert!(parse_interval("0s").is_err());
        }
    }

    mod secret_resolution {
        use super::*;

        #[test]
        fn plain_value_passes_through() {
            assert_eq!(resolve_secret("traveler").unwrap(), "traveler");
        }

        #[test]
        fn env_reference_is_expanded() {
            unsafe {
                std::env::set_var("_TRIPSYNC_TEST_TOKEN", "from-env");
            }
            assert_eq!(resolve_secret("env::_TRIPSYNC_TEST_TOKEN").unwrap(), "from-env");
            unsafe {
                std::env::remove_var("_TRIPSYNC_TEST_TOKEN");
            }
        }

        #[test]
        fn missing_env_reference_errors() {
            assert!(resolve_secret("env::_TRIPSYNC_TEST_UNSET").is_err());
        }
    }

    mod file_config {
        use super::*;
        use std::io::Write;

        #[test]
        fn parses_full_file() {
            let toml_content = r#"
[tripit]
username = "traveler"
token = "secret"

[google]
calendar_id = "flights@example.com"
keyfile = "/etc/tripsync/google.json"

[sync]
interval = "5m"
include_past = true
apply_concurrency = 2
"#;
            let config: FileConfig = toml::from_str(toml_content).unwrap();
            assert_eq!(config.tripit.username, Some("traveler".to_string()));
            assert_eq!(
                config.google.calendar_id,
                Some("flights@example.com".to_string())
            );
            assert_eq!(config.sync.interval, Some("5m".to_string()));
            assert!(config.sync.include_past);
            assert_eq!(config.sync.apply_concurrency, 2);
        }

        #[test]
        fn empty_file_uses_defaults() {
            let config: FileConfig = toml::from_str("").unwrap();
            assert!(config.tripit.username.is_none());
            assert_eq!(config.sync.apply_concurrency, 4);
        }

        #[test]
        fn load_from_reads_disk() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("config.toml");
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "[tripit]\nusername = \"traveler\"").unwrap();

            let config = FileConfig::load_from(&path).unwrap();
            assert_eq!(config.tripit.username, Some("traveler".to_string()));
        }

        #[test]
        fn load_from_missing_file_errors() {
            let path = PathBuf::from("/nonexistent/tripsync/config.toml");
            assert!(FileConfig::load_from(&path).is_err());
        }
    }

    mod settings {
        use super::*;

        fn full_file() -> FileConfig {
            toml::from_str(
                r#"
[tripit]
username = "file-user"
token = "file-token"

[google]
calendar_id = "file-cal@example.com"
"#,
            )
            .unwrap()
        }

        #[test]
        fn file_values_used_when_no_flags() {
            let settings = Settings::resolve(&cli(&[]), &full_file()).unwrap();
            assert_eq!(settings.tripit_username, "file-user");
            assert_eq!(settings.calendar_id, "file-cal@example.com");
            assert_eq!(settings.poll_interval, Duration::from_secs(60));
            assert!(!settings.run_once);
            assert_eq!(settings.google_keyfile, FileConfig::default_keyfile_path());
        }

        #[test]
        fn flags_override_file_values() {
            let settings = Settings::resolve(
                &cli(&[
                    "--tripit-username",
                    "flag-user",
                    "--calendar",
                    "flag-cal",
                    "--interval",
                    "10s",
                    "--once",
                ]),
                &full_file(),
            )
            .unwrap();

            assert_eq!(settings.tripit_username, "flag-user");
            assert_eq!(settings.tripit_token, "file-token");
            assert_eq!(settings.calendar_id, "flag-cal");
            assert_eq!(settings.poll_interval, Duration::from_secs(10));
            assert!(settings.run_once);
        }

        #[test]
        fn missing_credentials_error_names_the_setting() {
            let err = Settings::resolve(&cli(&[]), &FileConfig::default()).unwrap_err();
            assert!(err.to_string().contains("tripit username"));
        }

        #[test]
        fn env_reference_in_file_is_resolved() {
            unsafe {
                std::env::set_var("_TRIPSYNC_TEST_FILE_TOKEN", "resolved-token");
            }
            let mut file = full_file();
            file.tripit.token = Some("env::_TRIPSYNC_TEST_FILE_TOKEN".to_string());

            let settings = Settings::resolve(&cli(&[]), &file).unwrap();
            assert_eq!(settings.tripit_token, "resolved-token");
            unsafe {
                std::env::remove_var("_TRIPSYNC_TEST_FILE_TOKEN");
            }
        }

        #[test]
        fn bad_interval_is_a_config_error() {
            let err =
                Settings::resolve(&cli(&["--interval", "soon"]), &full_file()).unwrap_err();
            assert!(err.to_string().contains("interval"));
        }
    }
}
