//! Configuration file handling for ~/.trainpos/config.ini.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use super::{ServiceConfig, SubjectConfig};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ServiceConfig {
    /// Load configuration from the default path (~/.trainpos/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }
}

/// Get the path to the config directory (~/.trainpos).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".trainpos")
}

/// Get the path to the config file (~/.trainpos/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Parse an `Ini` object into a `ServiceConfig`.
///
/// Starts from `ServiceConfig::default()` and overlays any values found.
fn parse_ini(ini: &Ini) -> Result<ServiceConfig, ConfigFileError> {
    let mut config = ServiceConfig::default();

    // [sites] section
    if let Some(section) = ini.section(Some("sites")) {
        if let Some(v) = section.get("state_file") {
            let v = v.trim();
            if !v.is_empty() {
                config.state_file = Some(expand_tilde(v));
            }
        }
    }

    // [reconciler] section
    if let Some(section) = ini.section(Some("reconciler")) {
        if let Some(v) = section.get("idle_timeout_ms") {
            let ms = parse_positive(v, "reconciler", "idle_timeout_ms")?;
            config.idle_timeout = Duration::from_millis(ms);
        }
        if let Some(v) = section.get("channel_capacity") {
            let capacity = parse_positive(v, "reconciler", "channel_capacity")?;
            config.channel_capacity = capacity as usize;
        }
    }

    // [subjects] section
    if let Some(section) = ini.section(Some("subjects")) {
        let subjects = &mut config.subjects;
        let fields: [(&str, &mut String); 5] = [
            ("gps", &mut subjects.gps),
            ("tracelet", &mut subjects.tracelet),
            ("register_site", &mut subjects.register_site),
            ("position_prefix", &mut subjects.position_prefix),
            ("site_event", &mut subjects.site_event),
        ];
        for (key, field) in fields {
            if let Some(v) = section.get(key) {
                *field = parse_subject(v, key)?;
            }
        }
    }

    check_distinct_inbound(&config.subjects)?;
    Ok(config)
}

fn parse_positive(value: &str, section: &str, key: &str) -> Result<u64, ConfigFileError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a positive integer".to_string(),
        }),
    }
}

fn parse_subject(value: &str, key: &str) -> Result<String, ConfigFileError> {
    let v = value.trim();
    if v.is_empty() || v.contains(char::is_whitespace) {
        return Err(ConfigFileError::InvalidValue {
            section: "subjects".to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "subject must be non-empty and contain no whitespace".to_string(),
        });
    }
    Ok(v.to_string())
}

fn check_distinct_inbound(subjects: &SubjectConfig) -> Result<(), ConfigFileError> {
    let inbound = [
        ("gps", &subjects.gps),
        ("tracelet", &subjects.tracelet),
        ("register_site", &subjects.register_site),
    ];
    for (i, (key, value)) in inbound.iter().enumerate() {
        if inbound[..i].iter().any(|(_, other)| other == value) {
            return Err(ConfigFileError::InvalidValue {
                section: "subjects".to_string(),
                key: key.to_string(),
                value: value.to_string(),
                reason: "inbound subjects must be distinct".to_string(),
            });
        }
    }
    Ok(())
}

fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ServiceConfig, ConfigFileError> {
        parse_ini(&Ini::load_from_str(content).unwrap())
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(parse("").unwrap(), ServiceConfig::default());
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            "[sites]\n\
             state_file = /var/lib/trainpos/sites.json\n\
             [reconciler]\n\
             idle_timeout_ms = 1500\n\
             channel_capacity = 32\n\
             [subjects]\n\
             gps = fleet.gps\n\
             site_event = depot-events\n",
        )
        .unwrap();

        assert_eq!(
            config.state_file,
            Some(PathBuf::from("/var/lib/trainpos/sites.json"))
        );
        assert_eq!(config.idle_timeout, Duration::from_millis(1500));
        assert_eq!(config.channel_capacity, 32);
        assert_eq!(config.subjects.gps, "fleet.gps");
        assert_eq!(config.subjects.tracelet, "train.tracelet");
        assert_eq!(config.subjects.site_event, "depot-events");
    }

    #[test]
    fn test_blank_state_file_ignored() {
        let config = parse("[sites]\nstate_file = \n").unwrap();
        assert!(config.state_file.is_none());
    }

    #[test]
    fn test_invalid_timeout() {
        let err = parse("[reconciler]\nidle_timeout_ms = soon\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref key, .. } if key == "idle_timeout_ms"
        ));

        assert!(parse("[reconciler]\nchannel_capacity = 0\n").is_err());
    }

    #[test]
    fn test_invalid_subject() {
        let err = parse("[subjects]\ntracelet = train tracelet\n").unwrap_err();
        assert!(err.to_string().contains("subjects.tracelet"));
    }

    #[test]
    fn test_duplicate_inbound_subjects_rejected() {
        let err = parse("[subjects]\ntracelet = train.gps\n").unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ServiceConfig::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[reconciler]\nidle_timeout_ms = 250\n").unwrap();

        let config = ServiceConfig::load_from(&path).unwrap();
        assert_eq!(config.idle_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_config_file_path() {
        assert!(config_file_path().ends_with(".trainpos/config.ini"));
    }
}
