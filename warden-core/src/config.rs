//! Keyed configuration store.
//!
//! The configuration file is JSON5. Nested objects are flattened into dotted keys
//! at load time, so `{ layout: { prefix: "x" } }` and `{ "layout.prefix": "x" }`
//! are equivalent. Every lookup carries its own default; a missing or mistyped
//! key never fails a caller.

use std::path::Path;

use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

/// Well-known configuration keys.
pub mod keys {
    /// Enables the movement check.
    pub const PREVENT_INVALID_MOVE: &str = "prevent-invalid-move";
    /// Writes non-mitigation violations to the console.
    pub const LOG_VIOLATION_TO_CONSOLE: &str = "log-violation-to-console";
    /// Adds the address of a banned connection to the address block list.
    pub const BLOCK_CONNECTIONS_AFTER_BAN: &str = "block-connections-after-ban";
    /// Enables the ban punishment. When off, bans degrade to kicks.
    pub const BAN_ENABLED: &str = "punishment.ban.enabled";
    /// Disconnect reason for kicks.
    pub const KICK_MESSAGE: &str = "punishment.kick.message";
    /// Disconnect reason for bans.
    pub const BAN_MESSAGE: &str = "punishment.ban.message";
    /// Disconnect reason for undecodable packets.
    pub const EXCEPTION_MESSAGE: &str = "punishment.exception.message";
    /// Prefix substituted for `{prefix}` in layouts.
    pub const PREFIX: &str = "layout.prefix";
    /// Staff alert headline.
    pub const STAFF_ALERT: &str = "layout.detection-message.staff-alert";
    /// Staff alert hover text.
    pub const ALERT_CONTENT: &str = "layout.detection-message.alert-content";
    /// Staff alert click command.
    pub const ALERT_COMMAND: &str = "layout.detection-message.alert-command";
    /// Note appended to the hover text, explaining the click action.
    pub const ALERT_COMMAND_NOTE: &str = "layout.detection-message.alert-command-note";
    /// Enables the join-time update check.
    pub const UPDATE_CHECK_ENABLED: &str = "update-check.enabled";
    /// Endpoint returning the latest release as JSON with a `tag_name` field.
    pub const UPDATE_CHECK_URL: &str = "update-check.url";
    /// Capacity of the detection event channel.
    pub const EVENT_QUEUE_CAPACITY: &str = "event-queue-capacity";
    /// Default log filter for the binary.
    pub const LOG_LEVEL: &str = "log-level";
}

/// An error raised while loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON5.
    #[error("failed to parse config file: {0}")]
    Parse(String),
    /// The top-level value is not an object.
    #[error("config root must be an object")]
    NotAnObject,
}

/// Flattened `key → value` configuration.
#[derive(Debug, Default, Clone)]
pub struct ConfigStore {
    values: FxHashMap<String, Value>,
}

impl ConfigStore {
    /// Parses a JSON5 document.
    pub fn from_json5(source: &str) -> Result<Self, ConfigError> {
        let root: Value =
            serde_json5::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let Value::Object(map) = root else {
            return Err(ConfigError::NotAnObject);
        };
        let mut values = FxHashMap::default();
        for (key, value) in map {
            flatten_into(&mut values, key, value);
        }
        Ok(Self { values })
    }

    /// Loads a JSON5 file. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(source) => Self::from_json5(&source),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!(
                    "Config file {} not found, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sets a value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the boolean at `key`, or `default` if absent or not a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    /// Returns the string at `key`, or `default` if absent or not a string.
    #[must_use]
    pub fn get_string<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
    }

    /// Returns the unsigned integer at `key`, or `default`.
    #[must_use]
    pub fn get_u64(&self, key: &str, default: u64) -> u64 {
        self.values
            .get(key)
            .and_then(Value::as_u64)
            .unwrap_or(default)
    }
}

fn flatten_into(out: &mut FxHashMap<String, Value>, key: String, value: Value) {
    match value {
        Value::Object(map) => {
            for (child, value) in map {
                flatten_into(out, format!("{key}.{child}"), value);
            }
        }
        other => {
            out.insert(key, other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_and_dotted_keys_are_equivalent() {
        let config = ConfigStore::from_json5(
            r#"{
                // comments are allowed
                layout: { prefix: "&7[W]" },
                "punishment.ban.enabled": false,
                'prevent-invalid-move': true,
            }"#,
        )
        .unwrap();
        assert_eq!(config.get_string(keys::PREFIX, "none"), "&7[W]");
        assert!(!config.get_bool(keys::BAN_ENABLED, true));
        assert!(config.get_bool(keys::PREVENT_INVALID_MOVE, false));
    }

    #[test]
    fn defaults_apply_to_missing_and_mistyped_keys() {
        let config = ConfigStore::from_json5(r#"{ "log-violation-to-console": "yes" }"#).unwrap();
        assert!(config.get_bool(keys::LOG_VIOLATION_TO_CONSOLE, true));
        assert!(!config.get_bool("missing", false));
        assert_eq!(config.get_u64(keys::EVENT_QUEUE_CAPACITY, 128), 128);
    }

    #[test]
    fn rejects_non_object_root() {
        assert!(matches!(
            ConfigStore::from_json5("[1, 2]"),
            Err(ConfigError::NotAnObject)
        ));
        assert!(matches!(
            ConfigStore::from_json5("{ broken"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = ConfigStore::load(Path::new("/nonexistent/warden.json5")).unwrap();
        assert!(config.get_bool(keys::PREVENT_INVALID_MOVE, true));
    }
}
