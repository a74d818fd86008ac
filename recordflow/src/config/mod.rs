//! Application settings.
//!
//! Settings are a JSON tree addressed with dotted paths (`app.name`,
//! `logging.level`, ...). They are assembled once, in this order:
//!
//! 1. the configuration file (missing file → empty tree),
//! 2. environment variables listed in [`ENV_OVERRIDES`],
//! 3. explicit overrides supplied by the caller (e.g. `--log-level`).
//!
//! After [`SettingsLoader::load`] returns, the tree is never mutated.

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";

/// Environment variable → dotted path.
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("APP_NAME", "app.name"),
    ("APP_VERSION", "app.version"),
    ("LOG_LEVEL", "logging.level"),
    ("DATA_DIR", "data.directory"),
    ("API_KEY", "api.key"),
    ("API_BASE_URL", "api.base_url"),
];

const DEFAULT_APP_NAME: &str = "recordflow";
const DEFAULT_LOG_LEVEL: &str = "INFO";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_API_BASE_URL: &str = "https://api.example.com";
const DEFAULT_ENCODING: &str = "utf-8";

/// Shape of the configuration document. Unknown keys are allowed.
static CONFIG_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "app": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" }
                }
            },
            "logging": {
                "type": "object",
                "properties": {
                    "level": { "type": "string" }
                }
            },
            "data": {
                "type": "object",
                "properties": {
                    "directory": { "type": "string" }
                }
            },
            "api": {
                "type": "object",
                "properties": {
                    "key": { "type": "string" },
                    "base_url": { "type": "string" }
                }
            },
            "files": {
                "type": "object",
                "properties": {
                    "encoding": { "type": "string" },
                    "cache_ttl_secs": { "type": "integer", "minimum": 0 },
                    "retry": {
                        "type": "object",
                        "properties": {
                            "max_attempts": { "type": "integer", "minimum": 1 },
                            "delay_ms": { "type": "integer", "minimum": 0 },
                            "backoff": { "type": "number", "minimum": 1 }
                        }
                    }
                }
            }
        }
    })
});

// =============================================================================
// Settings
// =============================================================================

/// Immutable configuration tree.
#[derive(Debug, Clone)]
pub struct Settings {
    tree: Value,
    config_path: PathBuf,
    loaded_from_file: bool,
}

impl Settings {
    /// Load from `path` (or the default path) using the process environment.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        SettingsLoader::new(path).load()
    }

    /// Build settings directly from a tree, skipping file and environment.
    pub fn from_value(tree: Value) -> AppResult<Self> {
        check_shape(&tree)?;
        Ok(Self {
            tree,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            loaded_from_file: false,
        })
    }

    /// Look up a value by dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.tree, |current, key| current.as_object()?.get(key))
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(Value::as_u64)
    }

    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(Value::as_f64)
    }

    /// The whole tree.
    pub fn as_value(&self) -> &Value {
        &self.tree
    }

    /// The tree with secrets masked, for display.
    pub fn redacted(&self) -> Value {
        let mut tree = self.tree.clone();
        if let Some(key) = tree
            .get_mut("api")
            .and_then(Value::as_object_mut)
            .and_then(|api| api.get_mut("key"))
        {
            if key.as_str().is_some_and(|k| !k.is_empty()) {
                *key = Value::String("********".to_string());
            }
        }
        tree
    }

    /// Path the settings were (or would have been) read from.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// False when the config file was missing and defaults are in use.
    pub fn loaded_from_file(&self) -> bool {
        self.loaded_from_file
    }

    pub fn app_name(&self) -> &str {
        self.get_str("app.name").unwrap_or(DEFAULT_APP_NAME)
    }

    pub fn app_version(&self) -> &str {
        self.get_str("app.version")
            .unwrap_or(env!("CARGO_PKG_VERSION"))
    }

    pub fn log_level(&self) -> &str {
        self.get_str("logging.level").unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn data_directory(&self) -> PathBuf {
        PathBuf::from(self.get_str("data.directory").unwrap_or(DEFAULT_DATA_DIR))
    }

    pub fn api_key(&self) -> &str {
        self.get_str("api.key").unwrap_or("")
    }

    pub fn api_base_url(&self) -> &str {
        self.get_str("api.base_url").unwrap_or(DEFAULT_API_BASE_URL)
    }

    /// Default encoding label for file reads and writes.
    pub fn file_encoding(&self) -> &str {
        self.get_str("files.encoding").unwrap_or(DEFAULT_ENCODING)
    }

    /// TTL for memoised structured reads; `None` disables the cache.
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.get_u64("files.cache_ttl_secs").map(Duration::from_secs)
    }
}

// =============================================================================
// Loader
// =============================================================================

type EnvLookup = Box<dyn Fn(&str) -> Option<String>>;

/// Assembles [`Settings`] from file, environment and explicit overrides.
pub struct SettingsLoader {
    path: PathBuf,
    env: EnvLookup,
    overrides: Vec<(String, Value)>,
}

impl SettingsLoader {
    pub fn new(path: Option<&Path>) -> Self {
        Self {
            path: path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
            env: Box::new(|name| std::env::var(name).ok()),
            overrides: Vec::new(),
        }
    }

    /// Replace the environment lookup (tests use a fixed map).
    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + 'static,
    {
        self.env = Box::new(env);
        self
    }

    /// Force a value at `path`, applied after the environment.
    pub fn with_override(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.overrides.push((path.to_string(), value.into()));
        self
    }

    pub fn load(self) -> AppResult<Settings> {
        let (mut tree, loaded_from_file) = read_config_file(&self.path)?;

        for (var, path) in ENV_OVERRIDES {
            if let Some(value) = (self.env)(var).filter(|v| !v.is_empty()) {
                set_path(&mut tree, path, Value::String(value));
            }
        }

        for (path, value) in self.overrides {
            set_path(&mut tree, &path, value);
        }

        Ok(Settings {
            tree,
            config_path: self.path,
            loaded_from_file,
        })
    }
}

fn read_config_file(path: &Path) -> AppResult<(Value, bool)> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok((Value::Object(Map::new()), false));
        }
        Err(e) => {
            return Err(AppError::Configuration(format!(
                "Error loading config file {}: {}",
                path.display(),
                e
            )))
        }
    };

    let tree: Value = serde_json::from_str(&content).map_err(|e| {
        AppError::Configuration(format!(
            "Invalid JSON in config file {}: {}",
            path.display(),
            e
        ))
    })?;
    check_shape(&tree)?;
    Ok((tree, true))
}

fn check_shape(tree: &Value) -> AppResult<()> {
    let validator = jsonschema::draft7::new(&CONFIG_SCHEMA)
        .map_err(|e| AppError::Configuration(format!("Invalid settings schema: {}", e)))?;

    let errors: Vec<String> = validator.iter_errors(tree).map(|e| e.to_string()).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Configuration(format!(
            "Invalid configuration: {}",
            errors.join("; ")
        )))
    }
}

/// Set `value` at a dotted path, creating (or replacing) intermediate objects.
fn set_path(tree: &mut Value, path: &str, value: Value) {
    let mut keys: Vec<&str> = path.split('.').collect();
    let Some(last) = keys.pop() else {
        return;
    };

    let mut current = tree;
    for key in keys {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => return,
        };
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Value::Object(map) = current {
        map.insert(last.to_string(), value);
    }
}
