//! Project configuration for the `importcheck` driver

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::field::FieldSchema;
use crate::suite::ImportFixtures;

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Base URL of the server to test
    pub base_url: String,

    /// Endpoint base path; `/import` is appended
    pub endpoint: String,

    /// Ids that must return a non-empty result
    #[serde(default)]
    pub valid_ids: Vec<String>,

    /// Ids that must return an empty result
    #[serde(default)]
    pub invalid_ids: Vec<String>,

    /// Expected item shape
    #[serde(default)]
    pub fields: FieldSchema,

    /// HTTP headers (Auth, API keys, etc.)
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// HTTP client timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Run cases on separate threads
    #[serde(default)]
    pub parallel: bool,
}

const fn default_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            endpoint: "/".to_string(),
            valid_ids: Vec::new(),
            invalid_ids: Vec::new(),
            fields: FieldSchema::default(),
            headers: HashMap::new(),
            timeout_secs: default_timeout_secs(),
            parallel: false,
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// Format is chosen by extension: `.json`, `.yaml`/`.yml`, otherwise TOML.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "json" => serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string())),
            "yaml" | "yml" => {
                serde_yml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            _ => toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Load from the first default location that exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if none exists, or a load error.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."))
    }

    /// Like [`Config::load_default`], relative to `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if none exists, or a load error.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let candidates = [
            ".importcheck.toml",
            ".importcheck.json",
            ".importcheck.yaml",
            "importcheck.toml",
        ];

        for name in candidates {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        Err(ConfigError::NotFound(candidates.join(", ")))
    }

    /// Fixtures for [`crate::build_import_cases`].
    #[must_use]
    pub fn fixtures(&self) -> ImportFixtures {
        ImportFixtures {
            valid_ids: self.valid_ids.clone(),
            invalid_ids: self.invalid_ids.clone(),
            fields: self.fields.clone(),
        }
    }

    /// Create example config file
    #[must_use]
    pub fn example() -> &'static str {
        r#"# importcheck configuration

# Server to test
base_url = "http://localhost:8080"

# Endpoint base path ("/import" is appended)
endpoint = "/widgets"

# Ids that must return at least one item
valid_ids = ["42"]

# Ids that must return an empty array
invalid_ids = ["999999"]

# HTTP client timeout in seconds
# timeout_secs = 10

# Run cases concurrently
# parallel = false

# Expected item shape: type is "number" or "string",
# empty = true allows null
[fields]
id = { type = "number" }
name = { type = "string" }
# note = { type = "string", empty = true }

# HTTP headers (auth, api keys)
# [headers]
# Authorization = "Bearer your-token-here"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {}: {}", .0.display(), .1)]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("No config file found (looked for {0})")]
    NotFound(String),
}
