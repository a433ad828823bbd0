//! Configuration handling for Schemer

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{Error, Result};

/// Load configuration from a TOML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;

    Ok(config)
}

/// Represents the complete Schemer configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub naming: NamingConfig,
    pub editor: EditorConfig,
    pub export: ExportConfig,
    pub logging: Option<LoggingConfig>,
}

/// Project file handling
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ProjectConfig {
    pub default_zoom: u32,
    pub validate_on_load: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            default_zoom: 100,
            validate_on_load: true,
        }
    }
}

/// Foreign-key naming convention
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct NamingConfig {
    /// One of `capitalize`, `pascal_case` or `pattern`
    pub convention: String,
    pub foreign_key_suffix: String,
    /// Regex with a named `table` capture, used by the `pattern` convention
    pub pattern: Option<String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            convention: "capitalize".to_string(),
            foreign_key_suffix: "_id".to_string(),
            pattern: None,
        }
    }
}

/// Editing behaviour
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct EditorConfig {
    /// Infer relations for fields created with a foreign-key name, not only on rename
    pub infer_relations_on_create: bool,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            infer_relations_on_create: false,
            canvas_width: 1280.0,
            canvas_height: 800.0,
        }
    }
}

/// Code export settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ExportConfig {
    pub framework: String,
    pub output_directory: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            framework: "laravel".to_string(),
            output_directory: "./export".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}
