//! Parser configuration.
//!
//! A small YAML document selects the output format, the attributes every
//! detail record must carry, and limits for sources and batch runs. Every
//! section is optional.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! output:
//!   format: table
//! validation:
//!   required_fields: [status, domain, handle]
//! source:
//!   timeout_secs: 30
//! batch:
//!   jobs: 4
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Duration;

use auth_session_core::RequiredFields;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::output::OutputFormat;
use crate::source::DEFAULT_TIMEOUT_SECS;

/// Errors loading or saving a [`ParseConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Attributes every detail record must carry. Unknown names are
    /// rejected when the file is loaded.
    pub required_fields: RequiredFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Limit for one external program invocation.
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads for batch parsing; `None` uses one per CPU.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

/// Top-level parser configuration.
///
/// # Examples
///
/// ```
/// use auth_session_parser::config::ParseConfig;
/// use auth_session_parser::output::OutputFormat;
///
/// let config = ParseConfig::from_yaml_str("output:\n  format: yaml\n").unwrap();
/// assert_eq!(config.output.format, OutputFormat::Yaml);
/// assert!(config.validation.required_fields.contains("handle"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    pub output: OutputConfig,
    pub validation: ValidationConfig,
    pub source: SourceConfig,
    pub batch: BatchConfig,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            output: OutputConfig::default(),
            validation: ValidationConfig::default(),
            source: SourceConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

impl ParseConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IoError`] if the file cannot be read, or
    /// [`ConfigError::YamlError`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Parses configuration from a YAML string. An empty document yields
    /// the defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
output:
  format: markdown
validation:
  required_fields:
    - status
    - handle
source:
  timeout_secs: 5
batch:
  jobs: 8
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config = ParseConfig::from_yaml_str(sample_yaml()).unwrap();
        assert_eq!(config.output.format, OutputFormat::Markdown);
        assert_eq!(
            config.validation.required_fields.iter().collect::<Vec<_>>(),
            vec!["status", "handle"]
        );
        assert_eq!(config.source.timeout(), Duration::from_secs(5));
        assert_eq!(config.batch.jobs, Some(8));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = ParseConfig::from_yaml_str("version: \"1.0\"\n").unwrap();
        assert_eq!(config, ParseConfig::default());
        assert_eq!(ParseConfig::from_yaml_str("").unwrap(), ParseConfig::default());
    }

    #[test]
    fn test_unknown_required_field_is_rejected() {
        let yaml = "validation:\n  required_fields: [status, colour]\n";
        assert!(matches!(
            ParseConfig::from_yaml_str(yaml),
            Err(ConfigError::YamlError(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authsess.yml");

        let mut config = ParseConfig::default();
        config.output.format = OutputFormat::Table;
        config.batch.jobs = Some(2);
        config.save(&path).unwrap();

        let loaded = ParseConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            ParseConfig::load("/nonexistent/authsess.yml"),
            Err(ConfigError::IoError(_))
        ));
    }
}
