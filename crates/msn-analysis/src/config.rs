//! Configuration types for the analysis pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::metrics::time::DEFAULT_TIMESTAMP_FORMAT;

/// Portals analysed when no allow-list is given.
pub const DEFAULT_BRANDS: [&str; 2] = ["HNA", "Frankfurter Rundschau"];

/// Configuration for the analysis pipeline.
///
/// Use [`AnalysisConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use msn_analysis::config::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .allowed_brands(["HNA"])
///     .separator(b';')
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Brands (portals) included in the analysis. Rows of other brands are dropped.
    /// Default: [`DEFAULT_BRANDS`]
    pub allowed_brands: Vec<String>,

    /// Field separator of both input tables.
    /// Default: b','
    pub separator: u8,

    /// chrono format string of the creation timestamp column.
    /// Default: "%d.%m.%Y, %H:%M:%S"
    pub timestamp_format: String,

    /// Whether to narrow numeric column storage after loading.
    /// Default: true
    pub optimize_memory: bool,

    /// Number of rows sampled for schema inference. `None` scans the whole file.
    /// Default: Some(1000)
    pub infer_schema_length: Option<usize>,

    /// Directory the spreadsheet export is written to.
    /// Default: "output"
    pub output_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            allowed_brands: default_brands(),
            separator: b',',
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            optimize_memory: true,
            infer_schema_length: Some(1000),
            output_dir: PathBuf::from("output"),
        }
    }
}

fn default_brands() -> Vec<String> {
    DEFAULT_BRANDS.iter().map(|s| s.to_string()).collect()
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.allowed_brands.is_empty() {
            return Err(ConfigValidationError::NoBrands);
        }

        if let Some(blank) = self
            .allowed_brands
            .iter()
            .position(|brand| brand.trim().is_empty())
        {
            return Err(ConfigValidationError::BlankBrand(blank));
        }

        if !self.separator.is_ascii()
            || matches!(self.separator, b'"' | b'\n' | b'\r')
        {
            return Err(ConfigValidationError::InvalidSeparator(self.separator));
        }

        if self.timestamp_format.trim().is_empty() {
            return Err(ConfigValidationError::EmptyTimestampFormat);
        }

        if self.infer_schema_length == Some(0) {
            return Err(ConfigValidationError::InvalidInferSchemaLength);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("At least one brand must be allowed")]
    NoBrands,

    #[error("Brand at position {0} is blank")]
    BlankBrand(usize),

    #[error("Invalid separator byte {0:#04x} (must be ASCII and not a quote or newline)")]
    InvalidSeparator(u8),

    #[error("Timestamp format must not be empty")]
    EmptyTimestampFormat,

    #[error("Schema inference length must be at least 1 row (or unset to scan all rows)")]
    InvalidInferSchemaLength,
}

impl From<ConfigValidationError> for crate::error::AnalysisError {
    fn from(error: ConfigValidationError) -> Self {
        crate::error::AnalysisError::InvalidConfig(error.to_string())
    }
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    allowed_brands: Option<Vec<String>>,
    separator: Option<u8>,
    timestamp_format: Option<String>,
    optimize_memory: Option<bool>,
    infer_schema_length: Option<Option<usize>>,
    output_dir: Option<PathBuf>,
}

impl AnalysisConfigBuilder {
    /// Set the brand allow-list.
    pub fn allowed_brands<I, S>(mut self, brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_brands = Some(brands.into_iter().map(Into::into).collect());
        self
    }

    /// Set the field separator of the input tables.
    pub fn separator(mut self, separator: u8) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Set the chrono format of the creation timestamp.
    pub fn timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = Some(format.into());
        self
    }

    /// Enable or disable the memory optimizer.
    pub fn optimize_memory(mut self, optimize: bool) -> Self {
        self.optimize_memory = Some(optimize);
        self
    }

    /// Set the number of rows sampled for schema inference.
    pub fn infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Set the export directory.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let config = AnalysisConfig {
            allowed_brands: self.allowed_brands.unwrap_or_else(default_brands),
            separator: self.separator.unwrap_or(b','),
            timestamp_format: self
                .timestamp_format
                .unwrap_or_else(|| DEFAULT_TIMESTAMP_FORMAT.to_string()),
            optimize_memory: self.optimize_memory.unwrap_or(true),
            infer_schema_length: self.infer_schema_length.unwrap_or(Some(1000)),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("output")),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.allowed_brands, vec!["HNA", "Frankfurter Rundschau"]);
        assert_eq!(config.separator, b',');
        assert_eq!(config.timestamp_format, "%d.%m.%Y, %H:%M:%S");
        assert!(config.optimize_memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AnalysisConfig::builder()
            .allowed_brands(["HNA"])
            .separator(b';')
            .optimize_memory(false)
            .infer_schema_length(None)
            .output_dir("reports")
            .build()
            .unwrap();

        assert_eq!(config.allowed_brands, vec!["HNA"]);
        assert_eq!(config.separator, b';');
        assert!(!config.optimize_memory);
        assert_eq!(config.infer_schema_length, None);
        assert_eq!(config.output_dir, PathBuf::from("reports"));
    }

    #[test]
    fn test_validation_no_brands() {
        let result = AnalysisConfig::builder()
            .allowed_brands(Vec::<String>::new())
            .build();
        assert!(matches!(result, Err(ConfigValidationError::NoBrands)));
    }

    #[test]
    fn test_validation_blank_brand() {
        let result = AnalysisConfig::builder()
            .allowed_brands(["HNA", "  "])
            .build();
        assert!(matches!(result, Err(ConfigValidationError::BlankBrand(1))));
    }

    #[test]
    fn test_validation_invalid_separator() {
        let result = AnalysisConfig::builder().separator(b'"').build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::InvalidSeparator(b'"'))
        ));
    }

    #[test]
    fn test_validation_zero_infer_length() {
        let result = AnalysisConfig::builder().infer_schema_length(Some(0)).build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::InvalidInferSchemaLength)
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "allowed_brands": ["HNA", "Merkur"],
            "separator": 59,
            "timestamp_format": "%Y-%m-%d %H:%M:%S",
            "optimize_memory": false,
            "infer_schema_length": null,
            "output_dir": "exports"
        }"#;

        let config: AnalysisConfig =
            serde_json::from_str(json).expect("Should deserialize from JSON");

        assert_eq!(config.allowed_brands, vec!["HNA", "Merkur"]);
        assert_eq!(config.separator, b';');
        assert_eq!(config.timestamp_format, "%Y-%m-%d %H:%M:%S");
        assert!(!config.optimize_memory);
        assert!(config.validate().is_ok());
    }
}
