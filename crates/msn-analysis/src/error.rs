//! Error types for the MSN analysis pipeline.
//!
//! Every failure is returned as an [`AnalysisError`] value. Each variant maps
//! to one of three machine-readable [`ErrorKind`]s so a front end can decide
//! whether to show a short message (file and validation problems) or the
//! full diagnostic chain (unexpected processing failures).
//!
//! Errors are serializable so they can be emitted as JSON by the CLI.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::TableKind;

/// Coarse classification of an [`AnalysisError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Source is unreadable, empty or malformed.
    FileLoad,
    /// A required column (or the creation timestamp column) is missing.
    DataValidation,
    /// Unexpected failure while merging, enriching or exporting.
    Processing,
}

impl ErrorKind {
    /// Returns a human-readable name for the kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FileLoad => "File load error",
            Self::DataValidation => "Data validation error",
            Self::Processing => "Processing error",
        }
    }
}

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Source could not be read or parsed.
    #[error("Failed to load {source_name}: {reason}")]
    FileLoad { source_name: String, reason: String },

    /// Required columns are missing from a table.
    #[error("Missing required columns in {kind} table: {}", .columns.join(", "))]
    MissingColumns { kind: TableKind, columns: Vec<String> },

    /// The creation timestamp column needed for time analysis is absent.
    #[error("Column '{0}' is required for time-of-day analysis but was not found")]
    MissingTimestampColumn(String),

    /// Table kind could not be determined from its columns.
    #[error("Cannot determine table type: neither '{catalog_marker}' nor '{views_marker}' present")]
    UnknownTableKind {
        catalog_marker: &'static str,
        views_marker: &'static str,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Analysis was requested before both tables were uploaded.
    #[error("Both the catalog and the page-view table must be loaded before analysis")]
    NoDataLoaded,

    /// Unexpected failure while processing.
    #[error("Processing failed: {0}")]
    Processing(String),

    /// Workbook could not be written or read.
    #[error("Export failed: {0}")]
    Export(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Zip container error from the workbook writer/reader.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Malformed SpreadsheetML part.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Shorthand for a [`AnalysisError::FileLoad`].
    pub fn file_load(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::FileLoad {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Machine-readable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileLoad { .. } => ErrorKind::FileLoad,
            Self::MissingColumns { .. }
            | Self::MissingTimestampColumn(_)
            | Self::UnknownTableKind { .. }
            | Self::InvalidConfig(_)
            | Self::NoDataLoaded => ErrorKind::DataValidation,
            Self::Processing(_)
            | Self::Export(_)
            | Self::Io(_)
            | Self::Polars(_)
            | Self::Json(_)
            | Self::Zip(_)
            | Self::Xml(_) => ErrorKind::Processing,
            Self::WithContext { source, .. } => source.kind(),
        }
    }

    /// Get error code for front-end handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FileLoad { .. } => "FILE_LOAD",
            Self::MissingColumns { .. } => "MISSING_COLUMNS",
            Self::MissingTimestampColumn(_) => "MISSING_TIMESTAMP_COLUMN",
            Self::UnknownTableKind { .. } => "UNKNOWN_TABLE_KIND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::NoDataLoaded => "NO_DATA_LOADED",
            Self::Processing(_) => "PROCESSING_FAILED",
            Self::Export(_) => "EXPORT_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Zip(_) => "ZIP_ERROR",
            Self::Xml(_) => "XML_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is a file or validation problem the user can fix
    /// by supplying different input.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::FileLoad | ErrorKind::DataValidation
        )
    }

    /// Message for display at the boundary nearest the user action.
    ///
    /// File and validation errors produce their short message. Anything else
    /// additionally carries the full source chain for debugging.
    pub fn user_message(&self) -> String {
        if self.is_user_error() {
            return self.to_string();
        }

        let mut message = format!("{}: {}", self.kind().display_name(), self);
        let mut source = std::error::Error::source(self);
        while let Some(inner) = source {
            message.push_str(&format!("\n  caused by: {inner}"));
            source = inner.source();
        }
        message.push_str(&format!("\n  debug: {self:?}"));
        message
    }
}

/// Errors are serialized as a struct with `code`, `kind` and `message` fields.
impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 3)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Io(e).with_context(context))
    }
}
