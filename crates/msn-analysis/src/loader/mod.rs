//! Loading and validation of the catalog and page-view exports.
//!
//! [`load_table`] parses delimited bytes into a Polars `DataFrame`,
//! normalizes column aliases, determines the table kind and checks the
//! required columns of that kind. The submodules convert validated frames
//! into typed records and narrow column storage.

mod optimizer;
pub mod records;

pub use optimizer::{ColumnConversion, MemoryOptimizer, OptimizationReport};
pub use records::{content_records, view_records};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::schema::{COLUMN_ALIASES, TableKind, is_text_column};
use crate::utils::fingerprint;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parsing options shared by both tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub separator: u8,
    pub infer_schema_length: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            separator: b',',
            infer_schema_length: Some(1000),
        }
    }
}

impl From<&AnalysisConfig> for LoadOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            separator: config.separator,
            infer_schema_length: config.infer_schema_length,
        }
    }
}

/// Metadata about a loaded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub kind: TableKind,
    /// File name or other label of the source, used in messages.
    pub source_name: String,
    pub size_bytes: usize,
    pub row_count: usize,
    pub column_count: usize,
    /// Column names after alias canonicalization.
    pub columns: Vec<String>,
    /// SHA-256 of the raw source bytes.
    pub fingerprint: String,
}

/// A validated table and its metadata.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub df: DataFrame,
    pub info: TableInfo,
}

/// Parse, canonicalize and validate one exported table.
///
/// The kind is taken from `expected` when given, otherwise detected from the
/// header (see [`TableKind::detect`]).
///
/// # Errors
///
/// - [`AnalysisError::FileLoad`] if the source is empty, not UTF-8 or not a
///   well-formed delimited table.
/// - [`AnalysisError::UnknownTableKind`] if no kind is given and none can be
///   detected.
/// - [`AnalysisError::MissingColumns`] naming every missing required column.
pub fn load_table(
    source_name: &str,
    bytes: &[u8],
    expected: Option<TableKind>,
    options: &LoadOptions,
) -> Result<LoadedTable> {
    let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    if content.iter().all(u8::is_ascii_whitespace) {
        return Err(AnalysisError::file_load(source_name, "source is empty"));
    }

    std::str::from_utf8(content).map_err(|e| {
        AnalysisError::file_load(source_name, format!("source is not valid UTF-8: {e}"))
    })?;

    let df = read_delimited(content, options)
        .map_err(|e| AnalysisError::file_load(source_name, e.to_string()))?;

    if df.width() == 0 {
        return Err(AnalysisError::file_load(source_name, "no columns found"));
    }

    let df = canonicalize_aliases(df)?;
    let columns = column_names(&df);

    let kind = match expected {
        Some(kind) => kind,
        None => TableKind::detect(&columns).ok_or(AnalysisError::UnknownTableKind {
            catalog_marker: TableKind::Catalog.marker_column(),
            views_marker: TableKind::Views.marker_column(),
        })?,
    };

    let missing = kind.missing_columns(&columns);
    if !missing.is_empty() {
        return Err(AnalysisError::MissingColumns {
            kind,
            columns: missing,
        });
    }

    info!(
        "Loaded {} table '{}': {} rows, {} columns",
        kind,
        source_name,
        df.height(),
        df.width()
    );

    let info = TableInfo {
        kind,
        source_name: source_name.to_string(),
        size_bytes: bytes.len(),
        row_count: df.height(),
        column_count: df.width(),
        columns,
        fingerprint: fingerprint(bytes),
    };

    Ok(LoadedTable { df, info })
}

/// Read the table with every text column typed as `String`, so ids such as
/// `007` or a late `AB12` survive schema inference.
fn read_delimited(content: &[u8], options: &LoadOptions) -> PolarsResult<DataFrame> {
    let text_columns = text_schema(&read_header(content, options)?);
    let separator = options.separator;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(options.infer_schema_length)
        .with_schema_overwrite((!text_columns.is_empty()).then(|| Arc::new(text_columns)))
        .map_parse_options(|parse| parse.with_separator(separator))
        .into_reader_with_file_handle(Cursor::new(content.to_vec()))
        .finish()
}

fn read_header(content: &[u8], options: &LoadOptions) -> PolarsResult<Vec<String>> {
    let separator = options.separator;
    let head = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_n_rows(Some(1))
        .map_parse_options(|parse| parse.with_separator(separator))
        .into_reader_with_file_handle(Cursor::new(content.to_vec()))
        .finish()?;
    Ok(column_names(&head))
}

fn text_schema(columns: &[String]) -> Schema {
    let mut schema = Schema::with_capacity(columns.len());
    for name in columns.iter().filter(|name| is_text_column(name)) {
        schema.with_column(name.as_str().into(), DataType::String);
    }
    schema
}

/// Rename the first alias found in each alias group to its canonical name
/// and drop any later aliases of the same group.
pub fn canonicalize_aliases(mut df: DataFrame) -> Result<DataFrame> {
    for (canonical, aliases) in COLUMN_ALIASES {
        let present: Vec<&str> = aliases
            .iter()
            .copied()
            .filter(|alias| df.column(alias).is_ok())
            .collect();

        let Some((winner, rest)) = present.split_first() else {
            continue;
        };

        for alias in rest {
            debug!("Dropping duplicate alias column '{}' (using '{}')", alias, winner);
            df.drop_in_place(alias)?;
        }

        if *winner != canonical {
            debug!("Renaming column '{}' to '{}'", winner, canonical);
            df.rename(winner, canonical.into())?;
        }
    }

    Ok(df)
}

pub(crate) fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}
