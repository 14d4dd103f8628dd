//! Column names of the two MSN exports and the per-table column contracts.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Column Names
// =============================================================================

pub const BRAND: &str = "Markenname";
pub const DOCUMENT_ID: &str = "Dokument-ID";
pub const TITLE: &str = "Inhaltstitel";
pub const SOURCE_ID: &str = "Quell-ID";
pub const CANONICAL_URL: &str = "Kanonische URL";
pub const PUBLISHED_URL: &str = "Veröffentlichte URL";
pub const CONTENT_STATUS: &str = "Inhaltsstatus";
pub const EDITED_AT: &str = "Bearbeitet am";
pub const CREATED_AT: &str = "Erstellt/Aktualisiert am";

pub const PAGE_VIEWS: &str = "Seitenaufrufe";
pub const UNIQUE_USERS: &str = "Eindeutige Benutzer";
pub const LIKES: &str = "Likes";
pub const COMMENTS: &str = "Kommentare";

pub const WEEKDAY: &str = "Wochentag";
pub const HOUR: &str = "Stunde";
pub const TIME_OF_DAY: &str = "Tageszeit";
pub const ENGAGEMENT_RATE: &str = "Engagement_Rate";
pub const UNIQUE_VISITOR_RATE: &str = "Unique_Visitor_Rate";

/// Accepted spellings of the edit timestamp, in resolution order.
///
/// Older catalog exports use the second spelling.
pub const EDITED_AT_ALIASES: [&str; 2] = [EDITED_AT, "Zuletzt bearbeitet am"];

/// Alias groups as `(canonical name, aliases in resolution order)`.
pub const COLUMN_ALIASES: [(&str, &[&str]); 1] = [(EDITED_AT, &EDITED_AT_ALIASES)];

/// Descriptive catalog columns carried into the merged table, in output order.
pub const CATALOG_OUTPUT_COLUMNS: [&str; 9] = [
    BRAND,
    DOCUMENT_ID,
    TITLE,
    SOURCE_ID,
    CANONICAL_URL,
    PUBLISHED_URL,
    CONTENT_STATUS,
    EDITED_AT,
    CREATED_AT,
];

/// Numeric page-view columns that are summed per document.
pub const VIEW_COUNT_COLUMNS: [&str; 4] = [PAGE_VIEWS, UNIQUE_USERS, LIKES, COMMENTS];

/// Whether `name` is a column kept verbatim as text.
///
/// Covers ids, titles, URLs and timestamps, under every accepted spelling.
/// Such columns are read as strings and never narrowed to numbers.
pub fn is_text_column(name: &str) -> bool {
    CATALOG_OUTPUT_COLUMNS.contains(&name) || EDITED_AT_ALIASES.contains(&name)
}

// =============================================================================
// Table Kinds
// =============================================================================

/// The two kinds of input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Content catalog export ("Inhaltsbericht").
    Catalog,
    /// Page-view export ("Seitenaufrufe").
    Views,
}

impl TableKind {
    /// Columns that must be present for a table of this kind.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Catalog => &[BRAND, DOCUMENT_ID, TITLE],
            Self::Views => &[DOCUMENT_ID, PAGE_VIEWS, UNIQUE_USERS, LIKES, COMMENTS],
        }
    }

    /// Column whose presence identifies a table of this kind.
    pub fn marker_column(&self) -> &'static str {
        match self {
            Self::Catalog => BRAND,
            Self::Views => PAGE_VIEWS,
        }
    }

    /// Guess the kind from a header. Views win when both markers appear.
    pub fn detect<S: AsRef<str>>(columns: &[S]) -> Option<Self> {
        let has = |name: &str| columns.iter().any(|c| c.as_ref() == name);
        if has(Self::Views.marker_column()) {
            Some(Self::Views)
        } else if has(Self::Catalog.marker_column()) {
            Some(Self::Catalog)
        } else {
            None
        }
    }

    /// Required columns absent from `columns`, in contract order.
    pub fn missing_columns<S: AsRef<str>>(&self, columns: &[S]) -> Vec<String> {
        self.required_columns()
            .iter()
            .filter(|required| !columns.iter().any(|c| c.as_ref() == **required))
            .map(|s| s.to_string())
            .collect()
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Catalog => write!(f, "catalog"),
            Self::Views => write!(f, "views"),
        }
    }
}
