//! Workbook export of a filtered report.
//!
//! The workbook has two sheets:
//!
//! - `Detailanalyse`: every filtered row with all merged and derived columns
//! - `Tageszeit-Analyse`: count, sum and mean page views and mean engagement
//!   rate per time-of-day bucket
//!
//! Numeric cells are stored as numbers with grouped number formats, so the
//! values survive a round trip while the display follows the viewer's locale.

pub mod format;
mod xlsx;

pub use format::{format_decimal, format_percent, format_thousands};
pub use xlsx::{Cell, CellValue, Workbook, column_name, read_sheet, sheet_names};

use crate::error::{Result, ResultExt};
use crate::metrics::time_of_day_breakdown;
use crate::report::{PortalFilter, to_dataframe};
use crate::schema;
use crate::types::EnrichedArticle;
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DETAIL_SHEET: &str = "Detailanalyse";
pub const TIME_OF_DAY_SHEET: &str = "Tageszeit-Analyse";

/// Header of the detail sheet, in column order.
pub const DETAIL_COLUMNS: [&str; 18] = [
    schema::BRAND,
    schema::DOCUMENT_ID,
    schema::TITLE,
    schema::SOURCE_ID,
    schema::CANONICAL_URL,
    schema::PUBLISHED_URL,
    schema::CONTENT_STATUS,
    schema::EDITED_AT,
    schema::CREATED_AT,
    schema::PAGE_VIEWS,
    schema::UNIQUE_USERS,
    schema::LIKES,
    schema::COMMENTS,
    schema::WEEKDAY,
    schema::HOUR,
    schema::TIME_OF_DAY,
    schema::ENGAGEMENT_RATE,
    schema::UNIQUE_VISITOR_RATE,
];

/// Header of the time-of-day sheet.
pub const TIME_OF_DAY_COLUMNS: [&str; 5] = [
    schema::TIME_OF_DAY,
    "Anzahl",
    "Summe Seitenaufrufe",
    "Mittelwert Seitenaufrufe",
    "Mittelwert Engagement_Rate",
];

fn header(columns: &[&str]) -> Vec<Cell> {
    columns.iter().map(|c| Cell::Header(c.to_string())).collect()
}

fn detail_row(row: &EnrichedArticle) -> Vec<Cell> {
    let a = &row.article;
    vec![
        Cell::Text(a.brand.clone()),
        Cell::text(a.document_id.as_deref()),
        Cell::text(a.title.as_deref()),
        Cell::text(a.source_id.as_deref()),
        Cell::text(a.canonical_url.as_deref()),
        Cell::text(a.published_url.as_deref()),
        Cell::text(a.status.as_deref()),
        Cell::text(a.edited_at.as_deref()),
        Cell::text(a.created_at.as_deref()),
        Cell::Count(a.page_views),
        Cell::Count(a.unique_users),
        Cell::Count(a.likes),
        Cell::Count(a.comments),
        Cell::text(row.weekday.as_deref()),
        row.hour.map_or(Cell::Empty, |h| Cell::Count(u64::from(h))),
        Cell::text(row.time_of_day.map(|t| t.label())),
        Cell::Decimal(row.engagement_rate),
        Cell::Decimal(row.unique_visitor_rate),
    ]
}

/// Build the two-sheet workbook for `rows`.
pub fn write_workbook(rows: &[&EnrichedArticle]) -> Result<Vec<u8>> {
    let mut detail = Vec::with_capacity(rows.len() + 1);
    detail.push(header(&DETAIL_COLUMNS));
    detail.extend(rows.iter().map(|r| detail_row(r)));

    let mut time_of_day = vec![header(&TIME_OF_DAY_COLUMNS)];
    time_of_day.extend(time_of_day_breakdown(rows).into_iter().map(|stats| {
        vec![
            Cell::Text(stats.time_of_day.label().to_string()),
            Cell::Count(stats.article_count as u64),
            Cell::Count(stats.total_views),
            Cell::Decimal(stats.mean_views),
            Cell::Decimal(stats.mean_engagement_rate),
        ]
    }));

    let mut workbook = Workbook::new();
    workbook
        .add_sheet(DETAIL_SHEET, detail)
        .add_sheet(TIME_OF_DAY_SHEET, time_of_day);
    workbook.to_bytes()
}

/// `MSN_Analyse_{portal}_{YYYYMMDD}`, with path separators in the portal
/// label replaced.
pub fn report_file_stem(portal: &PortalFilter, date: NaiveDate) -> String {
    let label: String = portal
        .label()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("MSN_Analyse_{}_{}", label, date.format("%Y%m%d"))
}

/// Workbook file name: [`report_file_stem`] with an `.xlsx` extension.
pub fn report_file_name(portal: &PortalFilter, date: NaiveDate) -> String {
    format!("{}.xlsx", report_file_stem(portal, date))
}

/// Write the workbook for `rows` into `dir`, creating it if needed.
pub fn write_report(
    dir: &Path,
    portal: &PortalFilter,
    date: NaiveDate,
    rows: &[&EnrichedArticle],
) -> Result<PathBuf> {
    let bytes = write_workbook(rows)?;
    fs::create_dir_all(dir).context(format!("Creating {}", dir.display()))?;

    let path = dir.join(report_file_name(portal, date));
    fs::write(&path, &bytes).context(format!("Writing {}", path.display()))?;

    info!("Workbook written to {} ({} rows)", path.display(), rows.len());
    Ok(path)
}

/// Write the detail table of `rows` as `;`-separated CSV into `dir`.
pub fn write_csv(
    dir: &Path,
    portal: &PortalFilter,
    date: NaiveDate,
    rows: &[&EnrichedArticle],
) -> Result<PathBuf> {
    let mut df = to_dataframe(rows)?;
    fs::create_dir_all(dir).context(format!("Creating {}", dir.display()))?;

    let path = dir.join(format!("{}.csv", report_file_stem(portal, date)));
    let mut file = File::create(&path).context(format!("Creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b';')
        .with_quote_char(b'"')
        .finish(&mut df)
        .context(format!("Writing {}", path.display()))?;

    info!("Detail table written to {}", path.display());
    Ok(path)
}
