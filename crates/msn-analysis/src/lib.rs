//! MSN Republishing Analysis Library
//!
//! Reconciles the two reports exported from the MSN partner hub, the content
//! catalog ("Inhaltsbericht") and the page-view log ("Seitenaufrufe"), and
//! derives engagement metrics per article and per portal. Built on Polars.
//!
//! # Overview
//!
//! - **Loading**: delimited exports are parsed, column aliases canonicalized
//!   and required columns validated per table kind
//! - **Memory Optimization**: integer columns are narrowed after loading
//! - **Merging**: page views are summed per document and left-joined onto the
//!   catalog rows of the allowed portals
//! - **Metrics**: weekday, hour, time-of-day bucket, engagement and unique
//!   visitor rates, global summary and per-portal statistics
//! - **Reporting**: portal filter, top-N display and a two-sheet XLSX export
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use msn_analysis::{AnalysisConfig, AnalysisSession, DisplayLimit, PortalFilter, ReportView};
//!
//! let mut session = AnalysisSession::new(AnalysisConfig::default())?;
//! session.upload_catalog("inhalte.csv", &std::fs::read("inhalte.csv")?)?;
//! session.upload_views("aufrufe.csv", &std::fs::read("aufrufe.csv")?)?;
//!
//! let result = session.analyze()?;
//! println!("{} articles, {} views", result.summary.article_count, result.summary.total_views);
//!
//! let view = ReportView::new(result, PortalFilter::from_label("HNA"), DisplayLimit::Top10);
//! let workbook = msn_analysis::export::write_workbook(&view.rows)?;
//! ```
//!
//! # Pipeline
//!
//! Without a session, the [`Pipeline`] runs once over two tables:
//!
//! ```rust,ignore
//! use msn_analysis::{AnalysisConfig, Pipeline};
//!
//! let result = Pipeline::builder()
//!     .config(AnalysisConfig::builder().allowed_brands(["HNA"]).build()?)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run_bytes(("inhalte.csv", &catalog), ("aufrufe.csv", &views))?;
//! ```
//!
//! # Errors
//!
//! Every operation returns [`AnalysisError`]. File and validation errors
//! carry a short message for the user; anything else is a processing error
//! whose [`AnalysisError::user_message`] includes the full cause chain.

pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod merger;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod session;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ConfigValidationError, DEFAULT_BRANDS};
pub use error::{AnalysisError, ErrorKind, Result as MsnResult, ResultExt};
pub use loader::{LoadOptions, LoadedTable, MemoryOptimizer, OptimizationReport, TableInfo, load_table};
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
pub use report::{AnalysisReport, DisplayLimit, KeyMetrics, PortalFilter, ReportView};
pub use schema::TableKind;
pub use session::AnalysisSession;
pub use types::{
    AggregatedView, AnalysisResult, ContentRecord, EnrichedArticle, MergedArticle, SegmentStats,
    Summary, TimeOfDay, TimeOfDayStats, ViewRecord,
};
