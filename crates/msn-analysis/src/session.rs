//! Session-scoped analysis state.
//!
//! An [`AnalysisSession`] owns the uploaded tables and the most recent
//! analysis result of one user. Nothing is shared between sessions.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::loader::{LoadedTable, TableInfo};
use crate::pipeline::Pipeline;
use crate::schema::TableKind;
use crate::types::AnalysisResult;
use crate::utils::fingerprint;
use tracing::{debug, info};

/// Memoized result and the input fingerprint it was computed from.
#[derive(Debug)]
struct CachedAnalysis {
    fingerprint: String,
    result: AnalysisResult,
}

/// Uploaded tables and cached analysis of one session.
///
/// Created at session start, cleared with [`AnalysisSession::reset`].
pub struct AnalysisSession {
    pipeline: Pipeline,
    catalog: Option<LoadedTable>,
    views: Option<LoadedTable>,
    cached: Option<CachedAnalysis>,
    analysis_runs: usize,
}

impl AnalysisSession {
    /// Start a session.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidConfig`] when `config` does not validate.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Ok(Self::with_pipeline(Pipeline::builder().config(config).build()?))
    }

    /// Start a session around a preconfigured pipeline, e.g. one with a
    /// progress reporter.
    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            catalog: None,
            views: None,
            cached: None,
            analysis_runs: 0,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.pipeline.config()
    }

    /// Validate and store the catalog table, replacing any previous one.
    ///
    /// On error the previously uploaded table is kept.
    pub fn upload_catalog(&mut self, source_name: &str, bytes: &[u8]) -> Result<&TableInfo> {
        let table = self
            .pipeline
            .load(source_name, bytes, Some(TableKind::Catalog))?;
        Ok(&self.catalog.insert(table).info)
    }

    /// Validate and store the page-view table, replacing any previous one.
    ///
    /// On error the previously uploaded table is kept.
    pub fn upload_views(&mut self, source_name: &str, bytes: &[u8]) -> Result<&TableInfo> {
        let table = self
            .pipeline
            .load(source_name, bytes, Some(TableKind::Views))?;
        Ok(&self.views.insert(table).info)
    }

    pub fn catalog_info(&self) -> Option<&TableInfo> {
        self.catalog.as_ref().map(|t| &t.info)
    }

    pub fn views_info(&self) -> Option<&TableInfo> {
        self.views.as_ref().map(|t| &t.info)
    }

    /// Both tables are uploaded.
    pub fn is_ready(&self) -> bool {
        self.catalog.is_some() && self.views.is_some()
    }

    /// Number of times the pipeline actually ran in this session.
    pub fn analysis_runs(&self) -> usize {
        self.analysis_runs
    }

    /// Run the analysis, or return the cached result when neither table nor
    /// the brand list changed since the last run.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::NoDataLoaded`] until both tables are
    /// uploaded, and any pipeline error otherwise. A failed run leaves the
    /// previous cache untouched.
    pub fn analyze(&mut self) -> Result<&AnalysisResult> {
        let (Some(catalog), Some(views)) = (&self.catalog, &self.views) else {
            return Err(AnalysisError::NoDataLoaded);
        };

        let key = self.input_fingerprint(&catalog.info, &views.info);
        if self.cached.as_ref().is_some_and(|c| c.fingerprint == key) {
            debug!("Inputs unchanged, reusing cached analysis");
        } else {
            let result = self.pipeline.run(&catalog.df, &views.df)?;
            self.analysis_runs += 1;
            info!("Analysis run {} completed", self.analysis_runs);
            self.cached = Some(CachedAnalysis {
                fingerprint: key,
                result,
            });
        }

        self.last_result().ok_or(AnalysisError::NoDataLoaded)
    }

    /// Last computed result, if any.
    pub fn last_result(&self) -> Option<&AnalysisResult> {
        self.cached.as_ref().map(|c| &c.result)
    }

    /// Drop the uploaded tables and the cached result.
    pub fn reset(&mut self) {
        self.catalog = None;
        self.views = None;
        self.cached = None;
        info!("Session reset");
    }

    fn input_fingerprint(&self, catalog: &TableInfo, views: &TableInfo) -> String {
        let brands = self.config().allowed_brands.join("\u{1f}");
        let combined = format!("{}|{}|{}", catalog.fingerprint, views.fingerprint, brands);
        fingerprint(combined.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = "Markenname,Dokument-ID,Inhaltstitel,Erstellt/Aktualisiert am\n\
                           HNA,1,X,\"01.01.2025, 07:00:00\"\n";
    const VIEWS: &str = "Dokument-ID,Inhaltstitel,Seitenaufrufe,Eindeutige Benutzer,Likes,Kommentare\n\
                         1,X,10,6,1,1\n";

    fn session() -> AnalysisSession {
        AnalysisSession::new(AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_analyze_requires_both_tables() {
        let mut session = session();
        assert!(matches!(session.analyze(), Err(AnalysisError::NoDataLoaded)));

        session.upload_catalog("c.csv", CATALOG.as_bytes()).unwrap();
        assert!(!session.is_ready());
        assert!(matches!(session.analyze(), Err(AnalysisError::NoDataLoaded)));
    }

    #[test]
    fn test_cache_reused_until_input_changes() {
        let mut session = session();
        session.upload_catalog("c.csv", CATALOG.as_bytes()).unwrap();
        session.upload_views("v.csv", VIEWS.as_bytes()).unwrap();

        assert_eq!(session.analyze().unwrap().summary.total_views, 10);
        assert_eq!(session.analyze().unwrap().summary.total_views, 10);
        assert_eq!(session.analysis_runs(), 1);

        // Same bytes again: still cached
        session.upload_views("v.csv", VIEWS.as_bytes()).unwrap();
        session.analyze().unwrap();
        assert_eq!(session.analysis_runs(), 1);

        let changed = VIEWS.replace("10,6", "12,6");
        session.upload_views("v.csv", changed.as_bytes()).unwrap();
        assert_eq!(session.analyze().unwrap().summary.total_views, 12);
        assert_eq!(session.analysis_runs(), 2);
    }

    #[test]
    fn test_failed_upload_keeps_previous_table() {
        let mut session = session();
        session.upload_views("v.csv", VIEWS.as_bytes()).unwrap();

        let err = session
            .upload_views("bad.csv", b"Dokument-ID,Seitenaufrufe\n1,2\n")
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MissingColumns { .. }));
        assert_eq!(session.views_info().unwrap().source_name, "v.csv");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = session();
        session.upload_catalog("c.csv", CATALOG.as_bytes()).unwrap();
        session.upload_views("v.csv", VIEWS.as_bytes()).unwrap();
        session.analyze().unwrap();

        session.reset();

        assert!(!session.is_ready());
        assert!(session.last_result().is_none());
        assert!(session.catalog_info().is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalysisConfig {
            allowed_brands: Vec::new(),
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            AnalysisSession::new(config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }
}
