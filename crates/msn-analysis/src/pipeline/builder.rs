//! Main analysis pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating load, merge, enrichment and summary.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::loader::{LoadOptions, LoadedTable, MemoryOptimizer, load_table};
use crate::merger;
use crate::metrics;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::schema::TableKind;
use crate::types::AnalysisResult;
use polars::prelude::*;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// The analysis pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use msn_analysis::{AnalysisConfig, Pipeline};
///
/// let result = Pipeline::builder()
///     .config(AnalysisConfig::builder().allowed_brands(["HNA"]).build()?)
///     .build()?
///     .run_bytes(("inhalte.csv", &catalog_bytes), ("aufrufe.csv", &views_bytes))?;
///
/// println!("{} articles, {} views", result.summary.article_count, result.summary.total_views);
/// ```
pub struct Pipeline {
    config: AnalysisConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Load one table with this pipeline's parsing options.
    pub fn load(
        &self,
        source_name: &str,
        bytes: &[u8],
        expected: Option<TableKind>,
    ) -> Result<LoadedTable> {
        load_table(source_name, bytes, expected, &LoadOptions::from(&self.config))
    }

    /// Load both tables from raw bytes and run the analysis.
    ///
    /// Each argument is `(source name, bytes)`.
    pub fn run_bytes(
        &self,
        catalog: (&str, &[u8]),
        views: (&str, &[u8]),
    ) -> Result<AnalysisResult> {
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            "Loading input tables...",
        ));

        let loaded = self
            .load(catalog.0, catalog.1, Some(TableKind::Catalog))
            .and_then(|c| Ok((c, self.load(views.0, views.1, Some(TableKind::Views))?)));

        match loaded {
            Ok((catalog, views)) => self.run(&catalog.df, &views.df),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Run merge, enrichment and summary over two validated frames.
    ///
    /// Either the whole run succeeds or an error is returned; no partial
    /// results are produced.
    pub fn run(&self, catalog: &DataFrame, views: &DataFrame) -> Result<AnalysisResult> {
        match self.run_internal(catalog, views) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Analysed {} articles",
                    result.articles.len()
                )));
                Ok(result)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&self, e: AnalysisError) -> AnalysisError {
        error!("Pipeline error: {}", e);
        self.report_progress(ProgressUpdate::failed(e.to_string()));
        e
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal(&self, catalog: &DataFrame, views: &DataFrame) -> Result<AnalysisResult> {
        let start_time = Instant::now();
        info!(
            "Starting analysis: {} catalog rows, {} page-view rows",
            catalog.height(),
            views.height()
        );

        let (catalog, views): (Cow<'_, DataFrame>, Cow<'_, DataFrame>) =
            if self.config.optimize_memory {
                self.report_progress(
                    ProgressUpdate::new(PipelineStage::Optimizing, "Narrowing column storage...")
                        .with_rows(catalog.height() + views.height()),
                );
                let (catalog, _) = MemoryOptimizer::optimize(catalog.clone())
                    .map_err(|e| processing_context(e, "Optimizing catalog storage"))?;
                let (views, _) = MemoryOptimizer::optimize(views.clone())
                    .map_err(|e| processing_context(e, "Optimizing page-view storage"))?;
                (Cow::Owned(catalog), Cow::Owned(views))
            } else {
                debug!("Memory optimization disabled");
                (Cow::Borrowed(catalog), Cow::Borrowed(views))
            };

        self.report_progress(
            ProgressUpdate::new(PipelineStage::Merging, "Merging catalog with page views...")
                .with_rows(catalog.height()),
        );
        let merged = merger::merge(&catalog, &views, &self.config.allowed_brands)
            .map_err(|e| processing_context(e, "Merging catalog with page views"))?;

        self.report_progress(
            ProgressUpdate::new(PipelineStage::Enriching, "Deriving time and engagement metrics...")
                .with_rows(merged.len()),
        );
        let articles = metrics::enrich(merged, &self.config.timestamp_format);

        self.report_progress(
            ProgressUpdate::new(PipelineStage::Summarizing, "Computing summary statistics...")
                .with_rows(articles.len()),
        );
        let (summary, segments) = metrics::summarize(&articles, &self.config.allowed_brands);

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Analysis complete in {}ms: {} articles, {} total views",
            duration_ms, summary.article_count, summary.total_views
        );

        Ok(AnalysisResult {
            articles,
            summary,
            segments,
            brands: self.config.allowed_brands.clone(),
            duration_ms,
        })
    }
}

/// Validation errors pass through unchanged; anything else gets stage context.
fn processing_context(e: AnalysisError, stage: &str) -> AnalysisError {
    if e.is_user_error() {
        e
    } else {
        e.with_context(stage)
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<AnalysisConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration. Defaults to [`AnalysisConfig::default()`].
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Report progress to a closure.
    pub fn on_progress<F>(self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter(Arc::new(ClosureProgressReporter::new(callback)))
    }

    /// Build the pipeline, validating the configuration.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::TimeOfDay;
    use std::sync::Mutex;

    const CATALOG: &str = "Markenname,Dokument-ID,Inhaltstitel,Erstellt/Aktualisiert am\n\
                           HNA,1,X,\"01.01.2025, 07:00:00\"\n\
                           Merkur,2,Y,\"01.01.2025, 08:00:00\"\n";
    const VIEWS: &str = "Dokument-ID,Inhaltstitel,Seitenaufrufe,Eindeutige Benutzer,Likes,Kommentare\n\
                         1,X,10,6,1,1\n\
                         1,X,5,3,1,0\n";

    fn pipeline(brands: &[&str]) -> Pipeline {
        Pipeline::builder()
            .config(
                AnalysisConfig::builder()
                    .allowed_brands(brands.iter().copied())
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_run_bytes_scenario() {
        let result = pipeline(&["HNA"])
            .run_bytes(("c.csv", CATALOG.as_bytes()), ("v.csv", VIEWS.as_bytes()))
            .unwrap();

        assert_eq!(result.articles.len(), 1);
        let row = &result.articles[0];
        assert_eq!(row.article.page_views, 15);
        assert_eq!(row.time_of_day, Some(TimeOfDay::Morning));
        assert!((row.engagement_rate - 3.0 / 15.0 * 100.0).abs() < 1e-9);
        assert_eq!(result.brands, vec!["HNA"]);
    }

    #[test]
    fn test_run_without_optimizer_matches() {
        let config = AnalysisConfig::builder()
            .allowed_brands(["HNA"])
            .optimize_memory(false)
            .build()
            .unwrap();
        let plain = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .run_bytes(("c.csv", CATALOG.as_bytes()), ("v.csv", VIEWS.as_bytes()))
            .unwrap();
        let optimized = pipeline(&["HNA"])
            .run_bytes(("c.csv", CATALOG.as_bytes()), ("v.csv", VIEWS.as_bytes()))
            .unwrap();

        assert_eq!(plain.articles, optimized.articles);
        assert_eq!(plain.summary, optimized.summary);
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = AnalysisConfig::default();
        config.allowed_brands.clear();
        let err = Pipeline::builder().config(config).build().err().unwrap();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn test_progress_reports_stages_and_failure() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&stages);
        let pipeline = Pipeline::builder()
            .on_progress(move |update| sink.lock().unwrap().push(update.stage))
            .build()
            .unwrap();

        pipeline
            .run_bytes(("c.csv", CATALOG.as_bytes()), ("v.csv", VIEWS.as_bytes()))
            .unwrap();
        assert_eq!(stages.lock().unwrap().last(), Some(&PipelineStage::Complete));
        assert!(stages.lock().unwrap().contains(&PipelineStage::Merging));

        let err = pipeline
            .run_bytes(("c.csv", b""), ("v.csv", VIEWS.as_bytes()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileLoad);
        assert_eq!(stages.lock().unwrap().last(), Some(&PipelineStage::Failed));
    }

    #[test]
    fn test_missing_timestamp_is_validation_error() {
        let catalog = "Markenname,Dokument-ID,Inhaltstitel\nHNA,1,X\n";
        let err = pipeline(&["HNA"])
            .run_bytes(("c.csv", catalog.as_bytes()), ("v.csv", VIEWS.as_bytes()))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MissingTimestampColumn(_)));
        assert_eq!(err.kind(), ErrorKind::DataValidation);
    }
}
