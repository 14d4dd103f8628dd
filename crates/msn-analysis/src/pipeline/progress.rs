//! Stage notifications emitted while a [`Pipeline`](super::Pipeline) runs.
//!
//! ```rust,ignore
//! let pipeline = Pipeline::builder()
//!     .on_progress(|update| eprintln!("{update}"))
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Step of an analysis run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Loading,
    Optimizing,
    Merging,
    Enriching,
    Summarizing,
    Complete,
    Failed,
}

impl PipelineStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Reading exports",
            Self::Optimizing => "Narrowing columns",
            Self::Merging => "Joining page views",
            Self::Enriching => "Deriving metrics",
            Self::Summarizing => "Aggregating portals",
            Self::Complete => "Done",
            Self::Failed => "Aborted",
        }
    }

    /// Share of the run finished when this stage starts. A failed run
    /// reports 0.
    pub fn fraction(&self) -> f32 {
        match self {
            Self::Loading | Self::Failed => 0.0,
            Self::Optimizing => 0.25,
            Self::Merging => 0.35,
            Self::Enriching => 0.65,
            Self::Summarizing => 0.85,
            Self::Complete => 1.0,
        }
    }

    /// No further updates follow this stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// One notification, sent when a stage starts or the run ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: PipelineStage,
    /// 0.0 to 1.0
    pub progress: f32,
    pub message: String,
    /// Rows entering the stage, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
}

impl ProgressUpdate {
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: stage.fraction(),
            message: message.into(),
            rows: None,
        }
    }

    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Complete, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Failed, message)
    }
}

impl fmt::Display for ProgressUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:>3.0}%] {}: {}",
            self.progress * 100.0,
            self.stage.display_name(),
            self.message
        )?;
        if let Some(rows) = self.rows {
            write!(f, " ({rows} rows)")?;
        }
        Ok(())
    }
}

/// Sink for [`ProgressUpdate`]s. Must be shareable across threads.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Adapts a closure to [`ProgressReporter`].
pub struct ClosureProgressReporter<F>(F);

impl<F: Fn(ProgressUpdate) + Send + Sync> ClosureProgressReporter<F> {
    pub fn new(callback: F) -> Self {
        Self(callback)
    }
}

impl<F: Fn(ProgressUpdate) + Send + Sync> ProgressReporter for ClosureProgressReporter<F> {
    fn report(&self, update: ProgressUpdate) {
        (self.0)(update)
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_fraction_grows_with_stage_order() {
        let stages = [
            PipelineStage::Loading,
            PipelineStage::Optimizing,
            PipelineStage::Merging,
            PipelineStage::Enriching,
            PipelineStage::Summarizing,
            PipelineStage::Complete,
        ];
        for pair in stages.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].fraction() < pair[1].fraction());
        }
        assert!(PipelineStage::Failed.is_terminal());
        assert!(!PipelineStage::Merging.is_terminal());
    }

    #[test]
    fn test_closure_reporter_forwards_updates() {
        let seen = Mutex::new(Vec::new());
        let reporter = ClosureProgressReporter::new(|update: ProgressUpdate| {
            seen.lock().unwrap().push(update.stage);
        });

        reporter.report(ProgressUpdate::new(PipelineStage::Merging, "joining"));
        reporter.report(ProgressUpdate::complete("done"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![PipelineStage::Merging, PipelineStage::Complete]
        );
    }

    #[test]
    fn test_display_includes_rows() {
        let update = ProgressUpdate::new(PipelineStage::Merging, "joining").with_rows(42);
        assert_eq!(update.to_string(), "[ 35%] Joining page views: joining (42 rows)");
    }

    #[test]
    fn test_serialization_skips_unknown_rows() {
        let json = serde_json::to_string(&ProgressUpdate::failed("boom")).unwrap();
        assert!(json.contains("\"failed\""));
        assert!(json.contains("boom"));
        assert!(!json.contains("rows"));
    }
}
