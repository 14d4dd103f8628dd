//! Filtered report views over an analysis result.
//!
//! A [`ReportView`] is the data behind the dashboard: rows of one portal
//! (or all), key metrics and the time-of-day breakdown of those rows, and
//! the top-N slice that is displayed.

use crate::error::Result;
use crate::metrics::stats::{mean, time_of_day_breakdown};
use crate::schema;
use crate::types::{AnalysisResult, EnrichedArticle, SegmentStats, Summary, TimeOfDayStats};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label of the "all portals" choice.
pub const ALL_PORTALS_LABEL: &str = "Alle";

/// Which portal's rows a report covers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PortalFilter {
    #[default]
    All,
    Portal(String),
}

impl PortalFilter {
    /// Parse a selection label; [`ALL_PORTALS_LABEL`] selects every portal.
    pub fn from_label(label: &str) -> Self {
        if label == ALL_PORTALS_LABEL {
            Self::All
        } else {
            Self::Portal(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => ALL_PORTALS_LABEL,
            Self::Portal(name) => name,
        }
    }

    pub fn matches(&self, article: &EnrichedArticle) -> bool {
        match self {
            Self::All => true,
            Self::Portal(name) => article.article.brand == *name,
        }
    }
}

impl fmt::Display for PortalFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How many rows of the detail table are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayLimit {
    Top5,
    #[default]
    Top10,
    All,
}

impl DisplayLimit {
    pub fn max_rows(&self) -> Option<usize> {
        match self {
            Self::Top5 => Some(5),
            Self::Top10 => Some(10),
            Self::All => None,
        }
    }
}

/// Key figures of a filtered view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub article_count: usize,
    pub total_views: u64,
    pub mean_views: f64,
    pub mean_engagement_rate: f64,
}

/// Rows of one portal with their metrics.
#[derive(Debug, Clone)]
pub struct ReportView<'a> {
    pub portal: PortalFilter,
    pub limit: DisplayLimit,
    /// Matching rows in result order (page views, descending).
    pub rows: Vec<&'a EnrichedArticle>,
    pub metrics: KeyMetrics,
    pub time_of_day: Vec<TimeOfDayStats>,
}

impl<'a> ReportView<'a> {
    pub fn new(result: &'a AnalysisResult, portal: PortalFilter, limit: DisplayLimit) -> Self {
        let rows: Vec<&EnrichedArticle> = result
            .articles
            .iter()
            .filter(|article| portal.matches(article))
            .collect();

        let metrics = KeyMetrics {
            article_count: rows.len(),
            total_views: rows.iter().map(|r| r.article.page_views).sum(),
            mean_views: mean(rows.iter().map(|r| r.article.page_views as f64)),
            mean_engagement_rate: mean(rows.iter().map(|r| r.engagement_rate)),
        };
        let time_of_day = time_of_day_breakdown(&rows);

        Self {
            portal,
            limit,
            rows,
            metrics,
            time_of_day,
        }
    }

    /// The first N rows according to the display limit.
    pub fn displayed(&self) -> &[&'a EnrichedArticle] {
        match self.limit.max_rows() {
            Some(n) => &self.rows[..n.min(self.rows.len())],
            None => &self.rows,
        }
    }
}

/// Portal choices: [`ALL_PORTALS_LABEL`] followed by the configured brands.
pub fn portal_options(result: &AnalysisResult) -> Vec<String> {
    std::iter::once(ALL_PORTALS_LABEL.to_string())
        .chain(result.brands.iter().cloned())
        .collect()
}

/// Build the detail table with the export column names.
pub fn to_dataframe(rows: &[&EnrichedArticle]) -> Result<DataFrame> {
    fn text<'r>(
        rows: &[&'r EnrichedArticle],
        get: impl Fn(&'r EnrichedArticle) -> Option<&'r str>,
    ) -> Vec<Option<&'r str>> {
        rows.iter().map(|r| get(*r)).collect()
    }

    let columns: Vec<Column> = vec![
        Series::new(
            schema::BRAND.into(),
            text(rows, |r| Some(r.article.brand.as_str())),
        )
        .into(),
        Series::new(
            schema::DOCUMENT_ID.into(),
            text(rows, |r| r.article.document_id.as_deref()),
        )
        .into(),
        Series::new(schema::TITLE.into(), text(rows, |r| r.article.title.as_deref())).into(),
        Series::new(
            schema::SOURCE_ID.into(),
            text(rows, |r| r.article.source_id.as_deref()),
        )
        .into(),
        Series::new(
            schema::CANONICAL_URL.into(),
            text(rows, |r| r.article.canonical_url.as_deref()),
        )
        .into(),
        Series::new(
            schema::PUBLISHED_URL.into(),
            text(rows, |r| r.article.published_url.as_deref()),
        )
        .into(),
        Series::new(
            schema::CONTENT_STATUS.into(),
            text(rows, |r| r.article.status.as_deref()),
        )
        .into(),
        Series::new(
            schema::EDITED_AT.into(),
            text(rows, |r| r.article.edited_at.as_deref()),
        )
        .into(),
        Series::new(
            schema::CREATED_AT.into(),
            text(rows, |r| r.article.created_at.as_deref()),
        )
        .into(),
        Series::new(
            schema::PAGE_VIEWS.into(),
            rows.iter().map(|r| r.article.page_views).collect::<Vec<u64>>(),
        )
        .into(),
        Series::new(
            schema::UNIQUE_USERS.into(),
            rows.iter().map(|r| r.article.unique_users).collect::<Vec<u64>>(),
        )
        .into(),
        Series::new(
            schema::LIKES.into(),
            rows.iter().map(|r| r.article.likes).collect::<Vec<u64>>(),
        )
        .into(),
        Series::new(
            schema::COMMENTS.into(),
            rows.iter().map(|r| r.article.comments).collect::<Vec<u64>>(),
        )
        .into(),
        Series::new(schema::WEEKDAY.into(), text(rows, |r| r.weekday.as_deref())).into(),
        Series::new(
            schema::HOUR.into(),
            rows.iter().map(|r| r.hour).collect::<Vec<Option<u32>>>(),
        )
        .into(),
        Series::new(
            schema::TIME_OF_DAY.into(),
            text(rows, |r| r.time_of_day.map(|t| t.label())),
        )
        .into(),
        Series::new(
            schema::ENGAGEMENT_RATE.into(),
            rows.iter().map(|r| r.engagement_rate).collect::<Vec<f64>>(),
        )
        .into(),
        Series::new(
            schema::UNIQUE_VISITOR_RATE.into(),
            rows.iter().map(|r| r.unique_visitor_rate).collect::<Vec<f64>>(),
        )
        .into(),
    ];

    Ok(DataFrame::new(columns)?)
}

/// Machine-readable report of one analysis, used for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    pub catalog_file: String,
    pub views_file: String,
    pub portal: String,
    pub summary: Summary,
    pub segments: Vec<SegmentStats>,
    pub key_metrics: KeyMetrics,
    pub time_of_day: Vec<TimeOfDayStats>,
    /// Displayed rows only.
    pub articles: Vec<EnrichedArticle>,
    /// Path of the written workbook, if any.
    pub export_file: Option<String>,
    pub duration_ms: u64,
}

impl AnalysisReport {
    pub fn build(
        result: &AnalysisResult,
        view: &ReportView<'_>,
        catalog_file: &str,
        views_file: &str,
        export_file: Option<String>,
    ) -> Self {
        Self {
            generated_at: Local::now().to_rfc3339(),
            catalog_file: catalog_file.to_string(),
            views_file: views_file.to_string(),
            portal: view.portal.label().to_string(),
            summary: result.summary.clone(),
            segments: result
                .brands
                .iter()
                .filter_map(|brand| result.segments.get(brand).cloned())
                .collect(),
            key_metrics: view.metrics.clone(),
            time_of_day: view.time_of_day.clone(),
            articles: view.displayed().iter().map(|r| (*r).clone()).collect(),
            export_file,
            duration_ms: result.duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MergedArticle, TimeOfDay};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn article(brand: &str, id: &str, views: u64, bucket: Option<TimeOfDay>) -> EnrichedArticle {
        EnrichedArticle {
            article: MergedArticle {
                brand: brand.to_string(),
                document_id: Some(id.to_string()),
                title: Some(format!("Titel {id}")),
                source_id: None,
                canonical_url: None,
                published_url: None,
                status: None,
                edited_at: None,
                created_at: None,
                page_views: views,
                unique_users: 0,
                likes: 0,
                comments: 0,
            },
            weekday: None,
            hour: None,
            time_of_day: bucket,
            engagement_rate: if views > 0 { 4.0 } else { 0.0 },
            unique_visitor_rate: 0.0,
        }
    }

    fn result() -> AnalysisResult {
        AnalysisResult {
            articles: vec![
                article("HNA", "1", 300, Some(TimeOfDay::Morning)),
                article("Frankfurter Rundschau", "2", 200, Some(TimeOfDay::Evening)),
                article("HNA", "3", 100, Some(TimeOfDay::Morning)),
                article("HNA", "4", 0, None),
            ],
            summary: Summary::default(),
            segments: BTreeMap::new(),
            brands: vec!["HNA".to_string(), "Frankfurter Rundschau".to_string()],
            duration_ms: 0,
        }
    }

    #[test]
    fn test_portal_filter_labels() {
        assert_eq!(PortalFilter::from_label("Alle"), PortalFilter::All);
        assert_eq!(
            PortalFilter::from_label("HNA"),
            PortalFilter::Portal("HNA".to_string())
        );
        assert_eq!(PortalFilter::All.to_string(), "Alle");
    }

    #[test]
    fn test_view_filters_portal() {
        let result = result();
        let view = ReportView::new(
            &result,
            PortalFilter::Portal("HNA".into()),
            DisplayLimit::All,
        );

        let ids: Vec<_> = view
            .rows
            .iter()
            .map(|r| r.article.document_id.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
        assert_eq!(view.metrics.total_views, 400);
        assert!((view.metrics.mean_views - 400.0 / 3.0).abs() < 1e-9);
        assert_eq!(view.time_of_day.len(), 1);
        assert_eq!(view.time_of_day[0].mean_views, 200.0);
    }

    #[test]
    fn test_display_limit() {
        let result = result();
        let view = ReportView::new(&result, PortalFilter::All, DisplayLimit::Top5);
        assert_eq!(view.displayed().len(), 4);

        let mut many = result.clone();
        many.articles = (0..12)
            .map(|i| article("HNA", &i.to_string(), 100 - i, None))
            .collect();
        let view = ReportView::new(&many, PortalFilter::All, DisplayLimit::Top10);
        assert_eq!(view.rows.len(), 12);
        assert_eq!(view.displayed().len(), 10);
        assert_eq!(view.displayed()[0].article.page_views, 100);
    }

    #[test]
    fn test_unknown_portal_is_empty() {
        let result = result();
        let view = ReportView::new(
            &result,
            PortalFilter::Portal("Merkur".into()),
            DisplayLimit::Top10,
        );
        assert!(view.rows.is_empty());
        assert_eq!(view.metrics, KeyMetrics::default());
    }

    #[test]
    fn test_portal_options() {
        assert_eq!(
            portal_options(&result()),
            vec!["Alle", "HNA", "Frankfurter Rundschau"]
        );
    }

    #[test]
    fn test_to_dataframe_columns() {
        let result = result();
        let rows: Vec<_> = result.articles.iter().collect();
        let df = to_dataframe(&rows).unwrap();

        assert_eq!(df.height(), 4);
        assert_eq!(df.width(), 18);
        let views = df.column(schema::PAGE_VIEWS).unwrap();
        assert_eq!(views.as_materialized_series().u64().unwrap().get(0), Some(300));
        let bucket = df.column(schema::TIME_OF_DAY).unwrap();
        assert_eq!(bucket.as_materialized_series().str().unwrap().get(3), None);
    }
}
