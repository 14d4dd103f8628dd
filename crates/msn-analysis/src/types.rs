use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One row of the content catalog export.
///
/// Text fields are kept as exported; blank cells become `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Portal the article was republished from.
    pub brand: String,
    /// Opaque join key, compared as text.
    pub document_id: Option<String>,
    pub title: Option<String>,
    pub source_id: Option<String>,
    pub canonical_url: Option<String>,
    pub published_url: Option<String>,
    pub status: Option<String>,
    pub edited_at: Option<String>,
    /// Creation timestamp in the export's `dd.mm.yyyy, HH:MM:SS` form.
    pub created_at: Option<String>,
}

/// One row of the page-view export.
///
/// Several rows may share a document id. Unparsable counts are 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub document_id: Option<String>,
    pub title: Option<String>,
    pub page_views: u64,
    pub unique_users: u64,
    pub likes: u64,
    pub comments: u64,
}

/// Page-view counts summed over every export row of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedView {
    pub document_id: String,
    /// Title of the first row seen for this document.
    pub title: Option<String>,
    pub page_views: u64,
    pub unique_users: u64,
    pub likes: u64,
    pub comments: u64,
}

/// A catalog row joined with its aggregated page views.
///
/// Counts are zero when the page-view export has no row for the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedArticle {
    pub brand: String,
    pub document_id: Option<String>,
    pub title: Option<String>,
    pub source_id: Option<String>,
    pub canonical_url: Option<String>,
    pub published_url: Option<String>,
    pub status: Option<String>,
    pub edited_at: Option<String>,
    pub created_at: Option<String>,
    pub page_views: u64,
    pub unique_users: u64,
    pub likes: u64,
    pub comments: u64,
}

// ============================================================================
// Time of Day
// ============================================================================

/// Fixed hour ranges used to group articles by publication time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeOfDay {
    /// 00:00 - 05:59
    Night,
    /// 06:00 - 11:59
    Morning,
    /// 12:00 - 17:59
    Midday,
    /// 18:00 - 23:59
    Evening,
}

impl TimeOfDay {
    /// All buckets in day order.
    pub const ALL: [TimeOfDay; 4] = [Self::Night, Self::Morning, Self::Midday, Self::Evening];

    /// Bucket containing `hour` (0-23). Hours past 23 fall into the evening bucket.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => Self::Night,
            6..=11 => Self::Morning,
            12..=17 => Self::Midday,
            _ => Self::Evening,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Night => "Night",
            Self::Morning => "Morning",
            Self::Midday => "Midday",
            Self::Evening => "Evening",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Enriched Rows and Statistics
// ============================================================================

/// A merged article with its derived time and rate metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedArticle {
    #[serde(flatten)]
    pub article: MergedArticle,
    /// English weekday name of the creation timestamp.
    pub weekday: Option<String>,
    pub hour: Option<u32>,
    pub time_of_day: Option<TimeOfDay>,
    /// (likes + comments) / page views * 100, zero without views.
    pub engagement_rate: f64,
    /// unique users / page views * 100, zero without views.
    pub unique_visitor_rate: f64,
}

/// Global totals over all analysed articles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub article_count: usize,
    pub articles_with_views: usize,
    pub total_views: u64,
    pub mean_views: f64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub mean_engagement_rate: f64,
}

/// Statistics for one brand (portal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentStats {
    pub brand: String,
    pub article_count: usize,
    pub total_views: u64,
    pub mean_views: f64,
    /// Bucket with the highest mean page views, `None` when there is no data.
    pub dominant_time_of_day: Option<TimeOfDay>,
    pub mean_engagement_rate: f64,
}

impl SegmentStats {
    /// All-zero statistics for a brand without articles.
    pub fn empty(brand: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            article_count: 0,
            total_views: 0,
            mean_views: 0.0,
            dominant_time_of_day: None,
            mean_engagement_rate: 0.0,
        }
    }

    /// Display label of the dominant bucket.
    pub fn dominant_label(&self) -> &'static str {
        self.dominant_time_of_day
            .as_ref()
            .map_or("no data", TimeOfDay::label)
    }
}

/// Aggregates for one time-of-day bucket, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeOfDayStats {
    pub time_of_day: TimeOfDay,
    pub article_count: usize,
    pub total_views: u64,
    pub mean_views: f64,
    pub mean_engagement_rate: f64,
}

/// Output of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Enriched articles sorted by page views, descending.
    pub articles: Vec<EnrichedArticle>,
    pub summary: Summary,
    /// Statistics for every configured brand, including brands without rows.
    pub segments: BTreeMap<String, SegmentStats>,
    /// Configured brands in configuration order.
    pub brands: Vec<String>,
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_of_day_boundaries() {
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(6), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Midday);
        assert_eq!(TimeOfDay::from_hour(18), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Evening);
    }

    #[test]
    fn test_empty_segment_stats() {
        let stats = SegmentStats::empty("HNA");
        assert_eq!(stats.article_count, 0);
        assert_eq!(stats.total_views, 0);
        assert_eq!(stats.dominant_label(), "no data");
    }

    #[test]
    fn test_enriched_article_serializes_flat() {
        let article = EnrichedArticle {
            article: MergedArticle {
                brand: "HNA".into(),
                document_id: Some("1".into()),
                title: Some("X".into()),
                source_id: None,
                canonical_url: None,
                published_url: None,
                status: None,
                edited_at: None,
                created_at: None,
                page_views: 10,
                unique_users: 5,
                likes: 1,
                comments: 0,
            },
            weekday: None,
            hour: None,
            time_of_day: Some(TimeOfDay::Morning),
            engagement_rate: 10.0,
            unique_visitor_rate: 50.0,
        };
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["brand"], "HNA");
        assert_eq!(json["page_views"], 10);
        assert_eq!(json["time_of_day"], "Morning");
    }
}
