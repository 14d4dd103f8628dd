//! Metrics engine.
//!
//! Derives time and rate metrics for merged articles and aggregates them
//! into summary, per-brand and per-time-of-day statistics.

pub mod stats;
pub mod time;

pub use stats::{dominant_time_of_day, segment_stats, summarize, summary, time_of_day_breakdown};
pub use time::{DEFAULT_TIMESTAMP_FORMAT, parse_timestamp, weekday_name};

use crate::types::{EnrichedArticle, MergedArticle};
use tracing::{info, warn};

/// `numerator / denominator * 100`, or 0 when there is no denominator.
pub fn rate(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64 * 100.0
}

/// Add time and rate metrics to one article.
pub fn enrich_article(article: MergedArticle, timestamp_format: &str) -> EnrichedArticle {
    let fields = time::time_fields(article.created_at.as_deref(), timestamp_format);
    let engagement_rate = rate(article.likes + article.comments, article.page_views);
    let unique_visitor_rate = rate(article.unique_users, article.page_views);

    EnrichedArticle {
        weekday: fields.map(|f| weekday_name(f.weekday).to_string()),
        hour: fields.map(|f| f.hour),
        time_of_day: fields.map(|f| f.time_of_day),
        engagement_rate,
        unique_visitor_rate,
        article,
    }
}

/// Enrich all merged articles and sort them by page views, descending.
///
/// The sort is stable, so equal view counts keep their merge order.
/// Rows whose creation timestamp does not parse keep null time fields.
pub fn enrich(merged: Vec<MergedArticle>, timestamp_format: &str) -> Vec<EnrichedArticle> {
    let mut rows: Vec<EnrichedArticle> = merged
        .into_iter()
        .map(|article| enrich_article(article, timestamp_format))
        .collect();

    let unparsed = rows.iter().filter(|r| r.time_of_day.is_none()).count();
    if unparsed > 0 {
        warn!(
            "{} of {} articles have no parsable creation timestamp (expected format '{}')",
            unparsed,
            rows.len(),
            timestamp_format
        );
    }

    rows.sort_by(|a, b| b.article.page_views.cmp(&a.article.page_views));

    info!("Enriched {} articles", rows.len());
    rows
}
