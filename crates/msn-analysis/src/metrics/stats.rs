//! Summary, segment and time-of-day statistics over enriched articles.

use crate::types::{EnrichedArticle, SegmentStats, Summary, TimeOfDay, TimeOfDayStats};
use std::collections::BTreeMap;

/// Arithmetic mean, 0 for an empty input.
pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Global summary and statistics for every allowed brand.
///
/// Brands without rows get an all-zero entry so each configured brand is
/// present in the map.
pub fn summarize(
    rows: &[EnrichedArticle],
    allowed_brands: &[String],
) -> (Summary, BTreeMap<String, SegmentStats>) {
    let all: Vec<&EnrichedArticle> = rows.iter().collect();
    let summary = summary(&all);

    let segments = allowed_brands
        .iter()
        .map(|brand| {
            let segment: Vec<&EnrichedArticle> = rows
                .iter()
                .filter(|row| row.article.brand == *brand)
                .collect();
            (brand.clone(), segment_stats(brand, &segment))
        })
        .collect();

    (summary, segments)
}

/// Totals and means over `rows`.
pub fn summary(rows: &[&EnrichedArticle]) -> Summary {
    Summary {
        article_count: rows.len(),
        articles_with_views: rows.iter().filter(|r| r.article.page_views > 0).count(),
        total_views: rows.iter().map(|r| r.article.page_views).sum(),
        mean_views: mean(rows.iter().map(|r| r.article.page_views as f64)),
        total_likes: rows.iter().map(|r| r.article.likes).sum(),
        total_comments: rows.iter().map(|r| r.article.comments).sum(),
        mean_engagement_rate: mean(rows.iter().map(|r| r.engagement_rate)),
    }
}

/// Statistics for one brand's rows.
pub fn segment_stats(brand: &str, rows: &[&EnrichedArticle]) -> SegmentStats {
    if rows.is_empty() {
        return SegmentStats::empty(brand);
    }

    SegmentStats {
        brand: brand.to_string(),
        article_count: rows.len(),
        total_views: rows.iter().map(|r| r.article.page_views).sum(),
        mean_views: mean(rows.iter().map(|r| r.article.page_views as f64)),
        dominant_time_of_day: dominant_time_of_day(rows),
        mean_engagement_rate: mean(rows.iter().map(|r| r.engagement_rate)),
    }
}

fn bucket_rows<'a>(
    rows: &[&'a EnrichedArticle],
    bucket: TimeOfDay,
) -> Vec<&'a EnrichedArticle> {
    rows.iter()
        .copied()
        .filter(|r| r.time_of_day == Some(bucket))
        .collect()
}

/// Bucket with the highest mean page views.
///
/// Rows without a bucket are ignored. On equal means the earlier bucket in
/// day order wins (Night, Morning, Midday, Evening).
pub fn dominant_time_of_day(rows: &[&EnrichedArticle]) -> Option<TimeOfDay> {
    let mut best: Option<(TimeOfDay, f64)> = None;

    for bucket in TimeOfDay::ALL {
        let in_bucket = bucket_rows(rows, bucket);
        if in_bucket.is_empty() {
            continue;
        }
        let mean_views = mean(in_bucket.iter().map(|r| r.article.page_views as f64));
        if best.is_none_or(|(_, top)| mean_views > top) {
            best = Some((bucket, mean_views));
        }
    }

    best.map(|(bucket, _)| bucket)
}

/// Per-bucket count, sum and means for buckets that have rows, in day order.
pub fn time_of_day_breakdown(rows: &[&EnrichedArticle]) -> Vec<TimeOfDayStats> {
    TimeOfDay::ALL
        .into_iter()
        .filter_map(|bucket| {
            let in_bucket = bucket_rows(rows, bucket);
            if in_bucket.is_empty() {
                return None;
            }
            Some(TimeOfDayStats {
                time_of_day: bucket,
                article_count: in_bucket.len(),
                total_views: in_bucket.iter().map(|r| r.article.page_views).sum(),
                mean_views: round2(mean(in_bucket.iter().map(|r| r.article.page_views as f64))),
                mean_engagement_rate: round2(mean(in_bucket.iter().map(|r| r.engagement_rate))),
            })
        })
        .collect()
}
