//! Reconciliation of the catalog with the page-view export.
//!
//! Page views are summed per document id before the join, since the view
//! export may contain several time slices for the same document. The join is
//! a left join: every allowed catalog row is kept exactly once.

use crate::error::{AnalysisError, Result};
use crate::loader::{content_records, view_records};
use crate::schema::CREATED_AT;
use crate::types::{AggregatedView, ContentRecord, MergedArticle, ViewRecord};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

/// Merge a catalog frame with a page-view frame.
///
/// # Errors
///
/// Returns [`AnalysisError::MissingTimestampColumn`] when the catalog has no
/// creation timestamp column, which the time analysis needs.
pub fn merge(
    catalog: &DataFrame,
    views: &DataFrame,
    allowed_brands: &[String],
) -> Result<Vec<MergedArticle>> {
    if catalog.column(CREATED_AT).is_err() {
        return Err(AnalysisError::MissingTimestampColumn(CREATED_AT.to_string()));
    }

    let catalog_records = content_records(catalog)?;
    let view_rows = view_records(views)?;

    Ok(merge_records(catalog_records, &view_rows, allowed_brands))
}

/// Sum page-view rows per document id.
///
/// Groups appear in order of their first row; rows without a document id
/// are skipped.
pub fn aggregate_views(views: &[ViewRecord]) -> Vec<AggregatedView> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut aggregated: Vec<AggregatedView> = Vec::new();
    let mut skipped = 0usize;

    for row in views {
        let Some(id) = row.document_id.as_deref() else {
            skipped += 1;
            continue;
        };

        match index.get(id) {
            Some(&i) => {
                let group = &mut aggregated[i];
                group.page_views += row.page_views;
                group.unique_users += row.unique_users;
                group.likes += row.likes;
                group.comments += row.comments;
            }
            None => {
                index.insert(id, aggregated.len());
                aggregated.push(AggregatedView {
                    document_id: id.to_string(),
                    title: row.title.clone(),
                    page_views: row.page_views,
                    unique_users: row.unique_users,
                    likes: row.likes,
                    comments: row.comments,
                });
            }
        }
    }

    if skipped > 0 {
        debug!("Skipped {} page-view rows without document id", skipped);
    }

    aggregated
}

/// Filter catalog records to `allowed_brands` and left-join the aggregated views.
pub fn merge_records(
    catalog: Vec<ContentRecord>,
    views: &[ViewRecord],
    allowed_brands: &[String],
) -> Vec<MergedArticle> {
    let total_catalog = catalog.len();
    let aggregated = aggregate_views(views);
    let by_id: HashMap<&str, &AggregatedView> = aggregated
        .iter()
        .map(|view| (view.document_id.as_str(), view))
        .collect();

    let mut matched = 0usize;
    let merged: Vec<MergedArticle> = catalog
        .into_iter()
        .filter(|record| allowed_brands.iter().any(|brand| *brand == record.brand))
        .map(|record| {
            let view = record
                .document_id
                .as_deref()
                .and_then(|id| by_id.get(id).copied());
            if view.is_some() {
                matched += 1;
            }
            joined(record, view)
        })
        .collect();

    info!(
        "Merged {} of {} catalog rows ({} with page views, {} view documents)",
        merged.len(),
        total_catalog,
        matched,
        aggregated.len()
    );

    merged
}

fn joined(record: ContentRecord, view: Option<&AggregatedView>) -> MergedArticle {
    MergedArticle {
        brand: record.brand,
        document_id: record.document_id,
        title: record.title,
        source_id: record.source_id,
        canonical_url: record.canonical_url,
        published_url: record.published_url,
        status: record.status,
        edited_at: record.edited_at,
        created_at: record.created_at,
        page_views: view.map_or(0, |v| v.page_views),
        unique_users: view.map_or(0, |v| v.unique_users),
        likes: view.map_or(0, |v| v.likes),
        comments: view.map_or(0, |v| v.comments),
    }
}
