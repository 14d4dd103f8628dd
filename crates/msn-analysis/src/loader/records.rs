//! Conversion of validated frames into typed records.
//!
//! Document ids are cast to strings whatever dtype schema inference chose,
//! so ids from both exports compare on their textual form.

use crate::error::Result;
use crate::schema::{
    BRAND, CANONICAL_URL, COMMENTS, CONTENT_STATUS, CREATED_AT, DOCUMENT_ID, EDITED_AT, LIKES,
    PAGE_VIEWS, PUBLISHED_URL, SOURCE_ID, TITLE, UNIQUE_USERS,
};
use crate::types::{ContentRecord, ViewRecord};
use crate::utils::{count_values, optional_string_values, string_values};
use polars::prelude::*;

fn next_value(values: &mut std::vec::IntoIter<Option<String>>) -> Option<String> {
    values.next().flatten()
}

/// Read catalog rows. Optional descriptive columns that are absent become `None`.
pub fn content_records(df: &DataFrame) -> Result<Vec<ContentRecord>> {
    let mut brands = string_values(df, BRAND)?.into_iter();
    let mut ids = string_values(df, DOCUMENT_ID)?.into_iter();
    let mut titles = optional_string_values(df, TITLE)?.into_iter();
    let mut source_ids = optional_string_values(df, SOURCE_ID)?.into_iter();
    let mut canonical_urls = optional_string_values(df, CANONICAL_URL)?.into_iter();
    let mut published_urls = optional_string_values(df, PUBLISHED_URL)?.into_iter();
    let mut statuses = optional_string_values(df, CONTENT_STATUS)?.into_iter();
    let mut edited = optional_string_values(df, EDITED_AT)?.into_iter();
    let mut created = optional_string_values(df, CREATED_AT)?.into_iter();

    let mut records = Vec::with_capacity(df.height());
    for _ in 0..df.height() {
        records.push(ContentRecord {
            brand: next_value(&mut brands).unwrap_or_default(),
            document_id: next_value(&mut ids),
            title: next_value(&mut titles),
            source_id: next_value(&mut source_ids),
            canonical_url: next_value(&mut canonical_urls),
            published_url: next_value(&mut published_urls),
            status: next_value(&mut statuses),
            edited_at: next_value(&mut edited),
            created_at: next_value(&mut created),
        });
    }

    Ok(records)
}

/// Read page-view rows. Unparsable or missing counts are read as 0.
pub fn view_records(df: &DataFrame) -> Result<Vec<ViewRecord>> {
    let ids = string_values(df, DOCUMENT_ID)?;
    let titles = optional_string_values(df, TITLE)?;
    let page_views = count_values(df, PAGE_VIEWS)?;
    let unique_users = count_values(df, UNIQUE_USERS)?;
    let likes = count_values(df, LIKES)?;
    let comments = count_values(df, COMMENTS)?;

    let records = ids
        .into_iter()
        .zip(titles)
        .enumerate()
        .map(|(i, (document_id, title))| ViewRecord {
            document_id,
            title,
            page_views: page_views[i],
            unique_users: unique_users[i],
            likes: likes[i],
            comments: comments[i],
        })
        .collect();

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_records_with_optional_columns_missing() {
        let df = df!(
            BRAND => ["HNA", "Merkur"],
            DOCUMENT_ID => [101i64, 102],
            TITLE => ["A", "B"]
        )
        .unwrap();

        let records = content_records(&df).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].brand, "HNA");
        assert_eq!(records[0].document_id.as_deref(), Some("101"));
        assert_eq!(records[1].source_id, None);
        assert_eq!(records[1].created_at, None);
    }

    #[test]
    fn test_view_records_parse_counts() {
        let df = df!(
            DOCUMENT_ID => [Some("a"), None],
            PAGE_VIEWS => ["1.200", "7"],
            UNIQUE_USERS => [Some(900i64), None],
            LIKES => [3i64, 0],
            COMMENTS => [1i64, 2]
        )
        .unwrap();

        let records = view_records(&df).unwrap();
        assert_eq!(records[0].document_id.as_deref(), Some("a"));
        assert_eq!(records[0].page_views, 1200);
        assert_eq!(records[0].unique_users, 900);
        assert_eq!(records[0].title, None);
        assert_eq!(records[1].document_id, None);
        assert_eq!(records[1].unique_users, 0);
        assert_eq!(records[1].comments, 2);
    }
}
