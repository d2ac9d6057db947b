//! Wire shapes of Airtable record payloads

use serde::{Deserialize, Serialize};

/// One stored record: `{ id, createdTime, fields }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<F> {
    /// Server-assigned record id (`rec...`)
    pub id: String,
    /// ISO-8601 creation timestamp
    pub created_time: String,
    /// Table-specific fields
    pub fields: F,
}

/// A page of records as returned by list, create and update
#[derive(Debug, Deserialize)]
pub(crate) struct RecordPage<F> {
    pub records: Vec<Record<F>>,
    /// Present when more pages follow
    #[serde(default)]
    pub offset: Option<String>,
}

/// Body of a create or update request: `{ records: [{ id?, fields }] }`
#[derive(Debug, Serialize)]
pub(crate) struct WriteRequest<'a, F> {
    pub records: [WriteRecord<'a, F>; 1],
}

#[derive(Debug, Serialize)]
pub(crate) struct WriteRecord<'a, F> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    pub fields: &'a F,
}

impl<'a, F> WriteRequest<'a, F> {
    pub(crate) const fn new(id: Option<&'a str>, fields: &'a F) -> Self {
        Self {
            records: [WriteRecord { id, fields }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize)]
    struct Title {
        title: &'static str,
    }

    #[test]
    fn create_body_omits_id() {
        let fields = Title { title: "Feed cat" };
        let body = serde_json::to_value(WriteRequest::new(None, &fields)).ok();
        assert_eq!(body, Some(json!({ "records": [{ "fields": { "title": "Feed cat" } }] })));
    }

    #[test]
    fn update_body_carries_id() {
        let fields = Title { title: "Feed dog" };
        let body = serde_json::to_value(WriteRequest::new(Some("rec1"), &fields)).ok();
        assert_eq!(
            body,
            Some(json!({ "records": [{ "id": "rec1", "fields": { "title": "Feed dog" } }] }))
        );
    }

    #[test]
    fn page_offset_is_optional() {
        let page: Option<RecordPage<serde_json::Value>> =
            serde_json::from_value(json!({ "records": [] })).ok();
        assert!(page.is_some_and(|p| p.offset.is_none() && p.records.is_empty()));
    }
}
