//! Todo entity, its wire shape and the view parameters that key the cache

use serde::{Deserialize, Serialize};
use tabletodo_airtable::{Record, SortDirection};

/// Fields of a stored todo record: `{ title?, isCompleted? }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoFields {
    /// Todo text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Airtable omits unchecked checkboxes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

/// A todo as returned by the remote table
pub type TodoRecord = Record<TodoFields>;

/// A todo as held in state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Server id, or the client id while the create is in flight
    pub id: String,
    /// Only set on optimistic creations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Todo text
    pub title: String,
    /// Completion flag
    pub is_completed: bool,
    /// ISO-8601 creation timestamp
    pub created_time: String,
    /// True until the server confirms an optimistic creation
    pub is_still_saving: bool,
}

impl Todo {
    /// Normalize a remote record
    ///
    /// A missing title becomes empty and a missing completion flag becomes
    /// `false`. Every entry point into state goes through here.
    #[must_use]
    pub fn from_record(record: &TodoRecord) -> Self {
        Self {
            id: record.id.clone(),
            client_id: None,
            title: record.fields.title.clone().unwrap_or_default(),
            is_completed: record.fields.is_completed.unwrap_or(false),
            created_time: record.created_time.clone(),
            is_still_saving: false,
        }
    }

    /// An unconfirmed todo standing in for a pending create
    #[must_use]
    pub fn placeholder(
        title: impl Into<String>,
        client_id: impl Into<String>,
        created_time: impl Into<String>,
    ) -> Self {
        let client_id = client_id.into();
        Self {
            id: client_id.clone(),
            client_id: Some(client_id),
            title: title.into(),
            is_completed: false,
            created_time: created_time.into(),
            is_still_saving: true,
        }
    }

    /// Copy with the completion flag flipped
    #[must_use]
    pub fn toggled(&self) -> Self {
        Self {
            is_completed: !self.is_completed,
            ..self.clone()
        }
    }
}

/// Field the list is sorted by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    /// Record creation time
    #[default]
    #[serde(rename = "createdTime")]
    CreatedTime,
    /// Todo title
    #[serde(rename = "title")]
    Title,
}

impl SortField {
    /// Airtable field name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedTime => "createdTime",
            Self::Title => "title",
        }
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The view parameters a fetched list depends on
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryKey {
    /// Sort field
    pub sort_field: SortField,
    /// Sort direction
    pub sort_direction: SortDirection,
    /// Search text, empty for none
    pub query_string: String,
}
