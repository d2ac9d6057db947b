//! Remote persistence of todos
//!
//! [`TodoRemote`] is the seam between the controller and the network. The
//! production implementation is [`AirtableClient`]; tests use
//! [`MockRemote`](crate::mock::MockRemote).

use crate::model::{QueryKey, SortField, TodoRecord};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use tabletodo_airtable::{AirtableClient, AirtableError, ListQuery, SortDirection, string_literal};

/// Formula selecting incomplete todos
pub const INCOMPLETE_FORMULA: &str = "{isCompleted}=FALSE()";

/// Future returned by [`TodoRemote`] operations
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AirtableError>> + Send + 'a>>;

/// Parameters of a list request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTodos {
    /// Server-side sort field
    pub sort_field: SortField,
    /// Server-side sort direction
    pub sort_direction: SortDirection,
    /// Title search text, empty for none
    pub filter_text: String,
}

impl ListTodos {
    /// Airtable formula for this request
    ///
    /// Completed todos are never listed. Search text is embedded as a quoted
    /// string literal so it cannot end the expression early.
    #[must_use]
    pub fn formula(&self) -> String {
        if self.filter_text.is_empty() {
            INCOMPLETE_FORMULA.to_string()
        } else {
            format!(
                "AND({INCOMPLETE_FORMULA}, SEARCH({},{{title}}))",
                string_literal(&self.filter_text)
            )
        }
    }

    /// The Airtable list query
    #[must_use]
    pub fn to_query(&self) -> ListQuery {
        ListQuery::default()
            .sorted_by(self.sort_field.as_str(), self.sort_direction)
            .filtered_by(self.formula())
    }
}

impl From<&QueryKey> for ListTodos {
    fn from(key: &QueryKey) -> Self {
        Self {
            sort_field: key.sort_field,
            sort_direction: key.sort_direction,
            filter_text: key.query_string.clone(),
        }
    }
}

/// Fields of a create request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTodo {
    /// Todo text
    pub title: String,
}

/// Fields of an update request; only present fields are sent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    /// New title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New completion flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl TodoPatch {
    /// Change the title only
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            is_completed: None,
        }
    }

    /// Set the completion flag, resending the title alongside it
    #[must_use]
    pub fn completion(title: impl Into<String>, is_completed: bool) -> Self {
        Self {
            title: Some(title.into()),
            is_completed: Some(is_completed),
        }
    }
}

/// Remote todo storage
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so the controller can hold an
/// `Arc<dyn TodoRemote>`.
pub trait TodoRemote: Send + Sync {
    /// List incomplete todos, sorted and filtered
    fn list(&self, query: ListTodos) -> RemoteFuture<'_, Vec<TodoRecord>>;

    /// Create one todo
    fn create(&self, todo: NewTodo) -> RemoteFuture<'_, TodoRecord>;

    /// Update one todo by id
    fn update(&self, id: String, patch: TodoPatch) -> RemoteFuture<'_, TodoRecord>;
}

impl TodoRemote for AirtableClient {
    fn list(&self, query: ListTodos) -> RemoteFuture<'_, Vec<TodoRecord>> {
        Box::pin(async move { Self::list(self, &query.to_query()).await })
    }

    fn create(&self, todo: NewTodo) -> RemoteFuture<'_, TodoRecord> {
        Box::pin(async move { Self::create(self, &todo).await })
    }

    fn update(&self, id: String, patch: TodoPatch) -> RemoteFuture<'_, TodoRecord> {
        Box::pin(async move { Self::update(self, &id, &patch).await })
    }
}
