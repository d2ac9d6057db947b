//! Error types and user-facing messages

use tabletodo_airtable::AirtableError;
use tabletodo_runtime::StoreError;
use thiserror::Error;

/// User-facing error messages
pub mod messages {
    /// No response from the remote
    pub const NETWORK: &str = "Unable to connect to database. Please check your internet connection.";
    /// The remote answered 5xx
    pub const SERVER: &str = "Server error. Please try again later.";
    /// A create failed
    pub const ADD: &str = "We couldn't save your todo. Please try again.";
    /// A title update failed and was rolled back
    pub const UPDATE: &str = "We couldn't update that todo. We've restored it to how it was.";
    /// A completion toggle failed and was rolled back
    pub const COMPLETE: &str = "Couldn't mark that as complete. Please try again.";
    /// A list fetch failed
    pub const FETCH: &str = "We're having trouble loading your todos. Please refresh the page.";
    /// Anything else
    pub const FALLBACK: &str = "Something went wrong. Please try again.";
    /// The todo being changed is gone from the list
    pub const UNAVAILABLE: &str = "That todo is no longer available. Please refresh.";
}

/// Remote operation attempted by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// List fetch
    Fetch,
    /// Create
    Add,
    /// Title update
    Update,
    /// Completion toggle
    Complete,
}

impl Operation {
    /// Message shown when this operation fails for a non-transport reason
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Fetch => messages::FETCH,
            Self::Add => messages::ADD,
            Self::Update => messages::UPDATE,
            Self::Complete => messages::COMPLETE,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Fetch => "fetch",
            Self::Add => "add",
            Self::Update => "update",
            Self::Complete => "complete",
        })
    }
}

/// Pick the message for a failed remote call
///
/// Connectivity and server failures read the same for every operation;
/// anything else gets the operation's own message.
#[must_use]
pub const fn user_message(operation: Option<Operation>, error: &AirtableError) -> &'static str {
    if error.is_network() {
        return messages::NETWORK;
    }
    if error.is_server() {
        return messages::SERVER;
    }
    match operation {
        Some(operation) => operation.failure_message(),
        None => messages::FALLBACK,
    }
}

/// Errors returned by [`TodosController`](crate::TodosController) operations
///
/// The matching message has already been written to `error_message` when an
/// operation returns one of these, except for [`TodosError::StillSaving`] and
/// [`TodosError::Store`].
#[derive(Debug, Error)]
pub enum TodosError {
    /// A remote call failed; state was rolled back
    #[error("Failed to {operation} todo: {source}")]
    Remote {
        /// Operation that failed
        operation: Operation,
        /// Underlying client error
        #[source]
        source: AirtableError,
    },

    /// The todo is no longer in the list
    #[error("Todo {id} is no longer available")]
    TodoUnavailable {
        /// Requested id
        id: String,
    },

    /// The todo has not been confirmed by the server yet
    #[error("Todo {id} is still being saved")]
    StillSaving {
        /// Placeholder id
        id: String,
    },

    /// The store was shut down
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TodosError {
    /// The message shown for this error
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Remote { operation, source } => user_message(Some(*operation), source),
            Self::TodoUnavailable { .. } => messages::UNAVAILABLE,
            Self::StillSaving { .. } | Self::Store(_) => messages::FALLBACK,
        }
    }
}
