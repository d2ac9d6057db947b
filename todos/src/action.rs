//! Every input that changes [`TodosState`](crate::TodosState)

use crate::model::{SortField, Todo, TodoRecord};
use tabletodo_airtable::SortDirection;

/// Which request flag a request toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// List fetch, drives `is_loading`
    Loading,
    /// Create or update, drives `is_saving`
    Saving,
}

/// Actions reduced by [`TodosReducer`](crate::TodosReducer)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoAction {
    // Fetch lifecycle
    /// A list fetch started
    FetchTodos,
    /// Show a list previously fetched for the current view
    ServeCachedTodos {
        /// Normalized todos
        todos: Vec<Todo>,
    },
    /// A list fetch succeeded
    LoadTodos {
        /// Raw records, normalized on reduction
        records: Vec<TodoRecord>,
    },
    /// A list fetch succeeded while local changes were pending
    MergeTodos {
        /// Raw records, normalized on reduction
        records: Vec<TodoRecord>,
    },
    /// A list fetch failed
    SetLoadError {
        /// User-facing message
        message: String,
    },
    /// Surface an error without touching the loading flag
    SetError {
        /// User-facing message
        message: String,
    },

    // Mutations
    /// Append a placeholder for a pending create
    AddOptimisticTodo {
        /// Title typed by the user
        title: String,
        /// Client id of the create
        client_id: String,
    },
    /// A create succeeded
    AddTodo {
        /// Client id of the placeholder to replace
        client_id: String,
        /// Stored record
        record: TodoRecord,
    },
    /// A create failed
    RemoveOptimisticTodo {
        /// Client id of the placeholder to drop
        client_id: String,
    },
    /// Optimistic completion toggle
    CompleteTodo {
        /// Toggled copy
        todo: Todo,
    },
    /// Drop a completed todo once its undo window elapsed
    FinalizeComplete {
        /// Todo id
        id: String,
    },
    /// Optimistic edit
    UpdateTodo {
        /// Edited copy
        todo: Todo,
    },
    /// Restore a todo after a failed mutation
    RevertTodo {
        /// Pre-mutation copy
        todo: Todo,
        /// User-facing message
        message: String,
    },

    // Request state
    /// A request started
    StartRequest {
        /// Flag to set
        kind: RequestKind,
    },
    /// A request finished
    EndRequest {
        /// Flag to clear
        kind: RequestKind,
    },

    // Errors
    /// Dismiss the current error
    ClearError,

    // View state
    /// The "add" input changed
    SetWorkingTodoTitle {
        /// New value
        title: String,
    },
    /// Sort by another field
    SetSortField {
        /// New field
        field: SortField,
    },
    /// Sort the other way
    SetSortDirection {
        /// New direction
        direction: SortDirection,
    },
    /// Search text changed
    SetQueryString {
        /// New search text
        query: String,
    },
    /// Search text cleared
    ClearQueryString,
}
