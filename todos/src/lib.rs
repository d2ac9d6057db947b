//! # Tabletodo
//!
//! State core of a todo list persisted to Airtable.
//!
//! - [`TodosReducer`]: every legal transition of [`TodosState`]
//! - [`TodosController`]: optimistic mutations with rollback, a per-view
//!   result cache and delayed removal of completed todos
//! - [`TodoRemote`]: the persistence seam, implemented for
//!   [`AirtableClient`](tabletodo_airtable::AirtableClient)
//!
//! # Quick Start
//!
//! ```no_run
//! use tabletodo::TodosController;
//! use tabletodo_airtable::AirtableClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let controller = TodosController::with_airtable(AirtableClient::from_env()?);
//! controller.fetch_todos().await?;
//!
//! if let Err(error) = controller.add_todo("Buy milk").await {
//!     // The placeholder is gone and the message is already in state
//!     assert_eq!(controller.state().await.error_message, error.user_message());
//! }
//!
//! controller.set_query_string("milk").await?;
//! # Ok(())
//! # }
//! ```

pub mod action;
mod cache;
pub mod controller;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod model;
pub mod reducer;
pub mod remote;
pub mod state;

// Re-export commonly used types
pub use action::{RequestKind, TodoAction};
pub use controller::{ControllerConfig, DEFAULT_FINALIZE_DELAY, TodosController};
pub use error::{Operation, TodosError, messages, user_message};
pub use model::{QueryKey, SortField, Todo, TodoFields, TodoRecord};
pub use reducer::{TodosEnvironment, TodosReducer};
pub use remote::{ListTodos, NewTodo, TodoPatch, TodoRemote};
pub use state::TodosState;
pub use tabletodo_airtable::SortDirection;
