//! State transitions of the todos feature.
//!
//! The reducer is a pure state machine: it never talks to the network.
//! Requests, the query cache and completion timers belong
//! to [`TodosController`](crate::TodosController), which feeds outcomes back in
//! as actions.

use crate::action::{RequestKind, TodoAction};
use crate::model::Todo;
use crate::state::TodosState;
use chrono::SecondsFormat;
use std::sync::Arc;
use tabletodo_core::{
    environment::{Clock, SystemClock},
    reducer::Reducer,
};

/// Environment dependencies for the todos reducer
#[derive(Clone)]
pub struct TodosEnvironment {
    /// Clock stamping optimistic placeholders
    pub clock: Arc<dyn Clock>,
}

impl TodosEnvironment {
    /// Creates a new `TodosEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Default for TodosEnvironment {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for TodosEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodosEnvironment").finish_non_exhaustive()
    }
}

/// Reducer for the todos feature
#[derive(Clone, Copy, Debug, Default)]
pub struct TodosReducer;

impl TodosReducer {
    /// Creates a new `TodosReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn in_flight(state: &mut TodosState, kind: RequestKind) -> &mut u32 {
        match kind {
            RequestKind::Loading => &mut state.loads_in_flight,
            RequestKind::Saving => &mut state.saves_in_flight,
        }
    }

    /// Derive the request flags from the in-flight counts
    fn sync_flags(state: &mut TodosState) {
        state.is_loading = state.loads_in_flight > 0;
        state.is_saving = state.saves_in_flight > 0;
    }
}

impl Reducer for TodosReducer {
    type State = TodosState;
    type Action = TodoAction;
    type Environment = TodosEnvironment;

    fn reduce(&self, state: &mut Self::State, action: Self::Action, env: &Self::Environment) {
        match action {
            // ========== Fetch lifecycle ==========
            TodoAction::FetchTodos => {
                state.is_loading = true;
            },
            TodoAction::ServeCachedTodos { todos } => {
                state.todo_list = todos;
                state.shown_key = Some(state.query_key());
                Self::sync_flags(state);
            },
            TodoAction::LoadTodos { records } if state.saves_in_flight == 0 => {
                state.todo_list = records.iter().map(Todo::from_record).collect();
                state.shown_key = Some(state.query_key());
                Self::sync_flags(state);
            },
            TodoAction::LoadTodos { records } | TodoAction::MergeTodos { records } => {
                state.merge_fetched(records.iter().map(Todo::from_record).collect());
                Self::sync_flags(state);
            },
            TodoAction::SetLoadError { message } => {
                state.error_message = message;
                Self::sync_flags(state);
            },
            TodoAction::SetError { message } => {
                state.error_message = message;
            },

            // ========== Mutations ==========
            TodoAction::AddOptimisticTodo { title, client_id } => {
                let created_time = env.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true);
                state
                    .todo_list
                    .push(Todo::placeholder(title, client_id, created_time));
            },
            TodoAction::AddTodo { client_id, record } => {
                let placeholder = state.todo_list.iter_mut().find(|todo| {
                    todo.is_still_saving && todo.client_id.as_deref() == Some(client_id.as_str())
                });

                match placeholder {
                    Some(slot) => *slot = Todo::from_record(&record),
                    None => tracing::debug!(%client_id, "No placeholder left to confirm"),
                }
            },
            TodoAction::RemoveOptimisticTodo { client_id } => {
                state.todo_list.retain(|todo| {
                    !(todo.is_still_saving && todo.client_id.as_deref() == Some(client_id.as_str()))
                });
            },
            TodoAction::CompleteTodo { todo } | TodoAction::UpdateTodo { todo } => {
                if !state.replace(todo) {
                    tracing::debug!("Ignored change to a todo that is gone");
                }
            },
            TodoAction::FinalizeComplete { id } => {
                state.todo_list.retain(|todo| todo.id != id);
            },
            TodoAction::RevertTodo { todo, message } => {
                state.replace(todo);
                state.error_message = message;
            },

            // ========== Request state ==========
            TodoAction::StartRequest { kind } => {
                *Self::in_flight(state, kind) += 1;
                Self::sync_flags(state);
            },
            TodoAction::EndRequest { kind } => {
                let count = Self::in_flight(state, kind);
                *count = count.saturating_sub(1);
                Self::sync_flags(state);
            },

            // ========== Errors ==========
            TodoAction::ClearError => {
                state.error_message.clear();
            },

            // ========== View state ==========
            TodoAction::SetWorkingTodoTitle { title } => {
                state.working_todo_title = title;
            },
            TodoAction::SetSortField { field } => {
                state.sort_field = field;
            },
            TodoAction::SetSortDirection { direction } => {
                state.sort_direction = direction;
            },
            TodoAction::SetQueryString { query } => {
                state.query_string = query;
            },
            TodoAction::ClearQueryString => {
                state.query_string.clear();
            },
        }
    }
}
