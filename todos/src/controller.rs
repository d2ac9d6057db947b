//! Orchestration of remote calls around the todos store.
//!
//! [`TodosController`] is what a UI layer calls into. Each mutation is applied
//! to the store optimistically, sent to the remote, then reconciled or rolled
//! back. The controller alone owns the query cache and the completion timers.

use crate::action::{RequestKind, TodoAction};
use crate::cache::QueryCache;
use crate::error::{Operation, TodosError, messages, user_message};
use crate::model::{QueryKey, SortField, Todo};
use crate::reducer::{TodosEnvironment, TodosReducer};
use crate::remote::{ListTodos, NewTodo, RemoteFuture, TodoPatch, TodoRemote};
use crate::state::TodosState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tabletodo_airtable::{AirtableClient, AirtableError, SortDirection};
use tabletodo_runtime::{DelayedTasks, Store, Ticket};
use tokio::sync::broadcast;
use uuid::Uuid;

/// How long a completed todo stays visible before it is removed
pub const DEFAULT_FINALIZE_DELAY: Duration = Duration::from_millis(3500);

/// Store type driven by the controller
pub type TodosStore = Store<TodosState, TodoAction, TodosEnvironment, TodosReducer>;

/// Controller settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Undo window between a confirmed completion and removal from the list
    pub finalize_delay: Duration,
}

impl ControllerConfig {
    /// Set the undo window
    #[must_use]
    pub const fn with_finalize_delay(mut self, delay: Duration) -> Self {
        self.finalize_delay = delay;
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            finalize_delay: DEFAULT_FINALIZE_DELAY,
        }
    }
}

struct Inner {
    store: TodosStore,
    remote: Arc<dyn TodoRemote>,
    cache: Mutex<QueryCache>,
    timers: DelayedTasks<String>,
    /// Todos in an edit session, with whether they were completed when it began
    editing: Mutex<HashMap<String, bool>>,
    config: ControllerConfig,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.timers.cancel_all();
    }
}

/// Optimistic todo controller
///
/// Cloning is cheap; clones share the store, cache and timers. Timers are
/// aborted when the last clone is dropped or on [`shutdown`](Self::shutdown).
///
/// # Example
///
/// ```no_run
/// use tabletodo::TodosController;
/// use tabletodo_airtable::AirtableClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let controller = TodosController::with_airtable(AirtableClient::from_env()?);
///
/// controller.fetch_todos().await?;
/// controller.add_todo("Buy milk").await?;
///
/// for todo in controller.state().await.todo_list {
///     println!("{} {}", todo.id, todo.title);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TodosController {
    inner: Arc<Inner>,
}

impl TodosController {
    /// Create a controller with default settings
    #[must_use]
    pub fn new(remote: Arc<dyn TodoRemote>, environment: TodosEnvironment) -> Self {
        Self::with_config(remote, environment, ControllerConfig::default())
    }

    /// Create a controller with explicit settings
    #[must_use]
    pub fn with_config(
        remote: Arc<dyn TodoRemote>,
        environment: TodosEnvironment,
        config: ControllerConfig,
    ) -> Self {
        let store = Store::new(TodosState::default(), TodosReducer::new(), environment);

        Self {
            inner: Arc::new(Inner {
                store,
                remote,
                cache: Mutex::new(QueryCache::default()),
                timers: DelayedTasks::new(),
                editing: Mutex::new(HashMap::new()),
                config,
            }),
        }
    }

    /// Create a controller persisting to Airtable, using the system clock
    #[must_use]
    pub fn with_airtable(client: AirtableClient) -> Self {
        Self::new(Arc::new(client), TodosEnvironment::default())
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> TodosState {
        self.inner.store.state(Clone::clone).await
    }

    /// Every action applied to the state, in order
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TodoAction> {
        self.inner.store.subscribe_actions()
    }

    /// Whether a finalize is pending for `id`
    #[must_use]
    pub fn finalize_pending(&self, id: &str) -> bool {
        self.inner.timers.is_pending(&id.to_string())
    }

    /// Abort every timer and stop applying actions
    ///
    /// Requests still in flight finish, but their outcomes are dropped and
    /// the operations awaiting them return [`TodosError::Store`].
    pub fn shutdown(&self) {
        self.inner.timers.cancel_all();
        self.inner.store.shutdown();
    }

    // ========== Fetching ==========

    /// Load the list for the current view
    ///
    /// Serves the cached list when the view was fetched before and nothing
    /// was mutated since; otherwise fetches and caches the result. A result
    /// arriving after the view changed is cached but not shown. A result that
    /// overlapped a mutation is neither cached nor allowed to overwrite it:
    /// it is merged into the list instead.
    ///
    /// # Errors
    ///
    /// Returns [`TodosError::Remote`] if the list request fails.
    #[tracing::instrument(skip(self), name = "todos_fetch")]
    pub async fn fetch_todos(&self) -> Result<(), TodosError> {
        let (key, saving) = self
            .inner
            .store
            .state(|state| (state.query_key(), state.saves_in_flight > 0))
            .await;
        let (cached, generation) = {
            let cache = self.cache();
            (cache.get(&key), cache.generation())
        };

        if let Some(todos) = cached {
            metrics::counter!("todos.cache.hits").increment(1);
            tracing::trace!(?key, "Serving cached todos");
            return self.dispatch(TodoAction::ServeCachedTodos { todos }).await;
        }

        metrics::counter!("todos.cache.misses").increment(1);
        self.dispatch(TodoAction::FetchTodos).await?;

        let outcome = self
            .request(RequestKind::Loading, self.inner.remote.list(ListTodos::from(&key)))
            .await?;

        match outcome {
            Ok(records) => {
                let settled = !saving && {
                    let todos = records.iter().map(Todo::from_record).collect();
                    self.cache().insert(key.clone(), todos, generation)
                };
                if !settled {
                    tracing::debug!(?key, "Mutation overlapped fetch, result not cached");
                }

                if self.query_key().await != key {
                    tracing::debug!(?key, "View changed during fetch, result not shown");
                    return Ok(());
                }

                let action = if settled {
                    TodoAction::LoadTodos { records }
                } else {
                    TodoAction::MergeTodos { records }
                };
                self.dispatch(action).await
            },
            Err(source) => {
                self.dispatch(TodoAction::SetLoadError {
                    message: user_message(Some(Operation::Fetch), &source).to_string(),
                })
                .await?;
                Err(Self::failed(Operation::Fetch, source))
            },
        }
    }

    // ========== Mutations ==========

    /// Add a todo, showing it immediately as a placeholder
    ///
    /// # Errors
    ///
    /// Returns [`TodosError::Remote`] if the create fails; the placeholder
    /// is removed.
    #[tracing::instrument(skip(self, title), name = "todos_add")]
    pub async fn add_todo(&self, title: impl Into<String>) -> Result<(), TodosError> {
        let title = title.into();
        self.clear_cache();

        let client_id = Uuid::new_v4().to_string();
        self.dispatch(TodoAction::AddOptimisticTodo {
            title: title.clone(),
            client_id: client_id.clone(),
        })
        .await?;

        let outcome = self
            .request(RequestKind::Saving, self.inner.remote.create(NewTodo { title }))
            .await?;

        match outcome {
            Ok(record) => {
                tracing::debug!(%client_id, id = %record.id, "Todo created");
                self.dispatch(TodoAction::AddTodo { client_id, record }).await
            },
            Err(source) => {
                self.dispatch(TodoAction::RemoveOptimisticTodo { client_id })
                    .await?;
                self.dispatch(TodoAction::SetError {
                    message: user_message(Some(Operation::Add), &source).to_string(),
                })
                .await?;
                Err(Self::failed(Operation::Add, source))
            },
        }
    }

    /// Toggle completion of a todo
    ///
    /// A todo marked complete is removed after the finalize delay unless it
    /// is toggled back, edited or the controller shuts down first. Unknown
    /// ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TodosError::StillSaving`] for an unconfirmed placeholder and
    /// [`TodosError::Remote`] if the update fails; the toggle is reverted.
    #[tracing::instrument(skip(self), name = "todos_complete")]
    pub async fn complete_todo(&self, id: &str) -> Result<(), TodosError> {
        self.clear_cache();

        let Some(original) = self.find(id).await else {
            tracing::debug!(id, "Ignored completion of a todo that is gone");
            return Ok(());
        };
        if original.is_still_saving {
            return Err(TodosError::StillSaving { id: id.to_string() });
        }

        let toggled = original.toggled();
        let is_completed = toggled.is_completed;
        self.dispatch(TodoAction::CompleteTodo { todo: toggled }).await?;

        let ticket = self.inner.timers.cancel(&original.id);
        let patch = TodoPatch::completion(original.title.clone(), is_completed);
        let outcome = self
            .request(
                RequestKind::Saving,
                self.inner.remote.update(original.id.clone(), patch),
            )
            .await?;

        match outcome {
            Ok(_) => {
                if is_completed {
                    self.arm_finalize(&original.id, ticket);
                }
                Ok(())
            },
            Err(source) => {
                self.inner.timers.cancel(&original.id);
                self.dispatch(TodoAction::RevertTodo {
                    todo: original,
                    message: user_message(Some(Operation::Complete), &source).to_string(),
                })
                .await?;
                Err(Self::failed(Operation::Complete, source))
            },
        }
    }

    /// Save an edited todo
    ///
    /// Ends any edit session for it; a finalize cancelled by
    /// [`begin_edit`](Self::begin_edit) is not re-armed. If the save fails,
    /// the todo is restored and a completed one is scheduled for removal
    /// again.
    ///
    /// # Errors
    ///
    /// Returns [`TodosError::TodoUnavailable`] if the todo is gone,
    /// [`TodosError::StillSaving`] for an unconfirmed placeholder and
    /// [`TodosError::Remote`] if the update fails; the edit is reverted.
    #[tracing::instrument(skip(self, edited), fields(id = %edited.id), name = "todos_update")]
    pub async fn update_todo(&self, edited: Todo) -> Result<(), TodosError> {
        self.clear_cache();
        self.editing().remove(&edited.id);

        let original = self.require(&edited.id).await?;
        if original.is_still_saving {
            return Err(TodosError::StillSaving { id: edited.id });
        }

        self.inner.timers.cancel(&edited.id);
        self.dispatch(TodoAction::UpdateTodo {
            todo: edited.clone(),
        })
        .await?;

        let patch = TodoPatch::title(edited.title);
        let outcome = self
            .request(RequestKind::Saving, self.inner.remote.update(edited.id, patch))
            .await?;

        match outcome {
            Ok(_) => Ok(()),
            Err(source) => {
                let id = original.id.clone();
                let was_completed = original.is_completed;
                self.dispatch(TodoAction::RevertTodo {
                    todo: original,
                    message: user_message(Some(Operation::Update), &source).to_string(),
                })
                .await?;

                // The revert brings back a completed todo, and its removal with it
                if was_completed {
                    let ticket = self.inner.timers.cancel(&id);
                    self.arm_finalize(&id, ticket);
                }
                Err(Self::failed(Operation::Update, source))
            },
        }
    }

    /// Start editing a todo; a pending finalize is cancelled
    ///
    /// # Errors
    ///
    /// Returns [`TodosError::TodoUnavailable`] if the todo is gone.
    #[tracing::instrument(skip(self), name = "todos_begin_edit")]
    pub async fn begin_edit(&self, id: &str) -> Result<(), TodosError> {
        let todo = self.require(id).await?;
        self.inner.timers.cancel(&todo.id);
        self.editing().insert(todo.id, todo.is_completed);
        Ok(())
    }

    /// Abandon an edit
    ///
    /// Re-arms the finalize if the todo was completed when editing began
    /// and still is.
    #[tracing::instrument(skip(self), name = "todos_cancel_edit")]
    pub async fn cancel_edit(&self, id: &str) {
        let Some(was_completed) = self.editing().remove(id) else {
            return;
        };

        let still_completed = self.find(id).await.is_some_and(|todo| todo.is_completed);
        if was_completed && still_completed {
            let ticket = self.inner.timers.cancel(&id.to_string());
            self.arm_finalize(id, ticket);
        }
    }

    // ========== View state ==========

    /// Sort by another field, fetching if the view changed
    ///
    /// # Errors
    ///
    /// Same as [`fetch_todos`](Self::fetch_todos).
    pub async fn set_sort_field(&self, field: SortField) -> Result<(), TodosError> {
        self.change_view(TodoAction::SetSortField { field }).await
    }

    /// Sort the other way, fetching if the view changed
    ///
    /// # Errors
    ///
    /// Same as [`fetch_todos`](Self::fetch_todos).
    pub async fn set_sort_direction(&self, direction: SortDirection) -> Result<(), TodosError> {
        self.change_view(TodoAction::SetSortDirection { direction })
            .await
    }

    /// Search by title, fetching if the view changed
    ///
    /// # Errors
    ///
    /// Same as [`fetch_todos`](Self::fetch_todos).
    pub async fn set_query_string(&self, query: impl Into<String>) -> Result<(), TodosError> {
        self.change_view(TodoAction::SetQueryString {
            query: query.into(),
        })
        .await
    }

    /// Clear the search, fetching if the view changed
    ///
    /// # Errors
    ///
    /// Same as [`fetch_todos`](Self::fetch_todos).
    pub async fn clear_query_string(&self) -> Result<(), TodosError> {
        self.change_view(TodoAction::ClearQueryString).await
    }

    /// Update the pending "add" input
    ///
    /// # Errors
    ///
    /// Returns [`TodosError::Store`] after shutdown.
    pub async fn set_working_todo_title(&self, title: impl Into<String>) -> Result<(), TodosError> {
        self.dispatch(TodoAction::SetWorkingTodoTitle {
            title: title.into(),
        })
        .await
    }

    /// Dismiss the current error
    ///
    /// # Errors
    ///
    /// Returns [`TodosError::Store`] after shutdown.
    pub async fn clear_error(&self) -> Result<(), TodosError> {
        self.dispatch(TodoAction::ClearError).await
    }

    // ========== Internals ==========

    async fn dispatch(&self, action: TodoAction) -> Result<(), TodosError> {
        self.inner.store.send(action).await.map_err(TodosError::from)
    }

    /// Run a remote call bracketed by start/end of `kind`
    ///
    /// A finished save invalidates the cache again, so fetches that overlapped
    /// it are never cached.
    async fn request<T>(
        &self,
        kind: RequestKind,
        call: RemoteFuture<'_, T>,
    ) -> Result<Result<T, AirtableError>, TodosError> {
        self.dispatch(TodoAction::StartRequest { kind }).await?;
        let outcome = call.await;
        if kind == RequestKind::Saving {
            self.clear_cache();
        }
        self.dispatch(TodoAction::EndRequest { kind }).await?;

        if let Err(error) = &outcome {
            tracing::warn!(?kind, %error, "Remote request failed");
        }
        Ok(outcome)
    }

    async fn change_view(&self, action: TodoAction) -> Result<(), TodosError> {
        let before = self.query_key().await;
        self.dispatch(action).await?;

        if self.query_key().await == before {
            return Ok(());
        }
        self.fetch_todos().await
    }

    async fn query_key(&self) -> QueryKey {
        self.inner.store.state(TodosState::query_key).await
    }

    async fn find(&self, id: &str) -> Option<Todo> {
        self.inner.store.state(|state| state.find(id).cloned()).await
    }

    /// Look up a todo, surfacing an error if it is gone
    async fn require(&self, id: &str) -> Result<Todo, TodosError> {
        if let Some(todo) = self.find(id).await {
            return Ok(todo);
        }

        tracing::warn!(id, "Todo is no longer available");
        self.dispatch(TodoAction::SetError {
            message: messages::UNAVAILABLE.to_string(),
        })
        .await?;
        Err(TodosError::TodoUnavailable { id: id.to_string() })
    }

    /// Remove `id` after the finalize delay if it is still completed then
    fn arm_finalize(&self, id: &str, ticket: Ticket) {
        let store = self.inner.store.clone();
        let key = id.to_string();

        let armed = self.inner.timers.schedule(
            id.to_string(),
            ticket,
            self.inner.config.finalize_delay,
            async move {
                let still_completed = store
                    .state(|state| state.find(&key).is_some_and(|todo| todo.is_completed))
                    .await;
                if !still_completed {
                    tracing::trace!(id = %key, "Finalize skipped, todo no longer completed");
                    return;
                }

                metrics::counter!("todos.finalize.fired").increment(1);
                if let Err(error) = store.send(TodoAction::FinalizeComplete { id: key }).await {
                    tracing::debug!(%error, "Finalize dropped");
                }
            },
        );

        if armed {
            tracing::trace!(id, "Finalize armed");
        }
    }

    fn clear_cache(&self) {
        self.cache().clear();
    }

    fn cache(&self) -> MutexGuard<'_, QueryCache> {
        self.inner
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn editing(&self) -> MutexGuard<'_, HashMap<String, bool>> {
        self.inner
            .editing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    const fn failed(operation: Operation, source: AirtableError) -> TodosError {
        TodosError::Remote { operation, source }
    }
}

impl std::fmt::Debug for TodosController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodosController")
            .field("config", &self.inner.config)
            .field("pending_finalizes", &self.inner.timers.len())
            .finish_non_exhaustive()
    }
}
