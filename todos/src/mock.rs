//! Scripted in-memory [`TodoRemote`] for tests
//!
//! Responses are queued per operation and taken in call order. Without a
//! queued response, `list` returns nothing, `create` echoes the title under a
//! fresh `recN` id and `update` echoes the patch. Every call is logged when
//! first polled, before it waits on a [`Gate`], so tests can hold a request in
//! flight and observe the state meanwhile.

use crate::model::{TodoFields, TodoRecord};
use crate::remote::{ListTodos, NewTodo, RemoteFuture, TodoPatch, TodoRemote};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tabletodo_airtable::AirtableError;
use tokio::sync::{Notify, Semaphore};

/// Creation time given to echoed records
pub const MOCK_CREATED_TIME: &str = "2025-01-01T00:00:00Z";

/// Remote operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// `list`
    List,
    /// `create`
    Create,
    /// `update`
    Update,
}

/// A logged remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// `list(query)`
    List(ListTodos),
    /// `create(todo)`
    Create(NewTodo),
    /// `update(id, patch)`
    Update {
        /// Record id
        id: String,
        /// Sent fields
        patch: TodoPatch,
    },
}

impl RemoteCall {
    /// Kind of this call
    #[must_use]
    pub const fn kind(&self) -> CallKind {
        match self {
            Self::List(_) => CallKind::List,
            Self::Create(_) => CallKind::Create,
            Self::Update { .. } => CallKind::Update,
        }
    }
}

/// Holds calls of one kind until released
#[derive(Debug, Clone)]
pub struct Gate {
    permits: Arc<Semaphore>,
}

impl Gate {
    /// Let `count` held calls through, oldest first
    pub fn release(&self, count: usize) {
        self.permits.add_permits(count);
    }
}

#[derive(Default)]
struct Script {
    lists: VecDeque<Result<Vec<TodoRecord>, AirtableError>>,
    creates: VecDeque<Result<TodoRecord, AirtableError>>,
    updates: VecDeque<Result<TodoRecord, AirtableError>>,
    gates: HashMap<CallKind, Gate>,
    calls: Vec<RemoteCall>,
    next_id: u64,
}

/// In-memory remote
#[derive(Clone, Default)]
pub struct MockRemote {
    script: Arc<Mutex<Script>>,
    called: Arc<Notify>,
}

impl MockRemote {
    /// Create a remote with nothing scripted
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the result of the next unanswered `list`
    pub fn respond_list(&self, result: Result<Vec<TodoRecord>, AirtableError>) {
        self.script().lists.push_back(result);
    }

    /// Queue the result of the next unanswered `create`
    pub fn respond_create(&self, result: Result<TodoRecord, AirtableError>) {
        self.script().creates.push_back(result);
    }

    /// Queue the result of the next unanswered `update`
    pub fn respond_update(&self, result: Result<TodoRecord, AirtableError>) {
        self.script().updates.push_back(result);
    }

    /// Hold every later call of `kind` until the returned gate releases it
    #[must_use]
    pub fn hold(&self, kind: CallKind) -> Gate {
        let gate = Gate {
            permits: Arc::new(Semaphore::new(0)),
        };
        self.script().gates.insert(kind, gate.clone());
        gate
    }

    /// Every call so far, in call order
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.script().calls.clone()
    }

    /// Number of calls of `kind` so far
    #[must_use]
    pub fn count(&self, kind: CallKind) -> usize {
        self.script()
            .calls
            .iter()
            .filter(|call| call.kind() == kind)
            .count()
    }

    /// Wait until at least `count` calls of `kind` were made
    pub async fn wait_for(&self, kind: CallKind, count: usize) {
        loop {
            let called = self.called.notified();
            if self.count(kind) >= count {
                return;
            }
            called.await;
        }
    }

    fn respond<T, F>(&self, call: RemoteCall, take: F) -> RemoteFuture<'_, T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Script) -> Result<T, AirtableError> + Send + 'static,
    {
        Box::pin(async move {
            let (result, gate) = {
                let mut script = self.script();
                let result = take(&mut script);
                let gate = script.gates.get(&call.kind()).cloned();
                script.calls.push(call);
                (result, gate)
            };
            self.called.notify_waiters();

            if let Some(gate) = gate {
                if let Ok(permit) = gate.permits.acquire().await {
                    permit.forget();
                }
            }
            result
        })
    }
}

impl TodoRemote for MockRemote {
    fn list(&self, query: ListTodos) -> RemoteFuture<'_, Vec<TodoRecord>> {
        self.respond(RemoteCall::List(query), |script| {
            script.lists.pop_front().unwrap_or_else(|| Ok(Vec::new()))
        })
    }

    fn create(&self, todo: NewTodo) -> RemoteFuture<'_, TodoRecord> {
        let title = todo.title.clone();
        self.respond(RemoteCall::Create(todo), move |script| {
            script.creates.pop_front().unwrap_or_else(|| {
                script.next_id += 1;
                Ok(TodoRecord {
                    id: format!("rec{}", script.next_id),
                    created_time: MOCK_CREATED_TIME.to_string(),
                    fields: TodoFields {
                        title: Some(title),
                        is_completed: None,
                    },
                })
            })
        })
    }

    fn update(&self, id: String, patch: TodoPatch) -> RemoteFuture<'_, TodoRecord> {
        let echo = TodoRecord {
            id: id.clone(),
            created_time: MOCK_CREATED_TIME.to_string(),
            fields: TodoFields {
                title: patch.title.clone(),
                is_completed: patch.is_completed,
            },
        };
        self.respond(RemoteCall::Update { id, patch }, move |script| {
            script.updates.pop_front().unwrap_or(Ok(echo))
        })
    }
}

impl std::fmt::Debug for MockRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRemote")
            .field("calls", &self.script().calls.len())
            .finish_non_exhaustive()
    }
}
