//! Keyed, cancellable delayed tasks.
//!
//! At most one task is pending per key. Every cancellation bumps the key's
//! [`Ticket`]; scheduling requires the caller's ticket to still be current,
//! which lets callers take a ticket before an `.await` and only arm the task
//! afterwards if nothing cancelled the key in the meantime.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;

/// Proof that no cancellation happened for a key since it was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

struct Pending {
    serial: u64,
    handle: AbortHandle,
}

struct TaskTable<K> {
    tickets: HashMap<K, u64>,
    pending: HashMap<K, Pending>,
    next_serial: u64,
    closed: bool,
}

impl<K: Eq + Hash> TaskTable<K> {
    fn ticket(&self, key: &K) -> u64 {
        self.tickets.get(key).copied().unwrap_or(0)
    }
}

/// Delayed tasks keyed by `K`
///
/// Cloning shares the underlying table.
pub struct DelayedTasks<K> {
    table: Arc<Mutex<TaskTable<K>>>,
}

impl<K> DelayedTasks<K>
where
    K: Eq + Hash + Clone + Send + std::fmt::Debug + 'static,
{
    /// Create an empty task table
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(TaskTable {
                tickets: HashMap::new(),
                pending: HashMap::new(),
                next_serial: 0,
                closed: false,
            })),
        }
    }

    /// Abort the pending task for `key`, if any, and invalidate older tickets
    ///
    /// Returns the new current ticket for `key`.
    pub fn cancel(&self, key: &K) -> Ticket {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);

        let ticket = table.ticket(key) + 1;
        table.tickets.insert(key.clone(), ticket);

        if let Some(pending) = table.pending.remove(key) {
            pending.handle.abort();
            tracing::trace!(?key, "Cancelled delayed task");
        }

        Ticket(ticket)
    }

    /// Run `task` after `delay` unless `key` is cancelled first
    ///
    /// Nothing is scheduled (and `false` is returned) when `ticket` is stale
    /// or the table was closed by [`cancel_all`](Self::cancel_all). Any task
    /// already pending for `key` is replaced.
    pub fn schedule<F>(&self, key: K, ticket: Ticket, delay: Duration, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);

        if table.closed || table.ticket(&key) != ticket.0 {
            tracing::trace!(?key, "Skipped scheduling with stale ticket");
            return false;
        }

        if let Some(previous) = table.pending.remove(&key) {
            previous.handle.abort();
        }

        let serial = table.next_serial;
        table.next_serial += 1;

        let shared = Arc::clone(&self.table);
        let own_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;

            let mut table = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if table
                .pending
                .get(&own_key)
                .is_some_and(|pending| pending.serial == serial)
            {
                table.pending.remove(&own_key);
            }
        });

        table.pending.insert(
            key,
            Pending {
                serial,
                handle: handle.abort_handle(),
            },
        );

        true
    }

    /// Whether a task is pending for `key`
    #[must_use]
    pub fn is_pending(&self, key: &K) -> bool {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .contains_key(key)
    }

    /// Number of pending tasks
    #[must_use]
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .len()
    }

    /// Whether no task is pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Abort every pending task and refuse all future scheduling
    pub fn cancel_all(&self) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table.closed = true;

        let count = table.pending.len();
        for (_, pending) in table.pending.drain() {
            pending.handle.abort();
        }

        if count > 0 {
            tracing::debug!(count, "Cancelled all delayed tasks");
        }
    }
}

impl<K> Clone for DelayedTasks<K> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<K> Default for DelayedTasks<K>
where
    K: Eq + Hash + Clone + Send + std::fmt::Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_task(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_task_fires_after_delay() {
        let tasks = DelayedTasks::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let ticket = tasks.cancel(&"a");
        assert!(tasks.schedule("a", ticket, Duration::from_millis(100), counting_task(&fired)));
        assert!(tasks.is_pending(&"a"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(tasks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let tasks = DelayedTasks::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let ticket = tasks.cancel(&"a");
        tasks.schedule("a", ticket, Duration::from_millis(100), counting_task(&fired));
        tasks.cancel(&"a");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!tasks.is_pending(&"a"));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticket_is_rejected() {
        let tasks = DelayedTasks::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let stale = tasks.cancel(&"a");
        let fresh = tasks.cancel(&"a");
        assert_ne!(stale, fresh);

        assert!(!tasks.schedule("a", stale, Duration::from_millis(10), counting_task(&fired)));
        assert!(tasks.schedule("a", fresh, Duration::from_millis(10), counting_task(&fired)));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_pending_task() {
        let tasks = DelayedTasks::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let ticket = tasks.cancel(&"a");
        tasks.schedule("a", ticket, Duration::from_millis(100), counting_task(&fired));
        tasks.schedule("a", ticket, Duration::from_millis(100), counting_task(&fired));
        assert_eq!(tasks.len(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let tasks = DelayedTasks::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let a = tasks.cancel(&"a");
        let b = tasks.cancel(&"b");
        tasks.schedule("a", a, Duration::from_millis(10), counting_task(&fired));
        tasks.schedule("b", b, Duration::from_millis(10), counting_task(&fired));
        tasks.cancel(&"a");

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_closes_the_table() {
        let tasks = DelayedTasks::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let ticket = tasks.cancel(&"a");
        tasks.schedule("a", ticket, Duration::from_millis(10), counting_task(&fired));
        tasks.cancel_all();

        let ticket = tasks.cancel(&"b");
        assert!(!tasks.schedule("b", ticket, Duration::from_millis(10), counting_task(&fired)));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(tasks.is_empty());
    }
}
