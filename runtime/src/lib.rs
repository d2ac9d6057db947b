//! # Tabletodo Runtime
//!
//! Runtime implementation for the tabletodo state architecture.
//!
//! ## Core Components
//!
//! - **Store**: Owns state, runs the reducer for every dispatched action and
//!   broadcasts it to observers
//! - **`DelayedTasks`**: Keyed, cancellable delayed work (completion timers)
//!
//! ## Example
//!
//! ```ignore
//! use tabletodo_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tabletodo_core::reducer::Reducer;
use tokio::sync::RwLock;

/// Keyed cancellable delayed tasks
pub mod timers;

pub use timers::{DelayedTasks, Ticket};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shut down and not accepting new actions
        ///
        /// Returned by `send()` after `shutdown()` was called. Late responses
        /// from work started before shutdown land here and are dropped.
        #[error("Store is shutting down")]
        ShutdownInProgress,
    }
}

pub use error::StoreError;

/// Store module - The runtime for reducers
pub mod store {
    use super::{Arc, AtomicBool, Ordering, Reducer, RwLock, StoreError};
    use tokio::sync::broadcast;

    /// Default capacity of the action broadcast channel
    const BROADCAST_CAPACITY: usize = 64;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Action broadcast (observers)
    ///
    /// Cloning a store is cheap; clones share state, shutdown flag and
    /// broadcast channel.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        /// Every reduced action is broadcast so renderers can observe changes.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + std::fmt::Debug + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            let (action_broadcast, _) = broadcast::channel(BROADCAST_CAPACITY);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Broadcasts the action to observers
        ///
        /// Concurrent `send()` calls serialize at the reducer level, so actions
        /// are applied in the order their callers acquire the lock.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::debug!(?action, "Rejected action: store is shutting down");
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::trace!(?action, "Processing action");
            metrics::counter!("store.actions.total").increment(1);

            let mut state = self.state.write().await;
            self.reducer
                .reduce(&mut *state, action.clone(), &self.environment);
            // Broadcast while still holding the lock so observers see
            // actions in reduction order.
            let _ = self.action_broadcast.send(action);

            Ok(())
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.todo_list.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Subscribe to every action reduced by this store
        ///
        /// Slow receivers observe `RecvError::Lagged` and skip ahead.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Stop accepting actions
        ///
        /// Subsequent `send()` calls fail with [`StoreError::ShutdownInProgress`].
        pub fn shutdown(&self) {
            if !self.shutdown.swap(true, Ordering::AcqRel) {
                tracing::info!("Store shut down");
            }
        }

        /// Whether `shutdown()` has been called on this store or a clone
        #[must_use]
        pub fn is_shutdown(&self) -> bool {
            self.shutdown.load(Ordering::Acquire)
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::Store;
