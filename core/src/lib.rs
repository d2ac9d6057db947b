//! # Tabletodo Core
//!
//! Core traits and types for the tabletodo state architecture.
//!
//! State lives in a single record that only changes through a reducer. Side
//! effects (network calls, timers) are owned by whatever drives the reducer
//! and come back in as actions.
//!
//! ## Core Concepts
//!
//! - **State**: Domain state for a feature
//! - **Action**: Every input that can change the state
//! - **Reducer**: `(State, Action, Environment) → State`
//! - **Environment**: Injected dependencies via traits
//!
//! ## Example
//!
//! ```
//! use tabletodo_core::reducer::Reducer;
//!
//! struct Counter;
//!
//! impl Reducer for Counter {
//!     type State = u32;
//!     type Action = ();
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut u32, (): (), _env: &()) {
//!         *state += 1;
//!     }
//! }
//!
//! let mut count = 0;
//! Counter.reduce(&mut count, (), &());
//! assert_eq!(count, 1);
//! ```

pub use chrono::{DateTime, Utc};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → State`.
/// They are deterministic for a given environment and never perform I/O.
pub mod reducer {
    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Apply an action to the state
        ///
        /// The store owns the state, so the reducer receives it mutably. A
        /// reducer must leave the state untouched for actions that do not
        /// apply to it (unknown ids and the like), never panic on them.
        fn reduce(&self, state: &mut Self::State, action: Self::Action, env: &Self::Environment);
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies a reducer needs are abstracted behind traits and
/// injected via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use tabletodo_core::environment::{Clock, SystemClock};
    ///
    /// let now = SystemClock.now();
    /// assert!(now.timestamp() > 0);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
