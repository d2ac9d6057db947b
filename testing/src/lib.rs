//! # Tabletodo Testing
//!
//! Testing utilities and helpers for the tabletodo state architecture.
//!
//! This crate provides:
//! - `ReducerTest`, a Given-When-Then harness for reducers
//! - A fixed clock for deterministic timestamps
//! - Test log initialisation
//!
//! ## Example
//!
//! ```ignore
//! use tabletodo_testing::{ReducerTest, test_clock};
//!
//! ReducerTest::new(TodosReducer::new())
//!     .with_env(TodosEnvironment::new(Arc::new(test_clock())))
//!     .given_state(TodosState::default())
//!     .when_action(TodoAction::FetchTodos)
//!     .then_state(|state| assert!(state.is_loading))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use tabletodo_core::environment::Clock;


pub use reducer_test::ReducerTest;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use tabletodo_testing::mocks::FixedClock;
    /// use tabletodo_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Install a `tracing` subscriber for tests
///
/// Honours `RUST_LOG`, writes through the test writer so output is only
/// shown for failing tests. Safe to call from every test.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub use mocks::{FixedClock, test_clock};
