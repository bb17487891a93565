//! Application state shared across handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::ports::{
    GroupRepository, HealthCheck, OrderRepository, ProductRepository, Repositories,
    UserRepository,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// repositories and the process start time.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    repos: Repositories,
    started: Instant,
}

impl AppState {
    /// Create a new application state. The uptime clock starts now.
    #[must_use]
    pub fn new(repos: Repositories) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                repos,
                started: Instant::now(),
            }),
        }
    }

    /// Product repository.
    #[must_use]
    pub fn products(&self) -> &dyn ProductRepository {
        self.inner.repos.products.as_ref()
    }

    /// Order repository.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderRepository {
        self.inner.repos.orders.as_ref()
    }

    /// User repository.
    #[must_use]
    pub fn users(&self) -> &dyn UserRepository {
        self.inner.repos.users.as_ref()
    }

    /// Group repository.
    #[must_use]
    pub fn groups(&self) -> &dyn GroupRepository {
        self.inner.repos.groups.as_ref()
    }

    /// Store health probe.
    #[must_use]
    pub fn health(&self) -> &dyn HealthCheck {
        self.inner.repos.health.as_ref()
    }

    /// Monotonic time since the state was built.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.inner.started.elapsed()
    }
}
