use std::sync::Arc;

use crate::errors::AppError;
use crate::store::ApplicationStore;
use crate::uploads::ResumeStorage;

/// Whether the record store is reachable. Decided once at startup.
#[derive(Clone)]
pub enum Persistence {
    Connected(Arc<dyn ApplicationStore>),
    /// Startup could not reach the database; data routes answer 503.
    Degraded,
}

impl Persistence {
    pub fn is_connected(&self) -> bool {
        matches!(self, Persistence::Connected(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Persistence::Connected(_) => "connected",
            Persistence::Degraded => "degraded",
        }
    }
}

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub persistence: Persistence,
    pub resumes: ResumeStorage,
}

impl AppState {
    pub fn new(persistence: Persistence, resumes: ResumeStorage) -> Self {
        Self {
            persistence,
            resumes,
        }
    }

    /// The record store, or `AppError::Unavailable` in degraded mode.
    pub fn store(&self) -> Result<&Arc<dyn ApplicationStore>, AppError> {
        match &self.persistence {
            Persistence::Connected(store) => Ok(store),
            Persistence::Degraded => Err(AppError::Unavailable),
        }
    }
}
