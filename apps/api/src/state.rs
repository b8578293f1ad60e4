use crate::config::Config;
use crate::store::Repositories;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// One repository per entity, all backed by the configured store.
    pub repos: Repositories,
    pub config: Config,
}
