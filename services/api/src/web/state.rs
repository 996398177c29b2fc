//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use crate::config::Config;
use bookshelf_core::ports::{AuthStore, CatalogStore, RelationshipStore, ReviewStore};

/// The shared application state, created once at startup and passed to all
/// handlers. Each store is held behind its own port even though one adapter
/// implements them all, so handlers only see the surface they need.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub relationships: Arc<dyn RelationshipStore>,
    pub auth_sessions: Arc<dyn AuthStore>,
    pub config: Arc<Config>,
}
