//! Shared application state for all routes: the store handle built once at startup.

use crate::store::ProfileStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProfileStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        AppState { store }
    }
}
