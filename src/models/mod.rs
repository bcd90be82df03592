mod stock;
pub use stock::*;

use crate::auth::SessionStore;
use crate::storage::Storage;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub sessions: SessionStore,
}
impl AppState {
    pub fn new(storage: Storage, sessions: SessionStore) -> Self {
        Self { storage, sessions }
    }
}
