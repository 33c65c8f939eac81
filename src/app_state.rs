//! The state shared between route handlers.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::dataset::DatasetStore;

/// The state shared between all route handlers.
///
/// Handlers that only need part of the state declare their own state struct
/// and implement [FromRef](axum::extract::FromRef) for it.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The connection to the SQLite database.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The store for the flat-file dataset.
    pub dataset: DatasetStore,
    /// The display title of the application.
    pub app_title: String,
}

impl AppState {
    /// Create the shared application state.
    pub fn new(db_connection: Connection, dataset: DatasetStore, app_title: String) -> Self {
        Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            dataset,
            app_title,
        }
    }
}
