//! Kakeibo is a web app for keeping personal finance records.
//!
//! This library provides a REST API that directly serves HTML pages. Records
//! live in two places: a flat CSV cashflow dataset and a relational SQLite
//! store of categories, labels and items.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
pub mod cashflow;
pub mod category;
pub mod config;
pub mod dataset;
mod database_id;
pub mod db;
pub mod endpoints;
mod error;
mod home;
mod html;
pub mod item;
pub mod label;
mod logging;
mod manage_data;
pub mod month;
mod navigation;
mod not_found;
mod routing;

pub use app_state::AppState;
pub use database_id::DatabaseId;
pub use dataset::DatasetStore;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
