//! Application router configuration.

use axum::{
    Json, Router, middleware,
    routing::{delete, get, post},
};
use serde_json::json;
use tower_http::services::ServeDir;

use crate::{
    AppState,
    cashflow::{create_cashflow_row_endpoint, get_cashflow_page},
    category::create_category_endpoint,
    endpoints,
    home::get_dashboard_page,
    item::{create_item_endpoint, delete_item_endpoint, get_items_page},
    label::create_label_endpoint,
    logging::logging_middleware,
    manage_data::{
        delete_dataset_endpoint, download_dataset_endpoint, generate_template_endpoint,
        get_data_page, upload_dataset_endpoint,
    },
    not_found::get_404_not_found,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_dashboard_page))
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::CATEGORY, post(create_category_endpoint))
        .route(endpoints::LABEL, post(create_label_endpoint))
        .route(
            endpoints::ITEMS_VIEW,
            get(get_items_page).post(create_item_endpoint),
        )
        .route(endpoints::DELETE_ITEM, delete(delete_item_endpoint))
        .route(
            endpoints::CASHFLOW_VIEW,
            get(get_cashflow_page).post(create_cashflow_row_endpoint),
        )
        .route(endpoints::DATA_VIEW, get(get_data_page))
        .route(
            endpoints::DATASET,
            post(upload_dataset_endpoint).delete(delete_dataset_endpoint),
        )
        .route(endpoints::DATASET_TEMPLATE, post(generate_template_endpoint))
        .route(endpoints::DATASET_DOWNLOAD, get(download_dataset_endpoint))
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// The liveness probe used by deployment health checks.
async fn get_health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}
