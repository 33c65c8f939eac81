//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/items/{item_id}', use [format_endpoint].

/// The dashboard and landing page.
pub const ROOT: &str = "/";
/// The liveness probe.
pub const HEALTH: &str = "/health";
/// The page for listing and creating items.
pub const ITEMS_VIEW: &str = "/items";
/// The page for viewing and extending the cashflow dataset.
pub const CASHFLOW_VIEW: &str = "/cashflow";
/// The page for managing the flat-file dataset.
pub const DATA_VIEW: &str = "/data";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to create a category.
pub const CATEGORY: &str = "/category";
/// The route to create a label.
pub const LABEL: &str = "/label";
/// The route to delete an item.
pub const DELETE_ITEM: &str = "/items/{item_id}";
/// The route to upload or delete the dataset file.
pub const DATASET: &str = "/api/dataset";
/// The route to generate an empty dataset template.
pub const DATASET_TEMPLATE: &str = "/api/dataset/template";
/// The route to download the dataset as a CSV attachment.
pub const DATASET_DOWNLOAD: &str = "/api/dataset/download";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/items/{item_id}', '{item_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::HEALTH);
        assert_endpoint_is_valid_uri(endpoints::ITEMS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::CASHFLOW_VIEW);
        assert_endpoint_is_valid_uri(endpoints::DATA_VIEW);
        assert_endpoint_is_valid_uri(endpoints::STATIC);
        assert_endpoint_is_valid_uri(endpoints::CATEGORY);
        assert_endpoint_is_valid_uri(endpoints::LABEL);
        assert_endpoint_is_valid_uri(endpoints::DELETE_ITEM);
        assert_endpoint_is_valid_uri(endpoints::DATASET);
        assert_endpoint_is_valid_uri(endpoints::DATASET_TEMPLATE);
        assert_endpoint_is_valid_uri(endpoints::DATASET_DOWNLOAD);
    }

    #[test]
    fn format_endpoint_replaces_parameter() {
        assert_eq!(format_endpoint(endpoints::DELETE_ITEM, 42), "/items/42");
    }

    #[test]
    fn format_endpoint_returns_paths_without_parameters_unchanged() {
        assert_eq!(format_endpoint(endpoints::ITEMS_VIEW, 42), "/items");
    }
}
