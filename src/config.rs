//! Application display and path configuration.

use std::env;

/// The display title used when the `APP_TITLE` environment variable is not
/// set.
pub const DEFAULT_APP_TITLE: &str = "Personal Finance App";

/// The default location of the flat-file dataset.
pub const DEFAULT_DATA_PATH: &str = "data/finance.csv";

/// The default location of the SQLite database.
pub const DEFAULT_DB_PATH: &str = "data/finance.db";

/// Get the application's display title.
///
/// Reads the `APP_TITLE` environment variable and falls back to
/// [DEFAULT_APP_TITLE] when it is unset or not valid unicode.
pub fn app_title() -> String {
    env::var("APP_TITLE").unwrap_or_else(|_| DEFAULT_APP_TITLE.to_owned())
}
