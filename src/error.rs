//! Defines the app level error type and its conversions to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::alert::Alert;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// An empty string was used to create a label name.
    #[error("Label name cannot be empty")]
    EmptyLabelName,

    /// An empty string was used as an item description.
    #[error("Item name cannot be empty")]
    EmptyItemName,

    /// A date string could not be parsed with year-first ambiguity
    /// resolution.
    ///
    /// Callers should pass in the text that caused the error.
    #[error("could not parse \"{0}\" as a year-first date")]
    InvalidDate(String),

    /// The CSV had issues that prevented it from being parsed.
    #[error("Could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// The uploaded dataset did not start with the required columns
    /// `Date,Desc,Label,Category,Total` in that exact order.
    #[error("the CSV columns do not match the required dataset schema")]
    InvalidDatasetColumns,

    /// The multipart form could not be parsed as a CSV file upload.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a CSV file.
    #[error("File is not a CSV")]
    NotCSV,

    /// The dataset file already exists on disk.
    ///
    /// Saving refuses to overwrite an existing dataset. The user must
    /// delete the current dataset before uploading or generating a new one.
    #[error("the dataset file already exists")]
    DatasetExists,

    /// An I/O error occurred while reading or writing the dataset file.
    #[error("dataset file error: {0}")]
    DatasetIo(String),

    /// Could not acquire the dataset cache lock.
    #[error("could not acquire the dataset cache lock")]
    DatasetLockError,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the
    /// parameters (e.g., ID) are correct and that the resource has been
    /// created. Internally, this error may occur when a query returns no
    /// rows or when deleting a dataset file that does not exist.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An item referenced a category or label ID that does not exist.
    #[error("the category or label ID does not refer to an existing row")]
    InvalidItemReference,

    /// Tried to delete an item that does not exist
    #[error("tried to delete an item that is not in the database")]
    DeleteMissingItem,

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 787 =>
            {
                Error::InvalidItemReference
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// Render the error as an inline alert fragment paired with the
    /// appropriate HTTP status code.
    pub fn into_alert_response(self) -> Response {
        let status_code = self.status_code();

        let alert = match &self {
            Error::EmptyCategoryName
            | Error::EmptyLabelName
            | Error::EmptyItemName
            | Error::InvalidDate(_)
            | Error::NotCSV
            | Error::InvalidItemReference => Alert::ErrorSimple {
                message: self.to_string(),
            },
            Error::InvalidCSV(details) => Alert::Error {
                message: "Could not read the CSV file".to_owned(),
                details: details.clone(),
            },
            Error::InvalidDatasetColumns => Alert::Error {
                message: "Invalid CSV format".to_owned(),
                details: format!(
                    "The first columns must be exactly {:?}.",
                    crate::dataset::REQUIRED_COLUMNS
                ),
            },
            Error::DatasetExists => Alert::Error {
                message: "File already exists".to_owned(),
                details: "Delete the current dataset before saving a new one.".to_owned(),
            },
            Error::NotFound | Error::DeleteMissingItem => Alert::ErrorSimple {
                message: "Not found".to_owned(),
            },
            _ => Alert::Error {
                message: "Something went wrong".to_owned(),
                details: "Try again later or check the server logs.".to_owned(),
            },
        };

        (status_code, alert.into_html()).into_response()
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::EmptyCategoryName
            | Error::EmptyLabelName
            | Error::EmptyItemName
            | Error::InvalidDate(_)
            | Error::InvalidCSV(_)
            | Error::InvalidDatasetColumns
            | Error::MultipartError(_)
            | Error::NotCSV
            | Error::InvalidItemReference => StatusCode::BAD_REQUEST,
            Error::NotFound | Error::DeleteMissingItem => StatusCode::NOT_FOUND,
            Error::DatasetExists => StatusCode::CONFLICT,
            Error::DatasetIo(_)
            | Error::DatasetLockError
            | Error::DatabaseLockError
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.into_alert_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::http::StatusCode;

    use super::Error;

    #[test]
    fn foreign_key_failure_maps_to_invalid_item_reference() {
        let sql_error = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ffi::ErrorCode::ConstraintViolation,
                extended_code: 787,
            },
            Some("FOREIGN KEY constraint failed".to_owned()),
        );

        assert_eq!(Error::from(sql_error), Error::InvalidItemReference);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[test]
    fn delete_missing_item_responds_not_found() {
        let response = Error::DeleteMissingItem.into_alert_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn dataset_exists_responds_conflict() {
        let response = Error::DatasetExists.into_alert_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
