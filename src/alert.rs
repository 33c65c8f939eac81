//! Alert system for displaying error messages to users.
//!
//! Handlers return these fragments on failure and htmx swaps them into the
//! `#alert-container` element via the response-targets extension. Successful
//! requests refresh the page instead, so there is no success variant.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// An alert message rendered as an inline HTML fragment.
#[derive(Debug, Clone)]
pub enum Alert {
    /// An error message with extra detail text.
    Error {
        /// The headline of the alert.
        message: String,
        /// Supporting detail shown under the headline.
        details: String,
    },
    /// An error message without details.
    ErrorSimple {
        /// The headline of the alert.
        message: String,
    },
}

const ERROR_STYLE: &str = "p-4 text-sm rounded-lg border text-red-800 \
    border-red-300 bg-red-50 dark:bg-gray-800 dark:text-red-400 \
    dark:border-red-800";

impl Alert {
    /// Render the alert as a dismissible fragment for the alert container.
    pub fn into_html(self) -> Markup {
        let (message, details) = match self {
            Alert::Error { message, details } => (message, Some(details)),
            Alert::ErrorSimple { message } => (message, None),
        };

        html! {
            div
                class=(ERROR_STYLE)
                role="alert"
                onclick="this.remove()"
            {
                p class="font-medium" { (message) }

                @if let Some(details) = details {
                    @if !details.is_empty() {
                        p { (details) }
                    }
                }
            }

            // htmx runs scripts in swapped fragments, so this unhides the
            // container when the alert lands in it.
            script
            {
                (maud::PreEscaped("document.getElementById('alert-container').classList.remove('hidden');"))
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}

#[cfg(test)]
mod alert_tests {
    use super::Alert;

    #[test]
    fn error_alert_renders_message_and_details() {
        let html = Alert::Error {
            message: "Invalid CSV format".to_owned(),
            details: "The first columns must match the template.".to_owned(),
        }
        .into_html()
        .into_string();

        assert!(html.contains("Invalid CSV format"));
        assert!(html.contains("The first columns must match the template."));
        assert!(html.contains("role=\"alert\""));
    }

    #[test]
    fn simple_alert_omits_empty_details() {
        let html = Alert::ErrorSimple {
            message: "Item not found".to_owned(),
        }
        .into_html()
        .into_string();

        assert!(html.contains("Item not found"));
        assert_eq!(html.matches("<p").count(), 1);
    }
}
