//! The `Label` type and its queries. A label classifies the direction of a
//! cashflow entry, e.g., 'Outcome', 'Income', 'Savings'.

use std::{
    fmt::Display,
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRefresh;
use maud::{Markup, html};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
};

/// The name of a label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct LabelName(String);

impl LabelName {
    /// Create a label name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyLabelName] if `name` is an
    /// empty string.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyLabelName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a label name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for LabelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for LabelName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LabelName::new(s)
    }
}

impl Display for LabelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A classification of cash-flow direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Label {
    /// The ID of the label.
    pub id: DatabaseId,

    /// The name of the label.
    pub name: LabelName,
}

/// Renders the inline form for creating a label.
pub fn label_form_view() -> Markup {
    html! {
        form
            hx-post=(endpoints::LABEL)
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            label for="label-name" class=(FORM_LABEL_STYLE) { "Label Name" }

            input
                id="label-name"
                type="text"
                name="name"
                placeholder="Label Name"
                required
                class=(FORM_TEXT_INPUT_STYLE);

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Label" }
        }
    }
}

/// The state needed for creating a label.
#[derive(Debug, Clone)]
pub struct CreateLabelState {
    /// The database connection for managing labels.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateLabelState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a label.
#[derive(Debug, Serialize, Deserialize)]
pub struct LabelFormData {
    /// The name of the new label.
    pub name: String,
}

/// A route handler for creating a new label.
///
/// Responds with 201 on success and 400 when the name is empty.
pub async fn create_label_endpoint(
    State(state): State<CreateLabelState>,
    Form(form): Form<LabelFormData>,
) -> Response {
    let name = match LabelName::new(&form.name) {
        Ok(name) => name,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_label(name, &connection) {
        Ok(_) => (HxRefresh(true), StatusCode::CREATED).into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a label: {error}");
            error.into_alert_response()
        }
    }
}

/// Create a label in the database.
///
/// Label names carry no uniqueness constraint, duplicates create new rows.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn create_label(name: LabelName, connection: &Connection) -> Result<Label, Error> {
    connection.execute("INSERT INTO label (name) VALUES (?1);", (name.as_ref(),))?;

    let id = connection.last_insert_rowid();

    Ok(Label { id, name })
}

/// Retrieve all labels in the database.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_all_labels(connection: &Connection) -> Result<Vec<Label>, Error> {
    connection
        .prepare("SELECT id, name FROM label ORDER BY id ASC;")?
        .query_map([], map_row)?
        .map(|maybe_label| maybe_label.map_err(|error| error.into()))
        .collect()
}

/// Create the label table if it does not exist.
///
/// Names are deliberately not unique, the same name may be created twice.
pub fn create_label_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS label (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Label, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = LabelName::new_unchecked(&raw_name);

    Ok(Label { id, name })
}

#[cfg(test)]
mod label_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{
        CreateLabelState, LabelFormData, LabelName, create_label, create_label_endpoint,
        get_all_labels,
    };

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("could not create tables");
        connection
    }

    #[test]
    fn new_fails_on_empty_string() {
        assert_eq!(LabelName::new(" "), Err(Error::EmptyLabelName));
    }

    #[test]
    fn create_label_succeeds() {
        let connection = get_test_db_connection();
        let name = LabelName::new("Income").unwrap();

        let label = create_label(name.clone(), &connection).expect("could not create label");

        assert!(label.id > 0);
        assert_eq!(label.name, name);
    }

    #[test]
    fn create_label_accepts_duplicate_names() {
        let connection = get_test_db_connection();
        let name = LabelName::new_unchecked("Savings");

        let first = create_label(name.clone(), &connection).expect("first insert failed");
        let second = create_label(name, &connection).expect("second insert failed");

        assert_ne!(first.id, second.id);
        assert_eq!(get_all_labels(&connection).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_label_endpoint_returns_created() {
        let state = CreateLabelState {
            db_connection: Arc::new(Mutex::new(get_test_db_connection())),
        };
        let form = LabelFormData {
            name: "Outcome".to_owned(),
        };

        let response = create_label_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::CREATED);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_all_labels(&connection).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_label_endpoint_with_empty_name_returns_bad_request() {
        let state = CreateLabelState {
            db_connection: Arc::new(Mutex::new(get_test_db_connection())),
        };
        let form = LabelFormData {
            name: String::new(),
        };

        let response = create_label_endpoint(State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
