//! This file defines the `Category` type, its queries and the API route for
//! creating categories. A category records what a transaction was for.

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

/// The name of a category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is
    /// an empty string.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A classification of a transaction's purpose, e.g., 'Consumption',
/// 'Lifestyle'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    /// The ID of the category.
    pub id: DatabaseId,

    /// The name of the category.
    pub name: CategoryName,
}

/// Renders the inline form for creating a category.
pub fn category_form_view() -> Markup {
    html! {
        form
            hx-post=(endpoints::CATEGORY)
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            label for="category-name" class=(FORM_LABEL_STYLE) { "Category Name" }

            input
                id="category-name"
                type="text"
                name="name"
                placeholder="Category Name"
                required
                class=(FORM_TEXT_INPUT_STYLE);

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Category" }
        }
    }
}

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a category.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryFormData {
    /// The name of the new category.
    pub name: String,
}

/// A route handler for creating a new category.
///
/// Responds with 201 on success and 400 when the name is empty.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Form(form): Form<CategoryFormData>,
) -> Response {
    let name = match CategoryName::new(&form.name) {
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

    match create_category(name, &connection) {
        Ok(_) => (HxRefresh(true), StatusCode::CREATED).into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");
            error.into_alert_response()
        }
    }
}

/// Create a category in the database.
///
/// Category names carry no uniqueness constraint, so inserting the same
/// name twice creates two rows.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn create_category(name: CategoryName, connection: &Connection) -> Result<Category, Error> {
    connection.execute("INSERT INTO category (name) VALUES (?1);", (name.as_ref(),))?;

    let id = connection.last_insert_rowid();

    Ok(Category { id, name })
}

/// Retrieve all categories in the database.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name FROM category ORDER BY id ASC;")?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Create the category table if it does not exist.
///
/// Names are deliberately not unique, the same name may be created twice.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = CategoryName::new_unchecked(&raw_name);

    Ok(Category { id, name })
}


#[cfg(test)]
mod category_query_tests {
    use rusqlite::Connection;

    use crate::db::initialize;

    use super::{CategoryName, create_category, get_all_categories};

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("could not create tables");
        connection
    }

    #[test]
    fn create_category_succeeds() {
        let connection = get_test_db_connection();
        let name = CategoryName::new("Categorically a category").unwrap();

        let category = create_category(name.clone(), &connection);

        let got_category = category.expect("could not create category");
        assert!(got_category.id > 0);
        assert_eq!(got_category.name, name);
    }

    #[test]
    fn create_category_accepts_duplicate_names() {
        let connection = get_test_db_connection();
        let name = CategoryName::new_unchecked("Lifestyle");

        let first = create_category(name.clone(), &connection).expect("first insert failed");
        let second = create_category(name.clone(), &connection).expect("second insert failed");

        assert_ne!(first.id, second.id);
        assert_eq!(first.name, second.name);
        assert_eq!(get_all_categories(&connection).unwrap().len(), 2);
    }

    #[test]
    fn get_all_categories_returns_inserted_rows() {
        let connection = get_test_db_connection();

        let inserted = vec![
            create_category(CategoryName::new_unchecked("Foo"), &connection).unwrap(),
            create_category(CategoryName::new_unchecked("Bar"), &connection).unwrap(),
        ];

        let selected = get_all_categories(&connection).unwrap();

        assert_eq!(inserted, selected);
    }
}

#[cfg(test)]
mod create_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::db::initialize;

    use super::{
        CategoryFormData, CreateCategoryState, create_category_endpoint, get_all_categories,
    };

    fn get_test_state() -> CreateCategoryState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("could not create tables");

        CreateCategoryState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn create_category_returns_created() {
        let state = get_test_state();
        let form = CategoryFormData {
            name: "Consumption".to_owned(),
        };

        let response = create_category_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::CREATED);

        let connection = state.db_connection.lock().unwrap();
        let categories = get_all_categories(&connection).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name.as_ref(), "Consumption");
    }

    #[tokio::test]
    async fn create_category_with_empty_name_returns_bad_request() {
        let state = get_test_state();
        let form = CategoryFormData {
            name: "  ".to_owned(),
        };

        let response = create_category_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        assert!(get_all_categories(&connection).unwrap().is_empty());
    }
}
