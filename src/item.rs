//! The `Item` type, its queries, the items page and the API routes for
//! creating and deleting items. An item is one financial record in the
//! relational store.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRefresh;
use maud::{Markup, html};
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    category::{Category, category_form_view, get_all_categories},
    database_id::DatabaseId,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, format_total,
    },
    label::{Label, get_all_labels, label_form_view},
    navigation::NavBar,
};

/// One financial record in the relational store.
///
/// The category and label references are nullable in the schema, although
/// the add form always supplies both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// The ID of the item.
    pub id: DatabaseId,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub name: String,
    /// The ID of the item's category, if set.
    pub category: Option<DatabaseId>,
    /// The ID of the item's label, if set.
    pub label: Option<DatabaseId>,
    /// The amount of money in the smallest currency unit.
    pub total: i64,
}

/// The item data to display in the items table.
#[derive(Debug, PartialEq)]
struct ItemTableRow {
    id: DatabaseId,
    date: Date,
    name: String,
    category_name: Option<String>,
    label_name: Option<String>,
    total: i64,
    delete_url: String,
}

fn item_form_view(categories: &[Category], labels: &[Label]) -> Markup {
    html! {
        form
            hx-post=(endpoints::ITEMS_VIEW)
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                input id="date" type="date" name="date" required class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Description" }
                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Description"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }
                select id="category_id" name="category_id" required class=(FORM_SELECT_STYLE)
                {
                    @for category in categories {
                        option value=(category.id) { (category.name) }
                    }
                }
            }

            div
            {
                label for="label_id" class=(FORM_LABEL_STYLE) { "Label" }
                select id="label_id" name="label_id" required class=(FORM_SELECT_STYLE)
                {
                    @for label in labels {
                        option value=(label.id) { (label.name) }
                    }
                }
            }

            div
            {
                label for="total" class=(FORM_LABEL_STYLE) { "Total" }
                input
                    id="total"
                    type="number"
                    name="total"
                    step="1"
                    placeholder="Total"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Item" }
        }
    }
}

fn items_view(items: &[ItemTableRow], categories: &[Category], labels: &[Label]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ITEMS_VIEW).into_html();

    let table_row = |item: &ItemTableRow| {
        html!(
            tr id={ "item-" (item.id) } class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { time datetime=(item.date) { (item.date) } }
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (item.name)
                }
                td class=(TABLE_CELL_STYLE) { (item.label_name.as_deref().unwrap_or("-")) }
                td class=(TABLE_CELL_STYLE) { (item.category_name.as_deref().unwrap_or("-")) }
                td class="px-6 py-4 text-right" { (format_total(item.total)) }
                td class=(TABLE_CELL_STYLE)
                {
                    button
                        hx-delete=(item.delete_url)
                        hx-target-error="#alert-container"
                        class=(BUTTON_DELETE_STYLE)
                    {
                        "Delete"
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Items" }

                section class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Label" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class="px-6 py-3 text-right" { "Total" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for item in items {
                                (table_row(item))
                            }

                            @if items.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="6" class="px-6 py-8 text-center"
                                    {
                                        "No items yet. Add one below."
                                    }
                                }
                            }
                        }
                    }
                }

                section class="grid gap-8 lg:grid-cols-3"
                {
                    div
                    {
                        h2 class="font-semibold mb-2" { "Add Item" }
                        (item_form_view(categories, labels))
                    }
                    div
                    {
                        h2 class="font-semibold mb-2" { "Add Category" }
                        (category_form_view())
                    }
                    div
                    {
                        h2 class="font-semibold mb-2" { "Add Label" }
                        (label_form_view())
                    }
                }
            }
        }
    );

    base("Items", &content)
}

/// The state needed for the items page.
#[derive(Debug, Clone)]
pub struct ItemsPageState {
    /// The database connection for reading items, categories and labels.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ItemsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Route handler for the items listing page.
pub async fn get_items_page(State(state): State<ItemsPageState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let items = get_item_rows(&connection)?;
    let categories = get_all_categories(&connection)?;
    let labels = get_all_labels(&connection)?;

    Ok(items_view(&items, &categories, &labels).into_response())
}

/// The state needed for creating or deleting an item.
#[derive(Debug, Clone)]
pub struct ItemEndpointState {
    /// The database connection for managing items.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ItemEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating an item.
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemForm {
    /// When the transaction happened.
    pub date: Date,
    /// The ID of an existing category.
    pub category_id: DatabaseId,
    /// A text description of the transaction.
    pub name: String,
    /// The ID of an existing label.
    pub label_id: DatabaseId,
    /// The amount of money in the smallest currency unit.
    pub total: i64,
}

/// A route handler for creating a new item.
///
/// Responds with 201 on success and 400 when the description is empty or
/// the category/label ID does not refer to an existing row.
pub async fn create_item_endpoint(
    State(state): State<ItemEndpointState>,
    Form(form): Form<ItemForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_item(&form, &connection) {
        Ok(_) => (HxRefresh(true), StatusCode::CREATED).into_response(),
        Err(error @ (Error::EmptyItemName | Error::InvalidItemReference)) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("Could not create item with {form:?}, got an unexpected error: {error}");
            error.into_alert_response()
        }
    }
}

/// A route handler for deleting an item by ID.
///
/// Responds with 204 and an `HX-Refresh` header on success, and 404 when no
/// item has the given ID.
pub async fn delete_item_endpoint(
    Path(item_id): Path<DatabaseId>,
    State(state): State<ItemEndpointState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_item(item_id, &connection) {
        Ok(_) => (HxRefresh(true), StatusCode::NO_CONTENT).into_response(),
        Err(Error::DeleteMissingItem) => Error::DeleteMissingItem.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting item {item_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Create an item in the database.
///
/// # Errors
/// This function will return an error if the description is empty, if the
/// category or label ID does not exist, or if there is an SQL error.
pub fn create_item(form: &ItemForm, connection: &Connection) -> Result<Item, Error> {
    let name = form.name.trim();

    if name.is_empty() {
        return Err(Error::EmptyItemName);
    }

    connection.execute(
        "INSERT INTO item (date, name, category, label, total) VALUES (?1, ?2, ?3, ?4, ?5);",
        params![form.date, name, form.category_id, form.label_id, form.total],
    )?;

    let id = connection.last_insert_rowid();

    Ok(Item {
        id,
        date: form.date,
        name: name.to_owned(),
        category: Some(form.category_id),
        label: Some(form.label_id),
        total: form.total,
    })
}

/// Retrieve all items in the database.
///
/// The full table is scanned without paging, which is acceptable for the
/// small datasets this app manages.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn get_all_items(connection: &Connection) -> Result<Vec<Item>, Error> {
    connection
        .prepare("SELECT id, date, name, category, label, total FROM item ORDER BY id ASC;")?
        .query_map([], map_item_row)?
        .map(|maybe_item| maybe_item.map_err(|error| error.into()))
        .collect()
}

/// Delete an item from the database.
///
/// # Errors
/// This function will return [Error::DeleteMissingItem] if no item has the
/// given ID, or an error if there is an SQL error.
pub fn delete_item(item_id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM item WHERE id = ?1", [item_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingItem);
    }

    Ok(())
}

fn get_item_rows(connection: &Connection) -> Result<Vec<ItemTableRow>, Error> {
    connection
        .prepare(
            "SELECT i.id, i.date, i.name, c.name, l.name, i.total
            FROM item i
            LEFT JOIN category c ON i.category = c.id
            LEFT JOIN label l ON i.label = l.id
            ORDER BY i.id ASC;",
        )?
        .query_map([], |row| {
            let id = row.get(0)?;

            Ok(ItemTableRow {
                id,
                date: row.get(1)?,
                name: row.get(2)?,
                category_name: row.get(3)?,
                label_name: row.get(4)?,
                total: row.get(5)?,
                delete_url: format_endpoint(endpoints::DELETE_ITEM, id),
            })
        })?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// Create the item table if it does not exist.
///
/// The category and label references are nullable.
pub fn create_item_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS item (
            id INTEGER PRIMARY KEY,
            date TEXT NOT NULL,
            name TEXT NOT NULL,
            category INTEGER REFERENCES category(id),
            label INTEGER REFERENCES label(id),
            total INTEGER NOT NULL
        );",
        (),
    )?;

    Ok(())
}

fn map_item_row(row: &Row) -> Result<Item, rusqlite::Error> {
    Ok(Item {
        id: row.get(0)?,
        date: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        label: row.get(4)?,
        total: row.get(5)?,
    })
}

#[cfg(test)]
mod item_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        category::{CategoryName, create_category},
        db::initialize,
        label::{LabelName, create_label},
    };

    use super::{ItemForm, create_item, delete_item, get_all_items};

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("could not create tables");
        connection
    }

    fn test_form(connection: &Connection) -> ItemForm {
        let category = create_category(CategoryName::new_unchecked("Consumption"), connection)
            .expect("could not create test category");
        let label = create_label(LabelName::new_unchecked("Outcome"), connection)
            .expect("could not create test label");

        ItemForm {
            date: date!(2024 - 03 - 15),
            category_id: category.id,
            name: "Groceries".to_owned(),
            label_id: label.id,
            total: 4200,
        }
    }

    #[test]
    fn create_item_succeeds() {
        let connection = get_test_db_connection();
        let form = test_form(&connection);

        let item = create_item(&form, &connection).expect("could not create item");

        assert!(item.id > 0);
        assert_eq!(item.date, form.date);
        assert_eq!(item.name, "Groceries");
        assert_eq!(item.total, 4200);

        let items = get_all_items(&connection).unwrap();
        assert_eq!(items, vec![item]);
    }

    #[test]
    fn create_item_with_empty_name_fails() {
        let connection = get_test_db_connection();
        let mut form = test_form(&connection);
        form.name = "  ".to_owned();

        let result = create_item(&form, &connection);

        assert_eq!(result, Err(Error::EmptyItemName));
        assert!(get_all_items(&connection).unwrap().is_empty());
    }

    #[test]
    fn create_item_with_invalid_reference_fails() {
        let connection = get_test_db_connection();
        let mut form = test_form(&connection);
        form.category_id = 999;

        let result = create_item(&form, &connection);

        assert_eq!(result, Err(Error::InvalidItemReference));
        assert!(get_all_items(&connection).unwrap().is_empty());
    }

    #[test]
    fn delete_item_succeeds() {
        let connection = get_test_db_connection();
        let form = test_form(&connection);
        let item = create_item(&form, &connection).expect("could not create item");

        let result = delete_item(item.id, &connection);

        assert!(result.is_ok());
        assert!(get_all_items(&connection).unwrap().is_empty());
    }

    #[test]
    fn delete_item_with_invalid_id_fails_and_leaves_rows_unchanged() {
        let connection = get_test_db_connection();
        let form = test_form(&connection);
        let item = create_item(&form, &connection).expect("could not create item");

        let result = delete_item(item.id + 123, &connection);

        assert_eq!(result, Err(Error::DeleteMissingItem));
        assert_eq!(get_all_items(&connection).unwrap(), vec![item]);
    }
}

#[cfg(test)]
mod item_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        category::{CategoryName, create_category},
        db::initialize,
        label::{LabelName, create_label},
    };

    use super::{
        ItemEndpointState, ItemForm, create_item, create_item_endpoint, delete_item_endpoint,
        get_all_items,
    };

    fn get_test_state() -> ItemEndpointState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("could not create tables");

        ItemEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn insert_references(state: &ItemEndpointState) -> (i64, i64) {
        let connection = state.db_connection.lock().unwrap();
        let category = create_category(CategoryName::new_unchecked("Consumption"), &connection)
            .expect("could not create test category");
        let label = create_label(LabelName::new_unchecked("Outcome"), &connection)
            .expect("could not create test label");

        (category.id, label.id)
    }

    #[tokio::test]
    async fn create_item_returns_created() {
        let state = get_test_state();
        let (category_id, label_id) = insert_references(&state);
        let form = ItemForm {
            date: date!(2024 - 03 - 15),
            category_id,
            name: "Groceries".to_owned(),
            label_id,
            total: 4200,
        };

        let response = create_item_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::CREATED);

        let connection = state.db_connection.lock().unwrap();
        let items = get_all_items(&connection).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Groceries");
    }

    #[tokio::test]
    async fn create_item_with_bad_reference_returns_bad_request() {
        let state = get_test_state();
        let form = ItemForm {
            date: date!(2024 - 03 - 15),
            category_id: 1,
            name: "Groceries".to_owned(),
            label_id: 1,
            total: 4200,
        };

        let response = create_item_endpoint(State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_item_returns_no_content_and_refreshes() {
        let state = get_test_state();
        let (category_id, label_id) = insert_references(&state);
        let item = {
            let connection = state.db_connection.lock().unwrap();
            create_item(
                &ItemForm {
                    date: date!(2024 - 03 - 15),
                    category_id,
                    name: "Groceries".to_owned(),
                    label_id,
                    total: 4200,
                },
                &connection,
            )
            .expect("could not create item")
        };

        let response = delete_item_endpoint(Path(item.id), State(state.clone())).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response
                .headers()
                .get("hx-refresh")
                .expect("expected the hx-refresh header"),
            "true"
        );

        let connection = state.db_connection.lock().unwrap();
        assert!(get_all_items(&connection).unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_item_returns_not_found() {
        let state = get_test_state();

        let response = delete_item_endpoint(Path(999), State(state)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
