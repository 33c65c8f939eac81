//! The dashboard page shown at the root route.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_total,
    },
    navigation::NavBar,
};

/// The number of rows in each relational table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TableCounts {
    categories: i64,
    labels: i64,
    items: i64,
}

/// The sum of item totals for one label.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LabelTotal {
    label_name: Option<String>,
    total: i64,
}

fn get_table_counts(connection: &Connection) -> Result<TableCounts, Error> {
    let count = |table: &str| -> Result<i64, rusqlite::Error> {
        connection.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
            row.get(0)
        })
    };

    Ok(TableCounts {
        categories: count("category")?,
        labels: count("label")?,
        items: count("item")?,
    })
}

fn get_label_totals(connection: &Connection) -> Result<Vec<LabelTotal>, Error> {
    connection
        .prepare(
            "SELECT label.name, SUM(item.total)
                FROM item
                LEFT JOIN label ON item.label = label.id
                GROUP BY label.name
                ORDER BY label.name ASC;",
        )?
        .query_map([], |row| {
            Ok(LabelTotal {
                label_name: row.get(0)?,
                total: row.get::<usize, Option<i64>>(1)?.unwrap_or_default(),
            })
        })?
        .map(|label_total| label_total.map_err(Error::from))
        .collect()
}

fn dashboard_view(app_title: &str, counts: TableCounts, label_totals: &[LabelTotal]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROOT).into_html();

    let stat_card = |label: &str, value: i64, url: &str| {
        html!(
            a
                href=(url)
                class="block p-6 bg-white border border-gray-200 rounded-lg \
                    shadow-sm hover:bg-gray-100 dark:bg-gray-800 \
                    dark:border-gray-700 dark:hover:bg-gray-700"
            {
                p class="text-3xl font-bold" { (value) }
                p class="text-gray-500 dark:text-gray-400" { (label) }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full max-w-3xl"
            {
                h1 class="text-xl font-bold" { "Welcome to " (app_title) }

                div class="grid grid-cols-1 sm:grid-cols-3 gap-4"
                {
                    (stat_card("Items", counts.items, endpoints::ITEMS_VIEW))
                    (stat_card("Categories", counts.categories, endpoints::ITEMS_VIEW))
                    (stat_card("Labels", counts.labels, endpoints::ITEMS_VIEW))
                }

                section
                {
                    h2 class="font-semibold mb-2" { "Totals by label" }

                    @if label_totals.is_empty() {
                        p
                        {
                            "No items yet. Head over to the "
                            a href=(endpoints::ITEMS_VIEW) class=(LINK_STYLE) { "items page" }
                            " to add some."
                        }
                    } @else {
                        table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Label" }
                                    th scope="col" class="px-6 py-3 text-right" { "Total" }
                                }
                            }

                            tbody
                            {
                                @for label_total in label_totals {
                                    tr class=(TABLE_ROW_STYLE)
                                    {
                                        td class=(TABLE_CELL_STYLE)
                                        {
                                            @match &label_total.label_name {
                                                Some(name) => { (name) }
                                                None => { em { "Unlabelled" } }
                                            }
                                        }
                                        td class="px-6 py-4 text-right"
                                        {
                                            (format_total(label_total.total))
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Dashboard", &content)
}

/// The state needed for the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The connection to the SQLite database.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The display title of the application.
    pub app_title: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            app_title: state.app_title.clone(),
        }
    }
}

/// Route handler for the dashboard page.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let counts = get_table_counts(&connection)?;
    let label_totals = get_label_totals(&connection)?;

    Ok(dashboard_view(&state.app_title, counts, &label_totals).into_response())
}
