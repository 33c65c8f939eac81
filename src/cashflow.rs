//! Loading, filtering and extending the flat-file cashflow dataset.
//!
//! This module turns the raw [DataTable](crate::dataset::DataTable) into
//! typed rows (coercing the `Date` column with year-first parsing), filters
//! them by a [Month] token and appends new rows from the cashflow page.

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRefresh;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error,
    alert::Alert,
    dataset::{DataTable, DatasetStore, REQUIRED_COLUMNS},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, format_total,
    },
    month::Month,
    navigation::NavBar,
};

/// The fixed spending categories offered by the cashflow add form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionCategory {
    /// Day-to-day consumption.
    Consumption,
    /// Recurring lifestyle costs.
    Lifestyle,
}

impl TransactionCategory {
    /// The ordered options offered by the category select.
    pub const OPTIONS: [TransactionCategory; 2] =
        [TransactionCategory::Consumption, TransactionCategory::Lifestyle];

    /// The display name of the category.
    pub fn name(self) -> &'static str {
        match self {
            TransactionCategory::Consumption => "Consumption",
            TransactionCategory::Lifestyle => "Lifestyle",
        }
    }

    /// Look up a category by its display name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::OPTIONS.into_iter().find(|option| option.name() == name)
    }
}

/// The direction of a cashflow entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionLabel {
    /// Money going out.
    Outcome,
    /// Money coming in.
    Income,
    /// Money set aside.
    Savings,
}

impl TransactionLabel {
    /// The ordered options offered by the label select.
    pub const OPTIONS: [TransactionLabel; 3] = [
        TransactionLabel::Outcome,
        TransactionLabel::Income,
        TransactionLabel::Savings,
    ];

    /// The display name of the label.
    pub fn name(self) -> &'static str {
        match self {
            TransactionLabel::Outcome => "Outcome",
            TransactionLabel::Income => "Income",
            TransactionLabel::Savings => "Savings",
        }
    }

    /// Look up a label by its display name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::OPTIONS.into_iter().find(|option| option.name() == name)
    }
}

/// One typed row of the cashflow dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashflowRow {
    /// When the transaction happened.
    pub date: Date,
    /// A text description of the transaction.
    pub description: String,
    /// The cash-flow direction, e.g., 'Outcome'.
    pub label: String,
    /// The spending category, e.g., 'Consumption'.
    pub category: String,
    /// The amount of money in the smallest currency unit.
    pub total: i64,
}

const DASHED_DATE: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
const SLASHED_DATE: &[BorrowedFormatItem] = format_description!("[year]/[month]/[day]");

/// Parse a textual date with year-first ambiguity resolution: the leading
/// numeric group is interpreted as the year before month and day.
///
/// # Errors
/// This function will return an [Error::InvalidDate] if `text` matches
/// neither `YYYY-MM-DD` nor `YYYY/MM/DD`.
pub fn parse_year_first_date(text: &str) -> Result<Date, Error> {
    Date::parse(text, &DASHED_DATE)
        .or_else(|_| Date::parse(text, &SLASHED_DATE))
        .map_err(|_| Error::InvalidDate(text.to_owned()))
}

/// Load the cashflow dataset and coerce its `Date` column into calendar
/// dates.
///
/// A missing dataset file yields an empty row list.
///
/// # Errors
/// This function will return an error if the dataset cannot be read, if a
/// row is shorter than the required columns, if a date cannot be parsed
/// year-first, or if a total is not an integer.
pub fn load(store: &DatasetStore) -> Result<Vec<CashflowRow>, Error> {
    let table = store.load()?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            if row.len() < REQUIRED_COLUMNS.len() {
                return Err(Error::InvalidCSV(format!(
                    "row {index} has {} columns, expected at least {}",
                    row.len(),
                    REQUIRED_COLUMNS.len()
                )));
            }

            let total = row[4].parse().map_err(|_| {
                Error::InvalidCSV(format!(
                    "could not parse \"{}\" as an integer total on row {index}",
                    row[4]
                ))
            })?;

            Ok(CashflowRow {
                date: parse_year_first_date(&row[0])?,
                description: row[1].clone(),
                label: row[2].clone(),
                category: row[3].clone(),
                total,
            })
        })
        .collect()
}

/// Keep only the rows whose date falls in `month`, across any year.
///
/// [Month::All] returns a full copy of the input. Filtering is by
/// month-of-year only: multi-year datasets are not disambiguated by year.
pub fn filter_by_month(rows: &[CashflowRow], month: Month) -> Vec<CashflowRow> {
    rows.iter()
        .filter(|row| month.matches(row.date))
        .cloned()
        .collect()
}

/// Append one row to the dataset and persist the whole table.
///
/// The row is built by zipping the required column schema against the
/// supplied values positionally. Unlike uploads and template generation,
/// this path extends an existing dataset file instead of refusing to
/// overwrite it.
///
/// # Errors
/// This function will return an error if the dataset cannot be read or
/// written.
pub fn add_row(
    store: &DatasetStore,
    date: Date,
    description: &str,
    label: TransactionLabel,
    category: TransactionCategory,
    total: i64,
) -> Result<(), Error> {
    let mut table = DataTable::clone(&*store.load()?);

    if table.columns.is_empty() {
        table.columns = REQUIRED_COLUMNS.map(String::from).to_vec();
    }

    let values = [
        date.to_string(),
        description.to_owned(),
        label.name().to_owned(),
        category.name().to_owned(),
        total.to_string(),
    ];
    let row = REQUIRED_COLUMNS
        .iter()
        .zip(values)
        .map(|(_, value)| value)
        .collect();

    table.rows.push(row);

    store.overwrite(&table)
}

/// The form data for adding a cashflow row.
///
/// The selects submit empty strings when nothing is chosen, so everything
/// except the date arrives as optional text and is validated explicitly.
#[derive(Debug, Serialize, Deserialize)]
pub struct CashflowFormData {
    /// When the transaction happened.
    pub date: Date,
    /// A text description of the transaction.
    pub description: String,
    /// The selected label name.
    pub label: Option<String>,
    /// The selected category name.
    pub category: Option<String>,
    /// The amount of money as entered.
    pub total: Option<String>,
}

/// The fields extracted from a valid add form.
#[derive(Debug, PartialEq)]
pub struct ValidatedRow {
    /// The trimmed description text.
    pub description: String,
    /// The selected label.
    pub label: TransactionLabel,
    /// The selected category.
    pub category: TransactionCategory,
    /// The amount of money as a positive integer.
    pub total: i64,
}

/// Check the add form, returning the parsed fields or the names of the
/// missing and invalid ones.
///
/// Mirrors the dataset invariants: description non-empty, label and
/// category drawn from the fixed option sets, total a positive integer.
pub fn validate_form_inputs(form: &CashflowFormData) -> Result<ValidatedRow, Vec<&'static str>> {
    let mut missing_fields = Vec::new();

    let description = form.description.trim();
    if description.is_empty() {
        missing_fields.push("Description");
    }

    let label = form.label.as_deref().and_then(TransactionLabel::from_name);
    if label.is_none() {
        missing_fields.push("Label");
    }

    let category = form
        .category
        .as_deref()
        .and_then(TransactionCategory::from_name);
    if category.is_none() {
        missing_fields.push("Category");
    }

    let total = form
        .total
        .as_deref()
        .and_then(|total| total.parse::<i64>().ok())
        .filter(|total| *total > 0);
    if total.is_none() {
        missing_fields.push("Total");
    }

    match (label, category, total) {
        (Some(label), Some(category), Some(total)) if missing_fields.is_empty() => {
            Ok(ValidatedRow {
                description: description.to_owned(),
                label,
                category,
                total,
            })
        }
        _ => Err(missing_fields),
    }
}

fn add_row_form_view() -> Markup {
    html! {
        form
            hx-post=(endpoints::CASHFLOW_VIEW)
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
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                input
                    id="description"
                    type="text"
                    name="description"
                    placeholder="Enter description"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="label" class=(FORM_LABEL_STYLE) { "Label" }
                select id="label" name="label" class=(FORM_SELECT_STYLE)
                {
                    option value="" selected { "Select a label" }
                    @for label in TransactionLabel::OPTIONS {
                        option value=(label.name()) { (label.name()) }
                    }
                }
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                select id="category" name="category" class=(FORM_SELECT_STYLE)
                {
                    option value="" selected { "Select a category" }
                    @for category in TransactionCategory::OPTIONS {
                        option value=(category.name()) { (category.name()) }
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
                    min="0"
                    step="1"
                    placeholder="Enter total"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
        }
    }
}

fn month_filter_view(selected: Month) -> Markup {
    html! {
        form method="get" action=(endpoints::CASHFLOW_VIEW) class="flex items-end gap-2"
        {
            div
            {
                label for="month" class=(FORM_LABEL_STYLE) { "Month Filter" }
                select id="month" name="month" class=(FORM_SELECT_STYLE)
                {
                    @for month in Month::OPTIONS {
                        option value=(month.name()) selected[month == selected] {
                            (month.name())
                        }
                    }
                }
            }

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Filter" }
        }
    }
}

fn cashflow_view(rows: &[CashflowRow], selected_month: Month) -> Markup {
    let nav_bar = NavBar::new(endpoints::CASHFLOW_VIEW).into_html();

    let table_row = |row: &CashflowRow| {
        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { time datetime=(row.date) { (row.date) } }
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (row.description)
                }
                td class=(TABLE_CELL_STYLE) { (row.label) }
                td class=(TABLE_CELL_STYLE) { (row.category) }
                td class="px-6 py-4 text-right" { (format_total(row.total)) }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Cashflow" }

                    (month_filter_view(selected_month))
                }

                p
                {
                    "Overview of income, expenses, and savings. \
                    Filter transactions by month and add new data."
                }

                section class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Desc" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Label" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class="px-6 py-3 text-right" { "Total" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (table_row(row))
                            }

                            @if rows.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="5" class="px-6 py-8 text-center"
                                    {
                                        "No transactions for this filter."
                                    }
                                }
                            }
                        }
                    }
                }

                section class="max-w-md"
                {
                    h2 class="font-semibold mb-2" { "Add a new transaction" }
                    (add_row_form_view())
                }
            }
        }
    );

    base("Cashflow", &content)
}

/// The state needed for the cashflow page and its add endpoint.
#[derive(Debug, Clone)]
pub struct CashflowState {
    /// The store for the flat-file dataset.
    pub dataset: DatasetStore,
}

impl FromRef<AppState> for CashflowState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            dataset: state.dataset.clone(),
        }
    }
}

/// The query parameters accepted by the cashflow page.
#[derive(Debug, Deserialize)]
pub struct CashflowQuery {
    /// The selected month token, defaults to "All".
    pub month: Option<String>,
}

/// Route handler for the cashflow page with an optional month filter.
pub async fn get_cashflow_page(
    Query(query): Query<CashflowQuery>,
    State(state): State<CashflowState>,
) -> Result<Response, Error> {
    // Infallible: unknown tokens parse as Month::All.
    let month = query
        .month
        .as_deref()
        .unwrap_or(Month::All.name())
        .parse()
        .unwrap_or(Month::All);

    let rows = load(&state.dataset)?;
    let rows = filter_by_month(&rows, month);

    Ok(cashflow_view(&rows, month).into_response())
}

/// A route handler for appending a row to the cashflow dataset.
///
/// Responds with 201 on success and 400 listing the missing fields when
/// validation fails.
pub async fn create_cashflow_row_endpoint(
    State(state): State<CashflowState>,
    Form(form): Form<CashflowFormData>,
) -> Response {
    let row = match validate_form_inputs(&form) {
        Ok(row) => row,
        Err(missing_fields) => {
            return (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Please fill in the following fields".to_owned(),
                    details: missing_fields.join(", "),
                }
                .into_html(),
            )
                .into_response();
        }
    };

    match add_row(
        &state.dataset,
        form.date,
        &row.description,
        row.label,
        row.category,
        row.total,
    ) {
        Ok(()) => (HxRefresh(true), StatusCode::CREATED).into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while adding a cashflow row: {error}");
            error.into_alert_response()
        }
    }
}


#[cfg(test)]
mod filter_tests {
    use time::macros::date;

    use crate::month::Month;

    use super::{CashflowRow, filter_by_month};

    fn sample_rows() -> Vec<CashflowRow> {
        vec![
            CashflowRow {
                date: date!(2023 - 01 - 05),
                description: "Rent".to_owned(),
                label: "Outcome".to_owned(),
                category: "Lifestyle".to_owned(),
                total: 90000,
            },
            CashflowRow {
                date: date!(2024 - 01 - 20),
                description: "Books".to_owned(),
                label: "Outcome".to_owned(),
                category: "Consumption".to_owned(),
                total: 3200,
            },
            CashflowRow {
                date: date!(2023 - 02 - 01),
                description: "Salary".to_owned(),
                label: "Income".to_owned(),
                category: "Consumption".to_owned(),
                total: 250000,
            },
        ]
    }

    #[test]
    fn all_token_returns_full_copy() {
        let rows = sample_rows();

        let filtered = filter_by_month(&rows, Month::All);

        assert_eq!(filtered, rows);
    }

    #[test]
    fn unrecognized_token_parses_as_all_and_returns_full_copy() {
        let rows = sample_rows();
        let month: Month = "NotAMonth".parse().unwrap();

        let filtered = filter_by_month(&rows, month);

        assert_eq!(filtered, rows);
    }

    #[test]
    fn month_filter_matches_across_years() {
        let rows = sample_rows();

        let filtered = filter_by_month(&rows, Month::January);

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].description, "Rent");
        assert_eq!(filtered[1].description, "Books");
    }
}


#[cfg(test)]
mod form_validation_tests {
    use time::macros::date;

    use super::{
        CashflowFormData, TransactionCategory, TransactionLabel, ValidatedRow,
        validate_form_inputs,
    };

    fn valid_form() -> CashflowFormData {
        CashflowFormData {
            date: date!(2024 - 03 - 15),
            description: "  Groceries ".to_owned(),
            label: Some("Outcome".to_owned()),
            category: Some("Consumption".to_owned()),
            total: Some("4200".to_owned()),
        }
    }

    #[test]
    fn valid_form_parses_into_trimmed_fields() {
        assert_eq!(
            validate_form_inputs(&valid_form()),
            Ok(ValidatedRow {
                description: "Groceries".to_owned(),
                label: TransactionLabel::Outcome,
                category: TransactionCategory::Consumption,
                total: 4200,
            })
        );
    }

    #[test]
    fn empty_form_lists_every_field() {
        let form = CashflowFormData {
            date: date!(2024 - 03 - 15),
            description: "  ".to_owned(),
            label: None,
            category: None,
            total: None,
        };

        assert_eq!(
            validate_form_inputs(&form),
            Err(vec!["Description", "Label", "Category", "Total"])
        );
    }

    #[test]
    fn unknown_label_counts_as_missing() {
        let mut form = valid_form();
        form.label = Some("Sideways".to_owned());

        assert_eq!(validate_form_inputs(&form), Err(vec!["Label"]));
    }

    #[test]
    fn non_positive_total_counts_as_missing() {
        let mut form = valid_form();
        form.total = Some("0".to_owned());

        assert_eq!(validate_form_inputs(&form), Err(vec!["Total"]));
    }
}
