//! The data management page and the dataset API endpoints.
//!
//! Uploading, generating a template, downloading and deleting the flat-file
//! dataset all go through the [DatasetStore](crate::dataset::DatasetStore).
//! Upload and template generation refuse to overwrite an existing file.

use axum::{
    extract::{FromRef, Multipart, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_htmx::HxRefresh;
use maud::{Markup, html};

use crate::{
    AppState, Error,
    dataset::{DatasetStore, parse_table, validate_columns},
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, base,
    },
    navigation::NavBar,
};

/// The file name suggested to the browser when downloading the dataset.
const DOWNLOAD_FILE_NAME: &str = "finance.csv";

fn upload_form_view() -> Markup {
    html! {
        form
            hx-post=(endpoints::DATASET)
            hx-encoding="multipart/form-data"
            hx-target-error="#alert-container"
            class="space-y-4"
        {
            div
            {
                label for="dataset" class=(FORM_LABEL_STYLE) { "CSV file" }
                input
                    id="dataset"
                    type="file"
                    name="dataset"
                    accept=".csv,text/csv"
                    required
                    class="block w-full text-sm text-gray-900 border border-gray-300 \
                        rounded-lg cursor-pointer bg-gray-50 dark:text-gray-400 \
                        dark:bg-gray-700 dark:border-gray-600";
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Upload" }
        }
    }
}

fn data_view(store: &DatasetStore) -> Markup {
    let nav_bar = NavBar::new(endpoints::DATA_VIEW).into_html();
    let dataset_exists = store.file_exists();

    let status = if dataset_exists {
        html! {
            p
            {
                "A dataset file exists. "
                a href=(endpoints::DATASET_DOWNLOAD) class=(LINK_STYLE) { "Download it" }
                " or delete it below."
            }
        }
    } else {
        html! {
            p
            {
                "No dataset file exists yet. \
                Upload a CSV file or generate an empty template."
            }
        }
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full max-w-xl"
            {
                h1 class="text-xl font-bold" { "Manage Data" }

                (status)

                @if dataset_exists {
                    section
                    {
                        h2 class="font-semibold mb-2" { "Delete dataset" }
                        button
                            hx-delete=(endpoints::DATASET)
                            hx-target-error="#alert-container"
                            hx-confirm="Delete the dataset file? This cannot be undone."
                            class=(BUTTON_DELETE_STYLE)
                        {
                            "Delete"
                        }
                    }
                } @else {
                    section
                    {
                        h2 class="font-semibold mb-2" { "Upload a dataset" }
                        (upload_form_view())
                    }

                    section
                    {
                        h2 class="font-semibold mb-2" { "Generate a template" }
                        button
                            hx-post=(endpoints::DATASET_TEMPLATE)
                            hx-target-error="#alert-container"
                            class=(BUTTON_SECONDARY_STYLE)
                        {
                            "Generate"
                        }
                    }
                }
            }
        }
    );

    base("Manage Data", &content)
}

/// The state needed for the data management page and the dataset API.
#[derive(Debug, Clone)]
pub struct ManageDataState {
    /// The store for the flat-file dataset.
    pub dataset: DatasetStore,
}

impl FromRef<AppState> for ManageDataState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            dataset: state.dataset.clone(),
        }
    }
}

/// Route handler for the data management page.
pub async fn get_data_page(State(state): State<ManageDataState>) -> Response {
    data_view(&state.dataset).into_response()
}

fn is_csv_upload(field: &axum::extract::multipart::Field<'_>) -> bool {
    if let Some(content_type) = field.content_type()
        && content_type == "text/csv"
    {
        return true;
    }

    if let Some(file_name) = field.file_name()
        && file_name.to_lowercase().ends_with(".csv")
    {
        return true;
    }

    false
}

async fn read_uploaded_table(multipart: &mut Multipart) -> Result<Vec<u8>, Error> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?
    {
        if field.name() != Some("dataset") {
            continue;
        }

        if !is_csv_upload(&field) {
            return Err(Error::NotCSV);
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|error| Error::MultipartError(error.to_string()))?;

        return Ok(bytes.to_vec());
    }

    Err(Error::MultipartError(
        "the upload did not contain a \"dataset\" field".to_owned(),
    ))
}

/// A route handler for uploading a CSV dataset.
///
/// Responds with 201 on success, 400 if the file is not a CSV or its
/// columns do not match the required schema, and 409 if a dataset file
/// already exists.
pub async fn upload_dataset_endpoint(
    State(state): State<ManageDataState>,
    mut multipart: Multipart,
) -> Response {
    let result = async {
        let bytes = read_uploaded_table(&mut multipart).await?;
        let table = parse_table(bytes.as_slice())?;

        if !validate_columns(&table) {
            return Err(Error::InvalidDatasetColumns);
        }

        state.dataset.save(&table)
    }
    .await;

    match result {
        Ok(()) => (HxRefresh(true), StatusCode::CREATED).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for generating an empty dataset template.
///
/// Writes a file containing only the required column header. Responds with
/// 201 on success and 409 if a dataset file already exists.
pub async fn generate_template_endpoint(State(state): State<ManageDataState>) -> Response {
    match state.dataset.save(&crate::dataset::DataTable::with_required_columns()) {
        Ok(()) => (HxRefresh(true), StatusCode::CREATED).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for deleting the dataset file.
///
/// Responds with 204 on success and 404 if no dataset file exists.
pub async fn delete_dataset_endpoint(State(state): State<ManageDataState>) -> Response {
    match state.dataset.delete() {
        Ok(()) => (HxRefresh(true), StatusCode::NO_CONTENT).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for downloading the dataset as a CSV attachment.
///
/// Responds with 404 if no dataset file exists.
pub async fn download_dataset_endpoint(
    State(state): State<ManageDataState>,
) -> Result<Response, Error> {
    if !state.dataset.file_exists() {
        return Err(Error::NotFound);
    }

    let table = state.dataset.load()?;
    let bytes = crate::dataset::export_bytes(&table)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
