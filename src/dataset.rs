//! The flat-file storage gateway for the cashflow dataset.
//!
//! The dataset is a CSV file whose first five columns must be exactly
//! `Date,Desc,Label,Category,Total`, in that order. Parsed tables are
//! cached keyed by the file's last-modified timestamp, so any change to the
//! backing file (by any process) invalidates prior cached results.

use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::SystemTime,
};

use crate::Error;

/// The fixed, ordered column schema of the dataset file.
pub const REQUIRED_COLUMNS: [&str; 5] = ["Date", "Desc", "Label", "Category", "Total"];

/// An ordered table of text cells parsed from the dataset file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataTable {
    /// The header row.
    pub columns: Vec<String>,
    /// The data rows, in file order.
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Create an empty table with the required dataset columns.
    pub fn with_required_columns() -> Self {
        Self {
            columns: REQUIRED_COLUMNS.map(String::from).to_vec(),
            rows: Vec::new(),
        }
    }
}

/// Check that the first columns of `table` exactly equal the required
/// column sequence, in order.
///
/// This is a strict ordered prefix match, not a set comparison: extra
/// trailing columns are allowed, any reordering or omission is not.
pub fn validate_columns(table: &DataTable) -> bool {
    table.columns.len() >= REQUIRED_COLUMNS.len()
        && table
            .columns
            .iter()
            .take(REQUIRED_COLUMNS.len())
            .map(String::as_str)
            .eq(REQUIRED_COLUMNS)
}

/// Parse CSV bytes into a [DataTable].
///
/// An empty input produces an empty table with no columns.
///
/// # Errors
/// This function will return an [Error::InvalidCSV] if the bytes cannot be
/// parsed as CSV.
pub fn parse_table(reader: impl Read) -> Result<DataTable, Error> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let columns = csv_reader
        .headers()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?
        .iter()
        .map(str::to_owned)
        .collect();

    let rows = csv_reader
        .records()
        .map(|record| {
            record
                .map(|record| record.iter().map(str::to_owned).collect())
                .map_err(|error| Error::InvalidCSV(error.to_string()))
        })
        .collect::<Result<Vec<Vec<String>>, Error>>()?;

    Ok(DataTable { columns, rows })
}

/// Serialize `table` to UTF-8 comma-separated bytes for download.
///
/// The encoding is deterministic and preserves row order.
///
/// # Errors
/// This function will return an [Error::InvalidCSV] if a cell cannot be
/// written.
pub fn export_bytes(table: &DataTable) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    write_table(table, &mut writer)?;

    writer
        .into_inner()
        .map_err(|error| Error::InvalidCSV(error.to_string()))
}

fn write_table<W: io::Write>(table: &DataTable, writer: &mut csv::Writer<W>) -> Result<(), Error> {
    if !table.columns.is_empty() {
        writer
            .write_record(&table.columns)
            .map_err(|error| Error::InvalidCSV(error.to_string()))?;
    }

    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|error| Error::InvalidCSV(error.to_string()))?;
    }

    writer
        .flush()
        .map_err(|error| Error::DatasetIo(error.to_string()))?;

    Ok(())
}

struct CacheEntry {
    modified: SystemTime,
    table: Arc<DataTable>,
}

/// Reads and writes the flat-file cashflow dataset.
///
/// Cloning the store is cheap and clones share the parse cache.
#[derive(Clone)]
pub struct DatasetStore {
    path: PathBuf,
    cache: Arc<Mutex<Option<CacheEntry>>>,
}

impl std::fmt::Debug for DatasetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl DatasetStore {
    /// Create a dataset store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// The path of the backing dataset file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the dataset file exists on disk.
    pub fn file_exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the dataset.
    ///
    /// A missing file yields an empty table with the required columns. A
    /// present-but-empty file yields an empty table with no columns.
    /// Otherwise the parsed table is cached keyed by the file's
    /// last-modified timestamp and an unchanged timestamp returns the same
    /// cached table without re-reading the file.
    ///
    /// # Errors
    /// This function will return an error if the file cannot be read or is
    /// not valid CSV.
    pub fn load(&self) -> Result<Arc<DataTable>, Error> {
        let modified = match fs::metadata(&self.path) {
            Ok(metadata) => metadata
                .modified()
                .map_err(|error| Error::DatasetIo(error.to_string()))?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(Arc::new(DataTable::with_required_columns()));
            }
            Err(error) => return Err(Error::DatasetIo(error.to_string())),
        };

        let mut cache = self.cache.lock().map_err(|_| Error::DatasetLockError)?;

        if let Some(entry) = cache.as_ref()
            && entry.modified == modified
        {
            return Ok(Arc::clone(&entry.table));
        }

        let file = fs::File::open(&self.path).map_err(|error| Error::DatasetIo(error.to_string()))?;
        let table = Arc::new(parse_table(file)?);

        *cache = Some(CacheEntry {
            modified,
            table: Arc::clone(&table),
        });

        Ok(table)
    }

    /// Save `table` as a new dataset file.
    ///
    /// # Errors
    /// This function will return an [Error::DatasetExists] if the dataset
    /// file already exists; the existing file is never touched. This is the
    /// only write-conflict policy the app has.
    pub fn save(&self, table: &DataTable) -> Result<(), Error> {
        if self.file_exists() {
            return Err(Error::DatasetExists);
        }

        self.write(table)
    }

    /// Write `table` to the dataset file, replacing any existing content.
    ///
    /// This is the append path used by the cashflow page, which extends the
    /// dataset after the initial save instead of refusing to overwrite.
    ///
    /// # Errors
    /// This function will return an error if the file cannot be written.
    pub fn overwrite(&self, table: &DataTable) -> Result<(), Error> {
        self.write(table)
    }

    /// Remove the dataset file and drop the cache entry.
    ///
    /// # Errors
    /// This function will return an [Error::NotFound] if there is no
    /// dataset file to remove.
    pub fn delete(&self) -> Result<(), Error> {
        fs::remove_file(&self.path).map_err(|error| match error.kind() {
            io::ErrorKind::NotFound => Error::NotFound,
            _ => Error::DatasetIo(error.to_string()),
        })?;

        self.invalidate_cache()
    }

    fn write(&self, table: &DataTable) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|error| Error::DatasetIo(error.to_string()))?;
        }

        let file =
            fs::File::create(&self.path).map_err(|error| Error::DatasetIo(error.to_string()))?;
        let mut writer = csv::Writer::from_writer(file);

        write_table(table, &mut writer)?;

        self.invalidate_cache()
    }

    fn invalidate_cache(&self) -> Result<(), Error> {
        let mut cache = self.cache.lock().map_err(|_| Error::DatasetLockError)?;
        *cache = None;

        Ok(())
    }
}


#[cfg(test)]
mod dataset_store_tests {
    use std::{fs, sync::Arc};

    use crate::Error;

    use super::{DataTable, DatasetStore, REQUIRED_COLUMNS, export_bytes, parse_table};

    /// Create a store backed by a fresh file path in the system temp
    /// directory. Each test must use a distinct name.
    fn get_test_store(name: &str) -> DatasetStore {
        let mut path = std::env::temp_dir();
        path.push(format!("kakeibo-dataset-{}-{name}.csv", std::process::id()));
        let _ = fs::remove_file(&path);

        DatasetStore::new(path)
    }

    fn sample_table() -> DataTable {
        DataTable {
            columns: REQUIRED_COLUMNS.map(String::from).to_vec(),
            rows: vec![
                vec![
                    "2023-01-05".to_owned(),
                    "Rent".to_owned(),
                    "Outcome".to_owned(),
                    "Lifestyle".to_owned(),
                    "90000".to_owned(),
                ],
                vec![
                    "2023-02-01".to_owned(),
                    "Salary".to_owned(),
                    "Income".to_owned(),
                    "Consumption".to_owned(),
                    "250000".to_owned(),
                ],
            ],
        }
    }

    #[test]
    fn load_missing_file_returns_empty_table_with_required_columns() {
        let store = get_test_store("load-missing");

        let table = store.load().expect("load should not fail on a missing file");

        assert_eq!(table.columns, REQUIRED_COLUMNS.map(String::from).to_vec());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn load_empty_file_returns_table_with_no_columns() {
        let store = get_test_store("load-empty");
        fs::write(store.path(), "").unwrap();

        let table = store.load().expect("load should not fail on an empty file");

        assert!(table.columns.is_empty());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn load_parses_saved_table() {
        let store = get_test_store("load-roundtrip");
        let want = sample_table();
        store.save(&want).expect("could not save dataset");

        let got = store.load().expect("could not load dataset");

        assert_eq!(*got, want);
    }

    #[test]
    fn load_with_unchanged_timestamp_returns_cached_table() {
        let store = get_test_store("load-cache");
        store.save(&sample_table()).expect("could not save dataset");

        let first = store.load().expect("first load failed");
        let second = store.load().expect("second load failed");

        assert!(
            Arc::ptr_eq(&first, &second),
            "expected the second load to return the same cached table"
        );
    }

    #[test]
    fn save_refuses_to_overwrite_and_leaves_file_unchanged() {
        let store = get_test_store("save-conflict");
        store.save(&sample_table()).expect("could not save dataset");
        let bytes_before = fs::read(store.path()).unwrap();

        let result = store.save(&DataTable::with_required_columns());

        assert_eq!(result, Err(Error::DatasetExists));
        assert_eq!(fs::read(store.path()).unwrap(), bytes_before);
    }

    #[test]
    fn overwrite_replaces_existing_file() {
        let store = get_test_store("overwrite");
        store.save(&sample_table()).expect("could not save dataset");

        let mut extended = sample_table();
        extended.rows.push(vec![
            "2024-01-20".to_owned(),
            "Books".to_owned(),
            "Outcome".to_owned(),
            "Consumption".to_owned(),
            "3200".to_owned(),
        ]);
        store.overwrite(&extended).expect("could not overwrite dataset");

        let table = store.load().expect("could not load dataset");
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn delete_removes_the_file() {
        let store = get_test_store("delete");
        store.save(&sample_table()).expect("could not save dataset");

        store.delete().expect("could not delete dataset");

        assert!(!store.file_exists());
    }

    #[test]
    fn delete_missing_file_returns_not_found() {
        let store = get_test_store("delete-missing");

        assert_eq!(store.delete(), Err(Error::NotFound));
    }

    #[test]
    fn export_bytes_is_deterministic_and_preserves_row_order() {
        let table = sample_table();

        let bytes = export_bytes(&table).expect("could not export table");
        let text = String::from_utf8(bytes.clone()).unwrap();

        assert_eq!(
            text,
            "Date,Desc,Label,Category,Total\n\
            2023-01-05,Rent,Outcome,Lifestyle,90000\n\
            2023-02-01,Salary,Income,Consumption,250000\n"
        );
        assert_eq!(bytes, export_bytes(&table).unwrap());
    }

    #[test]
    fn export_then_parse_round_trips() {
        let want = sample_table();

        let bytes = export_bytes(&want).unwrap();
        let got = parse_table(bytes.as_slice()).expect("could not parse exported bytes");

        assert_eq!(got, want);
    }

    #[test]
    fn template_file_contains_exactly_the_required_header() {
        let store = get_test_store("template");

        store
            .save(&DataTable::with_required_columns())
            .expect("could not generate template");

        assert!(store.file_exists());
        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, "Date,Desc,Label,Category,Total\n");
    }
}
