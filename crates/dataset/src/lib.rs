use labelscan_core::{DatasetRow, RowRecord};
use serde::Deserialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

pub const IMAGE_LINK_COLUMN: &str = "image_link";
pub const ENTITY_NAME_COLUMN: &str = "entity_name";

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

/// The columns we need; anything else in the file is ignored.
#[derive(Debug, Deserialize)]
struct InputRow {
    image_link: String,
    entity_name: String,
}

/// Read dataset rows from CSV with a header row. Columns are located by name
/// and each row's index is its 0-based position among the data rows.
pub fn read_dataset<R: Read>(data: R) -> Result<Vec<DatasetRow>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    for required in [IMAGE_LINK_COLUMN, ENTITY_NAME_COLUMN] {
        if !headers.iter().any(|h| h == required) {
            return Err(DatasetError::MissingColumn(required.to_string()));
        }
    }

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<InputRow>().enumerate() {
        let row = result?;
        rows.push(DatasetRow { index, image_link: row.image_link, entity_name: row.entity_name });
    }
    Ok(rows)
}

pub fn load_dataset(path: impl AsRef<Path>) -> Result<Vec<DatasetRow>, DatasetError> {
    let path = path.as_ref();
    let rows = read_dataset(File::open(path)?)?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "loaded dataset");
    Ok(rows)
}

/// Write `index,predicted_value` rows. Empty predictions are written as empty fields.
pub fn write_predictions<W: Write>(out: W, records: &[RowRecord]) -> Result<(), DatasetError> {
    let mut writer = csv::Writer::from_writer(out);
    if records.is_empty() {
        writer.write_record(["index", "predicted_value"])?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_predictions(path: impl AsRef<Path>, records: &[RowRecord]) -> Result<(), DatasetError> {
    write_predictions(File::create(path.as_ref())?, records)
}
