use serde::{Deserialize, Serialize};

/// One extraction request from the dataset. `index` is the row's ordinal position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub index: usize,
    pub image_link: String,
    pub entity_name: String,
}

/// One output row: the prediction for the dataset row at `index`, or `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRecord {
    pub index: usize,
    pub predicted_value: String,
}

impl RowRecord {
    pub fn empty(index: usize) -> Self {
        Self { index, predicted_value: String::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.predicted_value.is_empty()
    }
}
