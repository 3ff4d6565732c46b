use labelscan_core::{DatasetRow, EntityError, EntityKind, ExtractionOutcome, RowRecord};
use thiserror::Error;
use tracing::{debug, warn};

use crate::extract::{Extractor, SelectionPolicy};
use crate::fetch::{FetchError, ImageFetcher};
use crate::preprocess::{self, DecodeError, EnhanceOptions, Raster};
use crate::recognizer::{OcrBackend, OcrError, TextRecognizer};

#[derive(Debug, Error)]
pub enum RowError {
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error("Image fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Image decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// How a processed row ended, for batch bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Extracted,
    /// Processed fine but nothing qualified.
    Empty,
    /// An error was caught and reported; the prediction is empty.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedRow {
    pub record: RowRecord,
    pub status: RowStatus,
}

/// Orchestrates: fetch → decode → enhance → recognize → match → select.
///
/// Holds the one recognizer instance for the whole batch.
pub struct RowPipeline<F: ImageFetcher, B: OcrBackend> {
    fetcher: F,
    recognizer: TextRecognizer<B>,
    enhance: EnhanceOptions,
    policy: SelectionPolicy,
}

impl<F: ImageFetcher, B: OcrBackend> RowPipeline<F, B> {
    pub fn new(fetcher: F, recognizer: TextRecognizer<B>) -> Self {
        Self {
            fetcher,
            recognizer,
            enhance: EnhanceOptions::default(),
            policy: SelectionPolicy::default(),
        }
    }

    pub fn with_enhance_options(mut self, enhance: EnhanceOptions) -> Self {
        self.enhance = enhance;
        self
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn recognizer(&self) -> &TextRecognizer<B> {
        &self.recognizer
    }

    /// Process one row. Never fails: any error is logged with the row's image
    /// link and turned into an empty prediction.
    pub async fn process_row(&mut self, row: &DatasetRow) -> ProcessedRow {
        match self.extract_row(row).await {
            Ok(outcome) => {
                let status = match &outcome {
                    ExtractionOutcome::Found(v) => {
                        debug!(index = row.index, value = %v, "extracted");
                        RowStatus::Extracted
                    }
                    ExtractionOutcome::NoMatch => {
                        debug!(index = row.index, entity = %row.entity_name, "no detection");
                        RowStatus::Empty
                    }
                    ExtractionOutcome::UnsupportedUnit { raw_unit } => {
                        debug!(index = row.index, entity = %row.entity_name, raw_unit = %raw_unit, "unit not allowed");
                        RowStatus::Empty
                    }
                };
                ProcessedRow {
                    record: RowRecord { index: row.index, predicted_value: outcome.into_prediction() },
                    status,
                }
            }
            Err(e) => {
                warn!(index = row.index, image_link = %row.image_link, error = %e, "Error processing image");
                ProcessedRow { record: RowRecord::empty(row.index), status: RowStatus::Failed }
            }
        }
    }

    /// The fallible part of `process_row`.
    pub async fn extract_row(&mut self, row: &DatasetRow) -> Result<ExtractionOutcome, RowError> {
        let kind: EntityKind = row.entity_name.parse()?;
        let bytes = self.fetcher.fetch(&row.image_link).await?;
        let image = preprocess::decode_image(&bytes)?;
        let text = self.recognize(Raster::from_dynamic(&image))?;
        Ok(Extractor::extract(&text, kind, self.policy))
    }

    /// Enhance a decoded raster and run it through the recognizer.
    pub fn recognize(&mut self, raster: Raster) -> Result<String, OcrError> {
        let target = self.recognizer.channel_order();
        let enhanced = preprocess::enhance(raster, &self.enhance, target);
        self.recognizer.read_text(&enhanced)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::recognizer::{ConfusableScope, MockRecognizer};
    use async_trait::async_trait;
    use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
    use std::io::Cursor;

    pub(crate) fn tiny_png() -> Vec<u8> {
        let img: GrayImage = ImageBuffer::from_fn(4, 4, |_, _| Luma([200u8]));
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    /// Serves a tiny PNG for every link except those listed as failing.
    pub(crate) struct StubFetcher {
        pub failing: Vec<String>,
        pub garbage: Vec<String>,
    }

    impl StubFetcher {
        pub(crate) fn ok() -> Self {
            Self { failing: vec![], garbage: vec![] }
        }
    }

    #[async_trait]
    impl ImageFetcher for StubFetcher {
        async fn fetch(&self, link: &str) -> Result<Vec<u8>, FetchError> {
            if self.failing.iter().any(|l| l == link) {
                return Err(FetchError::Connection(format!("refused: {link}")));
            }
            if self.garbage.iter().any(|l| l == link) {
                return Ok(b"<html>not found</html>".to_vec());
            }
            Ok(tiny_png())
        }
    }

    pub(crate) fn small_enhance() -> EnhanceOptions {
        EnhanceOptions { output_width: 32, output_height: 32, ..EnhanceOptions::default() }
    }

    fn pipeline(
        fetcher: StubFetcher,
        lines: &[&str],
    ) -> RowPipeline<StubFetcher, MockRecognizer> {
        let recognizer = TextRecognizer::new(MockRecognizer::new(lines.iter().copied()), ConfusableScope::default());
        RowPipeline::new(fetcher, recognizer).with_enhance_options(small_enhance())
    }

    fn row(index: usize, link: &str, entity: &str) -> DatasetRow {
        DatasetRow { index, image_link: link.to_string(), entity_name: entity.to_string() }
    }

    #[tokio::test]
    async fn label_text_yields_weight_and_width() {
        let mut p = pipeline(StubFetcher::ok(), &["Net Wt: 2.5kg,", "Size: 30cm x 1O cm"]);

        let weight = p.process_row(&row(0, "http://img/1.jpg", "item_weight")).await;
        assert_eq!(weight.record.predicted_value, "2.5 kilogram");
        assert_eq!(weight.status, RowStatus::Extracted);

        let width = p.process_row(&row(1, "http://img/1.jpg", "width")).await;
        assert_eq!(width.record.predicted_value, "30 centimetre");
    }

    #[tokio::test]
    async fn fetch_failure_is_an_empty_failed_row() {
        let fetcher = StubFetcher { failing: vec!["http://img/bad.jpg".into()], garbage: vec![] };
        let mut p = pipeline(fetcher, &["500g"]);
        let out = p.process_row(&row(3, "http://img/bad.jpg", "item_weight")).await;
        assert_eq!(out.record, RowRecord::empty(3));
        assert_eq!(out.status, RowStatus::Failed);
    }

    #[tokio::test]
    async fn undecodable_bytes_are_a_decode_error() {
        let fetcher = StubFetcher { failing: vec![], garbage: vec!["http://img/html".into()] };
        let mut p = pipeline(fetcher, &["500g"]);
        let err = p.extract_row(&row(0, "http://img/html", "item_weight")).await.unwrap_err();
        assert!(matches!(err, RowError::Decode(_)));
    }

    #[tokio::test]
    async fn unknown_entity_fails_before_fetching() {
        let fetcher = StubFetcher { failing: vec!["http://img/1.jpg".into()], garbage: vec![] };
        let mut p = pipeline(fetcher, &["500g"]);
        let err = p.extract_row(&row(0, "http://img/1.jpg", "shelf_life")).await.unwrap_err();
        assert!(matches!(err, RowError::Entity(_)));
    }

    #[tokio::test]
    async fn no_text_is_no_match() {
        let mut p = pipeline(StubFetcher::ok(), &[]);
        let outcome = p.extract_row(&row(0, "http://img/1.jpg", "voltage")).await.unwrap();
        assert_eq!(outcome, ExtractionOutcome::NoMatch);
        let out = p.process_row(&row(0, "http://img/1.jpg", "voltage")).await;
        assert_eq!(out.status, RowStatus::Empty);
    }

    #[tokio::test]
    async fn policy_is_applied() {
        let mut p = pipeline(StubFetcher::ok(), &["Box 20 cm tall, width: 45 cm"])
            .with_policy(SelectionPolicy::ClosestToKeyword);
        let out = p.process_row(&row(0, "http://img/1.jpg", "width")).await;
        assert_eq!(out.record.predicted_value, "45 centimetre");
    }

    #[tokio::test]
    async fn misread_zeros_before_a_unit_are_corrected() {
        let mut p = pipeline(StubFetcher::ok(), &["NET WT 1OOg"]);
        let out = p.process_row(&row(0, "http://img/1.jpg", "item_weight")).await;
        assert_eq!(out.record.predicted_value, "100 gram");

        let mut p = pipeline(StubFetcher::ok(), &["5OOml"]);
        let out = p.process_row(&row(1, "http://img/1.jpg", "item_volume")).await;
        assert_eq!(out.record.predicted_value, "500 millilitre");
    }

    #[tokio::test]
    async fn digit_adjacent_scope_keeps_ounces() {
        let recognizer = TextRecognizer::new(
            MockRecognizer::new(["NET WT 1O oz (283g)"]),
            ConfusableScope::DigitAdjacent,
        );
        let mut p = RowPipeline::new(StubFetcher::ok(), recognizer).with_enhance_options(small_enhance());
        let out = p.process_row(&row(0, "http://img/1.jpg", "item_weight")).await;
        assert_eq!(out.record.predicted_value, "10 ounce");

        let recognizer = TextRecognizer::new(MockRecognizer::new(["1OOg"]), ConfusableScope::DigitAdjacent);
        let mut p = RowPipeline::new(StubFetcher::ok(), recognizer).with_enhance_options(small_enhance());
        let out = p.process_row(&row(1, "http://img/1.jpg", "item_weight")).await;
        assert_eq!(out.record.predicted_value, "100 gram");
    }

    #[tokio::test]
    async fn recognizer_is_reused_across_rows() {
        let mut p = pipeline(StubFetcher::ok(), &["12V"]);
        for i in 0..3 {
            p.process_row(&row(i, "http://img/1.jpg", "voltage")).await;
        }
        // One backend instance, one call per row.
        assert_eq!(p.recognizer().backend().calls, 3);
    }
}
