use labelscan_core::{DatasetRow, RowRecord};
use tracing::info;

use crate::fetch::ImageFetcher;
use crate::pipeline::{RowPipeline, RowStatus};
use crate::recognizer::OcrBackend;

/// Result of a batch run. `records` has one entry per input row, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub records: Vec<RowRecord>,
    pub extracted: usize,
    pub empty: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.records.len()
    }
}

/// Run every row through `pipeline`, one at a time.
///
/// A failing row never aborts the batch. Progress is logged every
/// `progress_every` rows (0 disables it).
pub async fn run_batch<F, B>(
    pipeline: &mut RowPipeline<F, B>,
    rows: &[DatasetRow],
    progress_every: usize,
) -> BatchReport
where
    F: ImageFetcher,
    B: OcrBackend,
{
    let total = rows.len();
    let mut report = BatchReport { records: Vec::with_capacity(total), ..BatchReport::default() };

    for (done, row) in rows.iter().enumerate() {
        let processed = pipeline.process_row(row).await;
        match processed.status {
            RowStatus::Extracted => report.extracted += 1,
            RowStatus::Empty => report.empty += 1,
            RowStatus::Failed => report.failed += 1,
        }
        report.records.push(processed.record);

        let done = done + 1;
        if progress_every > 0 && done % progress_every == 0 && done < total {
            info!(done, total, "Processed {done}/{total} rows");
        }
    }

    info!(
        total,
        extracted = report.extracted,
        empty = report.empty,
        failed = report.failed,
        "Batch complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::{small_enhance, StubFetcher};
    use crate::recognizer::{ConfusableScope, MockRecognizer, TextRecognizer};

    fn rows(links: &[&str], entity: &str) -> Vec<DatasetRow> {
        links
            .iter()
            .enumerate()
            .map(|(index, link)| DatasetRow {
                index,
                image_link: link.to_string(),
                entity_name: entity.to_string(),
            })
            .collect()
    }

    fn pipeline(fetcher: StubFetcher, lines: &[&str]) -> RowPipeline<StubFetcher, MockRecognizer> {
        let recognizer = TextRecognizer::new(MockRecognizer::new(lines.iter().copied()), ConfusableScope::default());
        RowPipeline::new(fetcher, recognizer).with_enhance_options(small_enhance())
    }

    #[tokio::test]
    async fn one_bad_row_does_not_stop_the_batch() {
        let links = ["http://a/0", "http://a/1", "http://a/2", "http://a/3", "http://a/4"];
        let fetcher = StubFetcher { failing: vec!["http://a/2".into()], garbage: vec![] };
        let mut p = pipeline(fetcher, &["Net Wt 500 g"]);

        let report = run_batch(&mut p, &rows(&links, "item_weight"), 2).await;

        assert_eq!(report.total(), 5);
        assert_eq!(report.failed, 1);
        assert_eq!(report.extracted, 4);
        let indices: Vec<usize> = report.records.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert!(report.records[2].is_empty());
        for i in [0, 1, 3, 4] {
            assert_eq!(report.records[i].predicted_value, "500 gram");
        }
    }

    #[tokio::test]
    async fn counts_empty_predictions_separately() {
        let mut p = pipeline(StubFetcher::ok(), &["no numbers here"]);
        let report = run_batch(&mut p, &rows(&["http://a/0", "http://a/1"], "wattage"), 0).await;
        assert_eq!((report.extracted, report.empty, report.failed), (0, 2, 0));
        assert!(report.records.iter().all(RowRecord::is_empty));
    }

    #[tokio::test]
    async fn empty_dataset_is_an_empty_report() {
        let mut p = pipeline(StubFetcher::ok(), &["5 W"]);
        let report = run_batch(&mut p, &[], 10).await;
        assert_eq!(report, BatchReport::default());
    }
}
