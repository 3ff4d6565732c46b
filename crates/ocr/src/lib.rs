pub mod batch;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;

pub use batch::{run_batch, BatchReport};
pub use extract::{EntityMatcher, Extractor, RawDetection, SelectionPolicy};
pub use fetch::{FetchError, HttpFetcher, ImageFetcher, DEFAULT_FETCH_TIMEOUT};
pub use pipeline::{ProcessedRow, RowError, RowPipeline, RowStatus};
pub use preprocess::{decode_image, enhance, ChannelOrder, DecodeError, EnhanceOptions, Raster};
pub use recognizer::{ConfusableScope, MockRecognizer, OcrBackend, OcrError, TextLine, TextRecognizer};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
