use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::unit_token_at;
use crate::preprocess::{ChannelOrder, Raster};

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image encode error: {0}")]
    ImageEncode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available; rebuild with the `tesseract` feature")]
    NotAvailable,
}

/// One line of recognized text, in the engine's detection order.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Engine confidence (0.0–1.0).
    pub confidence: f32,
}

impl TextLine {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self { text: text.into(), confidence: confidence.clamp(0.0, 1.0) }
    }
}

/// Abstraction over a text detection + recognition engine.
///
/// Engines are stateful and expensive to set up, so `recognize` takes `&mut self`
/// and a single instance is expected to serve every row of a batch.
pub trait OcrBackend {
    fn recognize(&mut self, image: &Raster) -> Result<Vec<TextLine>, OcrError>;

    /// Channel order the engine wants its input in.
    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }
}

impl<B: OcrBackend + ?Sized> OcrBackend for Box<B> {
    fn recognize(&mut self, image: &Raster) -> Result<Vec<TextLine>, OcrError> {
        (**self).recognize(image)
    }

    fn channel_order(&self) -> ChannelOrder {
        (**self).channel_order()
    }
}

// ── Confusable substitution ──────────────────────────────────────────────────

/// Where the letter `O`/`o` is rewritten to the digit `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfusableScope {
    /// Every occurrence in the text, including inside words.
    #[default]
    Global,
    /// Only runs of `O`/`o` that touch a digit, where the other side is not a
    /// letter or is the start of a unit spelling (`1OOg`, `5Oml`).
    DigitAdjacent,
}

pub fn substitute_confusables(text: &str, scope: ConfusableScope) -> String {
    match scope {
        ConfusableScope::Global => text.replace(['O', 'o'], "0"),
        ConfusableScope::DigitAdjacent => substitute_digit_adjacent(text),
    }
}

fn substitute_digit_adjacent(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let is_o = |c: char| c == 'O' || c == 'o';
    // A digit, or a decimal point with a digit beyond it.
    let numeric_at = |i: Option<usize>, step: isize| -> bool {
        let Some(i) = i else { return false };
        match chars.get(i) {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') | Some(',') => i
                .checked_add_signed(step)
                .and_then(|j| chars.get(j))
                .is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    };
    let letter_at = |i: Option<usize>| i.and_then(|i| chars.get(i)).is_some_and(|c| c.is_alphabetic());

    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if !is_o(chars[i]) {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && is_o(chars[i]) {
            i += 1;
        }
        let before = start.checked_sub(1);
        let after = Some(i);
        let unit_after = || {
            let rest: String = chars[i..].iter().collect();
            unit_token_at(&rest)
        };
        let numeric = (numeric_at(before, -1) && (!letter_at(after) || unit_after()))
            || (numeric_at(after, 1) && !letter_at(before));
        for &c in &chars[start..i] {
            out.push(if numeric { '0' } else { c });
        }
    }
    out
}

// ── Adapter ──────────────────────────────────────────────────────────────────

/// Owns one engine for the lifetime of a batch and turns its output into a
/// single normalized string.
pub struct TextRecognizer<B: OcrBackend> {
    backend: B,
    scope: ConfusableScope,
}

impl<B: OcrBackend> TextRecognizer<B> {
    pub fn new(backend: B, scope: ConfusableScope) -> Self {
        Self { backend, scope }
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.backend.channel_order()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Lines joined by single spaces in detection order, then confusable-corrected.
    /// No detections yields `""`.
    pub fn read_text(&mut self, image: &Raster) -> Result<String, OcrError> {
        let lines = self.backend.recognize(image)?;
        if lines.is_empty() {
            return Ok(String::new());
        }
        let joined = lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join(" ");
        Ok(substitute_confusables(&joined, self.scope))
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns pre-set lines. Lets the extraction pipeline be tested
/// without requiring Tesseract to be installed.
pub struct MockRecognizer {
    pub lines: Vec<TextLine>,
    /// Number of `recognize` calls served.
    pub calls: usize,
}

impl MockRecognizer {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(|t| TextLine::new(t, 1.0)).collect(),
            calls: 0,
        }
    }

    pub fn empty() -> Self {
        Self { lines: Vec::new(), calls: 0 }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&mut self, _image: &Raster) -> Result<Vec<TextLine>, OcrError> {
        self.calls += 1;
        Ok(self.lines.clone())
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError, TextLine};
    use crate::preprocess::{encode_png, Raster};
    use leptess::{capi, LepTess, Variable};

    /// "Automatic page segmentation with orientation and script detection."
    const PSM_AUTO_OSD: &str = "1";

    pub struct TesseractRecognizer {
        lt: LepTess,
    }

    impl TesseractRecognizer {
        /// Initializes the engine once; reuse the instance across images.
        pub fn new(data_path: Option<&str>, lang: &str) -> Result<Self, OcrError> {
            let mut lt = LepTess::new(data_path, lang).map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_variable(Variable::TesseditPagesegMode, PSM_AUTO_OSD)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            Ok(Self { lt })
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(&mut self, image: &Raster) -> Result<Vec<TextLine>, OcrError> {
            let png = encode_png(image).map_err(|e| OcrError::ImageEncode(e.to_string()))?;
            self.lt
                .set_image_from_mem(&png)
                .map_err(|e| OcrError::Engine(e.to_string()))?;

            let Some(boxes) = self
                .lt
                .get_component_boxes(capi::TessPageIteratorLevel_RIL_TEXTLINE, true)
            else {
                return Ok(Vec::new());
            };

            let mut lines = Vec::new();
            for b in &boxes {
                self.lt.set_rectangle(&b);
                let text = self.lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))?;
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                let confidence = self.lt.mean_text_conf() as f32 / 100.0;
                lines.push(TextLine::new(text, confidence));
            }
            Ok(lines)
        }
    }
}
