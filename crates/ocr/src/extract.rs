use std::sync::OnceLock;

use labelscan_core::{normalize_unit, EntityKind, ExtractedValue, ExtractionOutcome};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A `(number, unit token)` pair found in recognized text. Offsets are byte
/// positions of the whole match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDetection {
    pub value: String,
    pub unit: String,
    pub start: usize,
    pub end: usize,
}

impl RawDetection {
    pub fn new(value: impl Into<String>, unit: impl Into<String>) -> Self {
        Self { value: value.into(), unit: unit.into(), start: 0, end: 0 }
    }
}

// ── Per-kind unit spellings ───────────────────────────────────────────────────

const MASS_TOKENS: &[&str] = &[
    "g", "kg", "gram", "kilogram", "ounce", "oz", "pound", "lbs", "lb", "ibs",
    "microgram", "μg", "µg", "âμg", "âµg", "milligram", "mg", "ton",
];

const LENGTH_TOKENS: &[&str] = &[
    "cm", "centimetre", "centimeter", "mm", "millimetre", "millimeter", "metre", "meter",
    "foot", "feet", "ft", "'", "\u{2032}", "inch", "in", "\"", "\u{2033}", "yard", "yd",
];

const VOLTAGE_TOKENS: &[&str] = &["v", "volt", "kilovolt", "kv", "millivolt", "mv"];

const WATTAGE_TOKENS: &[&str] = &["w", "watt", "kilowatt", "kw"];

const VOLUME_TOKENS: &[&str] = &[
    "ml", "millilitre", "milliliter", "litre", "liter", "centilitre", "cl", "decilitre", "dl",
    "cup", "fluid ounce", "fl oz", "gallon", "gal", "imperial gallon", "imp gal",
    "microlitre", "μl", "µl", "âμl", "âµl", "pint", "pt", "quart", "qt",
    "cubic foot", "ft³", "ftâł", "ft3", "cubic inch", "in³", "inâł", "in3",
];

/// Raw unit spellings the pattern for `kind` accepts.
pub fn unit_tokens(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::ItemWeight | EntityKind::MaximumWeightRecommendation => MASS_TOKENS,
        EntityKind::Width | EntityKind::Height | EntityKind::Depth => LENGTH_TOKENS,
        EntityKind::Voltage => VOLTAGE_TOKENS,
        EntityKind::Wattage => WATTAGE_TOKENS,
        EntityKind::ItemVolume => VOLUME_TOKENS,
    }
}

/// True when `text` opens with a unit spelling of any kind that ends at a word
/// boundary.
pub(crate) fn unit_token_at(text: &str) -> bool {
    let lower = text.to_lowercase();
    EntityKind::ALL
        .into_iter()
        .flat_map(unit_tokens)
        .any(|t| {
            lower
                .strip_prefix(*t)
                .is_some_and(|tail| !tail.chars().next().is_some_and(char::is_alphanumeric))
        })
}

/// `<decimal number><optional whitespace><unit token>`, case-insensitive. Tokens
/// are tried longest first so `inch` wins over `in`.
fn build_pattern(tokens: &[&str]) -> String {
    let mut sorted: Vec<&str> = tokens.to_vec();
    sorted.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
    let alternation = sorted
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    format!(r"(?i)(\d+\.?\d*)\s?({alternation})")
}

// ── Matcher ───────────────────────────────────────────────────────────────────

/// One compiled pattern per entity kind.
pub struct EntityMatcher {
    patterns: Vec<(EntityKind, Regex)>,
}

impl EntityMatcher {
    pub fn new() -> Self {
        let patterns = EntityKind::ALL
            .into_iter()
            .map(|kind| {
                let re = Regex::new(&build_pattern(unit_tokens(kind))).expect("invalid regex");
                (kind, re)
            })
            .collect();
        Self { patterns }
    }

    /// Process-wide instance, compiled on first use.
    pub fn shared() -> &'static EntityMatcher {
        static M: OnceLock<EntityMatcher> = OnceLock::new();
        M.get_or_init(EntityMatcher::new)
    }

    /// Every non-overlapping match for `kind`, left to right.
    pub fn detect(&self, kind: EntityKind, text: &str) -> Vec<RawDetection> {
        let Some((_, re)) = self.patterns.iter().find(|(k, _)| *k == kind) else {
            return Vec::new();
        };
        re.captures_iter(text)
            .filter_map(|c| {
                let whole = c.get(0)?;
                Some(RawDetection {
                    value: c.get(1)?.as_str().to_string(),
                    unit: c.get(2)?.as_str().to_string(),
                    start: whole.start(),
                    end: whole.end(),
                })
            })
            .collect()
    }

    /// Detections for every kind, in `EntityKind::ALL` order; kinds without a
    /// match are left out.
    pub fn detect_all(&self, text: &str) -> Vec<(EntityKind, Vec<RawDetection>)> {
        self.patterns
            .iter()
            .map(|(kind, _)| (*kind, self.detect(*kind, text)))
            .filter(|(_, found)| !found.is_empty())
            .collect()
    }
}

impl Default for EntityMatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ── Selection policies ────────────────────────────────────────────────────────

/// How one detection is chosen among a kind's matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// First detection, in text order, whose unit is allowed for the kind.
    #[default]
    FirstValid,
    /// Only the first detection is considered; no fallback.
    FirstOnly,
    /// Qualifying detection nearest a label such as "net wt" or "width";
    /// behaves like `FirstValid` when no label occurs.
    ClosestToKeyword,
}

impl std::str::FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first_valid" => Ok(SelectionPolicy::FirstValid),
            "first_only" => Ok(SelectionPolicy::FirstOnly),
            "closest_to_keyword" => Ok(SelectionPolicy::ClosestToKeyword),
            other => Err(format!("Unknown selection policy: '{other}'")),
        }
    }
}

impl SelectionPolicy {
    pub fn select(
        &self,
        kind: EntityKind,
        text: &str,
        detections: &[RawDetection],
    ) -> ExtractionOutcome {
        let Some(first) = detections.first() else {
            return ExtractionOutcome::NoMatch;
        };
        let chosen = match self {
            SelectionPolicy::FirstValid => detections.iter().find_map(|d| qualify(kind, d)),
            SelectionPolicy::FirstOnly => qualify(kind, first),
            SelectionPolicy::ClosestToKeyword => closest_to_keyword(kind, text, detections)
                .or_else(|| detections.iter().find_map(|d| qualify(kind, d))),
        };
        match chosen {
            Some(v) => ExtractionOutcome::Found(v),
            None => ExtractionOutcome::UnsupportedUnit { raw_unit: first.unit.clone() },
        }
    }
}

fn qualify(kind: EntityKind, d: &RawDetection) -> Option<ExtractedValue> {
    let unit = normalize_unit(&d.unit).known().filter(|u| kind.allows(*u))?;
    Some(ExtractedValue::new(d.value.clone(), unit))
}

fn keywords(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::ItemWeight => &["net weight", "net wt", "weight", "wt"],
        EntityKind::MaximumWeightRecommendation => {
            &["maximum load", "max load", "capacity", "load", "maximum", "max"]
        }
        EntityKind::ItemVolume => &["volume", "vol", "capacity", "contents"],
        EntityKind::Voltage => &["voltage", "input", "output", "rated"],
        EntityKind::Wattage => &["wattage", "power", "output", "rated"],
        EntityKind::Width => &["width", "wide"],
        EntityKind::Height => &["height", "tall", "high"],
        EntityKind::Depth => &["depth", "deep", "length"],
    }
}

fn closest_to_keyword(
    kind: EntityKind,
    text: &str,
    detections: &[RawDetection],
) -> Option<ExtractedValue> {
    // Byte-for-byte fold so offsets still line up; undo the 0/o substitution too.
    let folded = text.to_ascii_lowercase().replace('0', "o");
    let standalone = |start: usize, end: usize| {
        !folded[..start].chars().next_back().is_some_and(char::is_alphanumeric)
            && !folded[end..].chars().next().is_some_and(char::is_alphanumeric)
    };
    let spans: Vec<(usize, usize)> = keywords(kind)
        .iter()
        .flat_map(|k| folded.match_indices(k).map(|(i, m)| (i, i + m.len())))
        .filter(|&(s, e)| standalone(s, e))
        .collect();
    if spans.is_empty() {
        return None;
    }

    let distance = |d: &RawDetection| {
        spans
            .iter()
            .map(|&(ks, ke)| {
                if d.start >= ke {
                    d.start - ke
                } else if d.end <= ks {
                    ks - d.end
                } else {
                    0
                }
            })
            .min()
            .unwrap_or(usize::MAX)
    };

    detections
        .iter()
        .filter_map(|d| qualify(kind, d).map(|v| (distance(d), v)))
        .min_by_key(|(dist, _)| *dist)
        .map(|(_, v)| v)
}

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Scan `text` for every kind, then pick a value for `kind` under `policy`.
    pub fn extract(text: &str, kind: EntityKind, policy: SelectionPolicy) -> ExtractionOutcome {
        let all = EntityMatcher::shared().detect_all(text);
        let detections = all
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, d)| d.as_slice())
            .unwrap_or_default();
        policy.select(kind, text, detections)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
