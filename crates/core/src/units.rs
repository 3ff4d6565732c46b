use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalUnit {
    // mass
    Gram,
    Kilogram,
    Microgram,
    Milligram,
    Ounce,
    Pound,
    Ton,
    // length
    Centimetre,
    Foot,
    Inch,
    Metre,
    Millimetre,
    Yard,
    // electrical
    Kilovolt,
    Millivolt,
    Volt,
    Kilowatt,
    Watt,
    // volume
    Centilitre,
    CubicFoot,
    CubicInch,
    Cup,
    Decilitre,
    FluidOunce,
    Gallon,
    ImperialGallon,
    Litre,
    Microlitre,
    Millilitre,
    Pint,
    Quart,
}

impl CanonicalUnit {
    /// Name used in predictions, e.g. `"cubic foot"`.
    pub fn name(self) -> &'static str {
        match self {
            CanonicalUnit::Gram => "gram",
            CanonicalUnit::Kilogram => "kilogram",
            CanonicalUnit::Microgram => "microgram",
            CanonicalUnit::Milligram => "milligram",
            CanonicalUnit::Ounce => "ounce",
            CanonicalUnit::Pound => "pound",
            CanonicalUnit::Ton => "ton",
            CanonicalUnit::Centimetre => "centimetre",
            CanonicalUnit::Foot => "foot",
            CanonicalUnit::Inch => "inch",
            CanonicalUnit::Metre => "metre",
            CanonicalUnit::Millimetre => "millimetre",
            CanonicalUnit::Yard => "yard",
            CanonicalUnit::Kilovolt => "kilovolt",
            CanonicalUnit::Millivolt => "millivolt",
            CanonicalUnit::Volt => "volt",
            CanonicalUnit::Kilowatt => "kilowatt",
            CanonicalUnit::Watt => "watt",
            CanonicalUnit::Centilitre => "centilitre",
            CanonicalUnit::CubicFoot => "cubic foot",
            CanonicalUnit::CubicInch => "cubic inch",
            CanonicalUnit::Cup => "cup",
            CanonicalUnit::Decilitre => "decilitre",
            CanonicalUnit::FluidOunce => "fluid ounce",
            CanonicalUnit::Gallon => "gallon",
            CanonicalUnit::ImperialGallon => "imperial gallon",
            CanonicalUnit::Litre => "litre",
            CanonicalUnit::Microlitre => "microlitre",
            CanonicalUnit::Millilitre => "millilitre",
            CanonicalUnit::Pint => "pint",
            CanonicalUnit::Quart => "quart",
        }
    }
}

impl fmt::Display for CanonicalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of looking a raw unit token up in the alias table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedUnit {
    Known(CanonicalUnit),
    /// The raw token, unchanged.
    Unknown(String),
}

impl NormalizedUnit {
    pub fn known(&self) -> Option<CanonicalUnit> {
        match self {
            NormalizedUnit::Known(unit) => Some(*unit),
            NormalizedUnit::Unknown(_) => None,
        }
    }
}

// ── Alias table ───────────────────────────────────────────────────────────────

use CanonicalUnit::*;

/// Raw spelling → canonical unit. Keys are stored case-folded (see `fold_token`),
/// including the garbled forms OCR produces for `µ` and `³` on product labels.
pub const UNIT_ALIASES: &[(&str, CanonicalUnit)] = &[
    ("g", Gram),
    ("ge", Gram),
    ("g e", Gram),
    ("gram", Gram),
    ("grams", Gram),
    ("kg", Kilogram),
    ("kilogram", Kilogram),
    ("kilograms", Kilogram),
    ("microgram", Microgram),
    ("μg", Microgram),
    ("âμg", Microgram),
    ("mg", Milligram),
    ("milligram", Milligram),
    ("ounce", Ounce),
    ("ounces", Ounce),
    ("oz", Ounce),
    ("pound", Pound),
    ("pounds", Pound),
    ("lb", Pound),
    ("lbs", Pound),
    ("ibs", Pound),
    ("ton", Ton),
    ("tons", Ton),
    ("cm", Centimetre),
    ("centimetre", Centimetre),
    ("centimeter", Centimetre),
    ("mm", Millimetre),
    ("millimetre", Millimetre),
    ("millimeter", Millimetre),
    ("m", Metre),
    ("metre", Metre),
    ("meter", Metre),
    ("'", Foot),
    ("\u{2032}", Foot),
    ("foot", Foot),
    ("feet", Foot),
    ("ft", Foot),
    ("\"", Inch),
    ("\u{2033}", Inch),
    ("inch", Inch),
    ("inches", Inch),
    ("in", Inch),
    ("yard", Yard),
    ("yards", Yard),
    ("yd", Yard),
    ("kv", Kilovolt),
    ("kilovolt", Kilovolt),
    ("mv", Millivolt),
    ("millivolt", Millivolt),
    ("v", Volt),
    ("volt", Volt),
    ("volts", Volt),
    ("w", Watt),
    ("watt", Watt),
    ("watts", Watt),
    ("kw", Kilowatt),
    ("kilowatt", Kilowatt),
    ("l", Litre),
    ("litre", Litre),
    ("liter", Litre),
    ("ml", Millilitre),
    ("millilitre", Millilitre),
    ("milliliter", Millilitre),
    ("cl", Centilitre),
    ("centilitre", Centilitre),
    ("dl", Decilitre),
    ("decilitre", Decilitre),
    ("μl", Microlitre),
    ("âμl", Microlitre),
    ("microlitre", Microlitre),
    ("cubic foot", CubicFoot),
    ("ft³", CubicFoot),
    ("ftâł", CubicFoot),
    ("ft3", CubicFoot),
    ("cubic inch", CubicInch),
    ("in³", CubicInch),
    ("inâł", CubicInch),
    ("in3", CubicInch),
    ("cup", Cup),
    ("cups", Cup),
    ("fluid ounce", FluidOunce),
    ("fl oz", FluidOunce),
    ("gallon", Gallon),
    ("gal", Gallon),
    ("imperial gallon", ImperialGallon),
    ("imp gal", ImperialGallon),
    ("pint", Pint),
    ("pt", Pint),
    ("quart", Quart),
    ("qt", Quart),
];

fn alias_table() -> &'static HashMap<&'static str, CanonicalUnit> {
    static TABLE: OnceLock<HashMap<&'static str, CanonicalUnit>> = OnceLock::new();
    TABLE.get_or_init(|| UNIT_ALIASES.iter().copied().collect())
}

/// Lower-case a token and unify the micro sign (U+00B5) with Greek mu (U+03BC),
/// which upper-cases to a different letter and would otherwise not round-trip.
pub fn fold_token(raw: &str) -> String {
    raw.to_lowercase().replace('\u{b5}', "\u{3bc}")
}

/// Map a raw unit token to its canonical unit. Unrecognized tokens come back
/// as `Unknown` carrying the raw text; allowed-unit checks are the caller's job.
pub fn normalize_unit(raw: &str) -> NormalizedUnit {
    match alias_table().get(fold_token(raw).as_str()) {
        Some(unit) => NormalizedUnit::Known(*unit),
        None => NormalizedUnit::Unknown(raw.to_string()),
    }
}
