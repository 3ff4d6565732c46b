use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::units::CanonicalUnit::{self, *};

/// The physical measurement a dataset row asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Width,
    Depth,
    Height,
    ItemWeight,
    MaximumWeightRecommendation,
    Voltage,
    Wattage,
    ItemVolume,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityError {
    #[error("Unknown entity name: '{0}'")]
    Unknown(String),
}

const LENGTH_UNITS: &[CanonicalUnit] = &[Centimetre, Foot, Inch, Metre, Millimetre, Yard];
const MASS_UNITS: &[CanonicalUnit] = &[Gram, Kilogram, Microgram, Milligram, Ounce, Pound, Ton];
const VOLTAGE_UNITS: &[CanonicalUnit] = &[Kilovolt, Millivolt, Volt];
const WATTAGE_UNITS: &[CanonicalUnit] = &[Kilowatt, Watt];
const VOLUME_UNITS: &[CanonicalUnit] = &[
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
];

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::ItemWeight,
        EntityKind::MaximumWeightRecommendation,
        EntityKind::ItemVolume,
        EntityKind::Voltage,
        EntityKind::Wattage,
        EntityKind::Width,
        EntityKind::Height,
        EntityKind::Depth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Width => "width",
            EntityKind::Depth => "depth",
            EntityKind::Height => "height",
            EntityKind::ItemWeight => "item_weight",
            EntityKind::MaximumWeightRecommendation => "maximum_weight_recommendation",
            EntityKind::Voltage => "voltage",
            EntityKind::Wattage => "wattage",
            EntityKind::ItemVolume => "item_volume",
        }
    }

    /// Units a prediction for this kind may carry.
    pub fn allowed_units(self) -> &'static [CanonicalUnit] {
        match self {
            EntityKind::Width | EntityKind::Depth | EntityKind::Height => LENGTH_UNITS,
            EntityKind::ItemWeight | EntityKind::MaximumWeightRecommendation => MASS_UNITS,
            EntityKind::Voltage => VOLTAGE_UNITS,
            EntityKind::Wattage => WATTAGE_UNITS,
            EntityKind::ItemVolume => VOLUME_UNITS,
        }
    }

    pub fn allows(self, unit: CanonicalUnit) -> bool {
        self.allowed_units().contains(&unit)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| EntityError::Unknown(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn entity_name_roundtrip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_str(&kind.to_string()).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_entity_name_is_rejected() {
        assert_eq!(
            EntityKind::from_str("shelf_life"),
            Err(EntityError::Unknown("shelf_life".into()))
        );
    }

    #[test]
    fn weight_kinds_allow_mass_only() {
        assert!(EntityKind::ItemWeight.allows(Kilogram));
        assert!(EntityKind::MaximumWeightRecommendation.allows(Pound));
        assert!(!EntityKind::ItemWeight.allows(Centimetre));
    }

    #[test]
    fn dimension_kinds_share_length_units() {
        for kind in [EntityKind::Width, EntityKind::Height, EntityKind::Depth] {
            assert!(kind.allows(Inch));
            assert!(!kind.allows(Litre));
        }
    }

    #[test]
    fn every_unit_belongs_to_some_kind() {
        for (_, unit) in crate::units::UNIT_ALIASES {
            assert!(
                EntityKind::ALL.iter().any(|k| k.allows(*unit)),
                "{unit} is not allowed anywhere"
            );
        }
    }
}
