//! Blood group and request urgency vocabularies.

use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// One of the eight ABO/Rh blood types.
///
/// Declaration order is the display order used by every per-type report
/// (`A+, A-, B+, B-, AB+, AB-, O+, O-`), and `Ord` follows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BloodType {
    APos,
    ANeg,
    BPos,
    BNeg,
    AbPos,
    AbNeg,
    OPos,
    ONeg,
}

impl BloodType {
    /// Every blood type in display order.
    pub const ALL: [BloodType; 8] = [
        BloodType::APos,
        BloodType::ANeg,
        BloodType::BPos,
        BloodType::BNeg,
        BloodType::AbPos,
        BloodType::AbNeg,
        BloodType::OPos,
        BloodType::ONeg,
    ];

    /// Canonical ABO/Rh notation, e.g. `"AB-"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::APos => "A+",
            Self::ANeg => "A-",
            Self::BPos => "B+",
            Self::BNeg => "B-",
            Self::AbPos => "AB+",
            Self::AbNeg => "AB-",
            Self::OPos => "O+",
            Self::ONeg => "O-",
        }
    }

    /// URL- and filename-safe spelling, e.g. `"ab-neg"`.
    pub const fn slug(self) -> &'static str {
        match self {
            Self::APos => "a-pos",
            Self::ANeg => "a-neg",
            Self::BPos => "b-pos",
            Self::BNeg => "b-neg",
            Self::AbPos => "ab-pos",
            Self::AbNeg => "ab-neg",
            Self::OPos => "o-pos",
            Self::ONeg => "o-neg",
        }
    }

    pub const fn is_rh_positive(self) -> bool {
        matches!(self, Self::APos | Self::BPos | Self::AbPos | Self::OPos)
    }

    /// Parses either the canonical notation (`"AB-"`) or the slug (`"ab-neg"`).
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::InvalidBloodType`] for anything outside the eight types.
    pub fn parse(input: &str) -> Result<Self, TypesError> {
        let trimmed = input.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == trimmed || t.slug().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| TypesError::InvalidBloodType(input.to_string()))
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for BloodType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BloodType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BloodType::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Priority tier of a blood request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(TypesError::InvalidUrgency(s.to_string())),
        }
    }
}
