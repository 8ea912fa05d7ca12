//! Canonical shooting suggestion records.
//!
//! A suggestion tells the photographer what to do (`action`), which way to
//! move the phone or body (`direction`), how much (`intensity`) and why
//! (`reason`). Directions are from the photographer's point of view facing
//! the scene.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on suggestions in one guidance result.
pub const MAX_SUGGESTIONS: usize = 5;

/// 8-way movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Stand taller / raise the phone.
    #[default]
    Up,
    /// Crouch / lower the phone.
    Down,
    Left,
    Right,
    LeftUp,
    LeftDown,
    RightUp,
    RightDown,
}

impl Direction {
    /// All directions in canonical order.
    pub const ALL: &'static [Direction] = &[
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::LeftUp,
        Direction::LeftDown,
        Direction::RightUp,
        Direction::RightDown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::LeftUp => "left_up",
            Direction::LeftDown => "left_down",
            Direction::RightUp => "right_up",
            Direction::RightDown => "right_down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strict parse of the canonical names only; synonym mapping lives with the
/// suggestion validator.
impl FromStr for Direction {
    type Err = DirectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| DirectionParseError(s.to_string()))
    }
}

#[derive(Debug, Error)]
#[error("Unknown direction: {0}")]
pub struct DirectionParseError(String);

/// Movement magnitude on a 1 (slight) to 5 (a lot) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Intensity(u8);

impl Intensity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Used whenever a supplied value is missing or unusable.
    pub const DEFAULT: Intensity = Intensity(3);

    pub fn new(value: u8) -> Result<Self, IntensityError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(IntensityError(value as i64))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl JsonSchema for Intensity {
    fn schema_name() -> String {
        "Intensity".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        <u8 as JsonSchema>::json_schema(gen)
    }
}

impl TryFrom<u8> for Intensity {
    type Error = IntensityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Intensity::new(value)
    }
}

impl From<Intensity> for u8 {
    fn from(value: Intensity) -> Self {
        value.0
    }
}

#[derive(Debug, Error)]
#[error("Intensity out of range 1-5: {0}")]
pub struct IntensityError(i64);

/// One actionable shooting suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Suggestion {
    /// 1-based position in the final list; reassigned on assembly.
    pub step: usize,
    pub action: String,
    pub direction: Direction,
    pub intensity: Intensity,
    pub reason: String,
}

impl Suggestion {
    /// Create an unnumbered suggestion (step 0 until assembled).
    pub fn new(
        action: impl Into<String>,
        direction: Direction,
        intensity: Intensity,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            step: 0,
            action: action.into(),
            direction,
            intensity,
            reason: reason.into(),
        }
    }

    /// Renumber steps 1..n in list order.
    pub fn renumber(suggestions: &mut [Suggestion]) {
        for (i, suggestion) in suggestions.iter_mut().enumerate() {
            suggestion.step = i + 1;
        }
    }
}
