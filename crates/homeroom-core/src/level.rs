// Primary school levels offered on the practice pages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A practice level, from Primary 1 up to the pre-lower-secondary exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    P1,
    P2,
    P3,
    P4,
    P5,
    P6,
    #[serde(rename = "PLSE")]
    Plse,
}

impl Level {
    /// All levels in menu order.
    pub const ALL: [Level; 7] = [
        Level::P1,
        Level::P2,
        Level::P3,
        Level::P4,
        Level::P5,
        Level::P6,
        Level::Plse,
    ];

    /// Short code used in history keys and titles ("P2", "PLSE").
    pub fn code(self) -> &'static str {
        match self {
            Level::P1 => "P1",
            Level::P2 => "P2",
            Level::P3 => "P3",
            Level::P4 => "P4",
            Level::P5 => "P5",
            Level::P6 => "P6",
            Level::Plse => "PLSE",
        }
    }

    /// One-line description shown in the level picker.
    pub fn description(self) -> &'static str {
        match self {
            Level::P1 => "Primary 1 (Ages 6-7) - Addition, Subtraction, Simple Multiplication",
            Level::P2 => "Primary 2 (Ages 7-8) - Operations within 100, Multiplication & Division",
            Level::P3 => "Primary 3 (Ages 8-9) - Operations within 1000, Fractions",
            Level::P4 => "Primary 4 (Ages 9-10) - Multi-digit, Decimals, Geometry",
            Level::P5 => "Primary 5 (Ages 10-11) - Fractions, Decimals, Percentages, Algebra",
            Level::P6 => "Primary 6 (Ages 11-12) - Advanced Algebra, Geometry, Statistics",
            Level::Plse => "Pre-Lower Secondary Exam - Comprehensive Exam Preparation",
        }
    }

    /// The next level in menu order, wrapping around.
    pub fn next(self) -> Level {
        let idx = self.index();
        Level::ALL[(idx + 1) % Level::ALL.len()]
    }

    /// The previous level in menu order, wrapping around.
    pub fn prev(self) -> Level {
        let idx = self.index();
        Level::ALL[(idx + Level::ALL.len() - 1) % Level::ALL.len()]
    }

    fn index(self) -> usize {
        Level::ALL
            .iter()
            .position(|l| *l == self)
            .unwrap_or_default()
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::P2
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when a level code is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid level: {0}. Must be one of P1, P2, P3, P4, P5, P6, PLSE")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P1" => Ok(Level::P1),
            "P2" => Ok(Level::P2),
            "P3" => Ok(Level::P3),
            "P4" => Ok(Level::P4),
            "P5" => Ok(Level::P5),
            "P6" => Ok(Level::P6),
            "PLSE" => Ok(Level::Plse),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}
