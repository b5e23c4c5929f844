//! Review grades.
//!
//! A grade is the learner's self-reported quality of recall on the 0-5 scale:
//! - 0-2: failed recall, the card starts over
//! - 3: correct with serious difficulty
//! - 4: correct after hesitation
//! - 5: perfect recall

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ReviewError, Result};

pub const MIN_GRADE: u8 = 0;
pub const MAX_GRADE: u8 = 5;
/// Lowest grade that counts as a successful recall.
pub const PASSING_GRADE: u8 = 3;

/// Recall quality in `0..=5`. Only constructed through validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Grade(u8);

impl Grade {
    /// Validate a raw grade.
    pub fn new(value: i64) -> Result<Self> {
        if (MIN_GRADE as i64..=MAX_GRADE as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ReviewError::InvalidGrade(value.to_string()))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_passing(self) -> bool {
        self.0 >= PASSING_GRADE
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        grade.0
    }
}

impl TryFrom<i64> for Grade {
    type Error = ReviewError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<i32> for Grade {
    type Error = ReviewError;

    fn try_from(value: i32) -> Result<Self> {
        Self::new(i64::from(value))
    }
}

impl TryFrom<u8> for Grade {
    type Error = ReviewError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(i64::from(value))
    }
}

impl TryFrom<f64> for Grade {
    type Error = ReviewError;

    /// Accepts only whole numbers; `3.5` or `NaN` are rejected rather than rounded.
    fn try_from(value: f64) -> Result<Self> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(ReviewError::InvalidGrade(value.to_string()));
        }
        if value < MIN_GRADE as f64 || value > MAX_GRADE as f64 {
            return Err(ReviewError::InvalidGrade(value.to_string()));
        }
        Ok(Self(value as u8))
    }
}

/// The three grading buttons shown after a card is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Hard,
    Good,
    Easy,
}

impl Difficulty {
    /// Map a button onto the 0-5 scale. None of the buttons produce a failing grade.
    pub fn grade(self) -> Grade {
        match self {
            Self::Hard => Grade(3),
            Self::Good => Grade(4),
            Self::Easy => Grade(5),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hard" => Ok(Self::Hard),
            "good" => Ok(Self::Good),
            "easy" => Ok(Self::Easy),
            _ => Err(ReviewError::UnknownDifficulty(s.to_string())),
        }
    }
}

impl From<Difficulty> for Grade {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.grade()
    }
}
