use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::policy::{self, Assessment};

pub const DEFAULT_MIN_PERCENT: u8 = 75;

#[derive(Debug, Error, PartialEq)]
pub enum ThresholdError {
    #[error("percentage must be a number, got {0:?}")]
    NotANumber(String),
    #[error("percentage must be between 0 and 100, got {0}")]
    OutOfRange(f64),
    #[error("percentage {0} has more than two decimal places")]
    TooPrecise(f64),
}

/// Minimum attendance goal, held as hundredths of a percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "f64")]
pub struct Threshold(u32);

impl Threshold {
    pub const SCALE: u32 = 10_000;

    pub fn from_percent(percent: u8) -> Result<Self, ThresholdError> {
        if percent > 100 {
            return Err(ThresholdError::OutOfRange(f64::from(percent)));
        }
        Ok(Self(u32::from(percent) * 100))
    }

    pub fn from_basis_points(basis_points: u32) -> Result<Self, ThresholdError> {
        if basis_points > Self::SCALE {
            return Err(ThresholdError::OutOfRange(f64::from(basis_points) / 100.0));
        }
        Ok(Self(basis_points))
    }

    pub fn basis_points(&self) -> u32 {
        self.0
    }

    pub fn as_percent(&self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(u32::from(DEFAULT_MIN_PERCENT) * 100)
    }
}

impl TryFrom<f64> for Threshold {
    type Error = ThresholdError;

    fn try_from(percent: f64) -> Result<Self, Self::Error> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(ThresholdError::OutOfRange(percent));
        }
        let scaled = percent * 100.0;
        let rounded = scaled.round();
        if (scaled - rounded).abs() > 1e-6 {
            return Err(ThresholdError::TooPrecise(percent));
        }
        Ok(Self(rounded as u32))
    }
}

/// Whole goals are written as integers, matching the legacy layout.
impl Serialize for Threshold {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_u32(self.0 / 100)
        } else {
            serializer.serialize_f64(self.as_percent())
        }
    }
}

impl FromStr for Threshold {
    type Err = ThresholdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim().trim_end_matches('%');
        let value: f64 = trimmed
            .parse()
            .map_err(|_| ThresholdError::NotANumber(raw.to_string()))?;
        Self::try_from(value)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}%", self.as_percent())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub min_percentage: Threshold,
    #[serde(default)]
    pub attended: u32,
    #[serde(default)]
    pub missed: u32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Subject {
    pub fn new(name: impl Into<String>, min_percentage: Threshold) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            min_percentage,
            attended: 0,
            missed: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn assess(&self) -> Assessment {
        policy::assess(self.attended, self.missed, self.min_percentage)
    }

    pub fn counter_mut(&mut self, field: Field) -> &mut u32 {
        match field {
            Field::Attended => &mut self.attended,
            Field::Missed => &mut self.missed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Attended,
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    Increment,
    Decrement,
}

/// One counter change addressed by position in the store (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Update {
    pub index: usize,
    pub field: Field,
    pub delta: Delta,
}
