//! Population bucketing for the country fill colors.
//!
//! Buckets are half-open: a bucket with ceiling `c` covers
//! `[previous ceiling, c)`, so a population equal to a ceiling lands in the
//! next bucket. Anything at or above the largest ceiling gets the overflow
//! label.

use crate::types::RegionStyle;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;

/// Feature property holding the population estimate.
pub const POPULATION_PROPERTY: &str = "POP2005";

const DEFAULT_BUCKETS: [(u64, &str); 5] = [
    (1_000_000, "grey"),
    (5_000_000, "blue"),
    (10_000_000, "green"),
    (100_000_000, "yellow"),
    (1_000_000_000, "orange"),
];
const DEFAULT_OVERFLOW: &str = "red";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub ceiling: u64,
    pub label: String,
}

impl Bucket {
    pub fn new(ceiling: u64, label: impl Into<String>) -> Self {
        Self {
            ceiling,
            label: label.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScaleError {
    #[error("ceiling {0} appears more than once")]
    DuplicateCeiling(u64),
    #[error("bucket with ceiling {0} has an empty label")]
    EmptyLabel(u64),
    #[error("overflow label is empty")]
    EmptyOverflow,
}

#[derive(Debug, Error, PartialEq)]
pub enum StyleError {
    #[error("feature has no 'POP2005' property")]
    MissingPopulation,
    #[error("'POP2005' is not a number: {0}")]
    NotANumber(Value),
    #[error("'POP2005' must be finite and non-negative, got {0}")]
    OutOfRange(f64),
}

/// Ordered ceiling -> label table plus the overflow label.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationScale {
    // Sorted ascending by ceiling.
    buckets: Vec<Bucket>,
    overflow: String,
}

impl PopulationScale {
    /// Builds a scale from buckets given in any order.
    pub fn new(
        buckets: impl IntoIterator<Item = Bucket>,
        overflow: impl Into<String>,
    ) -> Result<Self, ScaleError> {
        let overflow = overflow.into();
        if overflow.is_empty() {
            return Err(ScaleError::EmptyOverflow);
        }

        let mut buckets: Vec<Bucket> = buckets.into_iter().collect();
        let mut seen = HashSet::new();
        for bucket in &buckets {
            if bucket.label.is_empty() {
                return Err(ScaleError::EmptyLabel(bucket.ceiling));
            }
            if !seen.insert(bucket.ceiling) {
                return Err(ScaleError::DuplicateCeiling(bucket.ceiling));
            }
        }
        buckets.sort_by_key(|b| b.ceiling);

        Ok(Self { buckets, overflow })
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn overflow(&self) -> &str {
        &self.overflow
    }

    /// Returns the label of the first bucket whose ceiling is strictly
    /// greater than `population`, or the overflow label.
    ///
    /// # Panics
    ///
    /// If `population` is negative or not finite.
    pub fn classify(&self, population: f64) -> &str {
        assert!(
            population.is_finite() && population >= 0.0,
            "population must be finite and non-negative, got {population}"
        );
        self.buckets
            .iter()
            .find(|b| population < b.ceiling as f64)
            .map_or(self.overflow.as_str(), |b| b.label.as_str())
    }

    /// Style callback for one feature: classifies its `POP2005` property.
    pub fn style_for(&self, properties: Option<&Map<String, Value>>) -> Result<RegionStyle, StyleError> {
        let population = population_of(properties)?;
        Ok(RegionStyle {
            fill_color: self.classify(population).to_string(),
        })
    }
}

impl Default for PopulationScale {
    fn default() -> Self {
        Self {
            buckets: DEFAULT_BUCKETS
                .iter()
                .map(|&(ceiling, label)| Bucket::new(ceiling, label))
                .collect(),
            overflow: DEFAULT_OVERFLOW.to_string(),
        }
    }
}

/// Reads and validates the population estimate of a feature.
pub fn population_of(properties: Option<&Map<String, Value>>) -> Result<f64, StyleError> {
    let value = properties
        .and_then(|props| props.get(POPULATION_PROPERTY))
        .ok_or(StyleError::MissingPopulation)?;
    let population = value
        .as_f64()
        .ok_or_else(|| StyleError::NotANumber(value.clone()))?;
    if !population.is_finite() || population < 0.0 {
        return Err(StyleError::OutOfRange(population));
    }
    Ok(population)
}
