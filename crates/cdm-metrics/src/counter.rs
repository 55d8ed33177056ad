//! Counter blocks and the values producers send into them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};

/// Well-known counter labels.
pub mod labels {
    /// Values present before any check.
    pub const BEFORE: &str = "before";
    /// Values surviving the content / person-id check.
    pub const AFTER: &str = "after";
    /// Values surviving the date-format check.
    pub const AFTER_FORMATTING: &str = "after_formatting";

    pub const INPUT_COUNT: &str = "input_count";
    pub const INVALID_PERSON_IDS: &str = "invalid_person_ids";
    pub const INVALID_SOURCE_FIELDS: &str = "invalid_source_fields";
    pub const INVALID_DATE_FIELDS: &str = "invalid_date_fields";
    pub const OUTPUT_COUNT: &str = "output_count";

    /// Counters read by the mapstream summary, in body column order.
    pub const MAPSTREAM: [&str; 5] = [
        INPUT_COUNT,
        INVALID_PERSON_IDS,
        INVALID_SOURCE_FIELDS,
        INVALID_DATE_FIELDS,
        OUTPUT_COUNT,
    ];
}

/// A count as supplied by a producer: an integer, a float, or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountValue {
    Int(u64),
    Float(f64),
    Text(String),
}

/// One past the largest float that still fits a `u64` counter.
const FLOAT_COUNT_LIMIT: f64 = 18_446_744_073_709_551_616.0;

impl CountValue {
    /// Coerce to an integer.
    ///
    /// Numeric strings are trimmed and must be whole numbers. Floats must be
    /// finite and non-negative; a fractional part is truncated toward zero.
    pub fn to_count(&self, label: &str) -> Result<u64> {
        let invalid = |value: String| MetricsError::InvalidCount {
            label: label.to_string(),
            value,
        };
        match self {
            Self::Int(value) => Ok(*value),
            Self::Float(value) => {
                if value.is_finite() && *value >= 0.0 && *value < FLOAT_COUNT_LIMIT {
                    Ok(value.trunc() as u64)
                } else {
                    Err(invalid(value.to_string()))
                }
            }
            Self::Text(text) => text
                .trim()
                .parse::<u64>()
                .map_err(|_| invalid(text.clone())),
        }
    }
}

impl From<u64> for CountValue {
    fn from(value: u64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for CountValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for CountValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CountValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Counter fragment carried by an increment record.
pub type Fragment = BTreeMap<String, CountValue>;

/// Builds a fragment from `(label, value)` pairs.
pub fn fragment<I, L, V>(pairs: I) -> Fragment
where
    I: IntoIterator<Item = (L, V)>,
    L: Into<String>,
    V: Into<CountValue>,
{
    pairs
        .into_iter()
        .map(|(label, value)| (label.into(), value.into()))
        .collect()
}

/// Named accumulators for one composite key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterBlock {
    counts: BTreeMap<String, u64>,
}

impl CounterBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.counts.get(label).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.counts.contains_key(label)
    }

    /// The total `label` would reach after adding `amount`.
    pub fn checked_total(&self, label: &str, amount: u64) -> Result<u64> {
        self.get(label)
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or_else(|| MetricsError::CountOverflow {
                label: label.to_string(),
            })
    }

    /// Adds `amount` to `label`, starting from zero when the label is new.
    /// On overflow the block is left unchanged.
    pub fn add(&mut self, label: &str, amount: u64) -> Result<()> {
        let total = self.checked_total(label, amount)?;
        self.set(label, total);
        Ok(())
    }

    /// Creates `label` at zero unless it already exists.
    pub fn seed(&mut self, label: &str) {
        if !self.counts.contains_key(label) {
            self.counts.insert(label.to_string(), 0);
        }
    }

    /// Adds every counter of `other` into this block. Either every counter
    /// is added or, on overflow, none is.
    pub fn absorb(&mut self, other: &CounterBlock) -> Result<()> {
        let mut totals = Vec::with_capacity(other.len());
        for (label, amount) in other.iter() {
            totals.push((label, self.checked_total(label, amount)?));
        }
        for (label, total) in totals {
            self.set(label, total);
        }
        Ok(())
    }

    /// Builds a block from `(label, amount)` pairs, summing repeated labels.
    pub fn try_from_counts<I, L>(counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (L, u64)>,
        L: Into<String>,
    {
        let mut block = Self::new();
        for (label, amount) in counts {
            block.add(&label.into(), amount)?;
        }
        Ok(block)
    }

    fn set(&mut self, label: &str, total: u64) {
        match self.counts.get_mut(label) {
            Some(existing) => *existing = total,
            None => {
                self.counts.insert(label.to_string(), total);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts
            .iter()
            .map(|(label, amount)| (label.as_str(), *amount))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl fmt::Display for CounterBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (label, amount)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{label}: {amount}")?;
        }
        f.write_str("}")
    }
}
