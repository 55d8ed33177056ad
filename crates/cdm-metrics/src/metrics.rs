//! The metrics aggregator.
//!
//! A [`Metrics`] value owns the data summary for one mapping run. Producers
//! hand it one [`IncrementRecord`] per destination table and object; the
//! aggregator folds the counts into per-key [`CounterBlock`]s that the
//! report projections in [`crate::report`] read back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::counter::{CounterBlock, Fragment, labels};
use crate::error::Result;
use crate::increment::IncrementRecord;
use crate::key::{MapstreamKey, StageKey, UNATTRIBUTED_SOURCE};

/// Composite key → counters.
pub type DataSummary = BTreeMap<String, CounterBlock>;

/// Fragment kinds recorded under the unattributed source prefix.
pub const VALID_PERSON_ID: &str = "valid_person_id";
pub const PERSON_ID: &str = "person_id";

/// Accumulates counter blocks keyed by composite identity.
///
/// Mutation goes through `&mut self`. Parallel producers build one
/// aggregator each and combine them with [`Metrics::absorb`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metrics {
    data_summary: DataSummary,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one increment record into the summary.
    ///
    /// Person-id fragments land under the `NA` source prefix. A required
    /// field is recorded only when the record names its source file;
    /// fields without provenance are skipped.
    pub fn ingest(&mut self, destination_table: &str, increment: &IncrementRecord) -> Result<()> {
        let name = increment.name.as_str();
        let person_fragments = [
            (VALID_PERSON_ID, increment.valid_person_id.as_ref()),
            (PERSON_ID, increment.person_id.as_ref()),
        ];
        for (kind, fragment) in person_fragments {
            if let Some(fragment) = fragment {
                let key = StageKey::new(UNATTRIBUTED_SOURCE, destination_table, name, kind);
                self.add_counts(&key.to_string(), fragment)?;
            }
        }
        for (field, fragment) in &increment.required_fields {
            let Some(prefix) = increment.source_prefix_for(field) else {
                continue;
            };
            let key = StageKey::new(prefix, destination_table, name, field.as_str());
            self.add_counts(&key.to_string(), fragment)?;
        }
        Ok(())
    }

    /// Add every counter of `fragment` to the entry at `key`.
    ///
    /// New totals are computed before anything is written, so a fragment
    /// with a non-numeric value or one that would overflow a counter leaves
    /// the summary untouched.
    pub fn add_counts(&mut self, key: &str, fragment: &Fragment) -> Result<()> {
        let mut staged = self.data_summary.get(key).cloned().unwrap_or_default();
        for (label, value) in fragment {
            let amount = value.to_count(label)?;
            staged.add(label, amount)?;
        }
        self.data_summary.insert(key.to_string(), staged);
        Ok(())
    }

    /// Add one to `counter` at `key`. Used for per-row mapstream events.
    pub fn increment(&mut self, key: &str, counter: &str) -> Result<()> {
        self.data_summary
            .entry(key.to_string())
            .or_default()
            .add(counter, 1)
    }

    /// Make sure every mapstream counter of `key` exists, so the summary
    /// reports zeroes instead of blanks for events that never happened.
    pub fn start_mapstream(&mut self, key: &MapstreamKey) {
        let block = self.data_summary.entry(key.to_string()).or_default();
        for label in labels::MAPSTREAM {
            block.seed(label);
        }
    }

    /// Fold a partial summary built elsewhere into this one.
    ///
    /// Every total is checked first; if any counter would overflow, nothing
    /// is absorbed.
    pub fn absorb(&mut self, other: Metrics) -> Result<()> {
        for (key, block) in &other.data_summary {
            if let Some(existing) = self.data_summary.get(key) {
                for (label, amount) in block.iter() {
                    existing.checked_total(label, amount)?;
                }
            }
        }
        let keys = other.data_summary.len();
        for (key, block) in other.data_summary {
            match self.data_summary.get_mut(&key) {
                Some(existing) => existing.absorb(&block)?,
                None => {
                    self.data_summary.insert(key, block);
                }
            }
        }
        debug!(keys, total_keys = self.data_summary.len(), "absorbed partial summary");
        Ok(())
    }

    /// Reduce partial summaries into one.
    pub fn combine<I>(partials: I) -> Result<Self>
    where
        I: IntoIterator<Item = Metrics>,
    {
        let mut combined = Metrics::new();
        for partial in partials {
            combined.absorb(partial)?;
        }
        Ok(combined)
    }

    pub fn data_summary(&self) -> &DataSummary {
        &self.data_summary
    }

    pub fn into_summary(self) -> DataSummary {
        self.data_summary
    }

    pub fn get(&self, key: &str) -> Option<&CounterBlock> {
        self.data_summary.get(key)
    }

    pub fn len(&self) -> usize {
        self.data_summary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_summary.is_empty()
    }
}

impl From<DataSummary> for Metrics {
    fn from(data_summary: DataSummary) -> Self {
        Self { data_summary }
    }
}
