//! Composite keys for the data summary.
//!
//! Two key shapes share one flat mapping:
//!
//! - stage keys, `source.table.name.column`, read by the stage summary;
//! - mapstream keys, `source~field~table`, read by the mapstream summary.
//!
//! Components must not contain their shape's delimiter. Producers sanitize
//! names before building keys; parsing rejects keys with the wrong arity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};

/// Source prefix for counters that are not attributable to one source file.
pub const UNATTRIBUTED_SOURCE: &str = "NA";

pub const STAGE_DELIMITER: char = '.';
pub const MAPSTREAM_DELIMITER: char = '~';

/// Returns the part of a qualified source name before the first `.`.
///
/// `demographics.csv` becomes `demographics`; a name without a dot is
/// returned unchanged.
pub fn source_prefix(qualified: &str) -> &str {
    qualified
        .split_once(STAGE_DELIMITER)
        .map_or(qualified, |(prefix, _)| prefix)
}

/// Key of a field-level validation stage entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StageKey {
    pub source: String,
    pub table: String,
    pub name: String,
    pub column: String,
}

impl StageKey {
    pub fn new(
        source: impl Into<String>,
        table: impl Into<String>,
        name: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            table: table.into(),
            name: name.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = STAGE_DELIMITER;
        write!(
            f,
            "{}{d}{}{d}{}{d}{}",
            self.source, self.table, self.name, self.column
        )
    }
}

impl FromStr for StageKey {
    type Err = MetricsError;

    fn from_str(key: &str) -> Result<Self> {
        let parts: Vec<&str> = key.split(STAGE_DELIMITER).collect();
        match parts.as_slice() {
            [source, table, name, column] => Ok(Self::new(*source, *table, *name, *column)),
            _ => Err(MetricsError::MalformedKey {
                key: key.to_string(),
                expected: "source.table.name.column",
            }),
        }
    }
}

/// Key of a per-source-field mapstream entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MapstreamKey {
    /// Qualified source name, e.g. `demographics.csv`.
    pub source: String,
    pub field: String,
    pub table: String,
}

impl MapstreamKey {
    pub fn new(
        source: impl Into<String>,
        field: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            field: field.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for MapstreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = MAPSTREAM_DELIMITER;
        write!(f, "{}{d}{}{d}{}", self.source, self.field, self.table)
    }
}

impl FromStr for MapstreamKey {
    type Err = MetricsError;

    fn from_str(key: &str) -> Result<Self> {
        let parts: Vec<&str> = key.split(MAPSTREAM_DELIMITER).collect();
        match parts.as_slice() {
            [source, field, table] => Ok(Self::new(*source, *field, *table)),
            _ => Err(MetricsError::MalformedKey {
                key: key.to_string(),
                expected: "source~field~table",
            }),
        }
    }
}
