//! Data-quality metrics for CDM mapping runs.
//!
//! Producers describe how many values of each destination field survived
//! the presence, content and date-format checks as [`IncrementRecord`]s.
//! A [`Metrics`] aggregator folds them into counters keyed by source file,
//! destination table, object and field, and projects the result into a
//! stage summary or a mapstream summary.

pub mod counter;
pub mod error;
pub mod increment;
pub mod key;
pub mod metrics;
pub mod report;

pub use counter::{CountValue, CounterBlock, Fragment, fragment, labels};
pub use error::{MetricsError, Result};
pub use increment::{IncrementRecord, SourceFile};
pub use key::{MapstreamKey, StageKey, UNATTRIBUTED_SOURCE, source_prefix};
pub use metrics::{DataSummary, Metrics};
pub use report::{
    MAPSTREAM_HEADER, MapstreamSummaryRow, NOT_AVAILABLE, STAGE_HEADER, StageSummaryRow,
};
