//! Library components of the CDM metrics reporter.

pub mod logging;
pub mod replay;
