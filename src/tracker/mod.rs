//! The tracking core: the work session state machine ([session]), report window boundaries
//! ([window]) and time aggregation ([report]). Nothing in here prints or logs, results are
//! handed back as plain values.

pub mod error;
pub mod report;
pub mod session;
pub mod window;
