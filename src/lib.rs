//! Command line time tracker. Work on named projects is recorded as start/stop intervals in a
//! local SQLite file, with at most one interval running at a time, and summed up into reports.
//!

pub mod cli;
pub mod storage;
pub mod tracker;
pub mod utils;
