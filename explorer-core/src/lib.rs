//! Core engine for the time-series cache: coverage ledger, RAW/WORKING
//! tables, and the durability layer that persists all of it across process
//! restarts.
//!
//! This crate is I/O-light and has no HTTP or upstream-network concerns of
//! its own; those live in `explorer-upstream` and `explorer-server`, which
//! depend on it.

pub mod coverage;
pub mod durability;
pub mod error;
pub mod raw;
pub mod sample;
pub mod settings;
pub mod signature;
pub mod working;

pub use coverage::{CoverageLedger, Interval};
pub use error::{CoreError, CoreResult};
pub use raw::{MiniTable, RawTable};
pub use sample::{Sample, TagInfo};
pub use settings::{SiteSettings, TagSettings};
pub use signature::ChangeSignature;
pub use working::{BuildOutcome, WorkingTable, WorkingTableBuilder};
