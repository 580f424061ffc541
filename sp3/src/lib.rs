//! Streaming reader for SP3-c/d precise orbit and clock files: one header
//! parse, then one `(epoch, satellite entries)` tuple per `next_epoch` call.
//!
//! This crate carries no interpolator and no estimator; it hands a
//! positioning engine the raw, per-epoch position/velocity/clock samples the
//! file actually contains.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod header;
pub mod lexer;
pub mod record;
pub mod reader;
pub mod version;

pub use gnss_core;

pub mod prelude {
    pub use gnss_core::prelude::*;

    pub use crate::error::Sp3Error;
    pub use crate::header::{DataType, Header, OrbitType};
    pub use crate::reader::{EpochStatus, Sp3Reader, StreamStatus};
    pub use crate::record::{EntryFlags, Sp3Entry, MISSING_CLOCK_SENTINEL_US};
    pub use crate::version::{UnsupportedVersion, Version};
}
