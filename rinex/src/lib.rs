//! Streaming readers for RINEX Observation v3.x, RINEX Navigation v3.x and ANTEX,
//! plus the broadcast-ephemeris evaluators (Keplerian and GLONASS) that turn a
//! navigation frame into an ECEF position and clock offset at an arbitrary epoch.
//!
//! This crate is the "hard part" of the data plane described in the workspace
//! README: it owns no estimator, no tropo/iono model, and no CLI surface. It reads
//! files and hands a positioning engine synchronized `(epoch, satellite, values)`
//! tuples and `(position, clock)` evaluations.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod antex;
pub mod bernese;
pub mod lexer;
pub mod navigation;
pub mod observation;
pub mod recipe;
pub mod reader;

pub use gnss_core;

pub mod prelude {
    pub use gnss_core::prelude::*;

    pub use crate::antex::{AntexError, AntexReader, MatchQuality, Pco};
    pub use crate::bernese::{BerneseError, BerneseRecord, BerneseTable};
    pub use crate::navigation::{
        EvaluationError, NavigationError, NavigationReader, NavigationStatus, NavFrame,
    };
    pub use crate::observation::{
        EpochFlag, ObsEpoch, ObservationError, ObservationReader, ObservationStatus, RawSample,
    };
    pub use crate::recipe::{RecipeError, RecipeOptions, RecipePlan};
    pub use crate::reader::StreamStatus;
}
