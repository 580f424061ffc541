//! Shared primitives for the GNSS data-plane crates: constellation tags, satellite
//! identity, epochs and observable codes. No file I/O lives here; see the `rinex` and
//! `sp3` crates for the format-specific readers built on top of these types.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod antenna;
pub mod constellation;
pub mod epoch;
pub mod observable;
pub mod sv;

pub mod prelude {
    pub use crate::antenna::{ReceiverAntenna, SatelliteAntenna};
    pub use crate::constellation::Constellation;
    pub use crate::epoch::Epoch;
    pub use crate::observable::{GnssObservable, Observable, ObservableKind};
    pub use crate::sv::SV;
}
