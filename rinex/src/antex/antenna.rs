//! The parsed shape of one ANTEX `START OF ANTENNA` ... `END OF ANTENNA` block:
//! identity, optional validity window (satellite antennas only) and the mean
//! phase-center offset per frequency. No PCV grid is retained; this data plane
//! only extracts PCO.
use gnss_core::prelude::{Constellation, Epoch, SV};

/// Mean phase-center offset, millimeters, in the antenna's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pco {
    pub north_mm: f64,
    pub east_mm: f64,
    pub up_mm: f64,
}

/// One `START OF FREQUENCY` sub-block: the RINEX frequency designator
/// (`G01`, `E05`, `R01`...) and its PCO.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyPco {
    pub channel: String,
    pub pco: Pco,
}

/// Which kind of antenna a block describes: a ground-receiver antenna
/// (matched by model/radome/serial) or a spacecraft antenna (matched by
/// constellation/PRN and validity window).
#[derive(Debug, Clone, PartialEq)]
pub enum AntennaIdentity {
    Receiver { serial: Option<String> },
    Satellite { sv: SV, valid_from: Epoch, valid_until: Option<Epoch> },
}

/// One parsed antenna calibration block.
#[derive(Debug, Clone, PartialEq)]
pub struct Antenna {
    /// Antenna model plus radome code, as broadcast (e.g. `"TRM41249.00NONE"`).
    pub type_designator: String,
    pub identity: AntennaIdentity,
    pub frequencies: Vec<FrequencyPco>,
}

impl Antenna {
    pub fn is_satellite(&self) -> bool {
        matches!(self.identity, AntennaIdentity::Satellite { .. })
    }

    pub fn serial(&self) -> Option<&str> {
        match &self.identity {
            AntennaIdentity::Receiver { serial } => serial.as_deref(),
            AntennaIdentity::Satellite { .. } => None,
        }
    }

    pub fn sv(&self) -> Option<SV> {
        match &self.identity {
            AntennaIdentity::Satellite { sv, .. } => Some(*sv),
            AntennaIdentity::Receiver { .. } => None,
        }
    }

    /// `true` if this is a satellite antenna whose validity window covers `t`.
    /// `VALID UNTIL` absent means open-ended, per the ANTEX convention.
    pub fn covers(&self, t: Epoch) -> bool {
        match &self.identity {
            AntennaIdentity::Satellite { valid_from, valid_until, .. } => {
                t >= *valid_from && valid_until.map_or(true, |until| t <= until)
            },
            AntennaIdentity::Receiver { .. } => false,
        }
    }

    pub fn pco(&self, channel: &str) -> Option<Pco> {
        self.frequencies.iter().find(|f| f.channel == channel).map(|f| f.pco)
    }

    pub fn constellation(&self) -> Option<Constellation> {
        self.sv().map(|sv| sv.constellation)
    }
}
