//! Fixed-layout antenna designators, as printed in RINEX / ANTEX `TYPE / SERIAL NO`
//! fields.

const MODEL_WIDTH: usize = 15;
const RADOME_WIDTH: usize = 4;
const SERIAL_WIDTH: usize = 20;

fn pad(s: &str, width: usize) -> String {
    let mut out: String = s.chars().take(width).collect();
    while out.chars().count() < width {
        out.push(' ');
    }
    out
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// A receiver antenna designator: 15-char model, 1 space, 4-char radome, 20-char
/// serial (the 40-character fixed RINEX field, split into its three sub-fields).
///
/// Equality comes in two flavors: [`same_model_radome`] (serial ignored) and the
/// `PartialEq` impl below, which additionally requires matching, *non-blank*
/// serials on both sides. An antenna with an unknown serial is never "identical"
/// to anything, including another unknown-serial antenna of the same model.
#[derive(Debug, Clone)]
pub struct ReceiverAntenna {
    model: String,
    radome: String,
    serial: String,
}

impl ReceiverAntenna {
    /// Builds a designator from already-separated fields. A blank radome is
    /// rewritten to `NONE` per the RINEX convention.
    pub fn new(model: &str, radome: &str, serial: &str) -> Self {
        let radome = if blank(radome) {
            "NONE".to_string()
        } else {
            radome.trim().to_string()
        };
        Self {
            model: model.trim().to_string(),
            radome,
            serial: serial.trim().to_string(),
        }
    }

    /// Parses the fixed 40-character `model(15) radome(4) serial(20)` RINEX field.
    /// Tolerant of a shorter-than-40 line (missing trailing fields are blank).
    pub fn from_fixed_field(field: &str) -> Self {
        let chars: Vec<char> = field.chars().collect();
        let slice = |start: usize, len: usize| -> String {
            chars
                .get(start..chars.len().min(start + len))
                .map(|s| s.iter().collect::<String>())
                .unwrap_or_default()
        };
        let model = slice(0, MODEL_WIDTH);
        let radome = slice(MODEL_WIDTH + 1, RADOME_WIDTH);
        let serial = slice(MODEL_WIDTH + 1 + RADOME_WIDTH, SERIAL_WIDTH);
        Self::new(&model, &radome, &serial)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn radome(&self) -> &str {
        &self.radome
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Model+radome equality, serial ignored.
    pub fn same_model_radome(&self, other: &Self) -> bool {
        self.model == other.model && self.radome == other.radome
    }

    /// Re-serializes to the fixed 40-character field, space-padded.
    pub fn to_fixed_field(&self) -> String {
        format!(
            "{} {}{}",
            pad(&self.model, MODEL_WIDTH),
            pad(&self.radome, RADOME_WIDTH),
            pad(&self.serial, SERIAL_WIDTH)
        )
    }
}

impl PartialEq for ReceiverAntenna {
    /// "Identical" equality: model, radome and serial all match, *and* both sides
    /// carry a non-blank serial. Two antennas with unknown serials are never equal
    /// to each other under this mode, even if every other field matches; equality
    /// is undecidable without the serial, not trivially true.
    fn eq(&self, other: &Self) -> bool {
        if blank(&self.serial) || blank(&other.serial) {
            return false;
        }
        self.same_model_radome(other) && self.serial == other.serial
    }
}

impl std::fmt::Display for ReceiverAntenna {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_fixed_field())
    }
}

/// A satellite antenna designator: a 20-character free-form model name (e.g.
/// `"BLOCK IIF"`, `"GLONASS-K2"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SatelliteAntenna {
    model: String,
}

impl SatelliteAntenna {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.trim().to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Display for SatelliteAntenna {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:<20}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_radome_becomes_none() {
        let a = ReceiverAntenna::new("TRM41249.00   ", "    ", "12379133            ");
        assert_eq!(a.radome(), "NONE");
    }

    #[test]
    fn none_literal_equals_rewritten_blank() {
        let constructed = ReceiverAntenna::new("TRM41249.00", "    ", "12379133");
        let literal = ReceiverAntenna::new("TRM41249.00", "NONE", "12379133");
        assert_eq!(constructed, literal);
    }

    #[test]
    fn model_radome_match_ignores_serial() {
        let a = ReceiverAntenna::new("TRM41249.00", "NONE", "12379133");
        let b = ReceiverAntenna::new("TRM41249.00", "NONE", "99999999");
        assert!(a.same_model_radome(&b));
        assert_ne!(a, b); // different serials: not "identical"
    }

    #[test]
    fn blank_serial_never_identical() {
        let a = ReceiverAntenna::new("TRM41249.00", "NONE", "");
        let b = ReceiverAntenna::new("TRM41249.00", "NONE", "");
        assert_ne!(a, b, "undecidable equality must be false, not vacuously true");
    }

    #[test]
    fn fixed_field_roundtrip() {
        let a = ReceiverAntenna::new("TRM41249.00", "NONE", "12379133");
        let field = a.to_fixed_field();
        assert_eq!(field.len(), 40);
        let b = ReceiverAntenna::from_fixed_field(&field);
        assert_eq!(a, b);
    }

    #[test]
    fn tolerates_short_field() {
        let short = "TRM41249.00    NONE";
        let a = ReceiverAntenna::from_fixed_field(short);
        assert_eq!(a.model(), "TRM41249.00");
        assert_eq!(a.radome(), "NONE");
        assert_eq!(a.serial(), "");
    }
}
