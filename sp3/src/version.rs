//! SP3 file-format revision. Only `c` and `d` are read; earlier revisions
//! (`a`, `b`) used a different, GPS-only record layout this crate doesn't
//! parse.
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    C,
    D,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported SP3 revision \"{0}\"; only 'c' and 'd' are read")]
pub struct UnsupportedVersion(pub String);

impl std::str::FromStr for Version {
    type Err = UnsupportedVersion;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c" => Ok(Self::C),
            "d" => Ok(Self::D),
            other => Err(UnsupportedVersion(other.to_string())),
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::C => f.write_str("c"),
            Self::D => f.write_str("d"),
        }
    }
}
