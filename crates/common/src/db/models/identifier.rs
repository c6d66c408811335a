//! Central Index Key (CIK) identifier

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Width of the canonical, zero-padded CIK used in registry URLs
pub const CIK_WIDTH: usize = 10;

/// Registry identifier for one filing entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cik(u64);

impl Cik {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Fixed-width, zero-padded form expected by the submissions endpoint
    pub fn padded(&self) -> String {
        format!("{:0width$}", self.0, width = CIK_WIDTH)
    }

    /// Read a CIK from a registry JSON value.
    ///
    /// Registry documents are inconsistent: the ticker file and the facts
    /// datasets carry a JSON number, while submissions carry a digit string
    /// (sometimes zero-padded). Both normalize to the same key.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(Self),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Cik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Cik {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

impl From<u64> for Cik {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
