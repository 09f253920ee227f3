//! Transfer progress of an in-flight load.

use std::fmt;

/// Bytes transferred so far out of the (possibly unknown) total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub loaded: u64,
    pub total: u64,
}

impl Progress {
    pub fn new(loaded: u64, total: u64) -> Self {
        Self { loaded, total }
    }

    /// Percentage in `0..=100`.
    ///
    /// The denominator is `max(total, loaded)` so an unknown (zero) or
    /// understated total never divides by zero or exceeds 100%.
    pub fn percent(&self) -> u8 {
        let denom = self.total.max(self.loaded);
        if denom == 0 {
            return 0;
        }
        (self.loaded as f64 / denom as f64 * 100.0).round() as u8
    }
}

/// Which file of a load is being transferred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStage {
    Materials,
    Model,
}

impl LoadStage {
    /// Status line shown while this stage is in flight.
    pub fn status(&self, percent: u8) -> String {
        match self {
            LoadStage::Materials => format!("Loading materials... {percent}%"),
            LoadStage::Model => format!("Loading... {percent}%"),
        }
    }
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStage::Materials => f.write_str("materials"),
            LoadStage::Model => f.write_str("model"),
        }
    }
}
