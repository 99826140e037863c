//! Error types for tracker construction and composition

use thiserror::Error;

use crate::config::{DeviceKind, TrackerKind};

/// Result type alias
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Conditions raised while building or running trackers.
///
/// Every variant propagates unchanged to the caller of
/// [`TrackerFactory::make`](crate::factory::TrackerFactory::make);
/// nothing here is retried or papered over by picking another device.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    /// No construction routine was registered for the requested kind
    #[error("no maker registered for tracker kind {0:?}")]
    KindNotRegistered(TrackerKind),

    /// The requested device has no backend linked into this process
    #[error("tracker kind {kind:?} has no backend for device {device:?}")]
    UnsupportedDevice {
        /// Kind that was requested
        kind: TrackerKind,
        /// Device named by the configuration
        device: DeviceKind,
    },

    /// Composite slot assignment past the fixed arity
    #[error("slot {index} is out of range for a composite of {len} slots")]
    IndexOutOfRange {
        /// Requested slot
        index: usize,
        /// Number of slots in the composite
        len: usize,
    },

    /// A composite was driven before every slot was filled
    #[error("composite tracker used with empty slots {missing:?}")]
    IncompleteComposite {
        /// Indices of the slots still empty
        missing: Vec<usize>,
    },

    /// Configuration could not be read or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// The shared IMU calibrator could not be locked
    #[error("IMU calibrator unavailable: {0}")]
    Calibrator(String),
}

impl From<toml::de::Error> for TrackerError {
    fn from(e: toml::de::Error) -> Self {
        TrackerError::Config(e.to_string())
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(e: std::io::Error) -> Self {
        TrackerError::Config(e.to_string())
    }
}
