//! Error definitions for the mapping module

use crate::mapping::DeviceClass;
use thiserror::Error;

/// Errors raised while resolving or replacing mapping tables
#[derive(Debug, Error)]
pub enum MappingError {
    /// The device class was never declared in the mapping set
    #[error("Unsupported device class: {0}")]
    UnsupportedDevice(String),

    /// A button table was given for the axes class or vice versa
    #[error("Table kind mismatch for {class}: expected a {expected} table")]
    TableKind {
        class: DeviceClass,
        expected: &'static str,
    },
}
