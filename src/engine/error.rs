use thiserror::Error;

use crate::controller::HostError;
use crate::dispatch::RegistrationError;
use crate::mapping::MappingError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Mapping error: {0}")]
    MappingError(#[from] MappingError),

    #[error("Registration error: {0}")]
    RegistrationError(#[from] RegistrationError),

    #[error("Host error: {0}")]
    HostError(#[from] HostError),

    #[error("Threshold {0} is outside [0, 1)")]
    InvalidThreshold(f32),
}
