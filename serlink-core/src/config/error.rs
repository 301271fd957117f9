//! Configuration errors

use core::fmt::Display;

use serlink_hal::DmaRequest;

use super::{InstanceId, Mode};
use crate::prescaler::PrescalerError;

/// Initialization of an instance failed
///
/// Fatal for that instance; nothing has been written to its registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Base address is not one of the six serial instances
    UnknownInstance { base_address: usize },
    /// Instance lacks the hardware block the mode needs
    UnsupportedMode { instance: InstanceId, mode: Mode },
    /// Instance has no CTS/RTS lines
    UnsupportedFlowControl { instance: InstanceId },
    /// Baud rate cannot be derived from the instance's bus clock
    Baud(PrescalerError),
    /// Instance is already bound to a configuration
    AlreadyInitialized { instance: InstanceId },
    /// DMA requested for a direction without a stream to serve it
    MissingDmaStream {
        instance: InstanceId,
        request: DmaRequest,
    },
}

impl From<PrescalerError> for ConfigError {
    fn from(e: PrescalerError) -> Self {
        Self::Baud(e)
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownInstance { base_address } => {
                write!(f, "no serial instance at {base_address:#010x}")
            }
            Self::UnsupportedMode { instance, mode } => {
                write!(f, "{instance:?} does not support {mode:?} mode")
            }
            Self::UnsupportedFlowControl { instance } => {
                write!(f, "{instance:?} has no hardware flow control")
            }
            Self::Baud(e) => write!(f, "baud rate: {e}"),
            Self::AlreadyInitialized { instance } => {
                write!(f, "{instance:?} is already initialized")
            }
            Self::MissingDmaStream { instance, request } => {
                write!(f, "{instance:?} has no DMA stream for {request:?}")
            }
        }
    }
}

impl core::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Baud(e) => Some(e),
            _ => None,
        }
    }
}
