//! Transfer errors

use core::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// More items than one DMA transfer can move
    TooLong { len: usize, max: usize },
    /// Operation needs a DMA stream for this direction
    DmaRequired,
    /// Instance is configured as disabled
    NotInitialized,
}

impl Display for TransferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooLong { len, max } => {
                write!(f, "transfer of {len} bytes exceeds the {max} byte limit")
            }
            Self::DmaRequired => write!(f, "no DMA stream for this direction"),
            Self::NotInitialized => write!(f, "instance is disabled"),
        }
    }
}

impl core::error::Error for TransferError {}

impl embedded_io::Error for TransferError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::TooLong { .. } => embedded_io::ErrorKind::InvalidInput,
            Self::DmaRequired => embedded_io::ErrorKind::Unsupported,
            Self::NotInitialized => embedded_io::ErrorKind::NotConnected,
        }
    }
}
