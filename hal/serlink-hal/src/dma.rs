//! DMA stream abstraction
//!
//! A [`DmaStream`] is one hardware channel. It is re-armed for every
//! transfer by writing a fresh [`TransferDescriptor`]; completion is
//! reported through the [`DmaClient`] registered on the stream, from the
//! stream's interrupt handler.

/// Direction of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferDirection {
    #[default]
    PeripheralToMemory,
    MemoryToPeripheral,
    MemoryToMemory,
}

/// Width of one transferred item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataWidth {
    #[default]
    Byte,
    HalfWord,
    Word,
}

impl DataWidth {
    /// Size of one item in bytes
    pub const fn bytes(self) -> usize {
        match self {
            DataWidth::Byte => 1,
            DataWidth::HalfWord => 2,
            DataWidth::Word => 4,
        }
    }
}

/// Arbitration priority of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Everything a stream needs for one transfer
///
/// Owned by exactly one (instance, direction) pair and overwritten on
/// every arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferDescriptor {
    pub direction: TransferDirection,
    pub width: DataWidth,
    /// Source address (data register for peripheral-to-memory)
    pub source: usize,
    /// Destination address (data register for memory-to-peripheral)
    pub destination: usize,
    /// Number of items to move
    pub length: u16,
    /// Wrap to the start of the buffer instead of stopping
    pub circular: bool,
    pub priority: Priority,
}

/// Receiver of a stream's transfer-complete interrupt
///
/// Called from interrupt context.
pub trait DmaClient: Sync {
    fn transfer_done(&self);
}

/// One DMA stream
pub trait DmaStream<'a> {
    /// Register the completion callback
    fn set_client(&self, client: &'a dyn DmaClient);

    /// Write addresses, length and mode. The stream must be stopped.
    fn configure(&self, descriptor: &TransferDescriptor);

    /// Enable the stream; transfers start on the next peripheral request
    fn trigger(&self);

    /// Disable the stream and wait until the hardware reports it stopped
    fn stop(&self);

    /// Whether the stream is currently enabled
    fn is_enabled(&self) -> bool;

    /// Items still to be transferred (the live remaining-counter)
    fn remaining(&self) -> u16;

    /// Reload the remaining-counter. The stream must be stopped.
    fn set_remaining(&self, count: u16);
}
