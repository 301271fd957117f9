//! USART register block abstraction
//!
//! One [`UsartPort`] is one physical serial instance. The trait exposes the
//! status register, the data register and a single "program everything"
//! entry point taking [`PortSettings`], which is the already-validated
//! register intent computed from a configuration record.

use bitflags::bitflags;

use crate::uart::{Parity, StopBits};

bitflags! {
    /// Status register flags
    ///
    /// Bit positions follow the STM32F4 `USART_SR` layout.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Status: u16 {
        /// Parity error
        const PARITY_ERROR = 1 << 0;
        /// Framing error
        const FRAMING_ERROR = 1 << 1;
        /// Noise detected
        const NOISE = 1 << 2;
        /// Receive overrun
        const OVERRUN = 1 << 3;
        /// Line idle for one character period after activity
        const IDLE = 1 << 4;
        /// Receive data register not empty
        const RX_READY = 1 << 5;
        /// Transmission complete
        const TX_COMPLETE = 1 << 6;
        /// Transmit data register empty
        const TX_EMPTY = 1 << 7;
        /// LIN break detected
        const LINE_BREAK = 1 << 8;
        /// CTS line toggled
        const CTS = 1 << 9;
    }
}

bitflags! {
    /// Interrupt sources enabled on an instance
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InterruptEnable: u8 {
        const PARITY = 1 << 0;
        const TX_EMPTY = 1 << 1;
        const TX_COMPLETE = 1 << 2;
        const RX_READY = 1 << 3;
        const IDLE = 1 << 4;
        const LINE_BREAK = 1 << 5;
        const CTS = 1 << 6;
        /// Framing, noise and overrun errors (DMA receptions)
        const ERROR = 1 << 7;
    }
}

bitflags! {
    /// DMA request lines enabled on an instance
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DmaRequest: u8 {
        const RX = 1 << 0;
        const TX = 1 << 1;
    }
}

bitflags! {
    /// Hardware flow-control lines
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FlowControl: u8 {
        const CTS = 1 << 0;
        const RTS = 1 << 1;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Status({=u16:#x})", self.bits())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for InterruptEnable {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "InterruptEnable({=u8:#x})", self.bits())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DmaRequest {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "DmaRequest({=u8:#x})", self.bits())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FlowControl {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "FlowControl({=u8:#x})", self.bits())
    }
}

/// Register intent for one instance
///
/// Produced by configuration validation; an implementation only has to
/// translate each field into its control-register bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortSettings {
    /// Baud-rate register value (`mantissa << 4 | fraction`)
    pub brr: u16,
    /// Parity generation/checking
    pub parity: Parity,
    /// Stop-bit field
    pub stop_bits: StopBits,
    /// Interrupt sources to enable
    pub interrupts: InterruptEnable,
    /// DMA request lines to enable
    pub dma: DmaRequest,
    /// Hardware flow control lines
    pub flow: FlowControl,
    /// Drive the synchronous clock pin
    pub clock_output: bool,
    /// Single-wire half-duplex select
    pub half_duplex: bool,
    /// LIN mode enable
    pub lin: bool,
    /// IrDA encoder enable
    pub irda: bool,
    /// Smartcard mode enable
    pub smartcard: bool,
    /// Peripheral enable; false leaves the instance switched off
    pub enabled: bool,
}

/// Register block of one physical USART instance
///
/// All methods take `&self`: registers are shared between foreground code
/// and the instance's interrupt handler, exactly as the hardware is.
pub trait UsartPort {
    /// Base address identifying the physical instance
    fn base_address(&self) -> usize;

    /// Program baud rate, framing, interrupt and DMA enables
    fn apply(&self, settings: &PortSettings);

    /// Read the status register once
    fn status(&self) -> Status;

    /// Clear the given status flags
    fn clear(&self, flags: Status);

    /// Read the data register
    fn read_data(&self) -> u8;

    /// Write the data register
    fn write_data(&self, byte: u8);

    /// Address of the data register, used as the DMA peripheral address
    fn data_register(&self) -> usize;
}
