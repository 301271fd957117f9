//! Configuration record for one serial instance

use serlink_hal::{DmaRequest, FlowControl, InterruptEnable, Parity, PortSettings, StopBits};

use super::{Clocks, ConfigError, InstanceId};
use crate::prescaler::solve_baud;

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Asynchronous,
    /// Asynchronous with the bit clock driven on the clock pin
    Synchronous,
    IrDA,
    Lin,
    Smartcard,
    /// Smartcard with the card clock driven on the clock pin
    SmartcardClock,
    /// Transmit and receive share the TX pin
    SingleWireHalfDuplex,
    /// Instance left switched off
    #[default]
    Disabled,
}

impl Mode {
    fn drives_clock(self) -> bool {
        matches!(self, Mode::Synchronous | Mode::SmartcardClock)
    }

    fn is_smartcard(self) -> bool {
        matches!(self, Mode::Smartcard | Mode::SmartcardClock)
    }
}

/// Configuration record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsartConfig {
    pub baud_rate: u32,
    pub mode: Mode,
    pub hardware_flow: FlowControl,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub interrupts: InterruptEnable,
    pub dma: DmaRequest,
}

impl Default for UsartConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            mode: Mode::Disabled,
            hardware_flow: FlowControl::empty(),
            stop_bits: StopBits::One,
            parity: Parity::None,
            interrupts: InterruptEnable::empty(),
            dma: DmaRequest::empty(),
        }
    }
}

impl UsartConfig {
    /// Asynchronous 8N1 at `baud_rate`
    pub fn asynchronous(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            mode: Mode::Asynchronous,
            ..Self::default()
        }
    }

    pub fn with_interrupts(mut self, interrupts: InterruptEnable) -> Self {
        self.interrupts = interrupts;
        self
    }

    pub fn with_dma(mut self, dma: DmaRequest) -> Self {
        self.dma = dma;
        self
    }

    /// Whether DMA is enabled for `request`
    pub fn uses_dma(&self, request: DmaRequest) -> bool {
        self.mode != Mode::Disabled && self.dma.contains(request)
    }

    /// Validate against `instance` and compute its register intent
    ///
    /// A disabled record yields switched-off settings without solving the
    /// baud rate.
    pub fn settings(
        &self,
        instance: InstanceId,
        clocks: &Clocks,
    ) -> Result<PortSettings, ConfigError> {
        if self.mode == Mode::Disabled {
            return Ok(PortSettings::default());
        }

        if !instance.is_full_usart() {
            if self.mode.drives_clock() || self.mode.is_smartcard() {
                return Err(ConfigError::UnsupportedMode {
                    instance,
                    mode: self.mode,
                });
            }
            if !self.hardware_flow.is_empty() {
                return Err(ConfigError::UnsupportedFlowControl { instance });
            }
        }

        let baud = solve_baud(clocks.for_bus(instance.bus()), self.baud_rate)?;

        Ok(PortSettings {
            brr: baud.brr(),
            parity: self.parity,
            stop_bits: self.stop_bits,
            interrupts: self.interrupts,
            dma: self.dma,
            flow: self.hardware_flow,
            clock_output: self.mode.drives_clock(),
            half_duplex: self.mode == Mode::SingleWireHalfDuplex,
            lin: self.mode == Mode::Lin,
            irda: self.mode == Mode::IrDA,
            smartcard: self.mode.is_smartcard(),
            enabled: true,
        })
    }
}
