//! Physical instance identity
//!
//! The six serial instances of the STM32F4 family, identified by the base
//! address of their register block.

use super::ConfigError;

/// Peripheral bus an instance is clocked from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockBus {
    Apb1,
    Apb2,
}

/// Bus clock frequencies
///
/// Supplied by whoever owns the clock tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    pub apb1_hz: u32,
    pub apb2_hz: u32,
}

impl Default for Clocks {
    /// 168 MHz system clock with the usual /4 and /2 bus dividers
    fn default() -> Self {
        Self {
            apb1_hz: 42_000_000,
            apb2_hz: 84_000_000,
        }
    }
}

impl Clocks {
    pub fn for_bus(&self, bus: ClockBus) -> u32 {
        match bus {
            ClockBus::Apb1 => self.apb1_hz,
            ClockBus::Apb2 => self.apb2_hz,
        }
    }
}

/// One of the six serial instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InstanceId {
    Usart1,
    Usart2,
    Usart3,
    Uart4,
    Uart5,
    Usart6,
}

impl InstanceId {
    /// Number of instances
    pub const COUNT: usize = 6;

    /// All instances in index order
    pub const ALL: [InstanceId; Self::COUNT] = [
        InstanceId::Usart1,
        InstanceId::Usart2,
        InstanceId::Usart3,
        InstanceId::Uart4,
        InstanceId::Uart5,
        InstanceId::Usart6,
    ];

    /// Identify an instance by its register block address
    pub fn from_base_address(base_address: usize) -> Result<Self, ConfigError> {
        Self::ALL
            .into_iter()
            .find(|id| id.base_address() == base_address)
            .ok_or(ConfigError::UnknownInstance { base_address })
    }

    pub const fn base_address(self) -> usize {
        match self {
            InstanceId::Usart1 => 0x4001_1000,
            InstanceId::Usart2 => 0x4000_4400,
            InstanceId::Usart3 => 0x4000_4800,
            InstanceId::Uart4 => 0x4000_4C00,
            InstanceId::Uart5 => 0x4000_5000,
            InstanceId::Usart6 => 0x4001_1400,
        }
    }

    /// Zero-based index, stable across builds
    pub const fn index(self) -> usize {
        match self {
            InstanceId::Usart1 => 0,
            InstanceId::Usart2 => 1,
            InstanceId::Usart3 => 2,
            InstanceId::Uart4 => 3,
            InstanceId::Uart5 => 4,
            InstanceId::Usart6 => 5,
        }
    }

    pub const fn bus(self) -> ClockBus {
        match self {
            InstanceId::Usart1 | InstanceId::Usart6 => ClockBus::Apb2,
            _ => ClockBus::Apb1,
        }
    }

    /// Full USART: clock pin, smartcard block and CTS/RTS lines.
    /// UART4 and UART5 are asynchronous-only.
    pub const fn is_full_usart(self) -> bool {
        !matches!(self, InstanceId::Uart4 | InstanceId::Uart5)
    }
}
