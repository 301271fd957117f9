//! UART serial communication abstractions
//!
//! Byte-stream traits a serial driver offers to application code, and the
//! line-format enums shared by configuration and register programming.

/// Blocking transmit half of a serial instance
pub trait UartTx {
    type Error;

    /// Send all of `data`; returns once the last byte was handed to the
    /// peripheral
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.write_blocking(&[byte])
    }

    /// Wait until the last byte left the shift register
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Blocking receive half of a serial instance
pub trait UartRx {
    type Error;

    /// Fill `buf` completely and return its length
    ///
    /// There is no timeout: a silent line blocks forever.
    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut byte = [0u8];
        self.read_blocking(&mut byte)?;
        Ok(byte[0])
    }
}

/// Both halves on one instance
pub trait Uart: UartTx + UartRx {}

impl<T: UartTx + UartRx> Uart for T {}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

/// Number of stop bits
///
/// The discriminants match the two-bit STOP field of the control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    #[default]
    One = 0b00,
    Half = 0b01,
    Two = 0b10,
    OneAndHalf = 0b11,
}

impl StopBits {
    /// Value of the STOP field for this setting
    pub const fn field(self) -> u8 {
        self as u8
    }
}
