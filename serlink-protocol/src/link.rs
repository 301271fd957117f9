//! Foreground side of the idle-line link

use core::fmt::Display;

use embassy_futures::block_on;
use serlink_core::{Clocks, ConfigError, LinkStats, Mode, UsartConfig};
use serlink_drivers::{DmaStreams, Registry, TransferError, Usart, UsartEvent};
use serlink_hal::{DmaRequest, DmaStream, InterruptEnable, StopBits, UsartPort};

use crate::capture::{IdleLineCapture, DEFAULT_CAPACITY};

/// A frame could not be delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Fewer than two bytes before the line went idle
    ShortFrame { len: usize },
    /// Output buffer cannot hold the frame
    BufferTooSmall { len: usize, capacity: usize },
}

impl Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ShortFrame { len } => write!(f, "short frame of {len} bytes"),
            Self::BufferTooSmall { len, capacity } => {
                write!(f, "frame of {len} bytes does not fit a {capacity} byte buffer")
            }
        }
    }
}

impl core::error::Error for FrameError {}

/// Bringing the link up failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    Config(ConfigError),
    Transfer(TransferError),
}

impl From<ConfigError> for LinkError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<TransferError> for LinkError {
    fn from(e: TransferError) -> Self {
        Self::Transfer(e)
    }
}

impl Display for LinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::Transfer(e) => write!(f, "arming reception: {e}"),
        }
    }
}

impl core::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Transfer(e) => Some(e),
        }
    }
}

/// Link parameters
///
/// The instance is identified from the port handed to
/// [`IdleLineLink::init`]; boards use UART4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    pub baud_rate: u32,
    pub clocks: Clocks,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            clocks: Clocks::default(),
        }
    }
}

impl LinkConfig {
    /// Instance configuration: asynchronous, one stop bit, idle-line
    /// interrupt, DMA in both directions
    pub fn usart_config(&self) -> UsartConfig {
        UsartConfig {
            baud_rate: self.baud_rate,
            mode: Mode::Asynchronous,
            stop_bits: StopBits::One,
            interrupts: InterruptEnable::IDLE,
            dma: DmaRequest::RX | DmaRequest::TX,
            ..UsartConfig::default()
        }
    }
}

/// Framed link over one serial instance
pub struct IdleLineLink<'d, P, D, const N: usize = DEFAULT_CAPACITY>
where
    P: UsartPort,
    D: DmaStream<'d> + Sync,
{
    usart: Usart<'d, P, D>,
    capture: &'d IdleLineCapture<'d, D, N>,
}

impl<'d, P, D, const N: usize> IdleLineLink<'d, P, D, N>
where
    P: UsartPort,
    D: DmaStream<'d> + Sync,
{
    /// Bring the instance up and start continuous reception
    ///
    /// `capture` must have been created over the instance's receive
    /// stream; `tx_stream` serves sends.
    pub fn init(
        registry: &'d Registry<'d>,
        port: &'d P,
        tx_stream: &'d D,
        capture: &'d IdleLineCapture<'d, D, N>,
        config: &LinkConfig,
    ) -> Result<Self, LinkError> {
        let streams = DmaStreams::new(capture.stream(), tx_stream);
        let usart = Usart::new(registry, port, streams, config.usart_config(), &config.clocks)?;

        // Circular passes report to the capture, not to the rx signal
        capture.stream().set_client(capture);
        registry.register(usart.id(), UsartEvent::Idle, capture);

        capture.arm();
        usart.receive_circular(capture.window())?;

        info!("{:?}: idle-line link up, {} byte window", usart.id(), N);
        Ok(Self { usart, capture })
    }

    pub fn usart(&self) -> &Usart<'d, P, D> {
        &self.usart
    }

    /// Send one frame, blocking until it left the DMA stream
    pub fn send(&self, bytes: &[u8]) -> Result<(), TransferError> {
        self.usart.send(bytes)
    }

    pub async fn send_async(&self, bytes: &[u8]) -> Result<(), TransferError> {
        self.usart.send_async(bytes).await
    }

    /// Block until the next frame and copy it into `out`
    ///
    /// Returns the frame length. Short frames are reported as errors and
    /// their bytes are not copied.
    pub fn receive(&self, out: &mut [u8]) -> Result<usize, FrameError> {
        block_on(self.receive_async(out))
    }

    pub async fn receive_async(&self, out: &mut [u8]) -> Result<usize, FrameError> {
        let frame = self.capture.next_frame().await;
        self.capture.consume(frame, out)
    }

    /// [`receive`](Self::receive) with the failure collapsed to `-1`
    pub fn receive_raw(&self, out: &mut [u8]) -> i32 {
        match self.receive(out) {
            Ok(len) => i32::try_from(len).unwrap_or(i32::MAX),
            Err(_) => -1,
        }
    }

    pub fn stats(&self) -> LinkStats {
        self.capture.stats()
    }
}

impl<'d, P, D, const N: usize> Drop for IdleLineLink<'d, P, D, N>
where
    P: UsartPort,
    D: DmaStream<'d> + Sync,
{
    fn drop(&mut self) {
        self.capture.disarm();
    }
}
