//! Transfer engine for one serial instance
//!
//! A [`Usart`] binds a port to its slot in the [`Registry`] and moves
//! bytes either through the instance's DMA streams or, for directions
//! without DMA, by polling the status register. Every wait is unbounded:
//! a peripheral that never completes blocks its caller forever.
//!
//! At most one transfer per direction may be in flight. The type takes
//! `&self` for transfers, so the caller is responsible for not starting
//! a second send (or receive) from another context while one is pending.

mod error;
mod io;
mod transfer;

pub use error::TransferError;

use serlink_core::{Clocks, ConfigError, InstanceId, Mode, UsartConfig};
use serlink_hal::{DmaRequest, DmaStream, Status, UsartPort};

use crate::registry::{InstanceSlot, Registry};

/// DMA streams serving an instance
pub struct DmaStreams<'d, D> {
    pub rx: Option<&'d D>,
    pub tx: Option<&'d D>,
}

impl<'d, D> DmaStreams<'d, D> {
    pub fn new(rx: &'d D, tx: &'d D) -> Self {
        Self {
            rx: Some(rx),
            tx: Some(tx),
        }
    }

    /// Polled operation only
    pub fn none() -> Self {
        Self { rx: None, tx: None }
    }
}

impl<D> Default for DmaStreams<'_, D> {
    fn default() -> Self {
        Self::none()
    }
}

pub struct Usart<'d, P: UsartPort, D: DmaStream<'d>> {
    id: InstanceId,
    port: &'d P,
    registry: &'d Registry<'d>,
    config: UsartConfig,
    rx: Option<&'d D>,
    tx: Option<&'d D>,
}

impl<'d, P: UsartPort, D: DmaStream<'d>> Usart<'d, P, D> {
    /// Initialize an instance
    ///
    /// The instance is identified from the port's base address. Nothing
    /// is written to the port unless every check passes: known instance,
    /// supported mode, solvable baud rate, a stream for every DMA
    /// direction requested and no previous binding.
    pub fn new(
        registry: &'d Registry<'d>,
        port: &'d P,
        streams: DmaStreams<'d, D>,
        config: UsartConfig,
        clocks: &Clocks,
    ) -> Result<Self, ConfigError> {
        let id = InstanceId::from_base_address(port.base_address())?;
        let settings = config.settings(id, clocks)?;
        let rx = lane(id, &config, DmaRequest::RX, streams.rx)?;
        let tx = lane(id, &config, DmaRequest::TX, streams.tx)?;

        registry.bind(id, config)?;
        port.apply(&settings);

        let slot = registry.slot(id);
        if let Some(stream) = rx {
            stream.set_client(slot.rx_done());
        }
        if let Some(stream) = tx {
            stream.set_client(slot.tx_done());
        }

        info!(
            "{:?}: {} baud, {:?}, brr={}",
            id, config.baud_rate, config.mode, settings.brr
        );
        if config.mode != Mode::Disabled && (rx.is_none() || tx.is_none()) {
            debug!("{:?}: polled rx={} tx={}", id, rx.is_none(), tx.is_none());
        }

        Ok(Self {
            id,
            port,
            registry,
            config,
            rx,
            tx,
        })
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn config(&self) -> &UsartConfig {
        &self.config
    }

    pub fn port(&self) -> &'d P {
        self.port
    }

    /// Receive stream, when reception uses DMA
    pub fn rx_stream(&self) -> Option<&'d D> {
        self.rx
    }

    pub fn tx_stream(&self) -> Option<&'d D> {
        self.tx
    }

    pub(crate) fn slot(&self) -> &'d InstanceSlot<'d> {
        self.registry.slot(self.id)
    }

    /// Clear pending status flags
    ///
    /// Reads the status register then the data register, the sequence
    /// that clears the receive error and idle flags. Returns the flags
    /// that were pending.
    pub fn clear_status(&self) -> Status {
        let pending = self.port.status();
        let _ = self.port.read_data();
        self.port.clear(pending);
        pending
    }

    fn ensure_enabled(&self) -> Result<(), TransferError> {
        if self.config.mode == Mode::Disabled {
            return Err(TransferError::NotInitialized);
        }
        Ok(())
    }
}

impl<'d, P: UsartPort, D: DmaStream<'d>> Drop for Usart<'d, P, D> {
    fn drop(&mut self) {
        for stream in [self.rx, self.tx].into_iter().flatten() {
            stream.stop();
        }
        self.registry.unbind(self.id);
    }
}

/// Stream for one direction, if the configuration enables DMA for it
fn lane<'d, D>(
    id: InstanceId,
    config: &UsartConfig,
    request: DmaRequest,
    stream: Option<&'d D>,
) -> Result<Option<&'d D>, ConfigError> {
    if !config.uses_dma(request) {
        return Ok(None);
    }
    stream
        .map(Some)
        .ok_or(ConfigError::MissingDmaStream {
            instance: id,
            request,
        })
}
