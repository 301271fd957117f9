//! Instance registry and interrupt dispatch
//!
//! One [`InstanceSlot`] per physical instance holds the instance's bound
//! configuration, its two completion signals and its event handler
//! table. Slots share nothing with each other, so interrupts of
//! different instances never touch the same state.

pub mod event;
pub mod slot;

pub use event::{UsartEvent, UsartHandler};
pub use slot::InstanceSlot;

use serlink_core::{ConfigError, InstanceId, UsartConfig};
use serlink_hal::{TransferDirection, UsartPort};

/// All six instance slots
pub struct Registry<'a> {
    slots: [InstanceSlot<'a>; InstanceId::COUNT],
}

impl Default for Registry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Registry<'a> {
    pub const fn new() -> Self {
        Self {
            slots: [
                InstanceSlot::new(InstanceId::Usart1),
                InstanceSlot::new(InstanceId::Usart2),
                InstanceSlot::new(InstanceId::Usart3),
                InstanceSlot::new(InstanceId::Uart4),
                InstanceSlot::new(InstanceId::Uart5),
                InstanceSlot::new(InstanceId::Usart6),
            ],
        }
    }

    pub fn slot(&self, id: InstanceId) -> &InstanceSlot<'a> {
        &self.slots[id.index()]
    }

    /// Attach a configuration to an instance
    pub fn bind(&self, id: InstanceId, config: UsartConfig) -> Result<(), ConfigError> {
        self.slot(id).bind(config)
    }

    /// Detach the configuration and every handler
    pub fn unbind(&self, id: InstanceId) {
        self.slot(id).unbind();
    }

    pub fn config(&self, id: InstanceId) -> Option<UsartConfig> {
        self.slot(id).config()
    }

    /// Install `handler` for one event kind, replacing any previous one
    pub fn register(&self, id: InstanceId, event: UsartEvent, handler: &'a dyn UsartHandler) {
        self.slot(id).set_handler(event, Some(handler));
    }

    pub fn unregister(&self, id: InstanceId, event: UsartEvent) {
        self.slot(id).set_handler(event, None);
    }

    /// Service the interrupt of instance `id`
    ///
    /// Reads the status register once, then for every set event flag in
    /// [`UsartEvent::SERVICE_ORDER`] runs the registered handler (if any)
    /// and clears the flag. Flags of events without a handler are cleared
    /// too.
    pub fn on_interrupt<P: UsartPort + ?Sized>(&self, id: InstanceId, port: &P) {
        let status = port.status();
        let handlers = self.slot(id).handlers();

        for event in UsartEvent::SERVICE_ORDER {
            let flag = event.flag();
            if !status.contains(flag) {
                continue;
            }
            match handlers[event.index()] {
                Some(handler) => handler.handle(id, event),
                None => trace!("{:?}: unhandled {:?}", id, event),
            }
            port.clear(flag);
        }
    }

    /// Service a DMA transfer-complete interrupt routed by instance
    ///
    /// For boards whose DMA interrupts are dispatched by instance rather
    /// than through the stream's [`serlink_hal::DmaClient`].
    pub fn on_dma_complete(&self, id: InstanceId, direction: TransferDirection) {
        let slot = self.slot(id);
        match direction {
            TransferDirection::MemoryToPeripheral => slot.tx_done().release(),
            TransferDirection::PeripheralToMemory => slot.rx_done().release(),
            TransferDirection::MemoryToMemory => {}
        }
    }
}
