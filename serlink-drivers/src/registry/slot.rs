//! Per-instance state

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use serlink_core::{ConfigError, InstanceId, UsartConfig};

use super::event::{UsartEvent, UsartHandler};
use crate::signal::CompletionSignal;

type HandlerTable<'a> = [Option<&'a dyn UsartHandler>; UsartEvent::COUNT];

pub struct InstanceSlot<'a> {
    id: InstanceId,
    tx_done: CompletionSignal,
    rx_done: CompletionSignal,
    config: Mutex<CriticalSectionRawMutex, Cell<Option<UsartConfig>>>,
    handlers: Mutex<CriticalSectionRawMutex, Cell<HandlerTable<'a>>>,
}

impl<'a> InstanceSlot<'a> {
    pub const fn new(id: InstanceId) -> Self {
        Self {
            id,
            tx_done: CompletionSignal::new(),
            rx_done: CompletionSignal::new(),
            config: Mutex::new(Cell::new(None)),
            handlers: Mutex::new(Cell::new([None; UsartEvent::COUNT])),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Released when a memory-to-peripheral transfer finishes
    pub fn tx_done(&self) -> &CompletionSignal {
        &self.tx_done
    }

    /// Released when a non-circular peripheral-to-memory transfer finishes
    pub fn rx_done(&self) -> &CompletionSignal {
        &self.rx_done
    }

    pub fn config(&self) -> Option<UsartConfig> {
        self.config.lock(|c| c.get())
    }

    pub(crate) fn bind(&self, config: UsartConfig) -> Result<(), ConfigError> {
        self.config.lock(|c| {
            if c.get().is_some() {
                return Err(ConfigError::AlreadyInitialized { instance: self.id });
            }
            c.set(Some(config));
            Ok(())
        })
    }

    pub(crate) fn unbind(&self) {
        self.config.lock(|c| c.set(None));
        self.handlers.lock(|h| h.set([None; UsartEvent::COUNT]));
    }

    pub(crate) fn set_handler(&self, event: UsartEvent, handler: Option<&'a dyn UsartHandler>) {
        self.handlers.lock(|h| {
            let mut table = h.get();
            table[event.index()] = handler;
            h.set(table);
        });
    }

    /// Snapshot of the handler table
    pub(crate) fn handlers(&self) -> HandlerTable<'a> {
        self.handlers.lock(|h| h.get())
    }
}
