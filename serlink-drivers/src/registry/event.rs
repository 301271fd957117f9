//! Dispatched interrupt events and their handlers

use serlink_core::InstanceId;
use serlink_hal::Status;

/// Event kinds, declared in service order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsartEvent {
    Cts,
    LineBreak,
    TxEmpty,
    TxComplete,
    RxReady,
    /// Serviced after the basic transmit/receive events of the same
    /// interrupt
    Idle,
    ParityError,
}

impl UsartEvent {
    pub const COUNT: usize = 7;

    /// Order in which one interrupt's flags are serviced
    pub const SERVICE_ORDER: [UsartEvent; Self::COUNT] = [
        UsartEvent::Cts,
        UsartEvent::LineBreak,
        UsartEvent::TxEmpty,
        UsartEvent::TxComplete,
        UsartEvent::RxReady,
        UsartEvent::Idle,
        UsartEvent::ParityError,
    ];

    /// Status flag that signals this event
    pub const fn flag(self) -> Status {
        match self {
            UsartEvent::Cts => Status::CTS,
            UsartEvent::LineBreak => Status::LINE_BREAK,
            UsartEvent::TxEmpty => Status::TX_EMPTY,
            UsartEvent::TxComplete => Status::TX_COMPLETE,
            UsartEvent::RxReady => Status::RX_READY,
            UsartEvent::Idle => Status::IDLE,
            UsartEvent::ParityError => Status::PARITY_ERROR,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Per-instance event callbacks
///
/// Runs in interrupt context. Implement only the events of interest; a
/// handler must also be registered for each event kind it should see.
pub trait UsartHandler: Sync {
    fn on_cts(&self, _id: InstanceId) {}
    fn on_line_break(&self, _id: InstanceId) {}
    fn on_tx_empty(&self, _id: InstanceId) {}
    fn on_tx_complete(&self, _id: InstanceId) {}
    fn on_rx_ready(&self, _id: InstanceId) {}
    fn on_idle(&self, _id: InstanceId) {}
    fn on_parity_error(&self, _id: InstanceId) {}

    /// Route `event` to its callback
    fn handle(&self, id: InstanceId, event: UsartEvent) {
        match event {
            UsartEvent::Cts => self.on_cts(id),
            UsartEvent::LineBreak => self.on_line_break(id),
            UsartEvent::TxEmpty => self.on_tx_empty(id),
            UsartEvent::TxComplete => self.on_tx_complete(id),
            UsartEvent::RxReady => self.on_rx_ready(id),
            UsartEvent::Idle => self.on_idle(id),
            UsartEvent::ParityError => self.on_parity_error(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_service_order() {
        for (i, event) in UsartEvent::SERVICE_ORDER.into_iter().enumerate() {
            assert_eq!(event.index(), i);
        }
    }

    #[test]
    fn test_flags_are_distinct() {
        let mut all = Status::empty();
        for event in UsartEvent::SERVICE_ORDER {
            assert!(!all.intersects(event.flag()));
            all |= event.flag();
        }
    }
}
