//! Simulated USART instance and DMA streams
//!
//! Host-side stand-in for the register block and its two DMA streams.
//! Memory-sourced transfers complete as soon as they are triggered;
//! peripheral-to-memory transfers consume bytes pushed with
//! [`SimUsart::inject`]. Completion callbacks run synchronously from the
//! call that finished the transfer, the same way an interrupt would
//! preempt the code that caused it. A finished transmit pass raises
//! `TX_COMPLETE` on the owning [`SimUsart`], as the last byte leaving the
//! shift register does on hardware.
//!
//! The streams read and write the raw addresses in their descriptor, like
//! the real controller. Callers must keep the described buffers alive for
//! as long as the stream is armed.

#![allow(unsafe_code)]

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::{Deque, Vec};

use crate::dma::{DmaClient, DmaStream, TransferDescriptor, TransferDirection};
use crate::port::{DmaRequest, PortSettings, Status, UsartPort};

/// Capacity of the transmit logs
pub const LOG_CAPACITY: usize = 1024;

/// Depth of the receive FIFO used when the DMA stream is not listening
pub const RX_FIFO_DEPTH: usize = 64;

/// Status bits cleared by writing zero; `TX_EMPTY` only clears on a data write
const CLEARABLE: Status = Status::PARITY_ERROR
    .union(Status::FRAMING_ERROR)
    .union(Status::NOISE)
    .union(Status::OVERRUN)
    .union(Status::IDLE)
    .union(Status::RX_READY)
    .union(Status::TX_COMPLETE)
    .union(Status::LINE_BREAK)
    .union(Status::CTS);

struct StreamState<'a> {
    descriptor: TransferDescriptor,
    enabled: bool,
    remaining: u16,
    client: Option<&'a dyn DmaClient>,
    triggers: u32,
    configures: u32,
    drained: bool,
    transferred: Vec<u8, LOG_CAPACITY>,
}

/// Simulated DMA stream
pub struct SimDmaStream<'a> {
    state: Mutex<RefCell<StreamState<'a>>>,
}

impl Default for SimDmaStream<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SimDmaStream<'a> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(StreamState {
                descriptor: TransferDescriptor {
                    direction: TransferDirection::PeripheralToMemory,
                    width: crate::dma::DataWidth::Byte,
                    source: 0,
                    destination: 0,
                    length: 0,
                    circular: false,
                    priority: crate::dma::Priority::Low,
                },
                enabled: false,
                remaining: 0,
                client: None,
                triggers: 0,
                configures: 0,
                drained: false,
                transferred: Vec::new(),
            })),
        }
    }

    /// Number of times the stream was triggered
    pub fn trigger_count(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow_ref(cs).triggers)
    }

    /// Number of times a descriptor was written
    pub fn configure_count(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow_ref(cs).configures)
    }

    /// Last descriptor written
    pub fn descriptor(&self) -> TransferDescriptor {
        critical_section::with(|cs| self.state.borrow_ref(cs).descriptor)
    }

    /// Bytes moved to the peripheral by memory-to-peripheral transfers
    pub fn transferred(&self) -> Vec<u8, LOG_CAPACITY> {
        critical_section::with(|cs| self.state.borrow_ref(cs).transferred.clone())
    }

    /// Whether a memory-to-peripheral pass finished since the last call
    pub fn take_drained(&self) -> bool {
        critical_section::with(|cs| core::mem::take(&mut self.state.borrow_ref_mut(cs).drained))
    }

    /// Offer one byte from the peripheral
    ///
    /// Returns false when the stream is not armed for a peripheral-to-memory
    /// transfer and the byte was not taken.
    pub fn deliver(&self, byte: u8) -> bool {
        let (accepted, finished) = critical_section::with(|cs| {
            let mut s = self.state.borrow_ref_mut(cs);
            if !s.enabled
                || s.descriptor.direction != TransferDirection::PeripheralToMemory
                || s.remaining == 0
            {
                return (false, None);
            }

            let offset = usize::from(s.descriptor.length - s.remaining);
            let address = s.descriptor.destination + offset * s.descriptor.width.bytes();
            // SAFETY: the owner of the descriptor keeps the destination
            // buffer alive and sized for `length` items while armed.
            unsafe { core::ptr::write_volatile(address as *mut u8, byte) };

            s.remaining -= 1;
            if s.remaining > 0 {
                return (true, None);
            }
            if s.descriptor.circular {
                s.remaining = s.descriptor.length;
            } else {
                s.enabled = false;
            }
            (true, s.client)
        });

        if let Some(client) = finished {
            client.transfer_done();
        }
        accepted
    }

    fn run_memory_sourced(s: &mut StreamState<'a>) -> Option<&'a dyn DmaClient> {
        let d = s.descriptor;
        let width = d.width.bytes();
        let start = usize::from(d.length - s.remaining) * width;
        let end = usize::from(d.length) * width;

        for i in start..end {
            // SAFETY: the source buffer outlives the armed transfer.
            let byte = unsafe { core::ptr::read_volatile((d.source + i) as *const u8) };
            match d.direction {
                TransferDirection::MemoryToPeripheral => {
                    let _ = s.transferred.push(byte);
                }
                TransferDirection::MemoryToMemory => {
                    // SAFETY: the destination buffer outlives the armed
                    // transfer and holds `length` items.
                    unsafe { core::ptr::write_volatile((d.destination + i) as *mut u8, byte) };
                }
                TransferDirection::PeripheralToMemory => {}
            }
        }

        if d.direction == TransferDirection::MemoryToPeripheral {
            s.drained = true;
        }
        if d.circular {
            s.remaining = d.length;
        } else {
            s.remaining = 0;
            s.enabled = false;
        }
        s.client
    }
}

impl<'a> DmaStream<'a> for SimDmaStream<'a> {
    fn set_client(&self, client: &'a dyn DmaClient) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).client = Some(client));
    }

    fn configure(&self, descriptor: &TransferDescriptor) {
        critical_section::with(|cs| {
            let mut s = self.state.borrow_ref_mut(cs);
            s.descriptor = *descriptor;
            s.remaining = descriptor.length;
            s.configures += 1;
        });
    }

    fn trigger(&self) {
        let finished = critical_section::with(|cs| {
            let mut s = self.state.borrow_ref_mut(cs);
            s.enabled = true;
            s.triggers += 1;
            if s.descriptor.direction == TransferDirection::PeripheralToMemory || s.remaining == 0 {
                return None;
            }
            Self::run_memory_sourced(&mut s)
        });

        if let Some(client) = finished {
            client.transfer_done();
        }
    }

    fn stop(&self) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).enabled = false);
    }

    fn is_enabled(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).enabled)
    }

    fn remaining(&self) -> u16 {
        critical_section::with(|cs| self.state.borrow_ref(cs).remaining)
    }

    fn set_remaining(&self, count: u16) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).remaining = count);
    }
}

struct PortState {
    settings: Option<PortSettings>,
    status: Status,
    rx_fifo: Deque<u8, RX_FIFO_DEPTH>,
    written: Vec<u8, LOG_CAPACITY>,
    activity: bool,
}

/// Simulated USART instance with its receive and transmit streams
pub struct SimUsart<'a> {
    base: usize,
    port: Mutex<RefCell<PortState>>,
    rx: SimDmaStream<'a>,
    tx: SimDmaStream<'a>,
}

impl<'a> SimUsart<'a> {
    /// Create an instance answering to `base` as its register address
    pub const fn new(base: usize) -> Self {
        Self {
            base,
            port: Mutex::new(RefCell::new(PortState {
                settings: None,
                // Reset value: transmitter idle
                status: Status::TX_EMPTY.union(Status::TX_COMPLETE),
                rx_fifo: Deque::new(),
                written: Vec::new(),
                activity: false,
            })),
            rx: SimDmaStream::new(),
            tx: SimDmaStream::new(),
        }
    }

    pub fn rx_stream(&self) -> &SimDmaStream<'a> {
        &self.rx
    }

    pub fn tx_stream(&self) -> &SimDmaStream<'a> {
        &self.tx
    }

    /// Settings last programmed through [`UsartPort::apply`]
    pub fn settings(&self) -> Option<PortSettings> {
        critical_section::with(|cs| self.port.borrow_ref(cs).settings)
    }

    /// Bytes written through the data register
    pub fn written(&self) -> Vec<u8, LOG_CAPACITY> {
        critical_section::with(|cs| self.port.borrow_ref(cs).written.clone())
    }

    /// Bytes arriving on the receive line
    ///
    /// Routed into the receive stream when DMA reception is enabled and the
    /// stream is armed, otherwise into the receive FIFO.
    pub fn inject(&self, bytes: &[u8]) {
        for &byte in bytes {
            let dma_rx = critical_section::with(|cs| {
                let mut p = self.port.borrow_ref_mut(cs);
                p.activity = true;
                p.settings.is_some_and(|s| s.dma.contains(DmaRequest::RX))
            });

            if dma_rx && self.rx.deliver(byte) {
                continue;
            }

            critical_section::with(|cs| {
                let mut p = self.port.borrow_ref_mut(cs);
                if p.rx_fifo.push_back(byte).is_err() {
                    p.status |= Status::OVERRUN;
                }
            });
        }
    }

    /// Hold the line inactive for one character period
    ///
    /// Raises the idle flag only if bytes arrived since the previous idle
    /// condition. Returns whether the flag was raised.
    pub fn idle(&self) -> bool {
        critical_section::with(|cs| {
            let mut p = self.port.borrow_ref_mut(cs);
            if !p.activity {
                return false;
            }
            p.activity = false;
            p.status |= Status::IDLE;
            true
        })
    }

    /// Latch `TX_COMPLETE` if the transmit stream drained
    fn absorb_tx_drain(&self) {
        if self.tx.take_drained() {
            critical_section::with(|cs| {
                self.port.borrow_ref_mut(cs).status |= Status::TX_COMPLETE;
            });
        }
    }

    /// Raise arbitrary status flags
    pub fn raise(&self, flags: Status) {
        critical_section::with(|cs| self.port.borrow_ref_mut(cs).status |= flags);
    }
}

impl UsartPort for SimUsart<'_> {
    fn base_address(&self) -> usize {
        self.base
    }

    fn apply(&self, settings: &PortSettings) {
        critical_section::with(|cs| self.port.borrow_ref_mut(cs).settings = Some(*settings));
    }

    fn status(&self) -> Status {
        self.absorb_tx_drain();
        critical_section::with(|cs| {
            let p = self.port.borrow_ref(cs);
            let mut status = p.status;
            status.set(Status::RX_READY, !p.rx_fifo.is_empty());
            status
        })
    }

    fn clear(&self, flags: Status) {
        self.absorb_tx_drain();
        critical_section::with(|cs| self.port.borrow_ref_mut(cs).status &= !(flags & CLEARABLE));
    }

    fn read_data(&self) -> u8 {
        critical_section::with(|cs| self.port.borrow_ref_mut(cs).rx_fifo.pop_front().unwrap_or(0))
    }

    fn write_data(&self, byte: u8) {
        critical_section::with(|cs| {
            let mut p = self.port.borrow_ref_mut(cs);
            let _ = p.written.push(byte);
            // Shifted out instantly
            p.status |= Status::TX_EMPTY | Status::TX_COMPLETE;
        });
    }

    fn data_register(&self) -> usize {
        self.base + 0x04
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    use crate::dma::{DataWidth, Priority};

    struct Counter(AtomicU32);

    impl DmaClient for Counter {
        fn transfer_done(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn rx_descriptor(buf: &mut [u8], circular: bool) -> TransferDescriptor {
        TransferDescriptor {
            direction: TransferDirection::PeripheralToMemory,
            width: DataWidth::Byte,
            source: 0x4000_4C04,
            destination: buf.as_mut_ptr() as usize,
            length: buf.len() as u16,
            circular,
            priority: Priority::High,
        }
    }

    #[test]
    fn test_memory_to_peripheral_completes_on_trigger() {
        let done = Counter(AtomicU32::new(0));
        let stream = SimDmaStream::new();
        stream.set_client(&done);

        let data = [1u8, 2, 3];
        stream.configure(&TransferDescriptor {
            direction: TransferDirection::MemoryToPeripheral,
            source: data.as_ptr() as usize,
            destination: 0x4000_4C04,
            length: 3,
            ..TransferDescriptor::default()
        });
        stream.trigger();

        assert_eq!(stream.transferred().as_slice(), &data);
        assert_eq!(stream.remaining(), 0);
        assert!(!stream.is_enabled());
        assert_eq!(done.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_circular_reception_wraps() {
        let done = Counter(AtomicU32::new(0));
        let stream = SimDmaStream::new();
        stream.set_client(&done);

        let mut buf = [0u8; 4];
        stream.configure(&rx_descriptor(&mut buf, true));
        stream.trigger();

        for byte in 1..=6 {
            assert!(stream.deliver(byte));
        }

        assert!(stream.is_enabled());
        assert_eq!(stream.remaining(), 2);
        assert_eq!(done.0.load(Ordering::SeqCst), 1);
        assert_eq!(buf, [5, 6, 3, 4]);
    }

    #[test]
    fn test_stopped_stream_rejects_bytes() {
        let stream = SimDmaStream::new();
        let mut buf = [0u8; 4];
        stream.configure(&rx_descriptor(&mut buf, false));

        assert!(!stream.deliver(0x55));
        assert_eq!(stream.remaining(), 4);
    }

    #[test]
    fn test_idle_requires_activity() {
        let usart = SimUsart::new(0x4000_4C00);
        assert!(!usart.idle());

        usart.inject(&[0x10]);
        assert!(usart.idle());
        assert!(usart.status().contains(Status::IDLE | Status::RX_READY));
        assert!(!usart.idle());
    }

    #[test]
    fn test_tx_stream_drain_sets_tx_complete() {
        let usart = SimUsart::new(0x4000_4C00);
        usart.clear(Status::TX_COMPLETE);
        assert!(!usart.status().contains(Status::TX_COMPLETE));

        let data = [0xA5u8, 0x5A];
        usart.tx_stream().configure(&TransferDescriptor {
            direction: TransferDirection::MemoryToPeripheral,
            source: data.as_ptr() as usize,
            destination: usart.data_register(),
            length: 2,
            ..TransferDescriptor::default()
        });
        usart.tx_stream().trigger();

        assert!(usart.status().contains(Status::TX_COMPLETE));
        usart.clear(Status::TX_COMPLETE);
        assert!(!usart.status().contains(Status::TX_COMPLETE));
    }

    #[test]
    fn test_tx_empty_is_not_clearable() {
        let usart = SimUsart::new(0x4000_4C00);
        usart.raise(Status::CTS);
        usart.clear(Status::CTS | Status::TX_EMPTY);

        let status = usart.status();
        assert!(!status.contains(Status::CTS));
        assert!(status.contains(Status::TX_EMPTY));
    }
}
