//! Interrupt-driven serial drivers
//!
//! Implementations written against the `serlink-hal` traits:
//!
//! - Transfer engine ([`Usart`]): DMA-backed send/receive with a polled
//!   fallback, blocking and async
//! - Instance registry and interrupt dispatch ([`Registry`])
//! - Interrupt-to-foreground handshake ([`CompletionSignal`])
//! - DMA reception window ([`ReceptionWindow`])

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod registry;
pub mod signal;
pub mod usart;
pub mod window;

pub use registry::{InstanceSlot, Registry, UsartEvent, UsartHandler};
pub use signal::CompletionSignal;
pub use usart::{DmaStreams, TransferError, Usart};
pub use window::ReceptionWindow;
