//! Serlink Hardware Abstraction Layer
//!
//! This crate defines the hardware seams of the serial transport: the
//! register block of one physical USART instance and the DMA stream that
//! moves bytes between that instance and memory. Chip-specific firmware
//! implements the traits; everything above them (baud math, interrupt
//! dispatch, the transfer engine and the framing protocol) is written
//! against the traits only.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  serlink-protocol (idle-line framing)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  serlink-drivers (transfer engine,      │
//! │  instance registry, dispatch)           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  serlink-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ board firmware│       │  sim (host)   │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`port::UsartPort`] - Status, data and control registers of one instance
//! - [`dma::DmaStream`], [`dma::DmaClient`] - DMA channel and its completion callback
//! - [`uart::UartTx`], [`uart::UartRx`] - Blocking byte-stream interface

#![no_std]
#![deny(unsafe_code)]

pub mod dma;
pub mod port;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use dma::{DataWidth, DmaClient, DmaStream, Priority, TransferDescriptor, TransferDirection};
pub use port::{DmaRequest, FlowControl, InterruptEnable, PortSettings, Status, UsartPort};
pub use uart::{Parity, StopBits, UartRx, UartTx};
