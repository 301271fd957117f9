//! Board-agnostic core logic for the serlink serial transport
//!
//! This crate contains everything that does not touch hardware:
//!
//! - Prescaler solver (baud-rate divisors, timer trigger divisors)
//! - Configuration record and its translation into register intent
//! - Physical instance identity
//! - Idle-line frame capture arithmetic and link state machine

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod frame;
pub mod prescaler;
pub mod state;

pub use config::{ClockBus, Clocks, ConfigError, InstanceId, Mode, UsartConfig};
pub use frame::{Capture, Frame, LinkStats, MIN_FRAME_LEN};
pub use prescaler::{PrescalerError, Solution};
pub use state::{LinkEvent, LinkState};
