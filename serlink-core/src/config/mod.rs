//! Configuration types
//!
//! A [`UsartConfig`] record describes one serial instance. It is validated
//! against the instance it targets and translated into
//! [`serlink_hal::PortSettings`], the register intent a port applies.

pub mod error;
pub mod instance;
pub mod types;

pub use error::ConfigError;
pub use instance::{ClockBus, Clocks, InstanceId};
pub use types::{Mode, UsartConfig};
