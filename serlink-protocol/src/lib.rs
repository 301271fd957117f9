//! Idle-line framing protocol
//!
//! Variable-length messages over one serial instance, delimited by the
//! line going idle instead of a length prefix or sync byte:
//!
//! ```text
//!  bytes ─▶ circular DMA ─▶ reception window (capacity C)
//!                                 │
//!  line idle ─▶ stop, snapshot C - remaining, rearm, restart
//!                                 │
//!                                 ▼
//!                        frame signal ─▶ receive()
//! ```
//!
//! The window is single-buffered. A frame still unread when the next idle
//! event fires is replaced by the newer one and counted in
//! [`serlink_core::LinkStats::overwritten`]. Frames shorter than
//! [`serlink_core::MIN_FRAME_LEN`] are rejected.

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod capture;
pub mod link;

pub use capture::{IdleLineCapture, DEFAULT_CAPACITY};
pub use link::{FrameError, IdleLineLink, LinkConfig, LinkError};
