//! Events that drive the link state machine

use crate::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// Circular reception started over the window
    Arm,
    /// Line idle after activity; window snapshotted and rearmed
    LineIdle(Frame),
    /// Consumer took this frame (or rejected it as short)
    Consumed(Frame),
    /// Reception stopped
    Disarm,
}
