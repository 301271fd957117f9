//! Idle-line link state machine
//!
//! Tracks the reception window between rearms. The interrupt side feeds
//! [`LinkEvent::LineIdle`], the consumer feeds [`LinkEvent::Consumed`].

pub mod events;
pub mod machine;

pub use events::LinkEvent;
pub use machine::LinkState;
