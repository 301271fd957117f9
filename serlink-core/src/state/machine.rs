//! Link state definition

use super::events::LinkEvent;
use crate::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No reception running
    #[default]
    Unarmed,
    /// Circular reception running, no unread data
    Armed,
    /// A frame is queued for the consumer
    FrameCaptured(Frame),
}

impl LinkState {
    pub fn is_armed(&self) -> bool {
        !matches!(self, LinkState::Unarmed)
    }

    /// Whether `event` would replace a frame nobody has read
    pub fn overwrites(&self, event: LinkEvent) -> bool {
        matches!(
            (self, event),
            (LinkState::FrameCaptured(_), LinkEvent::LineIdle(_))
        )
    }

    /// Process an event and return the next state
    pub fn transition(self, event: LinkEvent) -> Self {
        use LinkEvent::*;
        use LinkState::*;

        match (self, event) {
            (Unarmed, Arm) => Armed,

            (Armed, LineIdle(frame)) => FrameCaptured(frame),
            // Consumer too slow: newest frame wins
            (FrameCaptured(_), LineIdle(frame)) => FrameCaptured(frame),
            // Only the frame still pending; a newer one stays queued
            (FrameCaptured(pending), Consumed(frame)) if pending == frame => Armed,

            (_, Disarm) => Unarmed,

            // Default: stay in current state
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(len: usize) -> Frame {
        Frame {
            len,
            overrun: false,
            seq: len as u32,
        }
    }

    #[test]
    fn test_arm_then_capture() {
        let state = LinkState::Unarmed.transition(LinkEvent::Arm);
        assert_eq!(state, LinkState::Armed);

        let captured = state.transition(LinkEvent::LineIdle(frame(5)));
        assert_eq!(captured, LinkState::FrameCaptured(frame(5)));

        assert_eq!(captured.transition(LinkEvent::Consumed(frame(5))), LinkState::Armed);
    }

    #[test]
    fn test_idle_before_arm_is_ignored() {
        let state = LinkState::Unarmed.transition(LinkEvent::LineIdle(frame(3)));
        assert_eq!(state, LinkState::Unarmed);
    }

    #[test]
    fn test_unread_frame_is_overwritten() {
        let captured = LinkState::Armed.transition(LinkEvent::LineIdle(frame(4)));
        assert!(captured.overwrites(LinkEvent::LineIdle(frame(7))));

        let next = captured.transition(LinkEvent::LineIdle(frame(7)));
        assert_eq!(next, LinkState::FrameCaptured(frame(7)));
        assert!(!LinkState::Armed.overwrites(LinkEvent::LineIdle(frame(7))));
    }

    #[test]
    fn test_consumed_without_frame_keeps_state() {
        assert_eq!(
            LinkState::Armed.transition(LinkEvent::Consumed(frame(3))),
            LinkState::Armed
        );
    }

    #[test]
    fn test_consuming_older_frame_keeps_newer_pending() {
        let older = Frame { seq: 1, ..frame(4) };
        let newer = Frame { seq: 2, ..frame(4) };
        let state = LinkState::Armed
            .transition(LinkEvent::LineIdle(older))
            .transition(LinkEvent::LineIdle(newer));

        let state = state.transition(LinkEvent::Consumed(older));
        assert_eq!(state, LinkState::FrameCaptured(newer));
        // A third frame still counts as overwriting the newer one
        assert!(state.overwrites(LinkEvent::LineIdle(frame(9))));
    }

    #[test]
    fn test_disarm_from_any_state() {
        for state in [LinkState::Unarmed, LinkState::Armed, LinkState::FrameCaptured(frame(2))] {
            let next = state.transition(LinkEvent::Disarm);
            assert_eq!(next, LinkState::Unarmed);
            assert!(!next.is_armed());
        }
    }
}
