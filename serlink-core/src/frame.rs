//! Idle-line frame capture arithmetic
//!
//! A circular receive fills a window of fixed capacity while the hardware
//! counts down a remaining-counter. When the line goes idle the number of
//! bytes received since the last rearm is `capacity - remaining` plus one
//! capacity for every full pass the stream completed. Anything beyond one
//! window did not fit and the capture is clamped to the capacity.

/// Frames shorter than this are rejected as malformed
pub const MIN_FRAME_LEN: usize = 2;

/// Result of one snapshot of the reception window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capture {
    /// Bytes that may be read out of the window
    pub len: usize,
    /// More bytes arrived than the window holds
    pub clamped: bool,
}

impl Capture {
    /// Snapshot a window of `capacity` bytes with `remaining` items left
    /// in the current pass, after `passes` full passes since the rearm
    pub fn take(capacity: usize, remaining: u16, passes: u32) -> Self {
        let in_pass = capacity.saturating_sub(usize::from(remaining));
        let received = usize::try_from(passes)
            .unwrap_or(usize::MAX)
            .saturating_mul(capacity)
            .saturating_add(in_pass);

        Self {
            len: received.min(capacity),
            clamped: received > capacity,
        }
    }

    /// The frame this capture delivers, numbered `seq`
    pub fn frame(self, seq: u32) -> Frame {
        Frame {
            len: self.len,
            overrun: self.clamped,
            seq,
        }
    }
}

/// A completed frame waiting in the reception window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    pub len: usize,
    /// Length was clamped; the start of the window was overwritten by the
    /// bytes that did not fit
    pub overrun: bool,
    /// Capture number, tells apart frames of equal length
    pub seq: u32,
}

impl Frame {
    pub fn is_valid(&self) -> bool {
        self.len >= MIN_FRAME_LEN
    }
}

/// Link counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Frames handed to the consumer
    pub frames: u32,
    /// Frames rejected for being shorter than [`MIN_FRAME_LEN`]
    pub short_frames: u32,
    /// Captures clamped to the window capacity
    pub overruns: u32,
    /// Frames replaced by a newer one before being read
    pub overwritten: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_partial_window() {
        let c = Capture::take(300, 295, 0);
        assert_eq!(c, Capture { len: 5, clamped: false });
        assert!(c.frame(0).is_valid());
    }

    #[test]
    fn test_single_byte_is_short() {
        let frame = Capture::take(300, 299, 0).frame(0);
        assert_eq!(frame.len, 1);
        assert!(!frame.is_valid());
    }

    #[test]
    fn test_nothing_received() {
        assert_eq!(Capture::take(300, 300, 0).len, 0);
    }

    #[test]
    fn test_exactly_full_window() {
        // The counter reloads to capacity on wrap, so a full pass shows
        // up as one pass with the whole window remaining
        let c = Capture::take(300, 300, 1);
        assert_eq!(c, Capture { len: 300, clamped: false });
    }

    #[test]
    fn test_wrapped_window_is_clamped() {
        let c = Capture::take(300, 290, 1);
        assert_eq!(c, Capture { len: 300, clamped: true });
        assert!(c.frame(0).overrun);
    }

    #[test]
    fn test_whole_passes_beyond_window_are_clamped() {
        // Two full passes land with the counter reloaded, like one pass
        // would, but twice the window arrived
        let c = Capture::take(8, 8, 2);
        assert_eq!(c, Capture { len: 8, clamped: true });
        assert!(Capture::take(8, 8, u32::MAX).clamped);
    }

    #[test]
    fn test_counter_above_capacity() {
        // A misprogrammed counter never yields a length above capacity
        let c = Capture::take(16, 400, 0);
        assert_eq!(c.len, 0);
    }

    proptest! {
        #[test]
        fn prop_capture_never_exceeds_capacity(
            capacity in 1usize..=1024,
            remaining in 0u16..=1024,
            passes in 0u32..=4,
        ) {
            let c = Capture::take(capacity, remaining, passes);
            prop_assert!(c.len <= capacity);
            prop_assert_eq!(c.clamped, passes >= 2 || (passes == 1 && usize::from(remaining) < capacity));
        }

        #[test]
        fn prop_unwrapped_capture_counts_received(capacity in 1usize..=1024, n in 0usize..=1024) {
            prop_assume!(n < capacity);
            let remaining = (capacity - n) as u16;
            prop_assert_eq!(
                Capture::take(capacity, remaining, 0),
                Capture { len: n, clamped: false }
            );
        }
    }
}
