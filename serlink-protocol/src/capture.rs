//! Interrupt side of the idle-line link
//!
//! [`IdleLineCapture`] owns the reception window and sits behind the
//! instance's idle-line event and the receive stream's completion
//! callback. On idle it snapshots the window and rearms the stream in one
//! critical section, then hands the frame to the consumer.

use core::cell::Cell;

use critical_section::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use serlink_core::{Capture, Frame, InstanceId, LinkEvent, LinkState, LinkStats};
use serlink_drivers::{ReceptionWindow, UsartHandler};
use serlink_hal::{DmaClient, DmaStream};

use crate::link::FrameError;

/// Default window size in bytes
pub const DEFAULT_CAPACITY: usize = 300;

pub struct IdleLineCapture<'d, D, const N: usize = DEFAULT_CAPACITY> {
    window: ReceptionWindow<N>,
    stream: &'d D,
    frame: Signal<CriticalSectionRawMutex, Frame>,
    state: Mutex<Cell<LinkState>>,
    stats: Mutex<Cell<LinkStats>>,
    /// Full passes the stream completed since the last rearm
    passes: Mutex<Cell<u32>>,
    /// Number given to the next captured frame
    sequence: Mutex<Cell<u32>>,
}

impl<'d, D: DmaStream<'d> + Sync, const N: usize> IdleLineCapture<'d, D, N> {
    /// Capture over `stream`, the instance's receive stream
    pub const fn new(stream: &'d D) -> Self {
        Self {
            window: ReceptionWindow::new(),
            stream,
            frame: Signal::new(),
            state: Mutex::new(Cell::new(LinkState::Unarmed)),
            stats: Mutex::new(Cell::new(LinkStats {
                frames: 0,
                short_frames: 0,
                overruns: 0,
                overwritten: 0,
            })),
            passes: Mutex::new(Cell::new(0)),
            sequence: Mutex::new(Cell::new(0)),
        }
    }

    pub fn window(&self) -> &ReceptionWindow<N> {
        &self.window
    }

    pub fn stream(&self) -> &'d D {
        self.stream
    }

    pub fn state(&self) -> LinkState {
        critical_section::with(|cs| self.state.borrow(cs).get())
    }

    pub fn stats(&self) -> LinkStats {
        critical_section::with(|cs| self.stats.borrow(cs).get())
    }

    /// Forget any earlier frame; the stream is about to be started
    pub(crate) fn arm(&self) {
        self.frame.reset();
        critical_section::with(|cs| {
            self.passes.borrow(cs).set(0);
            self.apply(cs, LinkEvent::Arm);
        });
    }

    pub(crate) fn disarm(&self) {
        critical_section::with(|cs| self.apply(cs, LinkEvent::Disarm));
    }

    fn apply(&self, cs: critical_section::CriticalSection<'_>, event: LinkEvent) {
        let state = self.state.borrow(cs);
        state.set(state.get().transition(event));
    }

    fn count(&self, update: impl FnOnce(&mut LinkStats)) {
        critical_section::with(|cs| {
            let cell = self.stats.borrow(cs);
            let mut stats = cell.get();
            update(&mut stats);
            cell.set(stats);
        });
    }

    /// Wait for the next frame and take it off the queue
    ///
    /// A newer frame captured in the meantime stays pending.
    pub(crate) async fn next_frame(&self) -> Frame {
        let frame = self.frame.wait().await;
        critical_section::with(|cs| self.apply(cs, LinkEvent::Consumed(frame)));
        frame
    }

    /// Copy a frame taken with [`Self::next_frame`] out of the window
    pub(crate) fn consume(&self, frame: Frame, out: &mut [u8]) -> Result<usize, FrameError> {
        if !frame.is_valid() {
            self.count(|s| s.short_frames += 1);
            debug!("short frame ({} bytes) dropped", frame.len);
            Err(FrameError::ShortFrame { len: frame.len })
        } else if out.len() < frame.len {
            Err(FrameError::BufferTooSmall {
                len: frame.len,
                capacity: out.len(),
            })
        } else {
            let n = self.window.copy_out(frame.len, out);
            self.count(|s| s.frames += 1);
            Ok(n)
        }
    }

    /// Stop, snapshot, rearm, restart. Runs with interrupts masked so a
    /// byte arriving right behind the idle condition cannot land between
    /// the snapshot and the counter reload.
    fn snapshot_and_rearm(&self) -> Option<(Frame, bool)> {
        critical_section::with(|cs| {
            let state = self.state.borrow(cs).get();
            if !state.is_armed() {
                return None;
            }

            self.stream.stop();
            let remaining = self.stream.remaining();
            let passes = self.passes.borrow(cs).replace(0);
            self.stream.set_remaining(ReceptionWindow::<N>::LEN);
            self.stream.trigger();

            let sequence = self.sequence.borrow(cs);
            let seq = sequence.get();
            sequence.set(seq.wrapping_add(1));

            let frame = Capture::take(N, remaining, passes).frame(seq);
            let event = LinkEvent::LineIdle(frame);
            let overwrote = state.overwrites(event);
            self.apply(cs, event);
            Some((frame, overwrote))
        })
    }
}

impl<'d, D: DmaStream<'d> + Sync, const N: usize> UsartHandler for IdleLineCapture<'d, D, N> {
    fn on_idle(&self, id: InstanceId) {
        let Some((frame, overwrote)) = self.snapshot_and_rearm() else {
            return;
        };

        if overwrote {
            self.count(|s| s.overwritten += 1);
            warn!("{:?}: unread frame overwritten", id);
        }
        if frame.overrun {
            self.count(|s| s.overruns += 1);
            warn!("{:?}: more than {} bytes before idle, clamped", id, N);
        }
        self.frame.signal(frame);
    }
}

impl<'d, D: DmaStream<'d> + Sync, const N: usize> DmaClient for IdleLineCapture<'d, D, N> {
    /// Circular pass complete: the window wrapped
    fn transfer_done(&self) {
        critical_section::with(|cs| {
            let passes = self.passes.borrow(cs);
            passes.set(passes.get().saturating_add(1));
        });
    }
}
