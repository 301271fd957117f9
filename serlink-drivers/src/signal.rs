//! Interrupt-to-foreground completion handshake
//!
//! One [`CompletionSignal`] exists per (instance, direction). The
//! interrupt side releases it, the single foreground waiter consumes it.
//! At most one release may be outstanding between two waits; a second
//! transfer on the same direction must not be armed before the first one
//! was waited for.

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use serlink_hal::DmaClient;

pub struct CompletionSignal {
    inner: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionSignal {
    pub const fn new() -> Self {
        Self {
            inner: Signal::new(),
        }
    }

    /// Mark the transfer complete. Safe from interrupt context.
    pub fn release(&self) {
        self.inner.signal(());
    }

    /// Wait for the release and consume it
    pub async fn wait(&self) {
        self.inner.wait().await
    }

    /// Spin until released, then consume it
    ///
    /// Never times out.
    pub fn wait_blocking(&self) {
        block_on(self.wait())
    }

    /// Drop a stale release. Call before arming a transfer.
    pub fn reset(&self) {
        self.inner.reset();
    }

    /// Consume the release if it already happened
    pub fn try_take(&self) -> bool {
        self.inner.try_take().is_some()
    }

    pub fn is_released(&self) -> bool {
        self.inner.signaled()
    }
}

impl DmaClient for CompletionSignal {
    fn transfer_done(&self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn test_release_then_wait() {
        let signal = CompletionSignal::new();
        signal.release();
        assert!(signal.is_released());

        signal.wait_blocking();
        assert!(!signal.is_released());
    }

    #[test]
    fn test_reset_drops_stale_release() {
        let signal = CompletionSignal::new();
        signal.release();
        signal.reset();
        assert!(!signal.try_take());
    }

    #[test]
    fn test_releases_do_not_accumulate() {
        let signal = CompletionSignal::new();
        signal.release();
        signal.release();
        assert!(signal.try_take());
        assert!(!signal.try_take());
    }

    #[test]
    fn test_release_from_other_context() {
        let signal = CompletionSignal::new();
        std::thread::scope(|s| {
            s.spawn(|| {
                std::thread::sleep(std::time::Duration::from_millis(10));
                signal.transfer_done();
            });
            signal.wait_blocking();
        });
        assert!(!signal.is_released());
    }
}
