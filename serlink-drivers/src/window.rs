//! DMA reception window
//!
//! Fixed-capacity buffer written by a circular receive stream while the
//! foreground reads completed frames out of it. The stream writes through
//! a raw address, so the buffer lives in an `UnsafeCell` and is only ever
//! read with volatile loads.

#![allow(unsafe_code)]

use core::cell::UnsafeCell;

pub struct ReceptionWindow<const N: usize> {
    buf: UnsafeCell<[u8; N]>,
}

// SAFETY: the only writer is the DMA stream; foreground reads are volatile
// and the framing protocol reads a region only after the stream was
// stopped and rearmed past it.
unsafe impl<const N: usize> Sync for ReceptionWindow<N> {}

impl<const N: usize> Default for ReceptionWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ReceptionWindow<N> {
    /// Capacity as a DMA item count
    pub const LEN: u16 = {
        assert!(N > 0 && N <= u16::MAX as usize, "window must fit the DMA counter");
        N as u16
    };

    pub const fn new() -> Self {
        let _ = Self::LEN;
        Self {
            buf: UnsafeCell::new([0; N]),
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Address handed to the DMA stream
    pub fn address(&self) -> usize {
        self.buf.get() as usize
    }

    /// Copy the first `len` bytes into `out`
    ///
    /// Copies `min(len, N, out.len())` bytes and returns that count.
    pub fn copy_out(&self, len: usize, out: &mut [u8]) -> usize {
        let n = len.min(N).min(out.len());
        let base = self.buf.get() as *const u8;
        for (i, slot) in out[..n].iter_mut().enumerate() {
            // SAFETY: i < N, inside the buffer
            *slot = unsafe { core::ptr::read_volatile(base.add(i)) };
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity() {
        let window = ReceptionWindow::<300>::new();
        assert_eq!(window.capacity(), 300);
        assert_eq!(ReceptionWindow::<300>::LEN, 300);
    }

    #[test]
    fn test_copy_out_is_bounded() {
        let window = ReceptionWindow::<4>::new();
        let mut out = [0xAAu8; 8];
        assert_eq!(window.copy_out(10, &mut out), 4);
        assert_eq!(out, [0, 0, 0, 0, 0xAA, 0xAA, 0xAA, 0xAA]);

        let mut small = [0u8; 2];
        assert_eq!(window.copy_out(4, &mut small), 2);
    }
}
