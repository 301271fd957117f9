//! Prescaler solver
//!
//! Finds coarse/fine divisor pairs that bring a reference clock as close
//! as possible to a target rate. Two variants share the result type:
//!
//! - [`baud`]: closed-form USART divisor (mantissa + fractional sixteenths)
//! - [`timer`]: exhaustive prescaler/reload search for a timer trigger
//!
//! Both are meant for one-time initialization. The timer search walks the
//! whole prescaler range and must not be called on a hot path.

pub mod baud;
pub mod timer;

use core::fmt::Display;

pub use baud::solve_baud;
pub use timer::{solve_timer, solve_timer_within, Limits};

/// Best divisor pair found for a target rate
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Solution {
    /// Coarse divisor (baud mantissa, or timer prescaler register value)
    pub coarse: u32,
    /// Fine divisor (baud fraction in sixteenths, or timer reload register value)
    pub fine: u32,
    /// Frequency actually produced
    pub actual_hz: f32,
    /// Relative deviation from the target, in percent (always >= 0)
    pub error_percent: f32,
}

impl Solution {
    /// True when the divisors reproduce the target exactly
    pub fn is_exact(&self) -> bool {
        self.error_percent == 0.0
    }
}

/// No divisor pair reaches the target
///
/// Callers treat this as a fatal configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PrescalerError {
    /// Reference clock of 0 Hz
    ZeroClock,
    /// Target rate of 0 Hz
    ZeroTarget,
    /// Every candidate falls outside the representable divisor range
    OutOfRange { clock_hz: u32, target_hz: u32 },
}

impl Display for PrescalerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ZeroClock => write!(f, "reference clock is 0 Hz"),
            Self::ZeroTarget => write!(f, "target rate is 0 Hz"),
            Self::OutOfRange {
                clock_hz,
                target_hz,
            } => write!(
                f,
                "no divisor pair derives {target_hz} Hz from a {clock_hz} Hz clock"
            ),
        }
    }
}

impl core::error::Error for PrescalerError {}

/// Relative error `|num/den - target| / target` in percent, from exact
/// integers: `num` is the clock, `den` the total division applied.
fn error_percent(clock: u64, division: u64, target: u64) -> f32 {
    let produced = target * division;
    let deviation = clock.abs_diff(produced);
    (deviation as f64 * 100.0 / produced as f64) as f32
}
