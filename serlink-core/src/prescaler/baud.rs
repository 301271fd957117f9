//! USART baud-rate divisor
//!
//! The peripheral divides its bus clock by `OVERSAMPLING * USARTDIV`, where
//! USARTDIV is a fixed-point value with a 12-bit mantissa and a 4-bit
//! fraction in sixteenths. The baud-rate register holds
//! `mantissa << 4 | fraction`.

use super::{error_percent, PrescalerError, Solution};

/// Samples per bit (OVER8 = 0)
pub const OVERSAMPLING: u32 = 16;

/// Sub-steps of the fractional part
pub const FRACTION_STEPS: u32 = 16;

/// Largest mantissa the register can hold
pub const MAX_MANTISSA: u32 = 0xFFF;

/// Compute the baud-rate divisor for `baud` from a `clock_hz` bus clock
///
/// The fractional remainder is rounded to the nearest sixteenth; a
/// fraction rounding up to 16/16 carries into the mantissa.
pub fn solve_baud(clock_hz: u32, baud: u32) -> Result<Solution, PrescalerError> {
    if clock_hz == 0 {
        return Err(PrescalerError::ZeroClock);
    }
    if baud == 0 {
        return Err(PrescalerError::ZeroTarget);
    }

    // USARTDIV in sixteenths: clock * 16 / (16 * baud), rounded
    let denominator = u64::from(OVERSAMPLING) * u64::from(baud);
    let numerator = u64::from(clock_hz) * u64::from(FRACTION_STEPS);
    let steps = (numerator + denominator / 2) / denominator;

    let mantissa = steps / u64::from(FRACTION_STEPS);
    let fraction = steps % u64::from(FRACTION_STEPS);

    if mantissa == 0 || mantissa > u64::from(MAX_MANTISSA) {
        return Err(PrescalerError::OutOfRange {
            clock_hz,
            target_hz: baud,
        });
    }

    // Total division applied to the clock, scaled by FRACTION_STEPS
    let division = u64::from(OVERSAMPLING) * steps;
    let clock_scaled = u64::from(clock_hz) * u64::from(FRACTION_STEPS);

    Ok(Solution {
        coarse: mantissa as u32,
        fine: fraction as u32,
        actual_hz: (clock_scaled as f64 / division as f64) as f32,
        error_percent: error_percent(clock_scaled, division, u64::from(baud)),
    })
}

impl Solution {
    /// Baud-rate register value for a [`solve_baud`] result
    pub fn brr(&self) -> u16 {
        ((self.coarse << 4) | (self.fine & 0xF)) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_divisor() {
        // 42 MHz / (16 * 2625000) = 1.0
        let s = solve_baud(42_000_000, 2_625_000).unwrap();
        assert_eq!(s.coarse, 1);
        assert_eq!(s.fine, 0);
        assert!(s.is_exact());
    }

    #[test]
    fn test_115200_on_apb1() {
        // 42 MHz / (16 * 115200) = 22.786 -> 22 + 13/16 = 22.8125
        let s = solve_baud(42_000_000, 115_200).unwrap();
        assert_eq!(s.coarse, 22);
        assert_eq!(s.fine, 13);
        assert_eq!(s.brr(), (22 << 4) | 13);
        assert!(s.error_percent > 0.11 && s.error_percent < 0.12);

        let deviation = s.actual_hz - 115_068.5;
        assert!(deviation > -1.0 && deviation < 1.0);
    }

    #[test]
    fn test_9600_on_apb2() {
        // 84 MHz / (16 * 9600) = 546.875 -> 546 + 14/16 exactly
        let s = solve_baud(84_000_000, 9_600).unwrap();
        assert_eq!(s.coarse, 546);
        assert_eq!(s.fine, 14);
        assert!(s.is_exact());
    }

    #[test]
    fn test_fraction_carries_into_mantissa() {
        // 16 * 1000 * 9.99 -> 9.99 rounds to 10 + 0/16
        let s = solve_baud(159_840, 1_000).unwrap();
        assert_eq!(s.coarse, 10);
        assert_eq!(s.fine, 0);
    }

    #[test]
    fn test_zero_inputs() {
        assert_eq!(solve_baud(0, 9600), Err(PrescalerError::ZeroClock));
        assert_eq!(solve_baud(42_000_000, 0), Err(PrescalerError::ZeroTarget));
    }

    #[test]
    fn test_out_of_range() {
        // Faster than clock / 16
        assert!(matches!(
            solve_baud(42_000_000, 42_000_000),
            Err(PrescalerError::OutOfRange { .. })
        ));
        // Slower than clock / (16 * 4095.9375)
        assert!(matches!(
            solve_baud(84_000_000, 300),
            Err(PrescalerError::OutOfRange { .. })
        ));
    }
}
