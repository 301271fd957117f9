//! Timer trigger divisors
//!
//! A timer produces `clock / ((PSC + 1) * (ARR + 1))` update events per
//! second. A prescaler qualifies only when its ideal reload value
//! `clock / ((PSC + 1) * target) - 1` lies within `0..=max_reload`; for each
//! one that does, the solver evaluates the two integer reload counts
//! bracketing the ideal and keeps the pair with the smallest relative
//! error. Errors are compared as exact fractions so the result does not
//! depend on float rounding.
//!
//! When no prescaler qualifies the target is unreachable and the solver
//! returns [`PrescalerError::OutOfRange`].

use super::{error_percent, PrescalerError, Solution};

/// Inclusive register maxima of the search space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Limits {
    /// Largest prescaler register value
    pub max_prescaler: u32,
    /// Largest auto-reload register value
    pub max_reload: u32,
}

impl Limits {
    /// 16-bit prescaler and 16-bit reload (TIM1, TIM3, ...)
    pub const TIMER_16BIT: Limits = Limits {
        max_prescaler: 0xFFFF,
        max_reload: 0xFFFF,
    };
}

impl Default for Limits {
    fn default() -> Self {
        Self::TIMER_16BIT
    }
}

/// Best candidate so far, error kept as `deviation / produced`
#[derive(Clone, Copy)]
struct Candidate {
    prescaler: u64,
    count: u64,
    deviation: u64,
    produced: u64,
}

impl Candidate {
    fn better_than(&self, other: &Candidate) -> bool {
        u128::from(self.deviation) * u128::from(other.produced)
            < u128::from(other.deviation) * u128::from(self.produced)
    }
}

/// Solve for a 16-bit timer
pub fn solve_timer(clock_hz: u32, target_hz: u32) -> Result<Solution, PrescalerError> {
    solve_timer_within(clock_hz, target_hz, Limits::TIMER_16BIT)
}

/// Solve within an explicit search space
///
/// Stops early on an exact match; ties keep the smaller prescaler.
pub fn solve_timer_within(
    clock_hz: u32,
    target_hz: u32,
    limits: Limits,
) -> Result<Solution, PrescalerError> {
    if clock_hz == 0 {
        return Err(PrescalerError::ZeroClock);
    }
    if target_hz == 0 {
        return Err(PrescalerError::ZeroTarget);
    }

    let clock = u64::from(clock_hz);
    let target = u64::from(target_hz);
    let max_count = u64::from(limits.max_reload) + 1;
    let mut best: Option<Candidate> = None;

    for prescaler in 0..=u64::from(limits.max_prescaler) {
        let division = (prescaler + 1) * target;
        // Ideal reload below zero or above the register maximum
        if clock < division || clock > division * max_count {
            continue;
        }
        let ideal = clock / division;

        for count in [ideal, ideal + 1] {
            if count > max_count {
                continue;
            }
            let produced = division * count;
            let candidate = Candidate {
                prescaler,
                count,
                deviation: clock.abs_diff(produced),
                produced,
            };
            if best.map_or(true, |b| candidate.better_than(&b)) {
                best = Some(candidate);
            }
        }

        if best.is_some_and(|b| b.deviation == 0) {
            break;
        }
    }

    let best = best.ok_or(PrescalerError::OutOfRange {
        clock_hz,
        target_hz,
    })?;
    let total = (best.prescaler + 1) * best.count;

    Ok(Solution {
        coarse: best.prescaler as u32,
        fine: (best.count - 1) as u32,
        actual_hz: (clock as f64 / total as f64) as f32,
        error_percent: error_percent(clock, total, target),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Smallest achievable relative error, by trying every reload of every
    /// prescaler whose ideal reload is representable
    fn brute_force(clock: u32, target: u32, limits: Limits) -> Option<(u64, u64)> {
        let mut best: Option<(u64, u64)> = None;
        let max_count = u64::from(limits.max_reload) + 1;
        for psc in 0..=u64::from(limits.max_prescaler) {
            let division = u64::from(target) * (psc + 1);
            if u64::from(clock) < division || u64::from(clock) > division * max_count {
                continue;
            }
            for arr in 0..=u64::from(limits.max_reload) {
                let produced = u64::from(target) * (psc + 1) * (arr + 1);
                let deviation = u64::from(clock).abs_diff(produced);
                let better = best.map_or(true, |(d, p)| {
                    u128::from(deviation) * u128::from(p) < u128::from(d) * u128::from(produced)
                });
                if better {
                    best = Some((deviation, produced));
                }
            }
        }
        best
    }

    #[test]
    fn test_168mhz_to_1khz() {
        let s = solve_timer(168_000_000, 1000).unwrap();
        // PSC 0 and 1 need reloads above 65535; PSC 2 divides exactly
        assert_eq!(s.coarse, 2);
        assert_eq!(s.fine, 55_999);
        assert!(s.is_exact());
        assert_eq!(s.actual_hz, 1000.0);
    }

    #[test]
    fn test_exact_divisors_have_zero_error() {
        for (clock, target) in [(168_000_000, 50_000), (84_000_000, 1), (16_000_000, 4)] {
            let s = solve_timer(clock, target).unwrap();
            let total = u64::from(s.coarse + 1) * u64::from(s.fine + 1);
            assert_eq!(total * u64::from(target), u64::from(clock));
            assert!(s.is_exact());
        }
    }

    #[test]
    fn test_inexact_target() {
        // 168 MHz / 13 Hz is not integral, so no pair can be exact
        let s = solve_timer(168_000_000, 13).unwrap();
        assert!(!s.is_exact());
        assert!(s.error_percent < 0.001);
    }

    #[test]
    fn test_target_above_clock() {
        // Every ideal reload is negative
        assert_eq!(
            solve_timer(1000, 5000),
            Err(PrescalerError::OutOfRange {
                clock_hz: 1000,
                target_hz: 5000,
            })
        );
    }

    #[test]
    fn test_target_too_slow_for_range() {
        let limits = Limits {
            max_prescaler: 3,
            max_reload: 3,
        };
        // Slowest reachable rate is clock / 16
        assert_eq!(
            solve_timer_within(1600, 1, limits),
            Err(PrescalerError::OutOfRange {
                clock_hz: 1600,
                target_hz: 1,
            })
        );
        // clock / 16 itself is the last reachable rate
        let s = solve_timer_within(1600, 100, limits).unwrap();
        assert_eq!((s.coarse, s.fine), (3, 3));
        assert!(s.is_exact());
    }

    #[test]
    fn test_skips_prescalers_with_out_of_range_reload() {
        let limits = Limits {
            max_prescaler: 7,
            max_reload: 3,
        };
        // PSC 0..=3 would need reloads above 3; PSC 4 divides exactly
        let s = solve_timer_within(1000, 50, limits).unwrap();
        assert_eq!((s.coarse, s.fine), (4, 3));
        assert!(s.is_exact());
    }

    #[test]
    fn test_zero_inputs() {
        assert_eq!(solve_timer(0, 1000), Err(PrescalerError::ZeroClock));
        assert_eq!(solve_timer(168_000_000, 0), Err(PrescalerError::ZeroTarget));
    }

    proptest! {
        #[test]
        fn prop_matches_brute_force(clock in 1u32..200_000, target in 1u32..5_000) {
            let limits = Limits { max_prescaler: 63, max_reload: 63 };
            let solved = solve_timer_within(clock, target, limits);
            let Some((deviation, produced)) = brute_force(clock, target, limits) else {
                prop_assert_eq!(
                    solved,
                    Err(PrescalerError::OutOfRange { clock_hz: clock, target_hz: target })
                );
                return Ok(());
            };
            let s = solved.unwrap();

            let total = u64::from(s.coarse + 1) * u64::from(s.fine + 1);
            let ours_produced = u64::from(target) * total;
            let ours_deviation = u64::from(clock).abs_diff(ours_produced);

            // Same relative error as the exhaustive optimum
            prop_assert_eq!(
                u128::from(ours_deviation) * u128::from(produced),
                u128::from(deviation) * u128::from(ours_produced)
            );
        }
    }
}
