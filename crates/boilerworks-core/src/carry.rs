//! Lossless integer quantization with persistent carries.
//!
//! Both the work engine and the power bridge face the same problem:
//! converting between discrete unit systems (power x time, flow x dose,
//! native x packet) with truncating integer arithmetic. Each routine here
//! returns the truncation remainder alongside its result so the caller
//! can feed it back into the next call. Summed over many calls the
//! delivered totals converge on the true totals.
//!
//! Invariant for every carry in this module: `0 <= carry < divisor`.
//! A value outside that range is a programmer error, not a runtime
//! condition, and trips a `debug_assert`.

// ---------------------------------------------------------------------------
// Throttle
// ---------------------------------------------------------------------------

/// Result of rescaling a (power, duration) pair by a throttle ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttled {
    /// Adjusted per-tick power, never below the configured floor.
    pub power: i64,
    /// Adjusted duration in ticks, never below 1.
    pub duration: i64,
    /// Power-time remainder to pass into the next call. In `[0, power)`.
    pub carry: i64,
}

/// Rescale `nominal_power` over `nominal_duration` ticks to run at
/// `throttle_percent` of nominal power, stretching the duration so the
/// `power * duration` product is preserved.
///
/// `floor` is the minimum applied power (a throttled machine still has to
/// do *something* each tick). `carry` is the power-time remainder from
/// the previous call; the truncation error of this call is folded in,
/// whole extra ticks are paid out, and the new remainder is returned.
///
/// Over N identical calls, `sum(power_i * duration_i)` stays within one
/// `power` of `N * nominal_power * nominal_duration`. When the floor
/// dominates (`floor > nominal_power * percent / 100`) the minimum-one-tick
/// rule can overspend; that is the floor's purpose.
pub fn throttle(
    nominal_power: i64,
    nominal_duration: i64,
    throttle_percent: u32,
    floor: i64,
    carry: i64,
) -> Throttled {
    debug_assert!(nominal_power > 0, "throttle needs positive power");
    debug_assert!(nominal_duration > 0, "throttle needs positive duration");
    debug_assert!(
        (1..=100).contains(&throttle_percent),
        "throttle percent out of range: {throttle_percent}"
    );
    debug_assert!(floor > 0, "power floor must be positive");
    debug_assert!(carry >= 0, "carry must be non-negative");

    let power = (nominal_power * throttle_percent as i64 / 100).max(floor);
    let mut duration = nominal_duration * nominal_power / power;
    let mut carry = carry + nominal_power * nominal_duration - power * duration;
    duration += carry / power;
    carry %= power;

    debug_assert!((0..power).contains(&carry));

    Throttled {
        power,
        duration: duration.max(1),
        carry,
    }
}

// ---------------------------------------------------------------------------
// Dose batching
// ---------------------------------------------------------------------------

/// Batch a flow amount into whole doses, quotient/remainder style.
///
/// Used where delivery may lag production: the fractional part waits in
/// the carry until enough accumulates for a whole dose.
pub fn whole_doses(flow: i64, dose_size: i64, carry: i64) -> (i64, i64) {
    debug_assert!(flow >= 0);
    debug_assert!(dose_size > 0);
    debug_assert!((0..dose_size).contains(&carry));

    let total = flow + carry;
    (total / dose_size, total % dose_size)
}

/// Dose cost for a produced output amount, ceiling-then-correct.
///
/// The cost of `output` units is rounded *up* to whole doses so delivery
/// never lags production; the overshoot accumulates in the carry and is
/// deducted once it covers a whole dose. Net effect: over a long run the
/// doses charged equal `total_output / dose_size` to within one dose, and
/// the carry never reaches `dose_size`.
pub fn doses_for_output(output: i64, dose_size: i64, carry: i64) -> (i64, i64) {
    debug_assert!(output >= 0);
    debug_assert!(dose_size > 0);
    debug_assert!((0..dose_size).contains(&carry));

    let mut count = (output + dose_size - 1) / dose_size;
    let mut carry = carry + count * dose_size - output;
    count -= carry / dose_size;
    carry %= dose_size;

    debug_assert!(count >= 0);
    debug_assert!((0..dose_size).contains(&carry));
    (count, carry)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Test 1: Worked throttle example (120 power, 10 ticks, 83%)
    // -----------------------------------------------------------------------
    #[test]
    fn throttle_worked_example() {
        let t = throttle(120, 10, 83, 25, 0);
        assert_eq!(t.power, 99); // 120 * 83 / 100 = 99
        assert_eq!(t.duration, 12); // 10 * 120 / 99 = 12
        assert_eq!(t.carry, 12); // 1200 - 99 * 12 = 12
    }

    // -----------------------------------------------------------------------
    // Test 2: Throttle carry accumulates and pays out whole ticks
    // -----------------------------------------------------------------------
    #[test]
    fn throttle_carry_pays_out_extra_ticks() {
        // Each call leaves 12 behind; after 9 calls (carry 108 >= 99)
        // a bonus tick must have been paid out.
        let mut carry = 0;
        let mut total = 0i64;
        let mut bonus_paid = false;
        for _ in 0..9 {
            let t = throttle(120, 10, 83, 25, carry);
            carry = t.carry;
            total += t.power * t.duration;
            if t.duration == 13 {
                bonus_paid = true;
            }
        }
        assert!(bonus_paid, "accumulated carry never produced a bonus tick");
        // Conservation within one adjusted power unit.
        assert!((total - 9 * 1200).abs() < 99, "drift: {}", total - 9 * 1200);
    }

    // -----------------------------------------------------------------------
    // Test 3: Throttle conservation over many calls
    // -----------------------------------------------------------------------
    #[test]
    fn throttle_conserves_power_time_product() {
        for percent in [1, 7, 33, 50, 83, 99, 100] {
            let mut carry = 0;
            let mut total = 0i64;
            let n = 1000;
            for _ in 0..n {
                let t = throttle(120, 10, percent, 25, carry);
                carry = t.carry;
                total += t.power * t.duration;
            }
            let truth = n * 1200;
            assert!(
                (total - truth).abs() <= 120,
                "percent {percent}: total {total} vs {truth}"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Test 4: Throttle at 100% is the identity
    // -----------------------------------------------------------------------
    #[test]
    fn throttle_full_is_identity() {
        let t = throttle(120, 10, 100, 25, 0);
        assert_eq!(t.power, 120);
        assert_eq!(t.duration, 10);
        assert_eq!(t.carry, 0);
    }

    // -----------------------------------------------------------------------
    // Test 5: Power floor applies
    // -----------------------------------------------------------------------
    #[test]
    fn throttle_respects_power_floor() {
        let t = throttle(120, 10, 1, 25, 0);
        // 120 * 1 / 100 = 1, clamped to the floor.
        assert_eq!(t.power, 25);
        assert_eq!(t.duration, 48); // 10 * 120 / 25
        assert_eq!(t.carry, 0);
    }

    // -----------------------------------------------------------------------
    // Test 6: Duration never drops below one tick
    // -----------------------------------------------------------------------
    #[test]
    fn throttle_duration_at_least_one() {
        // Floor above nominal power forces a sub-tick ideal duration.
        let t = throttle(10, 1, 100, 25, 0);
        assert_eq!(t.duration, 1);
        assert!((0..t.power).contains(&t.carry));
    }

    // -----------------------------------------------------------------------
    // Test 7: whole_doses batches fractional flow
    // -----------------------------------------------------------------------
    #[test]
    fn whole_doses_batches() {
        // 85 units at dose 80: one dose, 5 left over.
        let (count, carry) = whole_doses(85, 80, 0);
        assert_eq!((count, carry), (1, 5));

        // 16 more calls of 5 units: at 75 + 5 the carry wraps into a dose.
        let mut carry = carry;
        let mut doses = count;
        for _ in 0..16 {
            let (c, rest) = whole_doses(5, 80, carry);
            doses += c;
            carry = rest;
        }
        assert_eq!(doses, 2);
        assert_eq!(carry, 5); // 85 + 80 = 2 * 80 + 5
    }

    // -----------------------------------------------------------------------
    // Test 8: doses_for_output rounds up, then corrects
    // -----------------------------------------------------------------------
    #[test]
    fn doses_for_output_ceiling_then_correct() {
        // 100 output, dose 160: charged a whole dose, 60 overshoot carried.
        let (count, carry) = doses_for_output(100, 160, 0);
        assert_eq!((count, carry), (1, 60));

        // Next 100: ceil is again 1, carry reaches 120, no correction yet.
        let (count, carry) = doses_for_output(100, 160, carry);
        assert_eq!((count, carry), (1, 120));

        // Third 100: carry would reach 180 which covers a dose; one dose
        // is refunded.
        let (count, carry) = doses_for_output(100, 160, carry);
        assert_eq!((count, carry), (0, 20));
    }

    // -----------------------------------------------------------------------
    // Test 9: doses_for_output long-run conservation
    // -----------------------------------------------------------------------
    #[test]
    fn doses_for_output_conserves() {
        let dose = 160;
        for per_tick in [1, 59, 100, 160, 161, 457] {
            let mut carry = 0;
            let mut charged = 0i64;
            let n = 2000;
            for _ in 0..n {
                let (c, rest) = doses_for_output(per_tick, dose, carry);
                charged += c;
                carry = rest;
            }
            let true_doses = (n * per_tick + dose - 1) / dose;
            assert!(
                (charged - true_doses).abs() <= 1,
                "per_tick {per_tick}: charged {charged} vs {true_doses}"
            );
            assert!((0..dose).contains(&carry));
        }
    }

    // -----------------------------------------------------------------------
    // Test 10: zero output charges nothing and keeps the carry
    // -----------------------------------------------------------------------
    #[test]
    fn zero_output_is_free() {
        let (count, carry) = doses_for_output(0, 160, 42);
        assert_eq!((count, carry), (0, 42));
        let (count, carry) = whole_doses(0, 80, 17);
        assert_eq!((count, carry), (0, 17));
    }
}
