//! Fail-soft decimal arithmetic.
//!
//! Every arithmetic step of the projection goes through a [`NumericGuard`].
//! An operation that overflows, underflows into an undefined result or
//! divides by zero yields `0` and is counted, so a run always produces a
//! complete series and the caller can see how many values were replaced.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

#[derive(Debug, Default, Clone)]
pub struct NumericGuard {
    replaced: u32,
}

impl NumericGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a checked result, substituting zero for `None`.
    pub fn sanitize(&mut self, value: Option<Decimal>) -> Decimal {
        match value {
            Some(v) => v,
            None => {
                self.replaced += 1;
                Decimal::ZERO
            }
        }
    }

    pub fn add(&mut self, a: Decimal, b: Decimal) -> Decimal {
        self.sanitize(a.checked_add(b))
    }

    pub fn sub(&mut self, a: Decimal, b: Decimal) -> Decimal {
        self.sanitize(a.checked_sub(b))
    }

    pub fn mul(&mut self, a: Decimal, b: Decimal) -> Decimal {
        self.sanitize(a.checked_mul(b))
    }

    pub fn div(&mut self, a: Decimal, b: Decimal) -> Decimal {
        self.sanitize(a.checked_div(b))
    }

    /// `base^exp` for a non-negative integer exponent.
    pub fn powu(&mut self, base: Decimal, exp: u64) -> Decimal {
        self.sanitize(base.checked_powu(exp))
    }

    /// Compound factor `(1 + rate)^periods`, with `rate` clamped to
    /// `[floor, cap]` first.
    pub fn growth_factor(&mut self, rate: Decimal, periods: u64, floor: Decimal, cap: Decimal) -> Decimal {
        let clamped = rate.max(floor).min(cap);
        self.powu(Decimal::ONE + clamped, periods)
    }

    /// Number of values replaced by zero so far.
    pub fn replaced(&self) -> u32 {
        self.replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_division_by_zero_is_replaced() {
        let mut guard = NumericGuard::new();
        assert_eq!(guard.div(dec!(10), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(guard.replaced(), 1);
    }

    #[test]
    fn test_overflow_is_replaced() {
        let mut guard = NumericGuard::new();
        assert_eq!(guard.mul(Decimal::MAX, dec!(2)), Decimal::ZERO);
        assert_eq!(guard.add(Decimal::MAX, Decimal::MAX), Decimal::ZERO);
        assert_eq!(guard.replaced(), 2);
    }

    #[test]
    fn test_clean_arithmetic_untouched() {
        let mut guard = NumericGuard::new();
        assert_eq!(guard.mul(dec!(1.5), dec!(2)), dec!(3.0));
        assert_eq!(guard.sub(dec!(5), dec!(7)), dec!(-2));
        assert_eq!(guard.replaced(), 0);
    }

    #[test]
    fn test_growth_factor_clamps_rate() {
        let mut guard = NumericGuard::new();
        // 250% growth is clamped to 100% => 2^3
        let f = guard.growth_factor(dec!(2.5), 3, dec!(-0.99), dec!(1.0));
        assert_eq!(f, dec!(8));
        assert_eq!(guard.growth_factor(dec!(0.1), 0, dec!(-0.99), dec!(1.0)), Decimal::ONE);
    }
}
