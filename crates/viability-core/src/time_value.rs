use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::IrrSettings;
use crate::numeric::NumericGuard;
use crate::types::{Money, Rate};

/// Default NPV discount-rate clamp.
pub const NPV_MIN_RATE: Rate = dec!(-0.5);
pub const NPV_MAX_RATE: Rate = dec!(1.0);

/// Net Present Value of a series of cash flows (index = year), with the
/// rate clamped to `[-50%, 100%]`.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> Money {
    npv_bounded(rate, cash_flows, NPV_MIN_RATE, NPV_MAX_RATE)
}

/// NPV with an explicit rate clamp. A term that cannot be represented
/// contributes nothing, so one bad year never aborts the sum.
pub fn npv_bounded(rate: Rate, cash_flows: &[Money], min_rate: Rate, max_rate: Rate) -> Money {
    let rate = rate.max(min_rate).min(max_rate);
    present_value(rate, cash_flows, &mut NumericGuard::new())
}

fn present_value(rate: Rate, cash_flows: &[Money], guard: &mut NumericGuard) -> Money {
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut result = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = guard.mul(discount, one_plus_r);
        }
        let term = guard.div(*cf, discount);
        result = guard.add(result, term);
    }

    result
}

/// NPV and its analytic derivative `Σ -t·cf/(1+r)^(t+1)`, unclamped.
fn npv_with_derivative(rate: Rate, cash_flows: &[Money], guard: &mut NumericGuard) -> (Money, Decimal) {
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = guard.mul(discount, one_plus_r);
        }
        let term = guard.div(*cf, discount);
        value = guard.add(value, term);
        if t > 0 {
            let weighted = guard.mul(Decimal::from(t as i64), *cf);
            let next_discount = guard.mul(discount, one_plus_r);
            let d_term = guard.div(weighted, next_discount);
            derivative = guard.sub(derivative, d_term);
        }
    }

    (value, derivative)
}

/// Why the IRR solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrStatus {
    /// NPV or the Newton step fell within tolerance
    Converged,
    /// Derivative too flat to take another step
    FlatDerivative,
    /// Iteration cap reached; best clamped estimate returned
    IterationLimit,
    /// Newton steps pinned at a rate bound; the root lies beyond it
    Bounded,
    /// Cash flows do not change sign; no IRR exists
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrrSolution {
    pub rate: Rate,
    pub iterations: u32,
    pub status: IrrStatus,
}

impl IrrSolution {
    pub fn converged(&self) -> bool {
        self.status == IrrStatus::Converged
    }
}

/// Internal Rate of Return using bounded Newton-Raphson.
///
/// Every step is clamped to `[settings.min_rate, settings.max_rate]`, so
/// the solver always terminates with a finite rate. A solver held at a
/// bound reports [`IrrStatus::Bounded`], never `Converged`. A series without both
/// a negative and a positive flow has no IRR and yields `0`.
pub fn solve_irr(cash_flows: &[Money], settings: &IrrSettings) -> IrrSolution {
    let has_negative = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    let has_positive = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    if !has_negative || !has_positive {
        return IrrSolution {
            rate: Decimal::ZERO,
            iterations: 0,
            status: IrrStatus::Undefined,
        };
    }

    let clamp = |r: Rate| r.max(settings.min_rate).min(settings.max_rate);
    let mut guard = NumericGuard::new();
    let mut rate = clamp(settings.initial_guess);
    let mut status = IrrStatus::IterationLimit;
    let mut iterations = 0;

    while iterations < settings.max_iterations {
        iterations += 1;
        let (value, derivative) = npv_with_derivative(rate, cash_flows, &mut guard);

        if value.abs() < settings.npv_tolerance {
            status = IrrStatus::Converged;
            break;
        }
        if derivative.abs() < settings.derivative_tolerance {
            status = IrrStatus::FlatDerivative;
            break;
        }

        let step = guard.div(value, derivative);
        let candidate = rate.checked_sub(step);
        let next = match candidate {
            Some(c) => clamp(c),
            None if step > Decimal::ZERO => settings.min_rate,
            None => settings.max_rate,
        };
        let pinned = candidate != Some(next);
        let moved = (next - rate).abs();
        rate = next;

        if moved < settings.step_tolerance {
            status = if pinned {
                IrrStatus::Bounded
            } else {
                IrrStatus::Converged
            };
            break;
        }
    }

    IrrSolution {
        rate: clamp(rate),
        iterations,
        status,
    }
}

/// Modified IRR: negative flows discounted to year 0 at the finance rate,
/// positive flows compounded to year N at the reinvestment rate.
/// Returns 0 when either side is empty.
pub fn mirr(cash_flows: &[Money], finance_rate: Rate, reinvestment_rate: Rate) -> Rate {
    let n = cash_flows.len().saturating_sub(1);
    if n == 0 {
        return Decimal::ZERO;
    }

    let mut guard = NumericGuard::new();
    let one_plus_f = Decimal::ONE + finance_rate;
    let one_plus_r = Decimal::ONE + reinvestment_rate;
    let mut pv_negative = Decimal::ZERO;
    let mut fv_positive = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if *cf < Decimal::ZERO {
            let discount = guard.powu(one_plus_f, t as u64);
            let term = guard.div(*cf, discount);
            pv_negative = guard.add(pv_negative, term);
        } else if *cf > Decimal::ZERO {
            let growth = guard.powu(one_plus_r, (n - t) as u64);
            let term = guard.mul(*cf, growth);
            fv_positive = guard.add(fv_positive, term);
        }
    }

    if pv_negative.is_zero() || fv_positive.is_zero() {
        return Decimal::ZERO;
    }

    let ratio = guard.div(fv_positive, pv_negative.abs());
    let exponent = Decimal::ONE / Decimal::from(n as i64);
    match ratio.checked_powd(exponent) {
        Some(root) => root - Decimal::ONE,
        None => Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs);
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(0.01));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        assert_eq!(npv(dec!(0.0), &cfs), dec!(50));
    }

    #[test]
    fn test_npv_rate_clamped() {
        let cfs = vec![dec!(-100), dec!(300)];
        // 300% is clamped to 100%
        assert_eq!(npv(dec!(3.0), &cfs), dec!(50));
        assert_eq!(npv(dec!(1.0), &cfs), dec!(50));
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let sol = solve_irr(&cfs, &IrrSettings::default());
        assert!(sol.converged());
        // IRR should be ~9.7%
        assert!((sol.rate - dec!(0.097)).abs() < dec!(0.001));
    }

    #[test]
    fn test_irr_root_property() {
        let cfs = vec![dec!(-100), dec!(30), dec!(40), dec!(50), dec!(20)];
        let sol = solve_irr(&cfs, &IrrSettings::default());
        assert!(sol.converged());
        let residual = npv_bounded(sol.rate, &cfs, dec!(-0.95), dec!(5));
        assert!(residual.abs() < dec!(0.01), "NPV at IRR = {residual}");
    }

    #[test]
    fn test_irr_undefined_without_sign_change() {
        let settings = IrrSettings::default();
        let all_positive = solve_irr(&[dec!(100), dec!(50)], &settings);
        assert_eq!(all_positive.status, IrrStatus::Undefined);
        assert_eq!(all_positive.rate, Decimal::ZERO);

        let all_negative = solve_irr(&[dec!(-100), dec!(-50)], &settings);
        assert_eq!(all_negative.status, IrrStatus::Undefined);
    }

    #[test]
    fn test_irr_bounded_for_pathological_series() {
        // Enormous early return: true IRR far above 500%
        let cfs = vec![dec!(-1), dec!(1000000)];
        let sol = solve_irr(&cfs, &IrrSettings::default());
        assert_eq!(sol.rate, dec!(5.0));
        assert_eq!(sol.status, IrrStatus::Bounded);
        assert!(!sol.converged());
        assert!(sol.iterations <= 100);
    }

    #[test]
    fn test_irr_pinned_at_lower_bound() {
        // Almost nothing comes back: true IRR close to -100%
        let cfs = vec![dec!(-1000000), dec!(1)];
        let sol = solve_irr(&cfs, &IrrSettings::default());
        assert_eq!(sol.rate, dec!(-0.95));
        assert_ne!(sol.status, IrrStatus::Converged);
    }

    #[test]
    fn test_irr_negative_return() {
        let cfs = vec![dec!(-1000), dec!(200), dec!(200), dec!(200)];
        let sol = solve_irr(&cfs, &IrrSettings::default());
        assert!(sol.rate < Decimal::ZERO);
        assert!(sol.rate > dec!(-0.5));
    }

    #[test]
    fn test_mirr_known_answer() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        // FV of inflows at 10% = 363 + 440 + 500 = 1303 => (1.303)^(1/3) - 1
        let result = mirr(&cfs, dec!(0.10), dec!(0.10));
        assert!((result - dec!(0.0922)).abs() < dec!(0.001));
    }

    #[test]
    fn test_mirr_undefined_cases() {
        assert_eq!(mirr(&[dec!(100), dec!(100)], dec!(0.1), dec!(0.1)), Decimal::ZERO);
        assert_eq!(mirr(&[dec!(-100), dec!(-100)], dec!(0.1), dec!(0.1)), Decimal::ZERO);
        assert_eq!(mirr(&[dec!(-100)], dec!(0.1), dec!(0.1)), Decimal::ZERO);
    }
}
