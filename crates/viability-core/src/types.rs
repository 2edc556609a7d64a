use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Used everywhere inside the engine.
pub type Rate = Decimal;

/// Rates expressed as percentages (5 = 5%). Only found on caller-facing input.
pub type Percent = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// Convert a caller-facing percentage into a decimal rate.
pub fn pct(value: Percent) -> Rate {
    value / dec!(100)
}

/// Debt Service Coverage Ratio for a period, or the absence of any debt
/// service to cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ratio", rename_all = "snake_case")]
pub enum Coverage {
    Covered(Decimal),
    /// Nothing due in the period (no debt, or fully repaid).
    Unconstrained,
}

impl Coverage {
    /// Value used by presentation layers that expect the legacy sentinel.
    pub const LEGACY_UNCONSTRAINED: Decimal = dec!(999);

    pub fn ratio(&self) -> Option<Decimal> {
        match self {
            Coverage::Covered(r) => Some(*r),
            Coverage::Unconstrained => None,
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        matches!(self, Coverage::Unconstrained)
    }

    pub fn legacy_value(&self) -> Decimal {
        self.ratio().unwrap_or(Self::LEGACY_UNCONSTRAINED)
    }
}

/// Time needed for cumulative undiscounted cash flow to recover the
/// initial investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "years", rename_all = "snake_case")]
pub enum Payback {
    Recovered(Years),
    NotRecoveredWithinHorizon,
}

impl Payback {
    pub fn years(&self) -> Option<Years> {
        match self {
            Payback::Recovered(y) => Some(*y),
            Payback::NotRecoveredWithinHorizon => None,
        }
    }

    /// Legacy numeric form: the horizon stands in for "not recovered".
    pub fn years_or_horizon(&self, horizon: u32) -> Years {
        self.years().unwrap_or_else(|| Decimal::from(horizon))
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_sentinels() {
        assert_eq!(Coverage::Unconstrained.legacy_value(), dec!(999));
        assert_eq!(Coverage::Covered(dec!(1.4)).legacy_value(), dec!(1.4));
        assert_eq!(Payback::NotRecoveredWithinHorizon.years_or_horizon(10), dec!(10));
        assert_eq!(Payback::Recovered(dec!(3.5)).years_or_horizon(10), dec!(3.5));
    }

    #[test]
    fn test_pct() {
        assert_eq!(pct(dec!(8.5)), dec!(0.085));
    }

    #[test]
    fn test_coverage_serialises_tagged() {
        let json = serde_json::to_value(Coverage::Unconstrained).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "unconstrained"}));
    }
}
