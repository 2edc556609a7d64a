use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// Settings for the bounded Newton-Raphson IRR solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IrrSettings {
    pub initial_guess: Rate,
    /// Stop once |NPV(rate)| falls below this.
    pub npv_tolerance: Decimal,
    /// Stop once |dNPV/drate| falls below this (flat region).
    pub derivative_tolerance: Decimal,
    /// Stop once the Newton step is smaller than this.
    pub step_tolerance: Decimal,
    pub max_iterations: u32,
    pub min_rate: Rate,
    pub max_rate: Rate,
}

impl Default for IrrSettings {
    fn default() -> Self {
        Self {
            initial_guess: dec!(0.10),
            npv_tolerance: dec!(0.001),
            derivative_tolerance: dec!(0.001),
            step_tolerance: dec!(0.001),
            max_iterations: 100,
            min_rate: dec!(-0.95),
            max_rate: dec!(5.0),
        }
    }
}

/// Input perturbation that defines one scenario variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAdjustment {
    pub revenue_multiplier: Decimal,
    pub cost_multiplier: Decimal,
    /// Shift applied to the revenue growth rate, in percentage points.
    pub growth_shift_pp: Decimal,
}

impl ScenarioAdjustment {
    pub fn neutral() -> Self {
        Self {
            revenue_multiplier: Decimal::ONE,
            cost_multiplier: Decimal::ONE,
            growth_shift_pp: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSettings {
    pub optimistic: ScenarioAdjustment,
    pub pessimistic: ScenarioAdjustment,
    pub pessimistic_weight: Rate,
    pub base_weight: Rate,
    pub optimistic_weight: Rate,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            optimistic: ScenarioAdjustment {
                revenue_multiplier: dec!(1.20),
                cost_multiplier: dec!(0.90),
                growth_shift_pp: dec!(3),
            },
            pessimistic: ScenarioAdjustment {
                revenue_multiplier: dec!(0.85),
                cost_multiplier: dec!(1.15),
                growth_shift_pp: dec!(-3),
            },
            pessimistic_weight: dec!(0.25),
            base_weight: dec!(0.50),
            optimistic_weight: dec!(0.25),
        }
    }
}

/// Perturbation sizes, in percentage points, for the one-at-a-time
/// sensitivity runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityShocks {
    pub revenue_growth_pp: Decimal,
    pub cost_inflation_pp: Decimal,
    pub discount_rate_pp: Decimal,
    pub debt_ratio_pp: Decimal,
    pub depreciation_rate_pp: Decimal,
}

impl Default for SensitivityShocks {
    fn default() -> Self {
        Self {
            revenue_growth_pp: dec!(5),
            cost_inflation_pp: dec!(3),
            discount_rate_pp: dec!(1),
            debt_ratio_pp: dec!(10),
            depreciation_rate_pp: dec!(2),
        }
    }
}

/// Every tunable constant of the engine. Deserialises from a partial
/// document; missing fields keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub irr: IrrSettings,
    /// NPV discount rate clamp.
    pub min_discount_rate: Rate,
    pub max_discount_rate: Rate,
    /// Growth / inflation clamp applied before compounding.
    pub min_growth_rate: Rate,
    pub max_growth_rate: Rate,
    /// Upper bound on reported DSCR values.
    pub dscr_cap: Decimal,
    /// Minimum DSCR lenders expect; years below it are flagged.
    pub dscr_covenant: Decimal,
    /// MIRR finance rate; the discount rate when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finance_rate: Option<Rate>,
    /// MIRR reinvestment rate; the discount rate when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reinvestment_rate: Option<Rate>,
    pub scenarios: ScenarioSettings,
    pub sensitivity: SensitivityShocks,
    /// Currency units per investment-scale unit used by the tier table.
    pub scale_unit: Money,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            irr: IrrSettings::default(),
            min_discount_rate: dec!(-0.5),
            max_discount_rate: dec!(1.0),
            min_growth_rate: dec!(-0.99),
            max_growth_rate: dec!(1.0),
            dscr_cap: dec!(50),
            dscr_covenant: dec!(1.2),
            finance_rate: None,
            reinvestment_rate: None,
            scenarios: ScenarioSettings::default(),
            sensitivity: SensitivityShocks::default(),
            scale_unit: dec!(100_000_000),
        }
    }
}
