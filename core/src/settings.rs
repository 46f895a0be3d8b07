//! Pricing settings (the "cost plan").
//!
//! A plan is read-only at quote time. Strategies borrow it; nothing
//! in the engine mutates a plan after it is loaded. Quotes that must
//! outlive later plan edits carry a `SettingsSnapshot` instead.

use crate::{
    error::{PricingError, PricingResult},
    frequency::Frequency,
    keys::{BuildingType, ConditionLevel, FloorType, TaskComplexity, TrafficLevel},
    multiplier::{AddOnTable, MultiplierTable},
    types::{EntityId, Money},
};
use serde::{Deserialize, Serialize};

/// Stand-in for a stated margin >= 1.0 on a plan that skipped
/// `validate`. Margins inside [0, 1) are always used as stated.
pub const MAX_PROFIT_MARGIN: f64 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    SquareFoot,
    Hourly,
}

impl PricingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingType::SquareFoot => "square_foot",
            PricingType::Hourly     => "hourly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSettings {
    pub plan_id: EntityId,
    pub name: String,
    pub pricing_type: PricingType,
    #[serde(default = "default_true")]
    pub is_active: bool,

    // ── Area-rate quoting ─────────────────────────────────────
    /// $ per square foot per month at 1x multipliers.
    #[serde(default)]
    pub base_rate_per_sqft: Money,
    /// Monthly floor. A total below it is replaced by it.
    #[serde(default)]
    pub minimum_monthly_charge: Money,

    // ── Labor quoting ─────────────────────────────────────────
    #[serde(default)]
    pub hourly_rate: Money,
    /// Payroll burden as a fraction of base labor cost.
    #[serde(default)]
    pub labor_burden_pct: f64,
    #[serde(default)]
    pub insurance_pct: f64,
    #[serde(default)]
    pub admin_overhead_pct: f64,
    #[serde(default)]
    pub equipment_pct: f64,
    /// Supplies as a fraction of labor + overhead. Ignored when
    /// `supply_cost_per_sqft` is set.
    #[serde(default)]
    pub supply_cost_pct: f64,
    /// Monthly supply cost per square foot.
    #[serde(default)]
    pub supply_cost_per_sqft: Option<Money>,
    /// Flat cost per facility visit.
    #[serde(default)]
    pub travel_cost_per_visit: Money,
    /// Target margin in [0, 1).
    #[serde(default)]
    pub profit_margin_pct: f64,
    /// Share of the monthly total paid out to the subcontractor.
    #[serde(default)]
    pub subcontractor_pct: Option<f64>,

    // ── Multiplier maps ───────────────────────────────────────
    #[serde(default)]
    pub floor_type_multipliers: MultiplierTable<FloorType>,
    #[serde(default)]
    pub condition_multipliers: MultiplierTable<ConditionLevel>,
    #[serde(default)]
    pub traffic_multipliers: MultiplierTable<TrafficLevel>,
    #[serde(default)]
    pub frequency_multipliers: MultiplierTable<Frequency>,
    #[serde(default)]
    pub building_type_multipliers: MultiplierTable<BuildingType>,
    #[serde(default)]
    pub task_complexity_add_ons: AddOnTable<TaskComplexity>,
}

fn default_true() -> bool {
    true
}

impl PricingSettings {
    /// Reject plans that would produce nonsense prices.
    pub fn validate(&self) -> PricingResult<()> {
        let invalid = |reason: String| PricingError::InvalidSettings {
            plan_id: self.plan_id.clone(),
            reason,
        };

        if !(0.0..1.0).contains(&self.profit_margin_pct) {
            return Err(invalid(format!(
                "profit_margin_pct must be in [0, 1), got {}",
                self.profit_margin_pct
            )));
        }
        if let Some(pct) = self.subcontractor_pct {
            if !(0.0..=1.0).contains(&pct) {
                return Err(invalid(format!("subcontractor_pct must be in [0, 1], got {pct}")));
            }
        }

        let non_negative = [
            ("base_rate_per_sqft", self.base_rate_per_sqft),
            ("minimum_monthly_charge", self.minimum_monthly_charge),
            ("hourly_rate", self.hourly_rate),
            ("labor_burden_pct", self.labor_burden_pct),
            ("insurance_pct", self.insurance_pct),
            ("admin_overhead_pct", self.admin_overhead_pct),
            ("equipment_pct", self.equipment_pct),
            ("supply_cost_pct", self.supply_cost_pct),
            ("travel_cost_per_visit", self.travel_cost_per_visit),
            ("supply_cost_per_sqft", self.supply_cost_per_sqft.unwrap_or(0.0)),
        ];
        for (field, value) in non_negative {
            if value < 0.0 || !value.is_finite() {
                return Err(invalid(format!("{field} must be a non-negative number, got {value}")));
            }
        }
        Ok(())
    }

    /// The margin actually used for inversion. Equal to the stated
    /// margin for any plan that passes `validate`.
    pub fn effective_margin(&self) -> f64 {
        let margin = self.profit_margin_pct;
        if margin.is_nan() || margin < 0.0 {
            0.0
        } else if margin >= 1.0 {
            MAX_PROFIT_MARGIN
        } else {
            margin
        }
    }

    /// A plan with every rate zeroed and empty maps. Tests and
    /// fixtures start here and set only what they exercise.
    pub fn blank(plan_id: &str, pricing_type: PricingType) -> Self {
        Self {
            plan_id: plan_id.to_string(),
            name: plan_id.to_string(),
            pricing_type,
            is_active: true,
            base_rate_per_sqft: 0.0,
            minimum_monthly_charge: 0.0,
            hourly_rate: 0.0,
            labor_burden_pct: 0.0,
            insurance_pct: 0.0,
            admin_overhead_pct: 0.0,
            equipment_pct: 0.0,
            supply_cost_pct: 0.0,
            supply_cost_per_sqft: None,
            travel_cost_per_visit: 0.0,
            profit_margin_pct: 0.0,
            subcontractor_pct: None,
            floor_type_multipliers: MultiplierTable::new(),
            condition_multipliers: MultiplierTable::new(),
            traffic_multipliers: MultiplierTable::new(),
            frequency_multipliers: MultiplierTable::new(),
            building_type_multipliers: MultiplierTable::new(),
            task_complexity_add_ons: AddOnTable::new(),
        }
    }
}
