//! Quote request and result types, plus the finishing steps every
//! strategy shares: minimum-charge floor and subcontractor split.

use crate::{
    frequency::Frequency,
    keys::TaskComplexity,
    numeric::{clamp_fraction, round2, Cents},
    snapshot::SettingsSnapshot,
    types::{EntityId, Money, StrategyKey},
};
use serde::{Deserialize, Serialize};

/// Subcontractor share used when neither the request nor the plan
/// states one.
pub const DEFAULT_SUBCONTRACTOR_PCT: f64 = 0.60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub facility_id: EntityId,
    pub service_frequency: Frequency,
    #[serde(default)]
    pub task_complexity: Option<TaskComplexity>,
    #[serde(default)]
    pub pricing_plan_id: Option<EntityId>,
    #[serde(default)]
    pub strategy_key: Option<StrategyKey>,
    #[serde(default)]
    pub proposal_id: Option<EntityId>,
    /// Recorded on the snapshot. Never scales the price.
    #[serde(default)]
    pub worker_count: Option<u32>,
    #[serde(default)]
    pub subcontractor_pct_override: Option<f64>,
}

impl QuoteRequest {
    pub fn new(facility_id: &str, service_frequency: Frequency) -> Self {
        Self {
            facility_id: facility_id.to_string(),
            service_frequency,
            task_complexity: None,
            pricing_plan_id: None,
            strategy_key: None,
            proposal_id: None,
            worker_count: None,
            subcontractor_pct_override: None,
        }
    }

    pub fn with_plan(mut self, plan_id: &str) -> Self {
        self.pricing_plan_id = Some(plan_id.to_string());
        self
    }

    pub fn with_strategy(mut self, key: &str) -> Self {
        self.strategy_key = Some(key.to_string());
        self
    }

    pub fn with_proposal(mut self, proposal_id: &str) -> Self {
        self.proposal_id = Some(proposal_id.to_string());
        self
    }

    pub fn with_task_complexity(mut self, complexity: TaskComplexity) -> Self {
        self.task_complexity = Some(complexity);
        self
    }

    pub fn with_workers(mut self, workers: u32) -> Self {
        self.worker_count = Some(workers);
        self
    }

    pub fn with_subcontractor_pct(mut self, pct: f64) -> Self {
        self.subcontractor_pct_override = Some(pct);
        self
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.service_frequency = frequency;
        self
    }
}

/// One priced area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaQuoteRow {
    pub area_id: Option<EntityId>,
    pub name: String,
    pub total_square_feet: f64,
    /// Rounded to cents before aggregation.
    pub monthly_amount: Money,
    pub detail: AreaDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AreaDetail {
    SquareFoot {
        base_price: Money,
        floor_multiplier: f64,
        condition_multiplier: f64,
        price_before_frequency: Money,
        frequency_multiplier: f64,
        task_complexity_add_on: f64,
    },
    Hourly {
        task_minutes: f64,
        fixture_item_minutes: f64,
        base_hours: f64,
        floor_multiplier: f64,
        condition_multiplier: f64,
        traffic_multiplier: f64,
        adjusted_hours: f64,
        max_monthly_visits: f64,
        labor_cost_base: Money,
        labor_burden: Money,
        insurance: Money,
        admin_overhead: Money,
        equipment: Money,
        supplies: Money,
    },
}

/// Facility-level aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostBreakdown {
    SquareFoot {
        building_multiplier: f64,
        building_adjustment: Money,
    },
    Hourly {
        total_hours: f64,
        labor_cost_base: Money,
        labor_burden: Money,
        insurance: Money,
        admin_overhead: Money,
        equipment: Money,
        supplies: Money,
        travel: Money,
        max_monthly_visits: f64,
        total_cost: Money,
        profit_margin: f64,
        /// Informational: hours per visit per worker. Price ignores it.
        hours_per_visit_per_worker: Option<f64>,
    },
}

/// Revenue split. Kept in cents so `payout + company == total`
/// holds exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubcontractorSplit {
    pub percentage: f64,
    pub total: Cents,
    pub payout: Cents,
    pub company_revenue: Cents,
}

impl SubcontractorSplit {
    /// `payout = round2(total × pct)`; company keeps the residual.
    pub fn compute(monthly_total: Money, pct: f64) -> Self {
        let pct = clamp_fraction(pct);
        let total = Cents::from_dollars(monthly_total);
        let payout = total.scale(pct);
        Self {
            percentage: pct,
            total,
            payout,
            company_revenue: total - payout,
        }
    }

    pub fn payout_amount(&self) -> Money {
        self.payout.dollars()
    }

    pub fn company_revenue_amount(&self) -> Money {
        self.company_revenue.dollars()
    }
}

/// `override ?? plan ?? fallback`.
pub fn resolve_subcontractor_pct(
    request_override: Option<f64>,
    plan_pct: Option<f64>,
    fallback: f64,
) -> f64 {
    request_override.or(plan_pct).unwrap_or(fallback)
}

/// Minimum-charge floor with replace semantics: a total below the
/// floor becomes the floor.
pub fn apply_minimum(total: Money, minimum: Money) -> (Money, bool) {
    if minimum > 0.0 && total < minimum {
        (round2(minimum), true)
    } else {
        (total, false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteResult {
    pub facility_id: EntityId,
    pub strategy_key: StrategyKey,
    pub strategy_version: String,
    pub service_frequency: Frequency,
    /// Visits implied by the requested frequency.
    pub monthly_visits: f64,
    pub areas: Vec<AreaQuoteRow>,
    pub breakdown: CostBreakdown,
    /// Sum of rounded area rows (square foot) or margin-inverted
    /// cost (hourly).
    pub subtotal: Money,
    pub task_complexity: Option<TaskComplexity>,
    pub task_complexity_add_on: f64,
    pub monthly_total: Money,
    pub minimum_applied: bool,
    pub split: SubcontractorSplit,
    pub snapshot: SettingsSnapshot,
}
