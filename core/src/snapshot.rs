//! Settings snapshot: the audit-of-record copy of the configuration
//! a quote was computed with.
//!
//! A snapshot is captured by the strategy at quote time. Once a
//! proposal locks a quote, the snapshot is stored as JSON and never
//! re-derived from live settings. Field order and key order are
//! fixed so the serialized form is byte-stable.

use crate::{
    frequency::Frequency,
    keys::{BuildingType, ConditionLevel, FloorType, TaskComplexity, TrafficLevel},
    multiplier::{AddOnTable, MultiplierTable},
    settings::{PricingSettings, PricingType},
    strategy::StrategyMetadata,
    types::{EntityId, Money, StrategyKey},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Bump when the persisted shape changes. Readers must accept
/// every version they have ever written.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    pub snapshot_version: u32,
    pub plan_id: EntityId,
    pub plan_name: String,
    pub pricing_type: PricingType,
    pub strategy_key: StrategyKey,
    pub strategy_version: String,
    pub base_rate_per_sqft: Money,
    pub minimum_monthly_charge: Money,
    pub hourly_rate: Money,
    pub labor_burden_pct: f64,
    pub insurance_pct: f64,
    pub admin_overhead_pct: f64,
    pub equipment_pct: f64,
    pub supply_cost_pct: f64,
    pub supply_cost_per_sqft: Option<Money>,
    pub travel_cost_per_visit: Money,
    pub profit_margin_pct: f64,
    pub subcontractor_pct: Option<f64>,
    pub floor_type_multipliers: MultiplierTable<FloorType>,
    pub condition_multipliers: MultiplierTable<ConditionLevel>,
    pub traffic_multipliers: MultiplierTable<TrafficLevel>,
    pub frequency_multipliers: MultiplierTable<Frequency>,
    pub building_type_multipliers: MultiplierTable<BuildingType>,
    pub task_complexity_add_ons: AddOnTable<TaskComplexity>,
    /// ISO-8601, UTC, second precision.
    pub captured_at: String,
    #[serde(default)]
    pub worker_count: Option<u32>,
}

impl SettingsSnapshot {
    pub fn capture(
        settings: &PricingSettings,
        strategy: &StrategyMetadata,
        worker_count: Option<u32>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            snapshot_version: SNAPSHOT_VERSION,
            plan_id: settings.plan_id.clone(),
            plan_name: settings.name.clone(),
            pricing_type: settings.pricing_type,
            strategy_key: strategy.key.clone(),
            strategy_version: strategy.version.clone(),
            base_rate_per_sqft: settings.base_rate_per_sqft,
            minimum_monthly_charge: settings.minimum_monthly_charge,
            hourly_rate: settings.hourly_rate,
            labor_burden_pct: settings.labor_burden_pct,
            insurance_pct: settings.insurance_pct,
            admin_overhead_pct: settings.admin_overhead_pct,
            equipment_pct: settings.equipment_pct,
            supply_cost_pct: settings.supply_cost_pct,
            supply_cost_per_sqft: settings.supply_cost_per_sqft,
            travel_cost_per_visit: settings.travel_cost_per_visit,
            profit_margin_pct: settings.profit_margin_pct,
            subcontractor_pct: settings.subcontractor_pct,
            floor_type_multipliers: settings.floor_type_multipliers.clone(),
            condition_multipliers: settings.condition_multipliers.clone(),
            traffic_multipliers: settings.traffic_multipliers.clone(),
            frequency_multipliers: settings.frequency_multipliers.clone(),
            building_type_multipliers: settings.building_type_multipliers.clone(),
            task_complexity_add_ons: settings.task_complexity_add_ons.clone(),
            captured_at: captured_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            worker_count,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
