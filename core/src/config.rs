use crate::{
    frequency::Frequency,
    keys::{BuildingType, ConditionLevel, FloorType, TaskComplexity, TrafficLevel},
    multiplier::{AddOnTable, MultiplierTable},
    quote::DEFAULT_SUBCONTRACTOR_PCT,
    settings::{PricingSettings, PricingType},
    strategy::SQUARE_FOOTAGE_KEY,
    types::{EntityId, StrategyKey},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BATCH_LOCK_TTL_SECS: i64 = 900;
pub const DEFAULT_MAX_PRORATION_DAYS: i64 = 366;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EngineConfigFile {
    #[serde(default = "default_strategy_key")]
    default_strategy_key: StrategyKey,
    #[serde(default)]
    default_plan_id: Option<EntityId>,
    #[serde(default = "default_subcontractor_pct")]
    default_subcontractor_pct: f64,
    #[serde(default = "default_lock_ttl")]
    batch_lock_ttl_secs: i64,
    #[serde(default = "default_max_proration_days")]
    max_proration_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct PlansFile {
    plans: Vec<PricingSettings>,
}

fn default_strategy_key() -> StrategyKey {
    SQUARE_FOOTAGE_KEY.to_string()
}

fn default_subcontractor_pct() -> f64 {
    DEFAULT_SUBCONTRACTOR_PCT
}

fn default_lock_ttl() -> i64 {
    DEFAULT_BATCH_LOCK_TTL_SECS
}

fn default_max_proration_days() -> i64 {
    DEFAULT_MAX_PRORATION_DAYS
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub default_strategy_key: StrategyKey,
    /// System-scope plan. `None` defers to the store's default plan.
    pub default_plan_id: Option<EntityId>,
    pub default_subcontractor_pct: f64,
    pub batch_lock_ttl_secs: i64,
    /// Longest billing window the invoicing side will prorate.
    pub max_proration_days: i64,
    pub plans: Vec<PricingSettings>,
}

impl EngineConfig {
    /// Load from the data/ directory.
    /// In tests, use EngineConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let engine_path = format!("{data_dir}/engine/engine_config.json");
        let engine_content = std::fs::read_to_string(&engine_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {engine_path}: {e}"))?;
        let engine_file: EngineConfigFile = serde_json::from_str(&engine_content)?;

        let plans_path = format!("{data_dir}/pricing/plans.json");
        let plans_content = std::fs::read_to_string(&plans_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {plans_path}: {e}"))?;
        let plans_file: PlansFile = serde_json::from_str(&plans_content)?;

        for plan in &plans_file.plans {
            plan.validate()
                .map_err(|e| anyhow::anyhow!("{plans_path}: {e}"))?;
        }

        let config = Self {
            default_strategy_key: engine_file.default_strategy_key,
            default_plan_id: engine_file.default_plan_id,
            default_subcontractor_pct: engine_file.default_subcontractor_pct,
            batch_lock_ttl_secs: engine_file.batch_lock_ttl_secs,
            max_proration_days: engine_file.max_proration_days,
            plans: plans_file.plans,
        };
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("{engine_path}: {e}"))?;

        log::info!(
            "config: loaded {} pricing plans from {data_dir} (default strategy '{}')",
            config.plans.len(),
            config.default_strategy_key
        );
        Ok(config)
    }

    /// Engine-level bounds. Plans are checked separately with
    /// `PricingSettings::validate`.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.default_subcontractor_pct) {
            anyhow::bail!(
                "default_subcontractor_pct must be in [0, 1], got {}",
                self.default_subcontractor_pct
            );
        }
        if self.batch_lock_ttl_secs <= 0 {
            anyhow::bail!("batch_lock_ttl_secs must be positive, got {}", self.batch_lock_ttl_secs);
        }
        if self.max_proration_days <= 0 {
            anyhow::bail!("max_proration_days must be positive, got {}", self.max_proration_days);
        }
        Ok(())
    }

    pub fn plan(&self, plan_id: &str) -> Option<&PricingSettings> {
        self.plans.iter().find(|p| p.plan_id == plan_id)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let square_foot = PricingSettings {
            name: "Standard Square Foot".into(),
            base_rate_per_sqft: 0.10,
            minimum_monthly_charge: 150.0,
            subcontractor_pct: Some(0.60),
            floor_type_multipliers: MultiplierTable::new()
                .with(FloorType::Vct, 1.0)
                .with(FloorType::Carpet, 1.1)
                .with(FloorType::Marble, 1.4),
            condition_multipliers: MultiplierTable::new()
                .with(ConditionLevel::Standard, 1.0)
                .with(ConditionLevel::Heavy, 1.25),
            frequency_multipliers: [
                (Frequency::OncePerWeek, 1.0),
                (Frequency::ThricePerWeek, 2.8),
                (Frequency::FivePerWeek, 4.5),
                (Frequency::Daily, 6.0),
                (Frequency::Monthly, 0.3),
            ]
            .into_iter()
            .collect(),
            building_type_multipliers: MultiplierTable::new()
                .with(BuildingType::Office, 1.0)
                .with(BuildingType::Medical, 1.2),
            task_complexity_add_ons: AddOnTable::new()
                .with(TaskComplexity::Sanitization, 0.15)
                .with(TaskComplexity::Biohazard, 0.50),
            ..PricingSettings::blank("sqft_standard", PricingType::SquareFoot)
        };

        let hourly = PricingSettings {
            name: "Standard Hourly".into(),
            minimum_monthly_charge: 200.0,
            hourly_rate: 18.0,
            labor_burden_pct: 0.20,
            insurance_pct: 0.05,
            admin_overhead_pct: 0.10,
            equipment_pct: 0.03,
            supply_cost_pct: 0.05,
            travel_cost_per_visit: 5.0,
            profit_margin_pct: 0.25,
            subcontractor_pct: Some(0.60),
            floor_type_multipliers: MultiplierTable::new()
                .with(FloorType::Carpet, 1.1)
                .with(FloorType::Marble, 1.5),
            condition_multipliers: MultiplierTable::new()
                .with(ConditionLevel::Heavy, 1.3),
            traffic_multipliers: MultiplierTable::new()
                .with(TrafficLevel::High, 1.2),
            task_complexity_add_ons: AddOnTable::new()
                .with(TaskComplexity::Sanitization, 0.10),
            ..PricingSettings::blank("hourly_standard", PricingType::Hourly)
        };

        Self {
            default_strategy_key: SQUARE_FOOTAGE_KEY.into(),
            default_plan_id: Some("sqft_standard".into()),
            default_subcontractor_pct: DEFAULT_SUBCONTRACTOR_PCT,
            batch_lock_ttl_secs: DEFAULT_BATCH_LOCK_TTL_SECS,
            max_proration_days: DEFAULT_MAX_PRORATION_DAYS,
            plans: vec![square_foot, hourly],
        }
    }
}
