//! Labor-minutes quoting.
//!
//! EXPANSION (per area):
//!   1. Each task contributes per-occurrence minutes (base, per-sqft,
//!      per-unit, per-room, per-fixture) × ITS OWN monthly visits.
//!      The requested service frequency is informational here.
//!   2. Fixture item minutes (set on the fixture itself) are added
//!      once, at the area's highest task visit count.
//!   3. Tasks with no area pool into one facility-wide pseudo-area
//!      sized by the facility's aggregate square footage. Per-sqft
//!      supplies there cover only square feet no serviced area has
//!      already paid for.
//!
//! COSTING (per area):
//!   hours × floor × condition × traffic    (difficulty inflates time)
//!   → labor base → + burden → + insurance → + admin → + equipment
//!   → + supplies (per-sqft override, else % of labor + overhead)
//!
//! AGGREGATE:
//!   total_cost = Σ rounded area costs + travel (flat per facility visit,
//!                at the highest visit count across all areas)
//!   subtotal   = total_cost / (1 − margin)
//!   total      = subtotal × (1 + add_on)      (add-on absorbs margin)
//!   minimum floor last. `worker_count` never scales the price.

use super::{finish_quote, PricingStrategy, QuoteInput, QuoteParts, StrategyMetadata};
use crate::{
    error::PricingResult,
    facility::{Area, FacilityTask, FixtureInstance},
    keys::{ConditionLevel, FloorType, TrafficLevel},
    numeric::{round2, round_row, sum_rounded_rows},
    quote::{AreaDetail, AreaQuoteRow, CostBreakdown, QuoteResult},
    settings::{PricingSettings, PricingType},
    types::Money,
};

pub const PER_HOUR_KEY: &str = "per_hour_v1";

pub const FACILITY_WIDE_AREA_NAME: &str = "Facility-wide tasks";
const FACILITY_WIDE_FLOOR: FloorType = FloorType::Vct;
const FACILITY_WIDE_CONDITION: ConditionLevel = ConditionLevel::Standard;
const FACILITY_WIDE_TRAFFIC: TrafficLevel = TrafficLevel::Medium;

/// An area as the labor model sees it. Real areas and the
/// facility-wide pseudo-area both reduce to this.
struct AreaShape<'a> {
    area_id: Option<&'a str>,
    name: &'a str,
    total_sqft: f64,
    /// Square feet charged when supplies are priced per sqft.
    supply_sqft: f64,
    quantity: f64,
    floor_type: FloorType,
    condition_level: ConditionLevel,
    traffic_level: TrafficLevel,
    room_count: f64,
    unit_count: f64,
    fixtures: &'a [FixtureInstance],
}

impl<'a> AreaShape<'a> {
    fn from_area(area: &'a Area) -> Self {
        Self {
            area_id: Some(area.area_id.as_str()),
            name: &area.name,
            total_sqft: area.total_square_feet(),
            supply_sqft: area.total_square_feet(),
            quantity: f64::from(area.quantity),
            floor_type: area.floor_type,
            condition_level: area.condition_level,
            traffic_level: area.traffic_level,
            room_count: f64::from(area.room_count),
            unit_count: f64::from(area.unit_count),
            fixtures: &area.fixtures,
        }
    }

    fn facility_wide(total_sqft: f64, supply_sqft: f64) -> Self {
        Self {
            area_id: None,
            name: FACILITY_WIDE_AREA_NAME,
            total_sqft,
            supply_sqft,
            quantity: 1.0,
            floor_type: FACILITY_WIDE_FLOOR,
            condition_level: FACILITY_WIDE_CONDITION,
            traffic_level: FACILITY_WIDE_TRAFFIC,
            room_count: 0.0,
            unit_count: 0.0,
            fixtures: &[],
        }
    }

    /// Minutes for one occurrence of `task` in this area.
    fn occurrence_minutes(&self, task: &FacilityTask) -> f64 {
        let q = self.quantity;
        let fixture_minutes: f64 = self
            .fixtures
            .iter()
            .map(|f| task.fixture_minutes(&f.fixture_type_id) * f64::from(f.count) * q)
            .sum();

        task.base_minutes() * q
            + task.minutes_per_sqft() * self.total_sqft
            + task.minutes_per_unit() * self.unit_count * q
            + task.minutes_per_room() * self.room_count * q
            + fixture_minutes
    }

    /// Item minutes for one visit, independent of tasks.
    fn fixture_item_minutes_per_visit(&self) -> f64 {
        self.fixtures
            .iter()
            .filter_map(|f| f.minutes_per_item.map(|m| m * f64::from(f.count) * self.quantity))
            .sum()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct AreaMinutes {
    task_minutes: f64,
    fixture_item_minutes: f64,
    max_visits: f64,
}

fn expand_minutes<'t, I>(shape: &AreaShape<'_>, tasks: I) -> AreaMinutes
where
    I: IntoIterator<Item = &'t FacilityTask>,
{
    let mut minutes = AreaMinutes::default();
    for task in tasks {
        let visits = task.monthly_visits();
        minutes.task_minutes += shape.occurrence_minutes(task) * visits;
        minutes.max_visits = minutes.max_visits.max(visits);
    }
    minutes.fixture_item_minutes = shape.fixture_item_minutes_per_visit() * minutes.max_visits;
    minutes
}

/// Unrounded cost layers for one area.
#[derive(Debug, Default, Clone, Copy)]
struct AreaCost {
    adjusted_hours: f64,
    labor_cost_base: Money,
    labor_burden: Money,
    insurance: Money,
    admin_overhead: Money,
    equipment: Money,
    supplies: Money,
}

impl AreaCost {
    fn total(&self) -> Money {
        self.labor_cost_base
            + self.labor_burden
            + self.insurance
            + self.admin_overhead
            + self.equipment
            + self.supplies
    }

    fn accumulate(&mut self, other: &AreaCost) {
        self.adjusted_hours += other.adjusted_hours;
        self.labor_cost_base += other.labor_cost_base;
        self.labor_burden += other.labor_burden;
        self.insurance += other.insurance;
        self.admin_overhead += other.admin_overhead;
        self.equipment += other.equipment;
        self.supplies += other.supplies;
    }
}

fn cost_stack(adjusted_hours: f64, supply_sqft: f64, settings: &PricingSettings) -> AreaCost {
    let labor_cost_base = adjusted_hours * settings.hourly_rate;
    let labor_burden = labor_cost_base * settings.labor_burden_pct;
    let labor = labor_cost_base + labor_burden;
    let insurance = labor * settings.insurance_pct;
    let admin_overhead = labor * settings.admin_overhead_pct;
    let equipment = labor * settings.equipment_pct;
    let supplies = match settings.supply_cost_per_sqft {
        Some(rate) => supply_sqft * rate,
        None => (labor + insurance + admin_overhead + equipment) * settings.supply_cost_pct,
    };
    AreaCost {
        adjusted_hours,
        labor_cost_base,
        labor_burden,
        insurance,
        admin_overhead,
        equipment,
        supplies,
    }
}

pub struct PerHourStrategy {
    metadata: StrategyMetadata,
}

impl PerHourStrategy {
    pub fn new() -> Self {
        Self {
            metadata: StrategyMetadata {
                key: PER_HOUR_KEY.to_string(),
                name: "Per Hour".to_string(),
                version: "1.0.0".to_string(),
                description: "Task and fixture labor minutes costed through the full \
                              overhead stack with margin inversion"
                    .to_string(),
                pricing_type: PricingType::Hourly,
                is_default: false,
                is_active: true,
            },
        }
    }

    fn price_area(
        &self,
        shape: &AreaShape<'_>,
        minutes: AreaMinutes,
        settings: &PricingSettings,
    ) -> (AreaQuoteRow, AreaCost) {
        let base_hours = (minutes.task_minutes + minutes.fixture_item_minutes) / 60.0;
        let floor_multiplier = settings.floor_type_multipliers.factor(shape.floor_type);
        let condition_multiplier = settings.condition_multipliers.factor(shape.condition_level);
        let traffic_multiplier = settings.traffic_multipliers.factor(shape.traffic_level);
        let adjusted_hours = base_hours * floor_multiplier * condition_multiplier * traffic_multiplier;

        // An area nobody services carries no supply cost either.
        let cost = if adjusted_hours > 0.0 {
            cost_stack(adjusted_hours, shape.supply_sqft, settings)
        } else {
            AreaCost::default()
        };

        log::debug!(
            "per_hour: area={} minutes={:.1} items={:.1} hours={base_hours:.2} adjusted={adjusted_hours:.2} cost=${:.2}",
            shape.name,
            minutes.task_minutes,
            minutes.fixture_item_minutes,
            cost.total()
        );

        let row = AreaQuoteRow {
            area_id: shape.area_id.map(str::to_string),
            name: shape.name.to_string(),
            total_square_feet: shape.total_sqft,
            monthly_amount: round_row(cost.total()),
            detail: AreaDetail::Hourly {
                task_minutes: minutes.task_minutes,
                fixture_item_minutes: minutes.fixture_item_minutes,
                base_hours,
                floor_multiplier,
                condition_multiplier,
                traffic_multiplier,
                adjusted_hours,
                max_monthly_visits: minutes.max_visits,
                labor_cost_base: round2(cost.labor_cost_base),
                labor_burden: round2(cost.labor_burden),
                insurance: round2(cost.insurance),
                admin_overhead: round2(cost.admin_overhead),
                equipment: round2(cost.equipment),
                supplies: round2(cost.supplies),
            },
        };
        (row, cost)
    }
}

impl Default for PerHourStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingStrategy for PerHourStrategy {
    fn metadata(&self) -> &StrategyMetadata {
        &self.metadata
    }

    fn quote(&self, input: &QuoteInput<'_>) -> PricingResult<QuoteResult> {
        let bundle = input.bundle;
        let settings = input.settings;

        let mut rows = Vec::with_capacity(bundle.areas.len() + 1);
        let mut totals = AreaCost::default();
        let mut max_visits: f64 = 0.0;
        let mut supplied_sqft = 0.0;

        for area in &bundle.areas {
            let shape = AreaShape::from_area(area);
            let minutes = expand_minutes(&shape, bundle.tasks_for_area(&area.area_id));
            max_visits = max_visits.max(minutes.max_visits);
            let (row, cost) = self.price_area(&shape, minutes, settings);
            if cost.adjusted_hours > 0.0 {
                supplied_sqft += shape.supply_sqft;
            }
            totals.accumulate(&cost);
            rows.push(row);
        }

        let facility_wide: Vec<&FacilityTask> = bundle.facility_wide_tasks().collect();
        if !facility_wide.is_empty() {
            let total_sqft = bundle.total_square_feet();
            let shape = AreaShape::facility_wide(total_sqft, (total_sqft - supplied_sqft).max(0.0));
            let minutes = expand_minutes(&shape, facility_wide);
            max_visits = max_visits.max(minutes.max_visits);
            let (row, cost) = self.price_area(&shape, minutes, settings);
            totals.accumulate(&cost);
            rows.push(row);
        }

        let travel = round2(settings.travel_cost_per_visit * max_visits);
        let total_cost = round2(sum_rounded_rows(rows.iter().map(|r| r.monthly_amount)) + travel);

        let margin = settings.effective_margin();
        let subtotal = round2(total_cost / (1.0 - margin));
        let add_on = input.task_complexity_add_on();
        let pre_minimum_total = round2(subtotal * (1.0 + add_on));

        let hours_per_visit_per_worker = match input.request.worker_count {
            Some(workers) if workers > 0 && max_visits > 0.0 => {
                Some(totals.adjusted_hours / max_visits / f64::from(workers))
            }
            _ => None,
        };

        let breakdown = CostBreakdown::Hourly {
            total_hours: totals.adjusted_hours,
            labor_cost_base: round2(totals.labor_cost_base),
            labor_burden: round2(totals.labor_burden),
            insurance: round2(totals.insurance),
            admin_overhead: round2(totals.admin_overhead),
            equipment: round2(totals.equipment),
            supplies: round2(totals.supplies),
            travel,
            max_monthly_visits: max_visits,
            total_cost,
            profit_margin: margin,
            hours_per_visit_per_worker,
        };

        Ok(finish_quote(
            &self.metadata,
            input,
            QuoteParts {
                areas: rows,
                breakdown,
                subtotal,
                task_complexity_add_on: add_on,
                pre_minimum_total,
            },
        ))
    }
}
