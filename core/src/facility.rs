//! Facility records the engine reads.
//!
//! These arrive already fetched from the persistence collaborator.
//! Strategies see them as plain data; nothing here does I/O.

use crate::{
    frequency::Frequency,
    keys::{BuildingType, ConditionLevel, FloorType, TrafficLevel},
    types::{EntityId, StrategyKey},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: EntityId,
    pub name: String,
    #[serde(default)]
    pub default_strategy_key: Option<StrategyKey>,
    #[serde(default)]
    pub default_pricing_plan_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub facility_id: EntityId,
    pub account_id: EntityId,
    pub name: String,
    pub building_type: BuildingType,
    #[serde(default)]
    pub default_strategy_key: Option<StrategyKey>,
    #[serde(default)]
    pub default_pricing_plan_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub area_id: EntityId,
    pub facility_id: EntityId,
    pub name: String,
    pub square_feet: f64,
    /// Number of identical instances of this area (e.g. 4 restrooms).
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub floor_type: FloorType,
    pub condition_level: ConditionLevel,
    pub traffic_level: TrafficLevel,
    #[serde(default)]
    pub room_count: u32,
    #[serde(default)]
    pub unit_count: u32,
    #[serde(default)]
    pub fixtures: Vec<FixtureInstance>,
}

fn default_quantity() -> u32 {
    1
}

impl Area {
    pub fn total_square_feet(&self) -> f64 {
        self.square_feet * f64::from(self.quantity)
    }
}

/// A fixture installed in an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureInstance {
    pub fixture_type_id: EntityId,
    pub count: u32,
    /// Minutes to service one item, independent of any task.
    #[serde(default)]
    pub minutes_per_item: Option<f64>,
}

/// Reusable per-occurrence time standards for a kind of task.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub template_id: EntityId,
    pub name: String,
    #[serde(default)]
    pub base_minutes: Option<f64>,
    #[serde(default)]
    pub minutes_per_sqft: Option<f64>,
    #[serde(default)]
    pub minutes_per_unit: Option<f64>,
    #[serde(default)]
    pub minutes_per_room: Option<f64>,
    #[serde(default)]
    pub fixture_minutes: Vec<FixtureMinutes>,
}

/// Minutes per fixture item of one fixture type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureMinutes {
    pub fixture_type_id: EntityId,
    pub minutes: f64,
}

/// A task scheduled at a facility, optionally bound to one area.
///
/// Every minute component resolves as: task override, else template
/// default, else zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityTask {
    pub task_id: EntityId,
    pub facility_id: EntityId,
    /// `None` for facility-wide tasks.
    #[serde(default)]
    pub area_id: Option<EntityId>,
    pub name: String,
    pub cleaning_frequency: Frequency,
    #[serde(default)]
    pub template: Option<TaskTemplate>,
    #[serde(default)]
    pub base_minutes_override: Option<f64>,
    #[serde(default)]
    pub minutes_per_sqft_override: Option<f64>,
    #[serde(default)]
    pub minutes_per_unit_override: Option<f64>,
    #[serde(default)]
    pub minutes_per_room_override: Option<f64>,
    #[serde(default)]
    pub fixture_minutes_overrides: Vec<FixtureMinutes>,
}

impl FacilityTask {
    fn resolve(&self, over: Option<f64>, pick: fn(&TaskTemplate) -> Option<f64>) -> f64 {
        over.or_else(|| self.template.as_ref().and_then(pick)).unwrap_or(0.0)
    }

    pub fn base_minutes(&self) -> f64 {
        self.resolve(self.base_minutes_override, |t| t.base_minutes)
    }

    pub fn minutes_per_sqft(&self) -> f64 {
        self.resolve(self.minutes_per_sqft_override, |t| t.minutes_per_sqft)
    }

    pub fn minutes_per_unit(&self) -> f64 {
        self.resolve(self.minutes_per_unit_override, |t| t.minutes_per_unit)
    }

    pub fn minutes_per_room(&self) -> f64 {
        self.resolve(self.minutes_per_room_override, |t| t.minutes_per_room)
    }

    /// Minutes per item for a fixture type: override, else template, else 0.
    pub fn fixture_minutes(&self, fixture_type_id: &str) -> f64 {
        let find = |list: &[FixtureMinutes]| {
            list.iter()
                .find(|f| f.fixture_type_id == fixture_type_id)
                .map(|f| f.minutes)
        };
        find(&self.fixture_minutes_overrides)
            .or_else(|| self.template.as_ref().and_then(|t| find(&t.fixture_minutes)))
            .unwrap_or(0.0)
    }

    pub fn monthly_visits(&self) -> f64 {
        self.cleaning_frequency.monthly_visits()
    }
}

/// Everything a strategy needs about one facility, fetched up front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityBundle {
    pub facility: Facility,
    pub areas: Vec<Area>,
    #[serde(default)]
    pub tasks: Vec<FacilityTask>,
}

impl FacilityBundle {
    pub fn total_square_feet(&self) -> f64 {
        self.areas.iter().map(Area::total_square_feet).sum()
    }

    pub fn tasks_for_area<'a>(&'a self, area_id: &'a str) -> impl Iterator<Item = &'a FacilityTask> {
        self.tasks
            .iter()
            .filter(move |t| t.area_id.as_deref() == Some(area_id))
    }

    /// Tasks bound to no area, or to an area this facility does not have.
    pub fn facility_wide_tasks(&self) -> impl Iterator<Item = &FacilityTask> {
        self.tasks.iter().filter(move |t| match t.area_id.as_deref() {
            None => true,
            Some(id) => !self.areas.iter().any(|a| a.area_id == id),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Draft,
    Sent,
    Viewed,
    Accepted,
    Rejected,
    Expired,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Draft    => "draft",
            ProposalStatus::Sent     => "sent",
            ProposalStatus::Viewed   => "viewed",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Expired  => "expired",
        }
    }

    /// Only drafts may have their totals recomputed.
    pub fn is_editable(&self) -> bool {
        matches!(self, ProposalStatus::Draft)
    }
}
