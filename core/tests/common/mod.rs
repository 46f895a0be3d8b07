#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use facility_pricing_core::{
    batch::Invoice,
    error::{PricingError, PricingResult},
    facility::{Account, Area, Facility, FacilityBundle, FacilityTask, FixtureInstance},
    frequency::Frequency,
    keys::{BuildingType, ConditionLevel, FloorType, TrafficLevel},
    proposal::{LockedQuote, Proposal},
    quote::{QuoteRequest, QuoteResult},
    repository::{InvoiceRepository, PricingRepository},
    settings::{PricingSettings, PricingType},
    strategy::{PricingStrategy, QuoteInput},
    types::EntityId,
};
use std::collections::HashMap;
use std::sync::Mutex;

pub const FACILITY: &str = "fac-1";
pub const ACCOUNT: &str = "acct-1";

pub fn captured_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
}

pub fn facility(building_type: BuildingType) -> Facility {
    Facility {
        facility_id: FACILITY.into(),
        account_id: ACCOUNT.into(),
        name: "Test Facility".into(),
        building_type,
        default_strategy_key: None,
        default_pricing_plan_id: None,
    }
}

pub fn account() -> Account {
    Account {
        account_id: ACCOUNT.into(),
        name: "Test Account".into(),
        default_strategy_key: None,
        default_pricing_plan_id: None,
    }
}

pub fn area(id: &str, square_feet: f64) -> Area {
    Area {
        area_id: id.into(),
        facility_id: FACILITY.into(),
        name: format!("Area {id}"),
        square_feet,
        quantity: 1,
        floor_type: FloorType::Vct,
        condition_level: ConditionLevel::Standard,
        traffic_level: TrafficLevel::Medium,
        room_count: 0,
        unit_count: 0,
        fixtures: Vec::new(),
    }
}

pub fn fixture(fixture_type_id: &str, count: u32, minutes_per_item: Option<f64>) -> FixtureInstance {
    FixtureInstance {
        fixture_type_id: fixture_type_id.into(),
        count,
        minutes_per_item,
    }
}

pub fn task(id: &str, area_id: Option<&str>, frequency: Frequency, base_minutes: f64) -> FacilityTask {
    FacilityTask {
        task_id: id.into(),
        facility_id: FACILITY.into(),
        area_id: area_id.map(str::to_string),
        name: format!("Task {id}"),
        cleaning_frequency: frequency,
        template: None,
        base_minutes_override: Some(base_minutes),
        minutes_per_sqft_override: None,
        minutes_per_unit_override: None,
        minutes_per_room_override: None,
        fixture_minutes_overrides: Vec::new(),
    }
}

pub fn bundle(areas: Vec<Area>, tasks: Vec<FacilityTask>) -> FacilityBundle {
    FacilityBundle {
        facility: facility(BuildingType::Office),
        areas,
        tasks,
    }
}

/// $0.10/sqft, no minimum, every multiplier neutral.
pub fn sqft_plan() -> PricingSettings {
    PricingSettings {
        base_rate_per_sqft: 0.10,
        ..PricingSettings::blank("sqft_test", PricingType::SquareFoot)
    }
}

/// $60/hour with no overhead, margin, travel, or minimum, so one
/// adjusted labor minute costs exactly one dollar.
pub fn hourly_plan() -> PricingSettings {
    PricingSettings {
        hourly_rate: 60.0,
        ..PricingSettings::blank("hourly_test", PricingType::Hourly)
    }
}

pub fn run(
    strategy: &dyn PricingStrategy,
    bundle: &FacilityBundle,
    settings: &PricingSettings,
    request: &QuoteRequest,
) -> QuoteResult {
    let input = QuoteInput {
        bundle,
        settings,
        request,
        default_subcontractor_pct: 0.60,
        captured_at: captured_at(),
    };
    strategy.quote(&input).unwrap()
}

pub fn request(frequency: Frequency) -> QuoteRequest {
    QuoteRequest::new(FACILITY, frequency)
}

pub fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.005,
        "expected {expected}, got {actual}"
    );
}

/// A repository over plain maps. `Sync`, so one engine can be shared
/// across threads.
#[derive(Default)]
pub struct MemoryRepo {
    pub facilities: Mutex<HashMap<EntityId, FacilityBundle>>,
    pub accounts: Mutex<HashMap<EntityId, Account>>,
    pub plans: Mutex<HashMap<EntityId, PricingSettings>>,
    pub default_plan: Mutex<Option<EntityId>>,
    pub proposals: Mutex<HashMap<EntityId, Proposal>>,
    pub locks: Mutex<Vec<LockedQuote>>,
    pub invoices: Mutex<Vec<Invoice>>,
}

impl MemoryRepo {
    pub fn with_facility(bundle: FacilityBundle) -> Self {
        let repo = Self::default();
        repo.put_facility(bundle);
        repo
    }

    pub fn put_facility(&self, bundle: FacilityBundle) {
        self.facilities
            .lock()
            .unwrap()
            .insert(bundle.facility.facility_id.clone(), bundle);
    }

    pub fn put_account(&self, account: Account) {
        self.accounts.lock().unwrap().insert(account.account_id.clone(), account);
    }

    pub fn put_proposal(&self, proposal: Proposal) {
        self.proposals
            .lock()
            .unwrap()
            .insert(proposal.proposal_id.clone(), proposal);
    }

    pub fn bundle_of(&self, facility_id: &str) -> FacilityBundle {
        self.facilities.lock().unwrap()[facility_id].clone()
    }

    pub fn put_plan(&self, plan: PricingSettings) {
        self.plans.lock().unwrap().insert(plan.plan_id.clone(), plan);
    }
}

impl PricingRepository for MemoryRepo {
    fn facility_bundle(&self, facility_id: &str) -> PricingResult<Option<FacilityBundle>> {
        Ok(self.facilities.lock().unwrap().get(facility_id).cloned())
    }

    fn account(&self, account_id: &str) -> PricingResult<Option<Account>> {
        Ok(self.accounts.lock().unwrap().get(account_id).cloned())
    }

    fn pricing_plan(&self, plan_id: &str) -> PricingResult<Option<PricingSettings>> {
        Ok(self.plans.lock().unwrap().get(plan_id).cloned())
    }

    fn default_pricing_plan_id(&self) -> PricingResult<Option<EntityId>> {
        Ok(self.default_plan.lock().unwrap().clone())
    }

    fn proposal(&self, proposal_id: &str) -> PricingResult<Option<Proposal>> {
        Ok(self.proposals.lock().unwrap().get(proposal_id).cloned())
    }

    fn save_proposal(&self, proposal: &Proposal) -> PricingResult<()> {
        self.proposals
            .lock()
            .unwrap()
            .insert(proposal.proposal_id.clone(), proposal.clone());
        Ok(())
    }

    fn lock_proposal(&self, proposal: &Proposal, locked: &LockedQuote) -> PricingResult<()> {
        self.save_proposal(proposal)?;
        self.locks.lock().unwrap().push(locked.clone());
        Ok(())
    }

    fn latest_locked_quote(&self, proposal_id: &str) -> PricingResult<Option<LockedQuote>> {
        Ok(self
            .locks
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|l| l.proposal_id == proposal_id)
            .cloned())
    }
}

impl InvoiceRepository for MemoryRepo {
    fn invoice_exists(&self, contract_id: &str, period: &str) -> PricingResult<bool> {
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .any(|i| i.contract_id == contract_id && i.period == period))
    }

    fn insert_invoice(&self, invoice: &Invoice) -> PricingResult<()> {
        let mut invoices = self.invoices.lock().unwrap();
        if invoices
            .iter()
            .any(|i| i.contract_id == invoice.contract_id && i.period == invoice.period)
        {
            return Err(PricingError::DuplicateInvoice {
                contract_id: invoice.contract_id.clone(),
                period: invoice.period.clone(),
            });
        }
        invoices.push(invoice.clone());
        Ok(())
    }

    fn invoices_for_period(&self, period: &str) -> PricingResult<Vec<Invoice>> {
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.period == period)
            .cloned()
            .collect())
    }
}
