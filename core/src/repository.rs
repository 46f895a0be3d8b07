//! The persistence seam.
//!
//! The engine and the batch generator only see these traits.
//! `store::PricingStore` is the SQLite implementation.

use crate::{
    batch::Invoice,
    error::PricingResult,
    facility::{Account, FacilityBundle},
    proposal::{LockedQuote, Proposal},
    settings::PricingSettings,
    types::EntityId,
};

pub trait PricingRepository {
    /// The facility with its areas and tasks, or `None` if unknown.
    fn facility_bundle(&self, facility_id: &str) -> PricingResult<Option<FacilityBundle>>;

    fn account(&self, account_id: &str) -> PricingResult<Option<Account>>;

    fn pricing_plan(&self, plan_id: &str) -> PricingResult<Option<PricingSettings>>;

    /// The plan flagged as the store-wide default, if any.
    fn default_pricing_plan_id(&self) -> PricingResult<Option<EntityId>>;

    fn proposal(&self, proposal_id: &str) -> PricingResult<Option<Proposal>>;

    fn save_proposal(&self, proposal: &Proposal) -> PricingResult<()>;

    /// Write `locked` and the updated proposal atomically.
    fn lock_proposal(&self, proposal: &Proposal, locked: &LockedQuote) -> PricingResult<()>;

    /// The most recent locked quote for a proposal.
    fn latest_locked_quote(&self, proposal_id: &str) -> PricingResult<Option<LockedQuote>>;
}

pub trait InvoiceRepository {
    fn invoice_exists(&self, contract_id: &str, period: &str) -> PricingResult<bool>;

    fn insert_invoice(&self, invoice: &Invoice) -> PricingResult<()>;

    fn invoices_for_period(&self, period: &str) -> PricingResult<Vec<Invoice>>;
}
