use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Facility '{facility_id}' not found")]
    FacilityNotFound { facility_id: String },

    #[error("No pricing plan resolvable for {context}")]
    NoPricingPlan { context: String },

    #[error("Pricing plan '{plan_id}' not found")]
    PlanNotFound { plan_id: String },

    #[error("Invalid pricing settings '{plan_id}': {reason}")]
    InvalidSettings { plan_id: String, reason: String },

    #[error("Invalid billing window: {start} .. {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("Proposal '{proposal_id}' not found")]
    ProposalNotFound { proposal_id: String },

    #[error("Proposal '{proposal_id}' has locked pricing")]
    PricingLocked { proposal_id: String },

    #[error("Proposal '{proposal_id}' is not editable in status '{status}'")]
    NotEditable { proposal_id: String, status: String },

    #[error("Proposal '{proposal_id}' pricing is not locked")]
    NotLocked { proposal_id: String },

    #[error("Contract '{contract_id}' is already invoiced for {period}")]
    DuplicateInvoice { contract_id: String, period: String },

    #[error("Invoice batch '{key}' already running (lock expires {expires_at})")]
    BatchInProgress { key: String, expires_at: DateTime<Utc> },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PricingResult<T> = Result<T, PricingError>;
