//! The pricing engine: resolution, quoting, and proposal locking.
//!
//! QUOTE ORDER (fixed):
//!   1. Load the facility bundle, its account, and the proposal if named.
//!   2. Resolve strategy key and plan id independently across the
//!      Proposal → Facility → Account → System scopes.
//!   3. Load and validate the plan.
//!   4. Select one strategy and hand it the fetched records.
//!
//! RULES:
//!   - Strategies never touch the repository.
//!   - Nothing is cached between calls; each quote re-resolves.
//!   - A locked proposal's stored quote is never recomputed.

use crate::{
    clock::{Clock, SystemClock},
    config::EngineConfig,
    error::{PricingError, PricingResult},
    frequency::Frequency,
    proposal::{LockedQuote, Proposal},
    quote::{QuoteRequest, QuoteResult},
    registry::{PricingScopes, ResolvedContext, StrategyRegistry},
    repository::PricingRepository,
    settings::PricingSettings,
    store::PricingStore,
    strategy::{QuoteInput, StrategyMetadata},
};
use std::sync::Arc;

pub struct PricingEngine<R: PricingRepository> {
    repo: R,
    registry: StrategyRegistry,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
}

impl<R: PricingRepository> PricingEngine<R> {
    pub fn new(repo: R, config: EngineConfig) -> Self {
        Self::with_registry(repo, config, StrategyRegistry::new())
    }

    /// Use a caller-built registry. The configured default key is
    /// applied when it names a registered strategy.
    pub fn with_registry(repo: R, config: EngineConfig, mut registry: StrategyRegistry) -> Self {
        if !registry.set_default(&config.default_strategy_key) {
            log::warn!(
                "engine: configured default strategy '{}' not registered; keeping '{}'",
                config.default_strategy_key,
                registry.default_key()
            );
        }
        Self {
            repo,
            registry,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn strategies(&self) -> Vec<StrategyMetadata> {
        self.registry.list()
    }

    // ── Resolution ──────────────────────────────────────────────

    /// Resolve which strategy key and plan id apply to `request`.
    pub fn resolve(&self, request: &QuoteRequest) -> PricingResult<ResolvedContext> {
        let bundle = self.load_bundle(&request.facility_id)?;
        let proposal = self.load_request_proposal(request)?;
        self.resolve_for(request, proposal.as_ref(), &bundle.facility)
    }

    fn resolve_for(
        &self,
        request: &QuoteRequest,
        proposal: Option<&Proposal>,
        facility: &crate::facility::Facility,
    ) -> PricingResult<ResolvedContext> {
        let account = self.repo.account(&facility.account_id)?;
        let system_plan_id = match &self.config.default_plan_id {
            Some(id) => Some(id.clone()),
            None => self.repo.default_pricing_plan_id()?,
        };
        let scopes = PricingScopes {
            request,
            proposal,
            facility,
            account: account.as_ref(),
            system_strategy_key: Some(self.registry.default_key()),
            system_plan_id: system_plan_id.as_deref(),
        };
        Ok(scopes.resolve())
    }

    fn load_bundle(&self, facility_id: &str) -> PricingResult<crate::facility::FacilityBundle> {
        self.repo
            .facility_bundle(facility_id)?
            .ok_or_else(|| PricingError::FacilityNotFound {
                facility_id: facility_id.to_string(),
            })
    }

    fn load_request_proposal(&self, request: &QuoteRequest) -> PricingResult<Option<Proposal>> {
        match &request.proposal_id {
            Some(id) => self.load_proposal(id).map(Some),
            None => Ok(None),
        }
    }

    fn load_proposal(&self, proposal_id: &str) -> PricingResult<Proposal> {
        self.repo
            .proposal(proposal_id)?
            .ok_or_else(|| PricingError::ProposalNotFound {
                proposal_id: proposal_id.to_string(),
            })
    }

    /// Store plans win over config plans with the same id.
    fn load_plan(&self, plan_id: &str) -> PricingResult<PricingSettings> {
        if let Some(plan) = self.repo.pricing_plan(plan_id)? {
            return Ok(plan);
        }
        self.config
            .plan(plan_id)
            .cloned()
            .ok_or_else(|| PricingError::PlanNotFound {
                plan_id: plan_id.to_string(),
            })
    }

    // ── Quoting ─────────────────────────────────────────────────

    /// Price a facility. Read-only: nothing is written.
    pub fn quote(&self, request: &QuoteRequest) -> PricingResult<QuoteResult> {
        let proposal = self.load_request_proposal(request)?;
        self.quote_with(request, proposal.as_ref())
    }

    fn quote_with(&self, request: &QuoteRequest, proposal: Option<&Proposal>) -> PricingResult<QuoteResult> {
        let bundle = self.load_bundle(&request.facility_id)?;
        let context = self.resolve_for(request, proposal, &bundle.facility)?;

        let plan_id = context.plan_id().ok_or_else(|| PricingError::NoPricingPlan {
            context: format!("facility '{}'", request.facility_id),
        })?;
        let settings = self.load_plan(plan_id)?;
        settings.validate()?;
        if !settings.is_active {
            log::warn!("engine: plan '{}' is inactive but was resolved explicitly", settings.plan_id);
        }

        let strategy = self.registry.select(&context.strategy, settings.pricing_type);
        let input = QuoteInput {
            bundle: &bundle,
            settings: &settings,
            request,
            default_subcontractor_pct: self.config.default_subcontractor_pct,
            captured_at: self.clock.now(),
        };
        strategy.quote(&input)
    }

    /// One quote per frequency, in the order given.
    pub fn compare_frequencies(
        &self,
        request: &QuoteRequest,
        frequencies: &[Frequency],
    ) -> PricingResult<Vec<QuoteResult>> {
        let proposal = self.load_request_proposal(request)?;
        frequencies
            .iter()
            .map(|f| self.quote_with(&request.clone().with_frequency(*f), proposal.as_ref()))
            .collect()
    }

    // ── Proposals ───────────────────────────────────────────────

    fn ensure_editable(proposal: &Proposal) -> PricingResult<()> {
        if proposal.pricing_locked {
            return Err(PricingError::PricingLocked {
                proposal_id: proposal.proposal_id.clone(),
            });
        }
        if !proposal.status.is_editable() {
            return Err(PricingError::NotEditable {
                proposal_id: proposal.proposal_id.clone(),
                status: proposal.status.as_str().to_string(),
            });
        }
        Ok(())
    }

    /// Re-quote a draft proposal and store the new totals.
    pub fn recalculate_proposal(&self, proposal_id: &str) -> PricingResult<QuoteResult> {
        let mut proposal = self.load_proposal(proposal_id)?;
        Self::ensure_editable(&proposal)?;

        let quote = self.quote_with(&proposal.to_request(), Some(&proposal))?;
        proposal.record_quote(&quote, self.clock.now())?;
        self.repo.save_proposal(&proposal)?;
        log::info!(
            "engine: proposal={proposal_id} recalculated monthly_total={:.2}",
            quote.monthly_total
        );
        Ok(quote)
    }

    /// Freeze a proposal's pricing. The quote stored by the last
    /// recalculation is locked as-is; a fresh quote is computed only when
    /// none is stored or the proposal's inputs have changed since. The
    /// quote and its settings snapshot are written once and later edits
    /// to the plan do not reach them.
    pub fn lock_pricing(&self, proposal_id: &str) -> PricingResult<LockedQuote> {
        let mut proposal = self.load_proposal(proposal_id)?;
        Self::ensure_editable(&proposal)?;

        let now = self.clock.now();
        let stored = proposal.stored_quote_json()?.map(str::to_owned);
        let locked = match stored {
            Some(json) => {
                log::debug!("engine: proposal={proposal_id} locking stored quote");
                LockedQuote::from_quote_json(proposal_id, &json, now)?
            }
            None => {
                let quote = self.quote_with(&proposal.to_request(), Some(&proposal))?;
                proposal.record_quote(&quote, now)?;
                LockedQuote::from_quote(proposal_id, &quote, now)?
            }
        };

        proposal.pricing_locked = true;
        self.repo.lock_proposal(&proposal, &locked)?;
        log::info!(
            "engine: proposal={proposal_id} locked at {:.2} (lock {})",
            locked.monthly_total,
            locked.lock_id
        );
        Ok(locked)
    }

    /// Allow recalculation again. Earlier lock records are kept; the
    /// stored quote is dropped so the next lock prices afresh unless the
    /// proposal is recalculated first.
    pub fn unlock_pricing(&self, proposal_id: &str) -> PricingResult<Proposal> {
        let mut proposal = self.load_proposal(proposal_id)?;
        if !proposal.pricing_locked {
            return Err(PricingError::NotLocked {
                proposal_id: proposal_id.to_string(),
            });
        }
        proposal.pricing_locked = false;
        proposal.last_quote_json = None;
        self.repo.save_proposal(&proposal)?;
        log::info!("engine: proposal={proposal_id} unlocked");
        Ok(proposal)
    }

    /// The latest locked quote, exactly as written at lock time.
    pub fn locked_quote(&self, proposal_id: &str) -> PricingResult<Option<LockedQuote>> {
        self.repo.latest_locked_quote(proposal_id)
    }
}

impl PricingEngine<PricingStore> {
    /// In-memory store, migrated and seeded with the test config's plans.
    /// Use in tests instead of wiring a store by hand.
    pub fn build_test() -> PricingResult<Self> {
        let config = EngineConfig::default_test();
        let store = PricingStore::in_memory()?;
        store.migrate()?;
        for plan in &config.plans {
            let is_default = config.default_plan_id.as_deref() == Some(plan.plan_id.as_str());
            store.upsert_plan(plan, is_default)?;
        }
        Ok(Self::new(store, config))
    }
}
