//! Strategy registry and pricing-context resolution.
//!
//! RULE: The registry owns its default. There is no global
//! strategy singleton; callers inject a registry into the engine.
//!
//! Resolution walks four scopes, most specific first:
//!   proposal (request override, then proposal record)
//!   → facility default → account default → system default.
//! The strategy key and the pricing plan resolve independently.
//! Nothing is cached; each call re-reads the records it is given.

use crate::{
    facility::{Account, Facility},
    proposal::Proposal,
    quote::QuoteRequest,
    settings::PricingType,
    strategy::{PerHourStrategy, PricingStrategy, SquareFootageStrategy, StrategyMetadata},
    types::{EntityId, StrategyKey},
};
use serde::{Deserialize, Serialize};

pub struct StrategyRegistry {
    /// Registration order. Never shrinks, so `default_index` stays valid.
    strategies: Vec<Box<dyn PricingStrategy>>,
    default_index: usize,
}

impl StrategyRegistry {
    /// A registry holding the built-in strategies. Square footage is
    /// the default.
    pub fn new() -> Self {
        let mut registry = Self::with_default(Box::new(SquareFootageStrategy::new()));
        registry.register(Box::new(PerHourStrategy::new()));
        registry
    }

    /// A registry holding only `default`.
    pub fn with_default(default: Box<dyn PricingStrategy>) -> Self {
        Self {
            strategies: vec![default],
            default_index: 0,
        }
    }

    /// Register a strategy. A strategy with the same key is replaced
    /// in place, keeping its default status.
    pub fn register(&mut self, strategy: Box<dyn PricingStrategy>) {
        match self.position(strategy.key()) {
            Some(index) => {
                log::info!("registry: replacing strategy '{}'", strategy.key());
                self.strategies[index] = strategy;
            }
            None => {
                log::debug!("registry: registered strategy '{}'", strategy.key());
                self.strategies.push(strategy);
            }
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.strategies.iter().position(|s| s.key() == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&dyn PricingStrategy> {
        self.position(key).map(|i| self.strategies[i].as_ref())
    }

    pub fn default_strategy(&self) -> &dyn PricingStrategy {
        self.strategies[self.default_index].as_ref()
    }

    pub fn default_key(&self) -> &str {
        self.default_strategy().key()
    }

    /// Look up `key`; an unknown key falls back to the default with a
    /// warning. Never fails.
    pub fn get_or_default(&self, key: &str) -> &dyn PricingStrategy {
        match self.get(key) {
            Some(strategy) => strategy,
            None => {
                log::warn!(
                    "registry: unknown strategy '{key}', falling back to default '{}'",
                    self.default_key()
                );
                self.default_strategy()
            }
        }
    }

    /// Make `key` the default. Returns false (and changes nothing)
    /// when `key` is not registered.
    pub fn set_default(&mut self, key: &str) -> bool {
        match self.position(key) {
            Some(index) => {
                self.default_index = index;
                true
            }
            None => {
                log::warn!("registry: cannot make unknown strategy '{key}' the default");
                false
            }
        }
    }

    /// Plan-type dispatch: the default if it prices `pricing_type`,
    /// else the first registered strategy that does, else the default.
    pub fn for_pricing_type(&self, pricing_type: PricingType) -> &dyn PricingStrategy {
        let default = self.default_strategy();
        if default.metadata().pricing_type == pricing_type {
            return default;
        }
        self.strategies
            .iter()
            .find(|s| s.metadata().is_active && s.metadata().pricing_type == pricing_type)
            .map(|s| s.as_ref())
            .unwrap_or(default)
    }

    /// The one selector used per request. An explicit key from any
    /// scope above `System` wins; otherwise the plan type decides.
    pub fn select(&self, strategy: &ResolvedKey, plan_type: PricingType) -> &dyn PricingStrategy {
        match strategy {
            ResolvedKey { scope, value: Some(key) } if *scope != Scope::System => {
                let chosen = self.get_or_default(key);
                if chosen.metadata().pricing_type != plan_type {
                    log::warn!(
                        "registry: explicit strategy '{}' ({:?} scope) prices {} but plan is {}; explicit key wins",
                        chosen.key(),
                        scope,
                        chosen.metadata().pricing_type.as_str(),
                        plan_type.as_str()
                    );
                }
                chosen
            }
            _ => self.for_pricing_type(plan_type),
        }
    }

    /// Metadata for every strategy, sorted by key. `is_default`
    /// reflects this registry, not the static registration flag.
    pub fn list(&self) -> Vec<StrategyMetadata> {
        let default_key = self.default_key().to_string();
        let mut all: Vec<StrategyMetadata> = self
            .strategies
            .iter()
            .map(|s| {
                let mut meta = s.metadata().clone();
                meta.is_default = meta.key == default_key;
                meta
            })
            .collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Proposal,
    Facility,
    Account,
    System,
}

/// A resolved value and the scope it came from. `value` is `None`
/// only when no scope, including `System`, supplied one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedKey {
    pub scope: Scope,
    pub value: Option<String>,
}

/// What a pricing context resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedContext {
    pub strategy: ResolvedKey,
    pub plan: ResolvedKey,
}

/// The records a resolution reads. `proposal` and `account` may be
/// absent; each level's field is an explicit nullable override.
#[derive(Debug, Clone, Copy)]
pub struct PricingScopes<'a> {
    pub request: &'a QuoteRequest,
    pub proposal: Option<&'a Proposal>,
    pub facility: &'a Facility,
    pub account: Option<&'a Account>,
    pub system_strategy_key: Option<&'a str>,
    pub system_plan_id: Option<&'a str>,
}

fn first_set(levels: [(Scope, Option<&str>); 4]) -> ResolvedKey {
    levels
        .into_iter()
        .find_map(|(scope, value)| {
            value.map(|v| ResolvedKey { scope, value: Some(v.to_string()) })
        })
        .unwrap_or(ResolvedKey { scope: Scope::System, value: None })
}

impl PricingScopes<'_> {
    pub fn resolve(&self) -> ResolvedContext {
        let proposal_strategy = self
            .request
            .strategy_key
            .as_deref()
            .or_else(|| self.proposal.and_then(|p| p.strategy_key.as_deref()));
        let proposal_plan = self
            .request
            .pricing_plan_id
            .as_deref()
            .or_else(|| self.proposal.and_then(|p| p.pricing_plan_id.as_deref()));

        let strategy = first_set([
            (Scope::Proposal, proposal_strategy),
            (Scope::Facility, self.facility.default_strategy_key.as_deref()),
            (Scope::Account, self.account.and_then(|a| a.default_strategy_key.as_deref())),
            (Scope::System, self.system_strategy_key),
        ]);
        let plan = first_set([
            (Scope::Proposal, proposal_plan),
            (Scope::Facility, self.facility.default_pricing_plan_id.as_deref()),
            (Scope::Account, self.account.and_then(|a| a.default_pricing_plan_id.as_deref())),
            (Scope::System, self.system_plan_id),
        ]);

        log::debug!(
            "registry: facility={} strategy={:?}@{:?} plan={:?}@{:?}",
            self.facility.facility_id,
            strategy.value,
            strategy.scope,
            plan.value,
            plan.scope
        );

        ResolvedContext { strategy, plan }
    }
}

impl ResolvedContext {
    pub fn plan_id(&self) -> Option<&EntityId> {
        self.plan.value.as_ref()
    }

    pub fn strategy_key(&self) -> Option<&StrategyKey> {
        self.strategy.value.as_ref()
    }
}
