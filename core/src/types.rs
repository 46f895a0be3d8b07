//! Shared primitive types used across the pricing engine.

/// A stable, unique identifier for any persisted record
/// (facility, area, task, plan, proposal, contract, invoice).
pub type EntityId = String;

/// A strategy registration key, e.g. `"square_footage_v1"`.
pub type StrategyKey = String;

/// Dollars. All money is carried as f64 and rounded to cents
/// only where the rounding policy in `numeric` says so.
pub type Money = f64;
