pub mod batch;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod facility;
pub mod frequency;
pub mod keys;
pub mod multiplier;
pub mod numeric;
pub mod proposal;
pub mod proration;
pub mod quote;
pub mod registry;
pub mod repository;
pub mod settings;
pub mod snapshot;
pub mod store;
pub mod strategy;
pub mod types;
