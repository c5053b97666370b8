//! Data module - CSV ingestion, normalization, derivation, filtering

pub mod derive;
pub mod filter;
pub mod loader;
pub mod schema;

pub use derive::{default_outcome_rules, derive_columns, OutcomeRule};
pub use filter::PitchFilter;
pub use loader::{DataLoader, LoadOutcome, LoaderError};
pub use schema::DataCategory;
