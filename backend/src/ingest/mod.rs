//! CSV ingestion for the three source tables.

pub mod loaders;

pub use loaders::{load_business_hours, load_data_dir, load_polls, load_timezones};
