//! Infrastructure layer: configuration, database wiring, record storage.

pub mod config;
pub mod db;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use store::{InMemoryTimesheetStore, PostgresTimesheetStore, StoreError, StoreResult, TimesheetStore};
