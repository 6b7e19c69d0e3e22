//! Local persistence and aggregation for a personal fitness tracker.
//!
//! Records (workouts, meals, goals, water, the user profile) live in a
//! SQLite database behind [`RecordStore`]; [`insights`] derives the
//! dashboard figures from in-memory snapshots; [`commands`] is the surface
//! the UI and the `fitpro` binary call into.

pub mod coerce;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod insights;
pub mod logging;
pub mod migrate;
pub mod model;
pub mod repo;
pub mod state;
pub mod store;
pub mod time;
pub mod util;

pub use config::Config;
pub use error::{AppError, AppResult, StoreError};
pub use state::{AppState, StoreStatus};
pub use store::{RecordStore, Snapshot};
