pub mod action;
pub mod batch;
pub mod center;
pub mod context;
pub mod engine;
pub mod error;
pub mod evaluators;
pub mod farm;
pub mod inventory;
pub mod logbook;
pub mod rule;
pub mod schedule;
pub mod store;
pub mod task;
pub mod types;

pub use error::{FarmdeskError, Result};
