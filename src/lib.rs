//! Core library for the lp-agent project.
//!
//! One cycle reads the pool and wallet (`dex`), sizes trades (`sizing`),
//! submits or simulates them (`execution`) and persists the new baseline
//! (`store`); `orchestrator` sequences cycles on a timer.

pub mod cli;
pub mod config;
pub mod dex;
pub mod errors;
pub mod execution;
pub mod models;
pub mod orchestrator;
pub mod sizing;
pub mod store;
pub mod utils;
