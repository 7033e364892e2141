//! # Commentary API Server
//!
//! Comments REST API guarded by layered throttles. The binary in `main.rs`
//! wires these modules to real adapters; integration tests drive the same
//! routes with in-memory ones.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod telemetry;
