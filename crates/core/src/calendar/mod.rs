//! Calendar feed synchronization: normalization, reconciliation, and the
//! orchestrator driving one-listing and fleet-wide sync runs.

pub mod engine;
pub mod normalizer;
pub mod ports;
pub mod service;
