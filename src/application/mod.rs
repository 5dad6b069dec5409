//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic against the store:
//! - Typed store access and key namespacing
//! - Tracking ledger (marker, affected users, counters)
//! - Capacity guard (global cap on tracked identities)
//! - Reporter (the report/suppress/bypass decision)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod capacity;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod ports;
pub mod reporter;
pub mod state;
