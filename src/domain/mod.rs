//! Domain layer - pure types with no I/O.
//!
//! This layer contains the core concepts of report throttling:
//! - Error identity resolution and fingerprinting
//! - Records kept per identity (marker, affected users, statistics)
//! - The report context and its enrichment
//!
//! All types in this layer are pure and easily testable.

pub mod context;
pub mod identity;
pub mod records;
