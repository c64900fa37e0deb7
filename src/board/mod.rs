//! Message records and their CRUD lifecycle.
//!
//! A message moves from absent to present on creation, may be replaced any
//! number of times by updates, and returns to absent on deletion. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
