//! Message board: a durable store of short text records.
//!
//! This crate provides the persistence core of a message board. Every record
//! is addressed by a unique identifier, stamped on creation and update, and
//! kept in an ordered key-value store whose contents survive process
//! restarts.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Records, payloads and identifiers with no infrastructure
//!   dependencies
//! - **Ports**: The durable ordered map contract the service writes through
//! - **Adapters**: In-memory, snapshot-file and `PostgreSQL` stores
//!
//! # Modules
//!
//! - [`board`]: Message records and the CRUD service
//! - [`config`]: Environment-driven service configuration
//! - [`telemetry`]: Tracing subscriber installation

pub mod board;
pub mod config;
pub mod telemetry;
