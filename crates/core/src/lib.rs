//! Core ledger business logic for Quadra.
//!
//! This crate contains the financial ledger of the property-management
//! platform with ZERO web dependencies. All domain types, validation rules,
//! calculations and the lifecycle orchestration live here.
//!
//! # Modules
//!
//! - `ledger` - Transaction records, audit trail codec, balance and tags
//! - `workflow` - Lifecycle state machine and capability checks
//! - `store` - Persistence seam and in-memory implementation
//! - `signal` - Cache invalidation and notification contracts
//! - `manager` - Lifecycle manager orchestrating the above

pub mod ledger;
pub mod manager;
pub mod signal;
pub mod store;
pub mod workflow;
