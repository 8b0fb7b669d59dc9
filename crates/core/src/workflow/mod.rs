//! Transaction lifecycle workflow.
//!
//! This module implements the lifecycle state machine and the domain
//! capability checks:
//!
//! - `types` - Actors, roles, actions, the capability table, transitions
//! - `service` - Pure transition validation

pub mod service;
pub mod types;

pub use service::LifecycleService;
pub use types::{Actor, CapabilityTable, LedgerAction, LifecycleAction, Role};
