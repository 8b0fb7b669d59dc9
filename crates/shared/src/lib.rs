//! Shared types and configuration for Quadra.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Decimal money helpers
//! - Configuration management

pub mod config;
pub mod types;

pub use config::AppConfig;
