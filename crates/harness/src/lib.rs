//! CI harness for Harmony services: enumerate services and their collections
//! from CMR, map services to test suites, and smoke test each collection.

pub mod aggregate;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod harmony;
pub mod mapping;
pub mod output;
pub mod pagination;
pub mod smoke;

pub use error::{HarnessError, PageError, Result};
