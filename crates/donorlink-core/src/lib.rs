//! Donorlink Core - Donor models, errors, and configuration
//!
//! This crate contains the domain types shared by every other donorlink crate:
//! the typed donor record and its append-only collection, match queries, and
//! the layered configuration.

pub mod config;
pub mod error;
pub mod models;

pub use error::{DonorlinkError, Result};
