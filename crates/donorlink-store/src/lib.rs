//! Donorlink Store - Donor storage ports and adapters
//!
//! This crate defines the donor storage port and provides a CSV-backed
//! adapter for the donor dataset plus an in-memory adapter for tests.

pub mod csv_store;
pub mod memory;
pub mod ports;
pub mod schema;

pub use csv_store::CsvDonorStore;
pub use memory::MemoryDonorStore;
pub use ports::{DonorStore, QuarantinedRow};
