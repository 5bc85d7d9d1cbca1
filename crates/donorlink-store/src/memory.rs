//! In-memory donor store for development and testing.

use crate::ports::DonorStore;
use donorlink_core::error::{DonorlinkError, Result};
use donorlink_core::models::{DonorCollection, DonorRecord};

/// In-memory implementation of DonorStore
#[derive(Debug, Clone, Default)]
pub struct MemoryDonorStore {
    donors: DonorCollection,
    flushes: usize,
    closed: bool,
}

impl MemoryDonorStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `donors`
    pub fn with_donors(donors: DonorCollection) -> Self {
        Self { donors, ..Self::default() }
    }

    /// Number of flushes performed
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(DonorlinkError::StoreClosed);
        }
        Ok(())
    }
}

impl DonorStore for MemoryDonorStore {
    fn donors(&self) -> Result<&DonorCollection> {
        self.ensure_open()?;
        Ok(&self.donors)
    }

    fn append(&mut self, record: DonorRecord) -> Result<usize> {
        self.ensure_open()?;
        self.donors.push(record)
    }

    fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.flushes += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.closed = true;
        Ok(())
    }
}
