use donorlink_core::error::Result;
use donorlink_core::models::{DonorCollection, DonorRecord};
use serde::Serialize;

/// A stored row that could not be read as a donor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarantinedRow {
    /// 1-based line in the source file
    pub line: u64,
    pub reason: String,
}

/// Port for donor persistence
///
/// A store is opened by its adapter, mutated through `append`, persisted with
/// `flush` and finally closed. Every call after `close` fails with
/// `StoreClosed`.
pub trait DonorStore {
    /// All donors, in storage order
    fn donors(&self) -> Result<&DonorCollection>;

    /// Validate and append a donor, returning its index
    fn append(&mut self, record: DonorRecord) -> Result<usize>;

    /// Persist every pending change
    fn flush(&mut self) -> Result<()>;

    /// Flush and release the store
    fn close(&mut self) -> Result<()>;

    /// Rows excluded from the collection when the store was opened
    fn quarantined(&self) -> &[QuarantinedRow] {
        &[]
    }
}
