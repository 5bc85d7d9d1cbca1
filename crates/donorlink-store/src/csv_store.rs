//! CSV file adapter for the donor dataset

use crate::ports::{DonorStore, QuarantinedRow};
use crate::schema::{self, DonorRow, CANONICAL_HEADER};
use csv::StringRecord;
use donorlink_core::error::{DonorlinkError, Result};
use donorlink_core::models::{DonorCollection, DonorRecord, RowPolicy};
use std::fs;
use std::path::{Path, PathBuf};

/// Donor store backed by a CSV file
///
/// The whole file is read on `open`. Rows already in the file are kept as
/// read and written back field for field on every flush, so quarantined rows
/// and unknown columns survive a rewrite.
#[derive(Debug)]
pub struct CsvDonorStore {
    path: PathBuf,
    header: StringRecord,
    /// Rows as stored on disk, donors and quarantined alike
    stored: Vec<StringRecord>,
    donors: DonorCollection,
    /// Donors appended since the last flush, at the tail of `donors`
    pending: usize,
    quarantined: Vec<QuarantinedRow>,
    /// The file does not exist yet
    created: bool,
    closed: bool,
}

fn csv_error(path: &Path, error: csv::Error) -> DonorlinkError {
    let reason = error.to_string();
    match error.into_kind() {
        csv::ErrorKind::Io(e) => DonorlinkError::Io(e),
        _ => DonorlinkError::InvalidSchema { path: path.to_path_buf(), reason },
    }
}

/// 1-based file line of the byte at `offset`, for LF and CRLF files alike
fn line_at(bytes: &[u8], offset: u64) -> u64 {
    let end = (offset as usize).min(bytes.len());
    bytes[..end].iter().filter(|&&b| b == b'\n').count() as u64 + 1
}

impl CsvDonorStore {
    /// Open the dataset at `path`, reading every row
    ///
    /// A missing file opens as an empty store and is created on the first
    /// flush. Under [`RowPolicy::Reject`] the first malformed row fails the
    /// open with `InvalidDonorRecord`; under [`RowPolicy::Quarantine`] it is
    /// set aside and reported by [`DonorStore::quarantined`].
    pub fn open(path: impl AsRef<Path>, policy: RowPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut store = Self {
            path: path.clone(),
            header: StringRecord::from(CANONICAL_HEADER.to_vec()),
            stored: Vec::new(),
            donors: DonorCollection::new(),
            pending: 0,
            quarantined: Vec::new(),
            created: !path.exists(),
            closed: false,
        };

        if store.created {
            tracing::info!("Dataset {} does not exist yet; starting empty", path.display());
            return Ok(store);
        }

        let bytes = fs::read(&path)?;
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(bytes.as_slice());

        let header = reader.headers().map_err(|e| csv_error(&path, e))?.clone();
        if header.is_empty() {
            tracing::info!("Dataset {} is empty", path.display());
            return Ok(store);
        }
        let missing = schema::missing_columns(header.iter());
        if !missing.is_empty() {
            return Err(DonorlinkError::InvalidSchema {
                path,
                reason: format!("missing required columns: {}", missing.join(", ")),
            });
        }
        store.header = header;

        for result in reader.records() {
            let raw = result.map_err(|e| csv_error(&store.path, e))?;
            let line = raw.position().map(|p| line_at(&bytes, p.byte())).unwrap_or_default();

            match parse_row(&store.header, &raw) {
                Ok(record) => {
                    store.donors.push(record)?;
                }
                Err(reason) => match policy {
                    RowPolicy::Reject => {
                        return Err(DonorlinkError::InvalidDonorRecord {
                            row: line as usize,
                            reason,
                        });
                    }
                    RowPolicy::Quarantine => {
                        tracing::warn!("Quarantined line {} of {}: {}", line, path.display(), reason);
                        store.quarantined.push(QuarantinedRow { line, reason });
                    }
                },
            }
            store.stored.push(raw);
        }

        tracing::info!(
            "Opened {} with {} donors ({} quarantined)",
            path.display(),
            store.donors.len(),
            store.quarantined.len()
        );
        Ok(store)
    }

    /// Path of the dataset file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header the file is written with
    pub fn header(&self) -> Vec<String> {
        self.header.iter().map(str::to_string).collect()
    }

    /// Number of donors appended but not yet flushed
    pub fn pending(&self) -> usize {
        self.pending
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(DonorlinkError::StoreClosed)
        } else {
            Ok(())
        }
    }

    fn encode(&self, record: &DonorRecord) -> StringRecord {
        self.header.iter().map(|column| schema::column_value(record, column)).collect()
    }

    /// Write header and rows to a sibling temporary file, then move it into place
    fn write_all(&self, rows: &[StringRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&tmp_path)
            .map_err(|e| csv_error(&tmp_path, e))?;
        writer.write_record(&self.header).map_err(|e| csv_error(&tmp_path, e))?;
        for row in rows {
            writer.write_record(row).map_err(|e| csv_error(&tmp_path, e))?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn parse_row(header: &StringRecord, raw: &StringRecord) -> std::result::Result<DonorRecord, String> {
    if raw.len() != header.len() {
        return Err(format!("expected {} fields, found {}", header.len(), raw.len()));
    }
    let row: DonorRow = raw.deserialize(Some(header)).map_err(|e| e.to_string())?;
    row.into_record()
}

impl DonorStore for CsvDonorStore {
    fn donors(&self) -> Result<&DonorCollection> {
        self.ensure_open()?;
        Ok(&self.donors)
    }

    fn append(&mut self, record: DonorRecord) -> Result<usize> {
        self.ensure_open()?;
        let index = self.donors.push(record)?;
        self.pending += 1;
        tracing::info!("Appended donor #{} to {}", index, self.path.display());
        Ok(index)
    }

    fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.pending == 0 && !self.created {
            return Ok(());
        }

        let start = self.donors.len() - self.pending;
        let new_rows: Vec<StringRecord> =
            self.donors.as_slice()[start..].iter().map(|record| self.encode(record)).collect();

        let mut rows = self.stored.clone();
        rows.extend(new_rows);
        self.write_all(&rows)?;

        tracing::info!("Flushed {} rows to {} ({} new)", rows.len(), self.path.display(), self.pending);
        self.stored = rows;
        self.pending = 0;
        self.created = false;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.flush()?;
        self.closed = true;
        Ok(())
    }

    fn quarantined(&self) -> &[QuarantinedRow] {
        &self.quarantined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use donorlink_core::models::{BloodType, Coordinates};
    use tempfile::TempDir;

    const HEADER: &str = "Names,Age,Gender,Blood Type,Medical Conditions,Allergies,Blood Pressure,Height (cm),Weight (kg),Contact Number,Country,State,District,Location,Pincode,Latitude,Longitude,Recency (months),Frequency (times),Monetary (c.c. blood),Time (months)";

    #[test]
    fn test_line_at_counts_newlines_only() {
        let lf = b"h\na\nb\n";
        let crlf = b"h\r\na\r\nb\r\n";
        assert_eq!(line_at(lf, 0), 1);
        assert_eq!(line_at(lf, 4), 3);
        assert_eq!(line_at(crlf, 6), 3);
        assert_eq!(line_at(crlf, 100), 4);
    }

    fn donor(name: &str) -> DonorRecord {
        DonorRecord::new(
            name,
            30,
            "Male",
            BloodType::BNegative,
            "Jayanagar, Bengaluru",
            Coordinates::new(12.925, 77.5938).unwrap(),
        )
    }

    #[test]
    fn test_missing_file_opens_empty_and_is_created_on_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("donors.csv");

        let mut store = CsvDonorStore::open(&path, RowPolicy::Reject).unwrap();
        assert!(store.donors().unwrap().is_empty());
        assert!(!path.exists());

        store.flush().unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim_end(), HEADER);
    }

    #[test]
    fn test_append_writes_only_on_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("donors.csv");
        fs::write(&path, format!("{}\n", HEADER)).unwrap();

        let mut store = CsvDonorStore::open(&path, RowPolicy::Reject).unwrap();
        assert_eq!(store.append(donor("Ravi")).unwrap(), 0);
        assert_eq!(store.pending(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);

        store.flush().unwrap();
        assert_eq!(store.pending(), 0);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().nth(1).unwrap().starts_with("Ravi,30,Male,B-,"));
    }

    #[test]
    fn test_invalid_append_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut store = CsvDonorStore::open(dir.path().join("d.csv"), RowPolicy::Reject).unwrap();
        assert!(matches!(
            store.append(donor("  ")),
            Err(DonorlinkError::InvalidDonorRecord { .. })
        ));
        assert_eq!(store.pending(), 0);
    }

    #[test]
    fn test_closed_store_refuses_calls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("d.csv");
        let mut store = CsvDonorStore::open(&path, RowPolicy::Reject).unwrap();
        store.append(donor("Ravi")).unwrap();
        store.close().unwrap();

        assert!(path.exists());
        assert!(matches!(store.donors(), Err(DonorlinkError::StoreClosed)));
        assert!(matches!(store.append(donor("Meera")), Err(DonorlinkError::StoreClosed)));
        assert!(matches!(store.flush(), Err(DonorlinkError::StoreClosed)));
    }

    #[test]
    fn test_header_missing_required_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("d.csv");
        fs::write(&path, "Names,Age,Gender,Blood Type,Location\nRavi,30,Male,B-,Jayanagar\n").unwrap();

        match CsvDonorStore::open(&path, RowPolicy::Quarantine) {
            Err(DonorlinkError::InvalidSchema { reason, .. }) => {
                assert!(reason.contains("Latitude"));
            }
            other => panic!("Expected InvalidSchema, got {:?}", other),
        }
    }
}
