//! Supplier table kept in a CSV file.

use csv::StringRecord;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::SupplierStore;
use crate::error::StoreError;
use crate::models::invoice::SupplierProfile;

/// Column names of the supplier table, in profile field order.
pub const COLUMNS: [&str; 10] = [
    "SupplierCompanyID",
    "SupplierName",
    "SupplierCompanyVAT",
    "SupplierAddress",
    "SupplierCity",
    "Bankname",
    "BankCode",
    "IBAN",
    "SupplierContactPerson",
    "Last invoice number",
];

const ID_COLUMN: &str = "SupplierCompanyID";
const COUNTER_COLUMN: &str = "Last invoice number";

/// CSV-backed store. Every read-modify-write of the file runs under one
/// mutex, and writes replace the file atomically.
///
/// Columns other than [`COLUMNS`] are kept as they are.
pub struct CsvSupplierStore {
    path: PathBuf,
    lock: Mutex<()>,
}

struct Table {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Table {
    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    fn required_column(&self, name: &str) -> Result<usize, StoreError> {
        self.column(name)
            .ok_or_else(|| StoreError::MissingColumn(name.to_string()))
    }

    fn find(&self, id: &str) -> Result<usize, StoreError> {
        let id_col = self.required_column(ID_COLUMN)?;
        self.rows
            .iter()
            .position(|row| row.get(id_col).map(str::trim) == Some(id.trim()))
            .ok_or_else(|| StoreError::UnknownSupplier(id.to_string()))
    }

    fn profile(&self, row: usize) -> Result<SupplierProfile, StoreError> {
        let record = &self.rows[row];
        let field = |name: &str| {
            self.column(name)
                .and_then(|i| record.get(i))
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };

        let id = field(ID_COLUMN);
        let last_invoice_number = parse_counter(&id, &field(COUNTER_COLUMN))?;

        Ok(SupplierProfile {
            name: field("SupplierName"),
            vat_id: field("SupplierCompanyVAT"),
            company_id: id.clone(),
            address: field("SupplierAddress"),
            city: field("SupplierCity"),
            bank_name: field("Bankname"),
            bank_code: field("BankCode"),
            iban: field("IBAN"),
            contact_person: field("SupplierContactPerson"),
            last_invoice_number,
            id,
        })
    }

    fn set_counter(&mut self, row: usize, value: u64) -> Result<(), StoreError> {
        let col = self.required_column(COUNTER_COLUMN)?;
        let width = self.headers.len();

        let updated: StringRecord = (0..width.max(self.rows[row].len()))
            .map(|i| {
                if i == col {
                    value.to_string()
                } else {
                    self.rows[row].get(i).unwrap_or("").to_string()
                }
            })
            .collect();

        self.rows[row] = updated;
        Ok(())
    }
}

/// Parse a counter cell. Spreadsheet exports write whole numbers as `12.0`.
fn parse_counter(id: &str, raw: &str) -> Result<u64, StoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }

    let invalid = || StoreError::InvalidCounter {
        id: id.to_string(),
        value: raw.to_string(),
    };

    if let Ok(n) = raw.parse::<u64>() {
        return Ok(n);
    }

    match raw.split_once('.') {
        Some((whole, frac)) if frac.chars().all(|c| c == '0') => whole.parse().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

impl CsvSupplierStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a table with the standard header and the given profiles.
    pub fn create(path: impl Into<PathBuf>, profiles: &[SupplierProfile]) -> Result<Self, StoreError> {
        let store = Self::new(path);
        let table = Table {
            headers: StringRecord::from(COLUMNS.to_vec()),
            rows: profiles.iter().map(profile_record).collect(),
        };
        store.write_table(&table)?;
        info!("Created supplier table {} with {} rows", store.path.display(), profiles.len());
        Ok(store)
    }

    fn read_table(&self) -> Result<Table, StoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let headers = reader.headers()?.clone();
        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;

        debug!("Read {} supplier rows from {}", rows.len(), self.path.display());
        Ok(Table { headers, rows })
    }

    fn write_table(&self, table: &Table) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_writer(temp.as_file_mut());
            writer.write_record(&table.headers)?;
            for row in &table.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }

        temp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

fn profile_record(profile: &SupplierProfile) -> StringRecord {
    StringRecord::from(vec![
        profile.id.clone(),
        profile.name.clone(),
        profile.vat_id.clone(),
        profile.address.clone(),
        profile.city.clone(),
        profile.bank_name.clone(),
        profile.bank_code.clone(),
        profile.iban.clone(),
        profile.contact_person.clone(),
        profile.last_invoice_number.to_string(),
    ])
}

impl SupplierStore for CsvSupplierStore {
    fn get(&self, id: &str) -> Result<SupplierProfile, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let table = self.read_table()?;
        let row = table.find(id)?;
        table.profile(row)
    }

    fn list(&self) -> Result<Vec<SupplierProfile>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let table = self.read_table()?;
        (0..table.rows.len()).map(|row| table.profile(row)).collect()
    }

    fn with_next_invoice_number<T, E, F>(&self, id: &str, f: F) -> Result<T, E>
    where
        F: FnOnce(&SupplierProfile, u64) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;

        let mut table = self.read_table()?;
        let row = table.find(id)?;
        let profile = table.profile(row)?;
        let number = profile.last_invoice_number + 1;

        let output = f(&profile, number)?;

        table.set_counter(row, number)?;
        self.write_table(&table)?;
        info!("Supplier {} invoice counter now {}", id, number);

        Ok(output)
    }
}
