//! Supplier profiles and their invoice counters.

mod csv_store;

pub use csv_store::{CsvSupplierStore, COLUMNS};

use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

use crate::error::StoreError;
use crate::models::invoice::SupplierProfile;

/// Source of supplier profiles with a serialized invoice counter.
pub trait SupplierStore: Send + Sync {
    /// Profile of supplier `id`.
    fn get(&self, id: &str) -> Result<SupplierProfile, StoreError>;

    /// All profiles, in table order.
    fn list(&self) -> Result<Vec<SupplierProfile>, StoreError>;

    /// Run `f` with the supplier's next invoice number while holding the
    /// supplier's counter lock.
    ///
    /// The counter is advanced to that number only when `f` succeeds, so
    /// concurrent callers never see the same number and a failed generation
    /// does not consume one.
    fn with_next_invoice_number<T, E, F>(&self, id: &str, f: F) -> Result<T, E>
    where
        F: FnOnce(&SupplierProfile, u64) -> Result<T, E>,
        E: From<StoreError>;
}

/// In-memory store with one lock per supplier.
#[derive(Default)]
pub struct MemorySupplierStore {
    profiles: RwLock<Vec<(String, Arc<Mutex<SupplierProfile>>)>>,
}

impl MemorySupplierStore {
    pub fn new(profiles: impl IntoIterator<Item = SupplierProfile>) -> Self {
        let store = Self::default();
        for profile in profiles {
            store.insert(profile);
        }
        store
    }

    /// Add or replace a profile.
    pub fn insert(&self, profile: SupplierProfile) {
        let id = profile.id.trim().to_string();
        let Ok(mut profiles) = self.profiles.write() else {
            return;
        };

        let entry = Arc::new(Mutex::new(profile));
        match profiles.iter_mut().find(|(key, _)| *key == id) {
            Some(existing) => existing.1 = entry,
            None => profiles.push((id, entry)),
        }
    }

    fn entry(&self, id: &str) -> Result<Arc<Mutex<SupplierProfile>>, StoreError> {
        let profiles = self.profiles.read().map_err(|_| StoreError::Poisoned)?;

        profiles
            .iter()
            .find(|(key, _)| key == id.trim())
            .map(|(_, entry)| Arc::clone(entry))
            .ok_or_else(|| StoreError::UnknownSupplier(id.to_string()))
    }
}

impl SupplierStore for MemorySupplierStore {
    fn get(&self, id: &str) -> Result<SupplierProfile, StoreError> {
        let entry = self.entry(id)?;
        let profile = entry.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(profile.clone())
    }

    fn list(&self) -> Result<Vec<SupplierProfile>, StoreError> {
        let profiles = self.profiles.read().map_err(|_| StoreError::Poisoned)?;
        profiles
            .iter()
            .map(|(_, entry)| {
                entry
                    .lock()
                    .map(|p| p.clone())
                    .map_err(|_| StoreError::Poisoned)
            })
            .collect()
    }

    fn with_next_invoice_number<T, E, F>(&self, id: &str, f: F) -> Result<T, E>
    where
        F: FnOnce(&SupplierProfile, u64) -> Result<T, E>,
        E: From<StoreError>,
    {
        let entry = self.entry(id)?;
        let mut profile = entry.lock().map_err(|_| StoreError::Poisoned)?;

        let number = profile.last_invoice_number + 1;
        let output = f(&profile, number)?;

        profile.last_invoice_number = number;
        debug!("Supplier {} counter advanced to {}", id, number);
        Ok(output)
    }
}
