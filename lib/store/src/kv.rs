//! KvRecord trait + KvOps CRUD operations.
//!
//! The model impls `KvRecord` to declare its prefix + hooks.
//! `KvOps<T>` provides the actual get/save/list/delete using a KVStore backend.

use std::sync::Arc;

use comanda_core::ServiceError;
use serde::{de::DeserializeOwned, Serialize};

/// Trait implemented by models to declare KV storage behavior.
///
/// `PREFIX` namespaces the collection (`"{module}:{resource}:"`); `NAME` is
/// the resource name used in error messages. Hooks have default no-op impls.
pub trait KvRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Resource name for error messages, e.g. `"order"`.
    const NAME: &'static str;

    /// KV key prefix: `"{module}:{resource}:"`.
    const PREFIX: &'static str;

    /// Extract the key value from this instance as a string.
    fn key(&self) -> String;

    /// Called before inserting a new record. Use for auto-fill (uuid, timestamps).
    fn before_create(&mut self) {}

    /// Called before updating an existing record.
    fn before_update(&mut self) {}
}

/// CRUD operations for a KvRecord model. Holds a reference to the KV backend.
pub struct KvOps<T: KvRecord> {
    kv: Arc<dyn comanda_kv::KVStore>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: KvRecord> KvOps<T> {
    pub fn new(kv: Arc<dyn comanda_kv::KVStore>) -> Self {
        Self {
            kv,
            _phantom: std::marker::PhantomData,
        }
    }

    fn make_key(id: &str) -> String {
        format!("{}{}", T::PREFIX, id)
    }

    fn kv_err(e: comanda_kv::KVError) -> ServiceError {
        ServiceError::Storage(e.to_string())
    }

    /// Get a record by key value. Returns None if not found.
    pub fn get(&self, id: &str) -> Result<Option<T>, ServiceError> {
        let key = Self::make_key(id);
        match self.kv.get(&key).map_err(Self::kv_err)? {
            Some(bytes) => {
                let record: T = serde_json::from_slice(&bytes)
                    .map_err(|e| ServiceError::Internal(format!("deserialize: {}", e)))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Get a record or return NotFound error.
    pub fn get_or_err(&self, id: &str) -> Result<T, ServiceError> {
        self.get(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("{} '{}' not found", T::NAME, id)))
    }

    /// List all records with this prefix.
    pub fn list(&self) -> Result<Vec<T>, ServiceError> {
        let entries = self
            .kv
            .scan(T::PREFIX)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let mut records = Vec::with_capacity(entries.len());
        for (_key, bytes) in entries {
            let record: T = serde_json::from_slice(&bytes)
                .map_err(|e| ServiceError::Internal(format!("deserialize: {}", e)))?;
            records.push(record);
        }
        Ok(records)
    }

    /// Count all records with this prefix.
    pub fn count(&self) -> Result<usize, ServiceError> {
        let entries = self
            .kv
            .scan(T::PREFIX)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(entries.len())
    }

    /// Create a new record. Calls before_create hook, checks for duplicates.
    pub fn save_new(&self, mut record: T) -> Result<T, ServiceError> {
        record.before_create();

        let id = record.key();
        let key = Self::make_key(&id);

        if self.kv.get(&key).map_err(Self::kv_err)?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "{} '{}' already exists",
                T::NAME,
                id
            )));
        }

        let bytes = serde_json::to_vec(&record)
            .map_err(|e| ServiceError::Internal(format!("serialize: {}", e)))?;
        self.kv.set(&key, &bytes).map_err(Self::kv_err)?;

        Ok(record)
    }

    /// Update an existing record. Calls before_update hook.
    pub fn save(&self, mut record: T) -> Result<T, ServiceError> {
        record.before_update();

        let id = record.key();
        let key = Self::make_key(&id);

        let bytes = serde_json::to_vec(&record)
            .map_err(|e| ServiceError::Internal(format!("serialize: {}", e)))?;
        self.kv.set(&key, &bytes).map_err(Self::kv_err)?;

        Ok(record)
    }

    /// Delete a record by key value. NotFound if absent.
    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.get_or_err(id)?;
        let key = Self::make_key(id);
        self.kv.delete(&key).map_err(Self::kv_err)?;
        Ok(())
    }
}
