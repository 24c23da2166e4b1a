use crate::error::KVError;

/// KVStore provides the key-value storage interface every collection sits on.
///
/// Keys follow a namespaced convention: `orders:order:{id}`,
/// `catalog:dish:{id}`, etc. Backends: [`crate::MemStore`] for development
/// and tests, [`crate::RedbStore`] for an embedded persistent database.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting an absent key is a no-op.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns (key, value) pairs sorted by key.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;
}
