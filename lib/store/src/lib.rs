//! Store layer: how models are persisted.
//!
//! A model implements [`KvRecord`] to declare its key prefix and hooks;
//! [`KvOps`] provides the CRUD operations on top of any
//! [`comanda_kv::KVStore`] backend. Modules never touch the KV layer
//! directly — swapping the in-memory backend for the persistent one never
//! changes module code.

pub mod kv;

pub use kv::{KvOps, KvRecord};
