//! Key/value persistence for the device identifier
//!
//! `get_or_insert_with` is the only path that may create a value. It holds
//! the store lock across read, initialization and write, so concurrent first
//! callers in one process observe a single value. `FileStore` replaces its
//! document through an atomic rename, so readers in other processes see
//! either the old or the new document, never a partial one.

use crate::error::{IdentityError, StoreError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Namespace/key pair of a stored value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey {
    pub namespace: String,
    pub key: String,
}

impl StoreKey {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
        }
    }
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &StoreKey) -> Result<Option<String>, StoreError>;

    fn put(&self, key: &StoreKey, value: &str) -> Result<(), StoreError>;

    /// Return the stored value, or run `init`, store its result and return it.
    fn get_or_insert_with(
        &self,
        key: &StoreKey,
        init: &mut dyn FnMut() -> Result<String, IdentityError>,
    ) -> Result<String, IdentityError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<StoreKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn put(&self, key: &StoreKey, value: &str) -> Result<(), StoreError> {
        self.values.lock().insert(key.clone(), value.to_string());
        Ok(())
    }

    fn get_or_insert_with(
        &self,
        key: &StoreKey,
        init: &mut dyn FnMut() -> Result<String, IdentityError>,
    ) -> Result<String, IdentityError> {
        let mut values = self.values.lock();
        if let Some(existing) = values.get(key) {
            return Ok(existing.clone());
        }
        let value = init()?;
        values.insert(key.clone(), value.clone());
        Ok(value)
    }
}

type Document = BTreeMap<String, BTreeMap<String, String>>;

/// JSON document `{namespace: {key: value}}` on disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Document, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Document::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        // Same directory as the target so the rename stays on one filesystem
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(document)?)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        debug!("Store written to {:?}", self.path);
        Ok(())
    }

    fn lookup(document: &Document, key: &StoreKey) -> Option<String> {
        document.get(&key.namespace)?.get(&key.key).cloned()
    }

    fn insert(document: &mut Document, key: &StoreKey, value: &str) {
        document
            .entry(key.namespace.clone())
            .or_default()
            .insert(key.key.clone(), value.to_string());
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &StoreKey) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock();
        Ok(Self::lookup(&self.read_document()?, key))
    }

    fn put(&self, key: &StoreKey, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut document = self.read_document()?;
        Self::insert(&mut document, key, value);
        self.write_document(&document)
    }

    fn get_or_insert_with(
        &self,
        key: &StoreKey,
        init: &mut dyn FnMut() -> Result<String, IdentityError>,
    ) -> Result<String, IdentityError> {
        let _guard = self.lock.lock();
        let mut document = self.read_document()?;
        if let Some(existing) = Self::lookup(&document, key) {
            return Ok(existing);
        }
        let value = init()?;
        Self::insert(&mut document, key, &value);
        self.write_document(&document)?;
        Ok(value)
    }
}
