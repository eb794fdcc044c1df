//! Test doubles for cache consumers

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::expiry::{Entry, Expiry};
use super::traits::StorageEngine;
use crate::error::{Result, StoreError};

/// A value whose `Poisoned` variant refuses to serialize
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) enum Flaky {
    Good(f64),
    Poisoned,
}

impl Serialize for Flaky {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Flaky::Good(value) => serializer.serialize_newtype_variant("Flaky", 0, "Good", value),
            Flaky::Poisoned => Err(S::Error::custom("poisoned value")),
        }
    }
}

/// In-memory engine that records every call it receives
pub(crate) struct RecordingEngine<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    reads: Mutex<Vec<String>>,
    writes: Mutex<Vec<(String, V, Option<Expiry>)>>,
    failing: AtomicBool,
}

impl<V: Clone> RecordingEngine<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            reads: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail with a storage error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Seed an entry without recording a write
    pub fn seed(&self, key: &str, entry: Entry<V>) {
        self.entries.lock().unwrap().insert(key.to_string(), entry);
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<(String, V, Option<Expiry>)> {
        self.writes.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::StorageError("injected failure".to_string()));
        }
        Ok(())
    }
}

impl<V: Clone + Send> StorageEngine<String, V> for RecordingEngine<V> {
    fn entry(&self, key: &String) -> Result<Entry<V>> {
        self.reads.lock().unwrap().push(key.clone());
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn set(&self, value: V, key: &String, expiry: Option<Expiry>) -> Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push((key.clone(), value.clone(), expiry));
        self.check()?;
        let expires_at = expiry.unwrap_or_default().deadline();
        self.entries
            .lock()
            .unwrap()
            .insert(key.clone(), Entry::new(value, expires_at));
        Ok(())
    }

    fn remove_expired(&self) -> Result<()> {
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .retain(|_, entry| !entry.is_expired());
        Ok(())
    }

    fn remove_all(&self) -> Result<()> {
        self.check()?;
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}
