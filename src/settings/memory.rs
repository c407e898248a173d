//! In-memory setting store for tests and development
//!
//! Records every read and write, and can simulate an unreachable backend.
//! Clones share the same cell, so a test can act as the "outside actor"
//! flipping the value while the engine holds its own handle.

use std::sync::{Arc, Mutex};

use super::SettingStore;
use crate::common::prelude::*;

#[derive(Debug, Default)]
struct Inner {
    value: bool,
    writes: Vec<bool>,
    reads: usize,
    offline: bool,
}

/// Shared-cell boolean store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new(initial: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value: initial,
                ..Inner::default()
            })),
        }
    }

    /// Flip the value without recording a write, as an outside actor would
    pub fn set_value(&self, value: bool) {
        self.inner.lock().unwrap().value = value;
    }

    /// Current stored value
    pub fn value(&self) -> bool {
        self.inner.lock().unwrap().value
    }

    /// Every value written through the trait, in order
    pub fn writes(&self) -> Vec<bool> {
        self.inner.lock().unwrap().writes.clone()
    }

    /// Number of reads served
    pub fn reads(&self) -> usize {
        self.inner.lock().unwrap().reads
    }

    /// Simulate the backend going away (or coming back)
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().unwrap().offline = offline;
    }
}

impl SettingStore for MemoryStore {
    async fn read_enabled(&self) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        if inner.offline {
            return Err(Error::backend("memory store offline"));
        }
        inner.reads += 1;
        Ok(inner.value)
    }

    async fn write_enabled(&self, value: bool) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.offline {
            return Err(Error::backend("memory store offline"));
        }
        inner.value = value;
        inner.writes.push(value);
        Ok(())
    }
}
