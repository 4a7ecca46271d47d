// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local key-value backends.

use super::{CookieBackend, LocalBackend, StorageError};
use axum_extra::extract::cookie::Cookie;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Process-memory store. Usable as either backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LocalBackend for MemoryStore {
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

impl CookieBackend for MemoryStore {
    fn write(&self, cookie: Cookie<'static>) -> Result<(), StorageError> {
        self.entries
            .insert(cookie.name().to_string(), cookie.value().to_string());
        Ok(())
    }

    fn read(&self, name: &str) -> Result<Option<String>, StorageError> {
        self.get_item(name)
    }

    fn expire(&self, cookie: Cookie<'static>) -> Result<(), StorageError> {
        self.remove_item(cookie.name())
    }
}

/// JSON-file store that survives process restarts.
///
/// The whole map is rewritten on every mutation; it only ever holds the
/// handful of credential entries.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: DashMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`, loading existing entries. A missing file is
    /// an empty store; an unreadable one is an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let mut loaded = BTreeMap::new();

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            if !content.trim().is_empty() {
                loaded = serde_json::from_str::<BTreeMap<String, String>>(&content)?;
            }
        }

        Ok(Self {
            path,
            entries: loaded.into_iter().collect(),
        })
    }

    fn flush(&self) -> Result<(), StorageError> {
        let snapshot: BTreeMap<String, String> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&snapshot)?)?;
        Ok(())
    }
}

impl LocalBackend for FileStore {
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
