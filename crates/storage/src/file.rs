// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-file state store.
//!
//! The whole document is rewritten on every save: written to a temp file,
//! synced, then renamed over the previous document. A document that fails
//! to parse is moved aside to a `.bak` file and the store starts empty.

use crate::{StateKey, StateStore, StoreError, StoreWrites};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Current document schema version
pub const CURRENT_STORE_VERSION: u32 = 1;

const MAX_BAK_FILES: u32 = 3;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(rename = "v")]
    version: u32,
    entries: BTreeMap<String, Value>,
}

pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles across threads
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Document, StoreError> {
        if !self.path.exists() {
            return Ok(Document { version: CURRENT_STORE_VERSION, ..Document::default() });
        }

        let file = File::open(&self.path)?;
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                let bak_path = rotate_bak_path(&self.path);
                warn!(
                    error = %e,
                    path = %self.path.display(),
                    bak = %bak_path.display(),
                    "Corrupt state file, moving to .bak and starting fresh",
                );
                fs::rename(&self.path, &bak_path)?;
                Ok(Document { version: CURRENT_STORE_VERSION, ..Document::default() })
            }
        }
    }

    fn write(&self, doc: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("tmp");

        // Write to temp file and sync
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, doc)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }

        // Atomic rename
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl StateStore for FileStore {
    fn save(&self, writes: &StoreWrites) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut doc = self.load()?;
        for (key, value) in writes {
            match value {
                Some(value) => {
                    doc.entries.insert(key.to_string(), value.clone());
                }
                None => {
                    doc.entries.remove(&key.to_string());
                }
            }
        }
        doc.version = CURRENT_STORE_VERSION;
        self.write(&doc)
    }

    fn restore(&self, keys: &[StateKey]) -> Result<HashMap<StateKey, Value>, StoreError> {
        let _guard = self.lock.lock();
        let doc = self.load()?;
        Ok(keys
            .iter()
            .filter_map(|key| doc.entries.get(&key.to_string()).map(|v| (key.clone(), v.clone())))
            .collect())
    }
}

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
/// The oldest backup is removed when the limit is reached.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    // Remove the oldest if at capacity
    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    // Shift existing backups up by one
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
