// File: ./src/storage.rs
// Manages the local persisted slot holding the event collection.
//
// ⚠️ VERSION BUMP REQUIRED:
// Changes to the Event struct or its nested enums require incrementing
// EVENT_STORAGE_VERSION below and adding a migration step.
use crate::context::SharedContext;
use crate::model::Event;
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// Version history:
// - v0: Bare JSON array of events (mini-program storage slot export)
// - v1: Versioned wrapper object
const EVENT_STORAGE_VERSION: u32 = 1;

/// Wrapper struct for versioned local storage
#[derive(Serialize, Deserialize)]
struct EventStorageData {
    #[serde(default)]
    version: u32,
    events: Vec<Event>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    /// Never attempted to load
    Uninitialized,
    /// Last load succeeded
    Success,
    /// Last load failed (deserialization error, corruption, etc.)
    Failed,
}

/// The single local slot. Every read is a full read and every write
/// rewrites the whole collection atomically.
#[derive(Debug)]
pub struct LocalStorage {
    ctx: SharedContext,
    /// Blocks saves after a failed load so unreadable data is never overwritten.
    load_state: Mutex<LoadState>,
}

impl LocalStorage {
    pub fn new(ctx: SharedContext) -> Self {
        Self {
            ctx,
            load_state: Mutex::new(LoadState::Uninitialized),
        }
    }

    pub fn path(&self) -> Result<PathBuf> {
        self.ctx.get_events_path()
    }

    fn load_state(&self) -> LoadState {
        self.load_state
            .lock()
            .map(|s| *s)
            .unwrap_or(LoadState::Failed)
    }

    fn set_load_state(&self, state: LoadState) {
        if let Ok(mut s) = self.load_state.lock() {
            *s = state;
        }
    }

    /// Helper to get a sidecar lock file path (e.g., "events.json.lock")
    fn get_lock_path(file_path: &Path) -> PathBuf {
        let mut lock_path = file_path.to_path_buf();
        if let Some(ext) = lock_path.extension() {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".lock");
            lock_path.set_extension(new_ext);
        } else {
            lock_path.set_extension("lock");
        }
        lock_path
    }

    /// Execute a closure while holding an exclusive lock on the sidecar file.
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let lock_path = Self::get_lock_path(file_path);
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file {:?}", lock_path))?;

        file.lock_exclusive()?;
        let result = f();
        file.unlock()?;
        result
    }

    /// Atomic write: Write to .tmp file then rename
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)
            .with_context(|| format!("Failed to write {:?}", tmp_path))?;
        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to replace {:?}", path))?;
        Ok(())
    }

    fn write_unlocked(path: &Path, events: &[Event]) -> Result<()> {
        let data = EventStorageData {
            version: EVENT_STORAGE_VERSION,
            events: events.to_vec(),
        };
        let json = serde_json::to_string_pretty(&data)?;
        Self::atomic_write(path, json)
    }

    /// Reads and decodes the slot. The caller must hold the lock.
    fn read_unlocked(path: &Path) -> Result<Vec<Event>> {
        if !path.exists() {
            return Ok(vec![]);
        }
        let json =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        if json.trim().is_empty() {
            return Ok(vec![]);
        }

        let value: serde_json::Value = serde_json::from_str(&json)
            .with_context(|| format!("Event store {:?} is not valid JSON", path))?;

        let (events, needs_upgrade) = match value {
            serde_json::Value::Array(_) => {
                log::info!(
                    "Migrating {:?} from v0 to v{}",
                    path,
                    EVENT_STORAGE_VERSION
                );
                let events: Vec<Event> = serde_json::from_value(value)
                    .with_context(|| format!("Failed to migrate {:?} from v0", path))?;
                (events, true)
            }
            _ => {
                let data: EventStorageData = serde_json::from_value(value)
                    .with_context(|| format!("Event store {:?} is corrupt", path))?;
                if data.version > EVENT_STORAGE_VERSION {
                    return Err(anyhow::anyhow!(
                        "Event store version {} is newer than supported version {}. Please upgrade moodjournal.",
                        data.version,
                        EVENT_STORAGE_VERSION
                    ));
                }
                let needs_upgrade = data.version < EVENT_STORAGE_VERSION;
                (data.events, needs_upgrade)
            }
        };

        if needs_upgrade {
            Self::write_unlocked(path, &events)?;
        }
        Ok(events)
    }

    fn record_load<T>(&self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.set_load_state(LoadState::Success),
            Err(e) => {
                log::error!("Failed to load local events: {:#}", e);
                self.set_load_state(LoadState::Failed);
            }
        }
        result
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.load_state() == LoadState::Failed {
            return Err(anyhow::anyhow!(
                "Cannot save events: previous load failed. This prevents overwriting data that couldn't be read."
            ));
        }
        Ok(())
    }

    /// Load the full collection. A missing slot is an empty collection.
    pub fn load(&self) -> Result<Vec<Event>> {
        let path = self.path()?;
        let result = Self::with_lock(&path, || Self::read_unlocked(&path));
        self.record_load(result)
    }

    /// Replace the full collection.
    ///
    /// # Data Loss Prevention
    /// Refuses to write if the last load failed. Use `force_save()` after
    /// manual recovery.
    pub fn save(&self, events: &[Event]) -> Result<()> {
        self.ensure_writable()?;
        let path = self.path()?;
        Self::with_lock(&path, || Self::write_unlocked(&path, events))
    }

    /// Replace the full collection, bypassing the load state check.
    pub fn force_save(&self, events: &[Event]) -> Result<()> {
        let path = self.path()?;
        Self::with_lock(&path, || Self::write_unlocked(&path, events))?;
        self.set_load_state(LoadState::Success);
        Ok(())
    }

    /// Read-modify-write under a single lock. The closure reports whether it
    /// changed anything; unchanged collections are not rewritten.
    pub fn modify<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Event>) -> (T, bool),
    {
        self.ensure_writable()?;
        let path = self.path()?;
        let result = Self::with_lock(&path, || {
            let mut events = self.record_load(Self::read_unlocked(&path))?;
            let (out, changed) = f(&mut events);
            if changed {
                Self::write_unlocked(&path, &events)?;
            }
            Ok(out)
        });
        if let Err(e) = &result {
            log::error!("Local event update failed: {:#}", e);
        }
        result
    }

    /// Installs `events` on first run, when no slot file exists yet. An
    /// existing slot is left alone even when it is empty, so a journal the
    /// user emptied stays empty.
    pub fn seed_if_missing(&self, events: Vec<Event>) -> Result<bool> {
        self.ensure_writable()?;
        let path = self.path()?;
        Self::with_lock(&path, || {
            if path.exists() || events.is_empty() {
                return Ok(false);
            }
            log::info!("Seeding local journal with {} demo events", events.len());
            Self::write_unlocked(&path, &events)?;
            Ok(true)
        })
    }
}
