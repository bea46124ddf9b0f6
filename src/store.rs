// File: ./src/store.rs
//! The event journal store: single source of truth for event records.
//!
//! With a remote session attached, reads and mutations go to the backend
//! first. A failed remote call is logged and the same operation runs
//! against local storage instead, so callers never see a remote failure.
//! Without a session every operation is local. Storage failures are the
//! only errors that reach the caller.
use crate::client::RemoteClient;
use crate::config::Config;
use crate::context::SharedContext;
use crate::error::Result;
use crate::model::{Event, EventFilter, EventPage, EventPatch, EventStatus, paginate};
use crate::seed;
use crate::storage::LocalStorage;
use chrono::Utc;

#[derive(Debug)]
pub struct EventStore {
    storage: LocalStorage,
    remote: Option<RemoteClient>,
}

/// Resolves the remote leg of an operation: `Some` on success, `None` when
/// the caller should fall back to local storage.
fn settle<T>(op: &str, outcome: Result<T>) -> Result<Option<T>> {
    match outcome {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_remote() => {
            log::warn!("{}: {}; falling back to local storage", op, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

impl EventStore {
    pub fn new(storage: LocalStorage, remote: Option<RemoteClient>) -> Self {
        Self { storage, remote }
    }

    /// Local-only store over the context's event slot.
    pub fn local(ctx: SharedContext) -> Self {
        Self::new(LocalStorage::new(ctx), None)
    }

    /// Builds the store described by `config`, seeding the demo journal
    /// on first run when enabled.
    pub fn open(ctx: SharedContext, config: &Config) -> Result<Self> {
        let remote = RemoteClient::from_config(config)?;
        let storage = LocalStorage::new(ctx);
        if config.seed_demo_events {
            storage.seed_if_missing(seed::demo_events())?;
        }
        if let Some(client) = &remote {
            log::info!(
                "Using backend {} for session {}",
                client.base_url(),
                client.session_id()
            );
        }
        Ok(Self::new(storage, remote))
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    // --- READ OPERATIONS ---

    /// Matching events in collection order, sliced to the requested 1-based page.
    pub async fn list(
        &self,
        filter: &EventFilter,
        page: usize,
        page_size: usize,
    ) -> Result<EventPage> {
        if let Some(client) = &self.remote
            && let Some(result) = settle(
                "list events",
                client
                    .fetch_events()
                    .await
                    .map(|events| paginate(&events, filter, page, page_size)),
            )?
        {
            return Ok(result);
        }

        let events = self.storage.load()?;
        Ok(paginate(&events, filter, page, page_size))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Event>> {
        if let Some(client) = &self.remote
            && let Some(found) = settle(
                "get event",
                client
                    .fetch_events()
                    .await
                    .map(|events| events.into_iter().find(|e| e.id == id)),
            )?
        {
            return Ok(found);
        }

        Ok(self.storage.load()?.into_iter().find(|e| e.id == id))
    }

    // --- MUTATIONS ---

    /// Sets `status` and refreshes `updateTime`. Unknown ids are a no-op.
    pub async fn update_status(&self, id: &str, status: EventStatus) -> Result<()> {
        let patch = EventPatch::status(status);
        if let Some(client) = &self.remote
            && settle("update event status", client.update_event(id, &patch).await)?.is_some()
        {
            return Ok(());
        }
        self.apply_local(id, &patch)?;
        Ok(())
    }

    /// Merges the present fields of `patch` and refreshes `updateTime`.
    /// Unknown ids are a no-op.
    pub async fn update(&self, id: &str, patch: EventPatch) -> Result<()> {
        if let Some(client) = &self.remote
            && settle("update event", client.update_event(id, &patch).await)?.is_some()
        {
            return Ok(());
        }
        self.apply_local(id, &patch)?;
        Ok(())
    }

    /// Removes the record. Unknown ids are a no-op.
    pub async fn delete(&self, id: &str) -> Result<()> {
        if let Some(client) = &self.remote
            && settle("delete event", client.delete_event(id).await)?.is_some()
        {
            return Ok(());
        }

        let removed = self.storage.modify(|events| {
            let before = events.len();
            events.retain(|e| e.id != id);
            let removed = events.len() != before;
            (removed, removed)
        })?;
        if !removed {
            log::debug!("delete: no local event with id {}", id);
        }
        Ok(())
    }

    /// Synthesizes a pending record from raw conversation text, prepends it
    /// to the local collection and persists it.
    pub fn extract_from_dialog(&self, dialog_text: &str) -> Result<Event> {
        let event = self.storage.modify(|events| {
            let mut event = Event::from_dialog(dialog_text, Utc::now());
            while events.iter().any(|e| e.id == event.id) {
                event.id = uuid::Uuid::new_v4().to_string();
            }
            events.insert(0, event.clone());
            (event, true)
        })?;
        log::info!("Extracted event {} from dialog", event.id);
        Ok(event)
    }

    /// Returns whether a record was found and changed.
    fn apply_local(&self, id: &str, patch: &EventPatch) -> Result<bool> {
        let now = Utc::now();
        let applied = self.storage.modify(|events| {
            match events.iter_mut().find(|e| e.id == id) {
                Some(event) => {
                    event.apply(patch, now);
                    (true, true)
                }
                None => (false, false),
            }
        })?;
        if !applied {
            log::debug!("update: no local event with id {}", id);
        }
        Ok(applied)
    }
}
