//! Starboard cache: a local message-id → companion-message-id mapping
//! backed by the site API. The site is the source of truth; the cache
//! only exists to keep the hot path off the network and self-heals on
//! miss by querying the site and backfilling.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::model::{MessageId, StarboardEntry};
use crate::site::{SiteError, SiteResult, StarboardStore};

pub struct StarCache<S> {
    store: Arc<S>,
    entries: Mutex<HashMap<MessageId, MessageId>>,
}

impl<S: StarboardStore> StarCache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Bulk-load the mapping from the site. Called once at startup; safe
    /// to call again to refresh.
    #[instrument(skip_all)]
    pub async fn populate(&self) -> SiteResult<usize> {
        let listing = self.store.all_entries().await?;
        let mut entries = self.entries.lock().expect("star cache lock");
        entries.clear();
        for entry in &listing {
            entries.insert(entry.message_id, entry.bot_message_id);
        }
        info!(count = entries.len(), "populated starboard cache");
        Ok(entries.len())
    }

    /// Look up the companion message for a starred message. On a cache
    /// miss the site is consulted and a hit backfilled; `Ok(None)` means
    /// the site confirmed there is no entry.
    pub async fn resolve(&self, message_id: MessageId) -> SiteResult<Option<MessageId>> {
        if let Some(&bot_message_id) = self
            .entries
            .lock()
            .expect("star cache lock")
            .get(&message_id)
        {
            return Ok(Some(bot_message_id));
        }

        debug!(message_id, "starboard cache miss, checking site");
        match self.store.get_entry(message_id).await {
            Ok(entry) => {
                self.entries
                    .lock()
                    .expect("star cache lock")
                    .insert(entry.message_id, entry.bot_message_id);
                Ok(Some(entry.bot_message_id))
            }
            Err(SiteError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Reverse lookup: find the starred message given the companion
    /// message id. Cache-only; used when a deletion command is given the
    /// companion id instead of the original.
    pub fn primary_for_companion(&self, bot_message_id: MessageId) -> Option<MessageId> {
        self.entries
            .lock()
            .expect("star cache lock")
            .iter()
            .find(|(_, &v)| v == bot_message_id)
            .map(|(&k, _)| k)
    }

    /// Store a new entry remotely, then cache it. An entry the site
    /// already has is treated as success.
    pub async fn insert(&self, entry: StarboardEntry) -> SiteResult<()> {
        match self.store.create_entry(&entry).await {
            Ok(()) => {}
            Err(SiteError::AlreadyExists) => {
                debug!(message_id = entry.message_id, "entry already stored")
            }
            Err(err) => return Err(err),
        }
        self.entries
            .lock()
            .expect("star cache lock")
            .insert(entry.message_id, entry.bot_message_id);
        Ok(())
    }

    /// Delete an entry remotely and locally. A site `NotFound` still
    /// clears the local mapping so the cache cannot outlive the record.
    pub async fn remove(&self, message_id: MessageId) -> SiteResult<()> {
        let result = self.store.delete_entry(message_id).await;
        self.entries
            .lock()
            .expect("star cache lock")
            .remove(&message_id);
        match result {
            Ok(()) | Err(SiteError::NotFound) => Ok(()),
            Err(err) => {
                warn!(?err, message_id, "failed to delete starboard entry");
                Err(err)
            }
        }
    }

    /// Wipe the site's starboard table and the local cache.
    pub async fn clear_all(&self) -> SiteResult<()> {
        self.store.delete_all().await?;
        self.entries.lock().expect("star cache lock").clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("star cache lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
