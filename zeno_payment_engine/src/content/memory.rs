use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use chrono::Utc;
use log::*;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{ContentItem, ContentStore, ContentStoreError};

/// An in-memory [`ContentStore`]. Clones share the same collection.
#[derive(Clone)]
pub struct MemoryContentStore<T> {
    items: Arc<RwLock<Vec<T>>>,
    next_id: Arc<AtomicU64>,
}

impl<T> Default for MemoryContentStore<T> {
    fn default() -> Self {
        Self { items: Arc::new(RwLock::new(Vec::new())), next_id: Arc::new(AtomicU64::new(1)) }
    }
}

impl<T> Debug for MemoryContentStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemoryContentStore")
    }
}

impl<T: ContentItem> MemoryContentStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated from drafts, e.g. the site's default content.
    pub async fn with_items<I: IntoIterator<Item = T::Draft>>(drafts: I) -> Self {
        let store = Self::new();
        for draft in drafts {
            store.add(draft).await;
        }
        store
    }
}

impl<T: ContentItem> ContentStore<T> for MemoryContentStore<T> {
    async fn get_all(&self) -> Vec<T> {
        self.items.read().await.clone()
    }

    async fn get(&self, id: u64) -> Option<T> {
        self.items.read().await.iter().find(|item| item.id() == id).cloned()
    }

    async fn add(&self, draft: T::Draft) -> T {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let item = T::from_draft(id, draft, Utc::now());
        self.items.write().await.push(item.clone());
        trace!("🗃️ Added {} #{id}", T::KIND);
        item
    }

    async fn update(&self, id: u64, patch: Value) -> Result<Option<T>, ContentStoreError> {
        let mut items = self.items.write().await;
        let Some(item) = items.iter_mut().find(|item| item.id() == id) else {
            debug!("🗃️ Cannot update {} #{id}. It does not exist", T::KIND);
            return Ok(None);
        };
        *item = item.patched(&patch)?;
        trace!("🗃️ Updated {} #{id}", T::KIND);
        Ok(Some(item.clone()))
    }

    async fn delete(&self, id: u64) -> bool {
        let mut items = self.items.write().await;
        let len = items.len();
        items.retain(|item| item.id() != id);
        let deleted = items.len() < len;
        if deleted {
            trace!("🗃️ Deleted {} #{id}", T::KIND);
        }
        deleted
    }
}
