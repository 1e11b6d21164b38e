//! Site content store
//!
//! The marketing site's admin screens manage a handful of simple content collections (hero slides, blog posts, team
//! members and so on). Each collection is a [`ContentStore`] of one [`ContentItem`] type. Items are added from a
//! draft, which has everything except the fields the store stamps itself (the id, and derived fields like a blog
//! post's slug). Updates are partial JSON patches.
//!
//! `update` and `delete` report unknown ids with `Ok(None)` and `false` respectively, rather than an error. Callers
//! must check these.
mod memory;
mod types;

use chrono::{DateTime, Utc};
pub use memory::MemoryContentStore;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
pub use types::*;

#[derive(Debug, Clone, Error)]
pub enum ContentStoreError {
    #[error("Invalid content patch. {0}")]
    InvalidPatch(String),
}

pub trait ContentItem: Clone + Serialize + DeserializeOwned {
    /// The caller-supplied part of a new item.
    type Draft;

    /// The collection name, used in log messages.
    const KIND: &'static str;

    fn id(&self) -> u64;

    /// Builds the stored item from a draft, stamping the id and any derived fields.
    fn from_draft(id: u64, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Fields a patch may not overwrite.
    fn protected_fields() -> &'static [&'static str] {
        &["id"]
    }

    /// Called after `patch` has been merged into the item, so that derived fields can be refreshed.
    fn after_update(&mut self, _patch: &Map<String, Value>) {}

    /// Returns a copy of this item with `patch` merged in. Unknown fields in the patch are ignored.
    fn patched(&self, patch: &Value) -> Result<Self, ContentStoreError> {
        let patch = patch
            .as_object()
            .ok_or_else(|| ContentStoreError::InvalidPatch(format!("Expected a JSON object, got {patch}")))?;
        let mut value = serde_json::to_value(self).map_err(|e| ContentStoreError::InvalidPatch(e.to_string()))?;
        if let Some(fields) = value.as_object_mut() {
            for (k, v) in patch {
                if fields.contains_key(k) && !Self::protected_fields().contains(&k.as_str()) {
                    fields.insert(k.clone(), v.clone());
                }
            }
        }
        let mut item: Self = serde_json::from_value(value).map_err(|e| ContentStoreError::InvalidPatch(e.to_string()))?;
        item.after_update(patch);
        Ok(item)
    }
}

/// A keyed collection of site content.
#[allow(async_fn_in_trait)]
pub trait ContentStore<T: ContentItem> {
    /// All items, in the order they were added.
    async fn get_all(&self) -> Vec<T>;

    async fn get(&self, id: u64) -> Option<T>;

    /// Stores a new item and returns it, with its freshly stamped id.
    async fn add(&self, draft: T::Draft) -> T;

    /// Merges `patch` into the item with the given id. Returns `Ok(None)` if there is no such item.
    async fn update(&self, id: u64, patch: Value) -> Result<Option<T>, ContentStoreError>;

    /// Removes the item with the given id. Returns false if there was no such item.
    async fn delete(&self, id: u64) -> bool;
}
