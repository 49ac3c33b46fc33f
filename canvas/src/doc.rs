//! Document model: image records, their crop areas, and the in-memory store.
//!
//! This module defines what the editor is working on (`ImageRecord`), the
//! store that owns all records and tracks the current one (`ImageStore`), and
//! the URL-keyed load cache the renderer and magnifier share (`ImageCache`).
//!
//! The crop quad belongs to its record. View state does not; it lives on the
//! engine and is reset whenever the current record changes.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Quad, Size};

/// Unique identifier for an image record.
pub type ImageId = Uuid;

/// Processing lifecycle of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    /// Added, not yet loaded into the editor.
    #[default]
    Pending,
    /// Submitted to the backend; awaiting the crop result.
    Processing,
    /// Loaded and editable, or cropped successfully.
    Completed,
    /// Failed to load, or the backend rejected the crop.
    Error,
}

/// One image the user is working on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    /// Name the backend knows the file by.
    pub name: String,
    /// Where the host fetches the pixels from; also the cache key.
    pub url: String,
    /// Native pixel size, once known.
    pub size: Option<Size>,
    /// Crop quad in canvas space.
    pub crop_area: Option<Quad>,
    pub status: ImageStatus,
    /// Backend name of the processed output after a successful crop.
    pub processed_name: Option<String>,
}

impl ImageRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            url: url.into(),
            size: None,
            crop_area: None,
            status: ImageStatus::Pending,
            processed_name: None,
        }
    }
}

/// In-memory store of image records with a current selection.
#[derive(Debug, Default)]
pub struct ImageStore {
    images: Vec<ImageRecord>,
    current: Option<ImageId>,
}

impl ImageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and make it current. A record with the same `id` is replaced in place.
    pub fn insert(&mut self, record: ImageRecord) {
        let id = record.id;
        match self.images.iter_mut().find(|r| r.id == id) {
            Some(existing) => *existing = record,
            None => self.images.push(record),
        }
        self.current = Some(id);
    }

    /// Remove a record, clearing the current selection if it was current.
    pub fn remove(&mut self, id: &ImageId) -> Option<ImageRecord> {
        let idx = self.images.iter().position(|r| r.id == *id)?;
        if self.current.as_ref() == Some(id) {
            self.current = None;
        }
        Some(self.images.remove(idx))
    }

    #[must_use]
    pub fn get(&self, id: &ImageId) -> Option<&ImageRecord> {
        self.images.iter().find(|r| r.id == *id)
    }

    pub fn get_mut(&mut self, id: &ImageId) -> Option<&mut ImageRecord> {
        self.images.iter_mut().find(|r| r.id == *id)
    }

    /// Make `id` current. Returns false if no such record exists.
    pub fn select(&mut self, id: &ImageId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.current = Some(*id);
        true
    }

    #[must_use]
    pub fn current_id(&self) -> Option<ImageId> {
        self.current
    }

    #[must_use]
    pub fn current(&self) -> Option<&ImageRecord> {
        let id = self.current?;
        self.get(&id)
    }

    pub fn current_mut(&mut self) -> Option<&mut ImageRecord> {
        let id = self.current?;
        self.get_mut(&id)
    }

    /// Whether any record still points at `url`.
    #[must_use]
    pub fn has_url(&self, url: &str) -> bool {
        self.images.iter().any(|r| r.url == url)
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.images.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Load state of one image URL.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// The host is fetching/decoding; started at this timestamp.
    Loading { started_ms: f64 },
    /// Decoded; native pixel size.
    Ready(Size),
    /// Fetch/decode failed or timed out.
    Failed(String),
}

/// Decoded-image cache keyed by URL.
///
/// Entries only describe the current URL's image. Switching to a different URL
/// invalidates everything, so a late completion for the old URL is recognized
/// as stale and dropped.
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: HashMap<String, LoadState>,
    current: Option<String>,
}

impl ImageCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the cache at `url`. Returns `true` when the host must start a load.
    pub fn track(&mut self, url: &str, now_ms: f64) -> bool {
        if self.current.as_deref() != Some(url) {
            self.entries.clear();
            self.current = Some(url.to_owned());
        }
        if self.entries.contains_key(url) {
            return false;
        }
        self.entries.insert(url.to_owned(), LoadState::Loading { started_ms: now_ms });
        true
    }

    /// Record a successful decode. Returns `false` when the completion is stale:
    /// the URL is no longer current, or its load already resolved or timed out.
    /// An empty image is stored as a failure.
    pub fn resolve_loaded(&mut self, url: &str, size: Size) -> bool {
        if !self.is_pending(url) {
            return false;
        }
        let state = if size.is_empty() {
            LoadState::Failed("image decoded with zero dimensions".to_owned())
        } else {
            LoadState::Ready(size)
        };
        self.entries.insert(url.to_owned(), state);
        true
    }

    /// Record a failed load. Stale completions are ignored.
    pub fn resolve_failed(&mut self, url: &str, reason: impl Into<String>) -> bool {
        if !self.is_pending(url) {
            return false;
        }
        self.entries.insert(url.to_owned(), LoadState::Failed(reason.into()));
        true
    }

    /// Fail the current load if it has been running for `timeout_ms` or longer.
    /// Returns the URL that timed out.
    pub fn expire(&mut self, now_ms: f64, timeout_ms: f64) -> Option<String> {
        let url = self.current.clone()?;
        let Some(LoadState::Loading { started_ms }) = self.entries.get(&url) else {
            return None;
        };
        if now_ms - started_ms < timeout_ms {
            return None;
        }
        self.entries.insert(url.clone(), LoadState::Failed("image load timed out".to_owned()));
        Some(url)
    }

    #[must_use]
    pub fn get(&self, url: &str) -> Option<&LoadState> {
        self.entries.get(url)
    }

    /// Load state of the current URL.
    #[must_use]
    pub fn current_state(&self) -> Option<&LoadState> {
        self.current.as_deref().and_then(|url| self.entries.get(url))
    }

    #[must_use]
    pub fn is_current(&self, url: &str) -> bool {
        self.current.as_deref() == Some(url)
    }

    fn is_pending(&self, url: &str) -> bool {
        self.is_current(url) && matches!(self.entries.get(url), Some(LoadState::Loading { .. }))
    }

    /// Forget everything, including which URL is current.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = None;
    }
}
