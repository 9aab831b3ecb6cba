//! Document storage
//!
//! This module provides:
//! - Path-addressed JSON documents (`users/{uid}/screenings/{sid}`, ...)
//! - Single and batched writes behind the `DocumentStore` trait
//! - An in-process store with optional JSON snapshot persistence
//! - Explicit credential resolution for the store client
//! - The read gateway used by the prediction and landing services

mod credentials;
mod gateway;
mod memory;

pub use credentials::{
    CredentialOptions, CredentialSource, Credentials, ServiceAccount, StoreSettings,
    DEFAULT_PROJECT_ID,
};
pub use gateway::{HistoryStore, StoreGateway, UserStore};
pub use memory::MemoryStore;

use crate::codec::DocumentCodec;
use crate::error::{HealError, Result};
use async_trait::async_trait;
use std::fmt;

/// A stored document: a JSON object keyed by field name
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Collection names
pub mod collections {
    pub const USERS: &str = "users";
    pub const SCREENINGS: &str = "screenings";
    pub const ASSESSMENT_LOGS: &str = "assessment_logs";
    pub const PERIOD_LOGS: &str = "period_logs";
    pub const YOGA_ATTENDANCE_LOGS: &str = "yoga_attendance_logs";
    pub const PAD_LOGS: &str = "pad_logs";
}

/// Location of a document, as alternating collection/document segments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// `users/{user_id}`
    pub fn user(user_id: &str) -> Result<Self> {
        Self::from_segments(&[collections::USERS, user_id])
    }

    /// `users/{user_id}/screenings/{screening_id}`
    pub fn screening(user_id: &str, screening_id: &str) -> Result<Self> {
        Self::from_segments(&[
            collections::USERS,
            user_id,
            collections::SCREENINGS,
            screening_id,
        ])
    }

    /// `users/{user_id}/{collection}/{id}`
    pub fn user_entry(user_id: &str, collection: &str, id: &str) -> Result<Self> {
        Self::from_segments(&[collections::USERS, user_id, collection, id])
    }

    fn from_segments(segments: &[&str]) -> Result<Self> {
        for segment in segments {
            if segment.trim().is_empty() || segment.contains('/') {
                return Err(HealError::InvalidPath(segment.to_string()));
            }
        }
        Ok(Self {
            segments: segments.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Id of the document itself (last segment)
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Id of the owning user document, for paths under `users/`
    pub fn user_id(&self) -> Option<&str> {
        match self.segments.first().map(String::as_str) {
            Some(collections::USERS) => self.segments.get(1).map(String::as_str),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// A set of writes applied together by `DocumentStore::commit`
#[derive(Debug, Default)]
pub struct WriteBatch {
    writes: Vec<(DocumentPath, Document)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw document write
    pub fn set(&mut self, path: DocumentPath, document: Document) {
        self.writes.push((path, document));
    }

    /// Queue an entity write using its codec
    pub fn set_entity<T: DocumentCodec>(&mut self, path: DocumentPath, entity: &T) {
        self.set(path, entity.encode());
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn into_writes(self) -> Vec<(DocumentPath, Document)> {
        self.writes
    }
}

/// Trait for document store implementations
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document; `None` when nothing is stored at `path`
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>>;

    /// Create or replace a document
    async fn set(&self, path: &DocumentPath, document: Document) -> Result<()>;

    /// Apply every write in the batch
    async fn commit(&self, batch: WriteBatch) -> Result<()>;

    async fn exists(&self, path: &DocumentPath) -> Result<bool> {
        Ok(self.get(path).await?.is_some())
    }
}
