//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::db::{DbError, VisitorRecord};
use async_trait::async_trait;
use std::path::Path;

/// Outbound side of the chat platform
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a plain text message to a chat
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), String>;

    /// Download an uploaded file to `dest`, replacing any existing file
    async fn download_file(&self, file_id: &str, dest: &Path) -> Result<(), String>;
}

/// Storage for visitor records
#[async_trait]
pub trait VisitorStore: Send + Sync {
    /// Persist one record; `false` when the write did not happen
    async fn insert_visitor(&self, record: &VisitorRecord) -> bool;

    async fn count_visitors(&self) -> Result<u64, DbError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), String> {
        (**self).send_text(chat_id, text).await
    }

    async fn download_file(&self, file_id: &str, dest: &Path) -> Result<(), String> {
        (**self).download_file(file_id, dest).await
    }
}

#[async_trait]
impl<T: VisitorStore + ?Sized> VisitorStore for Arc<T> {
    async fn insert_visitor(&self, record: &VisitorRecord) -> bool {
        (**self).insert_visitor(record).await
    }

    async fn count_visitors(&self) -> Result<u64, DbError> {
        (**self).count_visitors().await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

use crate::db::Database;
use crate::telegram::TelegramClient;
use std::sync::Arc;

/// Adapter to use Database as a `VisitorStore`
#[derive(Clone)]
pub struct DatabaseStore {
    db: Database,
}

impl DatabaseStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub fn inner(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl VisitorStore for DatabaseStore {
    async fn insert_visitor(&self, record: &VisitorRecord) -> bool {
        self.db.insert_visitor(record)
    }

    async fn count_visitors(&self) -> Result<u64, DbError> {
        self.db.count_visitors()
    }
}

/// Adapter to use the Telegram client as a `ChatTransport`
#[derive(Clone)]
pub struct TelegramTransport {
    client: Arc<TelegramClient>,
}

impl TelegramTransport {
    pub fn new(client: Arc<TelegramClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), String> {
        self.client
            .send_message(chat_id, text)
            .await
            .map_err(|e| e.to_string())
    }

    async fn download_file(&self, file_id: &str, dest: &Path) -> Result<(), String> {
        let bytes = self
            .client
            .download_file(file_id, dest)
            .await
            .map_err(|e| e.to_string())?;
        tracing::debug!(file_id, bytes, dest = %dest.display(), "Downloaded file");
        Ok(())
    }
}
