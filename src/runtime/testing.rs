//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use super::{BotRuntime, InboundContent, InboundMessage};
use crate::commands::Command;
use crate::db::{DbError, VisitorRecord};
use crate::state_machine::PhotoVariant;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Bytes the mock transport writes for every download
pub const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

// ============================================================================
// Mock Chat Transport
// ============================================================================

/// Records outgoing messages and serves downloads from memory
#[derive(Default)]
pub struct MockTransport {
    /// Every `(chat_id, text)` sent
    pub sent: Mutex<Vec<(i64, String)>>,
    /// Every `(file_id, dest)` downloaded
    pub downloads: Mutex<Vec<(String, PathBuf)>>,
    fail_downloads: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }

    /// Texts sent to a chat, oldest first
    pub fn replies_to(&self, chat_id: i64) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn last_reply(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, text)| text.clone())
    }

    pub fn reply_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), String> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn download_file(&self, file_id: &str, dest: &Path) -> Result<(), String> {
        self.downloads
            .lock()
            .unwrap()
            .push((file_id.to_string(), dest.to_path_buf()));
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err("file is temporarily unavailable".to_string());
        }
        tokio::fs::write(dest, FAKE_JPEG)
            .await
            .map_err(|e| e.to_string())
    }
}

// ============================================================================
// In-Memory Visitor Store
// ============================================================================

/// Visitor store backed by a vector, with switchable failure modes
#[derive(Default)]
pub struct InMemoryStore {
    pub records: Mutex<Vec<VisitorRecord>>,
    fail_inserts: AtomicBool,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject inserts as a query failure would
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Behave like an unreachable database
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn all_records(&self) -> Vec<VisitorRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisitorStore for InMemoryStore {
    async fn insert_visitor(&self, record: &VisitorRecord) -> bool {
        if self.unavailable.load(Ordering::SeqCst) || self.fail_inserts.load(Ordering::SeqCst) {
            return false;
        }
        self.records.lock().unwrap().push(record.clone());
        true
    }

    async fn count_visitors(&self) -> Result<u64, DbError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable("unable to open database file".to_string()));
        }
        Ok(self.records.lock().unwrap().len() as u64)
    }
}

// ============================================================================
// Test Runtime
// ============================================================================

/// Runtime driven message by message, with handles to its mocks
pub struct TestRuntime<S: VisitorStore + 'static> {
    pub runtime: BotRuntime<S, Arc<MockTransport>>,
    pub store: S,
    pub transport: Arc<MockTransport>,
    pub image_dir: tempfile::TempDir,
}

impl TestRuntime<Arc<InMemoryStore>> {
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryStore::new()))
    }
}

impl<S: VisitorStore + Clone + 'static> TestRuntime<S> {
    pub fn with_store(store: S) -> Self {
        let image_dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::new());
        // Handle-driven; the channel is never read
        let (_tx, rx) = mpsc::channel(1);
        let runtime = BotRuntime::new(
            store.clone(),
            transport.clone(),
            image_dir.path().join("visitor_images"),
            rx,
            CancellationToken::new(),
        );
        Self {
            runtime,
            store,
            transport,
            image_dir,
        }
    }
}

impl<S: VisitorStore + 'static> TestRuntime<S> {
    pub const CHAT: i64 = 500;
    pub const USER: i64 = 42;

    pub fn images(&self) -> PathBuf {
        self.image_dir.path().join("visitor_images")
    }

    async fn deliver(&mut self, user_id: i64, content: InboundContent) {
        self.runtime
            .handle_message(InboundMessage {
                chat_id: Self::CHAT + user_id,
                user_id,
                content,
            })
            .await;
    }

    pub async fn command(&mut self, text: &str) {
        self.command_from(Self::USER, text).await;
    }

    pub async fn command_from(&mut self, user_id: i64, text: &str) {
        let command = Command::parse(text).unwrap();
        self.deliver(user_id, InboundContent::Command(command)).await;
    }

    pub async fn text(&mut self, text: &str) {
        self.text_from(Self::USER, text).await;
    }

    pub async fn text_from(&mut self, user_id: i64, text: &str) {
        self.deliver(user_id, InboundContent::Text(text.to_string()))
            .await;
    }

    pub async fn photo(&mut self, file_id: &str) {
        let variants = vec![
            PhotoVariant {
                file_id: format!("{file_id}-thumb"),
                width: 90,
                height: 90,
                file_size: Some(1_000),
            },
            PhotoVariant {
                file_id: file_id.to_string(),
                width: 1280,
                height: 960,
                file_size: Some(90_000),
            },
        ];
        self.deliver(Self::USER, InboundContent::Photo(variants)).await;
    }

    pub async fn sticker(&mut self) {
        self.deliver(Self::USER, InboundContent::Unsupported).await;
    }

    /// Replies received by the default user
    pub fn replies(&self) -> Vec<String> {
        self.transport.replies_to(Self::CHAT + Self::USER)
    }

    pub fn last_reply(&self) -> String {
        self.transport.last_reply().unwrap_or_default()
    }

    /// Run `/inputvisit` through to the confirmation menu
    pub async fn fill_visit(&mut self, name: &str, organization: &str, purpose: &str) {
        self.command("/inputvisit").await;
        self.text(name).await;
        self.text(organization).await;
        self.text(purpose).await;
        self.photo(&format!("photo-of-{name}")).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{
        DB_QUERY_FAILED_TEXT, DB_UNAVAILABLE_TEXT, HELP_TEXT, INFO_TEXT, WELCOME_TEXT,
    };
    use crate::db::{Database, TIMESTAMP_FORMAT};
    use crate::state_machine::transition::{
        CANCELLED, INVALID_CHOICE, INVALID_IMAGE, PHOTO_PROMPT, PHOTO_STORE_FAILED,
        RECORD_FAILED, START_PROMPT,
    };
    use chrono::NaiveDateTime;
    use std::time::Duration;

    type MemRuntime = TestRuntime<Arc<InMemoryStore>>;

    #[tokio::test]
    async fn test_static_commands() {
        let mut rt = MemRuntime::new();
        rt.command("/start").await;
        rt.command("/info").await;
        rt.command("/help").await;

        assert_eq!(rt.replies(), vec![WELCOME_TEXT, INFO_TEXT, HELP_TEXT]);
    }

    #[tokio::test]
    async fn test_full_visit_is_recorded() {
        let mut rt = MemRuntime::new();
        rt.fill_visit("Alice", "Acme", "Meeting").await;

        let menu = rt.last_reply();
        assert!(menu.contains("Nama: Alice"), "{menu}");
        assert!(menu.contains("Asal Instansi: Acme"), "{menu}");
        assert!(menu.contains("Keperluan: Meeting"), "{menu}");
        assert!(menu.contains("1 - Confirm"), "{menu}");

        rt.text("1").await;

        let records = rt.store.all_records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "Alice");
        assert_eq!(record.organization, "Acme");
        assert_eq!(record.purpose, "Meeting");
        assert!(record.photo.ends_with("Alice.jpg"), "{}", record.photo);
        assert!(NaiveDateTime::parse_from_str(&record.timestamp, TIMESTAMP_FORMAT).is_ok());

        assert_eq!(
            rt.last_reply(),
            format!("Visit recorded in the database at {}.", record.timestamp)
        );
        assert_eq!(rt.runtime.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_prompts_follow_field_order() {
        let mut rt = MemRuntime::new();
        rt.command("/inputvisit").await;
        rt.text("Alice").await;
        rt.text("Acme").await;
        rt.text("Meeting").await;

        assert_eq!(
            rt.replies(),
            vec![START_PROMPT, "Asal Instansi:", "Keperluan:", PHOTO_PROMPT]
        );
    }

    #[tokio::test]
    async fn test_largest_photo_is_saved_under_visitor_name() {
        let mut rt = MemRuntime::new();
        rt.fill_visit("Alice", "Acme", "Meeting").await;

        let downloads = rt.transport.downloads.lock().unwrap().clone();
        assert_eq!(
            downloads,
            vec![("photo-of-Alice".to_string(), rt.images().join("Alice.jpg"))]
        );
        assert_eq!(std::fs::read(rt.images().join("Alice.jpg")).unwrap(), FAKE_JPEG);
    }

    #[tokio::test]
    async fn test_edit_returns_to_confirm() {
        let mut rt = MemRuntime::new();
        rt.fill_visit("Alice", "Acme", "Meeting").await;

        rt.text("2").await;
        assert_eq!(rt.last_reply(), "Please enter the correct Nama:");

        rt.text("Alicia").await;
        let menu = rt.last_reply();
        assert!(menu.contains("Nama: Alicia"), "{menu}");
        assert!(menu.contains("Asal Instansi: Acme"), "{menu}");

        rt.text("1").await;
        let records = rt.store.all_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Alicia");
        // The photo keeps the path chosen when it was uploaded
        assert!(records[0].photo.ends_with("Alice.jpg"));
    }

    #[tokio::test]
    async fn test_edit_photo_replaces_file() {
        let mut rt = MemRuntime::new();
        rt.fill_visit("Alice", "Acme", "Meeting").await;

        rt.text("5").await;
        assert_eq!(rt.last_reply(), "Please upload the correct image:");
        rt.photo("second-photo").await;
        assert!(rt.last_reply().contains("1 - Confirm"));

        let downloads = rt.transport.downloads.lock().unwrap().clone();
        assert_eq!(downloads.len(), 2);
        assert_eq!(downloads[1].0, "second-photo");
    }

    #[tokio::test]
    async fn test_invalid_choice_reprompts() {
        let mut rt = MemRuntime::new();
        rt.fill_visit("Alice", "Acme", "Meeting").await;

        rt.text("9").await;
        assert_eq!(rt.last_reply(), INVALID_CHOICE);
        rt.text("confirm").await;
        assert_eq!(rt.last_reply(), INVALID_CHOICE);
        assert!(rt.store.all_records().is_empty());

        rt.text("1").await;
        assert_eq!(rt.store.all_records().len(), 1);
    }

    #[tokio::test]
    async fn test_text_instead_of_photo_reprompts() {
        let mut rt = MemRuntime::new();
        rt.command("/inputvisit").await;
        rt.text("Alice").await;
        rt.text("Acme").await;
        rt.text("Meeting").await;

        rt.text("here is my selfie").await;
        assert_eq!(rt.last_reply(), INVALID_IMAGE);
        rt.sticker().await;
        assert_eq!(rt.last_reply(), INVALID_IMAGE);

        rt.photo("selfie").await;
        assert!(rt.last_reply().contains("1 - Confirm"));
    }

    #[tokio::test]
    async fn test_photo_or_sticker_while_name_expected_reprompts() {
        let mut rt = MemRuntime::new();
        rt.command("/inputvisit").await;

        rt.photo("too-early").await;
        assert_eq!(rt.last_reply(), "Please send Nama as a text message.");
        rt.sticker().await;
        assert_eq!(rt.last_reply(), "Please send Nama as a text message.");
        assert!(rt.transport.downloads.lock().unwrap().is_empty());

        // Still collecting the name
        rt.text("Alice").await;
        assert_eq!(rt.last_reply(), "Asal Instansi:");
    }

    #[tokio::test]
    async fn test_very_long_name_still_reaches_confirm() {
        let mut rt = MemRuntime::new();
        let name = "A".repeat(300);
        rt.fill_visit(&name, "Acme", "Meeting").await;
        assert!(rt.last_reply().contains("1 - Confirm"), "{}", rt.last_reply());

        rt.text("1").await;
        let records = rt.store.all_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, name);
        assert!(std::path::Path::new(&records[0].photo).exists());
    }

    #[tokio::test]
    async fn test_multibyte_name_photo_is_saved() {
        let mut rt = MemRuntime::new();
        let name = "\u{8a2a}\u{554f}\u{8005}".repeat(40);
        rt.fill_visit(&name, "Acme", "Meeting").await;
        assert!(rt.last_reply().contains("1 - Confirm"), "{}", rt.last_reply());

        let downloads = rt.transport.downloads.lock().unwrap().clone();
        assert_eq!(downloads.len(), 1);
        assert!(downloads[0].1.exists());
    }

    #[tokio::test]
    async fn test_failed_download_reprompts_for_photo() {
        let mut rt = MemRuntime::new();
        rt.transport.set_fail_downloads(true);
        rt.fill_visit("Alice", "Acme", "Meeting").await;
        assert_eq!(rt.last_reply(), PHOTO_STORE_FAILED);

        rt.transport.set_fail_downloads(false);
        rt.photo("retry").await;
        assert!(rt.last_reply().contains("1 - Confirm"));
    }

    #[tokio::test]
    async fn test_failed_insert_ends_session_without_row() {
        let mut rt = MemRuntime::new();
        rt.store.set_fail_inserts(true);
        rt.fill_visit("Alice", "Acme", "Meeting").await;
        rt.text("1").await;

        assert_eq!(rt.last_reply(), RECORD_FAILED);
        assert!(rt.store.all_records().is_empty());
        assert_eq!(rt.runtime.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_cancel_discards_draft() {
        let mut rt = MemRuntime::new();
        rt.command("/inputvisit").await;
        rt.text("Alice").await;
        rt.command("/cancel").await;
        assert_eq!(rt.last_reply(), CANCELLED);

        // Text after cancelling is no longer part of a visit
        let before = rt.transport.reply_count();
        rt.text("Acme").await;
        assert_eq!(rt.transport.reply_count(), before);
        assert!(rt.store.all_records().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_without_session() {
        let mut rt = MemRuntime::new();
        rt.command("/cancel").await;
        assert!(rt.last_reply().contains("no visit entry in progress"));
    }

    #[tokio::test]
    async fn test_inputvisit_during_session_is_rejected() {
        let mut rt = MemRuntime::new();
        rt.command("/inputvisit").await;
        rt.text("Alice").await;
        rt.command("/inputvisit").await;
        assert!(rt.last_reply().contains("already in progress"));

        // The draft survives
        rt.text("Acme").await;
        assert_eq!(rt.last_reply(), "Keperluan:");
    }

    #[tokio::test]
    async fn test_text_without_session_is_ignored() {
        let mut rt = MemRuntime::new();
        rt.text("hello").await;
        rt.sticker().await;
        rt.command("/weather").await;
        assert_eq!(rt.transport.reply_count(), 0);
    }

    #[tokio::test]
    async fn test_status_during_session_keeps_draft() {
        let mut rt = MemRuntime::new();
        rt.command("/inputvisit").await;
        rt.text("Alice").await;
        rt.command("/status").await;
        assert_eq!(rt.last_reply(), "Current status: 0 visitors recorded.");

        rt.text("Acme").await;
        assert_eq!(rt.last_reply(), "Keperluan:");
    }

    #[tokio::test]
    async fn test_status_counts_visits() {
        let mut rt = MemRuntime::new();
        rt.command("/status").await;
        assert_eq!(rt.last_reply(), "Current status: 0 visitors recorded.");

        for name in ["Alice", "Bob"] {
            rt.fill_visit(name, "Acme", "Meeting").await;
            rt.text("1").await;
        }
        rt.command("/status").await;
        assert_eq!(rt.last_reply(), "Current status: 2 visitors recorded.");
    }

    #[tokio::test]
    async fn test_status_when_database_unreachable() {
        let mut rt = MemRuntime::new();
        rt.store.set_unavailable(true);
        rt.command("/status").await;
        assert_eq!(rt.last_reply(), DB_UNAVAILABLE_TEXT);
    }

    #[tokio::test]
    async fn test_users_have_independent_sessions() {
        let mut rt = MemRuntime::new();
        rt.command_from(1, "/inputvisit").await;
        rt.command_from(2, "/inputvisit").await;
        rt.text_from(1, "Alice").await;
        rt.text_from(2, "Bob").await;

        assert_eq!(
            rt.transport.replies_to(MemRuntime::CHAT + 1).last().unwrap(),
            "Asal Instansi:"
        );
        assert_eq!(rt.runtime.open_sessions(), 2);

        rt.command_from(1, "/cancel").await;
        assert_eq!(rt.runtime.open_sessions(), 1);
        rt.text_from(2, "Acme").await;
        assert_eq!(
            rt.transport.replies_to(MemRuntime::CHAT + 2).last().unwrap(),
            "Keperluan:"
        );
    }

    // ========================================================================
    // Against a real SQLite file
    // ========================================================================

    fn sqlite_runtime() -> (tempfile::TempDir, TestRuntime<DatabaseStore>) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("visitor_management.db"));
        db.ensure_schema().unwrap();
        (dir, TestRuntime::with_store(DatabaseStore::new(db)))
    }

    #[tokio::test]
    async fn test_visit_persists_to_sqlite() {
        let (_dir, mut rt) = sqlite_runtime();
        rt.fill_visit("Alice", "Acme", "Meeting").await;
        rt.text("1").await;

        let rows = rt.store.inner().list_visitors().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Alice");
        assert_eq!(rows[0].organization, "Acme");
        assert_eq!(rows[0].purpose, "Meeting");
        assert!(rows[0].photo.ends_with("Alice.jpg"));

        rt.command("/status").await;
        assert_eq!(rt.last_reply(), "Current status: 1 visitors recorded.");
    }

    #[tokio::test]
    async fn test_sqlite_missing_table_reports_query_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visitor_management.db");
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE unrelated (x INTEGER);")
            .unwrap();
        let mut rt = TestRuntime::with_store(DatabaseStore::new(Database::new(&path)));

        rt.command("/status").await;
        assert_eq!(rt.last_reply(), DB_QUERY_FAILED_TEXT);

        rt.fill_visit("Alice", "Acme", "Meeting").await;
        rt.text("1").await;
        assert_eq!(rt.last_reply(), RECORD_FAILED);
    }

    #[tokio::test]
    async fn test_sqlite_missing_file_reports_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("gone.db"));
        let mut rt = TestRuntime::with_store(DatabaseStore::new(db));

        rt.command("/status").await;
        assert_eq!(rt.last_reply(), DB_UNAVAILABLE_TEXT);
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    #[tokio::test]
    async fn test_run_loop_processes_channel_until_closed() {
        let store = Arc::new(InMemoryStore::new());
        let transport = Arc::new(MockTransport::new());
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel(8);
        let runtime = BotRuntime::new(
            store.clone(),
            transport.clone(),
            dir.path().to_path_buf(),
            rx,
            CancellationToken::new(),
        );
        let handle = tokio::spawn(runtime.run());

        tx.send(InboundMessage {
            chat_id: 7,
            user_id: 7,
            content: InboundContent::Command(Command::Start),
        })
        .await
        .unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(transport.replies_to(7), vec![WELCOME_TEXT]);
    }

    #[tokio::test]
    async fn test_run_loop_stops_on_shutdown() {
        let (_tx, rx) = mpsc::channel(8);
        let shutdown = CancellationToken::new();
        let runtime = BotRuntime::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(MockTransport::new()),
            PathBuf::from("unused"),
            rx,
            shutdown.clone(),
        );
        let handle = tokio::spawn(runtime.run());
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
