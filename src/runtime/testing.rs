//! Mock implementations for testing
//!
//! These mocks enable runtime and API tests without real I/O.

use super::traits::*;
use crate::funnel::{ChatId, Keyboard, MessageId, PhotoRef};
use crate::orders::Order;
use crate::telegram::Update;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Recording Messenger
// ============================================================================

/// A message delivered through the mock messenger
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        chat: ChatId,
        id: MessageId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Photo {
        chat: ChatId,
        id: MessageId,
        photo: PhotoRef,
        caption: Option<String>,
    },
    Document {
        chat: ChatId,
        path: PathBuf,
        caption: Option<String>,
    },
}

impl Sent {
    pub fn chat(&self) -> ChatId {
        match self {
            Sent::Text { chat, .. } | Sent::Photo { chat, .. } | Sent::Document { chat, .. } => {
                *chat
            }
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Sent::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Messenger that records every delivery and hands out increasing message ids
pub struct RecordingMessenger {
    next_id: AtomicI64,
    fail_photos: AtomicBool,
    pub sent: Mutex<Vec<Sent>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1000),
            fail_photos: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Make subsequent `send_photo` calls fail
    pub fn fail_photos(&self, fail: bool) {
        self.fail_photos.store(fail, Ordering::SeqCst);
    }

    pub fn recorded(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat: ChatId) -> Vec<Sent> {
        self.recorded()
            .into_iter()
            .filter(|s| s.chat() == chat)
            .collect()
    }

    pub fn texts_to(&self, chat: ChatId) -> Vec<String> {
        self.sent_to(chat)
            .iter()
            .filter_map(|s| s.text().map(String::from))
            .collect()
    }

    /// Ids of photos delivered to `chat`, oldest first
    pub fn photo_ids_to(&self, chat: ChatId) -> Vec<MessageId> {
        self.sent_to(chat)
            .iter()
            .filter_map(|s| match s {
                Sent::Photo { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    fn next_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for RecordingMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, CollaboratorError> {
        let id = self.next_id();
        self.sent.lock().unwrap().push(Sent::Text {
            chat,
            id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(id)
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &PhotoRef,
        caption: Option<&str>,
    ) -> Result<MessageId, CollaboratorError> {
        if self.fail_photos.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Other("photo upload refused".to_string()));
        }
        let id = self.next_id();
        self.sent.lock().unwrap().push(Sent::Photo {
            chat,
            id,
            photo: photo.clone(),
            caption: caption.map(String::from),
        });
        Ok(id)
    }

    async fn send_document(
        &self,
        chat: ChatId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<MessageId, CollaboratorError> {
        let id = self.next_id();
        self.sent.lock().unwrap().push(Sent::Document {
            chat,
            path: path.to_path_buf(),
            caption: caption.map(String::from),
        });
        Ok(id)
    }
}

// ============================================================================
// Scripted Photo Fetcher
// ============================================================================

/// Photo fetcher that returns a predictable path, or fails on demand
pub struct ScriptedPhotoFetcher {
    fail: AtomicBool,
    /// Downloads that wait for a release before completing
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    /// Record of `(file_id, user_id)` fetches
    pub fetches: Mutex<Vec<(String, i64)>>,
}

impl ScriptedPhotoFetcher {
    pub fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            gates: Mutex::new(HashMap::new()),
            fetches: Mutex::new(Vec::new()),
        }
    }

    /// Hold the download of `file_id` until the returned handle is notified
    pub fn gate(&self, file_id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(file_id.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn path_for(file_id: &str, user_id: i64) -> PhotoRef {
        PhotoRef::new(format!("photos/photo_{user_id}_{file_id}.jpg"))
    }
}

impl Default for ScriptedPhotoFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PhotoFetcher for ScriptedPhotoFetcher {
    async fn fetch_photo(&self, file_id: &str, user_id: i64) -> Result<PhotoRef, CollaboratorError> {
        self.fetches
            .lock()
            .unwrap()
            .push((file_id.to_string(), user_id));
        let gate = self.gates.lock().unwrap().get(file_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Other("download failed".to_string()));
        }
        Ok(Self::path_for(file_id, user_id))
    }
}

// ============================================================================
// In-memory Order Log
// ============================================================================

/// Order log that keeps rows in memory
pub struct MemoryOrderLog {
    fail: AtomicBool,
    export: Option<PathBuf>,
    pub orders: Mutex<Vec<Order>>,
}

impl MemoryOrderLog {
    pub fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            export: None,
            orders: Mutex::new(Vec::new()),
        }
    }

    /// Report `path` as the exportable log file
    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export = Some(path.into());
        self
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn recorded(&self) -> Vec<Order> {
        self.orders.lock().unwrap().clone()
    }
}

impl Default for MemoryOrderLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderLog for MemoryOrderLog {
    async fn append(&self, order: &Order) -> Result<(), CollaboratorError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Other("storage unavailable".to_string()));
        }
        self.orders.lock().unwrap().push(order.clone());
        Ok(())
    }

    async fn export_path(&self) -> Option<PathBuf> {
        self.export.clone()
    }
}

// ============================================================================
// Recording Update Handler
// ============================================================================

/// Update handler that only records what the webhook delivered
#[derive(Default)]
pub struct RecordingUpdateHandler {
    pub updates: Mutex<Vec<Update>>,
}

impl RecordingUpdateHandler {
    pub fn update_ids(&self) -> Vec<i64> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.update_id)
            .collect()
    }
}

#[async_trait]
impl UpdateHandler for RecordingUpdateHandler {
    async fn handle_update(&self, update: Update) {
        self.updates.lock().unwrap().push(update);
    }
}
