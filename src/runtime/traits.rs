//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the runtime with mock implementations.

use crate::funnel::{ChatId, Keyboard, MessageId, PhotoRef};
use crate::orders::{Order, OrderLogError};
use crate::telegram::{TelegramError, Update};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by an external collaborator
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error(transparent)]
    Telegram(#[from] TelegramError),
    #[error(transparent)]
    OrderLog(#[from] OrderLogError),
    #[allow(dead_code)] // Constructed by test doubles
    #[error("{0}")]
    Other(String),
}

/// Outbound message delivery
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver a text message, optionally with reply markup
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, CollaboratorError>;

    /// Deliver a stored image with an optional caption
    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &PhotoRef,
        caption: Option<&str>,
    ) -> Result<MessageId, CollaboratorError>;

    /// Deliver a file as a document
    async fn send_document(
        &self,
        chat: ChatId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<MessageId, CollaboratorError>;
}

/// Retrieval and durable storage of inbound images
#[async_trait]
pub trait PhotoFetcher: Send + Sync {
    /// Store the image behind `file_id` and return a reference to it
    async fn fetch_photo(&self, file_id: &str, user_id: i64) -> Result<PhotoRef, CollaboratorError>;
}

/// Durable, append-only record of completed orders
#[async_trait]
pub trait OrderLog: Send + Sync {
    /// Append one row per call
    async fn append(&self, order: &Order) -> Result<(), CollaboratorError>;

    /// Path of the log file, if it exists yet
    async fn export_path(&self) -> Option<PathBuf>;
}

/// Consumer of decoded webhook updates
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn handle_update(&self, update: Update);
}

// ============================================================================
// Arc implementations for shared collaborators
// ============================================================================

#[async_trait]
impl<T: Messenger + ?Sized> Messenger for Arc<T> {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, CollaboratorError> {
        (**self).send_text(chat, text, keyboard).await
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &PhotoRef,
        caption: Option<&str>,
    ) -> Result<MessageId, CollaboratorError> {
        (**self).send_photo(chat, photo, caption).await
    }

    async fn send_document(
        &self,
        chat: ChatId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<MessageId, CollaboratorError> {
        (**self).send_document(chat, path, caption).await
    }
}

#[async_trait]
impl<T: PhotoFetcher + ?Sized> PhotoFetcher for Arc<T> {
    async fn fetch_photo(&self, file_id: &str, user_id: i64) -> Result<PhotoRef, CollaboratorError> {
        (**self).fetch_photo(file_id, user_id).await
    }
}

#[async_trait]
impl<T: OrderLog + ?Sized> OrderLog for Arc<T> {
    async fn append(&self, order: &Order) -> Result<(), CollaboratorError> {
        (**self).append(order).await
    }

    async fn export_path(&self) -> Option<PathBuf> {
        (**self).export_path().await
    }
}
