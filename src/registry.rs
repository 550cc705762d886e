//! Shared conversation registries
//!
//! The stage tracker, the captured-data store and the pending-quote
//! correlator live behind a single mutex. The owner's replies cross
//! conversation boundaries, so the three maps are never partitioned.
//! Callers must not await while holding the lock; [`Registry::with`] only
//! accepts a synchronous closure.
//!
//! Entries are never evicted. An abandoned conversation stays parked in its
//! last stage, and an appraisal the owner never answers keeps its pending
//! quote, for the lifetime of the process.

use crate::funnel::{Capture, CaptureUpdate, ChatId, MessageId, Stage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// The notification id is already bound to a conversation
#[derive(Debug, Error, PartialEq, Eq)]
#[error("notification {notification} is already bound to chat {existing}")]
pub struct QuoteCollision {
    pub notification: MessageId,
    pub existing: ChatId,
}

// ============================================================================
// Stage tracker
// ============================================================================

/// Current stage per conversation; absence means `Stage::Absent`
#[derive(Debug, Default)]
pub struct StageTracker {
    stages: HashMap<ChatId, Stage>,
}

impl StageTracker {
    pub fn get(&self, chat: ChatId) -> Stage {
        self.stages.get(&chat).copied().unwrap_or_default()
    }

    /// Store the stage; terminal and absent stages remove the entry
    pub fn set(&mut self, chat: ChatId, stage: Stage) {
        if stage.is_active() {
            self.stages.insert(chat, stage);
        } else {
            self.stages.remove(&chat);
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn len(&self) -> usize {
        self.stages.len()
    }
}

// ============================================================================
// Captured data
// ============================================================================

#[derive(Debug, Default)]
pub struct CaptureStore {
    captures: HashMap<ChatId, Capture>,
}

impl CaptureStore {
    pub fn get(&self, chat: ChatId) -> Option<&Capture> {
        self.captures.get(&chat)
    }

    pub fn apply(&mut self, chat: ChatId, update: CaptureUpdate) {
        match update {
            CaptureUpdate::Keep => {}
            CaptureUpdate::Replace(capture) => {
                self.captures.insert(chat, capture);
            }
            CaptureUpdate::Clear => {
                self.captures.remove(&chat);
            }
        }
    }

    pub fn remove(&mut self, chat: ChatId) {
        self.captures.remove(&chat);
    }

    #[allow(dead_code)] // Used in tests
    pub fn len(&self) -> usize {
        self.captures.len()
    }
}

// ============================================================================
// Pending-quote correlator
// ============================================================================

/// Maps an owner-facing appraisal notification back to the client chat
#[derive(Debug, Default)]
pub struct PendingQuotes {
    quotes: HashMap<MessageId, ChatId>,
}

impl PendingQuotes {
    /// Bind a fresh notification id; an existing binding is left untouched
    pub fn register(&mut self, notification: MessageId, chat: ChatId) -> Result<(), QuoteCollision> {
        if let Some(existing) = self.quotes.get(&notification) {
            return Err(QuoteCollision {
                notification,
                existing: *existing,
            });
        }
        self.quotes.insert(notification, chat);
        Ok(())
    }

    /// Lookup without removal
    pub fn resolve(&self, notification: MessageId) -> Option<ChatId> {
        self.quotes.get(&notification).copied()
    }

    /// Remove the binding; a second consume of the same id finds nothing
    pub fn consume(&mut self, notification: MessageId) -> Option<ChatId> {
        self.quotes.remove(&notification)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }
}

// ============================================================================
// Shared registry
// ============================================================================

/// The three registries, mutated together
#[derive(Debug, Default)]
pub struct Registries {
    pub stages: StageTracker,
    pub captures: CaptureStore,
    pub quotes: PendingQuotes,
}

impl Registries {
    /// Commit a transition's stage and capture change together
    pub fn commit(&mut self, chat: ChatId, stage: Stage, capture: CaptureUpdate) {
        self.stages.set(chat, stage);
        if stage.is_active() {
            self.captures.apply(chat, capture);
        } else {
            self.captures.remove(chat);
        }
    }
}

/// Thread-safe handle to the registries, cheap to clone
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<Mutex<Registries>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access to all three registries
    pub fn with<R>(&self, f: impl FnOnce(&mut Registries) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    #[allow(dead_code)] // Used in tests
    pub fn stage(&self, chat: ChatId) -> Stage {
        self.with(|r| r.stages.get(chat))
    }
}
