//! Completed orders and the append-only CSV order log

use crate::funnel::{ClientProfile, PhotoRef};
use crate::runtime::{CollaboratorError, OrderLog};
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Error, Debug)]
pub enum OrderLogError {
    #[error("Order log I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Order log CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Order log writer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A completed intake record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub placed_at: DateTime<Utc>,
    pub client_name: String,
    /// `@username` or the "none" placeholder
    pub client_handle: String,
    pub photo: PhotoRef,
    pub requisites: String,
}

impl Order {
    pub fn new(
        placed_at: DateTime<Utc>,
        profile: &ClientProfile,
        photo: PhotoRef,
        requisites: impl Into<String>,
    ) -> Self {
        Self {
            placed_at,
            client_name: profile.display_name.clone(),
            client_handle: profile.handle(),
            photo,
            requisites: requisites.into(),
        }
    }
}

/// One CSV row: `Date, Name, Handle, PhotoRef, Requisites`, in that fixed order
#[derive(Debug, Serialize)]
struct OrderRow<'a> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Handle")]
    handle: &'a str,
    #[serde(rename = "PhotoRef")]
    photo: String,
    #[serde(rename = "Requisites")]
    requisites: &'a str,
}

impl<'a> From<&'a Order> for OrderRow<'a> {
    fn from(order: &'a Order) -> Self {
        Self {
            date: order
                .placed_at
                .with_timezone(&Local)
                .format(DATE_FORMAT)
                .to_string(),
            name: &order.client_name,
            handle: &order.client_handle,
            photo: order.photo.to_string(),
            requisites: &order.requisites,
        }
    }
}

/// Order log backed by a CSV file; the header row is written on creation
pub struct CsvOrderLog {
    path: PathBuf,
    /// Serializes appends from concurrent webhook deliveries
    write_lock: Mutex<()>,
}

impl CsvOrderLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_blocking(path: &Path, order: &Order) -> Result<(), OrderLogError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(OrderRow::from(order))?;
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl OrderLog for CsvOrderLog {
    async fn append(&self, order: &Order) -> Result<(), CollaboratorError> {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        let order = order.clone();

        tokio::task::spawn_blocking(move || Self::append_blocking(&path, &order))
            .await
            .map_err(OrderLogError::from)??;

        tracing::debug!(path = %self.path.display(), "Order row appended");
        Ok(())
    }

    async fn export_path(&self) -> Option<PathBuf> {
        match tokio::fs::try_exists(&self.path).await {
            Ok(true) => Some(self.path.clone()),
            Ok(false) => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Cannot check order log");
                None
            }
        }
    }
}
