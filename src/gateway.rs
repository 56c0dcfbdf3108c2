//! Storage boundary for batched listing inserts.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::model::{NewListing, StoredListing};

/// Failed bulk insert. Carries adapter detail for the log; callers of the
/// pipeline only ever see the opaque internal-error response.
#[derive(Debug, Error)]
#[error("bulk insert failed: {0}")]
pub struct GatewayError(String);

impl GatewayError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self(detail.into())
    }
}

impl From<io::Error> for GatewayError {
    fn from(err: io::Error) -> Self {
        Self(err.to_string())
    }
}

/// External storage accepting bounded batches of validated listings.
///
/// The pipeline issues one `insert_many` call at a time per import and treats
/// any failure as fatal to the remainder of that import; batches already
/// accepted stay persisted. Transaction isolation across concurrent imports
/// is the implementation's concern.
#[async_trait]
pub trait ListingGateway: Send + Sync {
    /// Durably store one batch, returning the stored records with their
    /// generated identifiers.
    async fn insert_many(
        &self,
        batch: Vec<NewListing>,
    ) -> Result<Vec<StoredListing>, GatewayError>;
}

/// Appends listings as JSON lines to a local file, assigning sequential
/// identifiers. Backs the CLI and doubles as a fixture for adapter-level
/// tests.
pub struct JsonLinesGateway {
    path: PathBuf,
    next_id: AtomicU64,
}

impl JsonLinesGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ListingGateway for JsonLinesGateway {
    async fn insert_many(
        &self,
        batch: Vec<NewListing>,
    ) -> Result<Vec<StoredListing>, GatewayError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut stored = Vec::with_capacity(batch.len());
        let mut buf = Vec::new();
        for listing in batch {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let record = StoredListing {
                id: format!("listing-{id}"),
                listing,
            };
            serde_json::to_writer(&mut buf, &record)
                .map_err(|e| GatewayError::new(e.to_string()))?;
            buf.push(b'\n');
            stored.push(record);
        }

        file.write_all(&buf).await?;
        file.flush().await?;
        Ok(stored)
    }
}
