//! Proof-of-transfer storage.
//!
//! Uploaded images are kept either in the `proofs` table or as files in a
//! directory, depending on configuration. Either way the ledger only ever sees
//! the opaque reference returned by [`ProofStore::put`]: a row id for database
//! storage, a file name for filesystem storage.
//!
//! Database proofs are written through the connection the caller passes in, so
//! they can share a transaction with the ledger rows that reference them. Files
//! cannot be rolled back; [`ProofStore::discard`] removes them instead.

use crate::{
    config::{ProofConfig, ProofStorageKind},
    entities::{Proof, proof},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Raw bytes of an uploaded proof image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofUpload {
    /// Image data
    pub bytes: Vec<u8>,
    /// MIME type reported by the uploader
    pub content_type: Option<String>,
}

impl ProofUpload {
    /// Wraps uploaded bytes.
    #[must_use]
    pub const fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    /// File extension matching the content type, `jpg` when unknown.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_deref() {
            Some("image/png") => "png",
            Some("image/webp") => "webp",
            Some("image/gif") => "gif",
            _ => "jpg",
        }
    }
}

/// Builds a unique file name such as `expense_20240101120000_<uuid>.jpg`.
#[must_use]
pub fn generate_file_name(prefix: &str, upload: &ProofUpload) -> String {
    format!(
        "{prefix}{}_{}.{}",
        Utc::now().format("%Y%m%d%H%M%S"),
        Uuid::new_v4().simple(),
        upload.extension()
    )
}

/// Where proof images are kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofStore {
    /// Bytes live in the `proofs` table; references are row ids
    Database,
    /// Bytes live in files under a directory; references are file names
    Filesystem(PathBuf),
}

impl ProofStore {
    /// Selects the backend named in configuration.
    pub fn from_config(config: &ProofConfig) -> Result<Self> {
        match config.storage {
            ProofStorageKind::Database => Ok(Self::Database),
            ProofStorageKind::Filesystem => config
                .directory
                .clone()
                .map(Self::Filesystem)
                .ok_or_else(|| Error::Config {
                    message: "proofs.directory is required for filesystem storage".to_string(),
                }),
        }
    }

    /// Stores an upload and returns its reference.
    ///
    /// `db` may be an open transaction; the proof row is then only kept if the
    /// transaction commits.
    ///
    /// # Errors
    /// - `EmptyProof` if the upload has no bytes
    /// - `Database` or `Io` if the backend fails
    #[instrument(skip(self, db, upload), fields(size = upload.bytes.len()))]
    pub async fn put<C>(&self, db: &C, upload: ProofUpload, prefix: &str) -> Result<String>
    where
        C: ConnectionTrait,
    {
        if upload.bytes.is_empty() {
            return Err(Error::EmptyProof);
        }

        let file_name = generate_file_name(prefix, &upload);
        let reference = match self {
            Self::Database => {
                let stored = proof::ActiveModel {
                    file_name: Set(file_name),
                    content_type: Set(upload.content_type),
                    data: Set(upload.bytes),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(db)
                .await?;
                stored.id.to_string()
            }
            Self::Filesystem(directory) => {
                tokio::fs::create_dir_all(directory).await?;
                tokio::fs::write(directory.join(&file_name), &upload.bytes).await?;
                file_name
            }
        };

        info!(%reference, "Stored proof");
        Ok(reference)
    }

    /// Returns the bytes behind a reference.
    ///
    /// # Errors
    /// - `ProofNotFound` if nothing is stored under the reference
    /// - `ProofUnreadable` if the reference is malformed or the object is
    ///   empty or cannot be read
    pub async fn resolve<C>(&self, db: &C, reference: &str) -> Result<Vec<u8>>
    where
        C: ConnectionTrait,
    {
        debug!(reference, "Resolving proof");
        match self {
            Self::Database => {
                let id: i64 = reference
                    .parse()
                    .map_err(|_| unreadable(reference, "not a proof id"))?;
                let stored = Proof::find_by_id(id)
                    .one(db)
                    .await?
                    .ok_or_else(|| not_found(reference))?;
                if stored.data.is_empty() {
                    return Err(unreadable(reference, "stored proof is empty"));
                }
                Ok(stored.data)
            }
            Self::Filesystem(directory) => {
                let path = file_path(directory, reference)?;
                match tokio::fs::read(&path).await {
                    Ok(bytes) if bytes.is_empty() => {
                        Err(unreadable(reference, "stored proof is empty"))
                    }
                    Ok(bytes) => Ok(bytes),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        Err(not_found(reference))
                    }
                    Err(e) => Err(unreadable(reference, &e.to_string())),
                }
            }
        }
    }

    /// Removes a proof whose ledger rows were never written.
    ///
    /// Database proofs disappear with the rolled-back transaction, so only files
    /// are touched. Failures are logged, not returned.
    pub async fn discard(&self, reference: &str) {
        let Self::Filesystem(directory) = self else {
            return;
        };
        let removed = match file_path(directory, reference) {
            Ok(path) => tokio::fs::remove_file(path).await.map_err(Error::from),
            Err(e) => Err(e),
        };
        match removed {
            Ok(()) => info!(reference, "Discarded orphaned proof"),
            Err(e) => warn!(reference, "Could not discard orphaned proof: {}", e),
        }
    }
}

/// Joins a reference onto the proof directory, refusing anything that could
/// escape it.
fn file_path(directory: &Path, reference: &str) -> Result<PathBuf> {
    let is_plain_name = !reference.is_empty()
        && !reference.contains(['/', '\\'])
        && reference != "."
        && reference != "..";
    if is_plain_name {
        Ok(directory.join(reference))
    } else {
        Err(unreadable(reference, "not a proof file name"))
    }
}

fn not_found(reference: &str) -> Error {
    Error::ProofNotFound {
        reference: reference.to_string(),
    }
}

fn unreadable(reference: &str, message: &str) -> Error {
    Error::ProofUnreadable {
        reference: reference.to_string(),
        message: message.to_string(),
    }
}
