//! Unified error type for the ledger.
//!
//! Every fallible operation in the crate returns [`Result`]. Validation errors are
//! raised by the accounting layer before storage is touched; database errors are
//! propagated unchanged from `SeaORM`.

use thiserror::Error;

/// Broad classification of an [`Error`], used by callers that only care about
/// the category of a failure (e.g. "was this the user's fault?").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input was rejected before reaching storage
    Validation,
    /// A referenced record or proof does not exist
    NotFound,
    /// The caller is not allowed to perform the operation
    Forbidden,
    /// The underlying database failed
    Storage,
    /// A proof exists but could not be read
    Unreadable,
    /// Configuration is missing or invalid
    Config,
    /// Environment or local I/O problem
    Environment,
    /// The Discord framework failed
    Framework,
}

/// All errors produced by the ledger.
#[derive(Debug, Error)]
pub enum Error {
    /// Amount is zero, negative, or not a finite number
    #[error("Invalid amount: {amount} (must be greater than zero)")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A shared expense was split among nobody
    #[error("A shared expense needs at least one participant")]
    NoParticipants,

    /// The same participant appears twice in a split
    #[error("Participant '{name}' is listed more than once")]
    DuplicateParticipant {
        /// The repeated participant name
        name: String,
    },

    /// A write referenced someone who is not on the roster
    #[error("Unknown participant: {name}")]
    UnknownParticipant {
        /// The name that was not found
        name: String,
    },

    /// A payment was submitted without the required proof of transfer
    #[error("A proof of transfer is required for payments")]
    ProofRequired,

    /// An uploaded proof contained no data
    #[error("Uploaded proof is empty")]
    EmptyProof,

    /// The caller lacks the capability for an operation
    #[error("Permission denied: {action}")]
    PermissionDenied {
        /// Description of the refused action
        action: String,
    },

    /// No transaction exists with this id
    #[error("Transaction not found: {id}")]
    TransactionNotFound {
        /// The missing transaction id
        id: i64,
    },

    /// No proof exists for this reference
    #[error("Proof not found: {reference}")]
    ProofNotFound {
        /// The reference that did not resolve
        reference: String,
    },

    /// A proof reference is malformed or its object is corrupt
    #[error("Proof '{reference}' could not be read: {message}")]
    ProofUnreadable {
        /// The offending reference
        reference: String,
        /// What went wrong
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Local I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise framework error
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount { .. }
            | Self::NoParticipants
            | Self::DuplicateParticipant { .. }
            | Self::UnknownParticipant { .. }
            | Self::ProofRequired
            | Self::EmptyProof => ErrorKind::Validation,
            Self::TransactionNotFound { .. } | Self::ProofNotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::Forbidden,
            Self::Database(_) => ErrorKind::Storage,
            Self::ProofUnreadable { .. } => ErrorKind::Unreadable,
            Self::Config { .. } => ErrorKind::Config,
            Self::Io(_) | Self::EnvVar(_) => ErrorKind::Environment,
            Self::Framework(_) => ErrorKind::Framework,
        }
    }

    /// True if the input was rejected before reaching storage.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation)
    }

    pub(crate) fn permission_denied(action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            action: action.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
