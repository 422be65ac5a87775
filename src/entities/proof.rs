//! Proof entity - Image bytes for proofs of transfer kept inside the database.
//!
//! Only used when proofs are configured for database storage.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored proof-of-transfer image
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "proofs")]
pub struct Model {
    /// Unique identifier, used as the proof reference
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Generated file name
    pub file_name: String,
    /// MIME type reported at upload
    pub content_type: Option<String>,
    /// Raw image bytes
    pub data: Vec<u8>,
    /// When the proof was uploaded
    pub created_at: DateTimeUtc,
}

/// Proofs have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
