//! Transaction entity - One row per ledger entry.
//!
//! `person` and `direction` are nullable and stored as free text so that rows
//! written by older tools still load; they are normalized into typed values by
//! `core::transaction` when read. `proof_reference` is an opaque key understood
//! only by the proof store.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Participant the entry belongs to
    pub person: Option<String>,
    /// Amount of money, always non-negative
    pub amount: f64,
    /// What the money was for
    pub purpose: Option<String>,
    /// `"inflow"` or `"outflow"`
    pub direction: Option<String>,
    /// Optional free-text note
    pub note: Option<String>,
    /// When the transaction was recorded
    pub timestamp: DateTimeUtc,
    /// Key of the proof-of-transfer image, if any
    pub proof_reference: Option<String>,
}

/// Transactions reference proofs by opaque key only, so there are no relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
