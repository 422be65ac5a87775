//! Ledger store - durable persistence of transactions.
//!
//! The store wraps the process-wide database connection, which is created by the
//! entry point and passed in explicitly. It assigns ids and timestamps on insert,
//! lists records newest first, and supports partial updates and hard deletes.
//! Rows are normalized into [`Transaction`] values on the way out, using the
//! roster to map unknown people to `"Unknown"`.
//!
//! Writes are checked before anything is sent to the database: amounts must be
//! positive and people must be on the roster. Concurrent edits to the same row
//! are last-write-wins.

use crate::{
    core::{
        accounting::ensure_valid_amount,
        participant::Roster,
        transaction::{NewTransaction, Transaction, TransactionUpdate},
    },
    entities::{Transaction as TransactionEntity, transaction},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument};

/// Persistence for ledger transactions
#[derive(Debug, Clone)]
pub struct LedgerStore {
    db: DatabaseConnection,
    roster: Roster,
}

impl LedgerStore {
    /// Creates a store over an open connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection, roster: Roster) -> Self {
        Self { db, roster }
    }

    /// The roster used to validate writes and normalize reads.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn check_draft(&self, draft: &NewTransaction) -> Result<()> {
        ensure_valid_amount(draft.amount)?;
        self.roster.require(&draft.person)?;
        Ok(())
    }

    async fn insert_with<C>(db: &C, draft: NewTransaction) -> Result<i64>
    where
        C: ConnectionTrait,
    {
        let model = transaction::ActiveModel {
            person: Set(Some(draft.person)),
            amount: Set(draft.amount),
            purpose: Set(Some(draft.purpose)),
            direction: Set(Some(draft.direction.as_str().to_string())),
            note: Set(draft.note),
            timestamp: Set(draft.timestamp.unwrap_or_else(Utc::now)),
            proof_reference: Set(draft.proof_reference),
            ..Default::default()
        };

        let inserted = model.insert(db).await?;
        Ok(inserted.id)
    }

    /// Persists a new transaction and returns its id.
    ///
    /// The timestamp is set to the current time unless the draft pins one.
    ///
    /// # Errors
    /// - `InvalidAmount` / `UnknownParticipant` before anything is written
    /// - `Database` if the insert fails
    #[instrument(skip(self, draft), fields(person = %draft.person, direction = %draft.direction))]
    pub async fn insert(&self, draft: NewTransaction) -> Result<i64> {
        self.check_draft(&draft)?;
        let id = Self::insert_with(&self.db, draft).await?;
        debug!(id, "Inserted transaction");
        Ok(id)
    }

    /// Persists several transactions in one database transaction.
    ///
    /// Either every draft is stored or none is. Ids are returned in draft order.
    #[instrument(skip(self, drafts), fields(count = drafts.len()))]
    pub async fn insert_all(&self, drafts: Vec<NewTransaction>) -> Result<Vec<i64>> {
        let txn = self.db.begin().await?;
        let ids = self.insert_all_in(&txn, drafts).await?;
        txn.commit().await?;
        Ok(ids)
    }

    /// Persists drafts through a connection the caller controls, usually an
    /// open transaction that also carries other writes.
    ///
    /// Every draft is checked before the first insert. Committing is up to the
    /// caller.
    pub async fn insert_all_in<C>(&self, db: &C, drafts: Vec<NewTransaction>) -> Result<Vec<i64>>
    where
        C: ConnectionTrait,
    {
        for draft in &drafts {
            self.check_draft(draft)?;
        }

        let mut ids = Vec::with_capacity(drafts.len());
        for draft in drafts {
            ids.push(Self::insert_with(db, draft).await?);
        }

        info!(?ids, "Inserted transactions");
        Ok(ids)
    }

    /// Looks up a transaction by id.
    pub async fn get(&self, id: i64) -> Result<Option<Transaction>> {
        let model = TransactionEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(|m| Transaction::from_model(m, &self.roster)))
    }

    /// Returns every transaction, newest first.
    ///
    /// Equal timestamps are ordered by id, newest insert first, so the order is
    /// deterministic.
    pub async fn list_all(&self) -> Result<Vec<Transaction>> {
        let models = TransactionEntity::find()
            .order_by_desc(transaction::Column::Timestamp)
            .order_by_desc(transaction::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .map(|m| Transaction::from_model(m, &self.roster))
            .collect())
    }

    /// Overwrites the supplied fields of an existing transaction.
    ///
    /// The id never changes; the timestamp only changes when `update.timestamp`
    /// is set.
    ///
    /// # Errors
    /// - `TransactionNotFound` if no transaction has this id
    /// - `InvalidAmount` / `UnknownParticipant` for invalid new values
    /// - `Database` if the update fails
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: i64, update: TransactionUpdate) -> Result<Transaction> {
        if let Some(amount) = update.amount {
            ensure_valid_amount(amount)?;
        }
        if let Some(person) = &update.person {
            self.roster.require(person)?;
        }

        let existing = TransactionEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(Error::TransactionNotFound { id })?;

        if update.is_empty() {
            return Ok(Transaction::from_model(existing, &self.roster));
        }

        let mut active: transaction::ActiveModel = existing.into();
        if let Some(person) = update.person {
            active.person = Set(Some(person));
        }
        if let Some(amount) = update.amount {
            active.amount = Set(amount);
        }
        if let Some(purpose) = update.purpose {
            active.purpose = Set(Some(purpose));
        }
        if let Some(direction) = update.direction {
            active.direction = Set(Some(direction.as_str().to_string()));
        }
        if let Some(note) = update.note {
            active.note = Set(note);
        }
        if let Some(proof_reference) = update.proof_reference {
            active.proof_reference = Set(proof_reference);
        }
        if let Some(timestamp) = update.timestamp {
            active.timestamp = Set(timestamp);
        }

        let updated = active.update(&self.db).await?;
        info!(id, "Updated transaction");
        Ok(Transaction::from_model(updated, &self.roster))
    }

    /// Permanently removes a transaction.
    ///
    /// Returns `false` if there was nothing to delete; that is not an error.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = TransactionEntity::delete_by_id(id).exec(&self.db).await?;
        let removed = result.rows_affected > 0;
        if removed {
            info!(id, "Deleted transaction");
        } else {
            debug!(id, "Nothing to delete");
        }
        Ok(removed)
    }
}
