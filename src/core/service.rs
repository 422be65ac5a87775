//! Ledger service - the single entry point used by the front end.
//!
//! The service combines the store, the roster, the proof store and the field
//! options, and enforces the capability gate:
//!
//! - non-admins may record their own payments and read reports about
//!   themselves
//! - admins may do everything, including shared expenses, edits and deletes
//!
//! Every input is validated before a proof is uploaded or a row is written.

use crate::{
    config::{Config, FieldOptions},
    core::{
        accounting::{self, SharedExpense, SummaryFilter},
        participant::{Caller, Roster},
        proof::{ProofStore, ProofUpload},
        report::{self, LedgerReport, RankMetric},
        store::LedgerStore,
        transaction::{NewTransaction, Transaction, TransactionUpdate},
    },
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use tracing::{info, instrument, warn};

/// Purpose recorded for payments when none is given
pub const PAYMENT_PURPOSE: &str = "Payment";
/// Purpose recorded for shared expenses when none is given
pub const EXPENSE_PURPOSE: &str = "Shared expense";

const PAYMENT_PROOF_PREFIX: &str = "payment_";
const EXPENSE_PROOF_PREFIX: &str = "expense_";

/// A payment into the pool
#[derive(Debug, Clone, Default)]
pub struct Payment {
    /// Who paid
    pub person: String,
    /// How much
    pub amount: f64,
    /// Custom purpose, ignored when purposes are disabled
    pub purpose: Option<String>,
    /// Optional note
    pub note: Option<String>,
    /// Proof of transfer
    pub proof: Option<ProofUpload>,
}

/// A shared expense to be split equally
#[derive(Debug, Clone, Default)]
pub struct ExpenseRequest {
    /// Full amount
    pub total_amount: f64,
    /// Custom purpose, ignored when purposes are disabled
    pub purpose: Option<String>,
    /// Optional note copied to every share
    pub note: Option<String>,
    /// Who shares the expense; the whole roster when `None`
    pub participants: Option<Vec<String>>,
    /// Proof stored once and referenced by every share
    pub proof: Option<ProofUpload>,
}

/// Outcome of recording a shared expense
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedExpense {
    /// Amount charged to each participant
    pub share_amount: f64,
    /// Ids of the per-participant transactions, in participant order
    pub ids: Vec<i64>,
    /// Participants the expense was split among
    pub participants: Vec<String>,
    /// Reference of the shared proof, if any
    pub proof_reference: Option<String>,
}

/// Front-end facing ledger operations
#[derive(Debug, Clone)]
pub struct LedgerService {
    store: LedgerStore,
    proofs: ProofStore,
    fields: FieldOptions,
    require_proof_for_payments: bool,
}

impl LedgerService {
    /// Assembles a service from its parts.
    #[must_use]
    pub const fn new(
        store: LedgerStore,
        proofs: ProofStore,
        fields: FieldOptions,
        require_proof_for_payments: bool,
    ) -> Self {
        Self {
            store,
            proofs,
            fields,
            require_proof_for_payments,
        }
    }

    /// Builds the service described by config.toml over an open connection.
    pub fn from_config(config: &Config, db: DatabaseConnection) -> Result<Self> {
        let proofs = ProofStore::from_config(&config.proofs)?;
        let roster = Roster::from_config(&config.participants);
        Ok(Self::new(
            LedgerStore::new(db, roster),
            proofs,
            config.fields,
            config.proofs.require_for_payments,
        ))
    }

    /// The roster of participants.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        self.store.roster()
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Applies the field options to a user-supplied purpose.
    fn purpose_or(&self, purpose: Option<String>, default: &str) -> String {
        purpose
            .filter(|p| self.fields.purpose && !p.trim().is_empty())
            .map_or_else(|| default.to_string(), |p| p.trim().to_string())
    }

    fn note(&self, note: Option<String>) -> Option<String> {
        note.filter(|_| self.fields.note)
    }

    /// Restricts a filter to the caller unless they are an admin.
    fn scope(caller: &Caller, filter: SummaryFilter) -> SummaryFilter {
        if caller.is_admin {
            filter
        } else {
            filter.for_person(caller.participant.clone())
        }
    }

    /// Records a payment (inflow) and returns the stored transaction.
    ///
    /// # Errors
    /// - `PermissionDenied` if a non-admin pays for someone else
    /// - `InvalidAmount`, `UnknownParticipant`, `ProofRequired`, `EmptyProof`
    ///   before anything is stored
    /// - `Database` / `Io` from storage
    #[instrument(skip(self, caller, payment), fields(caller = %caller.participant, person = %payment.person))]
    pub async fn record_payment(&self, caller: &Caller, payment: Payment) -> Result<Transaction> {
        if !caller.is_admin && !caller.is(&payment.person) {
            return Err(Error::permission_denied(
                "recording a payment for someone else",
            ));
        }
        accounting::ensure_valid_amount(payment.amount)?;
        self.roster().require(&payment.person)?;
        if payment.proof.is_none() && self.require_proof_for_payments {
            return Err(Error::ProofRequired);
        }

        let draft = NewTransaction::inflow(
            payment.person,
            payment.amount,
            self.purpose_or(payment.purpose, PAYMENT_PURPOSE),
        )
        .with_note(self.note(payment.note));

        let (ids, _) = self
            .write_with_proof(vec![draft], payment.proof, PAYMENT_PROOF_PREFIX)
            .await?;
        let id = ids
            .first()
            .copied()
            .ok_or(Error::Database(DbErr::RecordNotInserted))?;
        info!(id, "Recorded payment");
        self.store
            .get(id)
            .await?
            .ok_or(Error::TransactionNotFound { id })
    }

    /// Splits an expense equally and records one outflow per participant.
    ///
    /// The proof, if any, is stored once and shared by reference. All shares
    /// are written in a single database transaction.
    ///
    /// # Errors
    /// - `PermissionDenied` for non-admins
    /// - `InvalidAmount`, `NoParticipants`, `DuplicateParticipant`,
    ///   `UnknownParticipant`, `EmptyProof` before anything is stored
    /// - `Database` / `Io` from storage
    #[instrument(skip(self, caller, request), fields(caller = %caller.participant, total = request.total_amount))]
    pub async fn record_shared_expense(
        &self,
        caller: &Caller,
        request: ExpenseRequest,
    ) -> Result<RecordedExpense> {
        caller.ensure_admin("recording a shared expense")?;

        let participants = request
            .participants
            .unwrap_or_else(|| self.roster().names());
        for person in &participants {
            self.roster().require(person)?;
        }

        let expense = SharedExpense::new(
            request.total_amount,
            self.purpose_or(request.purpose, EXPENSE_PURPOSE),
        )
        .with_note(self.note(request.note));
        let split = accounting::split_expense(&expense, participants.as_slice())?;

        let (ids, proof_reference) = self
            .write_with_proof(split.drafts, request.proof, EXPENSE_PROOF_PREFIX)
            .await?;
        info!(share = split.share_amount, count = ids.len(), "Recorded shared expense");

        Ok(RecordedExpense {
            share_amount: split.share_amount,
            ids,
            participants,
            proof_reference,
        })
    }

    /// Stores the proof and the drafts that reference it as one unit.
    ///
    /// The proof row and the ledger rows share a database transaction. A proof
    /// file written before a failed insert is discarded.
    async fn write_with_proof(
        &self,
        mut drafts: Vec<NewTransaction>,
        proof: Option<ProofUpload>,
        prefix: &str,
    ) -> Result<(Vec<i64>, Option<String>)> {
        let txn = self.store.connection().begin().await?;

        let proof_reference = match proof {
            Some(upload) => Some(self.proofs.put(&txn, upload, prefix).await?),
            None => None,
        };
        for draft in &mut drafts {
            draft.proof_reference.clone_from(&proof_reference);
        }

        let written = match self.store.insert_all_in(&txn, drafts).await {
            Ok(ids) => txn.commit().await.map(|()| ids).map_err(Error::from),
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!("Rollback failed: {}", rollback);
                }
                Err(e)
            }
        };

        match written {
            Ok(ids) => Ok((ids, proof_reference)),
            Err(e) => {
                if let Some(reference) = &proof_reference {
                    self.proofs.discard(reference).await;
                }
                Err(e)
            }
        }
    }

    /// Overwrites fields of a transaction (admin only).
    #[instrument(skip(self, caller, update), fields(caller = %caller.participant))]
    pub async fn edit(
        &self,
        caller: &Caller,
        id: i64,
        mut update: TransactionUpdate,
    ) -> Result<Transaction> {
        caller.ensure_admin("editing transactions")?;
        if !self.fields.note {
            update.note = None;
        }
        if !self.fields.purpose {
            update.purpose = None;
        }
        self.store.update(id, update).await
    }

    /// Deletes a transaction (admin only). Returns whether anything was removed.
    #[instrument(skip(self, caller), fields(caller = %caller.participant))]
    pub async fn remove(&self, caller: &Caller, id: i64) -> Result<bool> {
        caller.ensure_admin("deleting transactions")?;
        self.store.delete(id).await
    }

    /// Transactions visible to the caller, newest first.
    pub async fn history(&self, caller: &Caller) -> Result<Vec<Transaction>> {
        let filter = Self::scope(caller, SummaryFilter::all());
        let all = self.store.list_all().await?;
        Ok(all.into_iter().filter(|tx| filter.matches(tx)).collect())
    }

    /// Per-person summary and totals, ranked for display.
    ///
    /// Non-admins always get a report about themselves, whatever person the
    /// filter names.
    pub async fn summary(&self, caller: &Caller, filter: SummaryFilter) -> Result<LedgerReport> {
        let filter = Self::scope(caller, filter);
        let all = self.store.list_all().await?;

        let mut rows = accounting::summarize(&all, &filter);
        report::rank(&mut rows, RankMetric::for_direction(filter.direction));
        let totals = accounting::totals(&all, &filter);

        Ok(LedgerReport {
            filter,
            rows,
            totals,
        })
    }

    /// Transactions in the caller's filtered view that carry a proof.
    pub async fn proofs(&self, caller: &Caller, filter: SummaryFilter) -> Result<Vec<Transaction>> {
        let filter = Self::scope(caller, filter);
        let all = self.store.list_all().await?;
        Ok(all
            .into_iter()
            .filter(|tx| filter.matches(tx) && tx.proof_reference.is_some())
            .collect())
    }

    /// Image bytes behind a proof reference.
    pub async fn proof_image(&self, reference: &str) -> Result<Vec<u8>> {
        self.proofs.resolve(self.store.connection(), reference).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::transaction::Direction;
    use crate::test_utils::*;
    use sea_orm::EntityTrait;

    fn payment(person: &str, amount: f64) -> Payment {
        Payment {
            person: person.to_string(),
            amount,
            proof: Some(jpeg_upload()),
            ..Payment::default()
        }
    }

    fn expense(total: f64) -> ExpenseRequest {
        ExpenseRequest {
            total_amount: total,
            ..ExpenseRequest::default()
        }
    }

    #[tokio::test]
    async fn test_record_payment() -> Result<()> {
        let service = setup_service().await?;

        let recorded = service
            .record_payment(
                &caller("Bob"),
                Payment {
                    note: Some("March".to_string()),
                    ..payment("Bob", 150.0)
                },
            )
            .await?;

        assert_eq!(recorded.person, "Bob");
        assert_eq!(recorded.amount, 150.0);
        assert_eq!(recorded.direction, Direction::Inflow);
        assert_eq!(recorded.purpose, PAYMENT_PURPOSE);
        assert_eq!(recorded.note.as_deref(), Some("March"));

        let reference = recorded.proof_reference.unwrap();
        assert_eq!(
            service.proof_image(&reference).await?,
            jpeg_upload().bytes
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_member_cannot_pay_for_others() -> Result<()> {
        let service = setup_service().await?;
        let result = service
            .record_payment(&caller("Bob"), payment("Carol", 10.0))
            .await;
        assert!(matches!(result, Err(Error::PermissionDenied { .. })));

        // Admins may record payments for anyone
        let recorded = service
            .record_payment(&caller("Alice"), payment("Carol", 10.0))
            .await?;
        assert_eq!(recorded.person, "Carol");
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_validation_happens_before_storage() -> Result<()> {
        let service = setup_service().await?;

        let zero = service
            .record_payment(&caller("Bob"), payment("Bob", 0.0))
            .await;
        assert!(matches!(zero, Err(Error::InvalidAmount { .. })));

        let no_proof = service
            .record_payment(
                &caller("Bob"),
                Payment {
                    proof: None,
                    ..payment("Bob", 10.0)
                },
            )
            .await;
        assert!(matches!(no_proof, Err(Error::ProofRequired)));

        assert!(service.history(&caller("Alice")).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_without_required_proof() -> Result<()> {
        let service = setup_custom_service(FieldOptions::default(), false).await?;
        let recorded = service
            .record_payment(
                &caller("Bob"),
                Payment {
                    proof: None,
                    ..payment("Bob", 10.0)
                },
            )
            .await?;
        assert_eq!(recorded.proof_reference, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_disabled_fields_are_dropped() -> Result<()> {
        let fields = FieldOptions {
            purpose: false,
            note: false,
        };
        let service = setup_custom_service(fields, true).await?;

        let recorded = service
            .record_payment(
                &caller("Bob"),
                Payment {
                    purpose: Some("Custom".to_string()),
                    note: Some("ignored".to_string()),
                    ..payment("Bob", 10.0)
                },
            )
            .await?;
        assert_eq!(recorded.purpose, PAYMENT_PURPOSE);
        assert_eq!(recorded.note, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_shared_expense_defaults_to_whole_roster() -> Result<()> {
        let service = setup_service().await?;
        let recorded = service
            .record_shared_expense(
                &caller("Alice"),
                ExpenseRequest {
                    purpose: Some("Villa".to_string()),
                    note: Some("two nights".to_string()),
                    proof: Some(jpeg_upload()),
                    ..expense(90.0)
                },
            )
            .await?;

        assert_eq!(recorded.share_amount, 30.0);
        assert_eq!(recorded.ids.len(), 3);
        assert_eq!(recorded.participants, vec!["Alice", "Bob", "Carol"]);

        let history = service.history(&caller("Alice")).await?;
        assert_eq!(history.len(), 3);
        for tx in &history {
            assert_eq!(tx.direction, Direction::Outflow);
            assert_eq!(tx.amount, 30.0);
            assert_eq!(tx.purpose, "Villa (share)");
            assert_eq!(tx.note.as_deref(), Some("two nights"));
            assert_eq!(tx.proof_reference, recorded.proof_reference);
        }

        // The proof is stored once
        let proofs = crate::entities::Proof::find().all(service.store().connection()).await?;
        assert_eq!(proofs.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_shared_expense_subset_and_validation() -> Result<()> {
        let service = setup_service().await?;
        let admin = caller("Alice");

        let recorded = service
            .record_shared_expense(
                &admin,
                ExpenseRequest {
                    participants: Some(vec!["Bob".to_string(), "Carol".to_string()]),
                    ..expense(50.0)
                },
            )
            .await?;
        assert_eq!(recorded.share_amount, 25.0);
        assert_eq!(recorded.proof_reference, None);

        let denied = service
            .record_shared_expense(&caller("Bob"), expense(50.0))
            .await;
        assert!(matches!(denied, Err(Error::PermissionDenied { .. })));

        let zero = service.record_shared_expense(&admin, expense(0.0)).await;
        assert!(matches!(zero, Err(Error::InvalidAmount { .. })));

        let empty = service
            .record_shared_expense(
                &admin,
                ExpenseRequest {
                    participants: Some(Vec::new()),
                    ..expense(10.0)
                },
            )
            .await;
        assert!(matches!(empty, Err(Error::NoParticipants)));

        let stranger = service
            .record_shared_expense(
                &admin,
                ExpenseRequest {
                    participants: Some(vec!["Mallory".to_string()]),
                    ..expense(10.0)
                },
            )
            .await;
        assert!(matches!(stranger, Err(Error::UnknownParticipant { .. })));

        assert_eq!(service.history(&admin).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_and_remove_are_admin_only() -> Result<()> {
        let service = setup_service().await?;
        let tx = service
            .record_payment(&caller("Bob"), payment("Bob", 10.0))
            .await?;

        let update = TransactionUpdate {
            amount: Some(20.0),
            ..TransactionUpdate::default()
        };
        let denied = service.edit(&caller("Bob"), tx.id, update.clone()).await;
        assert!(matches!(denied, Err(Error::PermissionDenied { .. })));
        let denied = service.remove(&caller("Bob"), tx.id).await;
        assert!(matches!(denied, Err(Error::PermissionDenied { .. })));

        let edited = service.edit(&caller("Alice"), tx.id, update).await?;
        assert_eq!(edited.amount, 20.0);

        assert!(service.remove(&caller("Alice"), tx.id).await?);
        assert!(!service.remove(&caller("Alice"), tx.id).await?);

        let missing = service
            .edit(&caller("Alice"), tx.id, TransactionUpdate::default())
            .await;
        assert!(matches!(missing, Err(Error::TransactionNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_history_is_scoped_for_members() -> Result<()> {
        let service = setup_service().await?;
        service
            .record_payment(&caller("Bob"), payment("Bob", 10.0))
            .await?;
        service
            .record_payment(&caller("Carol"), payment("Carol", 20.0))
            .await?;

        let own = service.history(&caller("Bob")).await?;
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].person, "Bob");

        assert_eq!(service.history(&caller("Alice")).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_three_friends_summary() -> Result<()> {
        let service = setup_custom_service(FieldOptions::default(), false).await?;
        let admin = caller("Alice");

        service
            .record_payment(&admin, payment("Alice", 300.0))
            .await?;
        let rejected = service
            .record_payment(&admin, payment("Bob", 0.0))
            .await;
        assert!(rejected.unwrap_err().is_validation());
        service
            .record_shared_expense(&admin, expense(90.0))
            .await?;

        let report = service.summary(&admin, SummaryFilter::all()).await?;
        let balances: Vec<(&str, f64)> = report
            .rows
            .iter()
            .map(|r| (r.person.as_str(), r.net_balance))
            .collect();
        assert_eq!(
            balances,
            vec![("Alice", 270.0), ("Bob", -30.0), ("Carol", -30.0)]
        );
        assert_eq!(report.totals.total_inflow, 300.0);
        assert_eq!(report.totals.total_outflow, 90.0);
        assert_eq!(report.totals.net_balance, 210.0);

        let inflows = service
            .summary(&admin, SummaryFilter::all().with_direction(Direction::Inflow))
            .await?;
        assert_eq!(inflows.rows.len(), 1);
        assert_eq!(inflows.rows[0].person, "Alice");
        Ok(())
    }

    #[tokio::test]
    async fn test_member_summary_is_scoped_to_themselves() -> Result<()> {
        let service = setup_service().await?;
        service
            .record_payment(&caller("Alice"), payment("Alice", 100.0))
            .await?;
        service
            .record_payment(&caller("Bob"), payment("Bob", 40.0))
            .await?;

        let report = service
            .summary(&caller("Bob"), SummaryFilter::all().for_person("Alice"))
            .await?;
        assert_eq!(report.filter.person.as_deref(), Some("Bob"));
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].person, "Bob");
        assert_eq!(report.totals.total_inflow, 40.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_proofs_listing() -> Result<()> {
        let service = setup_custom_service(FieldOptions::default(), false).await?;
        let admin = caller("Alice");
        service
            .record_payment(&admin, payment("Bob", 10.0))
            .await?;
        service
            .record_payment(
                &admin,
                Payment {
                    proof: None,
                    ..payment("Carol", 10.0)
                },
            )
            .await?;

        let with_proof = service.proofs(&admin, SummaryFilter::all()).await?;
        assert_eq!(with_proof.len(), 1);
        assert_eq!(with_proof[0].person, "Bob");

        let carol_view = service.proofs(&caller("Carol"), SummaryFilter::all()).await?;
        assert!(carol_view.is_empty());
        Ok(())
    }

    async fn drop_transactions_table(service: &LedgerService) -> Result<()> {
        use sea_orm::ConnectionTrait;
        service
            .store()
            .connection()
            .execute_unprepared("DROP TABLE transactions")
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_expense_leaves_no_proof_behind() -> Result<()> {
        let service = setup_service().await?;
        drop_transactions_table(&service).await?;

        let result = service
            .record_shared_expense(
                &caller("Alice"),
                ExpenseRequest {
                    proof: Some(jpeg_upload()),
                    ..expense(90.0)
                },
            )
            .await;
        assert_eq!(
            result.unwrap_err().kind(),
            crate::errors::ErrorKind::Storage
        );

        let proofs = crate::entities::Proof::find().all(service.store().connection()).await?;
        assert!(proofs.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_payment_discards_proof_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let service = LedgerService::new(
            LedgerStore::new(setup_test_db().await?, test_roster()),
            ProofStore::Filesystem(dir.path().to_path_buf()),
            FieldOptions::default(),
            true,
        );
        drop_transactions_table(&service).await?;

        let result = service
            .record_payment(&caller("Bob"), payment("Bob", 25.0))
            .await;
        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_proof_on_filesystem() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let service = LedgerService::new(
            LedgerStore::new(setup_test_db().await?, test_roster()),
            ProofStore::Filesystem(dir.path().to_path_buf()),
            FieldOptions::default(),
            true,
        );

        let recorded = service
            .record_payment(&caller("Bob"), payment("Bob", 25.0))
            .await?;
        let reference = recorded.proof_reference.unwrap();
        assert!(dir.path().join(&reference).exists());
        assert_eq!(service.proof_image(&reference).await?, jpeg_upload().bytes);
        Ok(())
    }
}
