//! Ledger accounting - pure derivations over a snapshot of transactions.
//!
//! Nothing in here touches storage. Summaries are recomputed from the full set
//! on every call; there is no caching or incremental bookkeeping. The expense
//! splitter divides with plain `f64` arithmetic and does not redistribute the
//! rounding remainder, so `share * n` may differ from the total by a few ulps.

use crate::{
    core::transaction::{Direction, NewTransaction, Transaction},
    errors::{Error, Result},
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Appended to the purpose of every per-participant share of an expense
pub const SHARE_SUFFIX: &str = " (share)";

/// Per-person rollup, derived and never persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonSummary {
    /// Participant name
    pub person: String,
    /// Sum of inflow amounts
    pub total_inflow: f64,
    /// Sum of outflow amounts
    pub total_outflow: f64,
    /// `total_inflow - total_outflow`
    pub net_balance: f64,
    /// Number of transactions in both directions
    pub transaction_count: usize,
}

impl PersonSummary {
    fn empty(person: &str) -> Self {
        Self {
            person: person.to_string(),
            total_inflow: 0.0,
            total_outflow: 0.0,
            net_balance: 0.0,
            transaction_count: 0,
        }
    }

    fn add(&mut self, transaction: &Transaction) {
        match transaction.direction {
            Direction::Inflow => self.total_inflow += transaction.amount,
            Direction::Outflow => self.total_outflow += transaction.amount,
        }
        self.net_balance = self.total_inflow - self.total_outflow;
        self.transaction_count += 1;
    }
}

/// Grand totals over a set of transactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LedgerTotals {
    /// Sum of all inflows
    pub total_inflow: f64,
    /// Sum of all outflows
    pub total_outflow: f64,
    /// `total_inflow - total_outflow`
    pub net_balance: f64,
}

/// Exact-match filter on person and direction. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryFilter {
    /// Only this person
    pub person: Option<String>,
    /// Only this direction
    pub direction: Option<Direction>,
}

impl SummaryFilter {
    /// Filter that matches every transaction.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts the filter to one person.
    #[must_use]
    pub fn for_person(mut self, person: impl Into<String>) -> Self {
        self.person = Some(person.into());
        self
    }

    /// Restricts the filter to one direction.
    #[must_use]
    pub const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// True if the transaction passes the filter.
    #[must_use]
    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.person
            .as_deref()
            .is_none_or(|person| transaction.person == person)
            && self
                .direction
                .is_none_or(|direction| transaction.direction == direction)
    }
}

/// Returns the transactions that pass `filter`, in input order.
#[must_use]
pub fn filter<'a>(transactions: &'a [Transaction], filter: &SummaryFilter) -> Vec<&'a Transaction> {
    transactions.iter().filter(|tx| filter.matches(tx)).collect()
}

/// Computes one [`PersonSummary`] per person present in the filtered set.
///
/// People without matching transactions are omitted, even if they are on the
/// roster. Rows come out in ascending name order so the result is reproducible;
/// display ranking is done by `report::rank`.
#[must_use]
pub fn summarize(transactions: &[Transaction], filter_by: &SummaryFilter) -> Vec<PersonSummary> {
    let mut rows: BTreeMap<&str, PersonSummary> = BTreeMap::new();
    for transaction in filter(transactions, filter_by) {
        rows.entry(transaction.person.as_str())
            .or_insert_with(|| PersonSummary::empty(&transaction.person))
            .add(transaction);
    }
    rows.into_values().collect()
}

/// Sums inflows and outflows over the filtered set.
#[must_use]
pub fn totals(transactions: &[Transaction], filter_by: &SummaryFilter) -> LedgerTotals {
    let mut totals = LedgerTotals::default();
    for transaction in filter(transactions, filter_by) {
        match transaction.direction {
            Direction::Inflow => totals.total_inflow += transaction.amount,
            Direction::Outflow => totals.total_outflow += transaction.amount,
        }
    }
    totals.net_balance = totals.total_inflow - totals.total_outflow;
    totals
}

/// True iff `amount` is a finite number greater than zero.
#[must_use]
pub fn validate_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}

/// Like [`validate_amount`], but fails with `InvalidAmount`.
pub fn ensure_valid_amount(amount: f64) -> Result<()> {
    if validate_amount(amount) {
        Ok(())
    } else {
        Err(Error::InvalidAmount { amount })
    }
}

/// A single expense paid on behalf of the group
#[derive(Debug, Clone, PartialEq)]
pub struct SharedExpense {
    /// Full amount to divide
    pub total_amount: f64,
    /// What the expense was for
    pub purpose: String,
    /// Optional note copied to every share
    pub note: Option<String>,
    /// Proof copied by reference to every share
    pub proof_reference: Option<String>,
}

impl SharedExpense {
    /// Creates an expense without note or proof.
    #[must_use]
    pub fn new(total_amount: f64, purpose: impl Into<String>) -> Self {
        Self {
            total_amount,
            purpose: purpose.into(),
            note: None,
            proof_reference: None,
        }
    }

    /// Attaches a note.
    #[must_use]
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    /// Attaches a proof reference.
    #[must_use]
    pub fn with_proof(mut self, proof_reference: Option<String>) -> Self {
        self.proof_reference = proof_reference;
        self
    }
}

/// Result of dividing a [`SharedExpense`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseSplit {
    /// `total_amount / participants`, without remainder correction
    pub share_amount: f64,
    /// One outflow draft per participant, in participant order
    pub drafts: Vec<NewTransaction>,
}

/// Divides an expense equally among `participants`.
///
/// # Errors
/// - `InvalidAmount` if the total is not a positive finite number
/// - `NoParticipants` if `participants` is empty
/// - `DuplicateParticipant` if a name appears twice
pub fn split_expense<S: AsRef<str>>(
    expense: &SharedExpense,
    participants: &[S],
) -> Result<ExpenseSplit> {
    ensure_valid_amount(expense.total_amount)?;
    if participants.is_empty() {
        return Err(Error::NoParticipants);
    }

    let mut seen = HashSet::new();
    for participant in participants {
        let name = participant.as_ref();
        if !seen.insert(name) {
            return Err(Error::DuplicateParticipant {
                name: name.to_string(),
            });
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let share_amount = expense.total_amount / participants.len() as f64;
    let purpose = format!("{}{SHARE_SUFFIX}", expense.purpose);

    let drafts = participants
        .iter()
        .map(|participant| {
            NewTransaction::outflow(participant.as_ref(), share_amount, purpose.clone())
                .with_note(expense.note.clone())
                .with_proof(expense.proof_reference.clone())
        })
        .collect();

    Ok(ExpenseSplit {
        share_amount,
        drafts,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn tx(id: i64, person: &str, amount: f64, direction: Direction) -> Transaction {
        Transaction {
            id,
            person: person.to_string(),
            amount,
            purpose: "test".to_string(),
            direction,
            note: None,
            timestamp: Utc::now(),
            proof_reference: None,
        }
    }

    fn row<'a>(rows: &'a [PersonSummary], person: &str) -> &'a PersonSummary {
        rows.iter().find(|r| r.person == person).unwrap()
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(0.01));
        assert!(validate_amount(300.0));
        assert!(!validate_amount(0.0));
        assert!(!validate_amount(-1.0));
        assert!(!validate_amount(f64::NAN));
        assert!(!validate_amount(f64::INFINITY));
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&[], &SummaryFilter::all()).is_empty());
        assert_eq!(totals(&[], &SummaryFilter::all()), LedgerTotals::default());
    }

    #[test]
    fn test_summarize_rolls_up_per_person() {
        let transactions = vec![
            tx(1, "Alice", 100.0, Direction::Inflow),
            tx(2, "Alice", 40.0, Direction::Outflow),
            tx(3, "Bob", 25.0, Direction::Inflow),
            tx(4, "Alice", 10.0, Direction::Inflow),
        ];

        let rows = summarize(&transactions, &SummaryFilter::all());
        assert_eq!(rows.len(), 2);

        let alice = row(&rows, "Alice");
        assert_eq!(alice.total_inflow, 110.0);
        assert_eq!(alice.total_outflow, 40.0);
        assert_eq!(alice.net_balance, 70.0);
        assert_eq!(alice.transaction_count, 3);

        let bob = row(&rows, "Bob");
        assert_eq!(bob.total_outflow, 0.0);
        assert_eq!(bob.net_balance, 25.0);
        assert_eq!(bob.transaction_count, 1);
    }

    #[test]
    fn test_summarize_direction_filter_omits_outflow_only_people() {
        let transactions = vec![
            tx(1, "Alice", 100.0, Direction::Inflow),
            tx(2, "Alice", 30.0, Direction::Outflow),
            tx(3, "Bob", 30.0, Direction::Outflow),
        ];

        let rows = summarize(
            &transactions,
            &SummaryFilter::all().with_direction(Direction::Inflow),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].person, "Alice");
        assert_eq!(rows[0].total_outflow, 0.0);
        assert_eq!(rows[0].transaction_count, 1);
    }

    #[test]
    fn test_summarize_person_filter() {
        let transactions = vec![
            tx(1, "Alice", 100.0, Direction::Inflow),
            tx(2, "Bob", 30.0, Direction::Outflow),
        ];

        let rows = summarize(&transactions, &SummaryFilter::all().for_person("Bob"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].person, "Bob");
        assert_eq!(rows[0].net_balance, -30.0);

        let none = summarize(&transactions, &SummaryFilter::all().for_person("Carol"));
        assert!(none.is_empty());
    }

    #[test]
    fn test_totals_follow_filter() {
        let transactions = vec![
            tx(1, "Alice", 100.0, Direction::Inflow),
            tx(2, "Alice", 30.0, Direction::Outflow),
            tx(3, "Bob", 20.0, Direction::Outflow),
        ];

        let all = totals(&transactions, &SummaryFilter::all());
        assert_eq!(all.total_inflow, 100.0);
        assert_eq!(all.total_outflow, 50.0);
        assert_eq!(all.net_balance, 50.0);

        let bob = totals(&transactions, &SummaryFilter::all().for_person("Bob"));
        assert_eq!(bob.total_inflow, 0.0);
        assert_eq!(bob.net_balance, -20.0);
    }

    #[test]
    fn test_split_expense_even() {
        let expense = SharedExpense::new(90.0, "Groceries")
            .with_note(Some("market".to_string()))
            .with_proof(Some("proof-1".to_string()));
        let split = split_expense(&expense, &["A", "B", "C"]).unwrap();

        assert_eq!(split.share_amount, 30.0);
        assert_eq!(split.drafts.len(), 3);
        for (draft, name) in split.drafts.iter().zip(["A", "B", "C"]) {
            assert_eq!(draft.person, name);
            assert_eq!(draft.amount, 30.0);
            assert_eq!(draft.direction, Direction::Outflow);
            assert_eq!(draft.purpose, "Groceries (share)");
            assert_eq!(draft.note.as_deref(), Some("market"));
            assert_eq!(draft.proof_reference.as_deref(), Some("proof-1"));
        }
    }

    #[test]
    fn test_split_expense_keeps_raw_quotient() {
        let split = split_expense(&SharedExpense::new(100.0, "Taxi"), &["A", "B", "C"]).unwrap();
        assert_eq!(split.share_amount, 100.0 / 3.0);
        assert!(split.drafts.iter().all(|d| d.amount == split.share_amount));
    }

    #[test]
    fn test_split_expense_validation() {
        let names = ["A", "B"];
        assert!(matches!(
            split_expense(&SharedExpense::new(0.0, "x"), &names),
            Err(Error::InvalidAmount { amount }) if amount == 0.0
        ));
        assert!(matches!(
            split_expense(&SharedExpense::new(-5.0, "x"), &names),
            Err(Error::InvalidAmount { .. })
        ));
        let nobody: [&str; 0] = [];
        assert!(matches!(
            split_expense(&SharedExpense::new(10.0, "x"), &nobody),
            Err(Error::NoParticipants)
        ));
        assert!(matches!(
            split_expense(&SharedExpense::new(10.0, "x"), &["A", "B", "A"]),
            Err(Error::DuplicateParticipant { name }) if name == "A"
        ));
    }

    #[test]
    fn test_three_friends_scenario() {
        assert!(!validate_amount(0.0)); // B's zero payment is rejected

        let split = split_expense(&SharedExpense::new(90.0, "Villa"), &["A", "B", "C"]).unwrap();
        assert_eq!(split.share_amount, 30.0);

        let mut transactions = vec![tx(1, "A", 300.0, Direction::Inflow)];
        for (i, draft) in split.drafts.into_iter().enumerate() {
            let id = i64::try_from(i).unwrap() + 2;
            transactions.push(tx(id, &draft.person, draft.amount, draft.direction));
        }

        let rows = summarize(&transactions, &SummaryFilter::all());
        assert_eq!(row(&rows, "A").net_balance, 270.0);
        assert_eq!(row(&rows, "B").net_balance, -30.0);
        assert_eq!(row(&rows, "C").net_balance, -30.0);
    }

    fn arb_transactions() -> impl Strategy<Value = Vec<Transaction>> {
        let names = ["A", "B", "C", "D"];
        prop::collection::vec((0usize..4, 0.01f64..10_000.0, any::<bool>()), 0..50).prop_map(
            move |entries| {
                entries
                    .into_iter()
                    .enumerate()
                    .map(|(i, (who, amount, inflow))| {
                        let direction = if inflow {
                            Direction::Inflow
                        } else {
                            Direction::Outflow
                        };
                        tx(i64::try_from(i).unwrap_or(0), names[who], amount, direction)
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: per-person net balances add up to total inflow minus total outflow.
        #[test]
        fn net_balances_sum_to_ledger_net(transactions in arb_transactions()) {
            let rows = summarize(&transactions, &SummaryFilter::all());
            let net: f64 = rows.iter().map(|r| r.net_balance).sum();
            let expected: f64 = transactions.iter().map(Transaction::signed_amount).sum();
            prop_assert!((net - expected).abs() < 1e-6);

            let count: usize = rows.iter().map(|r| r.transaction_count).sum();
            prop_assert_eq!(count, transactions.len());
        }

        /// Property: summarizing the same snapshot twice gives identical rows.
        #[test]
        fn summarize_is_idempotent(transactions in arb_transactions()) {
            let first = summarize(&transactions, &SummaryFilter::all());
            let second = summarize(&transactions, &SummaryFilter::all());
            prop_assert_eq!(first, second);
        }

        /// Property: n equal shares add back up to the total, within float tolerance.
        #[test]
        fn split_shares_add_up(total in 0.01f64..1_000_000.0, n in 1usize..12) {
            let names: Vec<String> = (0..n).map(|i| format!("P{i}")).collect();
            let split = split_expense(&SharedExpense::new(total, "x"), names.as_slice()).unwrap();

            prop_assert_eq!(split.drafts.len(), n);
            #[allow(clippy::cast_precision_loss)]
            let recombined = split.share_amount * n as f64;
            prop_assert!((recombined - total).abs() <= total * 1e-12);
            for draft in &split.drafts {
                prop_assert_eq!(draft.amount, split.share_amount);
                prop_assert_eq!(draft.direction, Direction::Outflow);
            }
        }
    }
}
