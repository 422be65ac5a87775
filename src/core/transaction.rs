//! Transaction records - the typed view of a ledger row.
//!
//! Rows in the `transactions` table are loosely typed: older rows may lack a
//! person or direction, or carry values that are no longer valid. Every row is
//! normalized exactly once, in [`Transaction::from_model`], when it crosses the
//! store boundary. Everything above the store works with the typed record only.

use crate::{core::participant::Roster, entities::transaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Whether money came into the shared pool or was spent from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// A payment from a participant into the pool
    Inflow,
    /// Money spent on behalf of the group, charged to a participant
    Outflow,
}

impl Direction {
    /// Stored representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inflow => "inflow",
            Self::Outflow => "outflow",
        }
    }

    /// Parses the stored representation, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inflow" => Some(Self::Inflow),
            "outflow" => Some(Self::Outflow),
            _ => None,
        }
    }

    /// Reads a stored value, treating anything unrecognised as an inflow.
    #[must_use]
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or(Self::Inflow)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned identifier
    pub id: i64,
    /// Roster name, or `"Unknown"` for unrecognised stored values
    pub person: String,
    /// Non-negative amount
    pub amount: f64,
    /// What the money was for
    pub purpose: String,
    /// Sign of the entry in balance math
    pub direction: Direction,
    /// Optional free-text note
    pub note: Option<String>,
    /// Insert time, the default sort key
    pub timestamp: DateTime<Utc>,
    /// Opaque proof key, carried through untouched
    pub proof_reference: Option<String>,
}

impl Transaction {
    /// Converts a stored row into a typed record.
    ///
    /// Normalization rules:
    /// - missing or unrecognised `person` becomes `"Unknown"`
    /// - missing or unrecognised `direction` becomes `inflow`
    /// - a non-finite or negative `amount` becomes `0`
    /// - a missing `purpose` becomes the empty string
    /// - blank `note` and `proof_reference` become `None`
    #[must_use]
    pub fn from_model(model: transaction::Model, roster: &Roster) -> Self {
        let amount = if model.amount.is_finite() && model.amount >= 0.0 {
            model.amount
        } else {
            warn!(
                id = model.id,
                amount = model.amount,
                "Stored amount is invalid, reading as 0"
            );
            0.0
        };

        Self {
            id: model.id,
            person: roster.normalize(model.person.as_deref()),
            amount,
            purpose: model.purpose.unwrap_or_default(),
            direction: Direction::from_stored(model.direction.as_deref()),
            note: non_blank(model.note),
            timestamp: model.timestamp,
            proof_reference: non_blank(model.proof_reference),
        }
    }

    /// Amount with the sign of its direction applied.
    #[must_use]
    pub fn signed_amount(&self) -> f64 {
        match self.direction {
            Direction::Inflow => self.amount,
            Direction::Outflow => -self.amount,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A transaction that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Roster name
    pub person: String,
    /// Amount, must be greater than zero
    pub amount: f64,
    /// What the money was for
    pub purpose: String,
    /// Inflow or outflow
    pub direction: Direction,
    /// Optional note
    pub note: Option<String>,
    /// Optional proof key
    pub proof_reference: Option<String>,
    /// Explicit timestamp; the store uses the current time when `None`
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewTransaction {
    /// Draft for a payment into the pool.
    #[must_use]
    pub fn inflow(person: impl Into<String>, amount: f64, purpose: impl Into<String>) -> Self {
        Self::new(person, amount, purpose, Direction::Inflow)
    }

    /// Draft for money spent on behalf of the group.
    #[must_use]
    pub fn outflow(person: impl Into<String>, amount: f64, purpose: impl Into<String>) -> Self {
        Self::new(person, amount, purpose, Direction::Outflow)
    }

    fn new(
        person: impl Into<String>,
        amount: f64,
        purpose: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            person: person.into(),
            amount,
            purpose: purpose.into(),
            direction,
            note: None,
            proof_reference: None,
            timestamp: None,
        }
    }

    /// Attaches a note.
    #[must_use]
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = non_blank(note);
        self
    }

    /// Attaches a proof reference.
    #[must_use]
    pub fn with_proof(mut self, proof_reference: Option<String>) -> Self {
        self.proof_reference = proof_reference;
        self
    }

    /// Pins the timestamp instead of letting the store assign it.
    #[must_use]
    pub const fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Partial overwrite of a stored transaction. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    /// New person
    pub person: Option<String>,
    /// New amount, must be greater than zero
    pub amount: Option<f64>,
    /// New purpose
    pub purpose: Option<String>,
    /// New direction
    pub direction: Option<Direction>,
    /// New note; `Some(None)` clears it
    pub note: Option<Option<String>>,
    /// New proof reference; `Some(None)` clears it
    pub proof_reference: Option<Option<String>>,
    /// New timestamp; only changed when explicitly supplied
    pub timestamp: Option<DateTime<Utc>>,
}

impl TransactionUpdate {
    /// True if no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.person.is_none()
            && self.amount.is_none()
            && self.purpose.is_none()
            && self.direction.is_none()
            && self.note.is_none()
            && self.proof_reference.is_none()
            && self.timestamp.is_none()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::participant::{Participant, UNKNOWN_PARTICIPANT};

    fn roster() -> Roster {
        Roster::new(vec![Participant::new("Alice"), Participant::new("Bob")])
    }

    fn model() -> transaction::Model {
        transaction::Model {
            id: 1,
            person: Some("Alice".to_string()),
            amount: 50.0,
            purpose: Some("Payment".to_string()),
            direction: Some("outflow".to_string()),
            note: Some("dinner".to_string()),
            timestamp: Utc::now(),
            proof_reference: Some("12".to_string()),
        }
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("inflow"), Some(Direction::Inflow));
        assert_eq!(Direction::parse(" OUTFLOW "), Some(Direction::Outflow));
        assert_eq!(Direction::parse("sideways"), None);
    }

    #[test]
    fn test_direction_defaults_to_inflow() {
        assert_eq!(Direction::from_stored(None), Direction::Inflow);
        assert_eq!(Direction::from_stored(Some("???")), Direction::Inflow);
        assert_eq!(Direction::from_stored(Some("outflow")), Direction::Outflow);
    }

    #[test]
    fn test_from_model_keeps_valid_fields() {
        let stored = model();
        let tx = Transaction::from_model(stored.clone(), &roster());
        assert_eq!(tx.id, 1);
        assert_eq!(tx.person, "Alice");
        assert_eq!(tx.amount, 50.0);
        assert_eq!(tx.purpose, "Payment");
        assert_eq!(tx.direction, Direction::Outflow);
        assert_eq!(tx.note.as_deref(), Some("dinner"));
        assert_eq!(tx.timestamp, stored.timestamp);
        assert_eq!(tx.proof_reference.as_deref(), Some("12"));
        assert_eq!(tx.signed_amount(), -50.0);
    }

    #[test]
    fn test_from_model_normalizes_legacy_rows() {
        let legacy = transaction::Model {
            person: None,
            direction: None,
            purpose: None,
            note: Some("   ".to_string()),
            proof_reference: Some(String::new()),
            amount: f64::NAN,
            ..model()
        };

        let tx = Transaction::from_model(legacy, &roster());
        assert_eq!(tx.person, UNKNOWN_PARTICIPANT);
        assert_eq!(tx.direction, Direction::Inflow);
        assert_eq!(tx.purpose, "");
        assert_eq!(tx.note, None);
        assert_eq!(tx.proof_reference, None);
        assert_eq!(tx.amount, 0.0);
    }

    #[test]
    fn test_from_model_unknown_person() {
        let stranger = transaction::Model {
            person: Some("Mallory".to_string()),
            ..model()
        };
        let tx = Transaction::from_model(stranger, &roster());
        assert_eq!(tx.person, UNKNOWN_PARTICIPANT);
    }

    #[test]
    fn test_update_is_empty() {
        assert!(TransactionUpdate::default().is_empty());
        let update = TransactionUpdate {
            note: Some(None),
            ..TransactionUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
