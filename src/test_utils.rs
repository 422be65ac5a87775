//! Shared test utilities for the ledger.
//!
//! This module provides common helper functions for setting up test databases,
//! stores and services with a small fixed roster.

use crate::{
    config::{FieldOptions, database},
    core::{
        participant::{Caller, Participant, Roster},
        proof::{ProofStore, ProofUpload},
        service::LedgerService,
        store::LedgerStore,
    },
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = database::create_connection("sqlite::memory:").await?;
    database::create_tables(&db).await?;
    Ok(db)
}

/// Roster used throughout the tests.
///
/// * Alice - admin, Discord id `"100"`
/// * Bob - Discord id `"200"`
/// * Carol - Discord id `"300"`
#[must_use]
pub fn test_roster() -> Roster {
    Roster::new(vec![
        Participant::new("Alice").admin().with_discord_id("100"),
        Participant::new("Bob").with_discord_id("200"),
        Participant::new("Carol").with_discord_id("300"),
    ])
}

/// Store over a fresh in-memory database.
pub async fn setup_store() -> Result<LedgerStore> {
    let db = setup_test_db().await?;
    Ok(LedgerStore::new(db, test_roster()))
}

/// Service with database proof storage, all optional fields enabled and
/// proofs required for payments.
pub async fn setup_service() -> Result<LedgerService> {
    setup_custom_service(FieldOptions::default(), true).await
}

/// Service with custom field options and proof requirement.
pub async fn setup_custom_service(
    fields: FieldOptions,
    require_proof_for_payments: bool,
) -> Result<LedgerService> {
    let db = setup_test_db().await?;
    Ok(LedgerService::new(
        LedgerStore::new(db, test_roster()),
        ProofStore::Database,
        fields,
        require_proof_for_payments,
    ))
}

/// Caller identity for a roster member.
///
/// # Panics
/// Panics if `name` is not on the test roster.
#[must_use]
#[allow(clippy::expect_used)]
pub fn caller(name: &str) -> Caller {
    test_roster()
        .caller(name)
        .expect("caller must be on the test roster")
}

/// A small fake JPEG upload.
#[must_use]
pub fn jpeg_upload() -> ProofUpload {
    ProofUpload::new(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3], Some("image/jpeg".to_string()))
}
