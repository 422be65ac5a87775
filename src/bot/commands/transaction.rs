//! Transaction Discord commands - `pay`, `expense`, `edit` and `delete`.
//!
//! These commands download any attached proof, build a request for the ledger
//! service and report the outcome. Validation and permission errors come back
//! from the service and are shown to the user by the framework error handler.

use crate::{core::proof::ProofUpload, errors::Result};
use poise::serenity_prelude as serenity;

/// Splits a comma-separated participant list, dropping blank entries.
#[must_use]
pub fn parse_participant_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Downloads an optional Discord attachment into a proof upload.
async fn download_proof(attachment: Option<serenity::Attachment>) -> Result<Option<ProofUpload>> {
    match attachment {
        Some(attachment) => {
            let bytes = attachment.download().await?;
            Ok(Some(ProofUpload::new(bytes, attachment.content_type)))
        }
        None => Ok(None),
    }
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{download_proof, parse_participant_list};
    use crate::{
        bot::{Context, DirectionChoice, handlers::autocomplete, resolve_caller},
        core::{
            report::{format_amount, format_transaction_line},
            service::{ExpenseRequest, Payment},
            transaction::TransactionUpdate,
        },
        errors::Result,
    };
    use poise::serenity_prelude as serenity;

    /// Records a payment into the shared pool.
    ///
    /// Members pay for themselves; admins may name another participant.
    #[poise::command(slash_command)]
    pub async fn pay(
        ctx: Context<'_>,
        #[description = "Amount paid"] amount: f64,
        #[description = "Proof of transfer"] proof: Option<serenity::Attachment>,
        #[description = "Who paid (admins only, defaults to you)"]
        #[autocomplete = "autocomplete::autocomplete_participant"]
        person: Option<String>,
        #[description = "What the payment was for"] purpose: Option<String>,
        #[description = "Optional note"] note: Option<String>,
    ) -> Result<()> {
        let Some(caller) = resolve_caller(ctx).await? else {
            return Ok(());
        };
        ctx.defer().await?;

        let payment = Payment {
            person: person.unwrap_or_else(|| caller.participant.clone()),
            amount,
            purpose,
            note,
            proof: download_proof(proof).await?,
        };

        let data = ctx.data();
        let recorded = data.service.record_payment(&caller, payment).await?;
        ctx.say(format!(
            "✅ Recorded {}",
            format_transaction_line(&data.currency, &recorded)
        ))
        .await?;
        Ok(())
    }

    /// Splits an expense equally among participants (admin only).
    #[poise::command(slash_command)]
    pub async fn expense(
        ctx: Context<'_>,
        #[description = "Total amount spent"] amount: f64,
        #[description = "What the money was spent on"] purpose: Option<String>,
        #[description = "Comma-separated names (defaults to everyone)"]
        participants: Option<String>,
        #[description = "Proof of purchase"] proof: Option<serenity::Attachment>,
        #[description = "Optional note"] note: Option<String>,
    ) -> Result<()> {
        let Some(caller) = resolve_caller(ctx).await? else {
            return Ok(());
        };
        ctx.defer().await?;

        let request = ExpenseRequest {
            total_amount: amount,
            purpose,
            note,
            participants: participants.as_deref().map(parse_participant_list),
            proof: download_proof(proof).await?,
        };

        let data = ctx.data();
        let recorded = data
            .service
            .record_shared_expense(&caller, request)
            .await?;
        ctx.say(format!(
            "✅ Split {} among {} ({} each). Transaction IDs: {:?}",
            format_amount(&data.currency, amount),
            recorded.participants.join(", "),
            format_amount(&data.currency, recorded.share_amount),
            recorded.ids
        ))
        .await?;
        Ok(())
    }

    /// Changes fields of a transaction (admin only).
    #[poise::command(slash_command)]
    pub async fn edit(
        ctx: Context<'_>,
        #[description = "Transaction ID"] id: i64,
        #[description = "New person"]
        #[autocomplete = "autocomplete::autocomplete_participant"]
        person: Option<String>,
        #[description = "New amount"] amount: Option<f64>,
        #[description = "New direction"] direction: Option<DirectionChoice>,
        #[description = "New purpose"] purpose: Option<String>,
        #[description = "New note (a single '-' clears it)"] note: Option<String>,
    ) -> Result<()> {
        let Some(caller) = resolve_caller(ctx).await? else {
            return Ok(());
        };

        let update = TransactionUpdate {
            person,
            amount,
            purpose,
            direction: direction.map(Into::into),
            note: note.map(|n| if n.trim() == "-" { None } else { Some(n) }),
            ..TransactionUpdate::default()
        };

        let data = ctx.data();
        let updated = data.service.edit(&caller, id, update).await?;
        ctx.say(format!(
            "✅ Updated {}",
            format_transaction_line(&data.currency, &updated)
        ))
        .await?;
        Ok(())
    }

    /// Permanently removes a transaction (admin only).
    #[poise::command(slash_command)]
    pub async fn delete(
        ctx: Context<'_>,
        #[description = "Transaction ID"] id: i64,
    ) -> Result<()> {
        let Some(caller) = resolve_caller(ctx).await? else {
            return Ok(());
        };

        if ctx.data().service.remove(&caller, id).await? {
            ctx.say(format!("🗑️ Deleted transaction #{id}")).await?;
        } else {
            ctx.say(format!("Transaction #{id} does not exist.")).await?;
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
