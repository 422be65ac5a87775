//! Report Discord commands - `summary`, `history` and `proofs`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, DirectionChoice, handlers::autocomplete, resolve_caller},
        core::{
            accounting::SummaryFilter,
            report::{
                MESSAGE_LIMIT, format_report, format_transaction_details,
                format_transaction_line, paginate_lines,
            },
        },
        errors::Result,
    };
    use poise::{CreateReply, serenity_prelude as serenity};
    use tracing::warn;

    const DEFAULT_HISTORY_LIMIT: usize = 10;
    const MAX_HISTORY_LIMIT: usize = 50;
    const MAX_PROOFS_SHOWN: usize = 10;

    fn build_filter(person: Option<String>, direction: Option<DirectionChoice>) -> SummaryFilter {
        SummaryFilter {
            person,
            direction: direction.map(Into::into),
        }
    }

    /// Shows per-person totals and the net balance.
    ///
    /// Members always see their own summary.
    #[poise::command(slash_command, prefix_command)]
    pub async fn summary(
        ctx: Context<'_>,
        #[description = "Only this person"]
        #[autocomplete = "autocomplete::autocomplete_participant"]
        person: Option<String>,
        #[description = "Only inflows or only outflows"] direction: Option<DirectionChoice>,
    ) -> Result<()> {
        let Some(caller) = resolve_caller(ctx).await? else {
            return Ok(());
        };

        let data = ctx.data();
        let report = data
            .service
            .summary(&caller, build_filter(person, direction))
            .await?;
        ctx.say(format!(
            "📊 **Ledger summary**\n{}",
            format_report(&data.currency, &report)
        ))
        .await?;
        Ok(())
    }

    /// Lists recent transactions, newest first.
    #[poise::command(slash_command, prefix_command)]
    pub async fn history(
        ctx: Context<'_>,
        #[description = "How many transactions to show (max 50)"] limit: Option<u8>,
    ) -> Result<()> {
        let Some(caller) = resolve_caller(ctx).await? else {
            return Ok(());
        };

        let data = ctx.data();
        let limit = limit
            .map_or(DEFAULT_HISTORY_LIMIT, usize::from)
            .clamp(1, MAX_HISTORY_LIMIT);
        let transactions = data.service.history(&caller).await?;

        if transactions.is_empty() {
            ctx.say("No transactions yet.").await?;
            return Ok(());
        }

        let lines: Vec<String> = transactions
            .iter()
            .take(limit)
            .map(|tx| format_transaction_line(&data.currency, tx))
            .collect();
        let header = format!(
            "📜 **Last {} of {} transactions**",
            lines.len(),
            transactions.len()
        );
        for page in paginate_lines(&header, &lines, MESSAGE_LIMIT) {
            ctx.say(page).await?;
        }
        Ok(())
    }

    /// Shows proof-of-transfer images for matching transactions.
    #[poise::command(slash_command)]
    pub async fn proofs(
        ctx: Context<'_>,
        #[description = "Only this person"]
        #[autocomplete = "autocomplete::autocomplete_participant"]
        person: Option<String>,
        #[description = "Only inflows or only outflows"] direction: Option<DirectionChoice>,
    ) -> Result<()> {
        let Some(caller) = resolve_caller(ctx).await? else {
            return Ok(());
        };
        ctx.defer().await?;

        let data = ctx.data();
        let transactions = data
            .service
            .proofs(&caller, build_filter(person, direction))
            .await?;

        if transactions.is_empty() {
            ctx.say("No proofs found.").await?;
            return Ok(());
        }

        for tx in transactions.iter().take(MAX_PROOFS_SHOWN) {
            let details = format_transaction_details(&data.currency, tx);
            let Some(reference) = tx.proof_reference.as_deref() else {
                continue;
            };

            // A broken proof is reported inline so the rest still show
            let reply = match data.service.proof_image(reference).await {
                Ok(bytes) => CreateReply::default()
                    .content(details)
                    .attachment(serenity::CreateAttachment::bytes(
                        bytes,
                        format!("proof_{}.jpg", tx.id),
                    )),
                Err(e) => {
                    warn!(id = tx.id, reference, "Could not load proof: {}", e);
                    CreateReply::default().content(format!("{details}\n⚠️ {e}"))
                }
            };
            ctx.send(reply).await?;
        }

        if transactions.len() > MAX_PROOFS_SHOWN {
            ctx.say(format!(
                "…and {} more. Narrow the filter to see them.",
                transactions.len() - MAX_PROOFS_SHOWN
            ))
            .await?;
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
