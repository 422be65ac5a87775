//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the ledger, including all
//! slash commands, autocomplete handlers, and bot context management. Commands
//! only translate between Discord and [`LedgerService`]; every rule lives in the
//! core.

/// Discord command implementations (transaction, report, general)
pub mod commands;
/// Framework setup and error handling
pub mod framework;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    core::{participant::Caller, service::LedgerService},
    errors::{Error, Result},
};

/// Shared data available to all bot commands.
pub struct BotData {
    /// The ledger, shared by every command invocation
    pub service: LedgerService,
    /// Currency label used when formatting amounts
    pub currency: String,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(service: LedgerService, currency: String) -> Self {
        Self { service, currency }
    }
}

/// Poise context used by every command
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Resolves the roster identity of the command author.
///
/// Returns `None` after telling the user, when their Discord account is not
/// bound to a participant.
pub async fn resolve_caller(ctx: Context<'_>) -> Result<Option<Caller>> {
    let discord_id = ctx.author().id.to_string();
    let caller = ctx.data().service.roster().caller_for_discord_id(&discord_id);
    if caller.is_none() {
        tracing::warn!(%discord_id, "Command from unregistered user");
        ctx.say("❌ Your Discord account is not on the participant list.")
            .await?;
    }
    Ok(caller)
}

pub use commands::*;
pub use framework::run_bot;
pub use handlers::*;
