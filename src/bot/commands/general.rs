//! General Discord commands - ping and help.
//! These commands don't touch the ledger.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::Context,
        errors::Result,
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let help_text = "**LedgerBuddy Help**\n\
        Here is a summary of all available commands.\n\n\
        **Recording**\n\
        • `/pay <amount> [proof] [person] [purpose] [note]` - Records a payment into the pool.\n\
        • `/expense <amount> [purpose] [participants] [proof] [note]` - Splits an expense equally (admin).\n\n\
        **Reports**\n\
        • `/summary [person] [direction]` - Per-person totals and balances.\n\
        • `/history [limit]` - Recent transactions.\n\
        • `/proofs [person] [direction]` - Shows proof-of-transfer images.\n\n\
        **Admin**\n\
        • `/edit <id> [...]` - Changes fields of a transaction.\n\
        • `/delete <id>` - Permanently removes a transaction.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.\n\n\
        Members only see their own records; admins see everyone's.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
