//! Autocomplete handlers for Discord slash command parameters.

use crate::bot::Context;

/// Discord shows at most 25 suggestions
const MAX_SUGGESTIONS: usize = 25;

/// Roster names containing `partial`, case-insensitively, in roster order.
#[must_use]
pub fn matching_participants(names: &[String], partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    names
        .iter()
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .take(MAX_SUGGESTIONS)
        .cloned()
        .collect()
}

/// Provides autocomplete suggestions for participant names.
pub async fn autocomplete_participant(ctx: Context<'_>, partial: &str) -> Vec<String> {
    matching_participants(&ctx.data().service.roster().names(), partial)
}
