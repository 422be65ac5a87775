//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// Summary, history and proof commands
pub mod report;

/// Payment, expense, edit and delete commands
pub mod transaction;

// Export commands
pub use general::*;
pub use report::*;
pub use transaction::*;

use crate::core::transaction::Direction;

/// Direction option shown in slash command menus
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum DirectionChoice {
    /// Payments into the pool
    #[name = "inflow"]
    Inflow,
    /// Expense shares
    #[name = "outflow"]
    Outflow,
}

impl From<DirectionChoice> for Direction {
    fn from(choice: DirectionChoice) -> Self {
        match choice {
            DirectionChoice::Inflow => Self::Inflow,
            DirectionChoice::Outflow => Self::Outflow,
        }
    }
}
