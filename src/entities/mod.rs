//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod proof;
pub mod transaction;

// Re-export specific types to avoid conflicts
pub use proof::{Entity as Proof, Model as ProofModel};
pub use transaction::{Entity as Transaction, Model as TransactionModel};
