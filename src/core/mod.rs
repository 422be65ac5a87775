//! Core ledger logic, independent of Discord.
//!
//! - [`store`] persists transactions and normalizes rows on the way out
//! - [`accounting`] derives summaries and splits expenses
//! - [`service`] applies the capability gate and ties everything together

pub mod accounting;
pub mod participant;
pub mod proof;
pub mod report;
pub mod service;
pub mod store;
pub mod transaction;
