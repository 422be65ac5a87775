/// Database configuration and connection management
pub mod database;

/// Ledger configuration loading from config.toml
pub mod ledger;

pub use ledger::{
    Config, FieldOptions, ParticipantConfig, ProofConfig, ProofStorageKind, load_config,
    load_default_config,
};
