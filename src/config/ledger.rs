//! Ledger configuration loading from config.toml
//!
//! The file declares the fixed roster of participants (with their Discord ids
//! and admin flags), which optional transaction fields are in use, and where
//! proof-of-transfer images are kept.

use crate::core::participant::UNKNOWN_PARTICIPANT;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_VAR: &str = "LEDGER_CONFIG";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Currency symbol used when displaying amounts
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Which optional transaction fields are collected
    #[serde(default)]
    pub fields: FieldOptions,
    /// Proof-of-transfer storage settings
    #[serde(default)]
    pub proofs: ProofConfig,
    /// The fixed roster
    pub participants: Vec<ParticipantConfig>,
}

/// Presence of the optional `purpose` and `note` fields
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct FieldOptions {
    /// Whether callers may set a custom purpose
    #[serde(default = "enabled")]
    pub purpose: bool,
    /// Whether notes are stored
    #[serde(default = "enabled")]
    pub note: bool,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            purpose: true,
            note: true,
        }
    }
}

/// Where proof images live
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProofStorageKind {
    /// Bytes are stored in the `proofs` table
    #[default]
    Database,
    /// Bytes are written as files into a directory
    Filesystem,
}

/// Proof-of-transfer settings
#[derive(Debug, Deserialize, Clone)]
pub struct ProofConfig {
    /// Storage backend
    #[serde(default)]
    pub storage: ProofStorageKind,
    /// Target directory, required for filesystem storage
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Whether payments must come with a proof
    #[serde(default = "enabled")]
    pub require_for_payments: bool,
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            storage: ProofStorageKind::Database,
            directory: None,
            require_for_payments: true,
        }
    }
}

/// Configuration for a single participant
#[derive(Debug, Deserialize, Clone)]
pub struct ParticipantConfig {
    /// Display name, unique within the roster
    pub name: String,
    /// Discord user id that identifies this participant
    #[serde(default)]
    pub discord_id: Option<String>,
    /// Whether this participant may use admin operations
    #[serde(default)]
    pub admin: bool,
}

fn default_currency() -> String {
    "Rp".to_string()
}

const fn enabled() -> bool {
    true
}

impl Config {
    /// Checks the roster and storage settings for consistency.
    ///
    /// # Errors
    /// Returns `Error::Config` if the roster is empty, a name is blank, repeated
    /// or reserved, a Discord id is repeated, nobody is an admin, or filesystem
    /// storage has no directory.
    pub fn validate(&self) -> Result<()> {
        if self.participants.is_empty() {
            return Err(config_error("at least one participant is required"));
        }

        let mut names = HashSet::new();
        let mut discord_ids = HashSet::new();
        for participant in &self.participants {
            let name = participant.name.trim();
            if name.is_empty() {
                return Err(config_error("participant names cannot be empty"));
            }
            if name == UNKNOWN_PARTICIPANT {
                return Err(config_error(format!(
                    "'{UNKNOWN_PARTICIPANT}' is reserved and cannot be a participant"
                )));
            }
            if !names.insert(name) {
                return Err(config_error(format!("duplicate participant '{name}'")));
            }
            if let Some(id) = &participant.discord_id
                && !discord_ids.insert(id.as_str())
            {
                return Err(config_error(format!("duplicate discord_id '{id}'")));
            }
        }

        if !self.participants.iter().any(|p| p.admin) {
            return Err(config_error("at least one participant must be an admin"));
        }

        if self.proofs.storage == ProofStorageKind::Filesystem && self.proofs.directory.is_none()
        {
            return Err(config_error(
                "proofs.directory is required when proofs.storage = \"filesystem\"",
            ));
        }

        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> Error {
    Error::Config {
        message: message.into(),
    }
}

/// Parses and validates configuration from a TOML string.
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads ledger configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing or the roster is inconsistent
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `$LEDGER_CONFIG`, or `./config.toml` when unset.
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}
