//! The fixed roster of participants and the identity of whoever is calling.
//!
//! The roster is loaded once from configuration. It decides which names may be
//! written to the ledger, maps Discord ids to participants, and carries the
//! admin flag that gates privileged operations.

use crate::{
    config::ParticipantConfig,
    errors::{Error, Result},
};

/// Name used for stored records whose person is missing or not on the roster
pub const UNKNOWN_PARTICIPANT: &str = "Unknown";

/// A named individual eligible to record transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Display name, unique within the roster
    pub name: String,
    /// Discord user id bound to this participant
    pub discord_id: Option<String>,
    /// Whether the participant may use admin operations
    pub is_admin: bool,
}

impl Participant {
    /// Creates a non-admin participant without a Discord binding.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            discord_id: None,
            is_admin: false,
        }
    }

    /// Marks the participant as an admin.
    #[must_use]
    pub const fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// Binds the participant to a Discord user id.
    #[must_use]
    pub fn with_discord_id(mut self, id: impl Into<String>) -> Self {
        self.discord_id = Some(id.into());
        self
    }
}

/// The identity on whose behalf an operation runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Roster name of the caller
    pub participant: String,
    /// Whether the caller holds the admin capability
    pub is_admin: bool,
}

impl Caller {
    /// Fails with `PermissionDenied` unless the caller is an admin.
    pub fn ensure_admin(&self, action: &str) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(Error::permission_denied(format!(
                "{action} requires admin access"
            )))
        }
    }

    /// True if `person` is the caller themself.
    #[must_use]
    pub fn is(&self, person: &str) -> bool {
        self.participant == person
    }
}

/// Ordered, fixed set of participants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    /// Builds a roster from participants in display order.
    #[must_use]
    pub const fn new(participants: Vec<Participant>) -> Self {
        Self { participants }
    }

    /// Builds a roster from the `[[participants]]` entries of config.toml.
    #[must_use]
    pub fn from_config(entries: &[ParticipantConfig]) -> Self {
        Self::new(
            entries
                .iter()
                .map(|entry| Participant {
                    name: entry.name.trim().to_string(),
                    discord_id: entry.discord_id.clone(),
                    is_admin: entry.admin,
                })
                .collect(),
        )
    }

    /// All participant names in roster order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.participants.iter().map(|p| p.name.clone()).collect()
    }

    /// True if `name` is on the roster.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Looks up a participant by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.name == name)
    }

    /// Looks up a participant for a write, failing with `UnknownParticipant`.
    pub fn require(&self, name: &str) -> Result<&Participant> {
        self.get(name).ok_or_else(|| Error::UnknownParticipant {
            name: name.to_string(),
        })
    }

    /// Maps a stored person value onto the roster.
    ///
    /// Missing values and names that are not on the roster become
    /// [`UNKNOWN_PARTICIPANT`].
    #[must_use]
    pub fn normalize(&self, stored: Option<&str>) -> String {
        stored
            .map(str::trim)
            .filter(|name| self.contains(name))
            .map_or_else(|| UNKNOWN_PARTICIPANT.to_string(), str::to_string)
    }

    /// Resolves the caller identity for a participant name.
    #[must_use]
    pub fn caller(&self, name: &str) -> Option<Caller> {
        self.get(name).map(|p| Caller {
            participant: p.name.clone(),
            is_admin: p.is_admin,
        })
    }

    /// Resolves the caller identity for a Discord user id.
    #[must_use]
    pub fn caller_for_discord_id(&self, discord_id: &str) -> Option<Caller> {
        self.participants
            .iter()
            .find(|p| p.discord_id.as_deref() == Some(discord_id))
            .map(|p| Caller {
                participant: p.name.clone(),
                is_admin: p.is_admin,
            })
    }
}
