// ── Remote control abstraction ──
//
// The daemon-facing seam of the core. Pollers list entities through it,
// the dispatcher sends mutations through it. `TransmissionRemote` is the
// production implementation; tests plug in in-memory fakes.

mod transmission;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::model::{EntityId, EntityItems, EntityKind, FilePriority};

pub use transmission::TransmissionRemote;

// ── Errors ───────────────────────────────────────────────────────────

/// Failure of a whole remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Network, timeout, authentication or protocol failure. Nothing is
    /// known about whether the daemon acted.
    #[error("{message}")]
    Connectivity { message: String, cause: Cause },

    /// The daemon answered and refused.
    #[error("{reason}")]
    Rejected { reason: String },
}

/// What kind of connectivity failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cause {
    Network,
    Timeout,
    Auth,
}

impl ClientError {
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
            cause: Cause::Network,
        }
    }

    pub fn timeout(after: std::time::Duration) -> Self {
        Self::Connectivity {
            message: format!("timed out after {:.1}s", after.as_secs_f64()),
            cause: Cause::Timeout,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }
}

impl From<seedctl_api::Error> for ClientError {
    fn from(err: seedctl_api::Error) -> Self {
        if let Some(result) = err.rpc_result() {
            return Self::rejected(result);
        }
        let cause = match &err {
            seedctl_api::Error::Timeout { .. } => Cause::Timeout,
            seedctl_api::Error::Transport(e) if e.is_timeout() => Cause::Timeout,
            e if e.is_auth() => Cause::Auth,
            _ => Cause::Network,
        };
        Self::Connectivity {
            message: err.to_string(),
            cause,
        }
    }
}

/// Per-entity refusal inside a mutation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub reason: String,
}

impl Rejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

// ── Requests & results ───────────────────────────────────────────────

/// One listing answer.
#[derive(Debug, Clone)]
pub struct EntityBatch {
    pub items: EntityItems,
    /// Ids the daemon reports as gone (incremental listings only).
    pub removed: Vec<EntityId>,
    /// `true` when `items` is the full set and absent ids should be pruned.
    pub complete: bool,
}

impl EntityBatch {
    pub fn complete(items: EntityItems) -> Self {
        Self {
            items,
            removed: Vec::new(),
            complete: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateDirection {
    Up,
    Down,
}

impl RateDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "upload" => Some(Self::Up),
            "down" | "dn" | "download" => Some(Self::Down),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// A state change requested on one or more entities.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Start { force: bool },
    Stop,
    Verify,
    Announce,
    Remove { delete_files: bool },
    Move { path: String },
    Rename { from: String, to: String },
    /// `None` lifts the limit. Bytes per second otherwise.
    SetRateLimit {
        direction: RateDirection,
        limit: Option<u64>,
    },
    /// Per-torrent seed ratio limit; stops seeding once reached.
    SetSeedRatioLimit(f64),
    AddTracker { url: String },
    RemoveTracker,
    SetPriority(FilePriority),
}

impl Mutation {
    /// Past-tense verb for reports.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Start { .. } => "started",
            Self::Stop => "stopped",
            Self::Verify => "verifying",
            Self::Announce => "announced",
            Self::Remove { .. } => "removed",
            Self::Move { .. } => "moved",
            Self::Rename { .. } => "renamed",
            Self::SetRateLimit { .. } => "limited",
            Self::SetSeedRatioLimit(_) => "ratio limited",
            Self::AddTracker { .. } => "tracker added",
            Self::RemoveTracker => "tracker removed",
            Self::SetPriority(_) => "prioritized",
        }
    }
}

pub type MutationResults = Vec<(EntityId, Result<(), Rejection>)>;

#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub paused: bool,
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum AddOutcome {
    Added { id: u64, name: String },
    Duplicate { id: u64, name: String },
}

// ── RemoteClient ─────────────────────────────────────────────────────

/// Everything the core needs from a daemon.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// List every entity of `kind`. With `since` set the implementation may
    /// answer incrementally (changed items plus `removed`).
    async fn list_entities(
        &self,
        kind: EntityKind,
        since: Option<u64>,
    ) -> Result<EntityBatch, ClientError>;

    /// Apply `mutation` to `ids`, reporting one result per id.
    async fn mutate(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
        mutation: &Mutation,
    ) -> Result<MutationResults, ClientError>;

    /// Add a torrent from a URL, magnet link or daemon-local path.
    async fn add_entity(&self, source: &str, options: &AddOptions)
    -> Result<AddOutcome, ClientError>;

    /// Daemon name and version.
    async fn describe(&self) -> Result<String, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_result_becomes_rejection() {
        let err = seedctl_api::Error::Rpc {
            method: "torrent-set".into(),
            result: "invalid tracker".into(),
        };
        assert_eq!(ClientError::from(err), ClientError::rejected("invalid tracker"));
    }

    #[test]
    fn transport_failures_are_connectivity() {
        let err = seedctl_api::Error::Timeout { timeout_secs: 10 };
        assert!(matches!(
            ClientError::from(err),
            ClientError::Connectivity {
                cause: Cause::Timeout,
                ..
            }
        ));
        let err = seedctl_api::Error::Authentication {
            message: "401".into(),
        };
        assert!(matches!(
            ClientError::from(err),
            ClientError::Connectivity {
                cause: Cause::Auth,
                ..
            }
        ));
    }

    #[test]
    fn rate_direction_parses_aliases() {
        assert_eq!(RateDirection::parse("UP"), Some(RateDirection::Up));
        assert_eq!(RateDirection::parse("download"), Some(RateDirection::Down));
        assert_eq!(RateDirection::parse("sideways"), None);
    }
}
