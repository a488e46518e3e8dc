use thiserror::Error;

use crate::host::{HostError, TemplateRef};

/// Which bounded pool rejected a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Vials,
    Preparations,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vials => f.write_str("vials"),
            Self::Preparations => f.write_str("daily preparations"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AlembicError {
    #[error("maximum number of {resource} ({limit}) reached")]
    CapacityExceeded { resource: Resource, limit: u32 },

    #[error("no vials left")]
    Empty,

    #[error("commit rejected by host: {0}")]
    CommitFailed(#[source] HostError),

    #[error("nothing to commit")]
    NothingToCommit,

    #[error("no active character")]
    MissingActor,

    #[error("template not found: {0}")]
    TemplateNotFound(TemplateRef),

    #[error("{name} is already a known formula")]
    AlreadyKnown { name: String },

    #[error("{name} cannot be converted to a formula")]
    NotConvertible { name: String },

    #[error("unrecognized drop payload: {0}")]
    InvalidDrop(#[from] serde_json::Error),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("settings store: {0}")]
    Settings(#[from] confy::ConfyError),
}

impl AlembicError {
    pub(crate) fn vials_full(limit: u32) -> Self {
        Self::CapacityExceeded {
            resource: Resource::Vials,
            limit,
        }
    }

    pub(crate) fn preparations_full(limit: u32) -> Self {
        Self::CapacityExceeded {
            resource: Resource::Preparations,
            limit,
        }
    }
}

pub type Result<T, E = AlembicError> = std::result::Result<T, E>;
