use thiserror::Error;

use crate::types::{LinkPath, Origin};

pub type Result<T> = std::result::Result<T, MergeError>;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Moving {source_path} under {target} would create a cycle")]
    Cycle { source_path: String, target: String },

    #[error("A link named {name:?} already exists under {parent}")]
    DuplicateName { parent: String, name: String },

    #[error("Both snapshots are tagged {0}; need one existing and one loaded tree")]
    Configuration(Origin),

    #[error("Merge session is finalized; no further changes are accepted")]
    SessionClosed,

    #[error("No link at {path} in the {tree} tree")]
    NodeNotFound { tree: Origin, path: LinkPath },

    #[error("Cannot move {0}: it is the root of its tree")]
    RootMove(String),

    #[error("{label:?} is not an entry of this menu")]
    UnknownChoice { label: String },

    #[error("Illegal session transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: crate::session::SessionState,
        to: crate::session::SessionState,
    },

    #[error("Plan operation {index} failed: {source}")]
    PlanStep {
        index: usize,
        #[source]
        source: Box<MergeError>,
    },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MergeError {
    /// Whether the caller can fix the request and try again against the same
    /// session. Configuration and JSON errors are fatal to whatever was being
    /// built.
    pub fn is_recoverable(&self) -> bool {
        match self {
            MergeError::Cycle { .. }
            | MergeError::DuplicateName { .. }
            | MergeError::NodeNotFound { .. }
            | MergeError::RootMove(_)
            | MergeError::UnknownChoice { .. } => true,
            MergeError::Configuration(_)
            | MergeError::SessionClosed
            | MergeError::IllegalTransition { .. }
            | MergeError::Json(_) => false,
            MergeError::PlanStep { source, .. } => source.is_recoverable(),
        }
    }
}
