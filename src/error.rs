use crate::circuit::{NodeId, PinId, WireId};

/// A node kind name that is not one of the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported node kind: {0:?}")]
pub struct UnknownKind(pub String);

/// A loaded circuit already uses the largest id of some kind, so no fresh id
/// of that kind can be allocated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0} ids are exhausted")]
pub struct IdSpaceExhausted(pub &'static str);

/// A stored pin value that is not `0`, `1` or `null`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid signal level {0}, expected 0, 1 or null")]
pub struct InvalidSignal(pub u8);

/// Why a wire completion was refused. The graph is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    #[error("pin {0:?} does not exist")]
    MissingPin(PinId),
    #[error("both pins belong to node {0:?}")]
    SameNode(NodeId),
    #[error("pins {0:?} and {1:?} are not one output and one input")]
    DirectionMismatch(PinId, PinId),
    #[error("pins are already connected by wire {0:?}")]
    AlreadyConnected(WireId),
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("failed to parse project: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported project version {found:?} (expected {expected:?})")]
    UnsupportedVersion {
        found: String,
        expected: &'static str,
    },
    #[error("project i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    IdSpaceExhausted(#[from] IdSpaceExhausted),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read engine config: {0}")]
    Io(#[from] std::io::Error),
}
