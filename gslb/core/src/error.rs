use crate::ObjectKind;

/// Errors returned by the federation core.
///
/// `Unsupported` and `EmptyPaths` mean "not applicable to this object" and are expected during
/// normal operation; callers skip rather than fail on them.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{kind} object doesn't support {op}")]
    Unsupported { kind: ObjectKind, op: &'static str },

    #[error("no paths for {kind} {name}")]
    EmptyPaths { kind: ObjectKind, name: String },

    #[error("no weight available for cluster {0}")]
    NoTrafficWeight(String),

    #[error("no namespace filter present")]
    NoNamespaceFilter,

    #[error("no app filter present")]
    NoAppFilter,

    #[error("invalid federation key: {0:?}")]
    InvalidKey(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
