//! Error taxonomy of the hosting bridge.

use crate::abi::StatusCode;
use radnet_core::config::ConfigError;
use radnet_core::DelegateTarget;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, HostError>;

/// Everything that can go wrong between loading the runtime library
/// and tearing the execution context down.
///
/// Severity differs by variant: configuration, library load, and
/// context initialization errors are fatal to instantiation;
/// delegate-creation errors are per-stage and leave one slot unbound;
/// shutdown failures are only ever logged by the caller.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to load runtime library {path:?}: {reason}")]
    LibraryLoad { path: PathBuf, reason: String },

    #[error("hosting symbol `{symbol}` is not available in the loaded runtime")]
    MissingSymbol { symbol: &'static str },

    #[error("runtime initialization failed with status {status}")]
    ContextInit { status: StatusCode },

    #[error("runtime returned a null execution context handle")]
    NullContext,

    #[error("failed to bind `{target}`: status {status}")]
    DelegateCreation {
        status: StatusCode,
        target: DelegateTarget,
    },

    #[error("runtime returned a null delegate for `{target}`")]
    NullDelegate { target: DelegateTarget },

    #[error("invalid hosting parameter: {0}")]
    InvalidParameter(String),
}
