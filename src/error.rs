// src/error.rs

use thiserror::Error;

/// Errors that abort a run. Per-project commit fetch failures are contained
/// inside the client and never surface as a variant here; corrupt cache
/// files degrade to a cache miss instead of an error.
#[derive(Error, Debug)]
pub enum Error {
    /// Credential missing or rejected by the remote. Fatal for the run
    /// before any fetch happens.
    #[error("authentication failed for {instance}: {reason}")]
    Authentication { instance: String, reason: String },

    /// A remote call outside the per-project containment zone failed.
    #[error("remote request failed: {0}")]
    Remote(#[from] reqwest::Error),

    /// An event outside the closed normalization rule table. Silently
    /// dropping it would under-report contributions, so this is fatal.
    #[error("unknown contribution kind: action {action:?}, target {target:?} (event {id})")]
    UnknownContributionKind {
        id: u64,
        action: String,
        target: Option<String>,
    },

    /// Replay was attempted without an initialized repository. Signals an
    /// orchestration bug, not a runtime condition.
    #[error("no repository initialized before replay")]
    NoRepository,

    #[error("mismatched configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Git(#[from] git2::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cache encode failed: {0}")]
    CacheEncode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
