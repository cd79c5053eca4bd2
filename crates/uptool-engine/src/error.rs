//! The engine's error taxonomy.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced by public engine APIs.
///
/// Per-integration and per-update failures are *not* represented here;
/// those are accumulated as strings in a phase's `errors[]` (see
/// [`crate::engine::PhaseResult`]). A [`EngineError`] is reserved for
/// failures that are fatal to the call that produced them: a
/// malformed configuration document, a cadence-store I/O failure, or
/// a path rejected by the secure path gate.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error")]
    Config(#[from] ConfigError),

    #[error("cadence store error")]
    Cadence(#[from] CadenceError),

    #[error("rejected path: {0}")]
    PathGate(#[from] PathGateError),

    #[error("engine I/O error")]
    Io(#[source] std::io::Error),
}

/// A path failed the secure path gate (§4.7): it either contains `..`
/// before cleaning, or is not absolute after cleaning.
#[derive(Debug, Error)]
pub enum PathGateError {
    #[error("path contains a '..' component: {0}")]
    ParentTraversal(Utf8PathBuf),

    #[error("path is not absolute after cleaning: {0}")]
    NotAbsolute(Utf8PathBuf),
}

/// Errors produced while loading or validating the configuration document.
#[derive(Debug, Error)]
#[error("{inner}")]
pub struct ConfigError {
    #[source]
    inner: ConfigErrorInner,
}

impl ConfigError {
    pub(crate) fn new(inner: ConfigErrorInner) -> Self {
        Self { inner }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigErrorInner {
    #[error("I/O error reading configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML syntax error: {0}")]
    Syntax(#[from] serde_yaml::Error),

    #[error("unsupported configuration version: {0} (expected 1)")]
    UnsupportedVersion(u32),

    #[error("integration[{index}] (id={id}): duplicate integration id")]
    DuplicateId { index: usize, id: String },

    #[error("integration[{index}] (id={id}): {reason}")]
    InvalidIntegration {
        index: usize,
        id: String,
        reason: String,
    },

    #[error("path gate rejected configuration path")]
    PathGate(#[from] PathGateError),
}

/// Errors produced by the cadence store.
#[derive(Debug, Error)]
pub enum CadenceError {
    #[error("I/O error accessing cadence state: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed cadence state document: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("path gate rejected cadence state path")]
    PathGate(#[from] PathGateError),
}
