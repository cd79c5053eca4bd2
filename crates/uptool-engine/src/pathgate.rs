//! The secure path gate (§4.7): every file I/O path the engine touches
//! itself — configuration loads, cadence state loads/saves, generated
//! artefacts — passes through here first.
//!
//! A path is rejected if it contains a `..` component *before*
//! cleaning, or is not absolute *after* cleaning. Integration-owned
//! I/O (manifest Detect/Apply) is the integration's own responsibility
//! and is not gated here.

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::PathGateError;

/// Validates `path` against the secure path gate, returning the
/// cleaned, absolute path on success.
pub fn gate(path: &Utf8Path) -> Result<Utf8PathBuf, PathGateError> {
    if path
        .components()
        .any(|c| matches!(c, camino::Utf8Component::ParentDir))
    {
        return Err(PathGateError::ParentTraversal(path.to_path_buf()));
    }

    let cleaned = clean(path);

    if !cleaned.is_absolute() {
        return Err(PathGateError::NotAbsolute(cleaned));
    }

    Ok(cleaned)
}

/// Lexically cleans a path: collapses `.` components and repeated
/// separators. Does not touch the filesystem.
fn clean(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            camino::Utf8Component::CurDir => {}
            other => out.push(other.as_str()),
        }
    }
    out
}
