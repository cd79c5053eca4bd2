//! The cadence store (§4.6): a thin key-value persistence layer gating
//! re-checks by `daily`/`weekly`/`monthly` cadence.
//!
//! Default path resolution mirrors the teacher's
//! `App::default_cache_dir` (`crates/zizmor/src/main.rs`), adapted to
//! `config_dir()` since cadence state is user-config-home-scoped
//! rather than disposable cache.

use std::collections::HashMap;
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use etcetera::AppStrategy as _;
use serde::{Deserialize, Serialize};

use crate::config::policy::Cadence;
use crate::error::CadenceError;
use crate::pathgate;

/// The persisted `manifestPath → lastCheckedAt` map (§3 `CadenceState`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CadenceState {
    #[serde(rename = "lastChecked", default)]
    last_checked: HashMap<String, DateTime<Utc>>,
}

impl CadenceState {
    pub fn is_empty(&self) -> bool {
        self.last_checked.is_empty()
    }

    pub fn last_checked(&self, manifest_path: &str) -> Option<DateTime<Utc>> {
        self.last_checked.get(manifest_path).copied()
    }
}

/// The cadence store (§4.6).
#[derive(Debug, Default)]
pub struct CadenceStore {
    state: CadenceState,
}

impl CadenceStore {
    pub fn new(state: CadenceState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &CadenceState {
        &self.state
    }

    /// The default state-file path: `<user-config-home>/uptool/state.json`.
    pub fn default_path() -> Result<Utf8PathBuf, CadenceError> {
        let strategy = etcetera::choose_app_strategy(etcetera::AppStrategyArgs {
            top_level_domain: "dev".into(),
            author: "uptool".into(),
            app_name: "uptool".into(),
        })
        .map_err(|e| CadenceError::Io(std::io::Error::other(e.to_string())))?;

        let path = strategy.config_dir().join("state.json");
        Utf8PathBuf::from_path_buf(path)
            .map_err(|p| CadenceError::Io(std::io::Error::other(format!("non-UTF-8 path: {p:?}"))))
    }

    /// Returns true iff `cadence == None`, the manifest is absent from
    /// the store, or enough time has elapsed since it was last
    /// checked. Unknown cadence (not representable here since
    /// `Cadence` is an exhaustive enum) would default to permissive.
    pub fn should_check_for_updates(
        &self,
        manifest_path: &str,
        cadence: Option<Cadence>,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(cadence) = cadence else {
            return true;
        };

        let Some(last) = self.state.last_checked(manifest_path) else {
            return true;
        };

        let required = match cadence {
            Cadence::Daily => chrono::Duration::hours(24),
            Cadence::Weekly => chrono::Duration::days(7),
            Cadence::Monthly => chrono::Duration::days(30),
        };

        now - last >= required
    }

    /// Stamps `manifest_path` with `now`, lazily initializing the
    /// underlying map.
    pub fn mark_checked(&mut self, manifest_path: &str, now: DateTime<Utc>) {
        self.state
            .last_checked
            .insert(manifest_path.to_string(), now);
    }

    /// Loads the cadence state from `path`. Returns an empty store
    /// when the file does not exist; other I/O errors propagate.
    pub fn load(path: &Utf8Path) -> Result<Self, CadenceError> {
        let gated = pathgate::gate(path)?;

        let contents = match fs::read_to_string(&gated) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(CadenceError::Io(e)),
        };

        let state: CadenceState = serde_json::from_str(&contents)?;
        Ok(Self::new(state))
    }

    /// Saves the cadence state to `path`, creating the parent
    /// directory (mode 0700) if needed and writing the file (mode
    /// 0600).
    pub fn save(&self, path: &Utf8Path) -> Result<(), CadenceError> {
        let gated = pathgate::gate(path)?;

        if let Some(parent) = gated.parent() {
            fs::create_dir_all(parent)?;
            #[cfg(unix)]
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))?;
        }

        let serialized = serde_json::to_string_pretty(&self.state)?;
        fs::write(&gated, serialized)?;

        #[cfg(unix)]
        fs::set_permissions(&gated, fs::Permissions::from_mode(0o600))?;

        Ok(())
    }
}
