//! Manifests and dependencies (§3).

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// A dependency's role within its manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyType {
    Production,
    Development,
    Peer,
    Optional,
    Indirect,
    /// Accepts both `all` and `*` on deserialization (Open Question (b)).
    #[serde(alias = "*")]
    All,
}

impl DependencyType {
    /// Whether `self` (a dependency's actual type) matches `pattern` (a
    /// rule's configured type). `All` in either position matches every
    /// type, per Open Question (b): `"all"` and `"*"` are synonyms and
    /// are normalized to [`DependencyType::All`] during config parsing.
    pub fn matches(&self, pattern: DependencyType) -> bool {
        pattern == DependencyType::All || *self == pattern
    }
}

/// A single dependency declared in a manifest.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub name: String,
    pub current_version: String,
    pub dep_type: DependencyType,
    pub constraint: Option<String>,
}

/// A discovered dependency file (§3). Created by `Integration::detect`;
/// immutable after creation.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Repo-relative path.
    pub path: Utf8PathBuf,
    /// The integration name that produced this manifest.
    pub integration: String,
    pub dependencies: Vec<Dependency>,
}

impl Manifest {
    pub fn new(
        path: impl Into<Utf8PathBuf>,
        integration: impl Into<String>,
        dependencies: Vec<Dependency>,
    ) -> Self {
        Self {
            path: path.into(),
            integration: integration.into(),
            dependencies,
        }
    }

    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.name == name)
    }
}
