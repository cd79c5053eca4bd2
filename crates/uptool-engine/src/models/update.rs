//! Updates, plans, and apply results (§3).

use crate::models::manifest::{Dependency, Manifest};
use crate::models::version::Impact;

/// A proposed change to one dependency. Produced by `Integration::plan`;
/// consumed by [`crate::filter::UpdateFilter`] and `Integration::apply`.
#[derive(Debug, Clone)]
pub struct Update {
    pub dependency: Dependency,
    pub target_version: String,
    pub impact: Impact,
    /// Assigned by the filter's grouping stage (§4.4 Stage 5).
    pub group: Option<String>,
    /// Whether the manifest's declared constraint should be rewritten,
    /// as decided by the versioning-strategy stage (§4.4 Stage 4).
    pub rewrite_constraint: bool,
    /// The constraint string to write back, if `rewrite_constraint`.
    pub new_constraint: Option<String>,
}

impl Update {
    pub fn new(dependency: Dependency, target_version: String, impact: Impact) -> Self {
        Self {
            dependency,
            target_version,
            impact,
            group: None,
            rewrite_constraint: true,
            new_constraint: None,
        }
    }
}

/// The strategy Apply should use to rewrite a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStrategy {
    CustomRewrite,
}

/// One plan per manifest per phase (§3). Plans with zero updates are
/// preserved: they carry "no updates available" status for reporting.
#[derive(Debug, Clone)]
pub struct UpdatePlan {
    pub manifest: Manifest,
    pub updates: Vec<Update>,
    pub strategy: RewriteStrategy,
}

impl UpdatePlan {
    pub fn empty(manifest: Manifest) -> Self {
        Self {
            manifest,
            updates: Vec::new(),
            strategy: RewriteStrategy::CustomRewrite,
        }
    }
}

/// The result of applying one [`UpdatePlan`] (§4.1 Apply).
#[derive(Debug, Clone, Default)]
pub struct ApplyResult {
    pub applied: usize,
    pub failed: usize,
    pub diff: Option<String>,
}

/// The per-update outcome of running the filter pipeline (§4.4).
#[derive(Debug, Clone)]
pub enum FilterDecision {
    Passed { group: Option<String> },
    Dropped { reason: String },
}
