//! The policy resolver (§4.3): a pure, four-tier precedence merge.
//!
//! Modeled on the teacher's layered config precedence in
//! `crates/zizmor/src/config.rs` (`Config::{global,disables,ignores}`),
//! generalized from "global config vs. per-workflow override" to the
//! four explicit tiers named in §4.3. Per Design Notes §9, this is an
//! immutable merge over value types, never mutation of a shared
//! default object.

use crate::config::policy::IntegrationPolicy;

/// A manifest-declared constraint's implied update ceiling, inferred
/// from its syntax (tier 3, §4.3): a pinned `=1.2.3` permits no
/// updates; a caret/tilde range permits minor; anything else defaults
/// to the system default at this tier (the config tier above it will
/// usually dominate in practice).
pub fn constraint_implied_update(constraint: &str) -> Option<crate::config::policy::UpdateLevel> {
    use crate::config::policy::UpdateLevel;

    let constraint = constraint.trim();
    if let Some(rest) = constraint.strip_prefix('=') {
        let _ = rest;
        return Some(UpdateLevel::None);
    }
    if constraint.starts_with('^') || constraint.starts_with('~') {
        return Some(UpdateLevel::Minor);
    }
    None
}

/// Resolves the effective policy for one integration by merging, in
/// descending precedence:
/// 1. `cli_override`, if present.
/// 2. `config_policy`, the configuration document's policy for this
///    integration's id.
/// 3. `manifest_constraint`, the manifest-declared constraint string
///    for the dependency under consideration, if any.
/// 4. [`IntegrationPolicy::system_default`].
///
/// The result is a new value; none of the inputs are mutated. Given
/// fixed inputs, this function is deterministic and does not depend on
/// map iteration order (§8 invariant 4) because every input is already
/// a concrete, pre-selected value rather than a map to search.
pub fn resolve(
    cli_override: Option<&IntegrationPolicy>,
    config_policy: Option<&IntegrationPolicy>,
    manifest_constraint: Option<&str>,
) -> IntegrationPolicy {
    if let Some(policy) = cli_override {
        return policy.clone();
    }

    if let Some(policy) = config_policy {
        return policy.clone();
    }

    let mut default = IntegrationPolicy::system_default();
    if let Some(constraint) = manifest_constraint {
        if let Some(update) = constraint_implied_update(constraint) {
            default.update = update;
        }
    }
    default
}
