//! The update filter (§4.4): five orthogonal stages applied to each
//! integration's candidate updates before Apply.
//!
//! Ordering is enforced by a single [`UpdateFilter::apply`] entry
//! point that runs the stages in sequence and short-circuits on the
//! first drop, mirroring the teacher's `FindingRegistry::extend`
//! single-pass classification (suppressed / ignored / kept) rather
//! than five separate passes over the update list.

pub mod glob;
pub mod versioning;

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::config::policy::{IntegrationPolicy, VersioningStrategy};
use crate::models::update::FilterDecision;
use crate::models::version::{Impact, VersionPredicate};
use crate::models::{Update, Version};

/// A mapping `(dependencyName + "@" + version) → instant`, supplied
/// externally by a datasource integration (§6 "Registry timestamp
/// interface"). The engine never populates this itself.
pub type ReleaseTimestamps = HashMap<String, DateTime<Utc>>;

pub struct UpdateFilter<'a> {
    policy: &'a IntegrationPolicy,
}

fn normalized_update_type(raw: &str) -> &str {
    raw.strip_prefix("version-update:semver-").unwrap_or(raw)
}

fn impact_str(impact: Impact) -> &'static str {
    match impact {
        Impact::Major => "major",
        Impact::Minor => "minor",
        Impact::Patch => "patch",
    }
}

impl<'a> UpdateFilter<'a> {
    pub fn new(policy: &'a IntegrationPolicy) -> Self {
        Self { policy }
    }

    /// Runs all five stages against `update`, mutating its
    /// `group`/`rewrite_constraint`/`new_constraint` fields in place
    /// and returning the overall decision.
    pub fn apply(
        &self,
        update: &mut Update,
        release_timestamps: Option<&ReleaseTimestamps>,
        now: DateTime<Utc>,
    ) -> FilterDecision {
        if let Some(reason) = self.stage1_allow(update) {
            tracing::debug!(dependency = %update.dependency.name, reason = %reason, "dropped at allow-list stage");
            return FilterDecision::Dropped { reason };
        }
        if let Some(reason) = self.stage2_ignore(update) {
            tracing::debug!(dependency = %update.dependency.name, reason = %reason, "dropped at ignore-list stage");
            return FilterDecision::Dropped { reason };
        }
        if let Some(reason) = self.stage3_cooldown(update, release_timestamps, now) {
            tracing::debug!(dependency = %update.dependency.name, reason = %reason, "dropped at cooldown stage");
            return FilterDecision::Dropped { reason };
        }

        self.stage4_versioning_strategy(update);
        let group = self.stage5_grouping(update);

        FilterDecision::Passed { group }
    }

    /// Stage 1 — Allow-list. `None` means "passes" (skipped when empty,
    /// or matched a rule); `Some(reason)` means dropped.
    fn stage1_allow(&self, update: &Update) -> Option<String> {
        if self.policy.allow.is_empty() {
            return None;
        }

        let matches = self.policy.allow.iter().any(|rule| {
            let name_ok = rule
                .dependency_name
                .as_deref()
                .is_none_or(|pat| glob::matches(pat, &update.dependency.name));
            let type_ok = rule
                .dependency_type
                .is_none_or(|t| update.dependency.dep_type.matches(t));
            name_ok && type_ok
        });

        if matches {
            None
        } else {
            Some("not in allow list".to_string())
        }
    }

    /// Stage 2 — Ignore-list.
    fn stage2_ignore(&self, update: &Update) -> Option<String> {
        for rule in &self.policy.ignore {
            if !glob::matches(&rule.dependency_name, &update.dependency.name) {
                continue;
            }

            let mut reason = None;
            let mut all_specified_hold = true;

            if !rule.versions.is_empty() {
                let target = Version::parse(&update.target_version);
                match rule
                    .versions
                    .iter()
                    .find(|v| VersionPredicate::parse(v).matches(&target))
                {
                    Some(matched) => reason = Some(format!("version ignored: {matched}")),
                    None => all_specified_hold = false,
                }
            }

            if all_specified_hold && !rule.update_types.is_empty() {
                let current = impact_str(update.impact);
                let matched = rule
                    .update_types
                    .iter()
                    .any(|t| normalized_update_type(t) == current);
                if matched {
                    reason.get_or_insert_with(|| format!("update type ignored: {current}"));
                } else {
                    all_specified_hold = false;
                }
            }

            if all_specified_hold {
                return Some(
                    reason.unwrap_or_else(|| format!("ignored: {}", rule.dependency_name)),
                );
            }
        }
        None
    }

    /// Stage 3 — Cooldown.
    fn stage3_cooldown(
        &self,
        update: &Update,
        release_timestamps: Option<&ReleaseTimestamps>,
        now: DateTime<Utc>,
    ) -> Option<String> {
        let cooldown = self.policy.cooldown.as_ref()?;

        if glob::matches_any(&cooldown.exclude, &update.dependency.name) {
            return None;
        }
        if !cooldown.include.is_empty() && !glob::matches_any(&cooldown.include, &update.dependency.name) {
            return None;
        }

        let per_impact = match update.impact {
            Impact::Major => cooldown.semver_major_days,
            Impact::Minor => cooldown.semver_minor_days,
            Impact::Patch => cooldown.semver_patch_days,
        };
        let days = if per_impact > 0 {
            per_impact
        } else {
            cooldown.default_days
        };
        if days == 0 {
            return None;
        }

        // Open Question (c): with no external timestamp data, all
        // updates pass. This applies both when the whole map is
        // absent and when this specific dependency@version is absent.
        let Some(timestamps) = release_timestamps else {
            return None;
        };
        let key = format!("{}@{}", update.dependency.name, update.target_version);
        let Some(released_at) = timestamps.get(&key) else {
            return None;
        };

        let held_until = *released_at + chrono::Duration::days(days as i64);
        if now < held_until {
            Some(format!(
                "held by cooldown until {}",
                held_until.to_rfc3339()
            ))
        } else {
            None
        }
    }

    /// Stage 4 — Versioning strategy. Modifies the target's rewrite
    /// behavior, never whether the update is included.
    fn stage4_versioning_strategy(&self, update: &mut Update) {
        match self.policy.versioning_strategy {
            VersioningStrategy::Auto => {
                update.rewrite_constraint = true;
                update.new_constraint = None;
            }
            VersioningStrategy::LockfileOnly => {
                update.rewrite_constraint = false;
                update.new_constraint = None;
            }
            VersioningStrategy::Increase => {
                update.rewrite_constraint = true;
                update.new_constraint = None;
            }
            VersioningStrategy::IncreaseIfNecessary => {
                let target = Version::parse(&update.target_version);
                let already_satisfied = update
                    .dependency
                    .constraint
                    .as_deref()
                    .and_then(versioning::Constraint::parse)
                    .is_some_and(|c| c.satisfies(&target));

                update.rewrite_constraint = !already_satisfied;
                update.new_constraint = None;
            }
            VersioningStrategy::Widen => {
                let target = Version::parse(&update.target_version);
                match update
                    .dependency
                    .constraint
                    .as_deref()
                    .and_then(versioning::Constraint::parse)
                {
                    Some(constraint) => {
                        let (new_constraint, rewrite) = constraint.widen(&target);
                        update.new_constraint = Some(new_constraint);
                        update.rewrite_constraint = rewrite;
                    }
                    None => {
                        update.rewrite_constraint = true;
                        update.new_constraint = None;
                    }
                }
            }
        }
    }

    /// Stage 5 — Grouping. Returns the first matching group's name, if
    /// any, by iteration order over the configured groups map.
    fn stage5_grouping(&self, update: &Update) -> Option<String> {
        for (name, group) in &self.policy.groups {
            if let Some(dep_type) = group.dependency_type {
                if !update.dependency.dep_type.matches(dep_type) {
                    continue;
                }
            }

            if !group.update_types.is_empty() {
                let current = impact_str(update.impact);
                let matched = group
                    .update_types
                    .iter()
                    .any(|t| normalized_update_type(t) == current);
                if !matched {
                    continue;
                }
            }

            if glob::matches_any(&group.exclude_patterns, &update.dependency.name) {
                continue;
            }

            if !group.patterns.is_empty()
                && !glob::matches_any(&group.patterns, &update.dependency.name)
            {
                continue;
            }

            return Some(name.clone());
        }
        None
    }
}
