//! The policy document model: `IntegrationPolicy` and everything it's
//! built from (§3, §6).
//!
//! Field names and nesting follow the YAML schema in `spec.md` §6
//! verbatim (snake_case), adapted from the shape of Dependabot's own
//! `updates[]` schema — see
//! `github-actions-models::dependabot::v2::Update` in the teacher's
//! pack for the template this was grounded on.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::DependencyType;

/// `IntegrationPolicy.update`: the ceiling on which update impacts are
/// permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateLevel {
    None,
    Patch,
    Minor,
    Major,
}

/// `IntegrationPolicy.cadence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
}

/// `IntegrationPolicy.versioningStrategy` (§4.4 Stage 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersioningStrategy {
    Auto,
    Increase,
    IncreaseIfNecessary,
    LockfileOnly,
    Widen,
}

/// `Schedule.interval` (§3, §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Semiannually,
    Yearly,
    Cron,
}

/// A weekday name, used by `Schedule.day` for `weekly` intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn from_chrono(wd: chrono::Weekday) -> Self {
        match wd {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

/// `Schedule` (§3). Invalid combinations (e.g. `interval = cron`
/// without a `cron` expression, or an unknown timezone) are rejected
/// at load time by [`Schedule::validate`], not by `Deserialize` itself
/// — this keeps the error message able to cite the owning integration,
/// which a `Deserialize`-time error cannot do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub interval: Interval,
    #[serde(default)]
    pub day: Option<Weekday>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub cron: Option<String>,
}

impl Schedule {
    pub fn validate(&self) -> Result<(), String> {
        if self.interval == Interval::Cron && self.cron.is_none() {
            return Err("interval 'cron' requires a 'cron' expression".to_string());
        }
        if let Some(tz) = &self.timezone {
            if tz.parse::<chrono_tz::Tz>().is_err() {
                return Err(format!("unknown timezone: {tz}"));
            }
        }
        if let Some(time) = &self.time {
            let valid = time
                .split_once(':')
                .map(|(h, m)| {
                    h.len() == 2
                        && m.len() == 2
                        && h.parse::<u32>().is_ok_and(|h| h < 24)
                        && m.parse::<u32>().is_ok_and(|m| m < 60)
                })
                .unwrap_or(false);
            if !valid {
                return Err(format!("invalid time-of-day: {time} (expected HH:MM)"));
            }
        }
        Ok(())
    }
}

/// `DependencyGroup.appliesTo` (§3): the closed domain Dependabot-style
/// grouping distinguishes between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppliesTo {
    VersionUpdates,
    SecurityUpdates,
}

/// `DependencyGroup` (§3, §4.4 Stage 5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGroup {
    #[serde(default)]
    pub applies_to: Option<AppliesTo>,
    #[serde(default)]
    pub dependency_type: Option<DependencyType>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub update_types: Vec<String>,
}

/// `IgnoreRule` (§3, §4.4 Stage 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreRule {
    pub dependency_name: String,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub update_types: Vec<String>,
}

/// `AllowRule` (§3, §4.4 Stage 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowRule {
    pub dependency_name: Option<String>,
    #[serde(default)]
    pub dependency_type: Option<DependencyType>,
}

/// `CooldownConfig` (§3, §4.4 Stage 3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CooldownConfig {
    #[serde(default)]
    pub default_days: u64,
    #[serde(default)]
    pub semver_major_days: u64,
    #[serde(default)]
    pub semver_minor_days: u64,
    #[serde(default)]
    pub semver_patch_days: u64,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `IntegrationPolicy.commitMessage`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitMessageConfig {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub prefix_development: Option<String>,
    #[serde(default)]
    pub include_scope: bool,
}

/// `IntegrationPolicy` (§3), the effective policy resolved by
/// [`crate::policy_resolver`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationPolicy {
    #[serde(default)]
    pub enabled: bool,
    pub update: UpdateLevel,
    #[serde(default)]
    pub allow_prerelease: bool,
    #[serde(default)]
    pub pin: bool,
    #[serde(default)]
    pub cadence: Option<Cadence>,
    #[serde(default)]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub groups: IndexMap<String, DependencyGroup>,
    #[serde(default)]
    pub allow: Vec<AllowRule>,
    #[serde(default)]
    pub ignore: Vec<IgnoreRule>,
    #[serde(default)]
    pub cooldown: Option<CooldownConfig>,
    #[serde(default)]
    pub commit_message: Option<CommitMessageConfig>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub reviewers: Vec<String>,
    #[serde(default = "default_open_pull_requests_limit")]
    pub open_pull_requests_limit: u8,
    #[serde(default = "default_versioning_strategy")]
    pub versioning_strategy: VersioningStrategy,
}

fn default_open_pull_requests_limit() -> u8 {
    5
}

fn default_versioning_strategy() -> VersioningStrategy {
    VersioningStrategy::Auto
}

impl IntegrationPolicy {
    /// The system default policy (§4.3 tier 4): `minor`, disallow
    /// prereleases, don't pin.
    pub fn system_default() -> Self {
        Self {
            enabled: true,
            update: UpdateLevel::Minor,
            allow_prerelease: false,
            pin: false,
            cadence: None,
            schedule: None,
            groups: IndexMap::new(),
            allow: Vec::new(),
            ignore: Vec::new(),
            cooldown: None,
            commit_message: None,
            labels: Vec::new(),
            assignees: Vec::new(),
            reviewers: Vec::new(),
            open_pull_requests_limit: default_open_pull_requests_limit(),
            versioning_strategy: VersioningStrategy::Auto,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.open_pull_requests_limit > 10 {
            return Err(format!(
                "open_pull_requests_limit must be between 0 and 10, got {}",
                self.open_pull_requests_limit
            ));
        }
        if let Some(schedule) = &self.schedule {
            schedule.validate()?;
        }
        if let Some(cooldown) = &self.cooldown {
            if cooldown.default_days == 0
                && cooldown.semver_major_days == 0
                && cooldown.semver_minor_days == 0
                && cooldown.semver_patch_days == 0
            {
                return Err(
                    "cooldown config has no effect: default_days, semver_major_days, semver_minor_days, and semver_patch_days are all 0".to_string(),
                );
            }
        }
        Ok(())
    }
}

/// `match` (§6): the glob-based manifest-path filter registered per
/// integration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchConfig {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_to_accepts_closed_domain() {
        let group: DependencyGroup =
            serde_yaml::from_str("applies_to: version-updates\n").unwrap();
        assert_eq!(group.applies_to, Some(AppliesTo::VersionUpdates));

        let group: DependencyGroup =
            serde_yaml::from_str("applies_to: security-updates\n").unwrap();
        assert_eq!(group.applies_to, Some(AppliesTo::SecurityUpdates));

        assert!(serde_yaml::from_str::<DependencyGroup>("applies_to: garbage\n").is_err());
    }

    #[test]
    fn validate_rejects_all_zero_cooldown() {
        let mut policy = IntegrationPolicy::system_default();
        policy.cooldown = Some(CooldownConfig::default());
        assert!(policy.validate().is_err());
    }

    #[test]
    fn validate_accepts_cooldown_with_a_nonzero_field() {
        let mut policy = IntegrationPolicy::system_default();
        policy.cooldown = Some(CooldownConfig {
            default_days: 7,
            ..CooldownConfig::default()
        });
        assert!(policy.validate().is_ok());
    }
}
