//! Configuration document loading and validation (§3, §6).
//!
//! Modeled on the teacher's `crates/zizmor/src/config.rs`: a `serde`
//! deserialization target (here, [`RawConfig`]) followed by a semantic
//! validation pass that rejects invariant violations the derive can't
//! express, with errors that name the offending integration's index
//! and id.

pub mod policy;

use std::collections::HashSet;
use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigErrorInner};
use crate::pathgate;
use policy::{IntegrationPolicy, MatchConfig};

/// The top-level configuration document (§3 "Configuration document",
/// §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: u32,
    pub integrations: Vec<IntegrationConfig>,
    #[serde(default)]
    pub org_policy: Option<serde_yaml::Value>,
}

/// One `integrations[i]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationConfig {
    pub id: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "match", default)]
    pub match_config: Option<MatchConfig>,
    pub policy: IntegrationPolicy,
}

impl Config {
    /// Parses and validates a configuration document from its YAML
    /// text. Validation failures name the offending integration's
    /// index and id, per §6.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_yaml::from_str(contents).map_err(|e| ConfigError::new(ConfigErrorInner::Syntax(e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates the configuration document at `path`,
    /// passing it through the secure path gate first (§4.7).
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let gated =
            pathgate::gate(path).map_err(|e| ConfigError::new(ConfigErrorInner::PathGate(e)))?;
        let contents =
            fs::read_to_string(&gated).map_err(|e| ConfigError::new(ConfigErrorInner::Io(e)))?;
        Self::from_yaml(&contents)
    }

    /// Walks up from `start_dir` looking for `uptool.yaml` or
    /// `uptool.yml`, mirroring the teacher's `Config::discover_in_dir`
    /// walk-up-to-`.git` algorithm.
    pub fn discover(start_dir: &Utf8Path) -> Result<Option<Self>, ConfigError> {
        let mut dir = Some(start_dir.to_path_buf());

        while let Some(current) = dir {
            for name in ["uptool.yaml", "uptool.yml"] {
                let candidate = current.join(name);
                if candidate.is_file() {
                    tracing::debug!(path = %candidate, "found configuration document");
                    return Self::load(&candidate).map(Some);
                }
            }

            if current.join(".git").exists() {
                tracing::debug!(dir = %current, "stopped configuration discovery at repository root");
                break;
            }

            dir = current.parent().map(|p| p.to_path_buf());
        }

        tracing::debug!(start_dir = %start_dir, "no configuration document found");
        Ok(None)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::new(ConfigErrorInner::UnsupportedVersion(
                self.version,
            )));
        }

        let mut seen_ids = HashSet::new();
        for (index, integration) in self.integrations.iter().enumerate() {
            if !seen_ids.insert(integration.id.clone()) {
                return Err(ConfigError::new(ConfigErrorInner::DuplicateId {
                    index,
                    id: integration.id.clone(),
                }));
            }

            if let Err(reason) = integration.policy.validate() {
                return Err(ConfigError::new(ConfigErrorInner::InvalidIntegration {
                    index,
                    id: integration.id.clone(),
                    reason,
                }));
            }
        }

        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&IntegrationConfig> {
        self.integrations.iter().find(|i| i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
version: 1
integrations:
  - id: npm
    enabled: true
    policy:
      update: minor
  - id: helm
    enabled: true
    policy:
      update: patch
      open_pull_requests_limit: 3
"#;

    #[test]
    fn parses_valid_document() {
        let config = Config::from_yaml(VALID).unwrap();
        assert_eq!(config.integrations.len(), 2);
        assert_eq!(config.get("npm").unwrap().policy.update, policy::UpdateLevel::Minor);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let doc = r#"
version: 1
integrations:
  - id: npm
    policy: { update: minor }
  - id: npm
    policy: { update: patch }
"#;
        assert!(Config::from_yaml(doc).is_err());
    }

    #[test]
    fn rejects_unsupported_version() {
        let doc = r#"
version: 2
integrations: []
"#;
        assert!(Config::from_yaml(doc).is_err());
    }

    #[test]
    fn rejects_out_of_range_pr_limit() {
        let doc = r#"
version: 1
integrations:
  - id: npm
    policy:
      update: minor
      open_pull_requests_limit: 11
"#;
        assert!(Config::from_yaml(doc).is_err());
    }

    #[test]
    fn round_trips_through_serde_yaml() {
        let config = Config::from_yaml(VALID).unwrap();
        let serialized = serde_yaml::to_string(&config).unwrap();
        let reparsed = Config::from_yaml(&serialized).unwrap();
        assert_eq!(reparsed.integrations.len(), config.integrations.len());
    }
}
