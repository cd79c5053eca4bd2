//! The engine orchestrator (§4.2): Scan → Plan → Update, with bounded
//! concurrency and partial-failure semantics.
//!
//! The fan-out/rejoin shape is generalized from the teacher's
//! `FuturesOrdered`-based audit loop in `crates/zizmor/src/main.rs`'s
//! `run()`, from "one future per audit on one input" to "one future
//! per integration" (Scan) or "one future per manifest" (Plan/Update),
//! each gated by a `tokio::sync::Semaphore` of depth `concurrency`
//! instead of running fully unbounded.

use std::collections::HashMap;
use std::sync::Arc;

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::config::policy::{IntegrationPolicy, MatchConfig};
use crate::filter::ReleaseTimestamps;
use crate::integration::{Integration, IntegrationRegistry};
use crate::models::update::ApplyResult;
use crate::models::{Manifest, UpdatePlan};

const DEFAULT_CONCURRENCY: usize = 4;

/// The context threaded into `Integration::plan` (§4.2, §4.3): the
/// effective policy for this call, a cancellation signal, and
/// (optionally) the release-timestamp data cooldown evaluation needs.
pub struct PlanContext {
    pub policy: IntegrationPolicy,
    pub cancellation: CancellationToken,
    pub release_timestamps: Option<Arc<ReleaseTimestamps>>,
}

/// The uniform envelope every phase returns (§6 "Engine exposed
/// operations"): a payload, an `errors[]` list (never fatal to the
/// phase), and a wall-clock timestamp.
#[derive(Debug, Clone)]
pub struct PhaseResult<T> {
    pub payload: T,
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

pub type ScanResult = PhaseResult<Vec<Manifest>>;
pub type PlanResult = PhaseResult<Vec<UpdatePlan>>;
pub type UpdateResult = PhaseResult<Vec<ApplyResult>>;

/// The orchestration kernel (§4.2).
pub struct Engine {
    integrations: IntegrationRegistry,
    policies: HashMap<String, IntegrationPolicy>,
    match_configs: HashMap<String, MatchConfig>,
    concurrency: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl Engine {
    pub fn new(concurrency: usize) -> Self {
        Self {
            integrations: IntegrationRegistry::new(),
            policies: HashMap::new(),
            match_configs: HashMap::new(),
            concurrency,
        }
    }

    pub fn register(&mut self, integration: Box<dyn Integration>) {
        self.integrations.register(integration);
    }

    pub fn set_policies(&mut self, policies: HashMap<String, IntegrationPolicy>) {
        self.policies = policies;
    }

    pub fn set_match_configs(&mut self, match_configs: HashMap<String, MatchConfig>) {
        self.match_configs = match_configs;
    }

    pub fn get_integration(&self, name: &str) -> Option<&dyn Integration> {
        self.integrations.get(name)
    }

    pub fn list_integrations(&self) -> Vec<&str> {
        self.integrations.names().collect()
    }

    /// Resolves the active integration-name set: `only` wins if
    /// non-empty (unknown names silently yield nothing), otherwise all
    /// registered minus `exclude` (§4.2 "Filtering").
    fn active_set(&self, only: &[String], exclude: &[String]) -> Vec<String> {
        if !only.is_empty() {
            return only
                .iter()
                .filter(|name| {
                    let registered = self.integrations.get(name).is_some();
                    if !registered {
                        tracing::warn!(integration = %name, "'only' names an unregistered integration, skipping");
                    }
                    registered
                })
                .cloned()
                .collect();
        }

        self.integrations
            .names()
            .filter(|name| {
                let excluded = exclude.iter().any(|e| e == name);
                if excluded {
                    tracing::debug!(integration = %name, "integration excluded from active set");
                }
                !excluded
            })
            .map(str::to_string)
            .collect()
    }

    /// §4.2 Scan.
    #[tracing::instrument(skip(self, cancellation))]
    pub async fn scan(
        &self,
        repo_root: &Utf8Path,
        only: &[String],
        exclude: &[String],
        cancellation: &CancellationToken,
    ) -> ScanResult {
        let active = self.active_set(only, exclude);
        let semaphore = Arc::new(Semaphore::new(self.concurrency.max(1)));

        let mut tasks = FuturesUnordered::new();
        for name in active {
            let semaphore = Arc::clone(&semaphore);
            let cancellation = cancellation.clone();
            tasks.push(async move {
                if cancellation.is_cancelled() {
                    return (name, Err("cancelled".to_string()));
                }
                let _permit = semaphore.acquire().await;
                let Some(integration) = self.integrations.get(&name) else {
                    return (name, Err("integration not registered".to_string()));
                };

                match integration.detect(repo_root).await {
                    Ok(manifests) => (name, Ok(manifests)),
                    Err(e) => (name.clone(), Err(format!("{name}: {e}"))),
                }
            });
        }

        let mut manifests = Vec::new();
        let mut errors = Vec::new();

        while let Some((name, result)) = tasks.next().await {
            match result {
                Ok(detected) => {
                    let filtered = match self.match_configs.get(&name) {
                        Some(match_config) => detected
                            .into_iter()
                            .filter(|m| manifest_passes_match(m, match_config))
                            .collect(),
                        None => detected,
                    };
                    manifests.extend(filtered);
                }
                Err(e) => errors.push(e),
            }
        }

        ScanResult {
            payload: manifests,
            errors,
            timestamp: Utc::now(),
        }
    }

    /// §4.2 Plan.
    #[tracing::instrument(skip(self, manifests, cancellation, release_timestamps))]
    pub async fn plan(
        &self,
        manifests: &[Manifest],
        cancellation: &CancellationToken,
        release_timestamps: Option<Arc<ReleaseTimestamps>>,
    ) -> PlanResult {
        let semaphore = Arc::new(Semaphore::new(self.concurrency.max(1)));
        let mut tasks = FuturesUnordered::new();

        for manifest in manifests {
            let semaphore = Arc::clone(&semaphore);
            let cancellation = cancellation.clone();
            let release_timestamps = release_timestamps.clone();

            tasks.push(async move {
                if cancellation.is_cancelled() {
                    return Err(format!("{}: cancelled", manifest.path));
                }

                let Some(integration) = self.integrations.get(&manifest.integration) else {
                    return Err(format!(
                        "{}: no integration registered for type '{}'",
                        manifest.path, manifest.integration
                    ));
                };

                let _permit = semaphore.acquire().await;

                let policy = self
                    .policies
                    .get(&manifest.integration)
                    .cloned()
                    .unwrap_or_else(IntegrationPolicy::system_default);

                let ctx = PlanContext {
                    policy,
                    cancellation,
                    release_timestamps,
                };

                integration
                    .plan(manifest, &ctx)
                    .await
                    .map_err(|e| format!("{}: {e}", manifest.path))
            });
        }

        let mut plans = Vec::new();
        let mut errors = Vec::new();

        while let Some(result) = tasks.next().await {
            match result {
                Ok(plan) => plans.push(plan),
                Err(e) => errors.push(e),
            }
        }

        PlanResult {
            payload: plans,
            errors,
            timestamp: Utc::now(),
        }
    }

    /// §4.2 Update.
    #[tracing::instrument(skip(self, plans, cancellation))]
    pub async fn update(
        &self,
        plans: &[UpdatePlan],
        dry_run: bool,
        cancellation: &CancellationToken,
    ) -> UpdateResult {
        if dry_run {
            return UpdateResult {
                payload: Vec::new(),
                errors: Vec::new(),
                timestamp: Utc::now(),
            };
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency.max(1)));
        let mut tasks = FuturesUnordered::new();

        for plan in plans {
            let semaphore = Arc::clone(&semaphore);
            let cancellation = cancellation.clone();

            tasks.push(async move {
                if cancellation.is_cancelled() {
                    return Err(format!("{}: cancelled", plan.manifest.path));
                }

                let Some(integration) = self.integrations.get(&plan.manifest.integration) else {
                    return Err(format!(
                        "{}: no integration registered for type '{}'",
                        plan.manifest.path, plan.manifest.integration
                    ));
                };

                let _permit = semaphore.acquire().await;

                integration
                    .apply(plan)
                    .await
                    .map_err(|e| format!("{}: {e}", plan.manifest.path))
            });
        }

        let mut results = Vec::new();
        let mut errors = Vec::new();

        // On Apply failure, record the error but do NOT include a
        // result entry for that plan (Open Question (a)).
        while let Some(result) = tasks.next().await {
            match result {
                Ok(applied) => results.push(applied),
                Err(e) => errors.push(e),
            }
        }

        UpdateResult {
            payload: results,
            errors,
            timestamp: Utc::now(),
        }
    }
}

fn manifest_passes_match(manifest: &Manifest, match_config: &MatchConfig) -> bool {
    let path = manifest.path.as_str();

    let files_ok =
        match_config.files.is_empty() || crate::filter::glob::matches_any(&match_config.files, path);
    let excluded = crate::filter::glob::matches_any(&match_config.exclude, path);

    files_ok && !excluded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::models::manifest::{Dependency, DependencyType};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeIntegration {
        name: &'static str,
        manifests: Vec<Manifest>,
        should_fail_detect: bool,
        detect_calls: Arc<AtomicUsize>,
    }

    impl crate::integration::IntegrationMeta for FakeIntegration {
        fn name(&self) -> &str {
            self.name
        }
    }

    #[async_trait]
    impl Integration for FakeIntegration {
        async fn detect(&self, _repo_root: &Utf8Path) -> anyhow::Result<Vec<Manifest>> {
            self.detect_calls.fetch_add(1, Ordering::SeqCst);
            if self.should_fail_detect {
                anyhow::bail!("detect failed");
            }
            Ok(self.manifests.clone())
        }

        async fn plan(&self, manifest: &Manifest, _ctx: &PlanContext) -> anyhow::Result<UpdatePlan> {
            Ok(UpdatePlan::empty(manifest.clone()))
        }

        async fn apply(&self, _plan: &UpdatePlan) -> anyhow::Result<ApplyResult> {
            Ok(ApplyResult::default())
        }

        async fn validate(&self, _manifest: &Manifest) -> Result<(), EngineError> {
            Ok(())
        }
    }

    fn manifest(path: &str, integration: &str) -> Manifest {
        Manifest::new(
            path,
            integration,
            vec![Dependency {
                name: "dep".to_string(),
                current_version: "1.0.0".to_string(),
                dep_type: DependencyType::Production,
                constraint: None,
            }],
        )
    }

    #[tokio::test]
    async fn scenario_1_single_integration_two_manifests() {
        let mut engine = Engine::default();
        engine.register(Box::new(FakeIntegration {
            name: "npm",
            manifests: vec![manifest("a/package.json", "npm"), manifest("b/package.json", "npm")],
            should_fail_detect: false,
            detect_calls: Arc::new(AtomicUsize::new(0)),
        }));

        let before = Utc::now();
        let result = engine
            .scan(Utf8Path::new("/repo"), &[], &[], &CancellationToken::new())
            .await;
        let after = Utc::now();

        assert_eq!(result.payload.len(), 2);
        assert!(result.payload.iter().all(|m| m.integration == "npm"));
        assert!(result.errors.is_empty());
        assert!(result.timestamp >= before && result.timestamp <= after);
    }

    #[tokio::test]
    async fn scenario_2_one_integration_fails_other_succeeds() {
        let mut engine = Engine::default();
        engine.register(Box::new(FakeIntegration {
            name: "npm",
            manifests: vec![],
            should_fail_detect: true,
            detect_calls: Arc::new(AtomicUsize::new(0)),
        }));
        engine.register(Box::new(FakeIntegration {
            name: "helm",
            manifests: vec![manifest("charts/app/Chart.yaml", "helm")],
            should_fail_detect: false,
            detect_calls: Arc::new(AtomicUsize::new(0)),
        }));

        let result = engine
            .scan(Utf8Path::new("/repo"), &[], &[], &CancellationToken::new())
            .await;

        assert_eq!(result.payload.len(), 1);
        assert_eq!(result.payload[0].integration, "helm");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("npm"));
    }

    #[tokio::test]
    async fn scenario_3_only_filter_limits_active_set() {
        let mut engine = Engine::default();
        let npm_calls = Arc::new(AtomicUsize::new(0));
        let helm_calls = Arc::new(AtomicUsize::new(0));
        let terraform_calls = Arc::new(AtomicUsize::new(0));

        engine.register(Box::new(FakeIntegration {
            name: "npm",
            manifests: vec![manifest("package.json", "npm")],
            should_fail_detect: false,
            detect_calls: Arc::clone(&npm_calls),
        }));
        engine.register(Box::new(FakeIntegration {
            name: "helm",
            manifests: vec![],
            should_fail_detect: false,
            detect_calls: Arc::clone(&helm_calls),
        }));
        engine.register(Box::new(FakeIntegration {
            name: "terraform",
            manifests: vec![],
            should_fail_detect: false,
            detect_calls: Arc::clone(&terraform_calls),
        }));

        engine
            .scan(
                Utf8Path::new("/repo"),
                &["npm".to_string()],
                &[],
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(npm_calls.load(Ordering::SeqCst), 1);
        assert_eq!(helm_calls.load(Ordering::SeqCst), 0);
        assert_eq!(terraform_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dry_run_update_calls_no_integration() {
        let engine = Engine::default();
        let plans = vec![];
        let result = engine.update(&plans, true, &CancellationToken::new()).await;
        assert!(result.payload.is_empty());
        assert!(result.errors.is_empty());
    }
}
