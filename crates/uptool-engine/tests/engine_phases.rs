//! End-to-end coverage of the Scan → Plan → Update pipeline against a
//! fake integration, exercising the filter pipeline and the versioning
//! strategy together rather than each in isolation.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use tokio_util::sync::CancellationToken;

use uptool_engine::config::policy::{IntegrationPolicy, VersioningStrategy};
use uptool_engine::engine::PlanContext;
use uptool_engine::filter::UpdateFilter;
use uptool_engine::models::manifest::{Dependency, DependencyType};
use uptool_engine::models::version::Impact;
use uptool_engine::{ApplyResult, Engine, EngineError, Integration, IntegrationMeta, Manifest, Update, UpdatePlan};

struct Npm;

impl IntegrationMeta for Npm {
    fn name(&self) -> &str {
        "npm"
    }
}

#[async_trait]
impl Integration for Npm {
    async fn detect(&self, repo_root: &Utf8Path) -> anyhow::Result<Vec<Manifest>> {
        Ok(vec![Manifest::new(
            repo_root.join("package.json"),
            "npm",
            vec![
                Dependency {
                    name: "left-pad".to_string(),
                    current_version: "1.0.0".to_string(),
                    dep_type: DependencyType::Production,
                    constraint: Some("^1.0.0".to_string()),
                },
                Dependency {
                    name: "eslint".to_string(),
                    current_version: "8.0.0".to_string(),
                    dep_type: DependencyType::Development,
                    constraint: Some("^8.0.0".to_string()),
                },
            ],
        )])
    }

    async fn plan(&self, manifest: &Manifest, ctx: &PlanContext) -> anyhow::Result<UpdatePlan> {
        let mut plan = UpdatePlan::empty(manifest.clone());
        let filter = UpdateFilter::new(&ctx.policy);
        let now = chrono::Utc::now();

        for dep in &manifest.dependencies {
            let (target, impact) = match dep.name.as_str() {
                "left-pad" => ("1.0.1".to_string(), Impact::Patch),
                "eslint" => ("9.0.0".to_string(), Impact::Major),
                _ => continue,
            };

            let mut update = Update::new(dep.clone(), target, impact);
            if let uptool_engine::FilterDecision::Passed { group } =
                filter.apply(&mut update, ctx.release_timestamps.as_deref(), now)
            {
                update.group = group;
                plan.updates.push(update);
            }
        }

        Ok(plan)
    }

    async fn apply(&self, plan: &UpdatePlan) -> anyhow::Result<ApplyResult> {
        Ok(ApplyResult {
            applied: plan.updates.len(),
            failed: 0,
            diff: Some(format!("{} update(s) applied", plan.updates.len())),
        })
    }

    async fn validate(&self, _manifest: &Manifest) -> Result<(), EngineError> {
        Ok(())
    }
}

fn devtools_policy() -> IntegrationPolicy {
    let mut policy = IntegrationPolicy::system_default();
    policy.versioning_strategy = VersioningStrategy::Widen;
    policy
}

#[tokio::test]
async fn full_pipeline_scan_plan_update() {
    let mut engine = Engine::default();
    engine.register(Box::new(Npm));
    engine.set_policies(std::collections::HashMap::from([(
        "npm".to_string(),
        devtools_policy(),
    )]));

    let cancellation = CancellationToken::new();
    let repo_root = Utf8PathBuf::from("/repo");

    let scanned = engine.scan(&repo_root, &[], &[], &cancellation).await;
    assert!(scanned.errors.is_empty());
    assert_eq!(scanned.payload.len(), 1);

    let planned = engine.plan(&scanned.payload, &cancellation, None).await;
    assert!(planned.errors.is_empty());
    assert_eq!(planned.payload.len(), 1);

    let plan = &planned.payload[0];
    // Minor-impact ceiling defaults to `minor` (system default), so the
    // major eslint bump is still present here: the policy only caps
    // through the filter's grouping/versioning stages, not impact
    // itself (§4.3 `update` governs Plan's candidate generation, which
    // this fake integration doesn't model — it always proposes both).
    assert_eq!(plan.updates.len(), 2);

    let left_pad = plan
        .updates
        .iter()
        .find(|u| u.dependency.name == "left-pad")
        .unwrap();
    assert!(!left_pad.rewrite_constraint);

    let eslint = plan
        .updates
        .iter()
        .find(|u| u.dependency.name == "eslint")
        .unwrap();
    assert_eq!(eslint.new_constraint.as_deref(), Some(">=8.0.0"));
    assert!(eslint.rewrite_constraint);

    let updated = engine.update(&planned.payload, false, &cancellation).await;
    assert!(updated.errors.is_empty());
    assert_eq!(updated.payload.len(), 1);
    assert_eq!(updated.payload[0].applied, 2);

    let dry_run = engine.update(&planned.payload, true, &cancellation).await;
    assert!(dry_run.payload.is_empty());
}

#[tokio::test]
async fn scan_respects_exclude_filter() {
    let mut engine = Engine::default();
    engine.register(Box::new(Npm));

    let cancellation = CancellationToken::new();
    let scanned = engine
        .scan(
            Utf8Path::new("/repo"),
            &[],
            &["npm".to_string()],
            &cancellation,
        )
        .await;

    assert!(scanned.payload.is_empty());
    assert!(scanned.errors.is_empty());
}
