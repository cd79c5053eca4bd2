//! The integration contract (§4.1) and the registry of integrations
//! (§2 "Integration registry").

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::engine::PlanContext;
use crate::error::EngineError;
use crate::models::{Manifest, UpdatePlan};
use crate::models::update::ApplyResult;

/// Metadata an integration must expose independent of any instance
/// state, mirroring the split between `AuditCore` and `Audit` in the
/// teacher: callers can ask "what's this integration called?" without
/// needing a constructed value.
pub trait IntegrationMeta {
    fn name(&self) -> &str;
}

/// The four-operation contract every ecosystem integration implements
/// (§4.1). The engine never inspects integration internals; it only
/// calls these operations and reports their failures.
#[async_trait]
pub trait Integration: IntegrationMeta + Send + Sync {
    /// Walks the tree from `repo_root` and returns every manifest of
    /// this ecosystem, fully populated with its declared dependencies.
    /// Must be idempotent and side-effect free.
    async fn detect(&self, repo_root: &camino::Utf8Path) -> anyhow::Result<Vec<Manifest>>;

    /// Returns one plan whose updates reflect upstream availability
    /// under the effective policy in `ctx`. A plan with zero updates
    /// is valid and MUST still be returned.
    async fn plan(&self, manifest: &Manifest, ctx: &PlanContext) -> anyhow::Result<UpdatePlan>;

    /// Rewrites the manifest file(s) on disk to reflect every update
    /// in `plan`, preserving original formatting wherever the
    /// ecosystem permits.
    async fn apply(&self, plan: &UpdatePlan) -> anyhow::Result<ApplyResult>;

    /// Fails if `manifest` is syntactically malformed.
    async fn validate(&self, manifest: &Manifest) -> Result<(), EngineError>;
}

/// The process-wide (or, here, engine-instance-wide) table of
/// registered integrations, keyed by name.
///
/// Per Design Notes §9, the language-neutral reimplementation prefers
/// explicit registration into the engine rather than a global table;
/// this registry is owned by the [`crate::engine::Engine`] that
/// constructs it, not a `static`.
#[derive(Default)]
pub struct IntegrationRegistry {
    integrations: IndexMap<String, Box<dyn Integration>>,
}

impl IntegrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, integration: Box<dyn Integration>) {
        let name = integration.name().to_string();
        self.integrations.insert(name, integration);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Integration> {
        self.integrations.get(name).map(|b| b.as_ref())
    }

    pub fn len(&self) -> usize {
        self.integrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.integrations.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.integrations.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Integration)> {
        self.integrations
            .iter()
            .map(|(name, integration)| (name.as_str(), integration.as_ref()))
    }
}

impl std::fmt::Debug for IntegrationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrationRegistry")
            .field("integrations", &self.integrations.len())
            .finish()
    }
}
