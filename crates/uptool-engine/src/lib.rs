//! `uptool-engine`: a language- and ecosystem-agnostic dependency
//! update engine.
//!
//! The crate exposes a pluggable [`Integration`] contract and an
//! [`Engine`] that drives it through three phases — Scan, Plan, and
//! Update — under a configuration document, a four-tier policy
//! resolver, a five-stage update filter, and a schedule/cadence layer
//! deciding when each integration is due for another pass.

#![warn(clippy::all)]

pub mod cadence;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod integration;
pub mod models;
pub mod pathgate;
pub mod policy_resolver;
pub mod schedule;

pub use config::policy::IntegrationPolicy;
pub use config::Config;
pub use engine::{Engine, PhaseResult, PlanContext, ScanResult, PlanResult, UpdateResult};
pub use error::EngineError;
pub use integration::{Integration, IntegrationMeta, IntegrationRegistry};
pub use models::{
    ApplyResult, Dependency, DependencyType, FilterDecision, Manifest, RewriteStrategy, Update,
    UpdatePlan, Version,
};
