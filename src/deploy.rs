// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Driver
//!
//! Walks a declared graph in dependency order and hands each resource to an
//! external [`Deployer`], the only party that resolves promises.
//!
//! # Levels
//!
//! ```text
//! level 0: EC2KeyPair(ops)   IAMRole(deployer)
//! level 1: EC2Instance(eu-west-1, web-1)
//! level 2: EC2InstanceHost(eu-west-1, web-1)
//! ```
//!
//! Resources within a level are deployed concurrently, bounded by
//! `max_parallel_deployments`. A resource whose dependency failed or was
//! skipped is skipped itself.
//!
//! # Promise settlement
//!
//! Every promise owned by a resource is settled once its deployment step is
//! over: a failed or skipped resource cancels its pending promises with the
//! reason, and a successful deployment that left a promise pending cancels it
//! too. Readers therefore never wait on a resource that will not resolve them.
//! Timeouts and retries are the deployer's business.

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ProvisioningConfig;
use crate::errors::{ProvisioningError, ProvisioningResult};
use crate::promise::PromiseRegistry;
use crate::registry::{IndexRegistry, RegisteredResource};
use crate::resource::ResourceRef;

/// Engine-side hook that deploys one resource and resolves its promises
#[async_trait]
pub trait Deployer: Send + Sync {
    async fn deploy(
        &self,
        resource: &RegisteredResource,
        promises: &PromiseRegistry,
    ) -> ProvisioningResult<()>;
}

/// What happened to one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentOutcome {
    Deployed,
    Failed(ProvisioningError),
    /// Not attempted because `dependency` was not deployed
    Skipped { dependency: ResourceRef },
}

/// Outcomes in the order resources were processed
#[derive(Debug, Clone, Default)]
pub struct DeploymentReport {
    outcomes: Vec<(ResourceRef, DeploymentOutcome)>,
}

impl DeploymentReport {
    pub fn outcomes(&self) -> &[(ResourceRef, DeploymentOutcome)] {
        &self.outcomes
    }

    pub fn outcome(&self, reference: &ResourceRef) -> Option<&DeploymentOutcome> {
        self.outcomes
            .iter()
            .find(|(r, _)| r == reference)
            .map(|(_, outcome)| outcome)
    }

    pub fn deployed(&self) -> Vec<&ResourceRef> {
        self.filter(|outcome| matches!(outcome, DeploymentOutcome::Deployed))
    }

    pub fn failed(&self) -> Vec<&ResourceRef> {
        self.filter(|outcome| matches!(outcome, DeploymentOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> Vec<&ResourceRef> {
        self.filter(|outcome| matches!(outcome, DeploymentOutcome::Skipped { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, outcome)| *outcome == DeploymentOutcome::Deployed)
    }

    fn filter(&self, predicate: impl Fn(&DeploymentOutcome) -> bool) -> Vec<&ResourceRef> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .map(|(r, _)| r)
            .collect()
    }
}

/// Group the deployment order into levels of mutually independent resources
pub fn deployment_levels(registry: &IndexRegistry) -> ProvisioningResult<Vec<Vec<ResourceRef>>> {
    let mut depth: HashMap<Uuid, usize> = HashMap::new();
    let mut levels: Vec<Vec<ResourceRef>> = Vec::new();

    for reference in registry.deployment_order()? {
        let level = registry
            .dependencies(&reference)?
            .iter()
            .filter_map(|dependency| depth.get(&dependency.id()))
            .map(|d| d + 1)
            .max()
            .unwrap_or(0);
        depth.insert(reference.id(), level);
        if levels.len() <= level {
            levels.resize_with(level + 1, Vec::new);
        }
        levels[level].push(reference);
    }

    Ok(levels)
}

/// Deploy every registered resource, dependencies first
///
/// Fails only if the graph cannot be ordered; per-resource failures are
/// reported in the [`DeploymentReport`].
pub async fn deploy_graph(
    registry: &IndexRegistry,
    deployer: &dyn Deployer,
    config: &ProvisioningConfig,
) -> ProvisioningResult<DeploymentReport> {
    let promises = registry.promises().as_ref();
    let levels = deployment_levels(registry)?;
    let mut deployed: HashMap<Uuid, bool> = HashMap::new();
    let mut report = DeploymentReport::default();

    info!(resources = registry.len(), levels = levels.len(), "Starting deployment");

    for level in levels {
        let mut runnable = Vec::new();
        for reference in level {
            let blocked = registry
                .dependencies(&reference)?
                .into_iter()
                .find(|dependency| !deployed.get(&dependency.id()).copied().unwrap_or(false));

            match blocked {
                Some(dependency) => {
                    let reason = format!("dependency {} was not deployed", dependency);
                    promises.cancel_owner(&reference, &reason);
                    warn!(resource = %reference, %dependency, "Skipping deployment");
                    deployed.insert(reference.id(), false);
                    report
                        .outcomes
                        .push((reference, DeploymentOutcome::Skipped { dependency }));
                }
                None => runnable.push(reference),
            }
        }

        for chunk in runnable.chunks(config.max_parallel_deployments.max(1)) {
            let results = join_all(chunk.iter().map(|reference| async move {
                let entry = registry.get(reference)?;
                deployer.deploy(entry, promises).await
            }))
            .await;

            for (reference, result) in chunk.iter().zip(results) {
                let outcome = match result {
                    Ok(()) => {
                        let unresolved = promises.cancel_owner(
                            reference,
                            "deployment finished without resolving",
                        );
                        if unresolved > 0 {
                            warn!(
                                resource = %reference,
                                unresolved,
                                "Deployment left promises unresolved"
                            );
                        }
                        info!(resource = %reference, "Deployed");
                        DeploymentOutcome::Deployed
                    }
                    Err(err) => {
                        promises.cancel_owner(reference, &err.to_string());
                        warn!(resource = %reference, error = %err, "Deployment failed");
                        DeploymentOutcome::Failed(err)
                    }
                };
                deployed.insert(reference.id(), outcome == DeploymentOutcome::Deployed);
                report.outcomes.push((reference.clone(), outcome));
            }
        }
    }

    info!(
        deployed = report.deployed().len(),
        failed = report.failed().len(),
        skipped = report.skipped().len(),
        "Deployment finished"
    );
    Ok(report)
}
