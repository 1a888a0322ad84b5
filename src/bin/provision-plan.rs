// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Plan
//!
//! Declares a JSON module manifest against a region catalog and prints the
//! resulting deployment order. Nothing is deployed.
//!
//! Run with: cargo run --bin provision-plan -- manifest.json
//!
//! Prerequisites:
//! 1. CIM_PROVISIONING_CATALOG pointing at a catalog JSON file
//! 2. Optional CIM_PROVISIONING_SSH_PORT for host descriptors

use anyhow::{Context, Result};
use cim_provisioning::{
    aws::ModuleManifest, catalog::StaticCatalog, deploy::deployment_levels, DeclarationContext,
    ProvisioningConfig,
};
use std::sync::Arc;
use tracing::{debug, info};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let manifest_path = std::env::args()
        .nth(1)
        .context("Usage: provision-plan <manifest.json>")?;

    let config = ProvisioningConfig::from_env().context("Invalid provisioning configuration")?;
    let catalog_path = config
        .catalog_path
        .clone()
        .context("CIM_PROVISIONING_CATALOG not set")?;

    info!(catalog = %catalog_path.display(), "Loading region catalog");
    let catalog = StaticCatalog::from_path(&catalog_path)
        .with_context(|| format!("Failed to load catalog {}", catalog_path.display()))?;

    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("Failed to read manifest {}", manifest_path))?;
    let manifest = ModuleManifest::from_json(&json).context("Failed to parse manifest")?;

    let mut ctx = DeclarationContext::new(Arc::new(catalog))?.with_config(config);
    let module = manifest.declare(&mut ctx).context("Declaration failed")?;
    debug!(hosts = module.hosts.len(), instances = module.instances.len(), "Module declared");

    let registry = ctx.registry();
    info!(
        resources = registry.len(),
        promises = registry.promises().len(),
        "Declaration complete"
    );

    for (level, resources) in deployment_levels(registry)?.iter().enumerate() {
        println!("level {}:", level);
        for reference in resources {
            println!("  {}", reference);
        }
    }

    for host in &module.hosts {
        println!(
            "host {}: {}@<{}>:{}",
            host.reference(),
            host.host().username(),
            host.host().address().label(),
            host.host().port()
        );
    }

    let snapshot = serde_json::to_string_pretty(&registry.snapshot())?;
    println!("{}", snapshot);

    Ok(())
}
