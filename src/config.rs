// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::{ProvisioningError, ProvisioningResult};

/// Environment variable naming the catalog JSON file
pub const ENV_CATALOG: &str = "CIM_PROVISIONING_CATALOG";
/// Environment variable overriding the SSH port of host descriptors
pub const ENV_SSH_PORT: &str = "CIM_PROVISIONING_SSH_PORT";
/// Environment variable bounding concurrent deployments per dependency level
pub const ENV_PARALLELISM: &str = "CIM_PROVISIONING_PARALLELISM";

/// Settings shared by declaration and deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    /// Catalog file for [`StaticCatalog::from_path`](crate::catalog::StaticCatalog::from_path)
    pub catalog_path: Option<PathBuf>,

    /// Port placed in host connection descriptors
    pub default_ssh_port: u16,

    /// Upper bound on resources deployed at once within a dependency level
    pub max_parallel_deployments: usize,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            default_ssh_port: 22,
            max_parallel_deployments: 8,
        }
    }
}

impl ProvisioningConfig {
    /// Load configuration from environment variables, defaulting what is unset
    pub fn from_env() -> ProvisioningResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> ProvisioningResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let catalog_path = lookup(ENV_CATALOG).map(PathBuf::from);

        let default_ssh_port = match lookup(ENV_SSH_PORT) {
            Some(port) => port.parse().map_err(|_| {
                ProvisioningError::Configuration(format!(
                    "{} must be a port, got '{}'",
                    ENV_SSH_PORT, port
                ))
            })?,
            None => defaults.default_ssh_port,
        };

        let max_parallel_deployments = match lookup(ENV_PARALLELISM) {
            Some(value) => match value.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ProvisioningError::Configuration(format!(
                        "{} must be a positive integer, got '{}'",
                        ENV_PARALLELISM, value
                    )))
                }
            },
            None => defaults.max_parallel_deployments,
        };

        Ok(Self {
            catalog_path,
            default_ssh_port,
            max_parallel_deployments,
        })
    }

    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    pub fn with_ssh_port(mut self, port: u16) -> Self {
        self.default_ssh_port = port;
        self
    }

    pub fn with_parallelism(mut self, max: usize) -> Self {
        self.max_parallel_deployments = max.max(1);
        self
    }
}
