// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declaration context for one module evaluation
//!
//! Bundles the registries with the collaborators that resource initializers
//! need. Collaborators are injected here rather than looked up globally.

use std::sync::Arc;

use crate::aws;
use crate::catalog::{CatalogProvider, ImageFamilyUsernames, UsernameResolver};
use crate::config::ProvisioningConfig;
use crate::errors::ProvisioningResult;
use crate::promise::PromiseRegistry;
use crate::registry::IndexRegistry;
use crate::resource::{ResourceInstance, ResourceRef};

pub struct DeclarationContext {
    registry: IndexRegistry,
    catalog: Arc<dyn CatalogProvider>,
    usernames: Arc<dyn UsernameResolver>,
    config: ProvisioningConfig,
}

impl DeclarationContext {
    /// Context with the AWS resource types registered and default login rules
    pub fn new(catalog: Arc<dyn CatalogProvider>) -> ProvisioningResult<Self> {
        let mut registry = IndexRegistry::new(Arc::new(PromiseRegistry::new()));
        aws::register_schemas(&mut registry)?;
        Ok(Self {
            registry,
            catalog,
            usernames: Arc::new(ImageFamilyUsernames),
            config: ProvisioningConfig::default(),
        })
    }

    pub fn with_usernames(mut self, usernames: Arc<dyn UsernameResolver>) -> Self {
        self.usernames = usernames;
        self
    }

    pub fn with_config(mut self, config: ProvisioningConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the type's cross-field checks, register, then record ownership
    ///
    /// Typed initializers such as `Ec2Instance::declare` come through here, so
    /// a raw instance gets the same catalog checks and composite bookkeeping.
    pub fn declare(&mut self, instance: ResourceInstance) -> ProvisioningResult<ResourceRef> {
        aws::validate_declaration(self.catalog.as_ref(), &instance)?;
        let reference = self.registry.register(instance)?;
        let owned = aws::owned_resource(self.registry.get(&reference)?.instance());
        if let Some(owned) = owned {
            self.registry.adopt(&reference, &owned)?;
        }
        Ok(reference)
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    pub fn promises(&self) -> Arc<PromiseRegistry> {
        Arc::clone(self.registry.promises())
    }

    pub fn catalog(&self) -> &dyn CatalogProvider {
        self.catalog.as_ref()
    }

    pub fn usernames(&self) -> &dyn UsernameResolver {
        self.usernames.as_ref()
    }

    pub fn config(&self) -> &ProvisioningConfig {
        &self.config
    }

    /// Finish declaration and hand the graph to deployment
    pub fn into_registry(self) -> IndexRegistry {
        self.registry
    }
}
