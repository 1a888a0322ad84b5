// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource, identity and promise model for declarative provisioning
//!
//! Modules declare resources; the [`registry::IndexRegistry`] coalesces
//! identical declarations of the same identity and rejects conflicting ones.
//! Values only known after deployment are [`promise::PromiseRef`]s that a
//! [`deploy::Deployer`] resolves and any reader may await.
//!
//! ```text
//! ModuleManifest ─declare─▶ DeclarationContext ─register─▶ IndexRegistry
//!                                   │                          │
//!                              CatalogProvider            PromiseRegistry
//!                                                              ▲
//!                         deploy_graph ─▶ Deployer ─resolve────┘
//! ```

pub mod aws;
pub mod catalog;
pub mod config;
pub mod context;
pub mod credentials;
pub mod deploy;
pub mod domain;
pub mod errors;
pub mod promise;
pub mod registry;
pub mod resource;

// Re-export commonly used types
pub use config::ProvisioningConfig;
pub use context::DeclarationContext;
pub use deploy::{deploy_graph, Deployer, DeploymentOutcome, DeploymentReport};
pub use errors::{ProvisioningError, ProvisioningResult};
pub use promise::{PromiseRef, PromiseRegistry, PromiseState};
pub use registry::{IndexRegistry, RegisteredResource};
pub use resource::{FieldValue, IdentityKey, Resource, ResourceInstance, ResourceRef};
