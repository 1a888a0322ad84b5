// Copyright (c) 2025 - Cowboy AI, Inc.
//! AWS Resource Types
//!
//! The resource module built on the declaration model:
//!
//! | Type              | Identity                          | Promises         |
//! |-------------------|-----------------------------------|------------------|
//! | `IAMRole`         | `name`                            |                  |
//! | `EC2KeyPair`      | `name`                            |                  |
//! | `EC2Instance`     | `region`, `name`                  | `public_address` |
//! | `EC2InstanceHost` | `instance.region`, `instance.name` | aliases `public_address` |
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cim_provisioning::aws::{Ec2InstanceHost, Ec2InstanceSpec, Ec2KeyPair};
//! use cim_provisioning::catalog::StaticCatalog;
//! use cim_provisioning::context::DeclarationContext;
//! use cim_provisioning::domain::Region;
//!
//! let region = Region::new("eu-west-1").unwrap();
//! let catalog = StaticCatalog::new()
//!     .with_image(&region, "ubuntu-22.04")
//!     .with_instance_type(&region, "t3.micro");
//! let mut ctx = DeclarationContext::new(Arc::new(catalog)).unwrap();
//!
//! let key = Ec2KeyPair::new("ops", "ssh-ed25519 AAAAC3 ops@example").declare(&mut ctx).unwrap();
//! let spec = Ec2InstanceSpec::new("web-1", region, key, "ubuntu-22.04", "t3.micro");
//! let host = Ec2InstanceHost::declare(&mut ctx, spec, None).unwrap();
//!
//! assert_eq!(host.host().username(), "ubuntu");
//! assert!(host.host().try_connect_target().is_none());
//! ```

pub mod host;
pub mod iam_role;
pub mod instance;
pub mod key_pair;
pub mod manifest;

pub use host::{Ec2InstanceHost, HostDescriptor, SshTarget};
pub use iam_role::IamRole;
pub use instance::{Ec2Instance, Ec2InstanceSpec, PUBLIC_ADDRESS};
pub use key_pair::Ec2KeyPair;
pub use manifest::{DeclaredModule, HostDeclaration, InstanceDeclaration, ModuleManifest};

use crate::catalog::CatalogProvider;
use crate::domain::ConstrainedType;
use crate::errors::ProvisioningResult;
use crate::registry::IndexRegistry;
use crate::resource::{FieldKind, Resource, ResourceInstance, ResourceRef};

/// Longest name AWS accepts for roles, key pairs and Name tags
pub const MAX_NAME_LENGTH: usize = 255;

/// Names: non-empty, at most 255 characters, no whitespace or control characters
pub(crate) fn resource_name() -> FieldKind {
    FieldKind::Constrained(ConstrainedType::from_predicate("ResourceName", |name: &String| {
        !name.is_empty()
            && name.len() <= MAX_NAME_LENGTH
            && !name.chars().any(|c| c.is_whitespace() || c.is_control())
    }))
}

/// Make every AWS resource type known to a registry
pub fn register_schemas(registry: &mut IndexRegistry) -> ProvisioningResult<()> {
    registry.add_schema(IamRole::schema())?;
    registry.add_schema(Ec2KeyPair::schema())?;
    registry.add_schema(Ec2InstanceSpec::schema())?;
    registry.add_schema(Ec2InstanceHost::schema())?;
    Ok(())
}

/// Catalog checks an instance must pass before it is registered
pub(crate) fn validate_declaration(
    catalog: &dyn CatalogProvider,
    instance: &ResourceInstance,
) -> ProvisioningResult<()> {
    match instance.resource_type() {
        Ec2Instance::RESOURCE_TYPE => instance::validate_against_catalog(catalog, instance),
        _ => Ok(()),
    }
}

/// Sub-resource a registered composite privately owns
pub(crate) fn owned_resource(instance: &ResourceInstance) -> Option<ResourceRef> {
    match instance.resource_type() {
        Ec2InstanceHost::RESOURCE_TYPE => instance.ref_field("instance").ok().cloned(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promise::PromiseRegistry;
    use crate::resource::ResourceInstance;
    use std::sync::Arc;

    #[test]
    fn test_register_schemas() {
        let mut registry = IndexRegistry::new(Arc::new(PromiseRegistry::new()));
        register_schemas(&mut registry).unwrap();
        for resource_type in ["IAMRole", "EC2KeyPair", "EC2Instance", "EC2InstanceHost"] {
            assert!(registry.schema(resource_type).is_ok(), "{}", resource_type);
        }
    }

    #[test]
    fn test_resource_name_constraint() {
        let schema = IamRole::schema();
        for bad in ["", "two words", "tab\tname"] {
            let mut role = ResourceInstance::new("IAMRole").with("name", bad);
            assert!(schema.validate(&mut role).is_err(), "{:?}", bad);
        }
        let mut long = ResourceInstance::new("IAMRole").with("name", "r".repeat(256));
        assert!(schema.validate(&mut long).is_err());

        let mut ok = ResourceInstance::new("IAMRole").with("name", "ci-deployer");
        assert!(schema.validate(&mut ok).is_ok());
    }
}
