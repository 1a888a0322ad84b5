// Copyright (c) 2025 - Cowboy AI, Inc.
//! JSON module manifests
//!
//! A manifest lists the resources one module declares. Instances name their
//! key pair instead of holding a reference; the key pair must be declared in
//! the same manifest.
//!
//! ```json
//! {
//!   "key_pairs": [{ "name": "ops", "public_key": "ssh-ed25519 AAAA ops@example" }],
//!   "hosts": [{
//!     "name": "web-1", "region": "eu-west-1", "key_pair": "ops",
//!     "image_name": "ubuntu-22.04", "instance_type": "t3.micro",
//!     "username": "deploy"
//!   }]
//! }
//! ```

use serde::Deserialize;

use super::{Ec2Instance, Ec2InstanceHost, Ec2InstanceSpec, Ec2KeyPair, IamRole};
use crate::context::DeclarationContext;
use crate::domain::Region;
use crate::errors::{ProvisioningError, ProvisioningResult};
use crate::resource::{IdentityKey, Resource, ResourceRef};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceDeclaration {
    pub name: String,
    pub region: Region,
    /// Name of a key pair declared in the same manifest
    pub key_pair: String,
    pub image_name: String,
    pub instance_type: String,
    #[serde(default)]
    pub test_ssh: bool,
}

impl InstanceDeclaration {
    fn to_spec(&self, ctx: &DeclarationContext) -> ProvisioningResult<Ec2InstanceSpec> {
        let key = IdentityKey::of_strs([self.key_pair.as_str()]);
        let key_pair = ctx
            .registry()
            .find(Ec2KeyPair::RESOURCE_TYPE, &key)
            .map(|entry| entry.reference().clone())
            .ok_or_else(|| {
                ProvisioningError::UnknownResource(format!(
                    "{}{} referenced by {}",
                    Ec2KeyPair::RESOURCE_TYPE,
                    key,
                    self.name
                ))
            })?;

        Ok(Ec2InstanceSpec::new(
            self.name.as_str(),
            self.region.clone(),
            key_pair,
            self.image_name.as_str(),
            self.instance_type.as_str(),
        )
        .with_test_ssh(self.test_ssh))
    }
}

/// An instance declared as a host, with an optional login user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostDeclaration {
    pub name: String,
    pub region: Region,
    pub key_pair: String,
    pub image_name: String,
    pub instance_type: String,
    #[serde(default)]
    pub test_ssh: bool,
    #[serde(default)]
    pub username: Option<String>,
}

impl HostDeclaration {
    /// The instance this host wraps
    pub fn instance(&self) -> InstanceDeclaration {
        InstanceDeclaration {
            name: self.name.clone(),
            region: self.region.clone(),
            key_pair: self.key_pair.clone(),
            image_name: self.image_name.clone(),
            instance_type: self.instance_type.clone(),
            test_ssh: self.test_ssh,
        }
    }
}

/// Resources declared by one module
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleManifest {
    #[serde(default)]
    pub roles: Vec<IamRole>,
    #[serde(default)]
    pub key_pairs: Vec<Ec2KeyPair>,
    #[serde(default)]
    pub instances: Vec<InstanceDeclaration>,
    #[serde(default)]
    pub hosts: Vec<HostDeclaration>,
}

/// Typed handles to everything a manifest declared
#[derive(Debug, Clone, Default)]
pub struct DeclaredModule {
    pub roles: Vec<ResourceRef>,
    pub key_pairs: Vec<ResourceRef>,
    pub instances: Vec<Ec2Instance>,
    pub hosts: Vec<Ec2InstanceHost>,
}

impl ModuleManifest {
    pub fn from_json(json: &str) -> ProvisioningResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Declare roles, key pairs, instances and hosts, in that order
    ///
    /// Stops at the first failing declaration.
    pub fn declare(&self, ctx: &mut DeclarationContext) -> ProvisioningResult<DeclaredModule> {
        let mut module = DeclaredModule::default();

        for role in &self.roles {
            module.roles.push(role.declare(ctx)?);
        }
        for key_pair in &self.key_pairs {
            module.key_pairs.push(key_pair.declare(ctx)?);
        }
        for declaration in &self.instances {
            let spec = declaration.to_spec(ctx)?;
            module.instances.push(Ec2Instance::declare(ctx, spec)?);
        }
        for declaration in &self.hosts {
            let spec = declaration.instance().to_spec(ctx)?;
            module.hosts.push(Ec2InstanceHost::declare(
                ctx,
                spec,
                declaration.username.as_deref(),
            )?);
        }

        Ok(module)
    }
}
