// Copyright (c) 2025 - Cowboy AI, Inc.
//! EC2 key pair resource
//!
//! Key pairs are region-bound in EC2, but one declaration is deployed to every
//! region an instance needs it in. Identity is the key name; two declarations
//! with the same name are equivalent when their key material matches, whatever
//! the trailing OpenSSH comment says.

use serde::{Deserialize, Serialize};

use super::resource_name;
use crate::context::DeclarationContext;
use crate::errors::ProvisioningResult;
use crate::resource::{
    key_material, FieldKind, Resource, ResourceInstance, ResourceRef, ResourceSchema,
};

/// SSH key pair used by EC2 instances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ec2KeyPair {
    pub name: String,
    pub public_key: String,
}

impl Ec2KeyPair {
    pub fn new(name: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_key: public_key.into(),
        }
    }

    /// Base64 key body, without type prefix or comment
    pub fn key_material(&self) -> Option<&str> {
        key_material(&self.public_key)
    }

    pub fn declare(&self, ctx: &mut DeclarationContext) -> ProvisioningResult<ResourceRef> {
        ctx.declare(self.to_instance())
    }
}

impl Resource for Ec2KeyPair {
    const RESOURCE_TYPE: &'static str = "EC2KeyPair";

    fn schema() -> ResourceSchema {
        ResourceSchema::new(Self::RESOURCE_TYPE)
            .required("name", resource_name())
            .required("public_key", FieldKind::SshPublicKey)
            .identity(&["name"])
    }

    fn to_instance(&self) -> ResourceInstance {
        ResourceInstance::new(Self::RESOURCE_TYPE)
            .with("name", self.name.as_str())
            .with("public_key", self.public_key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_material_ignores_comment() {
        let key = Ec2KeyPair::new("ops", "ssh-ed25519 AAAAC3NzaC1 ops@laptop");
        assert_eq!(key.key_material(), Some("AAAAC3NzaC1"));
        let imported = Ec2KeyPair::new("ops", "ssh-ed25519 AAAAC3NzaC1 imported-by-aws");
        assert_eq!(key.key_material(), imported.key_material());
    }

    #[test]
    fn test_schema_rejects_malformed_key() {
        let mut instance = Ec2KeyPair::new("ops", "not-a-key").to_instance();
        assert!(Ec2KeyPair::schema().validate(&mut instance).is_err());
    }
}
