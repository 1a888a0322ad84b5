// Copyright (c) 2025 - Cowboy AI, Inc.
//! EC2 instance resource
//!
//! Identity is `(region, name)`. The initializer checks the image and the
//! instance type against the region catalog before the instance reaches the
//! registry; the public address is a promise filled in by deployment.

use super::{resource_name, Ec2KeyPair};
use crate::catalog::{validate_image, validate_instance_type, CatalogProvider};
use crate::context::DeclarationContext;
use crate::domain::Region;
use crate::errors::ProvisioningResult;
use crate::promise::PromiseRef;
use crate::resource::{
    FieldKind, Resource, ResourceInstance, ResourceRef, ResourceSchema, ValueKind,
};

/// Field holding the promised public address
pub const PUBLIC_ADDRESS: &str = "public_address";

/// Declaration input for an EC2 instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ec2InstanceSpec {
    pub name: String,
    pub region: Region,
    pub key_pair: ResourceRef,
    pub image_name: String,
    pub instance_type: String,
    /// Deployment checks SSH reachability after launch
    pub test_ssh: bool,
}

impl Ec2InstanceSpec {
    pub fn new(
        name: impl Into<String>,
        region: Region,
        key_pair: ResourceRef,
        image_name: impl Into<String>,
        instance_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            region,
            key_pair,
            image_name: image_name.into(),
            instance_type: instance_type.into(),
            test_ssh: false,
        }
    }

    pub fn with_test_ssh(mut self, test_ssh: bool) -> Self {
        self.test_ssh = test_ssh;
        self
    }
}

impl Resource for Ec2InstanceSpec {
    const RESOURCE_TYPE: &'static str = "EC2Instance";

    fn schema() -> ResourceSchema {
        ResourceSchema::new(Self::RESOURCE_TYPE)
            .required("name", resource_name())
            .required("region", FieldKind::Constrained(Region::constraint().clone()))
            .required("key_pair", FieldKind::Ref(Ec2KeyPair::RESOURCE_TYPE))
            .required("image_name", FieldKind::Str)
            .required("instance_type", FieldKind::Str)
            .with_default("test_ssh", FieldKind::Bool, false)
            .promise(PUBLIC_ADDRESS, ValueKind::Str)
            .identity(&["region", "name"])
    }

    fn to_instance(&self) -> ResourceInstance {
        ResourceInstance::new(Self::RESOURCE_TYPE)
            .with("name", self.name.as_str())
            .with("region", self.region.as_str())
            .with("key_pair", self.key_pair.clone())
            .with("image_name", self.image_name.as_str())
            .with("instance_type", self.instance_type.as_str())
            .with("test_ssh", self.test_ssh)
    }
}

/// Check the image and instance type of an `EC2Instance` against the catalog
pub(crate) fn validate_against_catalog(
    catalog: &dyn CatalogProvider,
    instance: &ResourceInstance,
) -> ProvisioningResult<()> {
    let name = instance.str_field("name")?;
    let region = Region::new(instance.str_field("region")?)?;
    validate_image(catalog, name, &region, instance.str_field("image_name")?)?;
    validate_instance_type(catalog, name, &region, instance.str_field("instance_type")?)
}

/// A registered EC2 instance
#[derive(Debug, Clone)]
pub struct Ec2Instance {
    reference: ResourceRef,
    spec: Ec2InstanceSpec,
    public_address: PromiseRef,
}

impl Ec2Instance {
    pub const RESOURCE_TYPE: &'static str = Ec2InstanceSpec::RESOURCE_TYPE;

    /// Validate against the catalog, then register
    ///
    /// Re-declaring an identical instance returns the already registered one,
    /// including its public address promise.
    pub fn declare(
        ctx: &mut DeclarationContext,
        spec: Ec2InstanceSpec,
    ) -> ProvisioningResult<Self> {
        let reference = ctx.declare(spec.to_instance())?;
        let public_address = ctx.registry().promise(&reference, PUBLIC_ADDRESS)?;
        Ok(Self {
            reference,
            spec,
            public_address,
        })
    }

    pub fn reference(&self) -> &ResourceRef {
        &self.reference
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn region(&self) -> &Region {
        &self.spec.region
    }

    pub fn key_pair(&self) -> &ResourceRef {
        &self.spec.key_pair
    }

    pub fn image_name(&self) -> &str {
        &self.spec.image_name
    }

    pub fn instance_type(&self) -> &str {
        &self.spec.instance_type
    }

    pub fn test_ssh(&self) -> bool {
        self.spec.test_ssh
    }

    /// Public address, known once the instance is deployed
    pub fn public_address(&self) -> &PromiseRef {
        &self.public_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::errors::ProvisioningError;
    use std::sync::Arc;

    fn context() -> DeclarationContext {
        let region = Region::new("eu-west-1").unwrap();
        let catalog = StaticCatalog::new()
            .with_image(&region, "ami-x")
            .with_instance_type(&region, "t3.micro");
        DeclarationContext::new(Arc::new(catalog)).unwrap()
    }

    fn spec(ctx: &mut DeclarationContext, instance_type: &str) -> Ec2InstanceSpec {
        let key_pair = Ec2KeyPair::new("ops", "ssh-ed25519 AAAAC3 ops@example")
            .declare(ctx)
            .unwrap();
        Ec2InstanceSpec::new(
            "web-1",
            Region::new("eu-west-1").unwrap(),
            key_pair,
            "ami-x",
            instance_type,
        )
    }

    #[test]
    fn test_declare_instance() {
        let mut ctx = context();
        let spec = spec(&mut ctx, "t3.micro").with_test_ssh(true);
        let instance = Ec2Instance::declare(&mut ctx, spec).unwrap();

        assert_eq!(instance.name(), "web-1");
        assert_eq!(instance.region().as_str(), "eu-west-1");
        assert!(instance.test_ssh());
        assert_eq!(instance.reference().to_string(), "EC2Instance(eu-west-1, web-1)");
        assert_eq!(instance.public_address().owner(), instance.reference());
        assert!(instance.public_address().state().is_pending());
    }

    #[test]
    fn test_instance_type_not_in_region() {
        let mut ctx = context();
        let spec = spec(&mut ctx, "p4d.24xlarge");
        let err = Ec2Instance::declare(&mut ctx, spec).unwrap_err();
        assert!(matches!(err, ProvisioningError::InvalidCombination { .. }));
        assert_eq!(ctx.registry().len(), 1);
    }

    #[test]
    fn test_raw_declaration_checked_against_catalog() {
        let mut ctx = context();
        let mut spec = spec(&mut ctx, "x99.huge");
        spec.image_name = "ami-not-in-catalog".to_string();

        let err = ctx.declare(spec.to_instance()).unwrap_err();
        assert_eq!(
            err,
            ProvisioningError::InvalidCombination {
                resource: "web-1".to_string(),
                detail: "No such image 'ami-not-in-catalog' in region 'eu-west-1'.".to_string(),
            }
        );

        spec.image_name = "ami-x".to_string();
        let err = ctx.declare(spec.to_instance()).unwrap_err();
        assert!(matches!(err, ProvisioningError::InvalidCombination { .. }));
        assert_eq!(ctx.registry().len(), 1);
    }

    #[test]
    fn test_unknown_image() {
        let mut ctx = context();
        let mut spec = spec(&mut ctx, "t3.micro");
        spec.image_name = "ami-missing".to_string();
        let err = Ec2Instance::declare(&mut ctx, spec).unwrap_err();
        assert_eq!(
            err,
            ProvisioningError::InvalidCombination {
                resource: "web-1".to_string(),
                detail: "No such image 'ami-missing' in region 'eu-west-1'.".to_string(),
            }
        );
    }
}
