// Copyright (c) 2025 - Cowboy AI, Inc.
//! EC2 instance host composite
//!
//! Wraps an [`Ec2Instance`] and exposes the shape a configuration step needs
//! to reach it: a [`HostDescriptor`] holding the address, login user and port.
//!
//! The instance is declared through [`Ec2Instance::declare`] like any other,
//! so catalog validation and identity registration apply unchanged. The
//! descriptor's address is the instance's own `public_address` promise, not a
//! copy, and the host shares the instance's identity `(region, name)`.
//!
//! ```text
//! Ec2InstanceHost ─owns─▶ Ec2Instance ─ref─▶ Ec2KeyPair
//!       │                      │
//!       └─ host.address ══════ public_address (same promise)
//! ```

use serde::Serialize;
use std::fmt;

use super::instance::{Ec2Instance, Ec2InstanceSpec};
use crate::context::DeclarationContext;
use crate::errors::{ProvisioningError, ProvisioningResult};
use crate::promise::PromiseRef;
use crate::resource::{
    FieldKind, FieldValue, Resource, ResourceInstance, ResourceRef, ResourceSchema, ValueKind,
};

/// Connection details for a host whose address is promised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDescriptor {
    address: PromiseRef,
    username: String,
    port: u16,
}

impl HostDescriptor {
    pub fn address(&self) -> &PromiseRef {
        &self.address
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Wait for the address and produce a concrete SSH target
    pub async fn connect_target(&self) -> ProvisioningResult<SshTarget> {
        let address = self.address.read().await?;
        self.target(address)
    }

    /// Concrete SSH target if the address is already resolved
    pub fn try_connect_target(&self) -> Option<SshTarget> {
        self.address
            .try_read()
            .and_then(|address| self.target(address).ok())
    }

    fn target(&self, address: FieldValue) -> ProvisioningResult<SshTarget> {
        let host = address.as_str().ok_or_else(|| {
            ProvisioningError::constraint(
                self.address.label(),
                format!("address resolved to a {} value", address.kind()),
            )
        })?;
        Ok(SshTarget {
            user: self.username.clone(),
            host: host.to_string(),
            port: self.port,
        })
    }
}

/// Resolved SSH destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SshTarget {
    pub user: String,
    pub host: String,
    pub port: u16,
}

impl fmt::Display for SshTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ssh://{}@{}:{}", self.user, self.host, self.port)
    }
}

/// Registered fields of a host: the owned instance plus the descriptor
struct HostBinding<'a> {
    instance: &'a ResourceRef,
    descriptor: &'a HostDescriptor,
}

impl Resource for HostBinding<'_> {
    const RESOURCE_TYPE: &'static str = Ec2InstanceHost::RESOURCE_TYPE;

    fn schema() -> ResourceSchema {
        ResourceSchema::new(Self::RESOURCE_TYPE)
            .required("instance", FieldKind::Ref(Ec2Instance::RESOURCE_TYPE))
            .alias("address", ValueKind::Str)
            .required("username", FieldKind::Str)
            .required("port", FieldKind::Int)
            .identity(&["instance.region", "instance.name"])
    }

    fn to_instance(&self) -> ResourceInstance {
        ResourceInstance::new(Self::RESOURCE_TYPE)
            .with("instance", self.instance.clone())
            .with("address", self.descriptor.address.clone())
            .with("username", self.descriptor.username.as_str())
            .with("port", i64::from(self.descriptor.port))
    }
}

/// An EC2 instance presented as a reachable host
#[derive(Debug, Clone)]
pub struct Ec2InstanceHost {
    reference: ResourceRef,
    instance: Ec2Instance,
    host: HostDescriptor,
}

impl Ec2InstanceHost {
    pub const RESOURCE_TYPE: &'static str = "EC2InstanceHost";

    pub fn schema() -> ResourceSchema {
        HostBinding::schema()
    }

    /// Declare the owned instance, then the host over it
    ///
    /// The login user comes from the context's username resolver, given the
    /// image, the instance name and `username_override`.
    pub fn declare(
        ctx: &mut DeclarationContext,
        spec: Ec2InstanceSpec,
        username_override: Option<&str>,
    ) -> ProvisioningResult<Self> {
        let instance = Ec2Instance::declare(ctx, spec)?;

        let host = HostDescriptor {
            address: instance.public_address().clone(),
            username: ctx.usernames().default_username(
                instance.image_name(),
                instance.name(),
                username_override,
            ),
            port: ctx.config().default_ssh_port,
        };

        let binding = HostBinding {
            instance: instance.reference(),
            descriptor: &host,
        };
        let reference = ctx.declare(binding.to_instance())?;

        Ok(Self {
            reference,
            instance,
            host,
        })
    }

    pub fn reference(&self) -> &ResourceRef {
        &self.reference
    }

    pub fn host(&self) -> &HostDescriptor {
        &self.host
    }

    pub fn name(&self) -> &str {
        self.instance.name()
    }

    pub fn region(&self) -> &crate::domain::Region {
        self.instance.region()
    }

    /// Deployment should verify SSH reachability of this host
    pub fn test_ssh(&self) -> bool {
        self.instance.test_ssh()
    }
}
