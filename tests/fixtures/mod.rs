// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-provisioning
//!
//! Deterministic catalogs, key pairs and instance specs shared by the
//! integration tests. Every context starts from the same catalog so that
//! declarations differ only in what a test changes explicitly.

#![allow(dead_code)]

use std::sync::Arc;

use cim_provisioning::aws::{Ec2InstanceSpec, Ec2KeyPair};
use cim_provisioning::catalog::StaticCatalog;
use cim_provisioning::domain::Region;
use cim_provisioning::{DeclarationContext, ResourceRef};

pub const REGION: &str = "eu-west-1";
pub const OTHER_REGION: &str = "us-east-1";
pub const IMAGE: &str = "ami-x";
pub const UBUNTU_IMAGE: &str = "ubuntu-22.04";
pub const INSTANCE_TYPE: &str = "t3.micro";
pub const LARGE_INSTANCE_TYPE: &str = "m5.large";
pub const PUBLIC_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIOps ops@example";

pub fn region(code: &str) -> Region {
    Region::new(code).expect("Invalid region in test fixture")
}

/// Catalog offering the fixture images and types in both fixture regions
pub fn catalog_fixture() -> StaticCatalog {
    [REGION, OTHER_REGION]
        .iter()
        .fold(StaticCatalog::new(), |catalog, code| {
            let r = region(code);
            catalog
                .with_image(&r, IMAGE)
                .with_image(&r, UBUNTU_IMAGE)
                .with_instance_type(&r, INSTANCE_TYPE)
                .with_instance_type(&r, LARGE_INSTANCE_TYPE)
        })
}

pub fn context_fixture() -> DeclarationContext {
    DeclarationContext::new(Arc::new(catalog_fixture())).expect("Invalid context fixture")
}

pub fn key_pair_fixture(ctx: &mut DeclarationContext) -> ResourceRef {
    Ec2KeyPair::new("ops", PUBLIC_KEY)
        .declare(ctx)
        .expect("Invalid key pair fixture")
}

/// `web-1` in eu-west-1 with the fixture key pair
pub fn instance_spec_fixture(ctx: &mut DeclarationContext) -> Ec2InstanceSpec {
    named_spec_fixture(ctx, "web-1", REGION)
}

pub fn named_spec_fixture(ctx: &mut DeclarationContext, name: &str, code: &str) -> Ec2InstanceSpec {
    let key_pair = key_pair_fixture(ctx);
    Ec2InstanceSpec::new(name, region(code), key_pair, IMAGE, INSTANCE_TYPE)
}
