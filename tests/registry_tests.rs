// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity and index registry integration tests
//!
//! Declarations from independent modules meet in one registry: equivalent
//! declarations coalesce into a single entry, conflicting ones are rejected.

mod fixtures;

use fixtures::*;
use pretty_assertions::assert_eq;

use cim_provisioning::aws::{Ec2Instance, Ec2InstanceHost, Ec2KeyPair, IamRole, ModuleManifest};
use cim_provisioning::resource::IdentityKey;
use cim_provisioning::ProvisioningError;

#[test]
fn test_duplicate_instance_coalesces() {
    let mut ctx = context_fixture();

    let first = instance_spec_fixture(&mut ctx);
    let second = instance_spec_fixture(&mut ctx);
    let a = Ec2Instance::declare(&mut ctx, first).unwrap();
    let b = Ec2Instance::declare(&mut ctx, second).unwrap();

    assert_eq!(a.reference(), b.reference());
    assert_eq!(a.public_address().id(), b.public_address().id());
    // key pair + one instance
    assert_eq!(ctx.registry().len(), 2);
    assert_eq!(ctx.promises().len(), 1);
}

#[test]
fn test_conflicting_instance_type_rejected() {
    let mut ctx = context_fixture();

    let spec = instance_spec_fixture(&mut ctx);
    let mut conflicting = spec.clone();
    conflicting.instance_type = LARGE_INSTANCE_TYPE.to_string();

    Ec2Instance::declare(&mut ctx, spec).unwrap();
    let err = Ec2Instance::declare(&mut ctx, conflicting).unwrap_err();

    assert_eq!(
        err,
        ProvisioningError::ConflictingDeclaration {
            resource_type: "EC2Instance".to_string(),
            key: "(eu-west-1, web-1)".to_string(),
            field: "instance_type".to_string(),
        }
    );
    assert_eq!(ctx.registry().len(), 2);
}

#[test]
fn test_same_name_in_other_region_is_distinct() {
    let mut ctx = context_fixture();

    let west = named_spec_fixture(&mut ctx, "web-1", REGION);
    let east = named_spec_fixture(&mut ctx, "web-1", OTHER_REGION);
    let a = Ec2Instance::declare(&mut ctx, west).unwrap();
    let b = Ec2Instance::declare(&mut ctx, east).unwrap();

    assert!(a.reference() != b.reference());
    assert_eq!(ctx.registry().len(), 3);
}

#[test]
fn test_bare_instance_coalesces_with_host() {
    let mut ctx = context_fixture();

    let spec = instance_spec_fixture(&mut ctx);
    let host = Ec2InstanceHost::declare(&mut ctx, spec.clone(), None).unwrap();
    let bare = Ec2Instance::declare(&mut ctx, spec).unwrap();

    let key = IdentityKey::of_strs([REGION, "web-1"]);
    let entry = ctx.registry().find(Ec2Instance::RESOURCE_TYPE, &key).unwrap();
    assert_eq!(entry.reference(), bare.reference());
    assert_eq!(entry.owner(), Some(host.reference()));
    assert_eq!(host.host().address(), bare.public_address());
    // key pair, instance, host
    assert_eq!(ctx.registry().len(), 3);
}

#[test]
fn test_host_redeclaration_coalesces() {
    let mut ctx = context_fixture();

    let spec = instance_spec_fixture(&mut ctx);
    let a = Ec2InstanceHost::declare(&mut ctx, spec.clone(), None).unwrap();
    let b = Ec2InstanceHost::declare(&mut ctx, spec, None).unwrap();

    assert_eq!(a.reference(), b.reference());
    assert_eq!(ctx.registry().len(), 3);
}

#[test]
fn test_host_with_other_username_conflicts() {
    let mut ctx = context_fixture();

    let spec = instance_spec_fixture(&mut ctx);
    Ec2InstanceHost::declare(&mut ctx, spec.clone(), None).unwrap();
    let err = Ec2InstanceHost::declare(&mut ctx, spec, Some("deploy")).unwrap_err();

    assert!(matches!(
        err,
        ProvisioningError::ConflictingDeclaration { ref field, .. } if field == "username"
    ));
}

#[test]
fn test_key_pair_comment_does_not_conflict() {
    let mut ctx = context_fixture();

    let a = Ec2KeyPair::new("ops", PUBLIC_KEY).declare(&mut ctx).unwrap();
    let relabelled = PUBLIC_KEY.replace("ops@example", "ops@laptop");
    let b = Ec2KeyPair::new("ops", relabelled).declare(&mut ctx).unwrap();
    assert_eq!(a, b);

    let err = Ec2KeyPair::new("ops", "ssh-ed25519 AAAAother ops@example")
        .declare(&mut ctx)
        .unwrap_err();
    assert!(matches!(err, ProvisioningError::ConflictingDeclaration { .. }));
}

#[test]
fn test_role_permissions_conflict() {
    let mut ctx = context_fixture();

    IamRole::new("deployer", ["ec2:RunInstances"])
        .declare(&mut ctx)
        .unwrap();
    let err = IamRole::new("deployer", ["ec2:TerminateInstances"])
        .declare(&mut ctx)
        .unwrap_err();
    assert!(matches!(err, ProvisioningError::ConflictingDeclaration { .. }));
}

#[test]
fn test_two_modules_share_declarations() {
    let module = r#"{
        "key_pairs": [{ "name": "ops", "public_key": "ssh-ed25519 AAAAC3 ops@example" }],
        "hosts": [{
            "name": "web-1", "region": "eu-west-1", "key_pair": "ops",
            "image_name": "ubuntu-22.04", "instance_type": "t3.micro"
        }]
    }"#;
    let mut ctx = context_fixture();

    let first = ModuleManifest::from_json(module).unwrap().declare(&mut ctx).unwrap();
    let second = ModuleManifest::from_json(module).unwrap().declare(&mut ctx).unwrap();

    assert_eq!(first.hosts[0].reference(), second.hosts[0].reference());
    assert_eq!(ctx.registry().len(), 3);
}

#[test]
fn test_deployment_order_puts_dependencies_first() {
    let mut ctx = context_fixture();
    let spec = instance_spec_fixture(&mut ctx);
    let host = Ec2InstanceHost::declare(&mut ctx, spec, None).unwrap();

    let order: Vec<String> = ctx
        .registry()
        .deployment_order()
        .unwrap()
        .iter()
        .map(|r| r.to_string())
        .collect();

    assert_eq!(
        order,
        vec![
            "EC2KeyPair(ops)".to_string(),
            "EC2Instance(eu-west-1, web-1)".to_string(),
            host.reference().to_string(),
        ]
    );
}
