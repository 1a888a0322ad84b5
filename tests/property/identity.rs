// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity coalescing properties

use crate::fixtures::*;
use cim_provisioning::aws::{Ec2Instance, IamRole};
use cim_provisioning::resource::IdentityKey;
use proptest::prelude::*;

fn names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z][a-z0-9-]{0,11}", 1..12)
}

proptest! {
    #[test]
    fn prop_registry_holds_one_entry_per_identity(names in names()) {
        let mut ctx = context_fixture();
        let mut distinct = std::collections::BTreeSet::new();

        for name in &names {
            let spec = named_spec_fixture(&mut ctx, name, REGION);
            let instance = Ec2Instance::declare(&mut ctx, spec).unwrap();
            let key = IdentityKey::of_strs([REGION, name.as_str()]);
            prop_assert_eq!(instance.reference().key(), &key);
            distinct.insert(name.clone());
        }

        // one key pair plus one entry per distinct name
        prop_assert_eq!(ctx.registry().len(), distinct.len() + 1);
        prop_assert_eq!(ctx.promises().len(), distinct.len());
    }

    #[test]
    fn prop_redeclaration_returns_same_reference(
        name in "[a-z][a-z0-9-]{0,11}",
        repeats in 1usize..5,
    ) {
        let mut ctx = context_fixture();
        let role = IamRole::new(name.as_str(), ["ec2:DescribeInstances"]);
        let first = role.declare(&mut ctx).unwrap();
        for _ in 0..repeats {
            prop_assert_eq!(&role.declare(&mut ctx).unwrap(), &first);
        }
        prop_assert_eq!(ctx.registry().len(), 1);
    }
}
