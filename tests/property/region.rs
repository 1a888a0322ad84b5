// Copyright (c) 2025 - Cowboy AI, Inc.
//! Region constraint properties

use cim_provisioning::domain::{Region, REGION_CODES};
use cim_provisioning::ProvisioningError;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_every_listed_region_is_valid(index in 0..REGION_CODES.len()) {
        let code = REGION_CODES[index];
        let region = Region::new(code).unwrap();
        prop_assert_eq!(region.as_str(), code);
    }

    #[test]
    fn prop_unlisted_strings_are_rejected(code in "[a-z]{2}-[a-z]{4,9}-[0-9]{1,2}") {
        prop_assume!(!REGION_CODES.contains(&code.as_str()));
        let err = Region::new(code.as_str()).unwrap_err();
        let is_violation = matches!(
            err,
            ProvisioningError::ConstraintViolation { ref type_name, .. } if type_name == "Region"
        );
        prop_assert!(is_violation);
    }

    #[test]
    fn prop_region_serde_preserves_code(index in 0..REGION_CODES.len()) {
        let region = Region::new(REGION_CODES[index]).unwrap();
        let json = serde_json::to_string(&region).unwrap();
        prop_assert_eq!(json, format!("\"{}\"", REGION_CODES[index]));
    }
}

#[test]
fn test_region_list_is_complete() {
    assert_eq!(REGION_CODES.len(), 30);
    assert_eq!(Region::all().count(), 30);
}
