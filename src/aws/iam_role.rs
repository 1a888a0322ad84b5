// Copyright (c) 2025 - Cowboy AI, Inc.
//! IAM role resource

use serde::{Deserialize, Serialize};

use super::resource_name;
use crate::context::DeclarationContext;
use crate::errors::ProvisioningResult;
use crate::resource::{
    FieldKind, FieldValue, Resource, ResourceInstance, ResourceRef, ResourceSchema,
};

/// An IAM role in AWS, identified by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IamRole {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl IamRole {
    pub fn new<I, S>(name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn declare(&self, ctx: &mut DeclarationContext) -> ProvisioningResult<ResourceRef> {
        ctx.declare(self.to_instance())
    }
}

impl Resource for IamRole {
    const RESOURCE_TYPE: &'static str = "IAMRole";

    fn schema() -> ResourceSchema {
        ResourceSchema::new(Self::RESOURCE_TYPE)
            .required("name", resource_name())
            .with_default("permissions", FieldKind::StrList, FieldValue::List(Vec::new()))
            .identity(&["name"])
    }

    fn to_instance(&self) -> ResourceInstance {
        ResourceInstance::new(Self::RESOURCE_TYPE)
            .with("name", self.name.as_str())
            .with("permissions", FieldValue::strings(&self.permissions))
    }
}
