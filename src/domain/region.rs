// Copyright (c) 2025 - Cowboy AI, Inc.
//! AWS Region Value Object

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::constraint::ConstrainedType;
use crate::errors::ProvisioningResult;

/// Every region code a resource may be deployed to
pub const REGION_CODES: [&str; 30] = [
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "us-gov-east-1",
    "us-gov-west-1",
    "af-south-1",
    "ap-east-1",
    "ap-south-1",
    "ap-south-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ca-central-1",
    "eu-central-1",
    "eu-central-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-south-1",
    "eu-south-2",
    "eu-north-1",
    "il-central-1",
    "me-south-1",
    "me-central-1",
    "sa-east-1",
];

/// AWS region code
///
/// A `String` refined by membership in [`REGION_CODES`]. Deserialization goes
/// through the same check, so a `Region` can never hold an unknown code.
///
/// # Examples
///
/// ```rust
/// use cim_provisioning::domain::Region;
///
/// let region = Region::new("eu-west-1").unwrap();
/// assert_eq!(region.as_str(), "eu-west-1");
///
/// assert!(Region::new("eu-west-9").is_err());
/// assert!(Region::new("EU-WEST-1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Region(String);

impl Region {
    /// The refinement every region passes through
    pub fn constraint() -> &'static ConstrainedType<String> {
        static CONSTRAINT: OnceLock<ConstrainedType<String>> = OnceLock::new();
        CONSTRAINT.get_or_init(|| ConstrainedType::one_of("Region", &REGION_CODES))
    }

    /// Create a region, failing with `ConstraintViolation` for unknown codes
    pub fn new(code: impl Into<String>) -> ProvisioningResult<Self> {
        let refined = Self::constraint().construct(code.into())?;
        Ok(Self(refined.into_inner()))
    }

    /// All known regions, in declaration order
    pub fn all() -> impl Iterator<Item = Region> {
        REGION_CODES.iter().map(|code| Region(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Region {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.0
    }
}

impl TryFrom<String> for Region {
    type Error = crate::errors::ProvisioningError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Region {
    type Error = crate::errors::ProvisioningError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
