// Copyright (c) 2025 - Cowboy AI, Inc.
//! Region Catalog and Login Defaults
//!
//! Resource initializers consult two collaborators that live outside the
//! core model:
//!
//! - [`CatalogProvider`] answers whether an image or instance type exists in a
//!   region. Answers are plain booleans; the validators in this module turn a
//!   `false` into `InvalidCombination`.
//! - [`UsernameResolver`] picks the default SSH login for an image.
//!
//! [`StaticCatalog`] is an in-memory catalog that can be loaded from JSON for
//! offline planning and tests:
//!
//! ```json
//! {
//!   "eu-west-1": {
//!     "images": ["ami-0abc", "ubuntu-22.04"],
//!     "instance_types": ["t3.micro", "m5.large"]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

use crate::domain::Region;
use crate::errors::{ProvisioningError, ProvisioningResult};

/// Per-region table of valid images and instance types
pub trait CatalogProvider: Send + Sync {
    fn is_valid_image(&self, region: &Region, image_name: &str) -> bool;

    fn is_valid_instance_type(&self, region: &Region, instance_type: &str) -> bool;
}

/// Fail with `InvalidCombination` unless the image exists in the region
pub fn validate_image(
    catalog: &dyn CatalogProvider,
    resource: &str,
    region: &Region,
    image_name: &str,
) -> ProvisioningResult<()> {
    if !catalog.is_valid_image(region, image_name) {
        return Err(ProvisioningError::invalid_combination(
            resource,
            format!("No such image '{}' in region '{}'.", image_name, region),
        ));
    }
    Ok(())
}

/// Fail with `InvalidCombination` unless the instance type is offered in the region
pub fn validate_instance_type(
    catalog: &dyn CatalogProvider,
    resource: &str,
    region: &Region,
    instance_type: &str,
) -> ProvisioningResult<()> {
    if !catalog.is_valid_instance_type(region, instance_type) {
        return Err(ProvisioningError::invalid_combination(
            resource,
            format!(
                "Instance type '{}' is not available in region '{}'.",
                instance_type, region
            ),
        ));
    }
    Ok(())
}

/// Images and instance types offered in one region
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCatalog {
    #[serde(default)]
    pub images: BTreeSet<String>,
    #[serde(default)]
    pub instance_types: BTreeSet<String>,
}

/// In-memory catalog keyed by region
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticCatalog {
    regions: BTreeMap<Region, RegionCatalog>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> ProvisioningResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ProvisioningResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ProvisioningError::Configuration(format!(
                "cannot read catalog {}: {}",
                path.display(),
                e
            ))
        })?;
        let catalog = Self::from_json(&json)?;
        debug!(path = %path.display(), regions = catalog.regions.len(), "Catalog loaded");
        Ok(catalog)
    }

    pub fn with_image(mut self, region: &Region, image_name: impl Into<String>) -> Self {
        self.regions
            .entry(region.clone())
            .or_default()
            .images
            .insert(image_name.into());
        self
    }

    pub fn with_instance_type(mut self, region: &Region, instance_type: impl Into<String>) -> Self {
        self.regions
            .entry(region.clone())
            .or_default()
            .instance_types
            .insert(instance_type.into());
        self
    }

    pub fn region(&self, region: &Region) -> Option<&RegionCatalog> {
        self.regions.get(region)
    }
}

impl CatalogProvider for StaticCatalog {
    fn is_valid_image(&self, region: &Region, image_name: &str) -> bool {
        self.region(region)
            .is_some_and(|catalog| catalog.images.contains(image_name))
    }

    fn is_valid_instance_type(&self, region: &Region, instance_type: &str) -> bool {
        self.region(region)
            .is_some_and(|catalog| catalog.instance_types.contains(instance_type))
    }
}

/// Default SSH login for an image
pub trait UsernameResolver: Send + Sync {
    /// `username_override` wins when present; otherwise derive from the image
    fn default_username(
        &self,
        image_name: &str,
        resource_name: &str,
        username_override: Option<&str>,
    ) -> String;
}

/// Login users of well-known AMI families, matched by image name
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFamilyUsernames;

impl ImageFamilyUsernames {
    /// Checked in order; first substring match wins
    pub const FAMILIES: [(&'static str, &'static str); 11] = [
        ("windows", "Administrator"),
        ("ubuntu", "ubuntu"),
        ("debian", "admin"),
        ("fedora", "fedora"),
        ("centos", "centos"),
        ("rocky", "rocky"),
        ("bitnami", "bitnami"),
        ("amzn", "ec2-user"),
        ("al2023", "ec2-user"),
        ("rhel", "ec2-user"),
        ("suse", "ec2-user"),
    ];

    /// Used when no family matches
    pub const FALLBACK: &'static str = "ec2-user";
}

impl UsernameResolver for ImageFamilyUsernames {
    fn default_username(
        &self,
        image_name: &str,
        resource_name: &str,
        username_override: Option<&str>,
    ) -> String {
        if let Some(username) = username_override {
            return username.to_string();
        }

        let image = image_name.to_ascii_lowercase();
        let username = Self::FAMILIES
            .iter()
            .find(|(family, _)| image.contains(family))
            .map(|(_, user)| *user)
            .unwrap_or(Self::FALLBACK);
        debug!(resource = resource_name, image = image_name, username, "Default username derived");
        username.to_string()
    }
}
