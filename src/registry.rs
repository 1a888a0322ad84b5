// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity / Index Registry
//!
//! Every declared resource passes through [`IndexRegistry::register`]. The
//! registry checks the instance against its schema, derives the identity key
//! from the schema's key paths, and either stores a new entry or returns the
//! existing one.
//!
//! # Registration outcomes
//!
//! ```text
//! register(instance)
//!     │
//!     ├─ schema check fails ────────────────▶ ConstraintViolation
//!     ├─ key unseen ────────────────────────▶ new ResourceRef (+ owned promises)
//!     ├─ key seen, fields equivalent ───────▶ existing ResourceRef
//!     └─ key seen, fields differ ───────────▶ ConflictingDeclaration
//! ```
//!
//! Key paths may step through a resource reference, so a composite can be
//! keyed by its sub-resource's fields (`instance.region`, `instance.name`).
//!
//! Registration is single-threaded: the registry is mutated through `&mut`
//! during module evaluation and shared read-only during deployment.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{ProvisioningError, ProvisioningResult};
use crate::promise::{PromiseRef, PromiseRegistry};
use crate::resource::{
    FieldKind, FieldValue, IdentityKey, KeyPath, KeyValue, ResourceInstance, ResourceRef,
    ResourceSchema,
};

/// A stored registry entry
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredResource {
    reference: ResourceRef,
    instance: ResourceInstance,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<ResourceRef>,
}

impl RegisteredResource {
    pub fn reference(&self) -> &ResourceRef {
        &self.reference
    }

    pub fn instance(&self) -> &ResourceInstance {
        &self.instance
    }

    /// Composite that privately owns this resource, if any
    pub fn owner(&self) -> Option<&ResourceRef> {
        self.owner.as_ref()
    }

    pub fn resource_type(&self) -> &str {
        self.reference.resource_type()
    }

    pub fn key(&self) -> &IdentityKey {
        self.reference.key()
    }
}

/// Registry of declared resources, indexed by identity
pub struct IndexRegistry {
    schemas: HashMap<&'static str, Arc<ResourceSchema>>,
    entries: Vec<RegisteredResource>,
    by_key: HashMap<(String, IdentityKey), usize>,
    by_id: HashMap<Uuid, usize>,
    promises: Arc<PromiseRegistry>,
}

impl IndexRegistry {
    pub fn new(promises: Arc<PromiseRegistry>) -> Self {
        Self {
            schemas: HashMap::new(),
            entries: Vec::new(),
            by_key: HashMap::new(),
            by_id: HashMap::new(),
            promises,
        }
    }

    /// Make a resource type known to the registry
    pub fn add_schema(&mut self, schema: ResourceSchema) -> ProvisioningResult<()> {
        if schema.identity_paths().is_empty() {
            return Err(ProvisioningError::Configuration(format!(
                "schema {} declares no identity key",
                schema.resource_type()
            )));
        }
        for path in schema.identity_paths() {
            if schema.field_spec(path.root()).is_none() {
                return Err(ProvisioningError::Configuration(format!(
                    "schema {} key path '{}' starts at an undeclared field",
                    schema.resource_type(),
                    path
                )));
            }
        }
        debug!(resource_type = schema.resource_type(), "Schema added");
        self.schemas.insert(schema.resource_type(), Arc::new(schema));
        Ok(())
    }

    pub fn schema(&self, resource_type: &str) -> ProvisioningResult<&Arc<ResourceSchema>> {
        self.schemas
            .get(resource_type)
            .ok_or_else(|| ProvisioningError::UnknownResource(format!("type {}", resource_type)))
    }

    pub fn promises(&self) -> &Arc<PromiseRegistry> {
        &self.promises
    }

    /// Validate, key and store an instance, coalescing equivalent declarations
    pub fn register(&mut self, mut instance: ResourceInstance) -> ProvisioningResult<ResourceRef> {
        let schema = Arc::clone(self.schema(instance.resource_type())?);
        schema.validate(&mut instance)?;

        for reference in instance.references() {
            self.get(reference)?;
        }
        for spec in schema.fields() {
            if let (FieldKind::Alias(_), Some(FieldValue::Promise(promise))) =
                (spec.kind(), instance.get(spec.name()))
            {
                self.check_alias(&instance, spec.name(), promise)?;
            }
        }

        let key = self.identity_key(&schema, &instance)?;
        let index_key = (schema.resource_type().to_string(), key.clone());

        if let Some(&index) = self.by_key.get(&index_key) {
            let existing = &self.entries[index];
            return match schema.first_difference(&existing.instance, &instance) {
                None => {
                    debug!(resource = %existing.reference, "Equivalent declaration coalesced");
                    Ok(existing.reference.clone())
                }
                Some(field) => Err(ProvisioningError::ConflictingDeclaration {
                    resource_type: schema.resource_type().to_string(),
                    key: key.to_string(),
                    field: field.to_string(),
                }),
            };
        }

        let reference = ResourceRef::new(schema.resource_type(), key);
        for (name, kind) in schema.owned_promises() {
            let promise = self.promises.create(&reference, name, kind);
            instance.set(name, promise);
        }

        let index = self.entries.len();
        self.entries.push(RegisteredResource {
            reference: reference.clone(),
            instance,
            owner: None,
        });
        self.by_key.insert(index_key, index);
        self.by_id.insert(reference.id(), index);

        info!(resource = %reference, "Resource registered");
        Ok(reference)
    }

    /// Record that `owner` privately owns `owned`
    ///
    /// Idempotent for the same owner; a resource cannot have two owners.
    pub fn adopt(&mut self, owner: &ResourceRef, owned: &ResourceRef) -> ProvisioningResult<()> {
        self.get(owner)?;
        let index = self.index_of(owned)?;
        let entry = &mut self.entries[index];
        match &entry.owner {
            Some(existing) if existing != owner => Err(ProvisioningError::ConflictingDeclaration {
                resource_type: entry.reference.resource_type().to_string(),
                key: entry.reference.key().to_string(),
                field: format!("owner ({} and {})", existing, owner),
            }),
            _ => {
                entry.owner = Some(owner.clone());
                Ok(())
            }
        }
    }

    /// Derive the identity key of an instance from the schema's key paths
    pub fn identity_key(
        &self,
        schema: &ResourceSchema,
        instance: &ResourceInstance,
    ) -> ProvisioningResult<IdentityKey> {
        let values = schema
            .identity_paths()
            .iter()
            .map(|path| self.follow(instance, path))
            .collect::<ProvisioningResult<Vec<_>>>()?;
        Ok(IdentityKey::new(values))
    }

    fn follow(&self, instance: &ResourceInstance, path: &KeyPath) -> ProvisioningResult<KeyValue> {
        let violation = |detail: String| {
            ProvisioningError::constraint(instance.resource_type().to_string(), detail)
        };

        let steps = path.steps();
        let mut current = instance;
        for (position, step) in steps.iter().enumerate() {
            let value = current.get(step).ok_or_else(|| {
                violation(format!("key path '{}' reaches missing field '{}'", path, step))
            })?;

            if position + 1 == steps.len() {
                return KeyValue::from_field(value).ok_or_else(|| {
                    violation(format!(
                        "key path '{}' ends on a {} value, which cannot be part of an identity",
                        path,
                        value.kind()
                    ))
                });
            }

            current = match value {
                FieldValue::Ref(reference) => &self.get(reference)?.instance,
                other => {
                    return Err(violation(format!(
                        "key path '{}' cannot step through a {} value at '{}'",
                        path,
                        other.kind(),
                        step
                    )))
                }
            };
        }

        Err(violation(format!("key path '{}' is empty", path)))
    }

    /// An alias must be the promise of a resource this instance references
    fn check_alias(
        &self,
        instance: &ResourceInstance,
        field: &str,
        promise: &PromiseRef,
    ) -> ProvisioningResult<()> {
        let owner = self.get(promise.owner())?;
        let referenced = instance.references().any(|r| r == promise.owner());
        let owned = owner
            .instance
            .get(promise.name())
            .and_then(FieldValue::as_promise)
            .is_some_and(|p| p == promise);

        if referenced && owned {
            return Ok(());
        }
        Err(ProvisioningError::constraint(
            instance.resource_type().to_string(),
            format!(
                "field '{}' aliases {}, which is not a promise of a referenced resource",
                field,
                promise.label()
            ),
        ))
    }

        fn index_of(&self, reference: &ResourceRef) -> ProvisioningResult<usize> {
        self.by_id
            .get(&reference.id())
            .copied()
            .ok_or_else(|| ProvisioningError::UnknownResource(reference.to_string()))
    }

    pub fn get(&self, reference: &ResourceRef) -> ProvisioningResult<&RegisteredResource> {
        self.index_of(reference).map(|index| &self.entries[index])
    }

    /// Look up an entry by type and identity key
    pub fn find(&self, resource_type: &str, key: &IdentityKey) -> Option<&RegisteredResource> {
        self.by_key
            .get(&(resource_type.to_string(), key.clone()))
            .map(|&index| &self.entries[index])
    }

    /// Promise field of a registered resource, owned or aliased
    pub fn promise(&self, reference: &ResourceRef, field: &str) -> ProvisioningResult<PromiseRef> {
        self.get(reference)?.instance.promise_field(field).cloned()
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredResource> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resources that must be deployed before `reference`
    ///
    /// Direct references plus the owners of any aliased promises.
    pub fn dependencies(&self, reference: &ResourceRef) -> ProvisioningResult<Vec<ResourceRef>> {
        let entry = self.get(reference)?;
        let mut dependencies: Vec<ResourceRef> = Vec::new();
        for (_, value) in entry.instance.fields() {
            let dependency = match value {
                FieldValue::Ref(r) => r,
                FieldValue::Promise(p) if p.owner() != reference => p.owner(),
                _ => continue,
            };
            if !dependencies.contains(dependency) {
                dependencies.push(dependency.clone());
            }
        }
        Ok(dependencies)
    }

    /// Topological order of every entry, dependencies first
    ///
    /// Ties are broken by registration order.
    pub fn deployment_order(&self) -> ProvisioningResult<Vec<ResourceRef>> {
        let count = self.entries.len();
        let mut remaining = vec![0usize; count];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];

        for (index, entry) in self.entries.iter().enumerate() {
            for dependency in self.dependencies(&entry.reference)? {
                let dependency = self.index_of(&dependency)?;
                remaining[index] += 1;
                dependents[dependency].push(index);
            }
        }

        let mut ready: BTreeSet<usize> = (0..count).filter(|&i| remaining[i] == 0).collect();
        let mut order = Vec::with_capacity(count);
        while let Some(index) = ready.pop_first() {
            order.push(self.entries[index].reference.clone());
            for &dependent in &dependents[index] {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() != count {
            let stuck = (0..count)
                .find(|&i| remaining[i] > 0)
                .map(|i| self.entries[i].reference.to_string())
                .unwrap_or_default();
            return Err(ProvisioningError::DependencyCycle(stuck));
        }
        Ok(order)
    }

    /// Serializable view of every entry
    pub fn snapshot(&self) -> Vec<RegisteredResource> {
        self.entries.clone()
    }
}

impl std::fmt::Debug for IndexRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexRegistry")
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{FieldKind, ValueKind};
    use pretty_assertions::assert_eq;

    fn registry() -> IndexRegistry {
        let mut registry = IndexRegistry::new(Arc::new(PromiseRegistry::new()));
        registry
            .add_schema(
                ResourceSchema::new("Disk")
                    .required("zone", FieldKind::Str)
                    .required("name", FieldKind::Str)
                    .required("size", FieldKind::Int)
                    .promise("volume_id", ValueKind::Str)
                    .identity(&["zone", "name"]),
            )
            .unwrap();
        registry
            .add_schema(
                ResourceSchema::new("Mount")
                    .required("disk", FieldKind::Ref("Disk"))
                    .required("path", FieldKind::Str)
                    .alias("volume_id", ValueKind::Str)
                    .identity(&["disk.zone", "disk.name"]),
            )
            .unwrap();
        registry
    }

    fn disk(size: i64) -> ResourceInstance {
        ResourceInstance::new("Disk")
            .with("zone", "a")
            .with("name", "data")
            .with("size", size)
    }

    #[test]
    fn test_register_creates_owned_promises() {
        let mut registry = registry();
        let disk = registry.register(disk(10)).unwrap();
        assert_eq!(disk.key(), &IdentityKey::of_strs(["a", "data"]));

        let promise = registry.promise(&disk, "volume_id").unwrap();
        assert_eq!(promise.owner(), &disk);
        assert_eq!(registry.promises().owned_by(&disk), vec![promise]);
    }

    #[test]
    fn test_equivalent_declaration_coalesces() {
        let mut registry = registry();
        let first = registry.register(disk(10)).unwrap();
        let second = registry.register(disk(10)).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.promises().len(), 1);
    }

    #[test]
    fn test_conflicting_declaration() {
        let mut registry = registry();
        registry.register(disk(10)).unwrap();
        let err = registry.register(disk(20)).unwrap_err();
        assert_eq!(
            err,
            ProvisioningError::ConflictingDeclaration {
                resource_type: "Disk".to_string(),
                key: "(a, data)".to_string(),
                field: "size".to_string(),
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_key_path_through_reference() {
        let mut registry = registry();
        let disk = registry.register(disk(10)).unwrap();
        let volume = registry.promise(&disk, "volume_id").unwrap();
        let mount = registry
            .register(
                ResourceInstance::new("Mount")
                    .with("disk", disk.clone())
                    .with("path", "/data")
                    .with("volume_id", volume.clone()),
            )
            .unwrap();

        assert_eq!(mount.key(), &IdentityKey::of_strs(["a", "data"]));
        assert_eq!(registry.promise(&mount, "volume_id").unwrap(), volume);
        assert_eq!(registry.dependencies(&mount).unwrap(), vec![disk.clone()]);
        assert_eq!(registry.deployment_order().unwrap(), vec![disk, mount]);
    }

    #[test]
    fn test_unknown_type_and_reference() {
        let mut registry = registry();
        assert!(matches!(
            registry.register(ResourceInstance::new("Bucket")),
            Err(ProvisioningError::UnknownResource(_))
        ));

        let dangling = ResourceRef::new("Disk", IdentityKey::of_strs(["z", "ghost"]));
        let volume = registry
            .promises()
            .create(&dangling, "volume_id", ValueKind::Str);
        let err = registry
            .register(
                ResourceInstance::new("Mount")
                    .with("disk", dangling)
                    .with("path", "/ghost")
                    .with("volume_id", volume),
            )
            .unwrap_err();
        assert!(matches!(err, ProvisioningError::UnknownResource(_)));
    }

    #[test]
    fn test_schema_without_identity_is_rejected() {
        let mut registry = registry();
        let err = registry
            .add_schema(ResourceSchema::new("Loose").required("name", FieldKind::Str))
            .unwrap_err();
        assert!(matches!(err, ProvisioningError::Configuration(_)));

        let err = registry
            .add_schema(
                ResourceSchema::new("Bad")
                    .required("name", FieldKind::Str)
                    .identity(&["missing"]),
            )
            .unwrap_err();
        assert!(matches!(err, ProvisioningError::Configuration(_)));
    }

    #[test]
    fn test_adopt_single_owner() {
        let mut registry = registry();
        let disk = registry.register(disk(10)).unwrap();
        let volume = registry.promise(&disk, "volume_id").unwrap();
        let mount = registry
            .register(
                ResourceInstance::new("Mount")
                    .with("disk", disk.clone())
                    .with("path", "/data")
                    .with("volume_id", volume),
            )
            .unwrap();

        registry.adopt(&mount, &disk).unwrap();
        registry.adopt(&mount, &disk).unwrap();
        assert_eq!(registry.get(&disk).unwrap().owner(), Some(&mount));

        let other = registry
            .register(
                ResourceInstance::new("Disk")
                    .with("zone", "b")
                    .with("name", "scratch")
                    .with("size", 1i64),
            )
            .unwrap();
        assert!(registry.adopt(&other, &disk).is_err());
    }

    fn mount(disk: &ResourceRef, volume: PromiseRef) -> ResourceInstance {
        ResourceInstance::new("Mount")
            .with("disk", disk.clone())
            .with("path", "/data")
            .with("volume_id", volume)
    }

    #[test]
    fn test_alias_of_unreferenced_resource_rejected() {
        let mut registry = registry();
        let data = registry.register(disk(10)).unwrap();
        let scratch = registry
            .register(
                ResourceInstance::new("Disk")
                    .with("zone", "a")
                    .with("name", "scratch")
                    .with("size", 1i64),
            )
            .unwrap();
        let scratch_volume = registry.promise(&scratch, "volume_id").unwrap();

        let err = registry.register(mount(&data, scratch_volume)).unwrap_err();
        assert!(matches!(err, ProvisioningError::ConstraintViolation { .. }));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_alias_of_unregistered_owner_rejected() {
        let mut registry = registry();
        let data = registry.register(disk(10)).unwrap();

        let elsewhere = ResourceRef::new("Disk", IdentityKey::of_strs(["b", "data"]));
        let dangling = PromiseRegistry::new().create(&elsewhere, "volume_id", ValueKind::Str);

        let err = registry.register(mount(&data, dangling)).unwrap_err();
        assert!(matches!(err, ProvisioningError::UnknownResource(_)));
    }

    #[test]
    fn test_alias_of_referenced_promise_accepted() {
        let mut registry = registry();
        let data = registry.register(disk(10)).unwrap();
        let volume = registry.promise(&data, "volume_id").unwrap();
        let mount = registry.register(mount(&data, volume.clone())).unwrap();
        assert_eq!(registry.promise(&mount, "volume_id").unwrap(), volume);
        assert_eq!(registry.dependencies(&mount).unwrap(), vec![data]);
    }
}
