// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Schemas
//!
//! A [`ResourceSchema`] names a resource type, its typed fields, and the key
//! paths that make up its identity. Schemas are built once, when the resource
//! type is defined, and every instance is checked against its schema before
//! the registry accepts it.
//!
//! # Field kinds
//!
//! - plain scalars and string lists
//! - [`FieldKind::Constrained`] strings refined by a [`ConstrainedType`]
//! - [`FieldKind::Ref`] references to another registered resource
//! - [`FieldKind::Promise`] values owned by this resource and filled in at deployment
//! - [`FieldKind::Alias`] promises owned by another resource and re-exposed here
//!
//! # Example
//!
//! ```rust
//! use cim_provisioning::resource::{FieldKind, ResourceInstance, ResourceSchema, ValueKind};
//!
//! let schema = ResourceSchema::new("Bucket")
//!     .required("name", FieldKind::Str)
//!     .with_default("versioned", FieldKind::Bool, false)
//!     .promise("arn", ValueKind::Str)
//!     .identity(&["name"]);
//!
//! let mut bucket = ResourceInstance::new("Bucket").with("name", "logs");
//! schema.validate(&mut bucket).unwrap();
//! assert!(!bucket.bool_field("versioned").unwrap());
//! ```

use std::fmt;

use super::instance::ResourceInstance;
use super::value::{FieldValue, ValueKind};
use crate::domain::ConstrainedType;
use crate::errors::{ProvisioningError, ProvisioningResult};

/// Declared type of a schema field
#[derive(Debug, Clone)]
pub enum FieldKind {
    Str,
    Bool,
    Int,
    StrList,
    /// String refined by a predicate
    Constrained(ConstrainedType<String>),
    /// OpenSSH public key; equivalence ignores the trailing comment
    SshPublicKey,
    /// Reference to a registered resource of the named type
    Ref(&'static str),
    /// Promise owned by this resource, created at registration
    Promise(ValueKind),
    /// Promise owned by another resource, exposed unchanged
    Alias(ValueKind),
}

/// Whether a field must be supplied at declaration
#[derive(Debug, Clone)]
pub enum Presence {
    Required,
    Optional,
    Default(FieldValue),
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: &'static str,
    kind: FieldKind,
    presence: Presence,
}

impl FieldSpec {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn is_owned_promise(&self) -> bool {
        matches!(self.kind, FieldKind::Promise(_))
    }
}

/// Sequence of field-access steps, e.g. `instance.region`
///
/// Every step but the last must land on a resource reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    steps: Vec<String>,
}

impl KeyPath {
    pub fn parse(path: &str) -> Self {
        Self {
            steps: path.split('.').map(str::to_string).collect(),
        }
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn root(&self) -> &str {
        &self.steps[0]
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.steps.join("."))
    }
}

/// Named record type with typed fields and an identity declaration
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    resource_type: &'static str,
    fields: Vec<FieldSpec>,
    identity: Vec<KeyPath>,
}

impl ResourceSchema {
    pub fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            fields: Vec::new(),
            identity: Vec::new(),
        }
    }

    pub fn required(self, name: &'static str, kind: FieldKind) -> Self {
        self.field(name, kind, Presence::Required)
    }

    pub fn optional(self, name: &'static str, kind: FieldKind) -> Self {
        self.field(name, kind, Presence::Optional)
    }

    pub fn with_default(
        self,
        name: &'static str,
        kind: FieldKind,
        default: impl Into<FieldValue>,
    ) -> Self {
        self.field(name, kind, Presence::Default(default.into()))
    }

    /// Declare a promise field owned by this resource
    pub fn promise(self, name: &'static str, kind: ValueKind) -> Self {
        self.field(name, FieldKind::Promise(kind), Presence::Optional)
    }

    /// Declare a field aliasing a promise owned by another resource
    pub fn alias(self, name: &'static str, kind: ValueKind) -> Self {
        self.field(name, FieldKind::Alias(kind), Presence::Required)
    }

    /// Declare the identity key paths, in key order
    pub fn identity(mut self, paths: &[&str]) -> Self {
        self.identity = paths.iter().map(|p| KeyPath::parse(p)).collect();
        self
    }

    fn field(mut self, name: &'static str, kind: FieldKind, presence: Presence) -> Self {
        self.fields.push(FieldSpec {
            name,
            kind,
            presence,
        });
        self
    }

    pub fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn identity_paths(&self) -> &[KeyPath] {
        &self.identity
    }

    /// Promise fields the registry creates when a new entry is stored
    pub fn owned_promises(&self) -> impl Iterator<Item = (&'static str, ValueKind)> + '_ {
        self.fields.iter().filter_map(|f| match f.kind {
            FieldKind::Promise(kind) => Some((f.name, kind)),
            _ => None,
        })
    }

    /// Check an instance against this schema and fill in defaults
    ///
    /// Owned promise fields must be absent; the registry creates them.
    pub fn validate(&self, instance: &mut ResourceInstance) -> ProvisioningResult<()> {
        if instance.resource_type() != self.resource_type {
            return Err(self.violation(format!(
                "instance of type {} checked against this schema",
                instance.resource_type()
            )));
        }

        if let Some((name, _)) = instance
            .fields()
            .find(|(name, _)| self.field_spec(name).is_none())
        {
            return Err(self.violation(format!("unknown field '{}'", name)));
        }

        for spec in &self.fields {
            if spec.is_owned_promise() {
                if instance.contains(spec.name) {
                    return Err(self.violation(format!(
                        "field '{}' is populated at deployment and cannot be declared",
                        spec.name
                    )));
                }
                continue;
            }

            match instance.get(spec.name) {
                Some(value) => self.check_value(spec, value)?,
                None => match &spec.presence {
                    Presence::Required => {
                        return Err(
                            self.violation(format!("missing required field '{}'", spec.name))
                        )
                    }
                    Presence::Default(default) => instance.set(spec.name, default.clone()),
                    Presence::Optional => {}
                },
            }
        }

        Ok(())
    }

    fn check_value(&self, spec: &FieldSpec, value: &FieldValue) -> ProvisioningResult<()> {
        let ok = match (&spec.kind, value) {
            (FieldKind::Str, FieldValue::Str(_)) => true,
            (FieldKind::Bool, FieldValue::Bool(_)) => true,
            (FieldKind::Int, FieldValue::Int(_)) => true,
            (FieldKind::StrList, FieldValue::List(items)) => {
                items.iter().all(|item| matches!(item, FieldValue::Str(_)))
            }
            (FieldKind::Constrained(constraint), FieldValue::Str(s)) => {
                if !constraint.check(s) {
                    return Err(ProvisioningError::constraint(
                        constraint.name(),
                        format!(
                            "field '{}' value '{}' is not a valid {}",
                            spec.name,
                            s,
                            constraint.name()
                        ),
                    ));
                }
                true
            }
            (FieldKind::SshPublicKey, FieldValue::Str(s)) => key_material(s).is_some(),
            (FieldKind::Ref(target), FieldValue::Ref(r)) => r.resource_type() == *target,
            (FieldKind::Alias(kind), FieldValue::Promise(p)) => p.kind() == *kind,
            _ => false,
        };

        if !ok {
            return Err(self.violation(format!(
                "field '{}' has an invalid value: {}",
                spec.name, value
            )));
        }
        Ok(())
    }

    /// First non-promise field in which two instances differ
    ///
    /// Owned promises are ignored: they belong to whichever entry was stored
    /// first and are never part of a declaration.
    pub fn first_difference(
        &self,
        a: &ResourceInstance,
        b: &ResourceInstance,
    ) -> Option<&'static str> {
        self.fields
            .iter()
            .filter(|spec| !spec.is_owned_promise())
            .find(|spec| !Self::equivalent(&spec.kind, a.get(spec.name), b.get(spec.name)))
            .map(|spec| spec.name)
    }

    fn equivalent(kind: &FieldKind, a: Option<&FieldValue>, b: Option<&FieldValue>) -> bool {
        match (kind, a, b) {
            (FieldKind::SshPublicKey, Some(FieldValue::Str(a)), Some(FieldValue::Str(b))) => {
                key_material(a) == key_material(b)
            }
            _ => a == b,
        }
    }

    fn violation(&self, detail: String) -> ProvisioningError {
        ProvisioningError::constraint(self.resource_type, detail)
    }
}

/// Base64 body of an OpenSSH public key, without type prefix or comment
pub fn key_material(public_key: &str) -> Option<&str> {
    let mut parts = public_key.split_whitespace();
    let _key_type = parts.next()?;
    parts.next()
}
