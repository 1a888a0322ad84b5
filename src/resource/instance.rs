// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource instances, identity keys and canonical references

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

use super::value::FieldValue;
use crate::errors::{ProvisioningError, ProvisioningResult};
use crate::promise::PromiseRef;

/// A declared resource: its type name and field values
///
/// Fields are kept sorted by name so that two instances built in different
/// orders compare and serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceInstance {
    resource_type: String,
    fields: BTreeMap<String, FieldValue>,
}

impl ResourceInstance {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Read a string field, failing if it is absent or of another kind
    pub fn str_field(&self, name: &str) -> ProvisioningResult<&str> {
        self.get(name)
            .and_then(FieldValue::as_str)
            .ok_or_else(|| self.missing(name, "string"))
    }

    pub fn bool_field(&self, name: &str) -> ProvisioningResult<bool> {
        self.get(name)
            .and_then(FieldValue::as_bool)
            .ok_or_else(|| self.missing(name, "bool"))
    }

    pub fn int_field(&self, name: &str) -> ProvisioningResult<i64> {
        self.get(name)
            .and_then(FieldValue::as_int)
            .ok_or_else(|| self.missing(name, "int"))
    }

    pub fn ref_field(&self, name: &str) -> ProvisioningResult<&ResourceRef> {
        self.get(name)
            .and_then(FieldValue::as_resource)
            .ok_or_else(|| self.missing(name, "resource reference"))
    }

    pub fn promise_field(&self, name: &str) -> ProvisioningResult<&PromiseRef> {
        self.get(name)
            .and_then(FieldValue::as_promise)
            .ok_or_else(|| self.missing(name, "promise"))
    }

    /// Every resource this instance references directly
    pub fn references(&self) -> impl Iterator<Item = &ResourceRef> {
        self.fields.values().filter_map(FieldValue::as_resource)
    }

    fn missing(&self, name: &str, kind: &str) -> ProvisioningError {
        ProvisioningError::constraint(
            self.resource_type.clone(),
            format!("field '{}' is not a {}", name, kind),
        )
    }
}

/// One component of an identity key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Ref(Uuid),
}

impl KeyValue {
    /// Convert a field value into a key component; only scalars qualify
    pub fn from_field(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Str(s) => Some(KeyValue::Str(s.clone())),
            FieldValue::Bool(b) => Some(KeyValue::Bool(*b)),
            FieldValue::Int(i) => Some(KeyValue::Int(*i)),
            FieldValue::Ref(r) => Some(KeyValue::Ref(r.id())),
            FieldValue::List(_) | FieldValue::Promise(_) => None,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Str(s) => write!(f, "{}", s),
            KeyValue::Bool(b) => write!(f, "{}", b),
            KeyValue::Int(i) => write!(f, "{}", i),
            KeyValue::Ref(id) => write!(f, "#{}", id),
        }
    }
}

/// Ordered tuple of key-path values identifying a real-world resource
///
/// Component order follows the type's declared key paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IdentityKey(Vec<KeyValue>);

impl IdentityKey {
    pub fn new(values: Vec<KeyValue>) -> Self {
        Self(values)
    }

    /// Key made of string components, the common case
    pub fn of_strs<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(|s| KeyValue::Str(s.into())).collect())
    }

    pub fn values(&self) -> &[KeyValue] {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

/// Canonical reference to a registered resource
///
/// Two references are equal when they name the same registry entry. The type
/// name and identity key travel along for display and diagnostics.
#[derive(Debug, Clone)]
pub struct ResourceRef {
    id: Uuid,
    resource_type: String,
    key: IdentityKey,
}

impl ResourceRef {
    pub(crate) fn new(resource_type: impl Into<String>, key: IdentityKey) -> Self {
        Self {
            id: Uuid::now_v7(),
            resource_type: resource_type.into(),
            key,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn key(&self) -> &IdentityKey {
        &self.key
    }
}

impl PartialEq for ResourceRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResourceRef {}

impl Hash for ResourceRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.resource_type, self.key)
    }
}

impl Serialize for ResourceRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_instance_field_access() {
        let instance = ResourceInstance::new("IAMRole")
            .with("name", "deployer")
            .with("permissions", FieldValue::strings(["ec2:*"]));

        assert_eq!(instance.resource_type(), "IAMRole");
        assert_eq!(instance.str_field("name").unwrap(), "deployer");
        assert!(instance.contains("permissions"));
        assert!(instance.bool_field("name").is_err());
        assert!(instance.str_field("missing").is_err());
    }

    #[test]
    fn test_instances_compare_independent_of_build_order() {
        let a = ResourceInstance::new("EC2KeyPair")
            .with("name", "ops")
            .with("public_key", "ssh-ed25519 AAAA");
        let b = ResourceInstance::new("EC2KeyPair")
            .with("public_key", "ssh-ed25519 AAAA")
            .with("name", "ops");
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_identity_key_display() {
        let key = IdentityKey::of_strs(["eu-west-1", "web-1"]);
        assert_eq!(key.to_string(), "(eu-west-1, web-1)");
        assert_eq!(key.values().len(), 2);
    }

    #[test]
    fn test_ref_equality_is_by_entry() {
        let key = IdentityKey::of_strs(["ops"]);
        let a = ResourceRef::new("EC2KeyPair", key.clone());
        let b = ResourceRef::new("EC2KeyPair", key);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.to_string(), "EC2KeyPair(ops)");
    }

    #[test]
    fn test_key_value_rejects_lists() {
        assert!(KeyValue::from_field(&FieldValue::strings(["a"])).is_none());
        assert_eq!(
            KeyValue::from_field(&FieldValue::from("a")),
            Some(KeyValue::Str("a".to_string()))
        );
    }
}
