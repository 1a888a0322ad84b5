// Copyright (c) 2025 - Cowboy AI, Inc.
//! Field values carried by resource instances

use serde::{Deserialize, Serialize};
use std::fmt;

use super::instance::ResourceRef;
use crate::promise::PromiseRef;

/// Shape of a field value, used for schema checks and promise typing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Str,
    Bool,
    Int,
    List,
    Ref,
    Promise,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Str => "string",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::List => "list",
            ValueKind::Ref => "resource reference",
            ValueKind::Promise => "promise",
        };
        f.write_str(name)
    }
}

/// A resolved value, a reference to another resource, or a promise
///
/// Equality is structural for plain values. References compare by registry
/// entry and promises by identity, so an alias of a promise equals the
/// promise it aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Str(String),
    Bool(bool),
    Int(i64),
    List(Vec<FieldValue>),
    Ref(ResourceRef),
    Promise(PromiseRef),
}

impl FieldValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Str(_) => ValueKind::Str,
            FieldValue::Bool(_) => ValueKind::Bool,
            FieldValue::Int(_) => ValueKind::Int,
            FieldValue::List(_) => ValueKind::List,
            FieldValue::Ref(_) => ValueKind::Ref,
            FieldValue::Promise(_) => ValueKind::Promise,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&ResourceRef> {
        match self {
            FieldValue::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_promise(&self) -> Option<&PromiseRef> {
        match self {
            FieldValue::Promise(p) => Some(p),
            _ => None,
        }
    }

    /// Build a list of strings
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::List(items.into_iter().map(|s| FieldValue::Str(s.into())).collect())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => write!(f, "{}", s),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            FieldValue::Ref(r) => write!(f, "{}", r),
            FieldValue::Promise(p) => write!(f, "<{}>", p.label()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<ResourceRef> for FieldValue {
    fn from(value: ResourceRef) -> Self {
        FieldValue::Ref(value)
    }
}

impl From<PromiseRef> for FieldValue {
    fn from(value: PromiseRef) -> Self {
        FieldValue::Promise(value)
    }
}
