// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Model
//!
//! Declared resources are plain records: a type name plus a sorted map of
//! [`FieldValue`]s. A [`ResourceSchema`] gives each type its field kinds,
//! defaults and identity key paths. The registry turns a validated
//! [`ResourceInstance`] into a canonical [`ResourceRef`].
//!
//! Typed resources implement [`Resource`] to describe their schema and to
//! lower themselves into a [`ResourceInstance`].

pub mod instance;
pub mod schema;
pub mod value;

pub use instance::{IdentityKey, KeyValue, ResourceInstance, ResourceRef};
pub use schema::{key_material, FieldKind, FieldSpec, KeyPath, Presence, ResourceSchema};
pub use value::{FieldValue, ValueKind};

/// A resource type with a fixed schema
pub trait Resource {
    /// Type name shared by the schema and every instance
    const RESOURCE_TYPE: &'static str;

    fn schema() -> ResourceSchema;

    /// Lower the declaration into a registrable instance
    fn to_instance(&self) -> ResourceInstance;
}
