// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for resource declaration, registration and deployment

use thiserror::Error;

/// Errors that can occur while declaring, registering or deploying resources
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    /// A field value fails its type predicate or the schema's shape rules
    #[error("Constraint violation on {type_name}: {detail}")]
    ConstraintViolation { type_name: String, detail: String },

    /// A cross-field check against the catalog failed
    #[error("Invalid combination for {resource}: {detail}")]
    InvalidCombination { resource: String, detail: String },

    /// Two declarations claim the same identity but differ structurally
    #[error("Conflicting declaration of {resource_type}{key}: field '{field}' differs")]
    ConflictingDeclaration {
        resource_type: String,
        key: String,
        field: String,
    },

    /// A promise was resolved (or cancelled) more than once
    #[error("Promise already resolved: {promise}")]
    AlreadyResolved { promise: String },

    /// The owning resource's deployment was cancelled or failed
    #[error("Promise {promise} cancelled: {reason}")]
    Cancelled { promise: String, reason: String },

    /// Reference to a resource type or entry the registry does not know
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Reference to a promise the promise registry does not know
    #[error("Unknown promise: {0}")]
    UnknownPromise(String),

    /// The resource graph has a reference cycle
    #[error("Dependency cycle involving {0}")]
    DependencyCycle(String),

    /// The external deployer reported a failure
    #[error("Deployment of {resource} failed: {reason}")]
    Deployment { resource: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ProvisioningError {
    pub(crate) fn constraint(type_name: impl Into<String>, detail: impl Into<String>) -> Self {
        ProvisioningError::ConstraintViolation {
            type_name: type_name.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_combination(
        resource: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        ProvisioningError::InvalidCombination {
            resource: resource.into(),
            detail: detail.into(),
        }
    }
}

/// Result type for provisioning operations
pub type ProvisioningResult<T> = Result<T, ProvisioningError>;

impl From<serde_json::Error> for ProvisioningError {
    fn from(err: serde_json::Error) -> Self {
        ProvisioningError::Serialization(err.to_string())
    }
}
