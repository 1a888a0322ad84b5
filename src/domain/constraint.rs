// Copyright (c) 2025 - Cowboy AI, Inc.
//! Predicate-Refined Types
//!
//! A [`ConstrainedType`] is a named type tag attached to a pure predicate over
//! a base type. Values only exist in refined form once the predicate has
//! accepted them, so every field holding a [`Constrained`] value was checked at
//! its construction boundary.
//!
//! # Examples
//!
//! ```rust
//! use cim_provisioning::domain::ConstrainedType;
//!
//! let size = ConstrainedType::one_of("VolumeSize", &["small", "large"]);
//! assert!(size.construct("small".to_string()).is_ok());
//! assert!(size.construct("huge".to_string()).is_err());
//!
//! let port = ConstrainedType::from_predicate("Port", |p: &i64| (1..=65535).contains(p));
//! assert!(port.construct(22).is_ok());
//! assert!(port.construct(0).is_err());
//! ```

use std::fmt;
use std::sync::Arc;

use crate::errors::{ProvisioningError, ProvisioningResult};

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A base type refined by a predicate
pub struct ConstrainedType<T> {
    name: &'static str,
    predicate: Predicate<T>,
}

impl<T> ConstrainedType<T> {
    /// Refine `T` by an arbitrary pure predicate
    pub fn from_predicate<F>(name: &'static str, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            predicate: Arc::new(predicate),
        }
    }

    /// Name of the refined type
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Evaluate the predicate without constructing a value
    pub fn check(&self, value: &T) -> bool {
        (self.predicate)(value)
    }
}

impl<T: fmt::Debug> ConstrainedType<T> {
    /// Construct a refined value, failing with `ConstraintViolation`
    pub fn construct(&self, value: T) -> ProvisioningResult<Constrained<T>> {
        if !self.check(&value) {
            return Err(ProvisioningError::constraint(
                self.name,
                format!("{:?} does not satisfy the {} constraint", value, self.name),
            ));
        }
        Ok(Constrained {
            type_name: self.name,
            value,
        })
    }
}

impl ConstrainedType<String> {
    /// Refine strings by membership in a closed set
    pub fn one_of(name: &'static str, allowed: &'static [&'static str]) -> Self {
        Self::from_predicate(name, move |value: &String| allowed.contains(&value.as_str()))
    }
}

impl<T> Clone for ConstrainedType<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T> fmt::Debug for ConstrainedType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstrainedType<{}>({})", std::any::type_name::<T>(), self.name)
    }
}

/// A value that satisfied its type's predicate at construction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constrained<T> {
    type_name: &'static str,
    value: T,
}

impl<T> Constrained<T> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}
