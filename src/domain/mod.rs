// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Domain Value Objects
//!
//! Refined types whose validity is checked once, at construction.
//!
//! - [`ConstrainedType`] - a named predicate over a base type
//! - [`Region`] - AWS region code, refined by membership in [`REGION_CODES`]

pub mod constraint;
pub mod region;

pub use constraint::{Constrained, ConstrainedType};
pub use region::{Region, REGION_CODES};
