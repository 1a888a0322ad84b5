// Copyright (c) 2025 - Cowboy AI, Inc.
//! Promise Registry
//!
//! A promise is a typed placeholder for a value that only becomes known once
//! the owning resource has been deployed, such as an instance's public
//! address. Promises can be embedded in other resources' fields before they
//! resolve.
//!
//! # Lifecycle
//!
//! ```text
//! Pending ──resolve(v)──▶ Resolved(v)
//!    │
//!    └──cancel(reason)──▶ Cancelled(reason)
//! ```
//!
//! Both terminal states are final. A second `resolve`, or a `resolve` after
//! cancellation, fails with `AlreadyResolved`.
//!
//! # Concurrency
//!
//! Each promise holds its state in a `tokio::sync::watch` channel. Writers go
//! through `send_if_modified`, so the pending check and the write happen under
//! one lock and at most one writer wins. Readers subscribe and suspend in
//! `wait_for` until the state leaves `Pending`; cancellation wakes them with a
//! terminal error.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{ProvisioningError, ProvisioningResult};
use crate::resource::{FieldValue, ResourceRef, ValueKind};

/// Unique identifier of a promise
pub type PromiseId = Uuid;

/// Resolution state of a promise
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum PromiseState {
    Pending,
    Resolved(FieldValue),
    Cancelled(String),
}

impl PromiseState {
    pub fn is_pending(&self) -> bool {
        matches!(self, PromiseState::Pending)
    }
}

struct PromiseCell {
    id: PromiseId,
    owner: ResourceRef,
    name: String,
    kind: ValueKind,
    state: watch::Sender<PromiseState>,
}

/// Shared handle to a promise
///
/// Clones point at the same cell, so a composite that stores a clone of a
/// sub-resource's promise observes its resolution directly.
#[derive(Clone)]
pub struct PromiseRef {
    cell: Arc<PromiseCell>,
}

impl PromiseRef {
    fn new(owner: &ResourceRef, name: impl Into<String>, kind: ValueKind) -> Self {
        let (state, _) = watch::channel(PromiseState::Pending);
        Self {
            cell: Arc::new(PromiseCell {
                id: Uuid::now_v7(),
                owner: owner.clone(),
                name: name.into(),
                kind,
                state,
            }),
        }
    }

    pub fn id(&self) -> PromiseId {
        self.cell.id
    }

    /// Resource that owns this promise
    pub fn owner(&self) -> &ResourceRef {
        &self.cell.owner
    }

    pub fn name(&self) -> &str {
        &self.cell.name
    }

    pub fn kind(&self) -> ValueKind {
        self.cell.kind
    }

    /// Human-readable location, e.g. `EC2Instance(eu-west-1, web-1).public_address`
    pub fn label(&self) -> String {
        format!("{}.{}", self.cell.owner, self.cell.name)
    }

    /// Snapshot of the current state
    pub fn state(&self) -> PromiseState {
        self.cell.state.borrow().clone()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.cell.state.borrow(), PromiseState::Resolved(_))
    }

    /// Resolved value, if any, without waiting
    pub fn try_read(&self) -> Option<FieldValue> {
        match &*self.cell.state.borrow() {
            PromiseState::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Wait for the promise to resolve
    ///
    /// Returns immediately once resolved. Fails with `Cancelled` if the
    /// owning resource's deployment is cancelled or fails.
    pub async fn read(&self) -> ProvisioningResult<FieldValue> {
        let mut receiver = self.cell.state.subscribe();
        let state = receiver
            .wait_for(|state| !state.is_pending())
            .await
            .map(|state| state.clone())
            .map_err(|_| self.cancelled("promise channel closed"))?;

        match state {
            PromiseState::Resolved(value) => Ok(value),
            PromiseState::Cancelled(reason) => Err(self.cancelled(&reason)),
            PromiseState::Pending => Err(self.cancelled("promise still pending")),
        }
    }

    pub(crate) fn resolve(&self, value: FieldValue) -> ProvisioningResult<()> {
        if value.kind() != self.cell.kind {
            return Err(ProvisioningError::constraint(
                self.label(),
                format!("expected a {} value, got {}", self.cell.kind, value.kind()),
            ));
        }

        let mut value = Some(value);
        let written = self.cell.state.send_if_modified(|state| {
            if !state.is_pending() {
                return false;
            }
            if let Some(value) = value.take() {
                *state = PromiseState::Resolved(value);
            }
            true
        });

        if !written {
            return Err(ProvisioningError::AlreadyResolved {
                promise: self.label(),
            });
        }
        debug!(promise = %self.label(), "Promise resolved");
        Ok(())
    }

    /// Cancel a pending promise; returns false if it had already settled
    pub(crate) fn cancel(&self, reason: &str) -> bool {
        let cancelled = self.cell.state.send_if_modified(|state| {
            if !state.is_pending() {
                return false;
            }
            *state = PromiseState::Cancelled(reason.to_string());
            true
        });
        if cancelled {
            warn!(promise = %self.label(), reason, "Promise cancelled");
        }
        cancelled
    }

    fn cancelled(&self, reason: &str) -> ProvisioningError {
        ProvisioningError::Cancelled {
            promise: self.label(),
            reason: reason.to_string(),
        }
    }
}

impl PartialEq for PromiseRef {
    fn eq(&self, other: &Self) -> bool {
        self.cell.id == other.cell.id
    }
}

impl Eq for PromiseRef {}

impl fmt::Debug for PromiseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseRef")
            .field("id", &self.cell.id)
            .field("label", &self.label())
            .field("kind", &self.cell.kind)
            .field("state", &*self.cell.state.borrow())
            .finish()
    }
}

impl Serialize for PromiseRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PromiseRef", 3)?;
        s.serialize_field("promise", &self.label())?;
        s.serialize_field("kind", &self.cell.kind)?;
        s.serialize_field("resolution", &self.state())?;
        s.end()
    }
}

#[derive(Default)]
struct PromiseTable {
    by_id: HashMap<PromiseId, PromiseRef>,
    by_owner: HashMap<Uuid, Vec<PromiseId>>,
}

/// Registry of every promise created during a module evaluation
///
/// Safe to share across tasks; the deployment engine resolves promises from
/// whichever context deploys the owning resource.
#[derive(Default)]
pub struct PromiseRegistry {
    table: RwLock<PromiseTable>,
}

impl PromiseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending promise owned by `owner`
    pub fn create(&self, owner: &ResourceRef, name: &str, kind: ValueKind) -> PromiseRef {
        let promise = PromiseRef::new(owner, name, kind);
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        table.by_id.insert(promise.id(), promise.clone());
        table
            .by_owner
            .entry(owner.id())
            .or_default()
            .push(promise.id());
        debug!(promise = %promise.label(), kind = %kind, "Promise created");
        promise
    }

    pub fn get(&self, id: PromiseId) -> ProvisioningResult<PromiseRef> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| ProvisioningError::UnknownPromise(id.to_string()))
    }

    /// Promises owned by a resource, in creation order
    pub fn owned_by(&self, owner: &ResourceRef) -> Vec<PromiseRef> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table
            .by_owner
            .get(&owner.id())
            .map(|ids| ids.iter().filter_map(|id| table.by_id.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    /// Promise named `name` owned by `owner`
    pub fn find(&self, owner: &ResourceRef, name: &str) -> ProvisioningResult<PromiseRef> {
        self.owned_by(owner)
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| ProvisioningError::UnknownPromise(format!("{}.{}", owner, name)))
    }

    /// Resolve a promise; single writer
    pub fn resolve(&self, id: PromiseId, value: impl Into<FieldValue>) -> ProvisioningResult<()> {
        self.get(id)?.resolve(value.into())
    }

    /// Resolve the promise `name` owned by `owner`
    pub fn resolve_field(
        &self,
        owner: &ResourceRef,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> ProvisioningResult<()> {
        self.find(owner, name)?.resolve(value.into())
    }

    /// Wait for a promise by id
    pub async fn read(&self, id: PromiseId) -> ProvisioningResult<FieldValue> {
        let promise = self.get(id)?;
        promise.read().await
    }

    /// Cancel a pending promise, waking every suspended reader
    pub fn cancel(&self, id: PromiseId, reason: &str) -> ProvisioningResult<()> {
        let promise = self.get(id)?;
        if !promise.cancel(reason) {
            return Err(ProvisioningError::AlreadyResolved {
                promise: promise.label(),
            });
        }
        Ok(())
    }

    /// Cancel every pending promise owned by a resource; returns how many
    pub fn cancel_owner(&self, owner: &ResourceRef, reason: &str) -> usize {
        self.owned_by(owner)
            .iter()
            .filter(|promise| promise.cancel(reason))
            .count()
    }

    /// Promises that are still pending
    pub fn pending(&self) -> Vec<PromiseRef> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        let mut pending: Vec<PromiseRef> = table
            .by_id
            .values()
            .filter(|p| p.state().is_pending())
            .cloned()
            .collect();
        pending.sort_by_key(PromiseRef::id);
        pending
    }

    pub fn len(&self) -> usize {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for PromiseRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseRegistry")
            .field("promises", &self.len())
            .finish()
    }
}
