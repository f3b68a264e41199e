// SPDX-License-Identifier: MIT OR Apache-2.0
//! Field event listeners.
//!
//! Listeners are notified after propagation has converged, once per changed
//! field per tick, in registration order. The registry lock is never held
//! while a listener runs, so a listener may freely talk back to the scene.

use crate::field::{FieldId, FieldValue};
use crate::node::NodeId;
use crate::route::FieldRef;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// A change delivered to listeners
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEvent {
    /// Node owning the field
    pub node: NodeId,
    /// Field handle
    pub field: FieldId,
    /// Field name
    pub field_name: String,
    /// Value at the end of the tick
    pub value: FieldValue,
    /// Tick in which the change happened
    pub tick: u64,
    /// Simulation time of that tick
    pub time: f64,
}

/// Observer of field changes
pub trait FieldListener: Send + Sync {
    /// Called during the Notifying phase of the tick that changed the field
    fn field_changed(&self, event: &FieldEvent);
}

impl<F> FieldListener for F
where
    F: Fn(&FieldEvent) + Send + Sync,
{
    fn field_changed(&self, event: &FieldEvent) {
        self(event);
    }
}

/// Per-field listener lists
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<IndexMap<FieldRef, Vec<(ListenerId, Arc<dyn FieldListener>)>>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an ID for a listener that will be registered later
    pub fn allocate_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Register a listener at the end of a field's list
    pub fn add(&self, field: FieldRef, id: ListenerId, listener: Arc<dyn FieldListener>) {
        self.listeners.lock().entry(field).or_default().push((id, listener));
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove(&self, field: FieldRef, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(list) = listeners.get_mut(&field) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;
        if list.is_empty() {
            listeners.shift_remove(&field);
        }
        removed
    }

    /// Drop every listener on a node's fields
    pub fn remove_node(&self, node: NodeId) -> usize {
        let mut listeners = self.listeners.lock();
        let mut removed = 0;
        listeners.retain(|field, list| {
            if field.node == node {
                removed += list.len();
                false
            } else {
                true
            }
        });
        removed
    }

    /// Copy of a field's listeners in registration order
    pub fn snapshot(&self, field: &FieldRef) -> Vec<Arc<dyn FieldListener>> {
        self.listeners
            .lock()
            .get(field)
            .map(|list| list.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default()
    }

    /// Number of listeners on a field
    pub fn count(&self, field: &FieldRef) -> usize {
        self.listeners.lock().get(field).map_or(0, Vec::len)
    }

    /// Total number of registered listeners
    pub fn total(&self) -> usize {
        self.listeners.lock().values().map(Vec::len).sum()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry").field("total", &self.total()).finish()
    }
}
