// SPDX-License-Identifier: MIT OR Apache-2.0
//! External event queue.
//!
//! Every change coming from outside the simulation thread (field writes,
//! listener registration, structural edits) is appended here and merged
//! into the scene during the Draining phase of the next tick. The buffer lock
//! is only held for an append or a swap.

use crate::field::FieldWrite;
use crate::listener::{FieldListener, ListenerId};
use crate::node::NodeId;
use crate::route::{FieldRef, Route};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Default bound on the number of buffered events
pub const DEFAULT_MAX_PENDING_EVENTS: usize = 65_536;

/// A listener (de)registration request
#[derive(Clone)]
pub enum ListenerChange {
    /// Append a listener to a field's list
    Add {
        /// Observed field
        field: FieldRef,
        /// ID handed back to the caller
        id: ListenerId,
        /// The listener
        listener: Arc<dyn FieldListener>,
    },
    /// Remove a listener from a field's list
    Remove {
        /// Observed field
        field: FieldRef,
        /// ID returned when it was added
        id: ListenerId,
    },
}

impl std::fmt::Debug for ListenerChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add { field, id, .. } => f
                .debug_struct("Add")
                .field("field", field)
                .field("id", id)
                .finish(),
            Self::Remove { field, id } => f
                .debug_struct("Remove")
                .field("field", field)
                .field("id", id)
                .finish(),
        }
    }
}

/// A change to the scene's structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralChange {
    /// Add a route (no-op if present)
    AddRoute(Route),
    /// Remove a route
    RemoveRoute(Route),
    /// Add a node to the root set
    AddRootNode(NodeId),
    /// Remove a node from the root set
    RemoveRootNode(NodeId),
    /// Destroy a node, pruning its routes and listeners
    RemoveNode(NodeId),
}

/// One buffered event
#[derive(Debug, Clone)]
pub enum PendingEvent {
    /// Write to a field
    Write {
        /// Target field
        target: FieldRef,
        /// The write
        write: FieldWrite,
    },
    /// Listener registration change
    Listener(ListenerChange),
    /// Structural change
    Structure(StructuralChange),
}

/// Buffered channel between external callers and the cascade
#[derive(Debug)]
pub struct EventQueue {
    pending: Mutex<Vec<PendingEvent>>,
    capacity: AtomicUsize,
    overflowed: AtomicBool,
    enqueued: AtomicU64,
}

impl EventQueue {
    /// Create a queue bounded at `capacity` buffered events
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            capacity: AtomicUsize::new(capacity.max(1)),
            overflowed: AtomicBool::new(false),
            enqueued: AtomicU64::new(0),
        }
    }

    /// Append one event
    pub fn push(&self, event: PendingEvent) -> Result<(), QueueError> {
        self.push_all(vec![event])
    }

    /// Append several events under one lock, so they are drained in the same
    /// tick and in this order
    pub fn push_all(&self, events: Vec<PendingEvent>) -> Result<(), QueueError> {
        if events.is_empty() {
            return Ok(());
        }
        let capacity = self.capacity();
        let mut pending = self.pending.lock();
        if pending.len() + events.len() > capacity {
            drop(pending);
            self.overflowed.store(true, Ordering::Release);
            tracing::error!("Event queue overflow: {} events pending", capacity);
            return Err(QueueError::Overflow { capacity });
        }
        let count = events.len() as u64;
        pending.extend(events);
        self.enqueued.fetch_add(count, Ordering::Relaxed);
        Ok(())
    }

    /// Swap the buffer for an empty one and return everything it held
    pub fn take(&self) -> Vec<PendingEvent> {
        std::mem::take(&mut *self.pending.lock())
    }

    /// Number of buffered events
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Maximum number of buffered events
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }

    /// Change the bound. Events already buffered are kept even if they
    /// exceed it; later pushes fail until a drain makes room.
    pub fn set_capacity(&self, capacity: usize) {
        self.capacity.store(capacity.max(1), Ordering::Relaxed);
    }

    /// Whether a push has been refused for lack of space
    pub fn is_overflowed(&self) -> bool {
        self.overflowed.load(Ordering::Acquire)
    }

    /// Clear the overflow condition once the host has dealt with it
    pub fn clear_overflow(&self) {
        self.overflowed.store(false, Ordering::Release);
    }

    /// Total number of events ever accepted
    pub fn total_enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PENDING_EVENTS)
    }
}

/// Error when buffering an event
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The buffer is full; the scene must be attended to by the host
    #[error("Event queue overflow ({capacity} events pending)")]
    Overflow {
        /// Queue capacity
        capacity: usize,
    },
}
