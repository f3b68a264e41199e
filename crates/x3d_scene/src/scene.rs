// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scenes and the handles external callers use to reach them.
//!
//! A [`Scene`] is owned by whoever drives its ticks. Everything else talks to
//! it through a cloneable [`SceneHandle`]: reads go straight to the field,
//! while writes, listener changes and structural edits are buffered in the
//! scene's event queue and applied at the start of the next tick.

use crate::cascade::{CascadeConfig, CascadeEvaluator, TickPhase, TickReport};
use crate::factory::{FactoryError, NodeFactory};
use crate::field::{FieldData, FieldError, FieldValue, FieldWrite};
use crate::listener::{FieldListener, ListenerId};
use crate::node::{Node, NodeId, Renderer};
use crate::queue::{EventQueue, ListenerChange, PendingEvent, QueueError, StructuralChange};
use crate::route::{FieldRef, Route, RouteError, RouteGraph};
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;

/// State shared between a scene and its handles
#[derive(Debug)]
pub struct SceneShared {
    renderer: Renderer,
    factory: NodeFactory,
    /// Live nodes in creation order
    nodes: RwLock<IndexMap<NodeId, Arc<Node>>>,
    roots: RwLock<IndexSet<NodeId>>,
    pub(crate) queue: EventQueue,
    pub(crate) listeners: crate::listener::ListenerRegistry,
    phase: AtomicU8,
    completed_ticks: AtomicU64,
}

impl SceneShared {
    pub(crate) fn node(&self, id: NodeId) -> Option<Arc<Node>> {
        self.nodes.read().get(&id).cloned()
    }

    pub(crate) fn set_phase(&self, phase: TickPhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    pub(crate) fn finish_tick(&self, tick: u64) {
        self.completed_ticks.store(tick, Ordering::Release);
    }

    pub(crate) fn time_dependent_nodes(&self) -> Vec<Arc<Node>> {
        self.nodes
            .read()
            .values()
            .filter(|node| node.is_time_dependent())
            .cloned()
            .collect()
    }

    pub(crate) fn apply_listener_change(&self, change: ListenerChange) {
        match change {
            ListenerChange::Add { field, id, listener } => {
                if self.node(field.node).is_none() {
                    tracing::debug!("Dropping listener for removed node {}", field.node);
                    return;
                }
                self.listeners.add(field, id, listener);
            }
            ListenerChange::Remove { field, id } => {
                if !self.listeners.remove(field, id) {
                    tracing::debug!("Listener {:?} on {} was not registered", id, field);
                }
            }
        }
    }

    /// Apply a structural change. Only called while no propagation is running.
    pub(crate) fn apply_structure(&self, routes: &mut RouteGraph, change: StructuralChange) {
        match change {
            StructuralChange::AddRoute(route) => {
                if self.node(route.from.node).is_none() || self.node(route.to.node).is_none() {
                    tracing::warn!("Dropping route {}: endpoint node was removed", route);
                } else if routes.add(route) {
                    tracing::debug!("Added route {}", route);
                }
            }
            StructuralChange::RemoveRoute(route) => {
                if routes.remove(&route) {
                    tracing::debug!("Removed route {}", route);
                }
            }
            StructuralChange::AddRootNode(id) => {
                if self.node(id).is_some() {
                    self.roots.write().insert(id);
                } else {
                    tracing::warn!("Cannot add removed node {} to the root set", id);
                }
            }
            StructuralChange::RemoveRootNode(id) => {
                self.roots.write().shift_remove(&id);
            }
            StructuralChange::RemoveNode(id) => {
                let Some(node) = self.nodes.write().shift_remove(&id) else {
                    tracing::debug!("Node {} already removed", id);
                    return;
                };
                node.dispose();
                self.roots.write().shift_remove(&id);
                let pruned_routes = routes.remove_node(id);
                let pruned_listeners = self.listeners.remove_node(id);
                tracing::debug!(
                    "Removed node {} ({} routes, {} listeners pruned)",
                    id,
                    pruned_routes,
                    pruned_listeners
                );
            }
        }
    }
}

/// A scene graph bound to one renderer.
///
/// Owns the route graph and the cascade evaluator; `tick` requires `&mut`,
/// so structural methods on `Scene` itself always run between ticks.
#[derive(Debug)]
pub struct Scene {
    shared: Arc<SceneShared>,
    routes: RouteGraph,
    evaluator: CascadeEvaluator,
}

impl Scene {
    /// Create a scene with the default cascade settings
    pub fn new(factory: NodeFactory, renderer: Renderer) -> Self {
        Self::with_config(factory, renderer, CascadeConfig::default())
    }

    /// Create a scene with explicit cascade settings
    pub fn with_config(factory: NodeFactory, renderer: Renderer, config: CascadeConfig) -> Self {
        let config = config.with_max_route_visits(config.max_route_visits);
        let shared = Arc::new(SceneShared {
            renderer,
            factory,
            nodes: RwLock::new(IndexMap::new()),
            roots: RwLock::new(IndexSet::new()),
            queue: EventQueue::new(config.max_pending_events),
            listeners: crate::listener::ListenerRegistry::new(),
            phase: AtomicU8::new(TickPhase::Idle as u8),
            completed_ticks: AtomicU64::new(0),
        });
        tracing::debug!("Created {} scene", renderer);
        Self {
            shared,
            routes: RouteGraph::new(),
            evaluator: CascadeEvaluator::new(config),
        }
    }

    /// A handle for external callers
    pub fn handle(&self) -> SceneHandle {
        SceneHandle::from_shared(Arc::clone(&self.shared))
    }

    /// Renderer the scene is bound to
    pub fn renderer(&self) -> Renderer {
        self.shared.renderer
    }

    /// Cascade settings
    pub fn config(&self) -> &CascadeConfig {
        self.evaluator.config()
    }

    /// Change the per-route visit cap
    pub fn set_max_route_visits(&mut self, visits: u32) {
        self.evaluator.set_max_route_visits(visits);
    }

    /// Change the event queue bound
    pub fn set_max_pending_events(&mut self, events: usize) {
        self.evaluator.set_max_pending_events(events);
        self.shared.queue.set_capacity(events);
    }

    /// Replace every cascade setting; takes effect from the next push and
    /// the next tick
    pub fn apply_config(&mut self, config: CascadeConfig) {
        self.set_max_route_visits(config.max_route_visits);
        self.set_max_pending_events(config.max_pending_events);
    }

    /// Create an unrealised node of a registered type
    pub fn create_node(&self, type_name: &str) -> Result<Node> {
        self.handle().create_node(type_name)
    }

    /// Realise a node and add it to the scene
    pub fn add_node(&self, node: Node) -> NodeId {
        self.handle().add_node(node)
    }

    /// Add and validate a route immediately
    pub fn add_route(&mut self, from: FieldRef, to: FieldRef) -> Result<Route> {
        let route = validate_route(&self.shared, from, to)?;
        if self.routes.add(route) {
            tracing::debug!("Added route {}", route);
        }
        Ok(route)
    }

    /// Add a route between fields given by name
    pub fn add_route_named(
        &mut self,
        from_node: NodeId,
        from_field: &str,
        to_node: NodeId,
        to_field: &str,
    ) -> Result<Route> {
        let handle = self.handle();
        let from = handle.field_ref(from_node, from_field)?;
        let to = handle.field_ref(to_node, to_field)?;
        self.add_route(from, to)
    }

    /// Remove a route immediately; returns `false` if it did not exist
    pub fn remove_route(&mut self, route: &Route) -> bool {
        self.routes.remove(route)
    }

    /// Add a node to the root set immediately
    pub fn add_root_node(&mut self, id: NodeId) -> Result<()> {
        if self.shared.node(id).is_none() {
            return Err(SceneError::UnknownNode(id));
        }
        self.shared.roots.write().insert(id);
        Ok(())
    }

    /// Remove a node from the root set immediately
    pub fn remove_root_node(&mut self, id: NodeId) -> bool {
        self.shared.roots.write().shift_remove(&id)
    }

    /// Destroy a node immediately, pruning its routes and listeners
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        if self.shared.node(id).is_none() {
            return Err(SceneError::UnknownNode(id));
        }
        self.shared
            .apply_structure(&mut self.routes, StructuralChange::RemoveNode(id));
        Ok(())
    }

    /// The route graph
    pub fn routes(&self) -> &RouteGraph {
        &self.routes
    }

    /// Run one tick at simulation time `time` (seconds)
    pub fn tick(&mut self, time: f64) -> Result<TickReport> {
        self.evaluator.tick(&self.shared, &mut self.routes, time)
    }

    /// Number of completed ticks
    pub fn tick_count(&self) -> u64 {
        self.evaluator.tick_count()
    }
}

fn validate_route(shared: &SceneShared, from: FieldRef, to: FieldRef) -> Result<Route> {
    let source = shared.node(from.node).ok_or(SceneError::UnknownNode(from.node))?;
    let destination = shared.node(to.node).ok_or(SceneError::UnknownNode(to.node))?;
    Ok(Route::between(&source, from.field, &destination, to.field)?)
}

/// Cloneable, thread-safe access to a scene.
///
/// Reads return the field's current value without waiting for the cascade.
/// Every mutation is validated immediately, so a bad write fails here rather
/// than being dropped later, and then buffered for the next tick.
#[derive(Debug, Clone)]
pub struct SceneHandle {
    shared: Arc<SceneShared>,
}

impl SceneHandle {
    pub(crate) fn from_shared(shared: Arc<SceneShared>) -> Self {
        Self { shared }
    }

    /// Renderer the scene is bound to
    pub fn renderer(&self) -> Renderer {
        self.shared.renderer
    }

    /// The scene's node factory
    pub fn factory(&self) -> &NodeFactory {
        &self.shared.factory
    }

    /// Create an unrealised node for this scene's renderer
    pub fn create_node(&self, type_name: &str) -> Result<Node> {
        Ok(self.shared.factory.create(type_name, self.shared.renderer)?)
    }

    /// Realise a node and add it to the scene.
    ///
    /// The node has no routes yet, so it is inserted right away; its fields
    /// are readable as soon as this returns.
    pub fn add_node(&self, mut node: Node) -> NodeId {
        node.realize(Arc::downgrade(&self.shared));
        let id = node.id();
        tracing::debug!("Added {} node {}", node.type_name(), id);
        self.shared.nodes.write().insert(id, Arc::new(node));
        id
    }

    /// Look up a live node
    pub fn node(&self, id: NodeId) -> Option<Arc<Node>> {
        self.shared.node(id)
    }

    /// Whether the node is live in this scene
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.shared.nodes.read().contains_key(&id)
    }

    /// Live node IDs in creation order
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.shared.nodes.read().keys().copied().collect()
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.shared.nodes.read().len()
    }

    /// Root node IDs in insertion order
    pub fn root_nodes(&self) -> Vec<NodeId> {
        self.shared.roots.read().iter().copied().collect()
    }

    fn live_node(&self, id: NodeId) -> Result<Arc<Node>> {
        self.shared.node(id).ok_or(SceneError::UnknownNode(id))
    }

    /// Resolve a field by name
    pub fn field_ref(&self, node: NodeId, field: &str) -> Result<FieldRef> {
        let field = self.live_node(node)?.field_id(field)?;
        Ok(FieldRef::new(node, field))
    }

    /// Current value of a field
    pub fn read(&self, target: FieldRef) -> Result<FieldValue> {
        Ok(self.live_node(target.node)?.read(target.field)?)
    }

    /// Current value of a field given by name
    pub fn read_named(&self, node: NodeId, field: &str) -> Result<FieldValue> {
        Ok(self.live_node(node)?.read_named(field)?)
    }

    /// Typed read
    pub fn get<T: FieldData>(&self, target: FieldRef) -> Result<T> {
        Ok(self.live_node(target.node)?.get(target.field)?)
    }

    /// Element count of a multi-valued field
    pub fn size(&self, target: FieldRef) -> Result<usize> {
        let node = self.live_node(target.node)?;
        let decl = node.field_decl(target.field)?;
        node.read(target.field)?
            .mf_len()
            .ok_or_else(|| FieldError::NotMultiValued { field: decl.name.clone() }.into())
    }

    /// Queue a replacement of a field's value
    pub fn write(&self, target: FieldRef, value: FieldValue) -> Result<()> {
        self.enqueue_write(target, FieldWrite::Set(value))
    }

    /// Queue a write to a field given by name
    pub fn write_named(&self, node: NodeId, field: &str, value: FieldValue) -> Result<()> {
        let target = self.field_ref(node, field)?;
        self.write(target, value)
    }

    /// Queue a replacement of one element of a multi-valued field
    pub fn set_element(&self, target: FieldRef, index: usize, value: FieldValue) -> Result<()> {
        self.enqueue_write(target, FieldWrite::SetElement { index, value })
    }

    /// Queue an append to a multi-valued field
    pub fn append(&self, target: FieldRef, value: FieldValue) -> Result<()> {
        self.enqueue_write(target, FieldWrite::Append(value))
    }

    /// Validate and queue a write
    pub fn enqueue_write(&self, target: FieldRef, write: FieldWrite) -> Result<()> {
        let event = self.validate_write(target, write)?;
        Ok(self.shared.queue.push(event)?)
    }

    fn validate_write(&self, target: FieldRef, write: FieldWrite) -> Result<PendingEvent> {
        self.live_node(target.node)?
            .check_external_write(target.field, &write)?;
        Ok(PendingEvent::Write { target, write })
    }

    /// Register a listener on a field. It receives events from the tick
    /// after the next Draining phase onwards.
    pub fn add_listener<L>(&self, target: FieldRef, listener: L) -> Result<ListenerId>
    where
        L: FieldListener + 'static,
    {
        self.live_node(target.node)?.field_decl(target.field)?;
        let id = self.shared.listeners.allocate_id();
        self.shared
            .queue
            .push(PendingEvent::Listener(ListenerChange::Add {
                field: target,
                id,
                listener: Arc::new(listener),
            }))?;
        Ok(id)
    }

    /// Unregister a listener at the next Draining phase
    pub fn remove_listener(&self, target: FieldRef, id: ListenerId) -> Result<()> {
        Ok(self
            .shared
            .queue
            .push(PendingEvent::Listener(ListenerChange::Remove { field: target, id }))?)
    }

    /// Validate a route now and add it at the next Draining phase
    pub fn add_route(&self, from: FieldRef, to: FieldRef) -> Result<Route> {
        let route = validate_route(&self.shared, from, to)?;
        self.shared
            .queue
            .push(PendingEvent::Structure(StructuralChange::AddRoute(route)))?;
        Ok(route)
    }

    /// Remove a route at the next Draining phase
    pub fn remove_route(&self, route: Route) -> Result<()> {
        Ok(self
            .shared
            .queue
            .push(PendingEvent::Structure(StructuralChange::RemoveRoute(route)))?)
    }

    /// Add a node to the root set at the next Draining phase
    pub fn add_root_node(&self, id: NodeId) -> Result<()> {
        self.live_node(id)?;
        Ok(self
            .shared
            .queue
            .push(PendingEvent::Structure(StructuralChange::AddRootNode(id)))?)
    }

    /// Remove a node from the root set at the next Draining phase
    pub fn remove_root_node(&self, id: NodeId) -> Result<()> {
        Ok(self
            .shared
            .queue
            .push(PendingEvent::Structure(StructuralChange::RemoveRootNode(id)))?)
    }

    /// Destroy a node at the next Draining phase
    pub fn remove_node(&self, id: NodeId) -> Result<()> {
        self.live_node(id)?;
        Ok(self
            .shared
            .queue
            .push(PendingEvent::Structure(StructuralChange::RemoveNode(id)))?)
    }

    /// Start a batch of writes that will land in the same tick
    pub fn begin_update(&self) -> UpdateBatch<'_> {
        UpdateBatch {
            handle: self,
            events: Vec::new(),
        }
    }

    /// Number of completed ticks
    pub fn tick_count(&self) -> u64 {
        self.shared.completed_ticks.load(Ordering::Acquire)
    }

    /// Current tick phase
    pub fn phase(&self) -> TickPhase {
        TickPhase::from_u8(self.shared.phase.load(Ordering::Acquire))
    }

    /// Number of buffered events
    pub fn pending_events(&self) -> usize {
        self.shared.queue.len()
    }

    /// Bound on buffered events
    pub fn queue_capacity(&self) -> usize {
        self.shared.queue.capacity()
    }

    /// Events accepted by the queue since the scene was created
    pub fn total_enqueued(&self) -> u64 {
        self.shared.queue.total_enqueued()
    }

    /// Whether the event queue has overflowed
    pub fn is_overflowed(&self) -> bool {
        self.shared.queue.is_overflowed()
    }

    /// Clear a queue overflow so ticking can resume
    pub fn clear_overflow(&self) {
        self.shared.queue.clear_overflow();
    }

    /// Whether two handles refer to the same scene
    pub fn same_scene(&self, other: &SceneHandle) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

/// Writes buffered locally and queued together.
///
/// Every write is validated when added. The batch is queued under a single
/// lock on `commit`, or on drop if it was not committed.
#[derive(Debug)]
pub struct UpdateBatch<'a> {
    handle: &'a SceneHandle,
    events: Vec<PendingEvent>,
}

impl<'a> UpdateBatch<'a> {
    /// Add a whole-value write
    pub fn write(&mut self, target: FieldRef, value: FieldValue) -> Result<&mut Self> {
        self.push(target, FieldWrite::Set(value))
    }

    /// Add a write to a field given by name
    pub fn write_named(
        &mut self,
        node: NodeId,
        field: &str,
        value: FieldValue,
    ) -> Result<&mut Self> {
        let target = self.handle.field_ref(node, field)?;
        self.write(target, value)
    }

    /// Add an element replacement
    pub fn set_element(
        &mut self,
        target: FieldRef,
        index: usize,
        value: FieldValue,
    ) -> Result<&mut Self> {
        self.push(target, FieldWrite::SetElement { index, value })
    }

    /// Add an element append
    pub fn append(&mut self, target: FieldRef, value: FieldValue) -> Result<&mut Self> {
        self.push(target, FieldWrite::Append(value))
    }

    fn push(&mut self, target: FieldRef, write: FieldWrite) -> Result<&mut Self> {
        let event = self.handle.validate_write(target, write)?;
        self.events.push(event);
        Ok(self)
    }

    /// Number of buffered writes
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Queue every buffered write at once
    pub fn commit(mut self) -> Result<()> {
        let events = std::mem::take(&mut self.events);
        Ok(self.handle.shared.queue.push_all(events)?)
    }
}

impl Drop for UpdateBatch<'_> {
    fn drop(&mut self) {
        if self.events.is_empty() {
            return;
        }
        let events = std::mem::take(&mut self.events);
        tracing::debug!("Committing {} buffered writes on drop", events.len());
        if let Err(err) = self.handle.shared.queue.push_all(events) {
            tracing::error!("Update batch lost: {}", err);
        }
    }
}

/// Errors raised by scene operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    /// Node creation failed
    #[error("Node factory error: {0}")]
    Factory(#[from] FactoryError),

    /// Field access failed
    #[error("Field error: {0}")]
    Field(#[from] FieldError),

    /// Route endpoints are incompatible
    #[error("Invalid route: {0}")]
    InvalidRoute(#[from] RouteError),

    /// The node is not (or no longer) in the scene
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// Too many events buffered; the scene stops ticking until the host
    /// clears the condition
    #[error("Event queue overflow ({capacity} events pending)")]
    QueueOverflow {
        /// Queue capacity
        capacity: usize,
    },
}

impl From<QueueError> for SceneError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Overflow { capacity } => Self::QueueOverflow { capacity },
        }
    }
}

impl SceneError {
    /// Whether the error stops the scene rather than just the caller's request
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::QueueOverflow { .. })
    }
}
