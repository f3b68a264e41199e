// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions: node types, behaviours and live node instances.

use crate::field::{
    AccessType, FieldData, FieldDecl, FieldError, FieldId, FieldState, FieldValue, FieldWrite,
};
use crate::scene::{SceneHandle, SceneShared};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Renderer a scene is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Renderer {
    /// Headless renderer; nodes keep no render state
    #[default]
    NoRender,
    /// OpenGL-backed renderer
    OpenGl,
}

impl fmt::Display for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRender => f.write_str("norender"),
            Self::OpenGl => f.write_str("opengl"),
        }
    }
}

/// Which implementation the factory bound to a node instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeVariant {
    /// Renderer-neutral implementation, valid for every renderer
    Neutral,
    /// Implementation specific to one renderer
    Specific(Renderer),
}

/// X3D component a node type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeComponent {
    /// Core node types
    Core,
    /// Grouping nodes (Group, Transform)
    Grouping,
    /// Lights
    Lighting,
    /// Interpolators
    Interpolation,
    /// Time sensors
    Time,
    /// User-defined
    Custom,
}

/// Node type definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeType {
    /// Type identifier, e.g. `Transform`
    pub name: String,
    /// Component
    pub component: NodeComponent,
    /// Description
    pub description: String,
    /// Field declarations in declaration order; the position is the [`FieldId`]
    fields: IndexMap<String, FieldDecl>,
}

impl NodeType {
    /// Create a node type with no fields
    pub fn new(
        name: impl Into<String>,
        component: NodeComponent,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            component,
            description: description.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a field declaration. A later declaration with the same name
    /// replaces the earlier one in place.
    pub fn with_field(mut self, decl: FieldDecl) -> Self {
        self.fields.insert(decl.name.clone(), decl);
        self
    }

    /// Look up a field handle by name
    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.fields.get_index_of(name).map(|index| FieldId(index as u32))
    }

    /// Get a field declaration by handle
    pub fn field(&self, id: FieldId) -> Option<&FieldDecl> {
        self.fields.get_index(id.index()).map(|(_, decl)| decl)
    }

    /// Field declarations in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (FieldId, &FieldDecl)> {
        self.fields
            .values()
            .enumerate()
            .map(|(index, decl)| (FieldId(index as u32), decl))
    }

    /// Number of declared fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Internal logic of a node.
///
/// Exactly one behaviour is bound to each node instance by the factory.
/// Behaviours only ever run on the thread that ticks the owning scene.
pub trait NodeBehavior: Send {
    /// Called once when the node goes live in a scene. Values emitted here
    /// become the node's initial state without generating events.
    fn initialize(&mut self, ctx: &mut NodeContext<'_>) {
        let _ = ctx;
    }

    /// An input field received an event during the cascade
    fn input_received(&mut self, ctx: &mut NodeContext<'_>, field: FieldId) {
        let _ = (ctx, field);
    }

    /// Whether [`NodeBehavior::time_tick`] should run every tick
    fn is_time_dependent(&self) -> bool {
        false
    }

    /// Per-tick hook for time-dependent nodes, run before propagation
    fn time_tick(&mut self, ctx: &mut NodeContext<'_>) {
        let _ = ctx;
    }

    /// Called once when the node is removed from its scene. Release any
    /// state kept outside the node here.
    fn dispose(&mut self, node: NodeId) {
        let _ = node;
    }
}

/// Behaviour for nodes that only hold data
#[derive(Debug, Clone, Copy, Default)]
pub struct PassiveBehavior;

impl NodeBehavior for PassiveBehavior {}

/// View of a node handed to its behaviour
pub struct NodeContext<'a> {
    node: &'a Node,
    time: f64,
    emitted: Vec<(FieldId, FieldValue)>,
}

impl<'a> NodeContext<'a> {
    fn new(node: &'a Node, time: f64) -> Self {
        Self {
            node,
            time,
            emitted: Vec::new(),
        }
    }

    /// The node this context belongs to
    pub fn node(&self) -> &Node {
        self.node
    }

    /// Simulation time of the current tick, in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Resolve a field handle by name
    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.node.node_type.field_id(name)
    }

    /// Current value of one of the node's fields
    pub fn get(&self, field: FieldId) -> Option<FieldValue> {
        self.node.read(field).ok()
    }

    /// Current value of a field by name
    pub fn get_named(&self, name: &str) -> Option<FieldValue> {
        self.field_id(name).and_then(|id| self.get(id))
    }

    /// Typed value of a field by name
    pub fn get_as<T: FieldData>(&self, name: &str) -> Option<T> {
        self.get_named(name).and_then(T::from_value)
    }

    /// Send an event out of one of the node's fields
    pub fn emit(&mut self, field: FieldId, value: FieldValue) {
        self.emitted.push((field, value));
    }

    /// Send an event out of a field by name; unknown names are ignored
    pub fn emit_named(&mut self, name: &str, value: FieldValue) {
        if let Some(id) = self.field_id(name) {
            self.emit(id, value);
        } else {
            tracing::warn!("{} has no field '{}' to emit into", self.node.type_name(), name);
        }
    }

    fn into_emitted(self) -> Vec<(FieldId, FieldValue)> {
        self.emitted
    }
}

/// A node instance.
///
/// Built by the [`NodeFactory`](crate::factory::NodeFactory) as an owned,
/// not yet live value; it goes live when added to a scene, after which it is
/// shared behind an `Arc` and its fields change only through the scene.
pub struct Node {
    id: NodeId,
    node_type: Arc<NodeType>,
    variant: NodeVariant,
    fields: Vec<RwLock<FieldState>>,
    behavior: Mutex<Box<dyn NodeBehavior>>,
    time_dependent: bool,
    scene: Weak<SceneShared>,
}

impl Node {
    pub(crate) fn instantiate(
        node_type: Arc<NodeType>,
        variant: NodeVariant,
        behavior: Box<dyn NodeBehavior>,
    ) -> Self {
        let fields = node_type
            .fields()
            .map(|(_, decl)| RwLock::new(FieldState::new(decl.default.clone())))
            .collect();
        let time_dependent = behavior.is_time_dependent();
        Self {
            id: NodeId::new(),
            node_type,
            variant,
            fields,
            behavior: Mutex::new(behavior),
            time_dependent,
            scene: Weak::new(),
        }
    }

    /// Unique instance ID
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Type identifier
    pub fn type_name(&self) -> &str {
        &self.node_type.name
    }

    /// Full type definition
    pub fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    /// Variant chosen by the factory
    pub fn variant(&self) -> NodeVariant {
        self.variant
    }

    /// Whether the node has been added to a scene
    pub fn is_live(&self) -> bool {
        self.scene.strong_count() > 0
    }

    /// Handle to the owning scene, if the node is live and the scene exists
    pub fn scene(&self) -> Option<SceneHandle> {
        self.scene.upgrade().map(SceneHandle::from_shared)
    }

    /// Resolve a field handle by name
    pub fn field_id(&self, name: &str) -> Result<FieldId, FieldError> {
        self.node_type.field_id(name).ok_or_else(|| FieldError::UnknownField {
            node_type: self.node_type.name.clone(),
            field: name.to_string(),
        })
    }

    /// Declaration of a field
    pub fn field_decl(&self, field: FieldId) -> Result<&FieldDecl, FieldError> {
        self.node_type.field(field).ok_or_else(|| FieldError::UnknownField {
            node_type: self.node_type.name.clone(),
            field: field.to_string(),
        })
    }

    /// Read the current value of a field. Never blocks on the cascade beyond
    /// the field's own lock.
    pub fn read(&self, field: FieldId) -> Result<FieldValue, FieldError> {
        self.field_decl(field)?;
        Ok(self.fields[field.index()].read().value.clone())
    }

    /// Read a field by name
    pub fn read_named(&self, name: &str) -> Result<FieldValue, FieldError> {
        self.read(self.field_id(name)?)
    }

    /// Typed read; fails with `TypeMismatch` if `T` is not the declared type
    pub fn get<T: FieldData>(&self, field: FieldId) -> Result<T, FieldError> {
        let decl = self.field_decl(field)?;
        if decl.field_type != T::FIELD_TYPE {
            return Err(FieldError::TypeMismatch {
                field: decl.name.clone(),
                expected: decl.field_type,
                found: T::FIELD_TYPE,
            });
        }
        let value = self.read(field)?;
        T::from_value(value).ok_or_else(|| FieldError::TypeMismatch {
            field: decl.name.clone(),
            expected: decl.field_type,
            found: T::FIELD_TYPE,
        })
    }

    /// Whether a field has been written and not yet processed by the cascade
    pub fn is_dirty(&self, field: FieldId) -> bool {
        self.fields
            .get(field.index())
            .map(|state| state.read().dirty)
            .unwrap_or(false)
    }

    /// Tick in which a field was last modified (0 if never)
    pub fn last_modified_tick(&self, field: FieldId) -> u64 {
        self.fields
            .get(field.index())
            .map(|state| state.read().last_modified_tick)
            .unwrap_or(0)
    }

    /// Set a field's starting value while the node is not yet live.
    ///
    /// Any field except `outputOnly` ones may be set, including
    /// `initializeOnly` fields; this is the loader's path for initial state.
    pub fn set_initial(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        let field = self.field_id(name)?;
        let decl = self.field_decl(field)?;
        if decl.access == AccessType::OutputOnly {
            return Err(FieldError::AccessDenied {
                field: decl.name.clone(),
                access: decl.access,
            });
        }
        let name = decl.name.clone();
        self.fields[field.index()].get_mut().value.apply(&name, FieldWrite::Set(value))
    }

    /// Check a write coming from outside the node against the field's
    /// access type and declared type.
    pub fn check_external_write(
        &self,
        field: FieldId,
        write: &FieldWrite,
    ) -> Result<(), FieldError> {
        let decl = self.field_decl(field)?;
        if !decl.access.is_externally_writable() {
            return Err(FieldError::AccessDenied {
                field: decl.name.clone(),
                access: decl.access,
            });
        }
        let len = self.fields[field.index()].read().value.mf_len();
        write.check(&decl.name, decl.field_type, len)
    }

    /// Apply a write and mark the field dirty, atomically with respect to
    /// readers. Returns the value after the write.
    pub(crate) fn apply_write(
        &self,
        field: FieldId,
        write: FieldWrite,
        tick: u64,
    ) -> Result<FieldValue, FieldError> {
        let decl = self.field_decl(field)?;
        let mut state = self.fields[field.index()].write();
        state.value.apply(&decl.name, write)?;
        state.dirty = true;
        state.last_modified_tick = tick;
        Ok(state.value.clone())
    }

    /// Clear the dirty flag and return the current value
    pub(crate) fn take_dirty(&self, field: FieldId) -> Option<FieldValue> {
        let mut state = self.fields.get(field.index())?.write();
        state.dirty = false;
        Some(state.value.clone())
    }

    pub(crate) fn is_time_dependent(&self) -> bool {
        self.time_dependent
    }

    /// Attach to a scene and run the behaviour's initialisation
    pub(crate) fn realize(&mut self, scene: Weak<SceneShared>) {
        self.scene = scene;
        let emitted = {
            let mut behavior = self.behavior.lock();
            let mut ctx = NodeContext::new(self, 0.0);
            behavior.initialize(&mut ctx);
            ctx.into_emitted()
        };
        for (field, value) in emitted {
            let Ok(decl) = self.field_decl(field) else { continue };
            let name = decl.name.clone();
            let state = self.fields[field.index()].get_mut();
            if let Err(err) = state.value.apply(&name, FieldWrite::Set(value)) {
                tracing::warn!("{} initialisation rejected: {}", self.node_type.name, err);
            }
        }
    }

    /// Run the behaviour's removal hook
    pub(crate) fn dispose(&self) {
        self.behavior.lock().dispose(self.id);
    }

    /// Run the behaviour for an input event; returns emitted events
    pub(crate) fn dispatch_input(&self, field: FieldId, time: f64) -> Vec<(FieldId, FieldValue)> {
        let mut behavior = self.behavior.lock();
        let mut ctx = NodeContext::new(self, time);
        behavior.input_received(&mut ctx, field);
        ctx.into_emitted()
    }

    /// Run the behaviour's per-tick hook; returns emitted events
    pub(crate) fn dispatch_time(&self, time: f64) -> Vec<(FieldId, FieldValue)> {
        let mut behavior = self.behavior.lock();
        let mut ctx = NodeContext::new(self, time);
        behavior.time_tick(&mut ctx);
        ctx.into_emitted()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type", &self.node_type.name)
            .field("variant", &self.variant)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Scene, SceneError};
    use crate::test_support::{factory, HOLDER};

    #[test]
    fn test_set_initial_before_live() {
        let mut node = factory().create(HOLDER, Renderer::NoRender).unwrap();
        assert!(!node.is_live());

        node.set_initial("label", FieldValue::SFString("lamp".into())).unwrap();
        node.set_initial("value", FieldValue::SFInt32(4)).unwrap();
        assert!(matches!(
            node.set_initial("readout", FieldValue::SFInt32(1)),
            Err(FieldError::AccessDenied { access: AccessType::OutputOnly, .. })
        ));
        assert!(matches!(
            node.set_initial("value", FieldValue::SFFloat(1.0)),
            Err(FieldError::TypeMismatch { .. })
        ));

        assert_eq!(node.read_named("label").unwrap(), FieldValue::SFString("lamp".into()));
        assert_eq!(node.get::<i32>(node.field_id("value").unwrap()).unwrap(), 4);
    }

    #[test]
    fn test_typed_get_checks_declared_type() {
        let node = factory().create(HOLDER, Renderer::NoRender).unwrap();
        let value = node.field_id("value").unwrap();
        assert!(matches!(node.get::<f32>(value), Err(FieldError::TypeMismatch { .. })));
        assert!(matches!(node.field_id("missing"), Err(FieldError::UnknownField { .. })));
        assert!(node.read(FieldId(99)).is_err());
    }

    #[test]
    fn test_initialize_only_frozen_once_live() {
        let scene = Scene::new(factory(), Renderer::NoRender);
        let mut node = scene.create_node(HOLDER).unwrap();
        node.set_initial("label", FieldValue::SFString("lamp".into())).unwrap();
        let id = scene.add_node(node);

        let handle = scene.handle();
        let live = handle.node(id).unwrap();
        assert!(live.is_live());
        assert!(live.scene().is_some_and(|h| h.same_scene(&handle)));
        assert!(matches!(
            handle.write_named(id, "label", FieldValue::SFString("other".into())),
            Err(SceneError::Field(FieldError::AccessDenied {
                access: AccessType::InitializeOnly,
                ..
            }))
        ));
        assert_eq!(live.read_named("label").unwrap(), FieldValue::SFString("lamp".into()));
    }

    #[test]
    fn test_last_modified_tick_tracks_writes() {
        let mut scene = Scene::new(factory(), Renderer::NoRender);
        let id = scene.add_node(scene.create_node(HOLDER).unwrap());
        let handle = scene.handle();
        let node = handle.node(id).unwrap();
        let value = node.field_id("value").unwrap();
        assert_eq!(node.last_modified_tick(value), 0);

        scene.tick(0.0).unwrap();
        handle.write_named(id, "value", FieldValue::SFInt32(3)).unwrap();
        scene.tick(0.1).unwrap();
        assert!(node.last_modified_tick(value) > 0);
        assert!(!node.is_dirty(value));
    }
}
