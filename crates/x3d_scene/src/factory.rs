// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node factory: the one place where a node's implementation is chosen.
//!
//! Node types are registered once with their field declarations. Each type
//! then gets one or more behaviour constructors: a renderer-neutral one,
//! renderer-specific ones, or both. A scene owns its own factory, so two
//! scenes bound to different renderers never share registration state.

use crate::node::{Node, NodeBehavior, NodeType, NodeVariant, Renderer};
use indexmap::IndexMap;
use std::sync::Arc;

/// Constructor for a node behaviour
pub type BehaviorConstructor = Arc<dyn Fn() -> Box<dyn NodeBehavior> + Send + Sync>;

/// Registry of node types and their implementations
#[derive(Clone, Default)]
pub struct NodeFactory {
    /// Registered node types by name
    types: IndexMap<String, Arc<NodeType>>,
    /// Behaviour constructors by (type name, variant)
    variants: IndexMap<(String, NodeVariant), BehaviorConstructor>,
}

impl NodeFactory {
    /// Create a new empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type. Re-registering a name replaces its field
    /// declarations but keeps existing variants.
    pub fn register_type(&mut self, node_type: NodeType) {
        self.types.insert(node_type.name.clone(), Arc::new(node_type));
    }

    /// Register the renderer-neutral implementation of a type
    pub fn register_neutral<F, B>(
        &mut self,
        type_name: &str,
        constructor: F,
    ) -> Result<(), FactoryError>
    where
        F: Fn() -> B + Send + Sync + 'static,
        B: NodeBehavior + 'static,
    {
        self.register_variant(type_name, NodeVariant::Neutral, constructor)
    }

    /// Register a renderer-specific implementation of a type
    pub fn register_renderer<F, B>(
        &mut self,
        type_name: &str,
        renderer: Renderer,
        constructor: F,
    ) -> Result<(), FactoryError>
    where
        F: Fn() -> B + Send + Sync + 'static,
        B: NodeBehavior + 'static,
    {
        self.register_variant(type_name, NodeVariant::Specific(renderer), constructor)
    }

    fn register_variant<F, B>(
        &mut self,
        type_name: &str,
        variant: NodeVariant,
        constructor: F,
    ) -> Result<(), FactoryError>
    where
        F: Fn() -> B + Send + Sync + 'static,
        B: NodeBehavior + 'static,
    {
        if !self.types.contains_key(type_name) {
            return Err(FactoryError::UnknownType(type_name.to_string()));
        }
        let constructor: BehaviorConstructor =
            Arc::new(move || Box::new(constructor()) as Box<dyn NodeBehavior>);
        self.variants.insert((type_name.to_string(), variant), constructor);
        Ok(())
    }

    /// Get a node type by name
    pub fn node_type(&self, type_name: &str) -> Option<&NodeType> {
        self.types.get(type_name).map(Arc::as_ref)
    }

    /// All registered types, in registration order
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values().map(Arc::as_ref)
    }

    /// Variant `create` would bind for a type on a renderer
    pub fn resolve(
        &self,
        type_name: &str,
        renderer: Renderer,
    ) -> Result<NodeVariant, FactoryError> {
        if !self.types.contains_key(type_name) {
            return Err(FactoryError::UnknownType(type_name.to_string()));
        }
        let specific = NodeVariant::Specific(renderer);
        if self.variants.contains_key(&(type_name.to_string(), specific)) {
            return Ok(specific);
        }
        if self.variants.contains_key(&(type_name.to_string(), NodeVariant::Neutral)) {
            return Ok(NodeVariant::Neutral);
        }
        Err(FactoryError::UnsupportedRenderer {
            type_name: type_name.to_string(),
            renderer,
        })
    }

    /// Whether `create` would succeed
    pub fn supports(&self, type_name: &str, renderer: Renderer) -> bool {
        self.resolve(type_name, renderer).is_ok()
    }

    /// Create a node instance. A renderer-specific variant wins over the
    /// neutral one; the binding never changes afterwards.
    pub fn create(&self, type_name: &str, renderer: Renderer) -> Result<Node, FactoryError> {
        let variant = self.resolve(type_name, renderer)?;
        let node_type = self
            .types
            .get(type_name)
            .cloned()
            .ok_or_else(|| FactoryError::UnknownType(type_name.to_string()))?;
        let constructor = self
            .variants
            .get(&(type_name.to_string(), variant))
            .ok_or_else(|| FactoryError::UnsupportedRenderer {
                type_name: type_name.to_string(),
                renderer,
            })?;
        Ok(Node::instantiate(node_type, variant, constructor()))
    }
}

impl std::fmt::Debug for NodeFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeFactory")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("variants", &self.variants.len())
            .finish()
    }
}

/// Error when creating a node
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactoryError {
    /// No type registered under this name
    #[error("Unknown node type: {0}")]
    UnknownType(String),

    /// The type exists but has no implementation for the renderer
    #[error("Node type {type_name} is not supported by the {renderer} renderer")]
    UnsupportedRenderer {
        /// Node type name
        type_name: String,
        /// Requested renderer
        renderer: Renderer,
    },
}
