// SPDX-License-Identifier: MIT OR Apache-2.0
//! Routes (edges) between an output field and an input field.

use crate::field::{AccessType, FieldId, FieldType};
use crate::node::{Node, NodeId};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A field on a specific node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    /// Owning node
    pub node: NodeId,
    /// Field within the node
    pub field: FieldId,
}

impl FieldRef {
    /// Create a field reference
    pub fn new(node: NodeId, field: FieldId) -> Self {
        Self { node, field }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.node, self.field)
    }
}

/// A route between two fields. Its identity is its endpoint pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// Source output field
    pub from: FieldRef,
    /// Destination input field
    pub to: FieldRef,
}

impl Route {
    /// Create a route without validating it
    pub fn new(from: FieldRef, to: FieldRef) -> Self {
        Self { from, to }
    }

    /// Check if this route involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from.node == node_id || self.to.node == node_id
    }

    /// Validate the endpoints and build a route.
    ///
    /// The source must produce output, the destination must accept input
    /// and both fields must have the same type. Self routes are allowed.
    pub fn between(
        from_node: &Node,
        from_field: FieldId,
        to_node: &Node,
        to_field: FieldId,
    ) -> Result<Self, RouteError> {
        let source = from_node.field_decl(from_field).map_err(|_| RouteError::UnknownEndpoint {
            node_type: from_node.type_name().to_string(),
            field: from_field,
        })?;
        let destination = to_node.field_decl(to_field).map_err(|_| RouteError::UnknownEndpoint {
            node_type: to_node.type_name().to_string(),
            field: to_field,
        })?;

        if !source.access.produces_output() {
            return Err(RouteError::SourceNotOutput {
                field: source.name.clone(),
                access: source.access,
            });
        }
        if !destination.access.accepts_input() {
            return Err(RouteError::DestinationNotInput {
                field: destination.name.clone(),
                access: destination.access,
            });
        }
        if source.field_type != destination.field_type {
            return Err(RouteError::TypeMismatch {
                from: source.field_type,
                to: destination.field_type,
            });
        }

        Ok(Self::new(
            FieldRef::new(from_node.id(), from_field),
            FieldRef::new(to_node.id(), to_field),
        ))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// The set of routes of a scene, indexed by source field.
///
/// Insertion order is preserved both globally and per source field, which
/// is what makes propagation order reproducible.
#[derive(Debug, Clone, Default)]
pub struct RouteGraph {
    routes: IndexSet<Route>,
    outgoing: HashMap<FieldRef, Vec<Route>>,
}

impl RouteGraph {
    /// Create an empty route graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route. Returns `false` if the route already existed.
    pub fn add(&mut self, route: Route) -> bool {
        if !self.routes.insert(route) {
            return false;
        }
        self.outgoing.entry(route.from).or_default().push(route);
        true
    }

    /// Remove a route. Returns `false` if it was not present.
    pub fn remove(&mut self, route: &Route) -> bool {
        if !self.routes.shift_remove(route) {
            return false;
        }
        if let Some(routes) = self.outgoing.get_mut(&route.from) {
            routes.retain(|r| r != route);
            if routes.is_empty() {
                self.outgoing.remove(&route.from);
            }
        }
        true
    }

    /// Remove every route touching a node; returns how many were removed
    pub fn remove_node(&mut self, node_id: NodeId) -> usize {
        let doomed: Vec<Route> = self
            .routes
            .iter()
            .filter(|r| r.involves_node(node_id))
            .copied()
            .collect();
        for route in &doomed {
            self.remove(route);
        }
        doomed.len()
    }

    /// Whether the route exists
    pub fn contains(&self, route: &Route) -> bool {
        self.routes.contains(route)
    }

    /// Routes leaving a field, in insertion order
    pub fn outgoing(&self, from: &FieldRef) -> &[Route] {
        self.outgoing.get(from).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All routes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Number of routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether there are no routes
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Error when creating a route
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    /// Field handle does not exist on the node
    #[error("{node_type} has no field {field}")]
    UnknownEndpoint {
        /// Node type name
        node_type: String,
        /// Field handle
        field: FieldId,
    },

    /// Source field cannot send events
    #[error("Route source '{field}' is {access} and cannot send events")]
    SourceNotOutput {
        /// Field name
        field: String,
        /// Its access type
        access: AccessType,
    },

    /// Destination field cannot receive events
    #[error("Route destination '{field}' is {access} and cannot receive events")]
    DestinationNotInput {
        /// Field name
        field: String,
        /// Its access type
        access: AccessType,
    },

    /// Endpoint types differ
    #[error("Route endpoints have different types: {from} -> {to}")]
    TypeMismatch {
        /// Source type
        from: FieldType,
        /// Destination type
        to: FieldType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(node: NodeId, index: u32) -> FieldRef {
        FieldRef::new(node, FieldId(index))
    }

    #[test]
    fn test_duplicate_route_is_noop() {
        let a = NodeId::new();
        let b = NodeId::new();
        let mut graph = RouteGraph::new();
        let route = Route::new(field(a, 0), field(b, 1));

        assert!(graph.add(route));
        assert!(!graph.add(route));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.outgoing(&field(a, 0)), &[route]);
    }

    #[test]
    fn test_outgoing_keeps_insertion_order() {
        let a = NodeId::new();
        let b = NodeId::new();
        let c = NodeId::new();
        let mut graph = RouteGraph::new();
        let first = Route::new(field(a, 0), field(c, 0));
        let second = Route::new(field(a, 0), field(b, 0));
        graph.add(first);
        graph.add(second);

        assert_eq!(graph.outgoing(&field(a, 0)), &[first, second]);
    }

    #[test]
    fn test_cycles_are_allowed() {
        let a = NodeId::new();
        let b = NodeId::new();
        let mut graph = RouteGraph::new();
        assert!(graph.add(Route::new(field(a, 0), field(b, 0))));
        assert!(graph.add(Route::new(field(b, 0), field(a, 0))));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_remove_node_prunes_routes() {
        let a = NodeId::new();
        let b = NodeId::new();
        let c = NodeId::new();
        let mut graph = RouteGraph::new();
        graph.add(Route::new(field(a, 0), field(b, 0)));
        graph.add(Route::new(field(b, 1), field(c, 0)));
        graph.add(Route::new(field(a, 1), field(c, 1)));

        assert_eq!(graph.remove_node(b), 2);
        assert_eq!(graph.len(), 1);
        assert!(graph.outgoing(&field(b, 1)).is_empty());
    }

    #[test]
    fn test_remove_missing_route() {
        let mut graph = RouteGraph::new();
        let route = Route::new(field(NodeId::new(), 0), field(NodeId::new(), 0));
        assert!(!graph.remove(&route));
    }
}
