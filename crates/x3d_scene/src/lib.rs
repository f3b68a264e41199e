// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene graph core for the X3D browser runtime.
//!
//! This crate provides the event engine behind a running X3D world:
//! - Typed fields with X3D access rules
//! - Nodes bound to one implementation by a per-scene factory
//! - Routes between output and input fields
//! - The per-tick cascade evaluator
//! - A buffered event queue so external threads can read and write live
//!   scenes
//!
//! ## Architecture
//!
//! A [`Scene`] is ticked by one thread. Any number of [`SceneHandle`]s may
//! read fields directly and submit writes, listener changes and structural
//! edits, which are merged at the start of the next tick:
//!
//! ```text
//! caller -> EventQueue -> Draining -> Propagating -> Notifying -> listeners
//! ```

pub mod cascade;
pub mod factory;
pub mod field;
pub mod listener;
pub mod node;
pub mod nodes;
pub mod queue;
pub mod route;
pub mod scene;

#[cfg(test)]
pub(crate) mod test_support;

pub use cascade::{CascadeConfig, CascadeEvaluator, CycleCapExceeded, TickPhase, TickReport};
pub use factory::{BehaviorConstructor, FactoryError, NodeFactory};
pub use field::{
    AccessType, FieldData, FieldDecl, FieldError, FieldId, FieldType, FieldValue, FieldWrite,
};
pub use listener::{FieldEvent, FieldListener, ListenerId};
pub use node::{
    Node, NodeBehavior, NodeComponent, NodeContext, NodeId, NodeType, NodeVariant,
    PassiveBehavior, Renderer,
};
pub use queue::{QueueError, DEFAULT_MAX_PENDING_EVENTS};
pub use route::{FieldRef, Route, RouteError, RouteGraph};
pub use scene::{Scene, SceneError, SceneHandle, UpdateBatch};
