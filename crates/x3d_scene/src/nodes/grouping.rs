// SPDX-License-Identifier: MIT OR Apache-2.0
//! Grouping node types and their shared children handling.

use super::{GROUP, TRANSFORM};
use crate::field::{FieldData, FieldDecl, FieldId, FieldType, FieldValue};
use crate::node::{NodeComponent, NodeContext, NodeId, NodeType};

fn with_grouping_fields(node_type: NodeType) -> NodeType {
    node_type
        .with_field(FieldDecl::input_only("addChildren", FieldType::MFNode))
        .with_field(FieldDecl::input_only("removeChildren", FieldType::MFNode))
        .with_field(FieldDecl::input_output("children", FieldValue::MFNode(Vec::new())))
        .with_field(FieldDecl::initialize_only("bboxCenter", FieldValue::SFVec3f([0.0; 3])))
        .with_field(FieldDecl::initialize_only("bboxSize", FieldValue::SFVec3f([-1.0; 3])))
}

/// `Group` declaration
pub fn group_type() -> NodeType {
    with_grouping_fields(NodeType::new(
        GROUP,
        NodeComponent::Grouping,
        "Unordered set of child nodes",
    ))
}

/// `Transform` declaration
pub fn transform_type() -> NodeType {
    with_grouping_fields(NodeType::new(
        TRANSFORM,
        NodeComponent::Grouping,
        "Grouping node with a local coordinate system",
    ))
    .with_field(FieldDecl::input_output("center", FieldValue::SFVec3f([0.0; 3])))
    .with_field(FieldDecl::input_output("rotation", FieldValue::SFRotation([0.0, 0.0, 1.0, 0.0])))
    .with_field(FieldDecl::input_output("scale", FieldValue::SFVec3f([1.0; 3])))
    .with_field(FieldDecl::input_output(
        "scaleOrientation",
        FieldValue::SFRotation([0.0, 0.0, 1.0, 0.0]),
    ))
    .with_field(FieldDecl::input_output("translation", FieldValue::SFVec3f([0.0; 3])))
}

/// Apply an `addChildren`/`removeChildren` event to `children`.
///
/// Returns `true` if `field` was one of the two; the updated list is emitted
/// out of `children` so routes and listeners see it.
pub fn handle_children_event(ctx: &mut NodeContext<'_>, field: FieldId) -> bool {
    let adding = ctx.field_id("addChildren") == Some(field);
    let removing = ctx.field_id("removeChildren") == Some(field);
    if !adding && !removing {
        return false;
    }

    let incoming: Vec<NodeId> = ctx
        .get(field)
        .and_then(<Vec<NodeId> as FieldData>::from_value)
        .unwrap_or_default();
    let mut children: Vec<NodeId> = ctx.get_as("children").unwrap_or_default();

    if adding {
        for id in incoming {
            if !children.contains(&id) {
                children.push(id);
            }
        }
    } else {
        children.retain(|id| !incoming.contains(id));
    }
    ctx.emit_named("children", FieldValue::MFNode(children));
    true
}
