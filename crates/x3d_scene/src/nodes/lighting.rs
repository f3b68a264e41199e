// SPDX-License-Identifier: MIT OR Apache-2.0
//! Light node types.

use super::{DIRECTIONAL_LIGHT, POINT_LIGHT};
use crate::field::{FieldDecl, FieldValue};
use crate::node::{NodeComponent, NodeType};

fn with_light_fields(node_type: NodeType, global: bool) -> NodeType {
    node_type
        .with_field(FieldDecl::input_output("ambientIntensity", FieldValue::SFFloat(0.0)))
        .with_field(FieldDecl::input_output("color", FieldValue::SFVec3f([1.0; 3])))
        .with_field(FieldDecl::input_output("global", FieldValue::SFBool(global)))
        .with_field(FieldDecl::input_output("intensity", FieldValue::SFFloat(1.0)))
        .with_field(FieldDecl::input_output("on", FieldValue::SFBool(true)))
}

/// `PointLight` declaration
pub fn point_light_type() -> NodeType {
    with_light_fields(
        NodeType::new(POINT_LIGHT, NodeComponent::Lighting, "Omnidirectional light at a point"),
        true,
    )
    .with_field(FieldDecl::input_output("attenuation", FieldValue::SFVec3f([1.0, 0.0, 0.0])))
    .with_field(FieldDecl::input_output("center", FieldValue::SFVec3f([0.0; 3])))
    .with_field(FieldDecl::input_output("radius", FieldValue::SFFloat(100.0)))
}

/// `DirectionalLight` declaration
pub fn directional_light_type() -> NodeType {
    with_light_fields(
        NodeType::new(DIRECTIONAL_LIGHT, NodeComponent::Lighting, "Light with parallel rays"),
        false,
    )
    .with_field(FieldDecl::input_output("direction", FieldValue::SFVec3f([0.0, 0.0, -1.0])))
}
