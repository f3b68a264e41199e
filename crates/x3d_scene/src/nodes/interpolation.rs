// SPDX-License-Identifier: MIT OR Apache-2.0
//! Linear keyframe interpolators.
//!
//! A `set_fraction` event picks the key interval containing the fraction and
//! emits the linearly interpolated key value out of `value_changed`.
//! Fractions outside the key range clamp to the first or last value.

use super::{POSITION_INTERPOLATOR, SCALAR_INTERPOLATOR};
use crate::field::{FieldDecl, FieldId, FieldType, FieldValue};
use crate::node::{NodeBehavior, NodeComponent, NodeContext, NodeType};

fn interpolator_type(
    name: &str,
    description: &str,
    key_values: FieldValue,
    output: FieldType,
) -> NodeType {
    NodeType::new(name, NodeComponent::Interpolation, description)
        .with_field(FieldDecl::input_only("set_fraction", FieldType::SFFloat))
        .with_field(FieldDecl::input_output("key", FieldValue::MFFloat(Vec::new())))
        .with_field(FieldDecl::input_output("keyValue", key_values))
        .with_field(FieldDecl::output_only("value_changed", output))
}

/// `PositionInterpolator` declaration
pub fn position_interpolator_type() -> NodeType {
    interpolator_type(
        POSITION_INTERPOLATOR,
        "Interpolates between 3D positions",
        FieldValue::MFVec3f(Vec::new()),
        FieldType::SFVec3f,
    )
}

/// `ScalarInterpolator` declaration
pub fn scalar_interpolator_type() -> NodeType {
    interpolator_type(
        SCALAR_INTERPOLATOR,
        "Interpolates between scalar values",
        FieldValue::MFFloat(Vec::new()),
        FieldType::SFFloat,
    )
}

/// Linear interpolation
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Component-wise linear interpolation
pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [lerp(a[0], b[0], t), lerp(a[1], b[1], t), lerp(a[2], b[2], t)]
}

/// Sample a piecewise-linear function given by `keys` and `values`.
///
/// Only the first `min(keys, values)` pairs are used. Returns `None` if
/// there are none or `fraction` is not finite. Keys are expected in
/// ascending order; unsorted keys give an unspecified segment but never
/// index out of bounds.
pub fn sample<T: Copy>(
    keys: &[f32],
    values: &[T],
    fraction: f32,
    blend: impl Fn(T, T, f32) -> T,
) -> Option<T> {
    let count = keys.len().min(values.len());
    if count == 0 || !fraction.is_finite() {
        return None;
    }
    let keys = &keys[..count];
    if fraction <= keys[0] {
        return Some(values[0]);
    }
    if fraction >= keys[count - 1] {
        return Some(values[count - 1]);
    }

    // count >= 2 here: a single key satisfies one of the checks above
    let upper = keys.partition_point(|key| *key <= fraction).clamp(1, count - 1);
    let lower = upper - 1;
    let span = keys[upper] - keys[lower];
    if span <= f32::EPSILON {
        return Some(values[upper]);
    }
    Some(blend(values[lower], values[upper], (fraction - keys[lower]) / span))
}

fn is_fraction(ctx: &NodeContext<'_>, field: FieldId) -> bool {
    ctx.field_id("set_fraction") == Some(field)
}

/// Renderer-neutral `PositionInterpolator`
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionInterpolator;

impl NodeBehavior for PositionInterpolator {
    fn input_received(&mut self, ctx: &mut NodeContext<'_>, field: FieldId) {
        if !is_fraction(ctx, field) {
            return;
        }
        let fraction: f32 = ctx.get_as("set_fraction").unwrap_or(0.0);
        let keys: Vec<f32> = ctx.get_as("key").unwrap_or_default();
        let values: Vec<[f32; 3]> = ctx.get_as("keyValue").unwrap_or_default();
        if let Some(value) = sample(&keys, &values, fraction, lerp_vec3) {
            ctx.emit_named("value_changed", FieldValue::SFVec3f(value));
        }
    }
}

/// Renderer-neutral `ScalarInterpolator`
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarInterpolator;

impl NodeBehavior for ScalarInterpolator {
    fn input_received(&mut self, ctx: &mut NodeContext<'_>, field: FieldId) {
        if !is_fraction(ctx, field) {
            return;
        }
        let fraction: f32 = ctx.get_as("set_fraction").unwrap_or(0.0);
        let keys: Vec<f32> = ctx.get_as("key").unwrap_or_default();
        let values: Vec<f32> = ctx.get_as("keyValue").unwrap_or_default();
        if let Some(value) = sample(&keys, &values, fraction, lerp) {
            ctx.emit_named("value_changed", FieldValue::SFFloat(value));
        }
    }
}
