// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in X3D node types.
//!
//! Every type is declared here so all renderers agree on field layout.
//! Renderer-neutral behaviours (time sensors, interpolators) are registered
//! here too; grouping nodes and lights only get their implementations from
//! the renderer packages.

pub mod grouping;
pub mod interpolation;
pub mod lighting;
pub mod time;

use crate::factory::{FactoryError, NodeFactory};

pub use grouping::handle_children_event;
pub use interpolation::{PositionInterpolator, ScalarInterpolator};
pub use time::TimeSensor;

/// `Group` type name
pub const GROUP: &str = "Group";
/// `Transform` type name
pub const TRANSFORM: &str = "Transform";
/// `PointLight` type name
pub const POINT_LIGHT: &str = "PointLight";
/// `DirectionalLight` type name
pub const DIRECTIONAL_LIGHT: &str = "DirectionalLight";
/// `TimeSensor` type name
pub const TIME_SENSOR: &str = "TimeSensor";
/// `PositionInterpolator` type name
pub const POSITION_INTERPOLATOR: &str = "PositionInterpolator";
/// `ScalarInterpolator` type name
pub const SCALAR_INTERPOLATOR: &str = "ScalarInterpolator";

/// Register every built-in type plus the renderer-neutral behaviours
pub fn register_builtin_types(factory: &mut NodeFactory) -> Result<(), FactoryError> {
    factory.register_type(grouping::group_type());
    factory.register_type(grouping::transform_type());
    factory.register_type(lighting::point_light_type());
    factory.register_type(lighting::directional_light_type());
    factory.register_type(time::time_sensor_type());
    factory.register_type(interpolation::position_interpolator_type());
    factory.register_type(interpolation::scalar_interpolator_type());

    factory.register_neutral(TIME_SENSOR, TimeSensor::default)?;
    factory.register_neutral(POSITION_INTERPOLATOR, || PositionInterpolator)?;
    factory.register_neutral(SCALAR_INTERPOLATOR, || ScalarInterpolator)?;
    Ok(())
}
