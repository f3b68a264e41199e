// SPDX-License-Identifier: MIT OR Apache-2.0
//! `TimeSensor`: the clock that drives animations.

use super::TIME_SENSOR;
use crate::field::{FieldDecl, FieldType, FieldValue};
use crate::node::{NodeBehavior, NodeComponent, NodeContext, NodeType};

/// `TimeSensor` declaration
pub fn time_sensor_type() -> NodeType {
    NodeType::new(TIME_SENSOR, NodeComponent::Time, "Generates events as time passes")
        .with_field(FieldDecl::input_output("cycleInterval", FieldValue::SFTime(1.0)))
        .with_field(FieldDecl::input_output("enabled", FieldValue::SFBool(true)))
        .with_field(FieldDecl::input_output("loop", FieldValue::SFBool(false)))
        .with_field(FieldDecl::input_output("startTime", FieldValue::SFTime(0.0)))
        .with_field(FieldDecl::input_output("stopTime", FieldValue::SFTime(0.0)))
        .with_field(FieldDecl::output_only("cycleTime", FieldType::SFTime))
        .with_field(FieldDecl::output_only("fraction_changed", FieldType::SFFloat))
        .with_field(FieldDecl::output_only("isActive", FieldType::SFBool))
        .with_field(FieldDecl::output_only("time", FieldType::SFTime))
}

/// Renderer-neutral `TimeSensor`
#[derive(Debug, Clone, Default)]
pub struct TimeSensor {
    active: bool,
    cycle: Option<f64>,
}

impl NodeBehavior for TimeSensor {
    fn is_time_dependent(&self) -> bool {
        true
    }

    fn time_tick(&mut self, ctx: &mut NodeContext<'_>) {
        let now = ctx.time();
        let enabled: bool = ctx.get_as("enabled").unwrap_or(true);
        let looping: bool = ctx.get_as("loop").unwrap_or(false);
        let start: f64 = ctx.get_as("startTime").unwrap_or(0.0);
        let stop: f64 = ctx.get_as("stopTime").unwrap_or(0.0);
        let interval: f64 = ctx.get_as("cycleInterval").unwrap_or(1.0);
        if interval <= 0.0 {
            return;
        }

        let elapsed = now - start;
        let cycle_done = !looping && elapsed >= interval;
        let stopped = stop > start && now >= stop;
        let active = enabled && elapsed >= 0.0 && !cycle_done && !stopped;

        if active {
            let cycle = (elapsed / interval).floor();
            if self.cycle != Some(cycle) {
                self.cycle = Some(cycle);
                ctx.emit_named("cycleTime", FieldValue::SFTime(start + cycle * interval));
            }
            let fraction = (elapsed - cycle * interval) / interval;
            ctx.emit_named("fraction_changed", FieldValue::SFFloat(fraction as f32));
            ctx.emit_named("time", FieldValue::SFTime(now));
        } else if self.active {
            if cycle_done {
                ctx.emit_named("fraction_changed", FieldValue::SFFloat(1.0));
            }
            ctx.emit_named("time", FieldValue::SFTime(now));
            self.cycle = None;
        }

        if active != self.active {
            self.active = active;
            ctx.emit_named("isActive", FieldValue::SFBool(active));
        }
    }
}
