// SPDX-License-Identifier: MIT OR Apache-2.0
//! Small node types shared by unit tests.

use crate::field::{FieldDecl, FieldId, FieldType, FieldValue};
use crate::node::{NodeBehavior, NodeComponent, NodeContext, NodeType, PassiveBehavior};
use crate::NodeFactory;

/// Passive node with one field of each interesting access type
pub const HOLDER: &str = "Holder";
/// Emits `set_value + 1` out of `value_changed`
pub const COUNTER: &str = "Counter";
/// Emits the tick time out of `time` every tick
pub const CLOCK: &str = "Clock";
/// Passive node with an `SFTime` input
pub const TIME_SINK: &str = "TimeSink";

struct Counter;

impl NodeBehavior for Counter {
    fn input_received(&mut self, ctx: &mut NodeContext<'_>, field: FieldId) {
        if ctx.field_id("set_value") != Some(field) {
            return;
        }
        let value: i32 = ctx.get_as("set_value").unwrap_or_default();
        ctx.emit_named("value_changed", FieldValue::SFInt32(value + 1));
    }
}

struct Clock;

impl NodeBehavior for Clock {
    fn is_time_dependent(&self) -> bool {
        true
    }

    fn time_tick(&mut self, ctx: &mut NodeContext<'_>) {
        let time = ctx.time();
        ctx.emit_named("time", FieldValue::SFTime(time));
    }
}

pub fn factory() -> NodeFactory {
    let mut factory = NodeFactory::new();
    factory.register_type(
        NodeType::new(HOLDER, NodeComponent::Custom, "test holder")
            .with_field(FieldDecl::input_output("value", FieldValue::SFInt32(0)))
            .with_field(FieldDecl::initialize_only("label", FieldValue::SFString(String::new())))
            .with_field(FieldDecl::output_only("readout", FieldType::SFInt32))
            .with_field(FieldDecl::input_output("values", FieldValue::MFInt32(Vec::new())))
            .with_field(FieldDecl::input_output("position", FieldValue::SFVec3f([0.0; 3]))),
    );
    factory.register_type(
        NodeType::new(COUNTER, NodeComponent::Custom, "test counter")
            .with_field(FieldDecl::input_only("set_value", FieldType::SFInt32))
            .with_field(FieldDecl::output_only("value_changed", FieldType::SFInt32)),
    );
    factory.register_type(
        NodeType::new(CLOCK, NodeComponent::Custom, "test clock")
            .with_field(FieldDecl::output_only("time", FieldType::SFTime)),
    );
    factory.register_type(
        NodeType::new(TIME_SINK, NodeComponent::Custom, "test time sink")
            .with_field(FieldDecl::input_output("time", FieldValue::SFTime(0.0))),
    );

    factory.register_neutral(HOLDER, || PassiveBehavior).unwrap();
    factory.register_neutral(COUNTER, || Counter).unwrap();
    factory.register_neutral(CLOCK, || Clock).unwrap();
    factory.register_neutral(TIME_SINK, || PassiveBehavior).unwrap();
    factory
}
