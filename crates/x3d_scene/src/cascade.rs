// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-tick event cascade.
//!
//! Each tick runs Idle -> Draining -> Propagating -> Notifying -> Idle:
//! - Draining swaps out the external event buffer and applies it. This is
//!   the only point where external changes enter the cascade.
//! - Propagating lets time-dependent nodes fire, then processes dirty fields
//!   in the order they became dirty, running node logic for inputs and
//!   following routes for outputs.
//! - Notifying tells listeners about every field whose value changed.

use crate::field::{FieldError, FieldId, FieldValue, FieldWrite};
use crate::listener::FieldEvent;
use crate::node::Node;
use crate::queue::{PendingEvent, DEFAULT_MAX_PENDING_EVENTS};
use crate::route::{FieldRef, Route, RouteGraph};
use crate::scene::{SceneError, SceneShared};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Cascade tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Times a route may carry an event within one tick before further
    /// events along it are dropped for the rest of the tick
    pub max_route_visits: u32,
    /// Bound on buffered external events; exceeding it is fatal for the scene
    pub max_pending_events: usize,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            max_route_visits: 1,
            max_pending_events: DEFAULT_MAX_PENDING_EVENTS,
        }
    }
}

impl CascadeConfig {
    /// Set the per-route visit cap (clamped to at least 1)
    pub fn with_max_route_visits(mut self, visits: u32) -> Self {
        self.max_route_visits = visits.max(1);
        self
    }

    /// Set the pending event bound
    pub fn with_max_pending_events(mut self, events: usize) -> Self {
        self.max_pending_events = events.max(1);
        self
    }
}

/// Phase of the tick state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TickPhase {
    /// Between ticks
    #[default]
    Idle = 0,
    /// Applying the external event buffer
    Draining = 1,
    /// Following routes
    Propagating = 2,
    /// Calling listeners
    Notifying = 3,
}

impl TickPhase {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Draining,
            2 => Self::Propagating,
            3 => Self::Notifying,
            _ => Self::Idle,
        }
    }
}

/// A route hit its visit cap; propagation along it stopped for the tick.
/// Informational, never fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Route {route} exceeded {cap} visit(s) in tick {tick}; propagation truncated")]
pub struct CycleCapExceeded {
    /// The truncated route
    pub route: Route,
    /// Configured cap
    pub cap: u32,
    /// Tick number
    pub tick: u64,
}

/// Summary of one tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Tick number, starting at 1
    pub tick: u64,
    /// Simulation time passed to the tick
    pub time: f64,
    /// External writes applied during Draining
    pub writes_applied: usize,
    /// External writes dropped (target gone or no longer valid)
    pub writes_dropped: usize,
    /// Structural changes and listener changes applied during Draining
    pub structural_changes: usize,
    /// Events carried along routes
    pub events_propagated: usize,
    /// Listener calls made
    pub notifications: usize,
    /// Routes truncated by the visit cap
    pub truncations: Vec<CycleCapExceeded>,
}

/// Runs the tick state machine for one scene
#[derive(Debug)]
pub struct CascadeEvaluator {
    config: CascadeConfig,
    tick: u64,
    /// Fields waiting to be processed, in the order they became dirty
    dirty: VecDeque<FieldRef>,
    /// Fields in `dirty`, flagged when they received an input event
    queued: HashMap<FieldRef, bool>,
    /// Last value each field received this tick
    received: HashMap<FieldRef, FieldValue>,
    /// Route traversals this tick
    visits: HashMap<Route, u32>,
    /// Value each written field held before its first write this tick
    touched: IndexMap<FieldRef, FieldValue>,
}

impl CascadeEvaluator {
    /// Create an evaluator
    pub fn new(config: CascadeConfig) -> Self {
        Self {
            config,
            tick: 0,
            dirty: VecDeque::new(),
            queued: HashMap::new(),
            received: HashMap::new(),
            visits: HashMap::new(),
            touched: IndexMap::new(),
        }
    }

    /// Current configuration
    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Change the per-route visit cap; takes effect from the next tick
    pub fn set_max_route_visits(&mut self, visits: u32) {
        self.config.max_route_visits = visits.max(1);
    }

    pub(crate) fn set_max_pending_events(&mut self, events: usize) {
        self.config.max_pending_events = events.max(1);
    }

    /// Number of completed ticks
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Run one full tick
    pub fn tick(
        &mut self,
        shared: &SceneShared,
        routes: &mut RouteGraph,
        time: f64,
    ) -> Result<TickReport, SceneError> {
        if shared.queue.is_overflowed() {
            return Err(SceneError::QueueOverflow {
                capacity: shared.queue.capacity(),
            });
        }

        let tick = self.tick + 1;
        self.reset();
        let mut report = TickReport {
            tick,
            time,
            ..TickReport::default()
        };

        shared.set_phase(TickPhase::Draining);
        for event in shared.queue.take() {
            self.drain_event(shared, routes, event, tick, &mut report);
        }

        shared.set_phase(TickPhase::Propagating);
        for node in shared.time_dependent_nodes() {
            for (field, value) in node.dispatch_time(time) {
                self.emit(&node, field, value, tick);
            }
        }
        self.propagate(shared, routes, tick, time, &mut report);

        shared.set_phase(TickPhase::Notifying);
        self.notify(shared, tick, time, &mut report);

        shared.set_phase(TickPhase::Idle);
        self.tick = tick;
        shared.finish_tick(tick);

        tracing::trace!(
            tick,
            applied = report.writes_applied,
            propagated = report.events_propagated,
            notified = report.notifications,
            "tick complete"
        );
        Ok(report)
    }

    fn reset(&mut self) {
        self.dirty.clear();
        self.queued.clear();
        self.received.clear();
        self.visits.clear();
        self.touched.clear();
    }

    fn drain_event(
        &mut self,
        shared: &SceneShared,
        routes: &mut RouteGraph,
        event: PendingEvent,
        tick: u64,
        report: &mut TickReport,
    ) {
        match event {
            PendingEvent::Write { target, write } => {
                let Some(node) = shared.node(target.node) else {
                    tracing::debug!("Dropping write to removed node {}", target.node);
                    report.writes_dropped += 1;
                    return;
                };
                match self.write_field(&node, target.field, write, tick, true) {
                    Ok(value) => {
                        self.received.insert(target, value);
                        report.writes_applied += 1;
                    }
                    Err(err) => {
                        tracing::warn!("Dropping write to {}: {}", target, err);
                        report.writes_dropped += 1;
                    }
                }
            }
            PendingEvent::Listener(change) => {
                shared.apply_listener_change(change);
                report.structural_changes += 1;
            }
            PendingEvent::Structure(change) => {
                shared.apply_structure(routes, change);
                report.structural_changes += 1;
            }
        }
    }

    fn propagate(
        &mut self,
        shared: &SceneShared,
        routes: &RouteGraph,
        tick: u64,
        time: f64,
        report: &mut TickReport,
    ) {
        while let Some(source) = self.dirty.pop_front() {
            let is_input = self.queued.remove(&source).unwrap_or(false);
            let Some(node) = shared.node(source.node) else { continue };
            let Some(value) = node.take_dirty(source.field) else { continue };
            let Ok(access) = node.field_decl(source.field).map(|decl| decl.access) else {
                continue;
            };

            if is_input && access.accepts_input() {
                for (field, emitted) in node.dispatch_input(source.field, time) {
                    self.emit(&node, field, emitted, tick);
                }
            }

            if !access.produces_output() {
                continue;
            }
            for route in routes.outgoing(&source) {
                self.deliver(shared, *route, &value, tick, report);
            }
        }
    }

    fn deliver(
        &mut self,
        shared: &SceneShared,
        route: Route,
        value: &FieldValue,
        tick: u64,
        report: &mut TickReport,
    ) {
        if self.received.get(&route.to) == Some(value) {
            return;
        }

        let cap = self.config.max_route_visits;
        let visits = self.visits.entry(route).or_insert(0);
        if *visits >= cap {
            if *visits == cap {
                *visits += 1;
                let notice = CycleCapExceeded { route, cap, tick };
                tracing::warn!("{}", notice);
                report.truncations.push(notice);
            }
            return;
        }
        *visits += 1;

        let Some(destination) = shared.node(route.to.node) else { return };
        let write = FieldWrite::Set(value.clone());
        match self.write_field(&destination, route.to.field, write, tick, true) {
            Ok(applied) => {
                self.received.insert(route.to, applied);
                report.events_propagated += 1;
            }
            Err(err) => tracing::warn!("Route {} dropped an event: {}", route, err),
        }
    }

    /// Apply an event a node sent out of one of its own fields
    fn emit(&mut self, node: &Node, field: FieldId, value: FieldValue, tick: u64) {
        let Ok(decl) = node.field_decl(field) else { return };
        if !decl.access.produces_output() {
            tracing::warn!(
                "{} emitted into {} field '{}'; ignored",
                node.type_name(),
                decl.access,
                decl.name
            );
            return;
        }
        if let Err(err) = self.write_field(node, field, FieldWrite::Set(value), tick, false) {
            tracing::warn!("{} emitted an invalid event: {}", node.type_name(), err);
        }
    }

    fn write_field(
        &mut self,
        node: &Node,
        field: FieldId,
        write: FieldWrite,
        tick: u64,
        is_input: bool,
    ) -> Result<FieldValue, FieldError> {
        let target = FieldRef::new(node.id(), field);
        if !self.touched.contains_key(&target) {
            let before = node.read(field)?;
            self.touched.insert(target, before);
        }
        let value = node.apply_write(field, write, tick)?;

        match self.queued.get_mut(&target) {
            Some(flag) => *flag |= is_input,
            None => {
                self.queued.insert(target, is_input);
                self.dirty.push_back(target);
            }
        }
        Ok(value)
    }

    fn notify(&mut self, shared: &SceneShared, tick: u64, time: f64, report: &mut TickReport) {
        let touched = std::mem::take(&mut self.touched);
        for (target, before) in touched {
            let Some(node) = shared.node(target.node) else { continue };
            let Ok(value) = node.read(target.field) else { continue };
            if value == before {
                continue;
            }
            let listeners = shared.listeners.snapshot(&target);
            if listeners.is_empty() {
                continue;
            }
            let field_name = node
                .field_decl(target.field)
                .map(|decl| decl.name.clone())
                .unwrap_or_default();
            let event = FieldEvent {
                node: target.node,
                field: target.field,
                field_name,
                value,
                tick,
                time,
            };
            for listener in listeners {
                listener.field_changed(&event);
                report.notifications += 1;
            }
        }
    }
}

impl Default for CascadeEvaluator {
    fn default() -> Self {
        Self::new(CascadeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use crate::test_support::{self, COUNTER, HOLDER};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn scene() -> Scene {
        Scene::new(test_support::factory(), crate::Renderer::NoRender)
    }

    #[test]
    fn test_write_visible_after_tick() {
        let mut scene = scene();
        let node = scene.add_node(scene.create_node(HOLDER).unwrap());
        let value = scene.handle().field_ref(node, "value").unwrap();

        scene.handle().write(value, FieldValue::SFInt32(9)).unwrap();
        assert_eq!(scene.handle().read(value).unwrap(), FieldValue::SFInt32(0));

        let report = scene.tick(0.0).unwrap();
        assert_eq!(report.writes_applied, 1);
        assert_eq!(scene.handle().read(value).unwrap(), FieldValue::SFInt32(9));
    }

    #[test]
    fn test_route_chain_converges_in_one_tick() {
        let mut scene = scene();
        let handle = scene.handle();
        let ids: Vec<_> = (0..4)
            .map(|_| scene.add_node(scene.create_node(HOLDER).unwrap()))
            .collect();
        for pair in ids.windows(2) {
            scene.add_route_named(pair[0], "value", pair[1], "value").unwrap();
        }

        handle.write_named(ids[0], "value", FieldValue::SFInt32(42)).unwrap();
        scene.tick(0.0).unwrap();

        for id in &ids {
            assert_eq!(handle.read_named(*id, "value").unwrap(), FieldValue::SFInt32(42));
        }
    }

    #[test]
    fn test_same_value_cycle_terminates() {
        let mut scene = scene();
        let handle = scene.handle();
        let a = scene.add_node(scene.create_node(HOLDER).unwrap());
        let b = scene.add_node(scene.create_node(HOLDER).unwrap());
        scene.add_route_named(a, "value", b, "value").unwrap();
        scene.add_route_named(b, "value", a, "value").unwrap();

        handle.write_named(a, "value", FieldValue::SFInt32(3)).unwrap();
        let report = scene.tick(0.0).unwrap();

        assert_eq!(handle.read_named(b, "value").unwrap(), FieldValue::SFInt32(3));
        assert_eq!(report.events_propagated, 1);
        assert!(report.truncations.is_empty());
    }

    #[test]
    fn test_feedback_cycle_hits_visit_cap() {
        let mut scene = scene();
        let handle = scene.handle();
        let a = scene.add_node(scene.create_node(COUNTER).unwrap());
        let b = scene.add_node(scene.create_node(COUNTER).unwrap());
        scene.add_route_named(a, "value_changed", b, "set_value").unwrap();
        scene.add_route_named(b, "value_changed", a, "set_value").unwrap();

        handle.write_named(a, "set_value", FieldValue::SFInt32(0)).unwrap();
        let report = scene.tick(0.0).unwrap();

        // a emits 1, b emits 2, a emits 3; the a -> b route is then spent.
        assert_eq!(handle.read_named(a, "value_changed").unwrap(), FieldValue::SFInt32(3));
        assert_eq!(handle.read_named(b, "value_changed").unwrap(), FieldValue::SFInt32(2));
        assert_eq!(report.truncations.len(), 1);
        assert_eq!(report.truncations[0].cap, 1);

        // The next tick starts with fresh visit counts but no new input.
        let report = scene.tick(0.0).unwrap();
        assert_eq!(report.events_propagated, 0);
    }

    #[derive(Clone, Default)]
    struct LevelLog(Arc<Mutex<Vec<tracing::Level>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LevelLog {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            if event.metadata().target() == module_path!() {
                self.0.lock().push(*event.metadata().level());
            }
        }
    }

    #[test]
    fn test_truncation_is_logged_as_warning_once() {
        use tracing_subscriber::layer::SubscriberExt;

        let mut scene = scene();
        let handle = scene.handle();
        let a = scene.add_node(scene.create_node(COUNTER).unwrap());
        let b = scene.add_node(scene.create_node(COUNTER).unwrap());
        scene.add_route_named(a, "value_changed", b, "set_value").unwrap();
        scene.add_route_named(b, "value_changed", a, "set_value").unwrap();
        handle.write_named(a, "set_value", FieldValue::SFInt32(0)).unwrap();

        let log = LevelLog::default();
        let subscriber = tracing_subscriber::registry().with(log.clone());
        let report = tracing::subscriber::with_default(subscriber, || scene.tick(0.0).unwrap());

        assert_eq!(report.truncations.len(), 1);
        let warnings = log.0.lock().iter().filter(|level| **level == tracing::Level::WARN).count();
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_higher_cap_allows_more_laps() {
        let mut scene = Scene::with_config(
            test_support::factory(),
            crate::Renderer::NoRender,
            CascadeConfig::default().with_max_route_visits(3),
        );
        let handle = scene.handle();
        let a = scene.add_node(scene.create_node(COUNTER).unwrap());
        let b = scene.add_node(scene.create_node(COUNTER).unwrap());
        scene.add_route_named(a, "value_changed", b, "set_value").unwrap();
        scene.add_route_named(b, "value_changed", a, "set_value").unwrap();

        handle.write_named(a, "set_value", FieldValue::SFInt32(0)).unwrap();
        let report = scene.tick(0.0).unwrap();

        assert_eq!(handle.read_named(a, "value_changed").unwrap(), FieldValue::SFInt32(7));
        assert_eq!(report.events_propagated, 6);
        assert_eq!(report.truncations.len(), 1);
    }

    #[test]
    fn test_fan_out_follows_route_insertion_order() {
        let mut scene = scene();
        let handle = scene.handle();
        let source = scene.add_node(scene.create_node(HOLDER).unwrap());
        let first = scene.add_node(scene.create_node(HOLDER).unwrap());
        let second = scene.add_node(scene.create_node(HOLDER).unwrap());
        scene.add_route_named(source, "value", second, "value").unwrap();
        scene.add_route_named(source, "value", first, "value").unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        for (tag, id) in [("second", second), ("first", first)] {
            let order = Arc::clone(&order);
            let target = handle.field_ref(id, "value").unwrap();
            handle
                .add_listener(target, move |_: &FieldEvent| order.lock().push(tag))
                .unwrap();
        }
        scene.tick(0.0).unwrap();

        handle.write_named(source, "value", FieldValue::SFInt32(1)).unwrap();
        scene.tick(0.0).unwrap();
        assert_eq!(*order.lock(), vec!["second", "first"]);
    }

    #[test]
    fn test_notification_only_on_change() {
        let mut scene = scene();
        let handle = scene.handle();
        let node = scene.add_node(scene.create_node(HOLDER).unwrap());
        let target = handle.field_ref(node, "value").unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        handle
            .add_listener(target, move |event: &FieldEvent| sink.lock().push(event.value.clone()))
            .unwrap();
        scene.tick(0.0).unwrap();

        handle.write(target, FieldValue::SFInt32(1)).unwrap();
        handle.write(target, FieldValue::SFInt32(2)).unwrap();
        scene.tick(0.0).unwrap();
        assert_eq!(*seen.lock(), vec![FieldValue::SFInt32(2)]);

        handle.write(target, FieldValue::SFInt32(2)).unwrap();
        scene.tick(0.0).unwrap();
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_listener_write_lands_next_tick() {
        let mut scene = scene();
        let handle = scene.handle();
        let a = scene.add_node(scene.create_node(HOLDER).unwrap());
        let b = scene.add_node(scene.create_node(HOLDER).unwrap());
        let a_value = handle.field_ref(a, "value").unwrap();
        let b_value = handle.field_ref(b, "value").unwrap();

        let writer = handle.clone();
        handle
            .add_listener(a_value, move |event: &FieldEvent| {
                writer.write(b_value, event.value.clone()).unwrap();
            })
            .unwrap();
        scene.tick(0.0).unwrap();

        handle.write(a_value, FieldValue::SFInt32(5)).unwrap();
        scene.tick(0.0).unwrap();
        assert_eq!(handle.read(b_value).unwrap(), FieldValue::SFInt32(0));
        assert_eq!(handle.pending_events(), 1);

        scene.tick(0.0).unwrap();
        assert_eq!(handle.read(b_value).unwrap(), FieldValue::SFInt32(5));
    }

    #[test]
    fn test_time_dependent_nodes_fire_before_propagation() {
        let mut scene = scene();
        let handle = scene.handle();
        let clock = scene.add_node(scene.create_node(test_support::CLOCK).unwrap());
        let sink = scene.add_node(scene.create_node(test_support::TIME_SINK).unwrap());
        scene.add_route_named(clock, "time", sink, "time").unwrap();

        scene.tick(2.5).unwrap();
        assert_eq!(handle.read_named(sink, "time").unwrap(), FieldValue::SFTime(2.5));
    }

    #[test]
    fn test_phase_is_idle_between_ticks() {
        let mut scene = scene();
        assert_eq!(scene.handle().phase(), TickPhase::Idle);
        scene.tick(0.0).unwrap();
        assert_eq!(scene.handle().phase(), TickPhase::Idle);
        assert_eq!(scene.tick_count(), 1);
    }

    #[test]
    fn test_listener_sees_notifying_phase() {
        let mut scene = scene();
        let handle = scene.handle();
        let node = scene.add_node(scene.create_node(HOLDER).unwrap());
        let target = handle.field_ref(node, "value").unwrap();

        let phases = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&phases);
        let observer = handle.clone();
        handle
            .add_listener(target, move |_: &FieldEvent| sink.lock().push(observer.phase()))
            .unwrap();
        handle.write(target, FieldValue::SFInt32(1)).unwrap();
        scene.tick(0.0).unwrap();

        assert_eq!(*phases.lock(), vec![TickPhase::Notifying]);
    }

    #[test]
    fn test_config_roundtrip_through_ron() {
        let config = CascadeConfig::default().with_max_route_visits(4);
        let text = ron::to_string(&config).unwrap();
        let parsed: CascadeConfig = ron::from_str(&text).unwrap();
        assert_eq!(parsed, config);

        let partial: CascadeConfig = ron::from_str("(max_route_visits: 2)").unwrap();
        assert_eq!(partial.max_pending_events, DEFAULT_MAX_PENDING_EVENTS);
    }
}
