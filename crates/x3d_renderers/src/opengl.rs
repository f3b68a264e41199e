// SPDX-License-Identifier: MIT OR Apache-2.0
//! OpenGL-backed node variants.
//!
//! Nodes derive their render state (local matrices, light parameters) on
//! the simulation thread and record it into a [`GlContext`]. The render
//! thread drains the context with [`GlContext::take_uploads`] once per frame
//! and pushes the results to the GPU.

use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;
use x3d_scene::nodes::{handle_children_event, DIRECTIONAL_LIGHT, GROUP, POINT_LIGHT, TRANSFORM};
use x3d_scene::{FactoryError, FieldId, NodeBehavior, NodeContext, NodeFactory, NodeId, Renderer};

/// Column-major 4x4 matrix
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Light parameters as the shaders consume them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlLight {
    /// Whether the light contributes
    pub on: bool,
    /// Color premultiplied by intensity
    pub diffuse: [f32; 3],
    /// Color premultiplied by ambient intensity
    pub ambient: [f32; 3],
    /// Position (w = 1) or direction towards the light (w = 0)
    pub position: [f32; 4],
    /// Constant, linear and quadratic attenuation
    pub attenuation: [f32; 3],
    /// Range of a point light; infinite for directional lights
    pub radius: f32,
}

/// Render-side state of one node
#[derive(Debug, Clone, PartialEq)]
pub enum GlResource {
    /// Grouping node
    Group {
        /// Child count
        children: usize,
    },
    /// Transform node
    Transform {
        /// Local matrix
        matrix: Mat4,
        /// Child count
        children: usize,
    },
    /// Light
    Light(GlLight),
}

/// A resource that changed since the last frame
#[derive(Debug, Clone, PartialEq)]
pub struct GlUpload {
    /// Node that owns the resource
    pub node: NodeId,
    /// GL object name assigned to the node
    pub handle: u32,
    /// New state
    pub resource: GlResource,
}

#[derive(Debug, Default)]
struct GlState {
    handles: IndexMap<NodeId, u32>,
    resources: IndexMap<NodeId, GlResource>,
    uploads: Vec<GlUpload>,
    next_handle: u32,
}

/// Shared render state for every OpenGL node of a browser
#[derive(Debug, Clone, Default)]
pub struct GlContext {
    state: Arc<Mutex<GlState>>,
}

impl GlContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a node's new render state
    pub fn upload(&self, node: NodeId, resource: GlResource) {
        let mut state = self.state.lock();
        let handle = match state.handles.get(&node) {
            Some(handle) => *handle,
            None => {
                state.next_handle += 1;
                let handle = state.next_handle;
                state.handles.insert(node, handle);
                handle
            }
        };
        state.resources.insert(node, resource.clone());
        // Only the newest state per node needs to reach the GPU.
        state.uploads.retain(|upload| upload.node != node);
        state.uploads.push(GlUpload { node, handle, resource });
    }

    /// Drop a node's render state and any upload still waiting for it
    pub fn release(&self, node: NodeId) -> bool {
        let mut state = self.state.lock();
        state.uploads.retain(|upload| upload.node != node);
        state.handles.shift_remove(&node);
        state.resources.shift_remove(&node).is_some()
    }

    /// Take every upload recorded since the last call
    pub fn take_uploads(&self) -> Vec<GlUpload> {
        std::mem::take(&mut self.state.lock().uploads)
    }

    /// Number of uploads waiting for the next frame
    pub fn pending_uploads(&self) -> usize {
        self.state.lock().uploads.len()
    }

    /// Latest render state of a node
    pub fn resource(&self, node: NodeId) -> Option<GlResource> {
        self.state.lock().resources.get(&node).cloned()
    }

    /// GL object name of a node
    pub fn handle(&self, node: NodeId) -> Option<u32> {
        self.state.lock().handles.get(&node).copied()
    }

    /// Number of nodes with render state
    pub fn resource_count(&self) -> usize {
        self.state.lock().resources.len()
    }
}

fn child_count(ctx: &NodeContext<'_>) -> usize {
    ctx.get_named("children")
        .and_then(|children| children.mf_len())
        .unwrap_or(0)
}

/// `Group` variant
#[derive(Debug, Clone)]
pub struct GlGroup {
    gl: GlContext,
}

impl GlGroup {
    fn upload(&self, ctx: &NodeContext<'_>) {
        self.gl.upload(
            ctx.node().id(),
            GlResource::Group {
                children: child_count(ctx),
            },
        );
    }
}

impl NodeBehavior for GlGroup {
    fn initialize(&mut self, ctx: &mut NodeContext<'_>) {
        self.upload(ctx);
    }

    fn dispose(&mut self, node: NodeId) {
        self.gl.release(node);
    }

    fn input_received(&mut self, ctx: &mut NodeContext<'_>, field: FieldId) {
        if handle_children_event(ctx, field) || ctx.field_id("children") == Some(field) {
            self.upload(ctx);
        }
    }
}

/// `Transform` variant; keeps the local matrix
#[derive(Debug, Clone)]
pub struct GlTransform {
    gl: GlContext,
    matrix: Mat4,
}

impl GlTransform {
    fn upload(&mut self, ctx: &NodeContext<'_>) {
        let vec3 = |name: &str, default: [f32; 3]| ctx.get_as::<[f32; 3]>(name).unwrap_or(default);
        let rotation = |name: &str| ctx.get_as::<[f32; 4]>(name).unwrap_or([0.0, 0.0, 1.0, 0.0]);
        self.matrix = transform_matrix(
            vec3("translation", [0.0; 3]),
            rotation("rotation"),
            vec3("scale", [1.0; 3]),
            rotation("scaleOrientation"),
            vec3("center", [0.0; 3]),
        );
        self.gl.upload(
            ctx.node().id(),
            GlResource::Transform {
                matrix: self.matrix,
                children: child_count(ctx),
            },
        );
    }
}

impl NodeBehavior for GlTransform {
    fn initialize(&mut self, ctx: &mut NodeContext<'_>) {
        self.upload(ctx);
    }

    fn dispose(&mut self, node: NodeId) {
        self.gl.release(node);
    }

    fn input_received(&mut self, ctx: &mut NodeContext<'_>, field: FieldId) {
        handle_children_event(ctx, field);
        self.upload(ctx);
    }
}

/// Light variant shared by point and directional lights
#[derive(Debug, Clone)]
pub struct GlLightNode {
    gl: GlContext,
    directional: bool,
}

impl GlLightNode {
    fn upload(&self, ctx: &NodeContext<'_>) {
        let color = ctx.get_as::<[f32; 3]>("color").unwrap_or([1.0; 3]);
        let intensity = ctx.get_as::<f32>("intensity").unwrap_or(1.0).clamp(0.0, 1.0);
        let ambient = ctx.get_as::<f32>("ambientIntensity").unwrap_or(0.0).clamp(0.0, 1.0);
        let light = if self.directional {
            let [x, y, z] = ctx.get_as::<[f32; 3]>("direction").unwrap_or([0.0, 0.0, -1.0]);
            GlLight {
                on: ctx.get_as("on").unwrap_or(true),
                diffuse: color.map(|c| c * intensity),
                ambient: color.map(|c| c * ambient),
                position: [-x, -y, -z, 0.0],
                attenuation: [1.0, 0.0, 0.0],
                radius: f32::INFINITY,
            }
        } else {
            let [x, y, z] = ctx.get_as::<[f32; 3]>("center").unwrap_or([0.0; 3]);
            GlLight {
                on: ctx.get_as("on").unwrap_or(true),
                diffuse: color.map(|c| c * intensity),
                ambient: color.map(|c| c * ambient),
                position: [x, y, z, 1.0],
                attenuation: ctx.get_as("attenuation").unwrap_or([1.0, 0.0, 0.0]),
                radius: ctx.get_as("radius").unwrap_or(100.0),
            }
        };
        self.gl.upload(ctx.node().id(), GlResource::Light(light));
    }
}

impl NodeBehavior for GlLightNode {
    fn initialize(&mut self, ctx: &mut NodeContext<'_>) {
        self.upload(ctx);
    }

    fn dispose(&mut self, node: NodeId) {
        self.gl.release(node);
    }

    fn input_received(&mut self, ctx: &mut NodeContext<'_>, _field: FieldId) {
        self.upload(ctx);
    }
}

/// Register the OpenGL variants, all writing into `gl`
pub fn register(factory: &mut NodeFactory, gl: &GlContext) -> Result<(), FactoryError> {
    let context = gl.clone();
    factory.register_renderer(GROUP, Renderer::OpenGl, move || GlGroup { gl: context.clone() })?;
    let context = gl.clone();
    factory.register_renderer(TRANSFORM, Renderer::OpenGl, move || GlTransform {
        gl: context.clone(),
        matrix: IDENTITY,
    })?;
    let context = gl.clone();
    factory.register_renderer(POINT_LIGHT, Renderer::OpenGl, move || GlLightNode {
        gl: context.clone(),
        directional: false,
    })?;
    let context = gl.clone();
    factory.register_renderer(DIRECTIONAL_LIGHT, Renderer::OpenGl, move || GlLightNode {
        gl: context.clone(),
        directional: true,
    })?;
    tracing::debug!("Registered opengl node variants");
    Ok(())
}

/// Multiply two column-major matrices
pub fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut result = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }
    result
}

fn translation(v: [f32; 3]) -> Mat4 {
    let mut m = IDENTITY;
    m[3] = [v[0], v[1], v[2], 1.0];
    m
}

fn scaling(v: [f32; 3]) -> Mat4 {
    let mut m = IDENTITY;
    m[0][0] = v[0];
    m[1][1] = v[1];
    m[2][2] = v[2];
    m
}

/// Rotation from an X3D axis-angle; a zero axis gives the identity
fn rotation(axis_angle: [f32; 4]) -> Mat4 {
    let [x, y, z, angle] = axis_angle;
    let len = (x * x + y * y + z * z).sqrt();
    if len <= f32::EPSILON {
        return IDENTITY;
    }
    let (x, y, z) = (x / len, y / len, z / len);
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;
    [
        [t * x * x + c, t * x * y + s * z, t * x * z - s * y, 0.0],
        [t * x * y - s * z, t * y * y + c, t * y * z + s * x, 0.0],
        [t * x * z + s * y, t * y * z - s * x, t * z * z + c, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// X3D `Transform` local matrix: `T * C * R * SR * S * -SR * -C`
pub fn transform_matrix(
    translation_v: [f32; 3],
    rotation_aa: [f32; 4],
    scale: [f32; 3],
    scale_orientation: [f32; 4],
    center: [f32; 3],
) -> Mat4 {
    let [sx, sy, sz, sa] = scale_orientation;
    let steps = [
        translation(center),
        rotation(rotation_aa),
        rotation(scale_orientation),
        scaling(scale),
        rotation([sx, sy, sz, -sa]),
        translation(center.map(|c| -c)),
    ];
    steps
        .iter()
        .fold(translation(translation_v), |acc, step| mat4_mul(&acc, step))
}

/// Apply a matrix to a point
pub fn transform_point(m: &Mat4, p: [f32; 3]) -> [f32; 3] {
    let mut out = [0.0; 3];
    for (row, value) in out.iter_mut().enumerate() {
        *value = m[0][row] * p[0] + m[1][row] * p[1] + m[2][row] * p[2] + m[3][row];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use x3d_scene::nodes::register_builtin_types;
    use x3d_scene::{FieldValue, Scene};

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    fn scene(gl: &GlContext) -> Scene {
        let mut factory = NodeFactory::new();
        register_builtin_types(&mut factory).unwrap();
        register(&mut factory, gl).unwrap();
        Scene::new(factory, Renderer::OpenGl)
    }

    #[test]
    fn test_transform_matrix() {
        let m = transform_matrix(
            [1.0, 2.0, 3.0],
            [0.0, 0.0, 1.0, 0.0],
            [1.0; 3],
            [0.0, 0.0, 1.0, 0.0],
            [0.0; 3],
        );
        assert_eq!(m[3], [1.0, 2.0, 3.0, 1.0]);

        let quarter = std::f32::consts::FRAC_PI_2;
        let m = transform_matrix(
            [0.0; 3],
            [0.0, 0.0, 1.0, quarter],
            [1.0; 3],
            [0.0, 0.0, 1.0, 0.0],
            [0.0; 3],
        );
        assert!(close(transform_point(&m, [1.0, 0.0, 0.0]), [0.0, 1.0, 0.0]));

        // Rotating about a center keeps the center fixed.
        let m = transform_matrix(
            [0.0; 3],
            [0.0, 0.0, 1.0, quarter],
            [1.0; 3],
            [0.0, 0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
        );
        assert!(close(transform_point(&m, [1.0, 0.0, 0.0]), [1.0, 0.0, 0.0]));
        assert!(close(transform_point(&m, [2.0, 0.0, 0.0]), [1.0, 1.0, 0.0]));

        let m = transform_matrix(
            [0.0; 3],
            [0.0, 0.0, 1.0, 0.0],
            [2.0, 3.0, 4.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0; 3],
        );
        assert!(close(transform_point(&m, [1.0, 1.0, 1.0]), [2.0, 3.0, 4.0]));
    }

    #[test]
    fn test_initialize_records_upload() {
        let gl = GlContext::new();
        let scene = scene(&gl);
        let id = scene.add_node(scene.create_node(TRANSFORM).unwrap());

        let uploads = gl.take_uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].node, id);
        assert_eq!(gl.pending_uploads(), 0);
        assert!(matches!(
            gl.resource(id),
            Some(GlResource::Transform { matrix, .. }) if matrix == IDENTITY
        ));
    }

    #[test]
    fn test_field_change_updates_matrix() {
        let gl = GlContext::new();
        let mut scene = scene(&gl);
        let handle = scene.handle();
        let id = scene.add_node(scene.create_node(TRANSFORM).unwrap());
        gl.take_uploads();

        handle
            .write_named(id, "translation", FieldValue::SFVec3f([0.0, 5.0, 0.0]))
            .unwrap();
        handle
            .write_named(id, "scale", FieldValue::SFVec3f([2.0, 2.0, 2.0]))
            .unwrap();
        scene.tick(0.0).unwrap();

        let uploads = gl.take_uploads();
        assert_eq!(uploads.len(), 1);
        let GlResource::Transform { matrix, .. } = &uploads[0].resource else {
            panic!("expected a transform upload");
        };
        assert!(close(transform_point(matrix, [1.0, 0.0, 0.0]), [2.0, 5.0, 0.0]));
        assert_eq!(gl.handle(id), Some(uploads[0].handle));
    }

    #[test]
    fn test_light_parameters() {
        let gl = GlContext::new();
        let mut scene = scene(&gl);
        let handle = scene.handle();
        let point = scene.add_node(scene.create_node(POINT_LIGHT).unwrap());
        let sun = scene.add_node(scene.create_node(DIRECTIONAL_LIGHT).unwrap());

        handle
            .write_named(point, "center", FieldValue::SFVec3f([1.0, 0.0, 0.0]))
            .unwrap();
        handle.write_named(point, "intensity", FieldValue::SFFloat(0.5)).unwrap();
        scene.tick(0.0).unwrap();

        let Some(GlResource::Light(light)) = gl.resource(point) else {
            panic!("expected a light");
        };
        assert_eq!(light.position, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(light.diffuse, [0.5, 0.5, 0.5]);

        let Some(GlResource::Light(light)) = gl.resource(sun) else {
            panic!("expected a light");
        };
        assert_eq!(light.position, [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(gl.resource_count(), 2);
    }

    #[test]
    fn test_removed_nodes_release_render_state() {
        let gl = GlContext::new();
        let mut scene = scene(&gl);
        let handle = scene.handle();
        let ids: Vec<_> = (0..50)
            .flat_map(|_| [TRANSFORM, POINT_LIGHT])
            .map(|type_name| scene.add_node(scene.create_node(type_name).unwrap()))
            .collect();
        let kept = scene.add_node(scene.create_node(GROUP).unwrap());
        assert_eq!(gl.resource_count(), 101);

        let (direct, queued) = ids.split_at(50);
        for id in direct {
            scene.remove_node(*id).unwrap();
        }
        for id in queued {
            handle.remove_node(*id).unwrap();
        }
        scene.tick(0.0).unwrap();

        assert_eq!(handle.node_count(), 1);
        assert_eq!(gl.resource_count(), 1);
        assert!(gl.resource(kept).is_some());
        let uploads = gl.take_uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].node, kept);
        assert_eq!(gl.handle(ids[0]), None);
        assert!(!gl.release(ids[0]));
    }
}
