// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless node variants.

use x3d_scene::nodes::{handle_children_event, DIRECTIONAL_LIGHT, GROUP, POINT_LIGHT, TRANSFORM};
use x3d_scene::{
    FactoryError, FieldId, NodeBehavior, NodeContext, NodeFactory, PassiveBehavior, Renderer,
};

/// Grouping node that only maintains its children list
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRenderGroup;

impl NodeBehavior for NoRenderGroup {
    fn input_received(&mut self, ctx: &mut NodeContext<'_>, field: FieldId) {
        handle_children_event(ctx, field);
    }
}

/// Register the headless variants
pub fn register(factory: &mut NodeFactory) -> Result<(), FactoryError> {
    factory.register_renderer(GROUP, Renderer::NoRender, || NoRenderGroup)?;
    factory.register_renderer(TRANSFORM, Renderer::NoRender, || NoRenderGroup)?;
    factory.register_renderer(POINT_LIGHT, Renderer::NoRender, || PassiveBehavior)?;
    factory.register_renderer(DIRECTIONAL_LIGHT, Renderer::NoRender, || PassiveBehavior)?;
    tracing::debug!("Registered norender node variants");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use x3d_scene::nodes::register_builtin_types;
    use x3d_scene::{FieldValue, Scene};

    #[test]
    fn test_add_and_remove_children() {
        let mut factory = NodeFactory::new();
        register_builtin_types(&mut factory).unwrap();
        register(&mut factory).unwrap();
        let mut scene = Scene::new(factory, Renderer::NoRender);
        let handle = scene.handle();

        let group = scene.add_node(scene.create_node(GROUP).unwrap());
        let a = scene.add_node(scene.create_node(POINT_LIGHT).unwrap());
        let b = scene.add_node(scene.create_node(DIRECTIONAL_LIGHT).unwrap());

        handle
            .write_named(group, "addChildren", FieldValue::MFNode(vec![a, b, a]))
            .unwrap();
        scene.tick(0.0).unwrap();
        assert_eq!(handle.read_named(group, "children").unwrap(), FieldValue::MFNode(vec![a, b]));

        handle
            .write_named(group, "removeChildren", FieldValue::MFNode(vec![a]))
            .unwrap();
        scene.tick(0.0).unwrap();
        assert_eq!(handle.read_named(group, "children").unwrap(), FieldValue::MFNode(vec![b]));
    }
}
