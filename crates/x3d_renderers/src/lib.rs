// SPDX-License-Identifier: MIT OR Apache-2.0
//! Renderer packages for the X3D browser runtime.
//!
//! Each package registers its `(type name, renderer) -> constructor`
//! entries into a scene's [`NodeFactory`]:
//! - [`norender`]: headless variants that keep no render state
//! - [`opengl`]: variants that derive render state and record uploads
//!   into a shared [`GlContext`]

pub mod norender;
pub mod opengl;

pub use opengl::{GlContext, GlLight, GlResource, GlUpload};

use x3d_scene::nodes::register_builtin_types;
use x3d_scene::{FactoryError, NodeFactory, Renderer};

/// Factory with the built-in types and every renderer package registered.
///
/// The OpenGL variants write into `gl`; scenes bound to
/// [`Renderer::NoRender`] never touch it.
pub fn default_factory(gl: &GlContext) -> Result<NodeFactory, FactoryError> {
    let mut factory = NodeFactory::new();
    register_builtin_types(&mut factory)?;
    norender::register(&mut factory)?;
    opengl::register(&mut factory, gl)?;
    Ok(factory)
}

/// Factory with the built-in types and only the package for `renderer`
pub fn factory_for(renderer: Renderer, gl: &GlContext) -> Result<NodeFactory, FactoryError> {
    let mut factory = NodeFactory::new();
    register_builtin_types(&mut factory)?;
    match renderer {
        Renderer::NoRender => norender::register(&mut factory)?,
        Renderer::OpenGl => opengl::register(&mut factory, gl)?,
    }
    Ok(factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use x3d_scene::nodes::{POINT_LIGHT, TRANSFORM};
    use x3d_scene::NodeVariant;

    #[test]
    fn test_variants_follow_renderer() {
        let gl = GlContext::new();
        let factory = default_factory(&gl).unwrap();

        let headless = factory.create(TRANSFORM, Renderer::NoRender).unwrap();
        assert_eq!(headless.variant(), NodeVariant::Specific(Renderer::NoRender));
        let rendered = factory.create(POINT_LIGHT, Renderer::OpenGl).unwrap();
        assert_eq!(rendered.variant(), NodeVariant::Specific(Renderer::OpenGl));
    }

    #[test]
    fn test_single_package_factory() {
        let gl = GlContext::new();
        let factory = factory_for(Renderer::NoRender, &gl).unwrap();
        assert!(factory.supports(TRANSFORM, Renderer::NoRender));
        assert!(!factory.supports(TRANSFORM, Renderer::OpenGl));
    }
}
