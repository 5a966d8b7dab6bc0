//! Per-pass resource view passed to render callbacks.

use std::collections::HashMap;

use crate::graph::target::GraphId;
use crate::renderer::TextureHandle;
use crate::types::TextureFormat;

/// An input render target resolved to its concrete texture views.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedInput {
    pub(crate) primary: TextureHandle,
    pub(crate) primary_format: TextureFormat,
    /// View through the extra format configured on the target's descriptor.
    pub(crate) extra: Option<(TextureFormat, TextureHandle)>,
}

/// The resolved input render targets of the currently executing render pass.
///
/// Handed to every render callback; resolves the pass's declared input
/// render targets to concrete sampled-texture handles. Asking for a target
/// the pass did not declare as an input is a bug and panics.
#[derive(Debug)]
pub struct PassResources<Rt: GraphId> {
    pass_name: String,
    inputs: HashMap<Rt, ResolvedInput>,
}

impl<Rt: GraphId> PassResources<Rt> {
    pub(crate) fn new(pass_name: String, inputs: HashMap<Rt, ResolvedInput>) -> Self {
        Self { pass_name, inputs }
    }

    /// Name of the executing pass (concatenated for merged passes).
    pub fn pass_name(&self) -> &str {
        &self.pass_name
    }

    /// Get the primary texture view of an input render target.
    ///
    /// # Panics
    ///
    /// Panics if `rt` was not declared as an input of the executing pass.
    pub fn get(&self, rt: Rt) -> TextureHandle {
        self.resolved(rt).primary
    }

    /// Get the texture view of an input render target through a specific
    /// format: either its primary format or the extra view format configured
    /// on its descriptor.
    ///
    /// # Panics
    ///
    /// Panics if `rt` was not declared as an input of the executing pass, or
    /// if `format` matches neither the primary nor the extra view format.
    pub fn get_view(&self, rt: Rt, format: TextureFormat) -> TextureHandle {
        let resolved = self.resolved(rt);
        if let Some((extra_format, extra)) = resolved.extra {
            if extra_format == format {
                return extra;
            }
        }
        assert!(
            resolved.primary_format == format,
            "render target {rt:?} has no view with format {format:?} in pass '{}'",
            self.pass_name
        );
        resolved.primary
    }

    fn resolved(&self, rt: Rt) -> &ResolvedInput {
        self.inputs.get(&rt).unwrap_or_else(|| {
            panic!(
                "render target {rt:?} is not an input of pass '{}'",
                self.pass_name
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Handle;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Rt {
        Invalid,
        Color,
        History,
    }

    impl GraphId for Rt {
        fn sentinel() -> Self {
            Rt::Invalid
        }
    }

    fn resources() -> PassResources<Rt> {
        let mut inputs = HashMap::new();
        inputs.insert(
            Rt::Color,
            ResolvedInput {
                primary: Handle::from_id(10),
                primary_format: TextureFormat::Rgba8Unorm,
                extra: Some((TextureFormat::Rgba8UnormSrgb, Handle::from_id(11))),
            },
        );
        PassResources::new("post".to_string(), inputs)
    }

    #[test]
    fn test_get_primary_view() {
        let resources = resources();
        assert_eq!(resources.get(Rt::Color).id(), 10);
        assert_eq!(
            resources
                .get_view(Rt::Color, TextureFormat::Rgba8Unorm)
                .id(),
            10
        );
    }

    #[test]
    fn test_get_extra_view() {
        let resources = resources();
        assert_eq!(
            resources
                .get_view(Rt::Color, TextureFormat::Rgba8UnormSrgb)
                .id(),
            11
        );
    }

    #[test]
    #[should_panic(expected = "not an input")]
    fn test_undeclared_input_panics() {
        let resources = resources();
        let _ = resources.get(Rt::History);
    }

    #[test]
    #[should_panic(expected = "no view with format")]
    fn test_unconfigured_format_panics() {
        let resources = resources();
        let _ = resources.get_view(Rt::Color, TextureFormat::Rgba16Float);
    }
}
