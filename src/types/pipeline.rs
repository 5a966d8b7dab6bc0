//! Pipeline descriptors.
//!
//! Pipelines are created through the renderer but cached by the graph, keyed
//! by full descriptor equality, so the descriptor derives `Eq` and `Hash`.
//! A pipeline is only compatible with the render pass it was built against;
//! rebuilding the graph invalidates the whole cache.

use crate::renderer::RenderPassHandle;

/// Depth comparison function for pipeline depth testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthCompare {
    /// Depth testing disabled.
    #[default]
    Always,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
}

/// Color blend mode for pipeline output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Source replaces destination.
    #[default]
    Opaque,
    /// Standard alpha blending.
    Alpha,
    /// Additive blending.
    Additive,
}

/// Descriptor for creating a graphics pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineDesc {
    /// Debug name.
    pub label: Option<String>,
    /// Name of the vertex shader.
    pub vertex_shader: String,
    /// Name of the fragment shader, if any.
    pub fragment_shader: Option<String>,
    /// Render pass the pipeline is built against.
    pub render_pass: RenderPassHandle,
    /// Blend mode for all color outputs.
    pub blend: BlendMode,
    /// Depth comparison; `Always` disables the depth test.
    pub depth_compare: DepthCompare,
    /// Whether the pipeline writes depth.
    pub depth_write: bool,
}

impl PipelineDesc {
    /// Create a descriptor for a vertex + fragment pipeline targeting the
    /// given render pass, with opaque blending and no depth test.
    pub fn new(
        vertex_shader: impl Into<String>,
        fragment_shader: impl Into<String>,
        render_pass: RenderPassHandle,
    ) -> Self {
        Self {
            label: None,
            vertex_shader: vertex_shader.into(),
            fragment_shader: Some(fragment_shader.into()),
            render_pass,
            blend: BlendMode::default(),
            depth_compare: DepthCompare::default(),
            depth_write: false,
        }
    }

    /// Set the blend mode.
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    /// Enable depth testing with the given comparison and write flag.
    pub fn with_depth(mut self, compare: DepthCompare, write: bool) -> Self {
        self.depth_compare = compare;
        self.depth_write = write;
        self
    }

    /// Set the debug name.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_desc_equality_keys_cache() {
        let pass = RenderPassHandle::NULL;
        let a = PipelineDesc::new("fullscreen", "fxaa", pass);
        let b = PipelineDesc::new("fullscreen", "fxaa", pass);
        let c = PipelineDesc::new("fullscreen", "taa_resolve", pass);

        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut cache = HashMap::new();
        cache.insert(a, 1u32);
        assert!(cache.contains_key(&b));
        assert!(!cache.contains_key(&c));
    }
}
