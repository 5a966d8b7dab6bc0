//! Logical render targets and pass descriptors for the render graph.

use std::fmt;
use std::hash::Hash;

use crate::renderer::RenderTargetHandle;
use crate::types::{
    ClearColor, DepthLoadOp, ImageLayout, LoadOp, RenderTargetDesc, TextureFormat,
    MAX_COLOR_ATTACHMENTS,
};

/// Identifier type the graph is generic over.
///
/// Calling code names render targets and render passes with its own enum-like
/// identifiers; the graph only requires that they are cheap to copy, compare
/// and hash, and that one value is reserved as the sentinel ("no target").
/// The sentinel must never be registered.
///
/// ```
/// use framegraph::GraphId;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Target {
///     Invalid,
///     SceneColor,
///     SceneDepth,
/// }
///
/// impl GraphId for Target {
///     fn sentinel() -> Self {
///         Target::Invalid
///     }
/// }
/// ```
pub trait GraphId: Copy + Eq + Hash + fmt::Debug + 'static {
    /// The distinguished "no value" identifier.
    fn sentinel() -> Self;

    /// Check whether this is the sentinel value.
    fn is_sentinel(&self) -> bool {
        *self == Self::sentinel()
    }
}

/// A render target registered with the graph.
///
/// Internal targets are created and destroyed entirely by the graph.
/// External targets describe format and layout expectations only; their
/// backing handle is injected per frame via
/// [`RenderGraph::bind_external_rt`](crate::RenderGraph::bind_external_rt)
/// and cleared again after each `render()` call, so double-buffered history
/// resources can live outside the graph's lifetime.
#[derive(Debug)]
pub(crate) enum LogicalTarget {
    Internal {
        desc: RenderTargetDesc,
        /// Backing GPU target; null until `build()` creates it.
        handle: RenderTargetHandle,
    },
    External {
        format: TextureFormat,
        /// Layout the caller guarantees the target is in when `render()` starts.
        initial_layout: ImageLayout,
        /// Layout the target must be back in when `render()` ends.
        final_layout: ImageLayout,
        /// Per-frame binding; null outside of `bind_external_rt`..`render()`.
        bound: RenderTargetHandle,
    },
}

impl LogicalTarget {
    pub(crate) fn format(&self) -> TextureFormat {
        match self {
            Self::Internal { desc, .. } => desc.format,
            Self::External { format, .. } => *format,
        }
    }

    pub(crate) fn is_external(&self) -> bool {
        matches!(self, Self::External { .. })
    }

    /// The handle operations run against this frame: the created backing for
    /// internal targets, the bound handle for external ones.
    pub(crate) fn current_handle(&self) -> RenderTargetHandle {
        match self {
            Self::Internal { handle, .. } => *handle,
            Self::External { bound, .. } => *bound,
        }
    }
}

/// A color attachment slot of a [`PassDesc`].
///
/// The initial/final layouts start out undefined and are filled in by the
/// layout inference in `build()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorAttachment<Rt> {
    pub(crate) rt: Option<Rt>,
    pub(crate) load: LoadOp,
    pub(crate) initial_layout: ImageLayout,
    pub(crate) final_layout: ImageLayout,
}

impl<Rt: GraphId> ColorAttachment<Rt> {
    /// Create an attachment for `rt` with a `DontCare` begin policy.
    pub fn new(rt: Rt) -> Self {
        assert!(
            !rt.is_sentinel(),
            "cannot attach the sentinel render target id"
        );
        Self {
            rt: Some(rt),
            load: LoadOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::Undefined,
        }
    }

    /// Clear the attachment when the pass begins.
    pub fn with_clear(mut self, color: ClearColor) -> Self {
        self.load = LoadOp::Clear(color);
        self
    }

    /// Keep the attachment's existing contents when the pass begins.
    pub fn with_load(mut self) -> Self {
        self.load = LoadOp::Load;
        self
    }

    /// The attached render target, if the slot is in use.
    ///
    /// `None` after `build()` means layout inference found no later consumer
    /// and eliminated the attachment.
    pub fn rt(&self) -> Option<Rt> {
        self.rt
    }

    /// The begin policy.
    pub fn load(&self) -> LoadOp {
        self.load
    }

    /// Layout the target must be in when the pass begins (derived by `build()`).
    pub fn initial_layout(&self) -> ImageLayout {
        self.initial_layout
    }

    /// Layout the pass leaves the target in (derived by `build()`).
    pub fn final_layout(&self) -> ImageLayout {
        self.final_layout
    }

    pub(crate) fn empty() -> Self {
        Self {
            rt: None,
            load: LoadOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::Undefined,
        }
    }
}

/// The depth/stencil attachment of a [`PassDesc`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStencilAttachment<Rt> {
    pub(crate) rt: Rt,
    pub(crate) load: DepthLoadOp,
    pub(crate) initial_layout: ImageLayout,
    pub(crate) final_layout: ImageLayout,
}

impl<Rt: GraphId> DepthStencilAttachment<Rt> {
    /// Create a depth/stencil attachment for `rt` with a `DontCare` begin policy.
    pub fn new(rt: Rt) -> Self {
        assert!(
            !rt.is_sentinel(),
            "cannot attach the sentinel render target id"
        );
        Self {
            rt,
            load: DepthLoadOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::Undefined,
        }
    }

    /// Clear depth (and stencil to zero) when the pass begins.
    pub fn with_clear_depth(mut self, depth: f32) -> Self {
        self.load = DepthLoadOp::clear_depth(depth);
        self
    }

    /// Keep the existing depth/stencil contents when the pass begins.
    pub fn with_load(mut self) -> Self {
        self.load = DepthLoadOp::Load;
        self
    }

    /// The attached render target.
    pub fn rt(&self) -> Rt {
        self.rt
    }

    /// The begin policy.
    pub fn load(&self) -> DepthLoadOp {
        self.load
    }

    /// Layout the target must be in when the pass begins (derived by `build()`).
    pub fn initial_layout(&self) -> ImageLayout {
        self.initial_layout
    }

    /// Layout the pass leaves the target in (derived by `build()`).
    pub fn final_layout(&self) -> ImageLayout {
        self.final_layout
    }
}

/// Declarative description of one render pass.
///
/// Built with chained setters, consumed by
/// [`RenderGraph::render_pass`](crate::RenderGraph::render_pass):
///
/// ```
/// use framegraph::{ClearColor, ColorAttachment, GraphId, PassDesc};
/// # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// # enum Rt { Invalid, SceneColor, SceneDepth }
/// # impl GraphId for Rt { fn sentinel() -> Self { Rt::Invalid } }
///
/// let desc = PassDesc::new()
///     .with_color(ColorAttachment::new(Rt::SceneColor).with_clear(ClearColor::BLACK))
///     .with_input(Rt::SceneDepth)
///     .with_samples(4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PassDesc<Rt> {
    pub(crate) colors: [ColorAttachment<Rt>; MAX_COLOR_ATTACHMENTS],
    pub(crate) depth_stencil: Option<DepthStencilAttachment<Rt>>,
    pub(crate) inputs: Vec<Rt>,
    pub(crate) samples: u32,
}

impl<Rt: GraphId> PassDesc<Rt> {
    /// Create an empty single-sampled pass description.
    pub fn new() -> Self {
        Self {
            colors: [ColorAttachment::empty(); MAX_COLOR_ATTACHMENTS],
            depth_stencil: None,
            inputs: Vec::new(),
            samples: 1,
        }
    }

    /// Add a color attachment in the next free slot.
    pub fn with_color(mut self, attachment: ColorAttachment<Rt>) -> Self {
        let slot = self
            .colors
            .iter()
            .position(|a| a.rt.is_none())
            .unwrap_or_else(|| {
                panic!("render pass already has {MAX_COLOR_ATTACHMENTS} color attachments")
            });
        self.colors[slot] = attachment;
        self
    }

    /// Set the depth/stencil attachment.
    pub fn with_depth_stencil(mut self, attachment: DepthStencilAttachment<Rt>) -> Self {
        assert!(
            self.depth_stencil.is_none(),
            "render pass already has a depth/stencil attachment"
        );
        self.depth_stencil = Some(attachment);
        self
    }

    /// Declare a render target the pass samples as a texture.
    pub fn with_input(mut self, rt: Rt) -> Self {
        assert!(!rt.is_sentinel(), "cannot read the sentinel render target id");
        if !self.inputs.contains(&rt) {
            self.inputs.push(rt);
        }
        self
    }

    /// Set the MSAA sample count of the pass.
    pub fn with_samples(mut self, samples: u32) -> Self {
        assert!(
            samples.is_power_of_two(),
            "sample count must be a power of two, got {samples}"
        );
        self.samples = samples;
        self
    }

    /// Color attachment slots, in slot order.
    pub fn color_attachments(&self) -> &[ColorAttachment<Rt>] {
        &self.colors
    }

    /// The depth/stencil attachment, if any.
    pub fn depth_stencil(&self) -> Option<&DepthStencilAttachment<Rt>> {
        self.depth_stencil.as_ref()
    }

    /// Render targets the pass reads.
    pub fn inputs(&self) -> &[Rt] {
        &self.inputs
    }

    /// Sample count of the pass.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Check if any attachment slot is in use.
    pub fn has_attachments(&self) -> bool {
        self.colors.iter().any(|a| a.rt.is_some()) || self.depth_stencil.is_some()
    }

    /// Check if `rt` is attached (color or depth/stencil).
    pub(crate) fn attaches(&self, rt: Rt) -> bool {
        self.colors.iter().any(|a| a.rt == Some(rt))
            || self.depth_stencil.as_ref().is_some_and(|d| d.rt == rt)
    }
}

impl<Rt: GraphId> Default for PassDesc<Rt> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Rt {
        Invalid,
        Color,
        Depth,
        Aux,
    }

    impl GraphId for Rt {
        fn sentinel() -> Self {
            Rt::Invalid
        }
    }

    #[test]
    fn test_sentinel() {
        assert!(Rt::Invalid.is_sentinel());
        assert!(!Rt::Color.is_sentinel());
    }

    #[test]
    fn test_pass_desc_builder() {
        let desc = PassDesc::new()
            .with_color(ColorAttachment::new(Rt::Color).with_clear(ClearColor::BLACK))
            .with_depth_stencil(DepthStencilAttachment::new(Rt::Depth).with_clear_depth(1.0))
            .with_input(Rt::Aux)
            .with_samples(4);

        assert!(desc.has_attachments());
        assert_eq!(desc.samples(), 4);
        assert_eq!(desc.inputs(), &[Rt::Aux]);
        assert_eq!(desc.color_attachments()[0].rt(), Some(Rt::Color));
        assert!(matches!(
            desc.color_attachments()[0].load(),
            LoadOp::Clear(_)
        ));
        assert!(desc.color_attachments()[1].rt().is_none());
        assert_eq!(desc.depth_stencil().unwrap().rt(), Rt::Depth);
    }

    #[test]
    fn test_with_input_deduplicates() {
        let desc = PassDesc::<Rt>::new().with_input(Rt::Aux).with_input(Rt::Aux);
        assert_eq!(desc.inputs().len(), 1);
    }

    #[test]
    fn test_attaches() {
        let desc = PassDesc::new()
            .with_color(ColorAttachment::new(Rt::Color))
            .with_depth_stencil(DepthStencilAttachment::new(Rt::Depth));
        assert!(desc.attaches(Rt::Color));
        assert!(desc.attaches(Rt::Depth));
        assert!(!desc.attaches(Rt::Aux));
    }

    #[test]
    #[should_panic(expected = "sentinel")]
    fn test_sentinel_attachment_panics() {
        let _ = ColorAttachment::new(Rt::Invalid);
    }
}
