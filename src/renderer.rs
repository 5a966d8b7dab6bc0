//! Abstract renderer boundary.
//!
//! [`Renderer`] is the interface the render graph drives: resource creation
//! and deletion, render pass begin/end, transfers, layout transitions and
//! presentation. Backends (Vulkan, GL, the no-GPU [`NullRenderer`]) implement
//! it; the graph never talks to a GPU API directly.
//!
//! The trait is object safe — the graph takes `&mut dyn Renderer` so a single
//! graph type serves every backend.
//!
//! [`NullRenderer`]: crate::backend::NullRenderer

use thiserror::Error;

use crate::container::Handle;
use crate::types::{
    DepthLoadOp, ImageLayout, LoadOp, PipelineDesc, RenderTargetDesc, TextureFormat,
};

/// Errors a backend can report from resource creation.
///
/// Everything else on the boundary is fire-and-forget: deletion and command
/// recording either succeed or indicate a driver-level failure the backend
/// surfaces on its own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RendererError {
    #[error("failed to create {kind}: {message}")]
    CreationFailed {
        kind: &'static str,
        message: String,
    },
    #[error("out of device memory")]
    OutOfMemory,
    #[error("device lost")]
    DeviceLost,
}

// Handle marker types. Uninhabited: they exist only to keep the handle
// namespaces apart at compile time.

/// Marker for render target handles.
pub enum RenderTargetTag {}
/// Marker for render pass handles.
pub enum RenderPassTag {}
/// Marker for framebuffer handles.
pub enum FramebufferTag {}
/// Marker for pipeline handles.
pub enum PipelineTag {}
/// Marker for sampled-texture view handles.
pub enum TextureTag {}

/// Handle to a backend render target.
pub type RenderTargetHandle = Handle<RenderTargetTag>;
/// Handle to a backend render pass object.
pub type RenderPassHandle = Handle<RenderPassTag>;
/// Handle to a backend framebuffer.
pub type FramebufferHandle = Handle<FramebufferTag>;
/// Handle to a backend pipeline.
pub type PipelineHandle = Handle<PipelineTag>;
/// Handle to a sampled-texture view of a render target.
pub type TextureHandle = Handle<TextureTag>;

/// One color attachment of a backend render pass, with the layouts the graph
/// derived for it.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentDesc {
    pub format: TextureFormat,
    pub samples: u32,
    pub load: LoadOp,
    /// Layout the image is in when the pass begins.
    pub initial_layout: ImageLayout,
    /// Layout the pass leaves the image in.
    pub final_layout: ImageLayout,
}

/// The depth/stencil attachment of a backend render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthAttachmentDesc {
    pub format: TextureFormat,
    pub samples: u32,
    pub load: DepthLoadOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
}

/// Descriptor for creating a backend render pass object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderPassDesc {
    /// Debug name; merged passes carry the concatenated name.
    pub label: String,
    /// Color attachments in slot order, dead slots already removed.
    pub colors: Vec<AttachmentDesc>,
    /// Optional depth/stencil attachment.
    pub depth_stencil: Option<DepthAttachmentDesc>,
}

/// Descriptor for creating a framebuffer: the binding of a render pass's
/// attachment slots to actual render targets.
///
/// Dimensions are derived by the backend from the attached targets.
#[derive(Debug, Clone, PartialEq)]
pub struct FramebufferDesc {
    /// Render pass the framebuffer is compatible with.
    pub render_pass: RenderPassHandle,
    /// Attached render targets, color slots first, depth/stencil last.
    pub attachments: Vec<RenderTargetHandle>,
    /// Debug name.
    pub label: String,
}

/// Backend interface driven by the render graph.
///
/// All calls are issued from a single thread in strict sequential order.
/// Creation calls either succeed or return an error; the graph does not
/// retry. `wait_for_device_idle` may block for as long as the GPU needs.
pub trait Renderer {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    fn create_render_target(
        &mut self,
        desc: &RenderTargetDesc,
    ) -> Result<RenderTargetHandle, RendererError>;

    fn delete_render_target(&mut self, handle: RenderTargetHandle);

    fn create_render_pass(
        &mut self,
        desc: &RenderPassDesc,
    ) -> Result<RenderPassHandle, RendererError>;

    fn delete_render_pass(&mut self, handle: RenderPassHandle);

    fn create_framebuffer(
        &mut self,
        desc: &FramebufferDesc,
    ) -> Result<FramebufferHandle, RendererError>;

    fn delete_framebuffer(&mut self, handle: FramebufferHandle);

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle, RendererError>;

    fn delete_pipeline(&mut self, handle: PipelineHandle);

    /// Get a sampled-texture view of a render target through the given
    /// format. The same (target, format) pair always yields the same view.
    fn render_target_view(
        &mut self,
        handle: RenderTargetHandle,
        format: TextureFormat,
    ) -> TextureHandle;

    /// Begin a render pass against an explicit framebuffer.
    fn begin_render_pass(&mut self, pass: RenderPassHandle, framebuffer: FramebufferHandle);

    /// Begin a render pass against the swapchain-managed framebuffer.
    fn begin_render_pass_swapchain(&mut self, pass: RenderPassHandle);

    /// End the current render pass.
    fn end_render_pass(&mut self);

    /// Transition a render target between image layouts.
    fn layout_transition(&mut self, target: RenderTargetHandle, from: ImageLayout, to: ImageLayout);

    /// Copy between two single-sampled color targets.
    fn blit(&mut self, src: RenderTargetHandle, dst: RenderTargetHandle);

    /// Resolve a multisampled target into a single-sampled one.
    fn resolve_msaa(&mut self, src: RenderTargetHandle, dst: RenderTargetHandle);

    /// Resolve a multisampled target directly onto the presentable surface,
    /// leaving the surface in `final_layout`.
    fn resolve_msaa_to_swapchain(&mut self, src: RenderTargetHandle, final_layout: ImageLayout);

    /// Present the frame.
    fn present_frame(&mut self);

    /// Block until the device has finished all submitted work.
    fn wait_for_device_idle(&mut self);
}
