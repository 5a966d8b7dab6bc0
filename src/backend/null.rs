//! Recording no-op renderer.
//!
//! Implements [`Renderer`] without touching a GPU. Every command is validated
//! against the backend's own resource tables and appended to a call log, so
//! tests can build and render a graph and then assert on exactly what the
//! graph asked the backend to do.

use std::collections::HashMap;

use crate::container::{Handle, ResourceContainer};
use crate::renderer::{
    FramebufferDesc, FramebufferHandle, FramebufferTag, PipelineHandle, PipelineTag,
    RenderPassDesc, RenderPassHandle, RenderPassTag, RenderTargetHandle, RenderTargetTag,
    Renderer, RendererError, TextureHandle,
};
use crate::types::{ImageLayout, PipelineDesc, RenderTargetDesc, TextureFormat};

/// One recorded command, in issue order.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererCall {
    BeginRenderPass(RenderPassHandle, FramebufferHandle),
    BeginRenderPassSwapchain(RenderPassHandle),
    EndRenderPass,
    LayoutTransition(RenderTargetHandle, ImageLayout, ImageLayout),
    Blit(RenderTargetHandle, RenderTargetHandle),
    ResolveMsaa(RenderTargetHandle, RenderTargetHandle),
    ResolveMsaaToSwapchain(RenderTargetHandle, ImageLayout),
    PresentFrame,
    WaitForDeviceIdle,
}

struct NullRenderTarget {
    desc: RenderTargetDesc,
}

struct NullRenderPass {
    desc: RenderPassDesc,
}

struct NullFramebuffer {
    desc: FramebufferDesc,
}

struct NullPipeline {
    desc: PipelineDesc,
}

/// A [`Renderer`] that records instead of rendering.
///
/// Resources are stored in [`ResourceContainer`]s, so stale or double-deleted
/// handles panic the same way a validation layer would scream. Commands issued
/// between `begin_render_pass` calls are balance-checked.
#[derive(Default)]
pub struct NullRenderer {
    targets: ResourceContainer<NullRenderTarget, RenderTargetTag>,
    passes: ResourceContainer<NullRenderPass, RenderPassTag>,
    framebuffers: ResourceContainer<NullFramebuffer, FramebufferTag>,
    pipelines: ResourceContainer<NullPipeline, PipelineTag>,
    /// Stable view per (target, format) pair.
    views: HashMap<(RenderTargetHandle, TextureFormat), TextureHandle>,
    next_view_id: u64,
    calls: Vec<RendererCall>,
    render_passes_created: usize,
    framebuffers_created: usize,
    pipelines_created: usize,
    frames_presented: usize,
    in_render_pass: bool,
}

impl NullRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands recorded so far, in issue order.
    pub fn calls(&self) -> &[RendererCall] {
        &self.calls
    }

    /// Drop the recorded commands, keeping resources alive.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of render targets currently alive.
    pub fn render_target_count(&self) -> usize {
        self.targets.len()
    }

    /// Number of framebuffers currently alive.
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    /// Number of pipelines currently alive.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Total render passes ever created.
    pub fn render_passes_created(&self) -> usize {
        self.render_passes_created
    }

    /// Total framebuffers ever created.
    pub fn framebuffers_created(&self) -> usize {
        self.framebuffers_created
    }

    /// Total pipelines ever created.
    pub fn pipelines_created(&self) -> usize {
        self.pipelines_created
    }

    /// Total frames presented.
    pub fn frames_presented(&self) -> usize {
        self.frames_presented
    }

    /// The descriptor a render pass was created with.
    pub fn render_pass_desc(&self, handle: RenderPassHandle) -> &RenderPassDesc {
        &self.passes.get(handle).desc
    }

    /// The descriptor a framebuffer was created with.
    pub fn framebuffer_desc(&self, handle: FramebufferHandle) -> &FramebufferDesc {
        &self.framebuffers.get(handle).desc
    }

    /// The descriptor a render target was created with.
    pub fn render_target_desc(&self, handle: RenderTargetHandle) -> &RenderTargetDesc {
        &self.targets.get(handle).desc
    }

    /// The descriptor a pipeline was created with.
    pub fn pipeline_desc(&self, handle: PipelineHandle) -> &PipelineDesc {
        &self.pipelines.get(handle).desc
    }

    /// Create a standalone render target, as an application would for a
    /// history buffer bound to the graph as an external target.
    pub fn create_external_target(&mut self, desc: RenderTargetDesc) -> RenderTargetHandle {
        self.targets.add(NullRenderTarget { desc })
    }
}

impl Renderer for NullRenderer {
    fn name(&self) -> &'static str {
        "null"
    }

    fn create_render_target(
        &mut self,
        desc: &RenderTargetDesc,
    ) -> Result<RenderTargetHandle, RendererError> {
        let handle = self.targets.add(NullRenderTarget { desc: desc.clone() });
        log::trace!("null: create_render_target {handle:?} {desc:?}");
        Ok(handle)
    }

    fn delete_render_target(&mut self, handle: RenderTargetHandle) {
        log::trace!("null: delete_render_target {handle:?}");
        let deleted = handle;
        let mut handle = handle;
        self.targets.remove(&mut handle);
        self.views.retain(|(target, _), _| *target != deleted);
    }

    fn create_render_pass(
        &mut self,
        desc: &RenderPassDesc,
    ) -> Result<RenderPassHandle, RendererError> {
        let handle = self.passes.add(NullRenderPass { desc: desc.clone() });
        self.render_passes_created += 1;
        log::trace!("null: create_render_pass {handle:?} '{}'", desc.label);
        Ok(handle)
    }

    fn delete_render_pass(&mut self, handle: RenderPassHandle) {
        log::trace!("null: delete_render_pass {handle:?}");
        let mut handle = handle;
        self.passes.remove(&mut handle);
    }

    fn create_framebuffer(
        &mut self,
        desc: &FramebufferDesc,
    ) -> Result<FramebufferHandle, RendererError> {
        assert!(
            self.passes.contains(desc.render_pass),
            "framebuffer references unknown render pass {:?}",
            desc.render_pass
        );
        for &attachment in &desc.attachments {
            assert!(
                self.targets.contains(attachment),
                "framebuffer references unknown render target {attachment:?}"
            );
        }
        let handle = self.framebuffers.add(NullFramebuffer { desc: desc.clone() });
        self.framebuffers_created += 1;
        log::trace!("null: create_framebuffer {handle:?} '{}'", desc.label);
        Ok(handle)
    }

    fn delete_framebuffer(&mut self, handle: FramebufferHandle) {
        log::trace!("null: delete_framebuffer {handle:?}");
        let mut handle = handle;
        self.framebuffers.remove(&mut handle);
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle, RendererError> {
        assert!(
            self.passes.contains(desc.render_pass),
            "pipeline references unknown render pass {:?}",
            desc.render_pass
        );
        let handle = self.pipelines.add(NullPipeline { desc: desc.clone() });
        self.pipelines_created += 1;
        log::trace!("null: create_pipeline {handle:?}");
        Ok(handle)
    }

    fn delete_pipeline(&mut self, handle: PipelineHandle) {
        log::trace!("null: delete_pipeline {handle:?}");
        let mut handle = handle;
        self.pipelines.remove(&mut handle);
    }

    fn render_target_view(
        &mut self,
        handle: RenderTargetHandle,
        format: TextureFormat,
    ) -> TextureHandle {
        assert!(
            self.targets.contains(handle),
            "view requested for unknown render target {handle:?}"
        );
        *self.views.entry((handle, format)).or_insert_with(|| {
            self.next_view_id += 1;
            Handle::from_id(self.next_view_id)
        })
    }

    fn begin_render_pass(&mut self, pass: RenderPassHandle, framebuffer: FramebufferHandle) {
        assert!(!self.in_render_pass, "render pass already open");
        assert!(self.passes.contains(pass), "unknown render pass {pass:?}");
        assert!(
            self.framebuffers.contains(framebuffer),
            "unknown framebuffer {framebuffer:?}"
        );
        self.in_render_pass = true;
        log::trace!("null: begin_render_pass {pass:?} {framebuffer:?}");
        self.calls.push(RendererCall::BeginRenderPass(pass, framebuffer));
    }

    fn begin_render_pass_swapchain(&mut self, pass: RenderPassHandle) {
        assert!(!self.in_render_pass, "render pass already open");
        assert!(self.passes.contains(pass), "unknown render pass {pass:?}");
        self.in_render_pass = true;
        log::trace!("null: begin_render_pass_swapchain {pass:?}");
        self.calls.push(RendererCall::BeginRenderPassSwapchain(pass));
    }

    fn end_render_pass(&mut self) {
        assert!(self.in_render_pass, "no render pass open");
        self.in_render_pass = false;
        log::trace!("null: end_render_pass");
        self.calls.push(RendererCall::EndRenderPass);
    }

    fn layout_transition(
        &mut self,
        target: RenderTargetHandle,
        from: ImageLayout,
        to: ImageLayout,
    ) {
        assert!(!self.in_render_pass, "layout transition inside a render pass");
        assert!(self.targets.contains(target), "unknown render target {target:?}");
        log::trace!("null: layout_transition {target:?} {from:?} -> {to:?}");
        self.calls.push(RendererCall::LayoutTransition(target, from, to));
    }

    fn blit(&mut self, src: RenderTargetHandle, dst: RenderTargetHandle) {
        assert!(!self.in_render_pass, "blit inside a render pass");
        assert!(self.targets.contains(src), "unknown render target {src:?}");
        assert!(self.targets.contains(dst), "unknown render target {dst:?}");
        log::trace!("null: blit {src:?} -> {dst:?}");
        self.calls.push(RendererCall::Blit(src, dst));
    }

    fn resolve_msaa(&mut self, src: RenderTargetHandle, dst: RenderTargetHandle) {
        assert!(!self.in_render_pass, "resolve inside a render pass");
        assert!(self.targets.contains(src), "unknown render target {src:?}");
        assert!(self.targets.contains(dst), "unknown render target {dst:?}");
        log::trace!("null: resolve_msaa {src:?} -> {dst:?}");
        self.calls.push(RendererCall::ResolveMsaa(src, dst));
    }

    fn resolve_msaa_to_swapchain(&mut self, src: RenderTargetHandle, final_layout: ImageLayout) {
        assert!(!self.in_render_pass, "resolve inside a render pass");
        assert!(self.targets.contains(src), "unknown render target {src:?}");
        log::trace!("null: resolve_msaa_to_swapchain {src:?} -> {final_layout:?}");
        self.calls
            .push(RendererCall::ResolveMsaaToSwapchain(src, final_layout));
    }

    fn present_frame(&mut self) {
        assert!(!self.in_render_pass, "present inside a render pass");
        self.frames_presented += 1;
        log::trace!("null: present_frame #{}", self.frames_presented);
        self.calls.push(RendererCall::PresentFrame);
    }

    fn wait_for_device_idle(&mut self) {
        log::trace!("null: wait_for_device_idle");
        self.calls.push(RendererCall::WaitForDeviceIdle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LoadOp;

    #[test]
    fn test_create_and_delete_resources() {
        let mut renderer = NullRenderer::new();
        let target = renderer
            .create_render_target(&RenderTargetDesc::new(
                64,
                64,
                TextureFormat::Rgba8Unorm,
            ))
            .unwrap();
        assert_eq!(renderer.render_target_count(), 1);

        let pass = renderer
            .create_render_pass(&RenderPassDesc {
                label: "pass".to_string(),
                colors: vec![crate::renderer::AttachmentDesc {
                    format: TextureFormat::Rgba8Unorm,
                    samples: 1,
                    load: LoadOp::DontCare,
                    initial_layout: ImageLayout::Undefined,
                    final_layout: ImageLayout::ShaderRead,
                }],
                depth_stencil: None,
            })
            .unwrap();
        let framebuffer = renderer
            .create_framebuffer(&FramebufferDesc {
                render_pass: pass,
                attachments: vec![target],
                label: "fb".to_string(),
            })
            .unwrap();

        renderer.begin_render_pass(pass, framebuffer);
        renderer.end_render_pass();
        renderer.present_frame();

        assert_eq!(
            renderer.calls(),
            &[
                RendererCall::BeginRenderPass(pass, framebuffer),
                RendererCall::EndRenderPass,
                RendererCall::PresentFrame,
            ]
        );
        assert_eq!(renderer.frames_presented(), 1);

        renderer.delete_framebuffer(framebuffer);
        renderer.delete_render_pass(pass);
        renderer.delete_render_target(target);
        assert_eq!(renderer.render_target_count(), 0);
        assert_eq!(renderer.framebuffer_count(), 0);
    }

    #[test]
    fn test_views_are_stable_per_format() {
        let mut renderer = NullRenderer::new();
        let target = renderer
            .create_render_target(&RenderTargetDesc::new(
                32,
                32,
                TextureFormat::Rgba8Unorm,
            ))
            .unwrap();

        let unorm = renderer.render_target_view(target, TextureFormat::Rgba8Unorm);
        let srgb = renderer.render_target_view(target, TextureFormat::Rgba8UnormSrgb);
        assert_ne!(unorm, srgb);
        assert_eq!(
            renderer.render_target_view(target, TextureFormat::Rgba8Unorm),
            unorm
        );
    }

    #[test]
    #[should_panic(expected = "no render pass open")]
    fn test_unbalanced_end_panics() {
        let mut renderer = NullRenderer::new();
        renderer.end_render_pass();
    }
}
