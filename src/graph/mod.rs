//! Declarative render graph.
//!
//! The application registers render targets and render passes while the graph
//! is in the Building state, designates one target for presentation, then
//! calls [`RenderGraph::build`]. Building derives every image layout
//! transition by walking the operation list backwards, eliminates attachments
//! nothing consumes, merges adjacent compatible passes and creates the
//! backend objects. After that [`RenderGraph::render`] replays the schedule
//! once per frame, invoking the registered callbacks.
//!
//! ```
//! use framegraph::{
//!     ClearColor, ColorAttachment, GraphId, NullRenderer, PassDesc, RenderGraph,
//!     RenderTargetDesc, TextureFormat,
//! };
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Rt { Invalid, Scene, Backbuffer }
//! impl GraphId for Rt { fn sentinel() -> Self { Rt::Invalid } }
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Rp { Invalid, Scene, Post }
//! impl GraphId for Rp { fn sentinel() -> Self { Rp::Invalid } }
//!
//! let mut renderer = NullRenderer::new();
//! let mut graph = RenderGraph::new();
//!
//! graph.render_target(Rt::Scene, RenderTargetDesc::new(1920, 1080, TextureFormat::Rgba8Unorm));
//! graph.render_target(Rt::Backbuffer, RenderTargetDesc::new(1920, 1080, TextureFormat::Bgra8Unorm));
//! graph.render_pass(
//!     Rp::Scene,
//!     "scene",
//!     PassDesc::new().with_color(ColorAttachment::new(Rt::Scene).with_clear(ClearColor::BLACK)),
//!     |_renderer, _id, _resources| Ok(()),
//! );
//! graph.render_pass(
//!     Rp::Post,
//!     "post",
//!     PassDesc::new().with_color(ColorAttachment::new(Rt::Backbuffer)).with_input(Rt::Scene),
//!     |_renderer, _id, _resources| Ok(()),
//! );
//! graph.present_render_target(Rt::Backbuffer);
//!
//! graph.build(&mut renderer)?;
//! graph.render(&mut renderer)?;
//! # Ok::<(), framegraph::GraphError>(())
//! ```

mod compile;
mod operation;
mod resources;
mod target;

pub use operation::{Operation, PassCallback, RenderPassOp};
pub use resources::PassResources;
pub use target::{ColorAttachment, DepthStencilAttachment, GraphId, PassDesc};

use std::collections::HashMap;

use crate::error::GraphError;
use crate::renderer::{
    AttachmentDesc, DepthAttachmentDesc, FramebufferDesc, FramebufferHandle, PipelineHandle,
    RenderPassDesc, RenderPassHandle, RenderTargetHandle, Renderer, TextureHandle,
};
use crate::types::{ImageLayout, PipelineDesc, RenderTargetDesc, TextureFormat};
use resources::ResolvedInput;
use target::LogicalTarget;

/// Lifecycle state of a [`RenderGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphState {
    /// Targets and passes are being registered; rendering is not possible.
    #[default]
    Building,
    /// The graph is built; `render()`, `bind_external_rt()`,
    /// `get_or_create_pipeline()` and `reset()` are legal.
    Ready,
    /// A `render()` call is in progress.
    Rendering,
}

/// A render graph generic over the caller's render target and render pass
/// identifier types.
///
/// Misuse of the API (calls outside the legal state, unregistered targets,
/// sentinel identifiers, double-binding) is a programming error and panics.
/// Runtime failures of the backend or of render callbacks surface as
/// [`GraphError`].
pub struct RenderGraph<Rt: GraphId, Rp: GraphId> {
    state: GraphState,
    targets: HashMap<Rt, LogicalTarget>,
    operations: Vec<Operation<Rt, Rp>>,
    final_target: Option<Rt>,
    has_external: bool,
    /// Pipelines created through `get_or_create_pipeline`, keyed by their
    /// full description. Dropped on `build()` and `reset()`.
    pipelines: HashMap<PipelineDesc, PipelineHandle>,
}

impl<Rt: GraphId, Rp: GraphId> RenderGraph<Rt, Rp> {
    /// Create an empty graph in the Building state.
    pub fn new() -> Self {
        Self {
            state: GraphState::Building,
            targets: HashMap::new(),
            operations: Vec::new(),
            final_target: None,
            has_external: false,
            pipelines: HashMap::new(),
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> GraphState {
        self.state
    }

    /// The scheduled operations, rewritten and annotated by `build()`.
    pub fn operations(&self) -> &[Operation<Rt, Rp>] {
        &self.operations
    }

    /// Number of scheduled operations.
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    // ============================================================
    // Building
    // ============================================================

    /// Register an internal render target. The graph creates and owns its
    /// backing image from `build()` until `reset()`.
    pub fn render_target(&mut self, id: Rt, desc: RenderTargetDesc) {
        self.assert_building("render_target");
        assert!(
            !id.is_sentinel(),
            "cannot register the sentinel render target id"
        );
        assert!(
            !self.targets.contains_key(&id),
            "render target {id:?} is already registered"
        );
        self.targets.insert(
            id,
            LogicalTarget::Internal {
                desc,
                handle: RenderTargetHandle::NULL,
            },
        );
    }

    /// Register an external render target. The backing image lives outside
    /// the graph and must be injected with [`bind_external_rt`] every frame;
    /// `initial_layout` is the layout the caller guarantees on entry to
    /// `render()` and `final_layout` the layout the graph leaves it in.
    ///
    /// [`bind_external_rt`]: RenderGraph::bind_external_rt
    pub fn external_render_target(
        &mut self,
        id: Rt,
        format: TextureFormat,
        initial_layout: ImageLayout,
        final_layout: ImageLayout,
    ) {
        self.assert_building("external_render_target");
        assert!(
            !id.is_sentinel(),
            "cannot register the sentinel render target id"
        );
        assert!(
            !self.targets.contains_key(&id),
            "render target {id:?} is already registered"
        );
        self.targets.insert(
            id,
            LogicalTarget::External {
                format,
                initial_layout,
                final_layout,
                bound: RenderTargetHandle::NULL,
            },
        );
        self.has_external = true;
    }

    /// Register a render pass. The callback runs once per `render()` call
    /// while the pass is open; merged passes run all their callbacks in
    /// registration order.
    pub fn render_pass<F>(&mut self, id: Rp, name: impl Into<String>, desc: PassDesc<Rt>, callback: F)
    where
        F: FnMut(&mut dyn Renderer, Rp, &PassResources<Rt>) -> Result<(), GraphError> + 'static,
    {
        self.assert_building("render_pass");
        assert!(!id.is_sentinel(), "cannot register the sentinel render pass id");
        let name = name.into();
        assert!(
            desc.has_attachments(),
            "render pass '{name}' has no attachments"
        );
        self.operations.push(Operation::RenderPass(RenderPassOp {
            id,
            name,
            desc,
            callbacks: vec![Box::new(callback)],
            pass_handle: RenderPassHandle::NULL,
            framebuffer: FramebufferHandle::NULL,
            external_attachments: false,
        }));
    }

    /// Schedule a copy from one color target into another.
    pub fn blit(&mut self, src: Rt, dst: Rt) {
        self.assert_building("blit");
        assert!(src != dst, "blit source and destination are the same target");
        let src_format = self.registered(src).format();
        let dst_format = self.registered(dst).format();
        assert!(
            src_format.is_color() && dst_format.is_color(),
            "blit requires color targets, got {src_format:?} -> {dst_format:?}"
        );
        self.operations.push(Operation::Blit {
            src,
            dst,
            final_layout: ImageLayout::Undefined,
        });
    }

    /// Schedule a resolve of a multisampled target into a single-sampled one
    /// of the same format. Resolving into the designated present target uses
    /// the backend's direct-to-swapchain path.
    pub fn resolve_msaa(&mut self, src: Rt, dst: Rt) {
        self.assert_building("resolve_msaa");
        assert!(
            src != dst,
            "resolve source and destination are the same target"
        );
        let src_target = self.registered(src);
        if let LogicalTarget::Internal { desc, .. } = src_target {
            assert!(desc.samples > 1, "resolve source {src:?} is not multisampled");
        }
        let src_format = src_target.format();
        let dst_target = self.registered(dst);
        if let LogicalTarget::Internal { desc, .. } = dst_target {
            assert!(
                desc.samples == 1,
                "resolve destination {dst:?} is multisampled"
            );
        }
        let dst_format = dst_target.format();
        assert!(
            src_format == dst_format,
            "resolve requires matching formats, got {src_format:?} -> {dst_format:?}"
        );
        self.operations.push(Operation::ResolveMsaa {
            src,
            dst,
            final_layout: ImageLayout::Undefined,
        });
    }

    /// Designate the render target that is presented at the end of every
    /// frame. Must be an internal target; the backend reads it when
    /// `present_frame()` runs.
    pub fn present_render_target(&mut self, id: Rt) {
        self.assert_building("present_render_target");
        let target = self.registered(id);
        assert!(
            !target.is_external(),
            "the present target must be an internal render target"
        );
        assert!(
            self.final_target.is_none(),
            "present target is already set to {:?}",
            self.final_target.unwrap()
        );
        self.final_target = Some(id);
    }

    /// Compile the graph: derive layouts, eliminate dead attachments, merge
    /// adjacent compatible passes and create the backend objects. Moves the
    /// graph to the Ready state.
    pub fn build(&mut self, renderer: &mut dyn Renderer) -> Result<(), GraphError> {
        self.assert_building("build");
        assert!(
            self.final_target.is_some(),
            "no present target designated; call present_render_target() before build()"
        );
        self.validate();

        // Merging changes adjacency and consumer sets, so layouts are
        // re-derived from scratch after every single merge until a pass over
        // the whole list finds nothing left to merge.
        let mut merges = 0usize;
        loop {
            self.propagate_layouts();
            if !self.merge_once() {
                break;
            }
            merges += 1;
        }

        self.materialize(renderer)?;
        for (_, pipeline) in self.pipelines.drain() {
            renderer.delete_pipeline(pipeline);
        }
        self.state = GraphState::Ready;
        log::debug!(
            "render graph built: {} operations after {merges} merges",
            self.operations.len()
        );
        Ok(())
    }

    // ============================================================
    // Ready
    // ============================================================

    /// Bind the backing image of an external render target for the upcoming
    /// frame. Bindings are cleared after every `render()` call; binding the
    /// same target twice within one frame panics.
    pub fn bind_external_rt(&mut self, id: Rt, handle: RenderTargetHandle) {
        assert!(
            self.state == GraphState::Ready,
            "bind_external_rt() is only legal in the Ready state"
        );
        assert!(!handle.is_null(), "cannot bind a null render target handle");
        let target = self
            .targets
            .get_mut(&id)
            .unwrap_or_else(|| panic!("render target {id:?} is not registered"));
        match target {
            LogicalTarget::External { bound, .. } => {
                assert!(
                    bound.is_null(),
                    "external render target {id:?} is already bound for this frame"
                );
                *bound = handle;
            }
            LogicalTarget::Internal { .. } => {
                panic!("render target {id:?} is not external")
            }
        }
    }

    /// Get a pipeline for `desc`, creating it on first request. Pipelines are
    /// cached by their full description and live until `build()` or `reset()`.
    pub fn get_or_create_pipeline(
        &mut self,
        renderer: &mut dyn Renderer,
        desc: &PipelineDesc,
    ) -> Result<PipelineHandle, GraphError> {
        assert!(
            self.state == GraphState::Ready,
            "get_or_create_pipeline() is only legal in the Ready state"
        );
        if let Some(&handle) = self.pipelines.get(desc) {
            return Ok(handle);
        }
        let handle = renderer.create_pipeline(desc)?;
        self.pipelines.insert(desc.clone(), handle);
        Ok(handle)
    }

    /// Replay the schedule once: run every operation in order, invoke the
    /// pass callbacks and present the final target.
    ///
    /// A failing callback does not abort the frame. The first error is
    /// captured and returned after the full schedule has replayed and the
    /// per-frame cleanup (external binding clearing, per-frame framebuffer
    /// deletion) has run; later errors are logged and dropped.
    pub fn render(&mut self, renderer: &mut dyn Renderer) -> Result<(), GraphError> {
        assert!(
            self.state == GraphState::Ready,
            "render() is only legal in the Ready state"
        );
        if self.has_external {
            for (&id, target) in &self.targets {
                if let LogicalTarget::External { bound, .. } = target {
                    assert!(
                        !bound.is_null(),
                        "external render target {id:?} is not bound; call bind_external_rt() before render()"
                    );
                }
            }
        }
        self.state = GraphState::Rendering;

        let result = self.replay(renderer);

        // Per-frame cleanup runs whether or not the frame failed.
        for target in self.targets.values_mut() {
            if let LogicalTarget::External { bound, .. } = target {
                *bound = RenderTargetHandle::NULL;
            }
        }
        for op in &mut self.operations {
            if let Operation::RenderPass(op) = op {
                if op.external_attachments && !op.framebuffer.is_null() {
                    renderer.delete_framebuffer(op.framebuffer);
                    op.framebuffer = FramebufferHandle::NULL;
                }
            }
        }
        self.state = GraphState::Ready;
        result
    }

    /// Tear the graph down to the Building state: wait for the device, delete
    /// every backend object the graph created and forget all registrations.
    pub fn reset(&mut self, renderer: &mut dyn Renderer) {
        assert!(
            self.state == GraphState::Ready,
            "reset() is only legal in the Ready state"
        );
        renderer.wait_for_device_idle();
        for op in &mut self.operations {
            if let Operation::RenderPass(op) = op {
                if !op.framebuffer.is_null() {
                    renderer.delete_framebuffer(op.framebuffer);
                }
                if !op.pass_handle.is_null() {
                    renderer.delete_render_pass(op.pass_handle);
                }
            }
        }
        self.operations.clear();
        for (_, target) in self.targets.drain() {
            if let LogicalTarget::Internal { handle, .. } = target {
                if !handle.is_null() {
                    renderer.delete_render_target(handle);
                }
            }
        }
        for (_, pipeline) in self.pipelines.drain() {
            renderer.delete_pipeline(pipeline);
        }
        self.final_target = None;
        self.has_external = false;
        self.state = GraphState::Building;
        log::debug!("render graph reset");
    }

    // ============================================================
    // Internals
    // ============================================================

    fn assert_building(&self, what: &str) {
        assert!(
            self.state == GraphState::Building,
            "{what}() is only legal in the Building state"
        );
    }

    fn registered(&self, id: Rt) -> &LogicalTarget {
        registered(&self.targets, id)
    }

    /// Check cross-references the building methods could not check alone:
    /// every render target a pass names must have been registered.
    fn validate(&self) {
        for op in &self.operations {
            if let Operation::RenderPass(op) = op {
                for att in op.desc.colors.iter() {
                    if let Some(rt) = att.rt {
                        registered(&self.targets, rt);
                    }
                }
                if let Some(depth) = &op.desc.depth_stencil {
                    registered(&self.targets, depth.rt);
                }
                for &input in &op.desc.inputs {
                    registered(&self.targets, input);
                }
            }
        }
    }

    /// Create the backend objects for the compiled schedule.
    fn materialize(&mut self, renderer: &mut dyn Renderer) -> Result<(), GraphError> {
        for target in self.targets.values_mut() {
            if let LogicalTarget::Internal { desc, handle } = target {
                *handle = renderer.create_render_target(desc)?;
            }
        }

        for op in &mut self.operations {
            let Operation::RenderPass(op) = op else { continue };
            op.external_attachments = op
                .desc
                .colors
                .iter()
                .filter_map(|att| att.rt)
                .chain(op.desc.depth_stencil.as_ref().map(|d| d.rt))
                .any(|rt| registered(&self.targets, rt).is_external());

            let desc = render_pass_desc(&self.targets, op);
            op.pass_handle = renderer.create_render_pass(&desc)?;

            // Passes with external attachments get a fresh framebuffer every
            // frame, once the bindings are known.
            if !op.external_attachments {
                op.framebuffer = renderer.create_framebuffer(&framebuffer_desc(&self.targets, op))?;
            }
        }
        Ok(())
    }

    fn replay(&mut self, renderer: &mut dyn Renderer) -> Result<(), GraphError> {
        for op in &mut self.operations {
            let Operation::RenderPass(op) = op else { continue };
            if op.external_attachments {
                op.framebuffer = renderer.create_framebuffer(&framebuffer_desc(&self.targets, op))?;
            }
        }

        let mut first_error = None;
        for op in &mut self.operations {
            match op {
                Operation::Blit {
                    src,
                    dst,
                    final_layout,
                } => {
                    let src_handle = bound_handle(&self.targets, *src);
                    let dst_handle = bound_handle(&self.targets, *dst);
                    renderer.layout_transition(
                        dst_handle,
                        ImageLayout::Undefined,
                        ImageLayout::TransferDst,
                    );
                    renderer.blit(src_handle, dst_handle);
                    renderer.layout_transition(dst_handle, ImageLayout::TransferDst, *final_layout);
                }
                Operation::ResolveMsaa {
                    src,
                    dst,
                    final_layout,
                } => {
                    let src_handle = bound_handle(&self.targets, *src);
                    if Some(*dst) == self.final_target {
                        renderer.resolve_msaa_to_swapchain(src_handle, *final_layout);
                    } else {
                        let dst_handle = bound_handle(&self.targets, *dst);
                        renderer.layout_transition(
                            dst_handle,
                            ImageLayout::Undefined,
                            ImageLayout::TransferDst,
                        );
                        renderer.resolve_msaa(src_handle, dst_handle);
                        renderer.layout_transition(
                            dst_handle,
                            ImageLayout::TransferDst,
                            *final_layout,
                        );
                    }
                }
                Operation::RenderPass(op) => {
                    renderer.begin_render_pass(op.pass_handle, op.framebuffer);
                    let resources = resolve_inputs(renderer, &self.targets, op);
                    for callback in &mut op.callbacks {
                        if let Err(err) = callback(renderer, op.id, &resources) {
                            if first_error.is_none() {
                                log::error!("render pass '{}' callback failed: {err}", op.name);
                                first_error = Some(err);
                            } else {
                                log::warn!(
                                    "render pass '{}' callback failed after an earlier failure, dropping: {err}",
                                    op.name
                                );
                            }
                        }
                    }
                    renderer.end_render_pass();
                }
            }
        }

        renderer.present_frame();
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<Rt: GraphId, Rp: GraphId> Default for RenderGraph<Rt, Rp> {
    fn default() -> Self {
        Self::new()
    }
}

fn registered<Rt: GraphId>(targets: &HashMap<Rt, LogicalTarget>, id: Rt) -> &LogicalTarget {
    targets
        .get(&id)
        .unwrap_or_else(|| panic!("render target {id:?} is not registered"))
}

/// The handle a target resolves to this frame, asserting it exists.
fn bound_handle<Rt: GraphId>(
    targets: &HashMap<Rt, LogicalTarget>,
    id: Rt,
) -> RenderTargetHandle {
    let target = registered(targets, id);
    let handle = target.current_handle();
    if target.is_external() {
        assert!(
            !handle.is_null(),
            "external render target {id:?} is not bound; call bind_external_rt() before render()"
        );
    } else {
        assert!(!handle.is_null(), "render target {id:?} has no backing image");
    }
    handle
}

fn render_pass_desc<Rt: GraphId, Rp: GraphId>(
    targets: &HashMap<Rt, LogicalTarget>,
    op: &RenderPassOp<Rt, Rp>,
) -> RenderPassDesc {
    let colors = op
        .desc
        .colors
        .iter()
        .filter_map(|att| {
            let rt = att.rt?;
            Some(AttachmentDesc {
                format: registered(targets, rt).format(),
                samples: op.desc.samples,
                load: att.load,
                initial_layout: att.initial_layout,
                final_layout: att.final_layout,
            })
        })
        .collect();
    let depth_stencil = op.desc.depth_stencil.as_ref().map(|att| DepthAttachmentDesc {
        format: registered(targets, att.rt).format(),
        samples: op.desc.samples,
        load: att.load,
        initial_layout: att.initial_layout,
        final_layout: att.final_layout,
    });
    RenderPassDesc {
        label: op.name.clone(),
        colors,
        depth_stencil,
    }
}

fn framebuffer_desc<Rt: GraphId, Rp: GraphId>(
    targets: &HashMap<Rt, LogicalTarget>,
    op: &RenderPassOp<Rt, Rp>,
) -> FramebufferDesc {
    let mut attachments = Vec::new();
    for att in op.desc.colors.iter() {
        if let Some(rt) = att.rt {
            attachments.push(bound_handle(targets, rt));
        }
    }
    if let Some(depth) = &op.desc.depth_stencil {
        attachments.push(bound_handle(targets, depth.rt));
    }
    FramebufferDesc {
        render_pass: op.pass_handle,
        attachments,
        label: format!("{} framebuffer", op.name),
    }
}

/// Resolve a pass's declared input targets to sampled-texture views.
fn resolve_inputs<Rt: GraphId, Rp: GraphId>(
    renderer: &mut dyn Renderer,
    targets: &HashMap<Rt, LogicalTarget>,
    op: &RenderPassOp<Rt, Rp>,
) -> PassResources<Rt> {
    let mut inputs = HashMap::new();
    for &rt in &op.desc.inputs {
        let target = registered(targets, rt);
        let handle = bound_handle(targets, rt);
        let primary_format = target.format();
        let primary: TextureHandle = renderer.render_target_view(handle, primary_format);
        let extra = match target {
            LogicalTarget::Internal { desc, .. } => desc
                .extra_view_format
                .map(|format| (format, renderer.render_target_view(handle, format))),
            LogicalTarget::External { .. } => None,
        };
        inputs.insert(
            rt,
            ResolvedInput {
                primary,
                primary_format,
                extra,
            },
        );
    }
    PassResources::new(op.name.clone(), inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullRenderer;
    use crate::types::ClearColor;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Rt {
        Invalid,
        Color,
        Backbuffer,
        History,
    }

    impl GraphId for Rt {
        fn sentinel() -> Self {
            Rt::Invalid
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Rp {
        Invalid,
        Scene,
        Post,
    }

    impl GraphId for Rp {
        fn sentinel() -> Self {
            Rp::Invalid
        }
    }

    fn ok_callback(
    ) -> impl FnMut(&mut dyn Renderer, Rp, &PassResources<Rt>) -> Result<(), GraphError> + 'static
    {
        |_renderer, _id, _resources| Ok(())
    }

    /// Scene renders into Color, Post samples it and writes the backbuffer.
    fn two_pass_graph() -> RenderGraph<Rt, Rp> {
        let mut graph = RenderGraph::new();
        graph.render_target(
            Rt::Color,
            RenderTargetDesc::new(64, 64, TextureFormat::Rgba8Unorm),
        );
        graph.render_target(
            Rt::Backbuffer,
            RenderTargetDesc::new(64, 64, TextureFormat::Bgra8Unorm),
        );
        graph.render_pass(
            Rp::Scene,
            "scene",
            PassDesc::new()
                .with_color(ColorAttachment::new(Rt::Color).with_clear(ClearColor::BLACK)),
            ok_callback(),
        );
        graph.render_pass(
            Rp::Post,
            "post",
            PassDesc::new()
                .with_color(ColorAttachment::new(Rt::Backbuffer))
                .with_input(Rt::Color),
            ok_callback(),
        );
        graph.present_render_target(Rt::Backbuffer);
        graph
    }

    #[test]
    fn test_build_moves_to_ready() {
        let mut renderer = NullRenderer::new();
        let mut graph = two_pass_graph();
        assert_eq!(graph.state(), GraphState::Building);
        graph.build(&mut renderer).unwrap();
        assert_eq!(graph.state(), GraphState::Ready);
        assert_eq!(graph.operation_count(), 2);
    }

    #[test]
    fn test_render_returns_to_ready() {
        let mut renderer = NullRenderer::new();
        let mut graph = two_pass_graph();
        graph.build(&mut renderer).unwrap();
        graph.render(&mut renderer).unwrap();
        assert_eq!(graph.state(), GraphState::Ready);
        assert_eq!(renderer.frames_presented(), 1);
        graph.render(&mut renderer).unwrap();
        assert_eq!(renderer.frames_presented(), 2);
    }

    #[test]
    fn test_reset_allows_rebuild() {
        let mut renderer = NullRenderer::new();
        let mut graph = two_pass_graph();
        graph.build(&mut renderer).unwrap();
        graph.reset(&mut renderer);
        assert_eq!(graph.state(), GraphState::Building);
        assert_eq!(graph.operation_count(), 0);
        // All graph-created backend objects are gone.
        assert_eq!(renderer.render_target_count(), 0);
        assert_eq!(renderer.framebuffer_count(), 0);

        graph.render_target(
            Rt::Backbuffer,
            RenderTargetDesc::new(32, 32, TextureFormat::Bgra8Unorm),
        );
        graph.render_pass(
            Rp::Post,
            "post",
            PassDesc::new()
                .with_color(ColorAttachment::new(Rt::Backbuffer).with_clear(ClearColor::BLACK)),
            ok_callback(),
        );
        graph.present_render_target(Rt::Backbuffer);
        graph.build(&mut renderer).unwrap();
        graph.render(&mut renderer).unwrap();
    }

    #[test]
    fn test_pipeline_cache_returns_same_handle() {
        let mut renderer = NullRenderer::new();
        let mut graph = two_pass_graph();
        graph.build(&mut renderer).unwrap();

        let pass = graph.operations()[0].as_render_pass().unwrap().pass_handle();
        let desc = PipelineDesc::new("fullscreen", "blit", pass).with_label("scene pipeline");
        let first = graph.get_or_create_pipeline(&mut renderer, &desc).unwrap();
        let second = graph.get_or_create_pipeline(&mut renderer, &desc).unwrap();
        assert_eq!(first, second);
        assert_eq!(renderer.pipelines_created(), 1);

        graph.reset(&mut renderer);
        assert_eq!(renderer.pipeline_count(), 0);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_registration_panics() {
        let mut graph = RenderGraph::<Rt, Rp>::new();
        graph.render_target(
            Rt::Color,
            RenderTargetDesc::new(64, 64, TextureFormat::Rgba8Unorm),
        );
        graph.render_target(
            Rt::Color,
            RenderTargetDesc::new(64, 64, TextureFormat::Rgba8Unorm),
        );
    }

    #[test]
    #[should_panic(expected = "only legal in the Building state")]
    fn test_register_after_build_panics() {
        let mut renderer = NullRenderer::new();
        let mut graph = two_pass_graph();
        graph.build(&mut renderer).unwrap();
        graph.render_target(
            Rt::History,
            RenderTargetDesc::new(64, 64, TextureFormat::Rgba8Unorm),
        );
    }

    #[test]
    #[should_panic(expected = "no present target")]
    fn test_build_without_present_target_panics() {
        let mut renderer = NullRenderer::new();
        let mut graph = RenderGraph::<Rt, Rp>::new();
        graph.render_target(
            Rt::Color,
            RenderTargetDesc::new(64, 64, TextureFormat::Rgba8Unorm),
        );
        graph.render_pass(
            Rp::Scene,
            "scene",
            PassDesc::new().with_color(ColorAttachment::new(Rt::Color)),
            ok_callback(),
        );
        graph.build(&mut renderer).unwrap();
    }

    #[test]
    #[should_panic(expected = "must be an internal render target")]
    fn test_external_present_target_panics() {
        let mut graph = RenderGraph::<Rt, Rp>::new();
        graph.external_render_target(
            Rt::History,
            TextureFormat::Rgba8Unorm,
            ImageLayout::ShaderRead,
            ImageLayout::ShaderRead,
        );
        graph.present_render_target(Rt::History);
    }

    #[test]
    #[should_panic(expected = "only legal in the Ready state")]
    fn test_bind_external_while_building_panics() {
        let mut graph = RenderGraph::<Rt, Rp>::new();
        graph.external_render_target(
            Rt::History,
            TextureFormat::Rgba8Unorm,
            ImageLayout::ShaderRead,
            ImageLayout::ShaderRead,
        );
        graph.bind_external_rt(Rt::History, RenderTargetHandle::from_id(1));
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn test_pass_with_unregistered_target_panics() {
        let mut renderer = NullRenderer::new();
        let mut graph = RenderGraph::<Rt, Rp>::new();
        graph.render_target(
            Rt::Backbuffer,
            RenderTargetDesc::new(64, 64, TextureFormat::Bgra8Unorm),
        );
        graph.render_pass(
            Rp::Scene,
            "scene",
            PassDesc::new().with_color(ColorAttachment::new(Rt::Color)),
            ok_callback(),
        );
        graph.present_render_target(Rt::Backbuffer);
        let _ = graph.build(&mut renderer);
    }
}
