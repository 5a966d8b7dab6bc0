//! Graph compilation: layout inference and pass merging.
//!
//! `build()` alternates the two rewrites here until a fixpoint: layouts are
//! derived by a single backward walk over the operation list, then the first
//! mergeable adjacent pass pair is merged and the walk starts over, because a
//! merge changes adjacency and the consumer sets the walk depends on.

use std::collections::HashMap;

use crate::graph::operation::Operation;
use crate::graph::target::{GraphId, LogicalTarget, PassDesc};
use crate::graph::RenderGraph;
use crate::types::{DepthLoadOp, ImageLayout, LoadOp};

impl<Rt: GraphId, Rp: GraphId> RenderGraph<Rt, Rp> {
    /// Derive initial/final image layouts for every operation.
    ///
    /// Walks the operation list backwards carrying, per render target, the
    /// layout the nearest later consumer requires. The walk is seeded with
    /// the obligations that outlive the frame: the present target must end in
    /// the present layout and every external target in its declared final
    /// layout. A color attachment no later operation consumes is dead and
    /// gets eliminated.
    pub(crate) fn propagate_layouts(&mut self) {
        let mut required: HashMap<Rt, ImageLayout> = HashMap::new();
        for (&id, target) in &self.targets {
            if let LogicalTarget::External { final_layout, .. } = target {
                required.insert(id, *final_layout);
            }
        }
        if let Some(final_target) = self.final_target {
            required.insert(final_target, ImageLayout::Present);
        }

        for op in self.operations.iter_mut().rev() {
            match op {
                Operation::Blit {
                    src,
                    dst,
                    final_layout,
                }
                | Operation::ResolveMsaa {
                    src,
                    dst,
                    final_layout,
                } => {
                    // An unconsumed destination stays in the transfer layout.
                    *final_layout = required.remove(dst).unwrap_or(ImageLayout::TransferDst);
                    required.insert(*src, ImageLayout::TransferSrc);
                }
                Operation::RenderPass(op) => {
                    let desc = &mut op.desc;

                    // What later consumers require becomes this pass's final
                    // layouts.
                    for att in desc.colors.iter_mut() {
                        let Some(rt) = att.rt else { continue };
                        match required.get(&rt) {
                            Some(&layout) => att.final_layout = layout,
                            None => {
                                log::debug!(
                                    "render pass '{}': color attachment {rt:?} has no consumer, dropping it",
                                    op.name
                                );
                                att.rt = None;
                                att.load = LoadOp::DontCare;
                                att.initial_layout = ImageLayout::Undefined;
                                att.final_layout = ImageLayout::Undefined;
                            }
                        }
                    }
                    if let Some(depth) = desc.depth_stencil.as_mut() {
                        depth.final_layout = required
                            .get(&depth.rt)
                            .copied()
                            .unwrap_or(ImageLayout::DepthStencilAttachment);
                    }

                    // What this pass requires before it begins. Attachment
                    // requirements are recorded after the input ones so they
                    // win when a pass both attaches and samples a target.
                    for &rt in &desc.inputs {
                        required.insert(rt, ImageLayout::ShaderRead);
                    }
                    if let Some(depth) = desc.depth_stencil.as_mut() {
                        if matches!(depth.load, DepthLoadOp::Load) {
                            depth.initial_layout = ImageLayout::DepthStencilAttachment;
                            required.insert(depth.rt, ImageLayout::DepthStencilAttachment);
                        } else {
                            depth.initial_layout = ImageLayout::Undefined;
                            required.remove(&depth.rt);
                        }
                    }
                    for att in desc.colors.iter_mut() {
                        let Some(rt) = att.rt else { continue };
                        if matches!(att.load, LoadOp::Load) {
                            att.initial_layout = ImageLayout::ColorAttachment;
                            required.insert(rt, ImageLayout::ColorAttachment);
                        } else {
                            // Clear and DontCare discard previous contents.
                            att.initial_layout = ImageLayout::Undefined;
                            required.remove(&rt);
                        }
                    }
                }
            }
        }
    }

    /// Merge the first mergeable adjacent render pass pair. Returns whether a
    /// merge happened; layouts must be re-derived afterwards.
    pub(crate) fn merge_once(&mut self) -> bool {
        let mut i = 0;
        while i + 1 < self.operations.len() {
            let mergeable = match (&self.operations[i], &self.operations[i + 1]) {
                (Operation::RenderPass(a), Operation::RenderPass(b)) => can_merge(&a.desc, &b.desc),
                _ => false,
            };
            if mergeable {
                let Operation::RenderPass(second) = self.operations.remove(i + 1) else {
                    unreachable!()
                };
                let Operation::RenderPass(first) = &mut self.operations[i] else {
                    unreachable!()
                };
                log::debug!(
                    "merging render pass '{}' into '{}'",
                    second.name,
                    first.name
                );
                first.name.push_str(" + ");
                first.name.push_str(&second.name);
                first.callbacks.extend(second.callbacks);
                for input in second.desc.inputs {
                    if !first.desc.inputs.contains(&input) {
                        first.desc.inputs.push(input);
                    }
                }
                return true;
            }
            i += 1;
        }
        false
    }
}

/// Two adjacent passes merge when they render into the same framebuffer and
/// the second continues where the first left off: same sample count, same
/// render target in every used attachment slot, the second pass keeping (not
/// clearing or discarding) every shared attachment and not sampling any of
/// them as a texture.
fn can_merge<Rt: GraphId>(a: &PassDesc<Rt>, b: &PassDesc<Rt>) -> bool {
    if a.samples != b.samples {
        return false;
    }
    for (slot_a, slot_b) in a.colors.iter().zip(b.colors.iter()) {
        if slot_a.rt != slot_b.rt {
            return false;
        }
        if let Some(rt) = slot_b.rt {
            if !matches!(slot_b.load, LoadOp::Load) || b.inputs.contains(&rt) {
                return false;
            }
        }
    }
    match (&a.depth_stencil, &b.depth_stencil) {
        // The second pass not touching depth is fine.
        (_, None) => {}
        (Some(da), Some(db)) => {
            if da.rt != db.rt
                || matches!(db.load, DepthLoadOp::Clear { .. })
                || b.inputs.contains(&db.rt)
            {
                return false;
            }
        }
        (None, Some(_)) => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullRenderer;
    use crate::error::GraphError;
    use crate::graph::{ColorAttachment, DepthStencilAttachment, PassResources};
    use crate::renderer::Renderer;
    use crate::types::{ClearColor, RenderTargetDesc, TextureFormat};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Rt {
        Invalid,
        Main,
        Depth,
        Aux,
        Backbuffer,
    }

    impl GraphId for Rt {
        fn sentinel() -> Self {
            Rt::Invalid
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Rp {
        Invalid,
        Opaque,
        Decals,
        Transparent,
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

    /// Main/Depth/Aux internal targets plus a backbuffer designated for
    /// presentation; the `post` pass samples Main into the backbuffer.
    fn graph_with_post() -> RenderGraph<Rt, Rp> {
        let mut graph = RenderGraph::new();
        graph.render_target(
            Rt::Main,
            RenderTargetDesc::new(64, 64, TextureFormat::Rgba8Unorm),
        );
        graph.render_target(
            Rt::Depth,
            RenderTargetDesc::new(64, 64, TextureFormat::Depth32Float),
        );
        graph.render_target(
            Rt::Aux,
            RenderTargetDesc::new(64, 64, TextureFormat::Rgba8Unorm),
        );
        graph.render_target(
            Rt::Backbuffer,
            RenderTargetDesc::new(64, 64, TextureFormat::Bgra8Unorm),
        );
        graph
    }

    fn finish(graph: &mut RenderGraph<Rt, Rp>) {
        graph.render_pass(
            Rp::Post,
            "post",
            PassDesc::new()
                .with_color(ColorAttachment::new(Rt::Backbuffer))
                .with_input(Rt::Main),
            ok_callback(),
        );
        graph.present_render_target(Rt::Backbuffer);
    }

    #[test]
    fn test_adjacent_passes_merge() {
        let mut renderer = NullRenderer::new();
        let mut graph = graph_with_post();
        graph.render_pass(
            Rp::Opaque,
            "opaque",
            PassDesc::new()
                .with_color(ColorAttachment::new(Rt::Main).with_clear(ClearColor::BLACK)),
            ok_callback(),
        );
        graph.render_pass(
            Rp::Decals,
            "decals",
            PassDesc::new().with_color(ColorAttachment::new(Rt::Main).with_load()),
            ok_callback(),
        );
        finish(&mut graph);
        graph.build(&mut renderer).unwrap();

        assert_eq!(graph.operation_count(), 2);
        let merged = graph.operations()[0].as_render_pass().unwrap();
        assert_eq!(merged.name(), "opaque + decals");
        assert_eq!(merged.callback_count(), 2);
        // The merged pass keeps the first pass's begin policy.
        assert!(matches!(
            merged.desc().color_attachments()[0].load(),
            LoadOp::Clear(_)
        ));
    }

    #[test]
    fn test_no_merge_when_second_clears() {
        let mut renderer = NullRenderer::new();
        let mut graph = graph_with_post();
        graph.render_pass(
            Rp::Opaque,
            "opaque",
            PassDesc::new()
                .with_color(ColorAttachment::new(Rt::Main).with_clear(ClearColor::BLACK)),
            ok_callback(),
        );
        graph.render_pass(
            Rp::Decals,
            "decals",
            PassDesc::new()
                .with_color(ColorAttachment::new(Rt::Main).with_clear(ClearColor::BLACK)),
            ok_callback(),
        );
        finish(&mut graph);
        graph.build(&mut renderer).unwrap();
        assert_eq!(graph.operation_count(), 3);
    }

    #[test]
    fn test_no_merge_on_sample_mismatch() {
        let mut renderer = NullRenderer::new();
        let mut graph = graph_with_post();
        graph.render_pass(
            Rp::Opaque,
            "opaque",
            PassDesc::new()
                .with_color(ColorAttachment::new(Rt::Main).with_clear(ClearColor::BLACK))
                .with_samples(4),
            ok_callback(),
        );
        graph.render_pass(
            Rp::Decals,
            "decals",
            PassDesc::new().with_color(ColorAttachment::new(Rt::Main).with_load()),
            ok_callback(),
        );
        finish(&mut graph);
        graph.build(&mut renderer).unwrap();
        assert_eq!(graph.operation_count(), 3);
    }

    #[test]
    fn test_no_merge_when_second_samples_shared_attachment() {
        let mut renderer = NullRenderer::new();
        let mut graph = graph_with_post();
        graph.render_pass(
            Rp::Opaque,
            "opaque",
            PassDesc::new()
                .with_color(ColorAttachment::new(Rt::Main).with_clear(ClearColor::BLACK)),
            ok_callback(),
        );
        // Continues into Main but also samples it as a texture, which rules
        // out sharing a framebuffer.
        graph.render_pass(
            Rp::Decals,
            "decals",
            PassDesc::new()
                .with_color(ColorAttachment::new(Rt::Main).with_load())
                .with_input(Rt::Main),
            ok_callback(),
        );
        finish(&mut graph);
        graph.build(&mut renderer).unwrap();
        assert_eq!(graph.operation_count(), 3);
    }

    #[test]
    fn test_no_merge_when_second_adds_depth() {
        let mut renderer = NullRenderer::new();
        let mut graph = graph_with_post();
        graph.render_pass(
            Rp::Opaque,
            "opaque",
            PassDesc::new()
                .with_color(ColorAttachment::new(Rt::Main).with_clear(ClearColor::BLACK)),
            ok_callback(),
        );
        graph.render_pass(
            Rp::Decals,
            "decals",
            PassDesc::new()
                .with_color(ColorAttachment::new(Rt::Main).with_load())
                .with_depth_stencil(DepthStencilAttachment::new(Rt::Depth).with_load()),
            ok_callback(),
        );
        finish(&mut graph);
        graph.build(&mut renderer).unwrap();
        assert_eq!(graph.operation_count(), 3);
    }

    #[test]
    fn test_dead_attachment_is_eliminated() {
        let mut renderer = NullRenderer::new();
        let mut graph = graph_with_post();
        // Aux is written but never consumed by anything later.
        graph.render_pass(
            Rp::Opaque,
            "opaque",
            PassDesc::new()
                .with_color(ColorAttachment::new(Rt::Main).with_clear(ClearColor::BLACK))
                .with_color(ColorAttachment::new(Rt::Aux).with_clear(ClearColor::BLACK)),
            ok_callback(),
        );
        finish(&mut graph);
        graph.build(&mut renderer).unwrap();

        let opaque = graph.operations()[0].as_render_pass().unwrap();
        assert_eq!(opaque.desc().color_attachments()[0].rt(), Some(Rt::Main));
        assert_eq!(opaque.desc().color_attachments()[1].rt(), None);
        // The backend render pass only sees the surviving attachment.
        let desc = renderer.render_pass_desc(opaque.pass_handle());
        assert_eq!(desc.colors.len(), 1);
    }

    #[test]
    fn test_merge_restarts_until_fixpoint() {
        let mut renderer = NullRenderer::new();
        let mut graph = graph_with_post();
        // Three passes over the same target collapse into one.
        graph.render_pass(
            Rp::Opaque,
            "a",
            PassDesc::new()
                .with_color(ColorAttachment::new(Rt::Main).with_clear(ClearColor::BLACK)),
            ok_callback(),
        );
        graph.render_pass(
            Rp::Decals,
            "b",
            PassDesc::new().with_color(ColorAttachment::new(Rt::Main).with_load()),
            ok_callback(),
        );
        graph.render_pass(
            Rp::Transparent,
            "c",
            PassDesc::new().with_color(ColorAttachment::new(Rt::Main).with_load()),
            ok_callback(),
        );
        finish(&mut graph);
        graph.build(&mut renderer).unwrap();

        assert_eq!(graph.operation_count(), 2);
        let merged = graph.operations()[0].as_render_pass().unwrap();
        assert_eq!(merged.name(), "a + b + c");
        assert_eq!(merged.callback_count(), 3);
    }
}
