//! Operations of the render graph.
//!
//! The graph's schedule is a flat list of operations replayed in order on
//! every `render()` call. The list starts out exactly as registered; `build()`
//! rewrites it (dead-attachment elimination, pass merging) and annotates it
//! with the derived image layouts.

use crate::error::GraphError;
use crate::graph::resources::PassResources;
use crate::graph::target::{GraphId, PassDesc};
use crate::renderer::{FramebufferHandle, RenderPassHandle, Renderer};
use crate::types::ImageLayout;

/// User-supplied render callback, invoked once per pass with the pass id and
/// its resolved input resources. Merged passes carry several callbacks and
/// invoke them in registration order.
pub type PassCallback<Rt, Rp> =
    Box<dyn FnMut(&mut dyn Renderer, Rp, &PassResources<Rt>) -> Result<(), GraphError>>;

/// A render pass operation.
pub struct RenderPassOp<Rt: GraphId, Rp: GraphId> {
    pub(crate) id: Rp,
    pub(crate) name: String,
    pub(crate) desc: PassDesc<Rt>,
    pub(crate) callbacks: Vec<PassCallback<Rt, Rp>>,
    /// Backend render pass object; null until `build()`.
    pub(crate) pass_handle: RenderPassHandle,
    /// Backend framebuffer; rebuilt per frame for passes with external
    /// attachments.
    pub(crate) framebuffer: FramebufferHandle,
    /// Whether any attachment is an external render target.
    pub(crate) external_attachments: bool,
}

impl<Rt: GraphId, Rp: GraphId> RenderPassOp<Rt, Rp> {
    /// The pass identifier.
    pub fn id(&self) -> Rp {
        self.id
    }

    /// Human-readable name; merged passes carry the concatenated name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The (possibly rewritten) pass description.
    pub fn desc(&self) -> &PassDesc<Rt> {
        &self.desc
    }

    /// Number of render callbacks; more than one after merging.
    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    /// The backend render pass object created by `build()`.
    pub fn pass_handle(&self) -> RenderPassHandle {
        self.pass_handle
    }

    /// Whether any attachment is an external render target, forcing per-frame
    /// framebuffer creation.
    pub fn has_external_attachments(&self) -> bool {
        self.external_attachments
    }
}

impl<Rt: GraphId, Rp: GraphId> std::fmt::Debug for RenderPassOp<Rt, Rp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPassOp")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("callbacks", &self.callbacks.len())
            .field("pass_handle", &self.pass_handle)
            .field("framebuffer", &self.framebuffer)
            .field("external_attachments", &self.external_attachments)
            .finish_non_exhaustive()
    }
}

/// One scheduled operation.
///
/// Operations execute strictly in list order; `final_layout` fields are
/// filled in by the layout inference in `build()`.
#[derive(Debug)]
pub enum Operation<Rt: GraphId, Rp: GraphId> {
    /// A render pass invoking user callbacks.
    RenderPass(RenderPassOp<Rt, Rp>),
    /// Copy `src` into `dst`, leaving `dst` in `final_layout`.
    Blit {
        src: Rt,
        dst: Rt,
        final_layout: ImageLayout,
    },
    /// Resolve the multisampled `src` into the single-sampled `dst`, leaving
    /// `dst` in `final_layout`.
    ResolveMsaa {
        src: Rt,
        dst: Rt,
        final_layout: ImageLayout,
    },
}

impl<Rt: GraphId, Rp: GraphId> Operation<Rt, Rp> {
    /// Get the operation name for logs.
    pub fn name(&self) -> &str {
        match self {
            Self::RenderPass(op) => &op.name,
            Self::Blit { .. } => "blit",
            Self::ResolveMsaa { .. } => "resolve msaa",
        }
    }

    /// Get this operation as a render pass, if it is one.
    pub fn as_render_pass(&self) -> Option<&RenderPassOp<Rt, Rp>> {
        if let Self::RenderPass(op) = self {
            Some(op)
        } else {
            None
        }
    }

    /// Check if this is a render pass operation.
    pub fn is_render_pass(&self) -> bool {
        matches!(self, Self::RenderPass(_))
    }
}
