//! # framegraph
//!
//! A declarative render graph over an abstract renderer boundary.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`RenderGraph`] - Declarative description of render passes, transfers
//!   and presentation, generic over the application's identifier types
//! - [`Renderer`] - Trait for renderer backend implementations
//! - [`NullRenderer`] - Recording no-GPU backend for tests
//! - [`ResourceContainer`] / [`Handle`] - Typed storage for backend resources
//!
//! ## Example
//!
//! ```ignore
//! use framegraph::{RenderGraph, NullRenderer};
//!
//! let mut renderer = NullRenderer::new();
//! let mut graph = RenderGraph::new();
//! // Register targets and passes, designate a present target...
//! graph.build(&mut renderer)?;
//! graph.render(&mut renderer)?;
//! ```

pub mod backend;
pub mod container;
pub mod error;
pub mod graph;
pub mod renderer;
pub mod types;

// Re-export main types for convenience
pub use backend::{NullRenderer, RendererCall};
pub use container::{Handle, ResourceContainer};
pub use error::GraphError;
pub use graph::{
    ColorAttachment, DepthStencilAttachment, GraphId, GraphState, Operation, PassCallback,
    PassDesc, PassResources, RenderGraph, RenderPassOp,
};
pub use renderer::{
    AttachmentDesc, DepthAttachmentDesc, FramebufferDesc, FramebufferHandle, PipelineHandle,
    RenderPassDesc, RenderPassHandle, RenderTargetHandle, Renderer, RendererError, TextureHandle,
};
pub use types::{
    BlendMode, ClearColor, DepthCompare, DepthLoadOp, ImageLayout, LoadOp, PipelineDesc,
    RenderTargetDesc, RenderTargetUsage, TextureFormat, MAX_COLOR_ATTACHMENTS,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library.
///
/// Only logs the version; safe to skip.
pub fn init() {
    log::info!("framegraph v{VERSION} initialized");
}
