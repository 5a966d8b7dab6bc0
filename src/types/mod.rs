//! Common types shared across the graph and renderer boundary.

mod common;
mod pipeline;
mod target;

pub use common::{
    ClearColor, DepthLoadOp, ImageLayout, LoadOp, TextureFormat, MAX_COLOR_ATTACHMENTS,
};
pub use pipeline::{BlendMode, DepthCompare, PipelineDesc};
pub use target::{RenderTargetDesc, RenderTargetUsage};
