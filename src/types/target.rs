//! Render target descriptors.

use bitflags::bitflags;

use super::TextureFormat;

bitflags! {
    /// Usage flags for render targets.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderTargetUsage: u32 {
        /// Target can be a color attachment of a render pass.
        const COLOR_ATTACHMENT = 1 << 0;
        /// Target can be a depth/stencil attachment of a render pass.
        const DEPTH_STENCIL_ATTACHMENT = 1 << 1;
        /// Target can be sampled in a shader.
        const SAMPLED = 1 << 2;
        /// Target can be the source of a blit or resolve.
        const TRANSFER_SRC = 1 << 3;
        /// Target can be the destination of a blit or resolve.
        const TRANSFER_DST = 1 << 4;
    }
}

/// Descriptor for creating a render target.
///
/// Built with chained setters and consumed by the backend to create the
/// actual GPU image plus its default view:
///
/// ```
/// use framegraph::{RenderTargetDesc, RenderTargetUsage, TextureFormat};
///
/// let desc = RenderTargetDesc::new(1920, 1080, TextureFormat::Rgba8Unorm)
///     .with_samples(4)
///     .with_usage(RenderTargetUsage::COLOR_ATTACHMENT | RenderTargetUsage::SAMPLED)
///     .with_label("scene color");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderTargetDesc {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// MSAA sample count (1 = no multisampling).
    pub samples: u32,
    /// Pixel format of the image and its primary view.
    pub format: TextureFormat,
    /// Optional second view format for byte reinterpretation (e.g. sampling
    /// an `Rgba8Unorm` target through an sRGB view).
    pub extra_view_format: Option<TextureFormat>,
    /// Usage flags.
    pub usage: RenderTargetUsage,
    /// Debug name.
    pub label: Option<String>,
}

impl RenderTargetDesc {
    /// Create a descriptor for a single-sampled target with the given size
    /// and format, usable as an attachment and for sampling.
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        let usage = if format.is_depth_stencil() {
            RenderTargetUsage::DEPTH_STENCIL_ATTACHMENT
        } else {
            RenderTargetUsage::COLOR_ATTACHMENT | RenderTargetUsage::SAMPLED
        };
        Self {
            width,
            height,
            samples: 1,
            format,
            extra_view_format: None,
            usage,
            label: None,
        }
    }

    /// Set the MSAA sample count.
    pub fn with_samples(mut self, samples: u32) -> Self {
        assert!(
            samples.is_power_of_two(),
            "sample count must be a power of two, got {samples}"
        );
        self.samples = samples;
        self
    }

    /// Set an additional view format for this target.
    pub fn with_extra_view_format(mut self, format: TextureFormat) -> Self {
        self.extra_view_format = Some(format);
        self
    }

    /// Replace the usage flags.
    pub fn with_usage(mut self, usage: RenderTargetUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Set the debug name.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
