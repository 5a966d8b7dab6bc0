//! Formats, image layouts and clear values.

/// Maximum number of color attachments a single render pass may declare.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// Texture format enumeration.
///
/// Only the formats the antialiasing pipelines actually use; the enum is
/// closed on purpose so that format handling in the graph stays exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8Unorm,
    /// 8-bit RGBA channels, sRGB.
    Rgba8UnormSrgb,
    /// 8-bit BGRA channels, unsigned normalized.
    Bgra8Unorm,
    /// 16-bit RGBA channels, float.
    Rgba16Float,
    /// Packed 11/11/10-bit RGB channels, float. HDR color without alpha.
    Rg11b10Float,
    /// 32-bit depth, float.
    Depth32Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24PlusStencil8,
}

impl TextureFormat {
    /// Returns true if this is a color format.
    pub fn is_color(&self) -> bool {
        !self.is_depth_stencil()
    }

    /// Returns true if this is a depth or stencil format.
    pub fn is_depth_stencil(&self) -> bool {
        matches!(self, Self::Depth32Float | Self::Depth24PlusStencil8)
    }

    /// Returns true if this format has a stencil component.
    pub fn has_stencil(&self) -> bool {
        matches!(self, Self::Depth24PlusStencil8)
    }
}

/// GPU-internal memory arrangement of an image.
///
/// An image must be in the layout matching the operation about to use it;
/// the graph's build step derives the per-attachment transitions and the
/// backend turns them into barriers or render pass attachment descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageLayout {
    /// Contents are undefined; a transition from here discards them.
    #[default]
    Undefined,
    /// Writable color attachment of a render pass.
    ColorAttachment,
    /// Writable depth/stencil attachment of a render pass.
    DepthStencilAttachment,
    /// Sampled from a shader.
    ShaderRead,
    /// Source of a transfer (blit, resolve).
    TransferSrc,
    /// Destination of a transfer (blit, resolve).
    TransferDst,
    /// Ready for presentation on the swapchain.
    Present,
}

/// Clear color for a color attachment.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    /// Opaque black.
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Create a clear color from RGBA components.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Operation applied to a color attachment when a render pass begins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LoadOp {
    /// Clear the attachment with the given color.
    Clear(ClearColor),
    /// Keep the existing contents; they must have been written earlier.
    Load,
    /// Existing contents are irrelevant and may be undefined.
    #[default]
    DontCare,
}

impl LoadOp {
    /// Create a clear operation from RGBA components.
    pub fn clear(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::Clear(ClearColor::new(r, g, b, a))
    }
}

/// Operation applied to a depth/stencil attachment when a render pass begins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DepthLoadOp {
    /// Clear depth and stencil with the given values.
    Clear { depth: f32, stencil: u32 },
    /// Keep the existing contents.
    Load,
    /// Existing contents are irrelevant.
    #[default]
    DontCare,
}

impl DepthLoadOp {
    /// Create a depth-only clear (stencil cleared to zero).
    pub fn clear_depth(depth: f32) -> Self {
        Self::Clear { depth, stencil: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_classification() {
        assert!(TextureFormat::Rgba8Unorm.is_color());
        assert!(TextureFormat::Rg11b10Float.is_color());
        assert!(!TextureFormat::Depth32Float.is_color());
        assert!(TextureFormat::Depth24PlusStencil8.is_depth_stencil());
        assert!(TextureFormat::Depth24PlusStencil8.has_stencil());
        assert!(!TextureFormat::Depth32Float.has_stencil());
    }

    #[test]
    fn test_default_layout_is_undefined() {
        assert_eq!(ImageLayout::default(), ImageLayout::Undefined);
    }
}
