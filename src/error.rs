//! Graph error types.

use thiserror::Error;

use crate::renderer::RendererError;

/// Errors surfaced by [`RenderGraph`](crate::RenderGraph) operations.
///
/// Only runtime conditions live here: backend resource-creation failures and
/// failures reported by user render callbacks. Misuse of the graph API
/// (calling a building-phase method outside the Building state, referencing
/// an unregistered render target, double-binding an external target) is a
/// bug in the calling code and panics instead.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A user render callback failed. The graph finishes replaying the frame
    /// before returning this; only the first failure is kept.
    #[error("render pass callback failed: {0}")]
    Callback(String),

    /// The backend failed to create a resource.
    #[error(transparent)]
    Renderer(#[from] RendererError),
}

impl GraphError {
    /// Shorthand for a callback failure with a message.
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphError::callback("history buffer missing");
        assert_eq!(
            err.to_string(),
            "render pass callback failed: history buffer missing"
        );

        let err = GraphError::from(RendererError::OutOfMemory);
        assert_eq!(err.to_string(), "out of device memory");
    }
}
