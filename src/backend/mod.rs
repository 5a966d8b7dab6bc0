//! Renderer backends.
//!
//! Real GPU backends translate the [`Renderer`](crate::Renderer) trait into
//! native API calls and live outside this crate's scope. The [`NullRenderer`]
//! here performs no GPU work at all: it validates and records every call so
//! the graph can be exercised and tested without hardware.

mod null;

pub use null::{NullRenderer, RendererCall};
