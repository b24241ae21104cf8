//! Software reference rasterizer for a Voodoo1-style GPU project.
//!
//! Mirrors the FPGA rasterizer's behavior in plain Rust: triangle setup with
//! edge equations and attribute gradients, bounding-box rasterization with
//! the top-left fill rule, perspective-correct interpolation, depth testing,
//! RGB565 texturing with nearest/bilinear filtering, and Gouraud modulation.
//! Callers submit screen-space vertices (with 1/w precomputed) through the
//! [`RenderContext`] façade and read back the RGB565 framebuffer.

// Public API - exposed to library consumers
pub mod backend;
pub mod color;
pub mod context;
pub mod error;
pub mod math;
pub mod render;
pub mod state;
pub mod stats;
pub mod texture;

// Re-export commonly needed types at crate root for convenience
pub use backend::{RenderBackend, SoftwareBackend, UartBackend, UartTransport};
pub use context::RenderContext;
pub use error::{RasterError, CODE_OK};
pub use render::framebuffer::Framebuffer;
pub use render::rasterizer::Vertex;
pub use state::{
    AlphaSource, BlendFactor, DepthFunc, RenderState, TextureFilter, TextureFormat, TextureId,
};
pub use stats::RenderStats;
pub use texture::Texture;
