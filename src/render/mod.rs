//! Rendering subsystem: the framebuffer and the triangle rasterizer.

pub mod framebuffer;
pub mod rasterizer;

pub use framebuffer::Framebuffer;
pub use rasterizer::{draw_triangle, Vertex};
