//! Pixel shaders for triangle rasterization.
//!
//! The rasterizer handles coverage, depth, and perspective-correct attribute
//! recovery; a [`PixelShader`] turns the recovered fragment into a packed
//! RGB565 color. The shader is chosen once per triangle from the render
//! state, mirroring how the fixed-function hardware selects its color path.

use crate::color::{pack_rgb565, pack_rgb565_f};
use crate::state::TextureFilter;
use crate::texture::Texture;

/// Perspective-recovered attributes at one sample point.
///
/// `r`, `g`, `b` are clamped to [0, 1]; `a` feeds the (currently disabled)
/// blend stage and is recovered unclamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub u: f32,
    pub v: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Per-pixel color computation.
pub trait PixelShader {
    /// Compute the RGB565 color for a fragment.
    fn shade(&self, frag: &Fragment) -> u16;
}

/// Gouraud path: pack the interpolated vertex color.
pub struct VertexColorShader;

impl PixelShader for VertexColorShader {
    #[inline]
    fn shade(&self, frag: &Fragment) -> u16 {
        pack_rgb565_f(frag.r, frag.g, frag.b)
    }
}

/// Texture-replace path: sampled texel verbatim, vertex color ignored.
pub struct TextureShader<'a> {
    texture: &'a Texture,
    filter: TextureFilter,
}

impl<'a> TextureShader<'a> {
    pub fn new(texture: &'a Texture, filter: TextureFilter) -> Self {
        Self { texture, filter }
    }
}

impl PixelShader for TextureShader<'_> {
    #[inline]
    fn shade(&self, frag: &Fragment) -> u16 {
        let (r, g, b) = self.texture.sample_rgb8(frag.u, frag.v, self.filter);
        pack_rgb565(r, g, b)
    }
}

/// Texture x Gouraud path: each 8-bit texture channel is scaled by the
/// matching interpolated vertex channel treated as a [0, 1] multiplier.
pub struct TextureModulateShader<'a> {
    texture: &'a Texture,
    filter: TextureFilter,
}

impl<'a> TextureModulateShader<'a> {
    pub fn new(texture: &'a Texture, filter: TextureFilter) -> Self {
        Self { texture, filter }
    }
}

impl PixelShader for TextureModulateShader<'_> {
    #[inline]
    fn shade(&self, frag: &Fragment) -> u16 {
        let (tr, tg, tb) = self.texture.sample_rgb8(frag.u, frag.v, self.filter);
        let r = (tr as f32 * frag.r) as u8;
        let g = (tg as f32 * frag.g) as u8;
        let b = (tb as f32 * frag.b) as u8;
        pack_rgb565(r, g, b)
    }
}
