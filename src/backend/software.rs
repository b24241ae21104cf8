//! The software reference back-end.
//!
//! Owns the framebuffer, a texture table, the installed render state, and
//! the pipeline counters. Single-threaded by contract; callers wanting
//! parallelism partition the screen into tiles and run one back-end per
//! tile.

use tracing::{debug, trace};

use super::RenderBackend;
use crate::error::RasterError;
use crate::render::framebuffer::Framebuffer;
use crate::render::rasterizer::{self, Vertex};
use crate::state::{RenderState, TextureFilter, TextureFormat, TextureId};
use crate::stats::RenderStats;
use crate::texture::Texture;

pub struct SoftwareBackend {
    fb: Framebuffer,
    textures: Vec<Option<Texture>>,
    state: RenderState,
    stats: RenderStats,
}

impl SoftwareBackend {
    /// Allocate the render target and install the default render state.
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        Ok(Self {
            fb: Framebuffer::new(width, height)?,
            textures: Vec::new(),
            state: RenderState::default(),
            stats: RenderStats::default(),
        })
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.fb
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Release an uploaded texture, unbinding it first if bound.
    pub fn destroy_texture(&mut self, id: TextureId) -> Result<(), RasterError> {
        match self.textures.get_mut(id.0 as usize) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                if self.state.texture == Some(id) {
                    self.state.texture = None;
                }
                Ok(())
            }
            _ => Err(RasterError::InvalidArg),
        }
    }

    fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id.0 as usize).and_then(|slot| slot.as_ref())
    }
}

impl RenderBackend for SoftwareBackend {
    fn clear_color(&mut self, color: u16) -> Result<(), RasterError> {
        self.fb.clear_color(color);
        Ok(())
    }

    fn clear_depth(&mut self, depth: f32) -> Result<(), RasterError> {
        self.fb.clear_depth(depth);
        Ok(())
    }

    fn set_state(&mut self, state: &RenderState) -> Result<(), RasterError> {
        if let Some(id) = state.texture {
            if self.texture(id).is_none() {
                return Err(RasterError::InvalidArg);
            }
        }
        self.state = *state;
        Ok(())
    }

    fn upload_texture(
        &mut self,
        data: &[u16],
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<TextureId, RasterError> {
        let texture = Texture::from_data(data, width, height, format)?;
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(Some(texture));
        debug!(width, height, ?format, id = id.0, "texture uploaded");
        Ok(id)
    }

    fn submit_triangle(&mut self, vertices: &[Vertex; 3]) -> Result<(), RasterError> {
        // Field accesses rather than the `texture` helper so the texture
        // borrow stays disjoint from the framebuffer and stats borrows.
        let texture = match (self.state.texturing, self.state.texture) {
            (true, Some(id)) => {
                let slot = self.textures.get(id.0 as usize).and_then(|s| s.as_ref());
                // The slot is validated on bind; a stale id here is a bug.
                let tex = slot.ok_or(RasterError::InvalidArg)?;
                if tex.format() == TextureFormat::Rgba4444
                    && self.state.filter == TextureFilter::Bilinear
                {
                    // No canonical bilinear semantics for RGBA4444 yet.
                    return Err(RasterError::InvalidArg);
                }
                Some(tex)
            }
            _ => None,
        };

        rasterizer::draw_triangle(&mut self.fb, &self.state, texture, vertices, &mut self.stats);
        Ok(())
    }

    fn present(&mut self) -> Result<(), RasterError> {
        trace!(
            drawn = self.stats.pixels_drawn,
            rejected = self.stats.pixels_depth_rejected,
            "frame presented"
        );
        Ok(())
    }
}
