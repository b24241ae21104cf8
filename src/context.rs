//! Graphics API façade.
//!
//! A [`RenderContext`] is an explicit context value owned by the caller and
//! threaded through every entry point; there is no process-wide state. The
//! context shadows the render state host-side and pushes it to the back-end
//! on every change, the same way the hardware driver mirrors its register
//! file.
//!
//! Entry points that reject their arguments, and calls made after
//! [`RenderContext::shutdown`], fail without changing any state.

use tracing::debug;

use crate::backend::{RenderBackend, SoftwareBackend};
use crate::error::RasterError;
use crate::render::framebuffer::Framebuffer;
use crate::render::rasterizer::Vertex;
use crate::state::{
    AlphaSource, BlendFactor, DepthFunc, RenderState, TextureFilter, TextureFormat, TextureId,
};
use crate::stats::RenderStats;

pub struct RenderContext<B: RenderBackend = SoftwareBackend> {
    backend: Option<B>,
    state: RenderState,
}

impl RenderContext<SoftwareBackend> {
    /// Create a context over the software reference back-end with the
    /// default state installed (depth test on, depth write on, LESS, blend
    /// off, texturing off, nearest filter, modulate on, alpha 0xFF).
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        let backend = SoftwareBackend::new(width, height)?;
        debug!(width, height, "render context created");
        Ok(Self {
            backend: Some(backend),
            state: RenderState::default(),
        })
    }

    fn software(&self) -> Result<&SoftwareBackend, RasterError> {
        self.backend.as_ref().ok_or(RasterError::NoContext)
    }

    /// The render target.
    pub fn framebuffer(&self) -> Result<&Framebuffer, RasterError> {
        Ok(self.software()?.framebuffer())
    }

    /// Color at (x, y); out-of-bounds reads return 0x0000.
    pub fn read_pixel(&self, x: i32, y: i32) -> Result<u16, RasterError> {
        Ok(self.software()?.framebuffer().read_pixel(x, y))
    }

    /// Depth at (x, y); out-of-bounds reads return the far value.
    pub fn read_depth(&self, x: i32, y: i32) -> Result<f32, RasterError> {
        Ok(self.software()?.framebuffer().read_depth(x, y))
    }

    /// Pipeline counters since the last reset.
    pub fn stats(&self) -> Result<RenderStats, RasterError> {
        Ok(self.software()?.stats())
    }

    pub fn reset_stats(&mut self) -> Result<(), RasterError> {
        self.backend
            .as_mut()
            .ok_or(RasterError::NoContext)?
            .reset_stats();
        Ok(())
    }

    /// Release an uploaded texture, unbinding it first if bound.
    pub fn destroy_texture(&mut self, id: TextureId) -> Result<(), RasterError> {
        self.backend
            .as_mut()
            .ok_or(RasterError::NoContext)?
            .destroy_texture(id)?;
        if self.state.texture == Some(id) {
            self.state.texture = None;
        }
        Ok(())
    }
}

impl<B: RenderBackend> RenderContext<B> {
    /// Wrap an already-constructed back-end (e.g. the UART bridge).
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend: Some(backend),
            state: RenderState::default(),
        }
    }

    /// Tear the context down. Every later call returns `NoContext`.
    pub fn shutdown(&mut self) {
        if self.backend.take().is_some() {
            debug!("render context shut down");
        }
    }

    pub fn is_active(&self) -> bool {
        self.backend.is_some()
    }

    fn backend_mut(&mut self) -> Result<&mut B, RasterError> {
        self.backend.as_mut().ok_or(RasterError::NoContext)
    }

    /// Current host-side render state.
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn clear_color(&mut self, color: u16) -> Result<(), RasterError> {
        self.backend_mut()?.clear_color(color)
    }

    pub fn clear_depth(&mut self, depth: f32) -> Result<(), RasterError> {
        self.backend_mut()?.clear_depth(depth)
    }

    /// Clear both planes.
    pub fn clear(&mut self, color: u16, depth: f32) -> Result<(), RasterError> {
        self.backend_mut()?.clear_color(color)?;
        self.backend_mut()?.clear_depth(depth)
    }

    /// Push a modified copy of the shadowed state to the back-end; the
    /// shadow is only updated when the back-end accepts it.
    fn update_state(&mut self, f: impl FnOnce(&mut RenderState)) -> Result<(), RasterError> {
        let mut state = self.state;
        f(&mut state);
        self.backend_mut()?.set_state(&state)?;
        self.state = state;
        Ok(())
    }

    pub fn set_depth_test(&mut self, enable: bool) -> Result<(), RasterError> {
        self.update_state(|s| s.depth_test = enable)
    }

    pub fn set_depth_write(&mut self, enable: bool) -> Result<(), RasterError> {
        self.update_state(|s| s.depth_write = enable)
    }

    pub fn set_depth_func(&mut self, func: DepthFunc) -> Result<(), RasterError> {
        self.update_state(|s| s.depth_func = func)
    }

    /// Configure blending. Factors are recorded for the hardware path; the
    /// software reference writes pixels unblended.
    pub fn set_blend(
        &mut self,
        enable: bool,
        src: BlendFactor,
        dst: BlendFactor,
    ) -> Result<(), RasterError> {
        self.update_state(|s| {
            s.blend_enable = enable;
            s.blend_src = src;
            s.blend_dst = dst;
        })
    }

    pub fn set_alpha_source(&mut self, source: AlphaSource) -> Result<(), RasterError> {
        self.update_state(|s| s.alpha_source = source)
    }

    pub fn set_const_alpha(&mut self, alpha: u8) -> Result<(), RasterError> {
        self.update_state(|s| s.const_alpha = alpha)
    }

    pub fn set_texturing(&mut self, enable: bool) -> Result<(), RasterError> {
        self.update_state(|s| s.texturing = enable)
    }

    /// Bind a texture for sampling, or unbind with `None`.
    pub fn bind_texture(&mut self, texture: Option<TextureId>) -> Result<(), RasterError> {
        self.update_state(|s| s.texture = texture)
    }

    pub fn set_texture_filter(&mut self, filter: TextureFilter) -> Result<(), RasterError> {
        self.update_state(|s| s.filter = filter)
    }

    pub fn set_modulate(&mut self, enable: bool) -> Result<(), RasterError> {
        self.update_state(|s| s.modulate = enable)
    }

    /// Copy texels into the back-end and return a handle for binding.
    pub fn upload_texture(
        &mut self,
        data: &[u16],
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<TextureId, RasterError> {
        self.backend_mut()?.upload_texture(data, width, height, format)
    }

    /// Draw a single triangle.
    pub fn draw_triangle(&mut self, vertices: &[Vertex; 3]) -> Result<(), RasterError> {
        self.backend_mut()?.submit_triangle(vertices)
    }

    /// Draw consecutive vertex triples as triangles.
    ///
    /// The list must be non-empty and a multiple of three.
    pub fn draw_triangle_list(&mut self, vertices: &[Vertex]) -> Result<(), RasterError> {
        if vertices.is_empty() || vertices.len() % 3 != 0 {
            return Err(RasterError::InvalidArg);
        }
        let backend = self.backend_mut()?;
        for tri in vertices.chunks_exact(3) {
            backend.submit_triangle(&[tri[0], tri[1], tri[2]])?;
        }
        Ok(())
    }

    /// Draw index triples as triangles.
    ///
    /// Indices must be non-empty, a multiple of three, and in range; the
    /// whole call is validated before the first triangle is submitted.
    pub fn draw_indexed(
        &mut self,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<(), RasterError> {
        if indices.is_empty() || indices.len() % 3 != 0 {
            return Err(RasterError::InvalidArg);
        }
        if indices.iter().any(|&i| i as usize >= vertices.len()) {
            return Err(RasterError::InvalidArg);
        }
        let backend = self.backend_mut()?;
        for tri in indices.chunks_exact(3) {
            backend.submit_triangle(&[
                vertices[tri[0] as usize],
                vertices[tri[1] as usize],
                vertices[tri[2] as usize],
            ])?;
        }
        Ok(())
    }

    /// Finish the frame.
    pub fn present(&mut self) -> Result<(), RasterError> {
        self.backend_mut()?.present()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{pack_rgb565_f, BLACK, WHITE};

    fn solid(x: f32, y: f32, z: f32, r: f32, g: f32, b: f32) -> Vertex {
        Vertex::new(x, y, z, 1.0, 0.0, 0.0, r, g, b, 1.0)
    }

    fn red_triangle(z: f32) -> [Vertex; 3] {
        [
            solid(0.5, 0.5, z, 1.0, 0.0, 0.0),
            solid(3.5, 0.5, z, 1.0, 0.0, 0.0),
            solid(0.5, 3.5, z, 1.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn solid_triangle_scenario() {
        let mut ctx = RenderContext::new(4, 4).unwrap();
        ctx.clear(BLACK, 1.0).unwrap();
        ctx.draw_triangle(&red_triangle(0.5)).unwrap();

        let stats = ctx.stats().unwrap();
        assert_eq!(stats.triangles_submitted, 1);
        assert_eq!(stats.pixels_drawn, 6);
        let mut written = 0;
        for y in 0..4 {
            for x in 0..4 {
                let c = ctx.read_pixel(x, y).unwrap();
                if c != BLACK {
                    assert_eq!(c, pack_rgb565_f(1.0, 0.0, 0.0));
                    written += 1;
                }
            }
        }
        assert_eq!(written, 6);
    }

    #[test]
    fn final_image_is_independent_of_depth_order() {
        let near = [
            solid(0.0, 0.0, 0.3, 1.0, 0.0, 0.0),
            solid(8.0, 0.0, 0.3, 1.0, 0.0, 0.0),
            solid(0.0, 8.0, 0.3, 1.0, 0.0, 0.0),
        ];
        let far = [
            solid(0.0, 0.0, 0.7, 0.0, 0.0, 1.0),
            solid(8.0, 0.0, 0.7, 0.0, 0.0, 1.0),
            solid(0.0, 8.0, 0.7, 0.0, 0.0, 1.0),
        ];

        for order in [[near, far], [far, near]] {
            let mut ctx = RenderContext::new(8, 8).unwrap();
            for tri in &order {
                ctx.draw_triangle(tri).unwrap();
            }
            // The overlap holds the near triangle's color and depth.
            assert_eq!(ctx.read_pixel(2, 2).unwrap(), 0xF800);
            assert_eq!(ctx.read_depth(2, 2).unwrap(), 0.3);
        }
    }

    #[test]
    fn stats_accounting_scenario() {
        let mut ctx = RenderContext::new(4, 4).unwrap();
        // Two valid triangles over the same pixels, one degenerate.
        ctx.draw_triangle(&red_triangle(0.5)).unwrap();
        ctx.draw_triangle(&red_triangle(0.8)).unwrap();
        let degenerate = [
            solid(0.0, 0.0, 0.5, 1.0, 1.0, 1.0),
            solid(1.0, 1.0, 0.5, 1.0, 1.0, 1.0),
            solid(2.0, 2.0, 0.5, 1.0, 1.0, 1.0),
        ];
        ctx.draw_triangle(&degenerate).unwrap();

        let stats = ctx.stats().unwrap();
        assert_eq!(stats.triangles_submitted, 3);
        assert_eq!(stats.triangles_culled, 1);
        assert_eq!(stats.pixels_drawn, 6);
        assert_eq!(stats.pixels_depth_rejected, 6);

        ctx.reset_stats().unwrap();
        assert_eq!(ctx.stats().unwrap(), RenderStats::default());
    }

    #[test]
    fn draw_after_shutdown_is_no_context() {
        let mut ctx = RenderContext::new(4, 4).unwrap();
        ctx.shutdown();
        assert!(!ctx.is_active());
        assert_eq!(ctx.draw_triangle(&red_triangle(0.5)), Err(RasterError::NoContext));
        assert_eq!(ctx.clear(BLACK, 1.0), Err(RasterError::NoContext));
        assert_eq!(ctx.read_pixel(0, 0), Err(RasterError::NoContext));
        assert_eq!(ctx.present(), Err(RasterError::NoContext));
        assert_eq!(ctx.set_depth_test(false), Err(RasterError::NoContext));
        // Shutting down twice is harmless.
        ctx.shutdown();
    }

    #[test]
    fn list_and_indexed_draws_validate_arguments() {
        let mut ctx = RenderContext::new(8, 8).unwrap();
        let quad = [
            solid(0.0, 0.0, 0.5, 1.0, 1.0, 1.0),
            solid(4.0, 0.0, 0.5, 1.0, 1.0, 1.0),
            solid(4.0, 4.0, 0.5, 1.0, 1.0, 1.0),
            solid(0.0, 4.0, 0.5, 1.0, 1.0, 1.0),
        ];

        assert_eq!(ctx.draw_triangle_list(&[]), Err(RasterError::InvalidArg));
        assert_eq!(ctx.draw_triangle_list(&quad), Err(RasterError::InvalidArg));
        assert_eq!(ctx.draw_indexed(&quad, &[]), Err(RasterError::InvalidArg));
        assert_eq!(
            ctx.draw_indexed(&quad, &[0, 1, 2, 0]),
            Err(RasterError::InvalidArg)
        );
        assert_eq!(
            ctx.draw_indexed(&quad, &[0, 1, 4]),
            Err(RasterError::InvalidArg)
        );
        // A rejected call submits nothing.
        assert_eq!(ctx.stats().unwrap().triangles_submitted, 0);

        ctx.draw_indexed(&quad, &[0, 1, 2, 0, 2, 3]).unwrap();
        assert_eq!(ctx.stats().unwrap().triangles_submitted, 2);
        // The quad interior is filled seamlessly.
        assert_eq!(ctx.stats().unwrap().pixels_drawn, 16);
    }

    #[test]
    fn textured_draw_with_modulation() {
        let mut ctx = RenderContext::new(8, 8).unwrap();
        let id = ctx
            .upload_texture(&[WHITE; 4], 2, 2, TextureFormat::Rgb565)
            .unwrap();
        ctx.set_texturing(true).unwrap();
        ctx.bind_texture(Some(id)).unwrap();
        ctx.set_modulate(true).unwrap();

        // Half-intensity green vertices darken the white texture.
        let v = Vertex::new(0.0, 0.0, 0.5, 1.0, 0.0, 0.0, 0.0, 0.5, 0.0, 1.0);
        let tri = [
            v,
            Vertex { x: 8.0, ..v },
            Vertex { x: 0.0, y: 8.0, ..v },
        ];
        ctx.draw_triangle(&tri).unwrap();

        let (r, g, b) = crate::color::unpack_rgb565(ctx.read_pixel(2, 2).unwrap());
        assert_eq!((r, g, b), (0, 124, 0));
    }

    #[test]
    fn texture_upload_validates_dimensions() {
        let mut ctx = RenderContext::new(4, 4).unwrap();
        assert_eq!(
            ctx.upload_texture(&[0u16; 6], 3, 2, TextureFormat::Rgb565),
            Err(RasterError::InvalidArg)
        );
        assert_eq!(
            ctx.upload_texture(&[0u16; 2], 2, 2, TextureFormat::Rgb565),
            Err(RasterError::InvalidArg)
        );
    }

    #[test]
    fn clear_then_readback_round_trip() {
        let mut ctx = RenderContext::new(2, 2).unwrap();
        ctx.clear(0x07E0, 0.5).unwrap();
        let mut ppm = Vec::new();
        ctx.framebuffer().unwrap().write_ppm(&mut ppm).unwrap();
        assert_eq!(&ppm[..11], b"P6\n2 2\n255\n");
        assert!(ppm[11..].chunks(3).all(|px| px == [0, 252, 0]));
    }
}
