//! Triangle rasterization.
//!
//! Bounding-box rasterizer with edge-function coverage, the same algorithm
//! the hardware rasterizer implements: derive the setup record, walk the
//! clipped bounding box in row-major order, test each pixel center against
//! the three edge equations, depth-test, recover perspective-correct
//! attributes, shade, write.
//!
//! Stateless per triangle: the only state that survives a call is the
//! framebuffer contents and the statistics counters.

pub mod setup;
pub mod shader;

pub use setup::TriangleSetup;
pub use shader::{Fragment, PixelShader, TextureModulateShader, TextureShader, VertexColorShader};

use crate::render::framebuffer::Framebuffer;
use crate::state::{DepthFunc, RenderState};
use crate::stats::RenderStats;
use crate::texture::Texture;

/// A screen-space vertex ready for rasterization.
///
/// `x`, `y` are pixel coordinates with sub-pixel precision; `z` is depth in
/// [0, 1] with 0 at the near plane; `w` carries 1/clip-w and must be
/// positive for any triangle that is rasterized. `u`, `v` are texture
/// coordinates and `r`, `g`, `b`, `a` are [0, 1] color channels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
    pub u: f32,
    pub v: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Vertex {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        x: f32,
        y: f32,
        z: f32,
        w: f32,
        u: f32,
        v: f32,
        r: f32,
        g: f32,
        b: f32,
        a: f32,
    ) -> Self {
        Self {
            x,
            y,
            z,
            w,
            u,
            v,
            r,
            g,
            b,
            a,
        }
    }
}

/// Apply a depth comparison function against the stored depth.
#[inline]
fn depth_pass(func: DepthFunc, z: f32, stored: f32) -> bool {
    match func {
        DepthFunc::Never => false,
        DepthFunc::Less => z < stored,
        DepthFunc::Equal => z == stored,
        DepthFunc::Lequal => z <= stored,
        DepthFunc::Greater => z > stored,
        DepthFunc::NotEqual => z != stored,
        DepthFunc::Gequal => z >= stored,
        DepthFunc::Always => true,
    }
}

/// Rasterize one triangle into the framebuffer.
///
/// The render state is sampled once here and held stable for all of the
/// triangle's pixels. `texture` is the resolved binding; it only takes
/// effect when `state.texturing` is set. Degenerate triangles count as
/// culled and write nothing.
pub fn draw_triangle(
    fb: &mut Framebuffer,
    state: &RenderState,
    texture: Option<&Texture>,
    vertices: &[Vertex; 3],
    stats: &mut RenderStats,
) {
    stats.triangles_submitted += 1;

    let Some(tri) = TriangleSetup::new(vertices, fb.width(), fb.height()) else {
        stats.triangles_culled += 1;
        return;
    };

    let bound = if state.texturing { texture } else { None };
    match bound {
        Some(tex) if state.modulate => {
            let shader = TextureModulateShader::new(tex, state.filter);
            fill(fb, state, &tri, &shader, stats);
        }
        Some(tex) => {
            let shader = TextureShader::new(tex, state.filter);
            fill(fb, state, &tri, &shader, stats);
        }
        None => fill(fb, state, &tri, &VertexColorShader, stats),
    }
}

/// Row-major bounding-box walk shared by all shading paths.
fn fill<S: PixelShader>(
    fb: &mut Framebuffer,
    state: &RenderState,
    tri: &TriangleSetup,
    shader: &S,
    stats: &mut RenderStats,
) {
    for py in tri.min_y..=tri.max_y {
        for px in tri.min_x..=tri.max_x {
            // Sample at the pixel center.
            let x = px as f32 + 0.5;
            let y = py as f32 + 0.5;

            if !tri.covers(x, y) {
                continue;
            }

            let dx = x - tri.x0;
            let dy = y - tri.y0;
            let z = tri.z.at(dx, dy);

            if state.depth_test && !depth_pass(state.depth_func, z, fb.read_depth(px, py)) {
                stats.pixels_depth_rejected += 1;
                continue;
            }

            // Perspective divide recovers the true attribute values from
            // their w-premultiplied interpolants.
            let inv_w = 1.0 / tri.w.at(dx, dy);
            let frag = Fragment {
                u: tri.uw.at(dx, dy) * inv_w,
                v: tri.vw.at(dx, dy) * inv_w,
                r: (tri.rw.at(dx, dy) * inv_w).clamp(0.0, 1.0),
                g: (tri.gw.at(dx, dy) * inv_w).clamp(0.0, 1.0),
                b: (tri.bw.at(dx, dy) * inv_w).clamp(0.0, 1.0),
                a: tri.aw.at(dx, dy) * inv_w,
            };

            fb.store(px, py, shader.shade(&frag), z, state.depth_write);
            stats.pixels_drawn += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::pack_rgb565_f;
    use crate::render::framebuffer::FAR_DEPTH;
    use crate::state::TextureFilter;
    use approx::assert_relative_eq;

    fn solid_vertex(x: f32, y: f32, z: f32, r: f32, g: f32, b: f32) -> Vertex {
        Vertex::new(x, y, z, 1.0, 0.0, 0.0, r, g, b, 1.0)
    }

    fn red_triangle(z: f32) -> [Vertex; 3] {
        [
            solid_vertex(0.5, 0.5, z, 1.0, 0.0, 0.0),
            solid_vertex(3.5, 0.5, z, 1.0, 0.0, 0.0),
            solid_vertex(0.5, 3.5, z, 1.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn solid_triangle_fills_owned_pixels_only() {
        let mut fb = Framebuffer::new(4, 4).unwrap();
        let mut stats = RenderStats::default();
        let state = RenderState::default();

        draw_triangle(&mut fb, &state, None, &red_triangle(0.5), &mut stats);

        // Interior plus top/left edge samples; the hypotenuse is not a
        // top-left edge, so its samples belong to a neighbor.
        let owned = [(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (0, 2)];
        for y in 0..4 {
            for x in 0..4 {
                let expected = if owned.contains(&(x, y)) { 0xF800 } else { 0x0000 };
                assert_eq!(fb.read_pixel(x, y), expected, "pixel ({x}, {y})");
            }
        }
        assert_eq!(stats.triangles_submitted, 1);
        assert_eq!(stats.triangles_culled, 0);
        assert_eq!(stats.pixels_drawn, owned.len() as u64);
        assert_eq!(stats.pixels_depth_rejected, 0);
    }

    #[test]
    fn degenerate_triangle_is_culled_without_writes() {
        let mut fb = Framebuffer::new(4, 4).unwrap();
        let mut stats = RenderStats::default();
        let tri = [
            solid_vertex(0.0, 0.0, 0.5, 1.0, 0.0, 0.0),
            solid_vertex(2.0, 2.0, 0.5, 1.0, 0.0, 0.0),
            solid_vertex(4.0, 4.0, 0.5, 1.0, 0.0, 0.0),
        ];

        draw_triangle(&mut fb, &RenderState::default(), None, &tri, &mut stats);

        assert_eq!(stats.triangles_submitted, 1);
        assert_eq!(stats.triangles_culled, 1);
        assert_eq!(stats.pixels_drawn, 0);
        assert!(fb.color_plane().iter().all(|&c| c == 0x0000));
    }

    #[test]
    fn offscreen_triangle_writes_nothing() {
        let mut fb = Framebuffer::new(4, 4).unwrap();
        let mut stats = RenderStats::default();
        let tri = [
            solid_vertex(10.0, 10.0, 0.5, 1.0, 1.0, 1.0),
            solid_vertex(20.0, 10.0, 0.5, 1.0, 1.0, 1.0),
            solid_vertex(10.0, 20.0, 0.5, 1.0, 1.0, 1.0),
        ];

        draw_triangle(&mut fb, &RenderState::default(), None, &tri, &mut stats);

        assert_eq!(stats.triangles_submitted, 1);
        assert_eq!(stats.triangles_culled, 0);
        assert_eq!(stats.pixels_drawn, 0);
        assert_eq!(stats.pixels_depth_rejected, 0);
        assert!(fb.color_plane().iter().all(|&c| c == 0x0000));
    }

    #[test]
    fn partially_offscreen_triangle_matches_clipped_region() {
        // Same triangle drawn into a large and a small target; the pixels
        // the small target can hold must agree with the large rendering.
        let tri = [
            solid_vertex(-2.0, -2.0, 0.5, 0.0, 1.0, 0.0),
            solid_vertex(6.0, -2.0, 0.5, 0.0, 1.0, 0.0),
            solid_vertex(-2.0, 6.0, 0.5, 0.0, 1.0, 0.0),
        ];
        let state = RenderState::default();

        let mut big = Framebuffer::new(16, 16).unwrap();
        let mut small = Framebuffer::new(3, 3).unwrap();
        let mut stats = RenderStats::default();
        draw_triangle(&mut big, &state, None, &tri, &mut stats);
        draw_triangle(&mut small, &state, None, &tri, &mut stats);

        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(small.read_pixel(x, y), big.read_pixel(x, y), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn depth_rejection_is_counted() {
        let mut fb = Framebuffer::new(4, 4).unwrap();
        let mut stats = RenderStats::default();
        let state = RenderState::default();

        draw_triangle(&mut fb, &state, None, &red_triangle(0.5), &mut stats);
        let drawn = stats.pixels_drawn;

        // Same geometry behind the first: every covered pixel is rejected.
        let mut green = red_triangle(0.8);
        for v in &mut green {
            (v.r, v.g) = (0.0, 1.0);
        }
        draw_triangle(&mut fb, &state, None, &green, &mut stats);

        assert_eq!(stats.pixels_drawn, drawn);
        assert_eq!(stats.pixels_depth_rejected, drawn);
        assert_eq!(fb.read_pixel(1, 1), 0xF800);
    }

    #[test]
    fn depth_functions_follow_the_comparison_table() {
        let cases = [
            (DepthFunc::Never, [false, false, false]),
            (DepthFunc::Less, [true, false, false]),
            (DepthFunc::Equal, [false, true, false]),
            (DepthFunc::Lequal, [true, true, false]),
            (DepthFunc::Greater, [false, false, true]),
            (DepthFunc::NotEqual, [true, false, true]),
            (DepthFunc::Gequal, [false, true, true]),
            (DepthFunc::Always, [true, true, true]),
        ];
        // z below / equal to / above the stored value.
        let zs = [0.25f32, 0.5, 0.75];
        for (func, expect) in cases {
            for (z, want) in zs.iter().zip(expect) {
                assert_eq!(depth_pass(func, *z, 0.5), want, "{func:?} z={z}");
            }
        }
    }

    #[test]
    fn greater_func_inverts_occlusion() {
        let mut fb = Framebuffer::new(4, 4).unwrap();
        fb.clear_depth(0.0);
        let mut stats = RenderStats::default();
        let state = RenderState {
            depth_func: DepthFunc::Greater,
            ..RenderState::default()
        };

        draw_triangle(&mut fb, &state, None, &red_triangle(0.5), &mut stats);
        let mut blue = red_triangle(0.9);
        for v in &mut blue {
            (v.r, v.b) = (0.0, 1.0);
        }
        draw_triangle(&mut fb, &state, None, &blue, &mut stats);

        // With GREATER the larger z wins.
        assert_eq!(fb.read_pixel(1, 1), 0x001F);
        assert_eq!(fb.read_depth(1, 1), 0.9);
    }

    #[test]
    fn depth_write_disabled_keeps_stored_depth() {
        let mut fb = Framebuffer::new(4, 4).unwrap();
        let mut stats = RenderStats::default();
        let state = RenderState {
            depth_write: false,
            ..RenderState::default()
        };

        draw_triangle(&mut fb, &state, None, &red_triangle(0.5), &mut stats);
        assert_eq!(fb.read_pixel(1, 1), 0xF800);
        assert_eq!(fb.read_depth(1, 1), FAR_DEPTH);
    }

    #[test]
    fn perspective_correct_color_recovery() {
        // Differing w across the triangle makes affine and perspective
        // interpolation disagree; the rasterizer must produce the latter.
        let tri = [
            Vertex::new(0.0, 0.0, 0.5, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0),
            Vertex::new(16.0, 0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0),
            Vertex::new(16.0, 16.0, 0.5, 2.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0),
        ];
        let mut fb = Framebuffer::new(16, 16).unwrap();
        let mut stats = RenderStats::default();
        draw_triangle(&mut fb, &RenderState::default(), None, &tri, &mut stats);

        // Barycentric weights of the (8, 4) pixel center.
        let (la, lb, lc) = (0.46875f32, 0.25f32, 0.28125f32);
        let w = la * 1.0 + lb * 0.5 + lc * 2.0;
        let persp = [la * 1.0 / w, lb * 0.5 / w, lc * 2.0 / w];
        let affine = [la, lb, lc];

        let got = fb.read_pixel(8, 4);
        assert_eq!(got, pack_rgb565_f(persp[0], persp[1], persp[2]));
        assert_ne!(got, pack_rgb565_f(affine[0], affine[1], affine[2]));

        // The correction is visible: more than 4/255 per channel.
        for (p, a) in persp.iter().zip(affine) {
            assert!((p - a).abs() * 255.0 > 4.0);
        }
    }

    #[test]
    fn perspective_correct_uv_recovery() {
        use crate::color::BLACK;
        use crate::color::WHITE;
        use crate::state::TextureFormat;

        // Vertical stripes: left half white, right half black.
        let texels = [WHITE, BLACK, WHITE, BLACK];
        let tex = Texture::from_data(&texels, 2, 2, TextureFormat::Rgb565).unwrap();

        let tri = [
            Vertex::new(0.0, 0.0, 0.5, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0),
            Vertex::new(16.0, 0.0, 0.5, 0.25, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0),
            Vertex::new(0.0, 16.0, 0.5, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0),
        ];
        let state = RenderState {
            texturing: true,
            modulate: false,
            filter: TextureFilter::Nearest,
            ..RenderState::default()
        };
        let mut fb = Framebuffer::new(16, 16).unwrap();
        let mut stats = RenderStats::default();
        draw_triangle(&mut fb, &state, Some(&tex), &tri, &mut stats);

        // Along y=0 the affine midpoint of u would be at x=8; perspective
        // interpolation with w dropping to 0.25 pushes u=0.5 rightward.
        // u(x) = (x/16 * 0.25) / (1 + x/16 * (0.25 - 1)) reaches 0.5 only
        // past x = 12.8, so pixel (10, 0) still samples the white column.
        assert_eq!(fb.read_pixel(10, 0), WHITE);
        assert_eq!(fb.read_pixel(14, 0), BLACK);
    }

    #[test]
    fn winding_reversal_covers_identical_pixels() {
        // The CW coverage rule mirrors the CCW one, so reversing the vertex
        // order changes no pixel.
        let ccw = red_triangle(0.5);
        let cw = [ccw[0], ccw[2], ccw[1]];

        let state = RenderState::default();
        let mut fb_ccw = Framebuffer::new(4, 4).unwrap();
        let mut fb_cw = Framebuffer::new(4, 4).unwrap();
        let mut stats = RenderStats::default();
        draw_triangle(&mut fb_ccw, &state, None, &ccw, &mut stats);
        draw_triangle(&mut fb_cw, &state, None, &cw, &mut stats);

        assert_eq!(fb_ccw.color_plane(), fb_cw.color_plane());
    }

    #[test]
    fn quad_diagonal_has_no_seam_or_double_hit() {
        let mut fb = Framebuffer::new(8, 8).unwrap();
        let mut stats = RenderStats::default();
        let state = RenderState {
            depth_test: false,
            ..RenderState::default()
        };

        let t1 = [
            solid_vertex(0.0, 0.0, 0.5, 1.0, 0.0, 0.0),
            solid_vertex(4.0, 0.0, 0.5, 1.0, 0.0, 0.0),
            solid_vertex(4.0, 4.0, 0.5, 1.0, 0.0, 0.0),
        ];
        let t2 = [
            solid_vertex(0.0, 0.0, 0.5, 0.0, 0.0, 1.0),
            solid_vertex(4.0, 4.0, 0.5, 0.0, 0.0, 1.0),
            solid_vertex(0.0, 4.0, 0.5, 0.0, 0.0, 1.0),
        ];
        draw_triangle(&mut fb, &state, None, &t1, &mut stats);
        draw_triangle(&mut fb, &state, None, &t2, &mut stats);

        // The quad covers the 16 pixel centers in [0,4)x[0,4) exactly once.
        assert_eq!(stats.pixels_drawn, 16);
        for y in 0..4 {
            for x in 0..4 {
                assert_ne!(fb.read_pixel(x, y), 0x0000, "pixel ({x}, {y}) missed");
            }
        }
    }

    #[test]
    fn interpolated_z_at_pixel_center() {
        // Depth plane: z = x / 4 over the triangle.
        let tri = [
            solid_vertex(0.0, 0.0, 0.0, 1.0, 1.0, 1.0),
            solid_vertex(4.0, 0.0, 1.0, 1.0, 1.0, 1.0),
            solid_vertex(0.0, 4.0, 0.0, 1.0, 1.0, 1.0),
        ];
        let mut fb = Framebuffer::new(4, 4).unwrap();
        let mut stats = RenderStats::default();
        draw_triangle(&mut fb, &RenderState::default(), None, &tri, &mut stats);
        assert_relative_eq!(fb.read_depth(1, 0), 1.5 / 4.0, epsilon = 1e-6);
    }
}
