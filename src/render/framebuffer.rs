//! Frame buffer: RGB565 color plane plus 32-bit float depth plane.
//!
//! The depth plane stores z in [0, 1] with 0 at the near plane; the baseline
//! depth policy is strictly-less, so smaller z wins. All per-pixel access is
//! bounds-checked and out-of-bounds writes are silently dropped.

use std::io::{self, Write};

use crate::color::unpack_rgb565;
use crate::error::RasterError;

/// Depth value of an empty (far) cell, and the out-of-bounds read default.
pub const FAR_DEPTH: f32 = 1.0;

/// Owns the color and depth planes for one render target.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    color: Vec<u16>,
    depth: Vec<f32>,
    width: u32,
    height: u32,
}

impl Framebuffer {
    /// Allocate both planes, cleared to black and [`FAR_DEPTH`].
    ///
    /// Zero-area targets are rejected with `InvalidArg`; a dimension product
    /// that cannot be represented fails with `Init`.
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidArg);
        }
        let size = (width as usize)
            .checked_mul(height as usize)
            .ok_or(RasterError::Init)?;
        Ok(Self {
            color: vec![0x0000; size],
            depth: vec![FAR_DEPTH; size],
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        (y as u32 * self.width + x as u32) as usize
    }

    /// Fill the color plane uniformly.
    pub fn clear_color(&mut self, color: u16) {
        self.color.fill(color);
    }

    /// Fill the depth plane uniformly.
    pub fn clear_depth(&mut self, depth: f32) {
        self.depth.fill(depth);
    }

    /// Fill both planes uniformly.
    pub fn clear(&mut self, color: u16, depth: f32) {
        self.clear_color(color);
        self.clear_depth(depth);
    }

    /// Write a pixel with the baseline strictly-less depth policy.
    ///
    /// With `depth_test` set the write is rejected when `z` is not strictly
    /// below the stored depth; otherwise the write is unconditional. A write
    /// always updates both color and depth. Out-of-bounds coordinates are
    /// silently ignored.
    #[inline]
    pub fn write_pixel(&mut self, x: i32, y: i32, color: u16, z: f32, depth_test: bool) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = self.index(x, y);
        if depth_test && z >= self.depth[idx] {
            return;
        }
        self.color[idx] = color;
        self.depth[idx] = z;
    }

    /// Store a color (and optionally depth) with no comparison.
    ///
    /// The rasterizer calls this after resolving its own depth function, so
    /// the depth-write flag is honored independently of the test.
    #[inline]
    pub(crate) fn store(&mut self, x: i32, y: i32, color: u16, z: f32, write_depth: bool) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = self.index(x, y);
        self.color[idx] = color;
        if write_depth {
            self.depth[idx] = z;
        }
    }

    /// Color at (x, y); out-of-bounds reads return 0x0000.
    #[inline]
    pub fn read_pixel(&self, x: i32, y: i32) -> u16 {
        if self.in_bounds(x, y) {
            self.color[self.index(x, y)]
        } else {
            0x0000
        }
    }

    /// Depth at (x, y); out-of-bounds reads return [`FAR_DEPTH`].
    #[inline]
    pub fn read_depth(&self, x: i32, y: i32) -> f32 {
        if self.in_bounds(x, y) {
            self.depth[self.index(x, y)]
        } else {
            FAR_DEPTH
        }
    }

    /// The color plane as a contiguous row-major texel slice.
    pub fn color_plane(&self) -> &[u16] {
        &self.color
    }

    /// The color plane as little-endian bytes, the readback format shared
    /// with the hardware.
    pub fn color_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.color.len() * 2);
        for texel in &self.color {
            bytes.extend_from_slice(&texel.to_le_bytes());
        }
        bytes
    }

    /// Export the color plane as a binary PPM image.
    ///
    /// Header is `P6\n<W> <H>\n255\n` followed by width*height RGB triplets
    /// unpacked from RGB565.
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        for texel in &self.color {
            let (r, g, b) = unpack_rgb565(*texel);
            out.write_all(&[r, g, b])?;
        }
        Ok(())
    }
}
