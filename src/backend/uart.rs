//! Hardware-bridge back-end: triangle commands over a UART byte stream.
//!
//! The software pipeline keeps floating point throughout; conversion to the
//! hardware's S15.16 fixed point happens only here, at the wire boundary.
//! A triangle command is a 1-byte opcode (0x03) followed by the 30 vertex
//! fields (v0, v1, v2 x (x, y, z, w, u, v, r, g, b, a)) packed little-endian
//! as 32-bit signed fixed point, 120 payload bytes in total.
//!
//! Only triangle submission is defined by the command protocol; the other
//! capabilities report [`RasterError::Backend`].

use std::fmt;

use tracing::trace;

use super::RenderBackend;
use crate::error::RasterError;
use crate::render::rasterizer::Vertex;
use crate::state::{RenderState, TextureFormat, TextureId};

/// Opcode of the triangle command.
pub const OPCODE_TRIANGLE: u8 = 0x03;

/// Full length of an encoded triangle command: opcode + 30 S15.16 fields.
pub const TRIANGLE_CMD_LEN: usize = 1 + 30 * 4;

/// Byte-level transport to the hardware (UART, or a capture in tests).
pub trait UartTransport {
    type Error: fmt::Debug;

    /// Write the full byte slice, blocking until accepted.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Quantize to S15.16 fixed point (truncating toward zero).
#[inline]
pub fn to_fixed(v: f32) -> i32 {
    (v * 65536.0) as i32
}

/// Recover the f32 value of an S15.16 field.
#[inline]
pub fn from_fixed(v: i32) -> f32 {
    v as f32 / 65536.0
}

/// Encode one triangle into its wire command.
pub fn encode_triangle(vertices: &[Vertex; 3]) -> [u8; TRIANGLE_CMD_LEN] {
    let mut cmd = [0u8; TRIANGLE_CMD_LEN];
    cmd[0] = OPCODE_TRIANGLE;
    let mut off = 1;
    for v in vertices {
        for field in [v.x, v.y, v.z, v.w, v.u, v.v, v.r, v.g, v.b, v.a] {
            cmd[off..off + 4].copy_from_slice(&to_fixed(field).to_le_bytes());
            off += 4;
        }
    }
    cmd
}

/// Hardware-bridge variant of the render back-end.
pub struct UartBackend<T: UartTransport> {
    uart: T,
}

impl<T: UartTransport> UartBackend<T> {
    pub fn new(uart: T) -> Self {
        Self { uart }
    }

    /// Hand the transport back, e.g. to inspect a test capture.
    pub fn into_inner(self) -> T {
        self.uart
    }
}

impl<T: UartTransport> RenderBackend for UartBackend<T> {
    fn clear_color(&mut self, _color: u16) -> Result<(), RasterError> {
        Err(RasterError::Backend)
    }

    fn clear_depth(&mut self, _depth: f32) -> Result<(), RasterError> {
        Err(RasterError::Backend)
    }

    fn set_state(&mut self, _state: &RenderState) -> Result<(), RasterError> {
        Err(RasterError::Backend)
    }

    fn upload_texture(
        &mut self,
        _data: &[u16],
        _width: u32,
        _height: u32,
        _format: TextureFormat,
    ) -> Result<TextureId, RasterError> {
        Err(RasterError::Backend)
    }

    fn submit_triangle(&mut self, vertices: &[Vertex; 3]) -> Result<(), RasterError> {
        let cmd = encode_triangle(vertices);
        self.uart
            .write_bytes(&cmd)
            .map_err(|_| RasterError::Backend)?;
        trace!(len = cmd.len(), "triangle command written");
        Ok(())
    }

    fn present(&mut self) -> Result<(), RasterError> {
        Err(RasterError::Backend)
    }
}
