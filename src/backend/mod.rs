//! Render back-ends.
//!
//! The façade drives a back-end through the fixed capability set below.
//! Two variants exist: the software reference rasterizer and the hardware
//! bridge that forwards commands to the FPGA over a byte transport.

pub mod software;
pub mod uart;

pub use software::SoftwareBackend;
pub use uart::{UartBackend, UartTransport};

use crate::error::RasterError;
use crate::render::rasterizer::Vertex;
use crate::state::{RenderState, TextureFormat, TextureId};

/// Capability set shared by every back-end variant.
pub trait RenderBackend {
    /// Fill the color plane uniformly.
    fn clear_color(&mut self, color: u16) -> Result<(), RasterError>;

    /// Fill the depth plane uniformly.
    fn clear_depth(&mut self, depth: f32) -> Result<(), RasterError>;

    /// Install the render state used by subsequent triangles.
    fn set_state(&mut self, state: &RenderState) -> Result<(), RasterError>;

    /// Copy texels into back-end-owned texture storage.
    fn upload_texture(
        &mut self,
        data: &[u16],
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<TextureId, RasterError>;

    /// Rasterize one screen-space triangle.
    fn submit_triangle(&mut self, vertices: &[Vertex; 3]) -> Result<(), RasterError>;

    /// Finish the frame.
    fn present(&mut self) -> Result<(), RasterError>;
}
