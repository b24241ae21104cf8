//! Render state and its enumerations.
//!
//! The enum discriminants are stable: external callers and the RTL command
//! parser share them, so they must never be renumbered.

/// Depth comparison function applied against the stored depth value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DepthFunc {
    /// Rejects every fragment.
    Never = 0,
    #[default]
    Less = 1,
    Equal = 2,
    Lequal = 3,
    Greater = 4,
    NotEqual = 5,
    Gequal = 6,
    /// Passes every fragment.
    Always = 7,
}

/// Blend factor selectors.
///
/// Accepted as configuration; the software reference writes pixels
/// unblended (see the `RenderState::blend_enable` docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlendFactor {
    Zero = 0,
    SrcAlpha = 1,
    SrcColor = 2,
    DstAlpha = 3,
    DstColor = 4,
    One = 5,
    OneMinusSrcAlpha = 6,
    OneMinusSrcColor = 7,
    OneMinusDstAlpha = 8,
    OneMinusDstColor = 9,
    AlphaSaturate = 10,
}

/// Where the fragment alpha comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AlphaSource {
    #[default]
    Texture = 0,
    Vertex = 1,
    Constant = 2,
    One = 3,
}

/// Texel storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TextureFormat {
    #[default]
    Rgb565 = 0,
    /// Hardware path only; the software reference samples it nearest-only.
    Rgba4444 = 1,
}

/// Texture minification/magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TextureFilter {
    #[default]
    Nearest = 0,
    Bilinear = 1,
}

/// Handle to a texture owned by a back-end's texture table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureId(pub(crate) u32);

/// Per-draw render state, sampled once per triangle and held stable for all
/// of that triangle's pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_func: DepthFunc,
    /// Accepted but not applied: pixels are written unblended. Depth writes
    /// follow `depth_write` independently of this flag.
    pub blend_enable: bool,
    pub blend_src: BlendFactor,
    pub blend_dst: BlendFactor,
    pub texturing: bool,
    /// Bound texture; `None` falls back to the vertex-color path even with
    /// texturing enabled.
    pub texture: Option<TextureId>,
    pub filter: TextureFilter,
    /// Multiply sampled texels by the interpolated vertex color.
    pub modulate: bool,
    pub alpha_source: AlphaSource,
    pub const_alpha: u8,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
            depth_func: DepthFunc::Less,
            blend_enable: false,
            blend_src: BlendFactor::One,
            blend_dst: BlendFactor::Zero,
            texturing: false,
            texture: None,
            filter: TextureFilter::Nearest,
            modulate: true,
            alpha_source: AlphaSource::Texture,
            const_alpha: 0xFF,
        }
    }
}
