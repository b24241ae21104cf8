//! 2-D texture storage and sampling.
//!
//! Texels are 16-bit values (RGB565, or RGBA4444 for the hardware path).
//! Dimensions are powers of two no larger than [`MAX_TEXTURE_DIM`] so that
//! wraparound reduces to a bit mask, the same trick the hardware texture
//! unit uses.
//!
//! # UV Coordinate Convention
//! UVs wrap into [0, 1) by taking the fractional part (adding 1 if
//! negative), then scale to texel space. Sampling is therefore invariant
//! under integer UV offsets.

use std::fmt;
use std::path::Path;

use crate::color::{pack_rgb565, unpack_rgb565, unpack_rgba4444};
use crate::error::RasterError;
use crate::state::{TextureFilter, TextureFormat};

/// Largest permitted texture width or height, in texels.
pub const MAX_TEXTURE_DIM: u32 = 256;

/// Errors from decoding a texture image file.
#[derive(Debug)]
pub enum LoadError {
    Image(image::ImageError),
    /// Dimensions are not powers of two, or exceed [`MAX_TEXTURE_DIM`].
    Dimensions { width: u32, height: u32 },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Image(e) => write!(f, "failed to decode image: {}", e),
            LoadError::Dimensions { width, height } => write!(
                f,
                "texture dimensions {}x{} must be powers of two and at most {}",
                width, height, MAX_TEXTURE_DIM
            ),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for LoadError {
    fn from(e: image::ImageError) -> Self {
        LoadError::Image(e)
    }
}

/// A 2-D texture referenced by the render state while bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    data: Vec<u16>,
    width: u32,
    height: u32,
    format: TextureFormat,
}

fn valid_dim(d: u32) -> bool {
    d > 0 && d.is_power_of_two() && d <= MAX_TEXTURE_DIM
}

impl Texture {
    /// Create a texture from raw 16-bit texels.
    ///
    /// Fails with `InvalidArg` when a dimension is zero, not a power of two,
    /// larger than [`MAX_TEXTURE_DIM`], or when `data` does not hold exactly
    /// `width * height` texels.
    pub fn from_data(
        data: &[u16],
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<Self, RasterError> {
        if !valid_dim(width) || !valid_dim(height) {
            return Err(RasterError::InvalidArg);
        }
        if data.len() != (width * height) as usize {
            return Err(RasterError::InvalidArg);
        }
        Ok(Self {
            data: data.to_vec(),
            width,
            height,
            format,
        })
    }

    /// Load a texture from an image file (PNG, JPG, etc.), quantizing to
    /// RGB565. Dimensions must satisfy the same constraints as
    /// [`Texture::from_data`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let img = image::open(path)?.to_rgb8();
        let (width, height) = img.dimensions();

        if !valid_dim(width) || !valid_dim(height) {
            return Err(LoadError::Dimensions { width, height });
        }

        let data: Vec<u16> = img
            .pixels()
            .map(|p| {
                let [r, g, b] = p.0;
                pack_rgb565(r, g, b)
            })
            .collect();

        Ok(Self {
            data,
            width,
            height,
            format: TextureFormat::Rgb565,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Raw texel at wrapped integer coordinates.
    #[inline]
    fn texel(&self, x: u32, y: u32) -> u16 {
        self.data[(y * self.width + x) as usize]
    }

    /// 8-bit RGB of the texel at wrapped integer coordinates, decoded per
    /// the texture format.
    #[inline]
    fn texel_rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        match self.format {
            TextureFormat::Rgb565 => unpack_rgb565(self.texel(x, y)),
            TextureFormat::Rgba4444 => {
                let (r, g, b, _a) = unpack_rgba4444(self.texel(x, y));
                (r, g, b)
            }
        }
    }

    /// Wrap a UV coordinate into [0, 1).
    #[inline]
    fn wrap(t: f32) -> f32 {
        t - t.floor()
    }

    /// Sample with nearest-neighbor filtering: `x = floor(u*W) mod W`.
    ///
    /// Returns the raw texel in the texture's storage format.
    #[inline]
    pub fn sample_nearest(&self, u: f32, v: f32) -> u16 {
        let u = Self::wrap(u);
        let v = Self::wrap(v);
        // Dimensions are powers of two, so modulo is a mask.
        let x = (u * self.width as f32) as u32 & (self.width - 1);
        let y = (v * self.height as f32) as u32 & (self.height - 1);
        self.texel(x, y)
    }

    /// Sample with bilinear filtering and wraparound; returns RGB565.
    ///
    /// The sample point shifts by half a texel so that texel centers sample
    /// exactly; the four neighbor coordinates wrap, so negatives fetch from
    /// the opposite border.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> u16 {
        let tx = Self::wrap(u) * self.width as f32 - 0.5;
        let ty = Self::wrap(v) * self.height as f32 - 0.5;

        let x0 = tx.floor() as i32;
        let y0 = ty.floor() as i32;
        let fx = tx - x0 as f32;
        let fy = ty - y0 as f32;

        let xm = (self.width - 1) as i32;
        let ym = (self.height - 1) as i32;
        let x0 = (x0 & xm) as u32;
        let x1 = ((x0 as i32 + 1) & xm) as u32;
        let y0 = (y0 & ym) as u32;
        let y1 = ((y0 as i32 + 1) & ym) as u32;

        let (r00, g00, b00) = self.texel_rgb(x0, y0);
        let (r10, g10, b10) = self.texel_rgb(x1, y0);
        let (r01, g01, b01) = self.texel_rgb(x0, y1);
        let (r11, g11, b11) = self.texel_rgb(x1, y1);

        let w00 = (1.0 - fx) * (1.0 - fy);
        let w10 = fx * (1.0 - fy);
        let w01 = (1.0 - fx) * fy;
        let w11 = fx * fy;

        let blend = |c00: u8, c10: u8, c01: u8, c11: u8| -> u8 {
            (w00 * c00 as f32 + w10 * c10 as f32 + w01 * c01 as f32 + w11 * c11 as f32).round()
                as u8
        };

        pack_rgb565(
            blend(r00, r10, r01, r11),
            blend(g00, g10, g01, g11),
            blend(b00, b10, b01, b11),
        )
    }

    /// Sample as 8-bit RGB with the given filter.
    #[inline]
    pub fn sample_rgb8(&self, u: f32, v: f32, filter: TextureFilter) -> (u8, u8, u8) {
        match filter {
            TextureFilter::Nearest => {
                let texel = self.sample_nearest(u, v);
                match self.format {
                    TextureFormat::Rgb565 => unpack_rgb565(texel),
                    TextureFormat::Rgba4444 => {
                        let (r, g, b, _a) = unpack_rgba4444(texel);
                        (r, g, b)
                    }
                }
            }
            TextureFilter::Bilinear => unpack_rgb565(self.sample_bilinear(u, v)),
        }
    }
}
