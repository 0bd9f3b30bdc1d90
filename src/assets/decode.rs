//! Image decoding for textures and the HDR sky panorama
//!
//! Everything comes out as sRGB-encoded RGBA8 so the renderer uploads one
//! texture format. HDR panoramas are tone-mapped on the loading thread.

use std::path::Path;

use crate::error::{DioramaError, Result};

/// Decoded pixels ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

fn decode(path: &Path) -> Result<image::DynamicImage> {
    let bytes = std::fs::read(path).map_err(|source| DioramaError::AssetIo {
        path: path.to_path_buf(),
        source,
    })?;
    image::load_from_memory(&bytes).map_err(|source| DioramaError::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads a JPEG or PNG as RGBA8
pub fn load_rgba(path: &Path) -> Result<DecodedImage> {
    let rgba = decode(path)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

/// Loads a Radiance HDR panorama and tone-maps it to sRGB RGBA8
pub fn load_hdr_panorama(path: &Path) -> Result<DecodedImage> {
    let hdr = decode(path)?.to_rgb32f();
    let (width, height) = hdr.dimensions();

    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
    for pixel in hdr.pixels() {
        let [r, g, b] = tonemap_to_srgb8(pixel.0);
        rgba.extend_from_slice(&[r, g, b, 255]);
    }

    Ok(DecodedImage { width, height, rgba })
}

/// Reinhard tone mapping followed by sRGB encoding
pub fn tonemap_to_srgb8(linear: [f32; 3]) -> [u8; 3] {
    linear.map(|c| {
        let c = c.max(0.0);
        let mapped = c / (1.0 + c);
        (linear_to_srgb(mapped) * 255.0).round().clamp(0.0, 255.0) as u8
    })
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}
