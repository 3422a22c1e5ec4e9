// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pixel buffers: owned RGBA8 rasters produced by a page renderer, with the
// per-pixel math (luma, alpha compositing) the transforms need. Encoding goes
// through the `image` crate.

use image::{DynamicImage, ImageFormat, RgbaImage};
use pressproof_core::error::PressproofError;
use tracing::{debug, instrument};

/// Bytes per RGBA8 pixel.
pub const CHANNELS: usize = 4;

/// Owned RGBA8 raster with an explicit row stride.
///
/// Rows may be padded (`stride >= width * 4`); padding bytes are never read
/// as pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    // -- Construction ---------------------------------------------------------

    /// Opaque white buffer.
    pub fn white(width: u32, height: u32) -> Self {
        Self::filled(width, height, [255, 255, 255, 255])
    }

    /// Buffer where every pixel has the given RGBA value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            stride: width as usize * CHANNELS,
            data,
        }
    }

    /// Wrap tightly packed RGBA8 rows.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PressproofError> {
        Self::from_rgba_with_stride(width, height, width as usize * CHANNELS, data)
    }

    /// Wrap RGBA8 rows that are `stride` bytes apart.
    pub fn from_rgba_with_stride(
        width: u32,
        height: u32,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self, PressproofError> {
        let row_bytes = width as usize * CHANNELS;
        if stride < row_bytes {
            return Err(PressproofError::ImageError(format!(
                "stride {stride} shorter than a {width}-pixel row"
            )));
        }
        let needed = match height {
            0 => 0,
            h => stride * (h as usize - 1) + row_bytes,
        };
        if data.len() < needed {
            return Err(PressproofError::ImageError(format!(
                "pixel buffer holds {} bytes, {width}x{height} needs {needed}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// Take the pixels of an `image` crate buffer.
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            stride: width as usize * CHANNELS,
            data: image.into_raw(),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// One row of pixels without padding.
    ///
    /// # Panics
    ///
    /// If `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {y} outside a {}-row buffer", self.height);
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * CHANNELS]
    }

    /// RGBA value at (x, y), or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Overwrite the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// If (x, y) lies outside the buffer. A column past `width` would
    /// otherwise land in row padding or the next row.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside a {}x{} buffer",
            self.width,
            self.height
        );
        let i = self.offset(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&rgba);
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride + x as usize * CHANNELS
    }

    /// Iterate over every pixel in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        (0..self.height).flat_map(move |y| {
            self.row(y)
                .chunks_exact(CHANNELS)
                .map(|px| [px[0], px[1], px[2], px[3]])
        })
    }

    // -- Transformations ------------------------------------------------------

    /// Replace every pixel's colour channels with its luma; alpha is kept.
    #[instrument(skip(self), fields(width = self.width, height = self.height))]
    pub fn apply_luma(&mut self) {
        let row_bytes = self.width as usize * CHANNELS;
        for y in 0..self.height as usize {
            let start = y * self.stride;
            for px in self.data[start..start + row_bytes].chunks_exact_mut(CHANNELS) {
                let gray = luma(px[0], px[1], px[2]);
                px[0] = gray;
                px[1] = gray;
                px[2] = gray;
            }
        }
        debug!("Luma conversion complete");
    }

    // -- Output ---------------------------------------------------------------

    /// Tightly packed RGB8 bytes with alpha composited over white.
    pub fn to_rgb8_over_white(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for [r, g, b, a] in self.pixels() {
            let (r, g, b) = composite_over_white(r, g, b, a);
            rgb.push((r * 255.0).round() as u8);
            rgb.push((g * 255.0).round() as u8);
            rgb.push((b * 255.0).round() as u8);
        }
        rgb
    }

    /// Copy into an `image` crate buffer (drops row padding).
    pub fn to_rgba_image(&self) -> Result<RgbaImage, PressproofError> {
        let mut packed = Vec::with_capacity(self.width as usize * self.height as usize * CHANNELS);
        for y in 0..self.height {
            packed.extend_from_slice(self.row(y));
        }
        RgbaImage::from_raw(self.width, self.height, packed).ok_or_else(|| {
            PressproofError::ImageError("pixel data does not match dimensions".into())
        })
    }

    /// Encode as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, PressproofError> {
        let image = DynamicImage::ImageRgba8(self.to_rgba_image()?);
        encode_to_format(&image, ImageFormat::Png)
    }
}

/// ITU-R BT.601 luma: `0.299 R + 0.587 G + 0.114 B`, rounded.
///
/// A gray input maps to itself, so applying it twice changes nothing.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}

/// Normalise RGB to 0–1 and composite it over a white background.
pub fn composite_over_white(r: u8, g: u8, b: u8, a: u8) -> (f32, f32, f32) {
    let alpha = a as f32 / 255.0;
    let blend = |c: u8| (c as f32 / 255.0) * alpha + (1.0 - alpha);
    (blend(r), blend(g), blend(b))
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(
    image: &DynamicImage,
    format: ImageFormat,
) -> Result<Vec<u8>, PressproofError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        PressproofError::ImageError(format!("image encoding failed: {}", err))
    })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_of_gray_is_identity() {
        for v in 0..=255u8 {
            assert_eq!(luma(v, v, v), v, "gray level {v} drifted");
        }
    }

    #[test]
    fn luma_weights() {
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn apply_luma_twice_is_stable() {
        let mut buffer = PixelBuffer::white(3, 2);
        buffer.set_pixel(0, 0, [200, 30, 90, 255]);
        buffer.set_pixel(2, 1, [10, 250, 40, 128]);

        buffer.apply_luma();
        let once = buffer.clone();
        buffer.apply_luma();
        assert_eq!(buffer, once);

        let [r, g, b, a] = buffer.pixel(2, 1).unwrap();
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 128);
    }

    #[test]
    fn stride_padding_is_ignored() {
        // Two 1-pixel rows, each padded to 8 bytes.
        let data = vec![
            1, 2, 3, 255, 9, 9, 9, 9, //
            4, 5, 6, 255, 9, 9, 9, 9,
        ];
        let mut buffer = PixelBuffer::from_rgba_with_stride(1, 2, 8, data).unwrap();
        assert_eq!(buffer.pixels().count(), 2);
        assert_eq!(buffer.pixel(0, 1), Some([4, 5, 6, 255]));
        // Column 1 would read row padding.
        assert_eq!(buffer.pixel(1, 0), None);
        assert_eq!(buffer.pixel(0, 2), None);

        buffer.apply_luma();
        let image = buffer.to_rgba_image().unwrap();
        assert_eq!(image.dimensions(), (1, 2));
    }

    #[test]
    #[should_panic(expected = "outside a 1x2 buffer")]
    fn set_pixel_refuses_padding_column() {
        let mut buffer = PixelBuffer::from_rgba_with_stride(1, 2, 8, vec![0; 12]).unwrap();
        buffer.set_pixel(1, 0, [1, 2, 3, 4]);
    }

    #[test]
    fn short_buffer_rejected() {
        let err = PixelBuffer::from_rgba(4, 4, vec![0; 10]).unwrap_err();
        assert!(matches!(err, PressproofError::ImageError(_)));
    }

    #[test]
    fn transparent_pixel_composites_to_white() {
        let buffer = PixelBuffer::filled(1, 1, [0, 0, 0, 0]);
        assert_eq!(buffer.to_rgb8_over_white(), vec![255, 255, 255]);
    }

    #[test]
    fn png_encoding_produces_signature() {
        let png = PixelBuffer::white(4, 4).to_png_bytes().unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }
}
