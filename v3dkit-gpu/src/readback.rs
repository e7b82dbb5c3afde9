//! Color attachment readback: row pitch, packing and vertical flip

use v3dkit_core::{Error, Result};

/// Bytes per RGBA8 pixel
pub const BYTES_PER_PIXEL: u32 = 4;

/// Row stride the device requires for texture-to-buffer copies
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Copy `height` rows of `width * 4` bytes out of a pitched buffer, dropping the padding
pub fn pack_rows(src: &[u8], row_pitch: usize, width: u32, height: u32) -> Result<Vec<u8>> {
    let row_bytes = (width * BYTES_PER_PIXEL) as usize;
    if row_pitch < row_bytes {
        return Err(Error::InvalidData(format!(
            "row pitch {} is smaller than a {} byte row",
            row_pitch, row_bytes
        )));
    }
    let height = height as usize;
    let needed = if height == 0 { 0 } else { row_pitch * (height - 1) + row_bytes };
    if src.len() < needed {
        return Err(Error::InvalidData(format!(
            "readback holds {} bytes, {} needed",
            src.len(),
            needed
        )));
    }

    let mut packed = Vec::with_capacity(row_bytes * height);
    for row in 0..height {
        let start = row * row_pitch;
        packed.extend_from_slice(&src[start..start + row_bytes]);
    }
    Ok(packed)
}

/// Reverse the order of the rows in place
pub fn flip_rows(pixels: &mut [u8], row_bytes: usize) {
    if row_bytes == 0 {
        return;
    }
    let rows = pixels.len() / row_bytes;
    for top in 0..rows / 2 {
        let bottom = rows - 1 - top;
        let (upper, lower) = pixels.split_at_mut(bottom * row_bytes);
        upper[top * row_bytes..(top + 1) * row_bytes].swap_with_slice(&mut lower[..row_bytes]);
    }
}

/// Order of rows in a readback buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    TopDown,
    BottomUp,
}

/// Tightly packed RGBA8 pixels read back from the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub row_order: RowOrder,
}

impl RenderedImage {
    /// Row-major, top-to-bottom pixels
    pub fn into_top_down(mut self) -> Self {
        if self.row_order == RowOrder::BottomUp {
            flip_rows(&mut self.pixels, (self.width * BYTES_PER_PIXEL) as usize);
            self.row_order = RowOrder::TopDown;
        }
        self
    }

    /// RGBA of a pixel in the image's current row order
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * BYTES_PER_PIXEL) as usize;
        let p = self.pixels.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Simulate a device whose rows are padded past `width * 4`
    fn pitched_source(width: u32, height: u32, pitch: usize) -> Vec<u8> {
        let mut src = vec![0xEE; pitch * height as usize];
        for y in 0..height as usize {
            for x in 0..(width * 4) as usize {
                src[y * pitch + x] = (y * 16 + x) as u8;
            }
        }
        src
    }

    #[test]
    fn test_padded_bytes_per_row() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(100), 512);
    }

    #[test]
    fn test_pack_rows_drops_padding() {
        let (width, height, pitch) = (3, 4, 20);
        let src = pitched_source(width, height, pitch);
        let packed = pack_rows(&src, pitch, width, height).unwrap();

        assert_eq!(packed.len(), (width * 4 * height) as usize);
        assert!(!packed.contains(&0xEE));
        assert_eq!(&packed[12..24], &src[20..32]);
    }

    #[test]
    fn test_flipped_readback_row_zero_is_last_source_row() {
        let (width, height, pitch) = (2, 3, 16);
        let src = pitched_source(width, height, pitch);
        let image = RenderedImage {
            width,
            height,
            pixels: pack_rows(&src, pitch, width, height).unwrap(),
            row_order: RowOrder::BottomUp,
        }
        .into_top_down();

        assert_eq!(image.row_order, RowOrder::TopDown);
        assert_eq!(&image.pixels[..8], &src[2 * pitch..2 * pitch + 8]);
        assert_eq!(&image.pixels[16..24], &src[..8]);
        assert_eq!(image.pixel(0, 1), Some([16, 17, 18, 19]));
    }

    #[test]
    fn test_pack_rows_rejects_short_buffers() {
        assert!(pack_rows(&[0u8; 10], 8, 3, 1).is_err());
        assert!(pack_rows(&[0u8; 30], 16, 4, 2).is_err());
    }

    #[test]
    fn test_top_down_image_is_not_flipped() {
        let image = RenderedImage {
            width: 1,
            height: 2,
            pixels: vec![1, 1, 1, 1, 2, 2, 2, 2],
            row_order: RowOrder::TopDown,
        };
        assert_eq!(image.clone().into_top_down(), image);
    }
}
