//! Uncompressed 24-bit BMP export.
//!
//! Layout: 14-byte file header, 40-byte info header, then pixel rows from the
//! bottom of the image upwards. Each row holds BGR triples and is zero-padded
//! to a multiple of four bytes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::maps::{MapLayer, MapSet};

/// Errors that can occur during BMP export.
#[derive(Error, Debug)]
pub enum BmpExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid dimensions: {width}x{height} with {pixels} pixels")]
    InvalidDimensions { width: u32, height: u32, pixels: usize },
}

const FILE_HEADER_SIZE: u32 = 14;
const INFO_HEADER_SIZE: u32 = 40;
/// Offset of the first pixel byte.
pub const PIXEL_DATA_OFFSET: u32 = FILE_HEADER_SIZE + INFO_HEADER_SIZE;
/// Horizontal and vertical resolution, roughly 72 DPI.
const PIXELS_PER_METER: i32 = 2835;

fn row_padding(width: u32) -> u64 {
    (4 - (3 * width as u64) % 4) % 4
}

fn row_stride(width: u32) -> u64 {
    3 * width as u64 + row_padding(width)
}

/// Total file size of a `width`×`height` bitmap.
pub fn expected_bmp_size(width: u32, height: u32) -> u64 {
    PIXEL_DATA_OFFSET as u64 + height as u64 * row_stride(width)
}

/// Expands grayscale bytes to RGB triples.
pub fn gray_to_rgb(bytes: &[u8]) -> Vec<[u8; 3]> {
    bytes.iter().map(|&v| [v, v, v]).collect()
}

/// Writes `rgb` (row-major, top row first) as a 24-bit BMP.
pub fn write_bmp<W: Write>(
    writer: &mut W,
    width: u32,
    height: u32,
    rgb: &[[u8; 3]],
) -> Result<(), BmpExportError> {
    let invalid = || BmpExportError::InvalidDimensions {
        width,
        height,
        pixels: rgb.len(),
    };
    if width == 0 || height == 0 || rgb.len() != width as usize * height as usize {
        return Err(invalid());
    }
    let file_size = u32::try_from(expected_bmp_size(width, height)).map_err(|_| invalid())?;
    let image_size = file_size - PIXEL_DATA_OFFSET;
    let signed_width = i32::try_from(width).map_err(|_| invalid())?;
    let signed_height = i32::try_from(height).map_err(|_| invalid())?;

    let mut header = Vec::with_capacity(PIXEL_DATA_OFFSET as usize);
    header.extend_from_slice(b"BM");
    header.extend_from_slice(&file_size.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(&PIXEL_DATA_OFFSET.to_le_bytes());

    header.extend_from_slice(&INFO_HEADER_SIZE.to_le_bytes());
    header.extend_from_slice(&signed_width.to_le_bytes());
    header.extend_from_slice(&signed_height.to_le_bytes());
    header.extend_from_slice(&1u16.to_le_bytes()); // planes
    header.extend_from_slice(&24u16.to_le_bytes()); // bits per pixel
    header.extend_from_slice(&0u32.to_le_bytes()); // BI_RGB
    header.extend_from_slice(&image_size.to_le_bytes());
    header.extend_from_slice(&PIXELS_PER_METER.to_le_bytes());
    header.extend_from_slice(&PIXELS_PER_METER.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes()); // palette colors
    header.extend_from_slice(&0u32.to_le_bytes()); // important colors
    writer.write_all(&header)?;

    let padding = row_padding(width) as usize;
    let mut row = Vec::with_capacity(row_stride(width) as usize);
    for pixels in rgb.chunks_exact(width as usize).rev() {
        row.clear();
        for &[r, g, b] in pixels {
            row.extend_from_slice(&[b, g, r]);
        }
        row.resize(row.len() + padding, 0);
        writer.write_all(&row)?;
    }

    Ok(())
}

/// Exports one grayscale layer as a BMP file.
pub fn export_layer_bmp(
    layer: &MapLayer,
    width: u32,
    height: u32,
    path: &Path,
) -> Result<(), BmpExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_bmp(&mut writer, width, height, &gray_to_rgb(&layer.bytes))?;
    writer.flush()?;
    debug!(path = %path.display(), layer = %layer.name, "Wrote BMP");
    Ok(())
}

/// Exports every layer of a map set.
///
/// Files are named `{base_name}_{layer}.bmp`. Returns the written paths.
pub fn export_map_set_bmp(
    set: &MapSet,
    output_dir: &Path,
    base_name: &str,
) -> Result<Vec<PathBuf>, BmpExportError> {
    std::fs::create_dir_all(output_dir)?;

    let mut written = Vec::with_capacity(set.layers.len());
    for layer in &set.layers {
        let path = output_dir.join(format!("{}_{}.bmp", base_name, layer.name));
        export_layer_bmp(layer, set.width, set.height, &path)?;
        written.push(path);
    }
    Ok(written)
}
