//! 8-bit grayscale PNG export for map layers.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;
use tracing::debug;

use crate::maps::{MapLayer, MapSet};

/// Errors that can occur during PNG export.
#[derive(Error, Debug)]
pub enum PngExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid dimensions: {width}x{height} with {pixels} pixels")]
    InvalidDimensions { width: u32, height: u32, pixels: usize },
}

/// Options for PNG export.
#[derive(Debug, Clone)]
pub struct PngExportOptions {
    /// PNG compression type.
    pub compression: CompressionType,
    /// PNG filter type.
    pub filter: FilterType,
}

impl Default for PngExportOptions {
    fn default() -> Self {
        Self {
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

/// Exports one grayscale layer as an 8-bit PNG.
pub fn export_layer_png(
    layer: &MapLayer,
    width: u32,
    height: u32,
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), PngExportError> {
    if width == 0 || height == 0 || layer.bytes.len() != width as usize * height as usize {
        return Err(PngExportError::InvalidDimensions {
            width,
            height,
            pixels: layer.bytes.len(),
        });
    }

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, options.compression, options.filter);
    encoder.write_image(&layer.bytes, width, height, ExtendedColorType::L8)?;

    debug!(path = %path.display(), layer = %layer.name, "Wrote PNG");
    Ok(())
}

/// Exports every layer of a map set.
///
/// Files are named `{base_name}_{layer}.png`. Returns the written paths.
pub fn export_map_set_png(
    set: &MapSet,
    output_dir: &Path,
    base_name: &str,
    options: &PngExportOptions,
) -> Result<Vec<PathBuf>, PngExportError> {
    std::fs::create_dir_all(output_dir)?;

    let mut written = Vec::with_capacity(set.layers.len());
    for layer in &set.layers {
        let path = output_dir.join(format!("{}_{}.png", base_name, layer.name));
        export_layer_png(layer, set.width, set.height, &path, options)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::LaneWidth;
    use tempfile::tempdir;

    fn ramp_layer(width: u32, height: u32) -> MapLayer {
        MapLayer {
            name: "ramp".to_string(),
            min: -1.0,
            max: 1.0,
            bytes: (0..width * height).map(|i| (i * 7 % 256) as u8).collect(),
        }
    }

    #[test]
    fn test_export_layer_png_round_trip() {
        let layer = ramp_layer(13, 9);
        let dir = tempdir().unwrap();
        let path = dir.path().join("ramp.png");

        export_layer_png(&layer, 13, 9, &path, &PngExportOptions::default()).unwrap();

        let decoded = image::open(&path).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (13, 9));
        assert_eq!(decoded.into_raw(), layer.bytes);
    }

    #[test]
    fn test_rejects_mismatched_size() {
        let layer = ramp_layer(4, 4);
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.png");
        let result = export_layer_png(&layer, 5, 4, &path, &PngExportOptions::default());
        assert!(matches!(result, Err(PngExportError::InvalidDimensions { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_export_map_set_png() {
        let set = MapSet {
            width: 8,
            height: 2,
            seed: 0,
            lane_width: LaneWidth::Scalar,
            layers: vec![ramp_layer(8, 2)],
        };
        let dir = tempdir().unwrap();
        let written =
            export_map_set_png(&set, dir.path(), "map", &PngExportOptions::default()).unwrap();
        assert_eq!(written, vec![dir.path().join("map_ramp.png")]);
        assert!(written[0].exists());
    }
}
