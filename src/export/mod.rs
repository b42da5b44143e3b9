//! Export of generated map sets to image files.
//!
//! Supports uncompressed 24-bit BMP and 8-bit grayscale PNG. Both name their
//! files `{base_name}_{layer}.{ext}`.

mod bmp;
mod png;

pub use bmp::{
    BmpExportError, PIXEL_DATA_OFFSET, export_layer_bmp, export_map_set_bmp, expected_bmp_size,
    gray_to_rgb, write_bmp,
};
pub use png::{PngExportError, PngExportOptions, export_layer_png, export_map_set_png};
