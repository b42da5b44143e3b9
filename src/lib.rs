//! Lane-batched coherent noise for terrain and texture maps.
//!
//! The [`noise`] module evaluates gradient and cellular noise over coordinate
//! arrays. [`maps`] composes named layers from a JSON description and
//! [`export`] writes them out as BMP or PNG images.

pub mod export;
pub mod maps;
pub mod noise;

pub use maps::{MapSet, MapSetConfig, generate_map_set};
pub use noise::{GradientMode, LaneWidth, NoiseError};
