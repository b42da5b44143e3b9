//! Map sets: named noise layers composed over one grid.
//!
//! Layers are described in JSON, evaluated with the noise core, rescaled to
//! 8-bit grayscale and optionally masked against each other.

mod config;
mod layer;

pub use config::{CellularOutput, ConfigError, LandMask, LayerConfig, LayerKind, MapSetConfig};
pub use layer::{MapError, MapLayer, MapSet, generate_map_set, rescale_to_bytes};
