//! Layer composition: evaluates every configured layer over the map grid
//! and turns it into an 8-bit grayscale plane.

use std::collections::HashMap;
use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};
use wide::{f32x4, f32x8};

use super::config::{CellularOutput, ConfigError, LayerConfig, LayerKind, MapSetConfig};
use crate::noise::{
    evaluate_cellular_2d_with, evaluate_cellular_3d_with, evaluate_gradient_2d_with,
    evaluate_gradient_3d_with, Lane, LaneWidth, NoiseError,
};

/// Rows evaluated per parallel band.
const BAND_ROWS: usize = 16;

/// Errors that can occur while generating a map set.
#[derive(Error, Debug)]
pub enum MapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Noise evaluation failed: {0}")]
    Noise(#[from] NoiseError),
}

/// One generated layer, rescaled to bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayer {
    pub name: String,
    /// Smallest raw noise value before rescaling.
    pub min: f32,
    /// Largest raw noise value before rescaling.
    pub max: f32,
    /// Row-major grayscale bytes, `width * height` long.
    pub bytes: Vec<u8>,
}

/// All layers of one generated map.
#[derive(Debug, Clone)]
pub struct MapSet {
    pub width: u32,
    pub height: u32,
    /// Seed actually used, whether configured or drawn.
    pub seed: i32,
    pub lane_width: LaneWidth,
    pub layers: Vec<MapLayer>,
}

impl MapSet {
    /// Looks up a layer by name.
    pub fn layer(&self, name: &str) -> Option<&MapLayer> {
        self.layers.iter().find(|layer| layer.name == name)
    }
}

/// Linearly rescales `values` to bytes.
///
/// Returns the observed `(min, max)` alongside the bytes. Each byte is
/// `floor((v - min) / (max - min) * 255)`; a flat input maps to zeros.
pub fn rescale_to_bytes(values: &[f32]) -> (f32, f32, Vec<u8>) {
    if values.is_empty() {
        return (0.0, 0.0, Vec::new());
    }

    let (min, max) = values
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;

    let bytes = if range > 0.0 {
        values
            .iter()
            .map(|&v| ((v - min) / range * 255.0).floor() as u8)
            .collect()
    } else {
        vec![0; values.len()]
    };

    (min, max, bytes)
}

/// Generates every layer of `config`.
///
/// Uses the configured seed, or draws one from the thread RNG and logs it.
pub fn generate_map_set(config: &MapSetConfig) -> Result<MapSet, MapError> {
    config.validate()?;

    let seed = match config.seed {
        Some(seed) => seed,
        None => {
            let seed = rand::random::<i32>();
            info!(seed, "No seed configured, drew a random one");
            seed
        }
    };

    info!(
        width = config.width,
        height = config.height,
        layers = config.layers.len(),
        lane = config.lane_width.name(),
        seed,
        "Generating map set"
    );
    let start = Instant::now();

    let mut layers = Vec::with_capacity(config.layers.len());
    for (index, layer) in config.layers.iter().enumerate() {
        let layer_seed = seed.wrapping_add(layer.seed_offset(index));
        let values = evaluate_layer(config, layer, layer_seed)?;
        let (min, max, bytes) = rescale_to_bytes(&values);
        debug!(
            layer = %layer.name,
            kind = layer.kind.name(),
            seed = layer_seed,
            min,
            max,
            "Evaluated layer"
        );
        layers.push(MapLayer {
            name: layer.name.clone(),
            min,
            max,
            bytes,
        });
    }

    apply_land_masks(config, &mut layers);

    info!(elapsed = ?start.elapsed(), "Map set generated");

    Ok(MapSet {
        width: config.width,
        height: config.height,
        seed,
        lane_width: config.lane_width,
        layers,
    })
}

/// Clamps masked layers to zero wherever their source is below sea level.
///
/// Sources are read as they were before any mask was applied.
fn apply_land_masks(config: &MapSetConfig, layers: &mut [MapLayer]) {
    let index: HashMap<&str, usize> = config
        .layers
        .iter()
        .enumerate()
        .map(|(i, layer)| (layer.name.as_str(), i))
        .collect();

    let unmasked: HashMap<usize, Vec<u8>> = config
        .layers
        .iter()
        .filter_map(|layer| layer.land_mask.as_ref())
        .filter_map(|mask| index.get(mask.source.as_str()).copied())
        .map(|source| (source, layers[source].bytes.clone()))
        .collect();

    for (target, layer) in config.layers.iter().enumerate() {
        let Some(mask) = &layer.land_mask else {
            continue;
        };
        let Some(source) = index.get(mask.source.as_str()).and_then(|i| unmasked.get(i)) else {
            continue;
        };

        let mut cleared = 0usize;
        for (byte, &level) in layers[target].bytes.iter_mut().zip(source) {
            if level < mask.sea_level {
                *byte = 0;
                cleared += 1;
            }
        }
        debug!(
            layer = %layer.name,
            source = %mask.source,
            sea_level = mask.sea_level,
            cleared,
            "Applied land mask"
        );
    }
}

/// Evaluates one layer over the full grid, one row band per rayon task.
fn evaluate_layer(
    config: &MapSetConfig,
    layer: &LayerConfig,
    seed: i32,
) -> Result<Vec<f32>, NoiseError> {
    let width = config.width as usize;
    let mut values = vec![0.0f32; config.pixel_count()];

    values
        .par_chunks_mut(BAND_ROWS * width)
        .enumerate()
        .try_for_each(|(band, out)| {
            let first_row = band * BAND_ROWS;
            let xs: Vec<f32> = (0..out.len()).map(|i| (i % width) as f32).collect();
            let ys: Vec<f32> = (0..out.len())
                .map(|i| (first_row + i / width) as f32)
                .collect();

            match config.lane_width {
                LaneWidth::Scalar => evaluate_band::<f32>(layer, &xs, &ys, out, seed),
                LaneWidth::Four => evaluate_band::<f32x4>(layer, &xs, &ys, out, seed),
                LaneWidth::Eight => evaluate_band::<f32x8>(layer, &xs, &ys, out, seed),
            }
        })?;

    Ok(values)
}

fn evaluate_band<L: Lane>(
    layer: &LayerConfig,
    xs: &[f32],
    ys: &[f32],
    out: &mut [f32],
    seed: i32,
) -> Result<(), NoiseError> {
    let [fx, fy, fz] = layer.frequency_axes();

    match layer.kind {
        LayerKind::Gradient2d { amplitude, mode } => {
            evaluate_gradient_2d_with::<L>(xs, ys, out, fx, fy, amplitude, seed, mode)
        }
        LayerKind::Gradient3d { amplitude, mode, depth } => {
            let zs = vec![depth; xs.len()];
            evaluate_gradient_3d_with::<L>(xs, ys, &zs, out, fx, fy, fz, amplitude, seed, mode)
        }
        LayerKind::Cellular2d { center_amplitude, edge_amplitude, output } => {
            let mut discarded = vec![0.0f32; out.len()];
            let (center, edge) = split_cellular(output, out, &mut discarded);
            evaluate_cellular_2d_with::<L>(
                xs,
                ys,
                center,
                edge,
                fx,
                fy,
                center_amplitude,
                edge_amplitude,
                seed,
            )
        }
        LayerKind::Cellular3d { center_amplitude, edge_amplitude, output, depth } => {
            let zs = vec![depth; xs.len()];
            let mut discarded = vec![0.0f32; out.len()];
            let (center, edge) = split_cellular(output, out, &mut discarded);
            evaluate_cellular_3d_with::<L>(
                xs,
                ys,
                &zs,
                center,
                edge,
                fx,
                fy,
                fz,
                center_amplitude,
                edge_amplitude,
                seed,
            )
        }
    }
}

/// Routes the kept cellular output into `kept` and the other into `discarded`.
fn split_cellular<'a>(
    output: CellularOutput,
    kept: &'a mut [f32],
    discarded: &'a mut [f32],
) -> (&'a mut [f32], &'a mut [f32]) {
    match output {
        CellularOutput::Center => (kept, discarded),
        CellularOutput::Edge => (discarded, kept),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maps::config::LandMask;
    use crate::noise::{evaluate_gradient_2d, GradientMode};

    fn gradient_layer(name: &str, frequency: f32) -> LayerConfig {
        LayerConfig {
            name: name.to_string(),
            frequency: vec![frequency, frequency],
            kind: LayerKind::Gradient2d {
                amplitude: 1.0,
                mode: GradientMode::Quadratic,
            },
            seed_offset: None,
            land_mask: None,
        }
    }

    fn config(width: u32, height: u32, layers: Vec<LayerConfig>) -> MapSetConfig {
        MapSetConfig {
            width,
            height,
            seed: Some(42),
            lane_width: LaneWidth::Eight,
            layers,
        }
    }

    #[test]
    fn test_rescale_to_bytes() {
        let (min, max, bytes) = rescale_to_bytes(&[-1.0, 0.0, 1.0, 0.5]);
        assert_eq!((min, max), (-1.0, 1.0));
        assert_eq!(bytes, vec![0, 127, 255, 191]);
    }

    #[test]
    fn test_rescale_flat_input() {
        let (min, max, bytes) = rescale_to_bytes(&[0.3; 5]);
        assert_eq!((min, max), (0.3, 0.3));
        assert_eq!(bytes, vec![0; 5]);
        assert_eq!(rescale_to_bytes(&[]).2, Vec::<u8>::new());
    }

    #[test]
    fn test_end_to_end_gradient_scenario() {
        let config = config(256, 256, vec![gradient_layer("height", 10.0 / 256.0)]);

        let first = generate_map_set(&config).unwrap();
        let second = generate_map_set(&config).unwrap();

        let a = first.layer("height").unwrap();
        let b = second.layer("height").unwrap();
        assert_eq!(a.bytes.len(), 256 * 256);
        assert_eq!(a, b);
        assert!(a.min < a.max);
        assert_eq!(a.bytes.iter().copied().min(), Some(0));
        assert_eq!(a.bytes.iter().copied().max(), Some(255));
    }

    #[test]
    fn test_bands_match_single_call() {
        // 37 rows leaves a partial band at the bottom.
        let (width, height) = (23u32, 37u32);
        let config = config(width, height, vec![gradient_layer("g", 0.11)]);
        let set = generate_map_set(&config).unwrap();

        let n = (width * height) as usize;
        let xs: Vec<f32> = (0..n).map(|i| (i % width as usize) as f32).collect();
        let ys: Vec<f32> = (0..n).map(|i| (i / width as usize) as f32).collect();
        let mut direct = vec![0.0; n];
        evaluate_gradient_2d(&xs, &ys, &mut direct, 0.11, 0.11, 1.0, 42, GradientMode::Quadratic)
            .unwrap();

        let (min, max, bytes) = rescale_to_bytes(&direct);
        let layer = set.layer("g").unwrap();
        assert_eq!((layer.min, layer.max), (min, max));
        assert_eq!(layer.bytes, bytes);
    }

    #[test]
    fn test_lane_widths_agree() {
        let mut layers = vec![gradient_layer("g", 0.07)];
        layers.push(LayerConfig {
            name: "c".to_string(),
            frequency: vec![0.1, 0.1, 0.1],
            kind: LayerKind::Cellular3d {
                center_amplitude: 1.0,
                edge_amplitude: 1.0,
                output: CellularOutput::Center,
                depth: 2.5,
            },
            seed_offset: None,
            land_mask: None,
        });

        let mut scalar = config(40, 30, layers);
        scalar.lane_width = LaneWidth::Scalar;
        let mut four = scalar.clone();
        four.lane_width = LaneWidth::Four;
        let mut eight = scalar.clone();
        eight.lane_width = LaneWidth::Eight;

        let reference = generate_map_set(&scalar).unwrap();
        for other in [generate_map_set(&four).unwrap(), generate_map_set(&eight).unwrap()] {
            for (a, b) in reference.layers.iter().zip(&other.layers) {
                assert!((a.min - b.min).abs() < 1e-4);
                assert!((a.max - b.max).abs() < 1e-4);
                let worst = a
                    .bytes
                    .iter()
                    .zip(&b.bytes)
                    .map(|(&x, &y)| (x as i16 - y as i16).abs())
                    .max()
                    .unwrap();
                assert!(worst <= 1, "layer {} differs by {worst}", a.name);
            }
        }
    }

    #[test]
    fn test_seed_offsets_separate_layers() {
        let mut same = gradient_layer("b", 0.1);
        same.seed_offset = Some(0);
        let layers = vec![gradient_layer("a", 0.1), same, gradient_layer("c", 0.1)];
        let set = generate_map_set(&config(32, 32, layers)).unwrap();

        let a = set.layer("a").unwrap();
        assert_eq!(a.bytes, set.layer("b").unwrap().bytes);
        assert_ne!(a.bytes, set.layer("c").unwrap().bytes);
    }

    #[test]
    fn test_land_mask_clears_sea() {
        let mut masked = LayerConfig {
            name: "cells".to_string(),
            frequency: vec![0.2, 0.2],
            kind: LayerKind::Cellular2d {
                center_amplitude: 1.0,
                edge_amplitude: 1.0,
                output: CellularOutput::Edge,
            },
            seed_offset: Some(7),
            land_mask: None,
        };
        let unmasked_set =
            generate_map_set(&config(48, 48, vec![gradient_layer("height", 0.05), masked.clone()]))
                .unwrap();

        masked.land_mask = Some(LandMask {
            source: "height".to_string(),
            sea_level: 128,
        });
        let masked_set =
            generate_map_set(&config(48, 48, vec![gradient_layer("height", 0.05), masked]))
                .unwrap();

        let height = masked_set.layer("height").unwrap();
        assert_eq!(height, unmasked_set.layer("height").unwrap());

        let before = &unmasked_set.layer("cells").unwrap().bytes;
        let after = &masked_set.layer("cells").unwrap().bytes;
        let mut sea = 0;
        for i in 0..before.len() {
            if height.bytes[i] < 128 {
                assert_eq!(after[i], 0);
                sea += 1;
            } else {
                assert_eq!(after[i], before[i]);
            }
        }
        assert!(sea > 0 && sea < before.len());
    }

    #[test]
    fn test_mask_reads_unmasked_source() {
        let mut first = gradient_layer("first", 0.05);
        first.land_mask = Some(LandMask {
            source: "second".to_string(),
            sea_level: 255,
        });
        let mut second = gradient_layer("second", 0.05);
        second.land_mask = Some(LandMask {
            source: "first".to_string(),
            sea_level: 100,
        });

        let plain = generate_map_set(&config(
            32,
            32,
            vec![gradient_layer("first", 0.05), gradient_layer("second", 0.05)],
        ))
        .unwrap();
        let set = generate_map_set(&config(32, 32, vec![first, second])).unwrap();

        let first_raw = &plain.layer("first").unwrap().bytes;
        let second_raw = &plain.layer("second").unwrap().bytes;
        let second_masked = &set.layer("second").unwrap().bytes;
        for i in 0..first_raw.len() {
            let expected = if first_raw[i] < 100 { 0 } else { second_raw[i] };
            assert_eq!(second_masked[i], expected);
        }
    }

    #[test]
    fn test_random_seed_is_reported() {
        let mut cfg = config(16, 16, vec![gradient_layer("g", 0.2)]);
        cfg.seed = None;
        let set = generate_map_set(&cfg).unwrap();

        cfg.seed = Some(set.seed);
        let replay = generate_map_set(&cfg).unwrap();
        assert_eq!(set.layers, replay.layers);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let cfg = config(0, 16, vec![gradient_layer("g", 0.2)]);
        assert!(matches!(generate_map_set(&cfg), Err(MapError::Config(_))));
    }
}
