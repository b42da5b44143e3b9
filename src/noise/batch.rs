//! Batch evaluation over coordinate arrays.
//!
//! The entry points validate every buffer length up front, then walk the
//! arrays in lanes of `L::WIDTH`. A trailing partial lane is re-anchored to
//! end exactly at the last element, recomputing a few samples the previous
//! lane already wrote. Batches shorter than one lane are gathered into a
//! single padded lane and scattered back.

use thiserror::Error;

use super::cellular::{cellular_2d, cellular_3d};
use super::gradient::{gradient_2d, gradient_3d, GradientMode};
use super::lane::{DefaultLane, Lane, LaneInt};

/// Errors from the batch entry points.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NoiseError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Checks that every named buffer has the same non-zero length.
fn validate_lengths(buffers: &[(&str, usize)]) -> Result<usize, NoiseError> {
    let Some((&(first, n), rest)) = buffers.split_first() else {
        return Err(NoiseError::InvalidArgument("no buffers supplied".to_string()));
    };
    if n == 0 {
        return Err(NoiseError::InvalidArgument(format!("`{first}` is empty")));
    }
    for &(name, len) in rest {
        if len != n {
            return Err(NoiseError::InvalidArgument(format!(
                "`{name}` has length {len}, expected {n} to match `{first}`"
            )));
        }
    }
    Ok(n)
}

/// Runs `kernel` over lanes of the input arrays and stores its results.
///
/// Callers must have validated that all slices share one non-zero length.
fn drive<L, const IN: usize, const OUT: usize>(
    inputs: [&[f32]; IN],
    mut outputs: [&mut [f32]; OUT],
    kernel: impl Fn([L; IN]) -> [L; OUT],
) where
    L: Lane,
{
    let n = inputs[0].len();
    let width = L::WIDTH;

    if n < width {
        // Pad with the last element so every lane holds a valid coordinate.
        let lanes = inputs.map(|src| L::gather(|i| src[i.min(n - 1)]));
        for (dst, result) in outputs.iter_mut().zip(kernel(lanes)) {
            for (i, slot) in dst.iter_mut().enumerate() {
                *slot = result.extract(i);
            }
        }
        return;
    }

    let mut start = 0;
    while start < n {
        let at = start.min(n - width);
        let lanes = inputs.map(|src| L::load(&src[at..]));
        for (dst, result) in outputs.iter_mut().zip(kernel(lanes)) {
            result.store(&mut dst[at..]);
        }
        start += width;
    }
}

/// 2D gradient noise with the default lane width.
///
/// Samples `(xs[i] * freq_x, ys[i] * freq_y)` and writes the kernel value
/// times `amplitude` to `out[i]`.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_gradient_2d(
    xs: &[f32],
    ys: &[f32],
    out: &mut [f32],
    freq_x: f32,
    freq_y: f32,
    amplitude: f32,
    seed: i32,
    mode: GradientMode,
) -> Result<(), NoiseError> {
    evaluate_gradient_2d_with::<DefaultLane>(xs, ys, out, freq_x, freq_y, amplitude, seed, mode)
}

/// [`evaluate_gradient_2d`] on an explicit lane type.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_gradient_2d_with<L: Lane>(
    xs: &[f32],
    ys: &[f32],
    out: &mut [f32],
    freq_x: f32,
    freq_y: f32,
    amplitude: f32,
    seed: i32,
    mode: GradientMode,
) -> Result<(), NoiseError> {
    validate_lengths(&[("xs", xs.len()), ("ys", ys.len()), ("out", out.len())])?;

    let (fx, fy, amp) = (L::splat(freq_x), L::splat(freq_y), L::splat(amplitude));
    let seed = L::Int::splat(seed);
    drive::<L, 2, 1>([xs, ys], [out], |[x, y]| {
        [gradient_2d(x * fx, y * fy, seed, mode) * amp]
    });
    Ok(())
}

/// 3D gradient noise with the default lane width.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_gradient_3d(
    xs: &[f32],
    ys: &[f32],
    zs: &[f32],
    out: &mut [f32],
    freq_x: f32,
    freq_y: f32,
    freq_z: f32,
    amplitude: f32,
    seed: i32,
    mode: GradientMode,
) -> Result<(), NoiseError> {
    evaluate_gradient_3d_with::<DefaultLane>(
        xs, ys, zs, out, freq_x, freq_y, freq_z, amplitude, seed, mode,
    )
}

/// [`evaluate_gradient_3d`] on an explicit lane type.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_gradient_3d_with<L: Lane>(
    xs: &[f32],
    ys: &[f32],
    zs: &[f32],
    out: &mut [f32],
    freq_x: f32,
    freq_y: f32,
    freq_z: f32,
    amplitude: f32,
    seed: i32,
    mode: GradientMode,
) -> Result<(), NoiseError> {
    validate_lengths(&[
        ("xs", xs.len()),
        ("ys", ys.len()),
        ("zs", zs.len()),
        ("out", out.len()),
    ])?;

    let (fx, fy, fz) = (L::splat(freq_x), L::splat(freq_y), L::splat(freq_z));
    let amp = L::splat(amplitude);
    let seed = L::Int::splat(seed);
    drive::<L, 3, 1>([xs, ys, zs], [out], |[x, y, z]| {
        [gradient_3d(x * fx, y * fy, z * fz, seed, mode) * amp]
    });
    Ok(())
}

/// 2D cellular noise with the default lane width.
///
/// Writes the nearest feature distance times `center_amplitude` to
/// `out_center` and the gap to the second nearest times `edge_amplitude` to
/// `out_edge`.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_cellular_2d(
    xs: &[f32],
    ys: &[f32],
    out_center: &mut [f32],
    out_edge: &mut [f32],
    freq_x: f32,
    freq_y: f32,
    center_amplitude: f32,
    edge_amplitude: f32,
    seed: i32,
) -> Result<(), NoiseError> {
    evaluate_cellular_2d_with::<DefaultLane>(
        xs,
        ys,
        out_center,
        out_edge,
        freq_x,
        freq_y,
        center_amplitude,
        edge_amplitude,
        seed,
    )
}

/// [`evaluate_cellular_2d`] on an explicit lane type.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_cellular_2d_with<L: Lane>(
    xs: &[f32],
    ys: &[f32],
    out_center: &mut [f32],
    out_edge: &mut [f32],
    freq_x: f32,
    freq_y: f32,
    center_amplitude: f32,
    edge_amplitude: f32,
    seed: i32,
) -> Result<(), NoiseError> {
    validate_lengths(&[
        ("xs", xs.len()),
        ("ys", ys.len()),
        ("out_center", out_center.len()),
        ("out_edge", out_edge.len()),
    ])?;

    let (fx, fy) = (L::splat(freq_x), L::splat(freq_y));
    let (center_amp, edge_amp) = (L::splat(center_amplitude), L::splat(edge_amplitude));
    let seed = L::Int::splat(seed);
    drive::<L, 2, 2>([xs, ys], [out_center, out_edge], |[x, y]| {
        let (center, edge) = cellular_2d(x * fx, y * fy, seed);
        [center * center_amp, edge * edge_amp]
    });
    Ok(())
}

/// 3D cellular noise with the default lane width.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_cellular_3d(
    xs: &[f32],
    ys: &[f32],
    zs: &[f32],
    out_center: &mut [f32],
    out_edge: &mut [f32],
    freq_x: f32,
    freq_y: f32,
    freq_z: f32,
    center_amplitude: f32,
    edge_amplitude: f32,
    seed: i32,
) -> Result<(), NoiseError> {
    evaluate_cellular_3d_with::<DefaultLane>(
        xs,
        ys,
        zs,
        out_center,
        out_edge,
        freq_x,
        freq_y,
        freq_z,
        center_amplitude,
        edge_amplitude,
        seed,
    )
}

/// [`evaluate_cellular_3d`] on an explicit lane type.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_cellular_3d_with<L: Lane>(
    xs: &[f32],
    ys: &[f32],
    zs: &[f32],
    out_center: &mut [f32],
    out_edge: &mut [f32],
    freq_x: f32,
    freq_y: f32,
    freq_z: f32,
    center_amplitude: f32,
    edge_amplitude: f32,
    seed: i32,
) -> Result<(), NoiseError> {
    validate_lengths(&[
        ("xs", xs.len()),
        ("ys", ys.len()),
        ("zs", zs.len()),
        ("out_center", out_center.len()),
        ("out_edge", out_edge.len()),
    ])?;

    let (fx, fy, fz) = (L::splat(freq_x), L::splat(freq_y), L::splat(freq_z));
    let (center_amp, edge_amp) = (L::splat(center_amplitude), L::splat(edge_amplitude));
    let seed = L::Int::splat(seed);
    drive::<L, 3, 2>([xs, ys, zs], [out_center, out_edge], |[x, y, z]| {
        let (center, edge) = cellular_3d(x * fx, y * fy, z * fz, seed);
        [center * center_amp, edge * edge_amp]
    });
    Ok(())
}
