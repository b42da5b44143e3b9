//! Gradient noise kernels.
//!
//! Each corner of the lattice cell contributes a pseudo-gradient built from
//! hash bits, and the contributions are blended with smootherstep weights.
//! The 2D corner term swaps `(dx, dy)` on the hash sign bit instead of looking
//! up a gradient table.

use serde::{Deserialize, Serialize};

use super::hash::{
    jitter, lattice_base_2d, lattice_base_3d, mix_2d, mix_3d, COMPONENT_MIX_B, COMPONENT_MIX_C,
    GRADIENT_2D_MASK, GRADIENT_3D_MASK, PRIME_X, PRIME_Y, PRIME_Z_GRADIENT, UNIT_SIGN_MASK,
};
use super::lane::{Lane, LaneInt};

/// Corner response of the gradient kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientMode {
    /// Plain pseudo-gradient dot product.
    Linear,
    /// Adds a signed `g*g` term per corner. Slower, sharper features.
    #[default]
    Quadratic,
}

impl GradientMode {
    pub fn name(self) -> &'static str {
        match self {
            GradientMode::Linear => "linear",
            GradientMode::Quadratic => "quadratic",
        }
    }
}

/// Quintic fade curve `t³(t(6t - 15) + 10)`.
#[inline(always)]
pub fn smootherstep<L: Lane>(t: L) -> L {
    let inner = t.mul_add(t.mul_add(L::splat(6.0), L::splat(-15.0)), L::splat(10.0));
    t * t * t * inner
}

/// `a + (b - a) * t`.
#[inline(always)]
pub fn lerp<L: Lane>(a: L, b: L, t: L) -> L {
    (b - a).mul_add(t, a)
}

#[inline(always)]
fn sharpen<L: Lane>(g: L, sign_bits: L::Int, mode: GradientMode) -> L {
    match mode {
        GradientMode::Linear => g,
        GradientMode::Quadratic => {
            let sign = jitter::<L>(sign_bits, UNIT_SIGN_MASK);
            (g * g).mul_add(sign, g)
        }
    }
}

/// Contribution of one 2D corner with hash `h`, seen from offset `(dx, dy)`.
#[inline(always)]
pub(crate) fn corner_2d<L: Lane>(h: L::Int, dx: L, dy: L, mode: GradientMode) -> L {
    let swap = L::sign_mask(h);
    let a = L::select(swap, dy, dx);
    let b = L::select(swap, dx, dy);

    let ga = jitter::<L>(h.shift_left(1), GRADIENT_2D_MASK);
    let gb = jitter::<L>(h.wrapping_mul(L::Int::splat(COMPONENT_MIX_B)), GRADIENT_2D_MASK);
    let g = a.mul_add(ga, b * gb);

    sharpen(g, h.shift_left(2), mode)
}

/// Contribution of one 3D corner with hash `h`, seen from offset `(dx, dy, dz)`.
#[inline(always)]
pub(crate) fn corner_3d<L: Lane>(h: L::Int, dx: L, dy: L, dz: L, mode: GradientMode) -> L {
    let ga = jitter::<L>(h, GRADIENT_3D_MASK);
    let gb = jitter::<L>(h.wrapping_mul(L::Int::splat(COMPONENT_MIX_B)), GRADIENT_3D_MASK);
    let gc = jitter::<L>(h.wrapping_mul(L::Int::splat(COMPONENT_MIX_C)), GRADIENT_3D_MASK);
    let g = dx.mul_add(ga, dy.mul_add(gb, dz * gc));

    sharpen(g, h.shift_left(1), mode)
}

/// Hashes of the four corners of the 2D cell `(ix, iy)`, ordered
/// `[(0,0), (1,0), (0,1), (1,1)]`.
#[inline(always)]
pub(crate) fn cell_hashes_2d<I: LaneInt>(ix: I, iy: I, seed: I) -> [I; 4] {
    let base = lattice_base_2d(ix, iy, seed);
    [
        mix_2d(base),
        mix_2d(base.wrapping_add(I::splat(PRIME_X))),
        mix_2d(base.wrapping_add(I::splat(PRIME_Y))),
        mix_2d(base.wrapping_add(I::splat(PRIME_X.wrapping_add(PRIME_Y)))),
    ]
}

const fn corner_offset_3d(i: i32, j: i32, k: i32) -> i32 {
    PRIME_X
        .wrapping_mul(i)
        .wrapping_add(PRIME_Y.wrapping_mul(j))
        .wrapping_add(PRIME_Z_GRADIENT.wrapping_mul(k))
}

/// Evaluates 2D gradient noise at already scaled coordinates.
#[inline(always)]
pub fn gradient_2d<L: Lane>(x: L, y: L, seed: L::Int, mode: GradientMode) -> L {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let one = L::splat(1.0);
    let fx1 = fx - one;
    let fy1 = fy - one;

    let [h00, h10, h01, h11] = cell_hashes_2d(x0.to_int(), y0.to_int(), seed);

    let g00 = corner_2d(h00, fx, fy, mode);
    let g10 = corner_2d(h10, fx1, fy, mode);
    let g01 = corner_2d(h01, fx, fy1, mode);
    let g11 = corner_2d(h11, fx1, fy1, mode);

    let sx = smootherstep(fx);
    let sy = smootherstep(fy);

    lerp(lerp(g00, g10, sx), lerp(g01, g11, sx), sy)
}

/// Evaluates 3D gradient noise at already scaled coordinates.
#[inline(always)]
pub fn gradient_3d<L: Lane>(x: L, y: L, z: L, seed: L::Int, mode: GradientMode) -> L {
    let x0 = x.floor();
    let y0 = y.floor();
    let z0 = z.floor();
    let fx = x - x0;
    let fy = y - y0;
    let fz = z - z0;
    let one = L::splat(1.0);
    let fx1 = fx - one;
    let fy1 = fy - one;
    let fz1 = fz - one;

    let base = lattice_base_3d(x0.to_int(), y0.to_int(), z0.to_int(), PRIME_Z_GRADIENT, seed);
    let hash = |i: i32, j: i32, k: i32| {
        mix_3d(base.wrapping_add(L::Int::splat(corner_offset_3d(i, j, k))))
    };

    let g000 = corner_3d(hash(0, 0, 0), fx, fy, fz, mode);
    let g100 = corner_3d(hash(1, 0, 0), fx1, fy, fz, mode);
    let g010 = corner_3d(hash(0, 1, 0), fx, fy1, fz, mode);
    let g110 = corner_3d(hash(1, 1, 0), fx1, fy1, fz, mode);
    let g001 = corner_3d(hash(0, 0, 1), fx, fy, fz1, mode);
    let g101 = corner_3d(hash(1, 0, 1), fx1, fy, fz1, mode);
    let g011 = corner_3d(hash(0, 1, 1), fx, fy1, fz1, mode);
    let g111 = corner_3d(hash(1, 1, 1), fx1, fy1, fz1, mode);

    let sx = smootherstep(fx);
    let sy = smootherstep(fy);
    let sz = smootherstep(fz);

    let near = lerp(lerp(g000, g100, sx), lerp(g010, g110, sx), sy);
    let far = lerp(lerp(g001, g101, sx), lerp(g011, g111, sx), sy);
    lerp(near, far, sz)
}
