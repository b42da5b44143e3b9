//! Cellular (Voronoi) noise kernels.
//!
//! Every lattice cell owns one feature point, jittered around the cell centre
//! by hash bits. A sample reports the distance to the nearest feature point in
//! its 3×3 (or 3×3×3) neighbourhood and the gap to the second nearest.

use super::hash::{
    jitter, lattice_base_2d, lattice_base_3d, mix_2d, mix_3d, unit_from_unsigned,
    CELLULAR_2D_MASK, CELLULAR_3D_MASK, COMPONENT_MIX_B, COMPONENT_MIX_C, PRIME_X, PRIME_Y,
    PRIME_Z_CELLULAR,
};
use super::lane::{Lane, LaneInt};

#[derive(Clone, Copy)]
struct Neighbour {
    dx: f32,
    dy: f32,
    /// Hash base delta from the sample's own cell.
    offset: i32,
}

const fn offset_2d(dx: i32, dy: i32) -> i32 {
    PRIME_X.wrapping_mul(dx).wrapping_add(PRIME_Y.wrapping_mul(dy))
}

const fn neighbour(dx: i32, dy: i32, fdx: f32, fdy: f32) -> Neighbour {
    Neighbour { dx: fdx, dy: fdy, offset: offset_2d(dx, dy) }
}

const NEIGHBOURS: [Neighbour; 9] = [
    neighbour(-1, -1, -1.0, -1.0),
    neighbour(0, -1, 0.0, -1.0),
    neighbour(1, -1, 1.0, -1.0),
    neighbour(-1, 0, -1.0, 0.0),
    neighbour(0, 0, 0.0, 0.0),
    neighbour(1, 0, 1.0, 0.0),
    neighbour(-1, 1, -1.0, 1.0),
    neighbour(0, 1, 0.0, 1.0),
    neighbour(1, 1, 1.0, 1.0),
];

const LAYERS: [(f32, i32); 3] = [
    (-1.0, PRIME_Z_CELLULAR.wrapping_neg()),
    (0.0, 0),
    (1.0, PRIME_Z_CELLULAR),
];

/// Running nearest and second-nearest squared distances.
#[derive(Clone, Copy)]
struct NearestPair<L: Lane> {
    first: L,
    second: L,
}

impl<L: Lane> NearestPair<L> {
    fn new() -> Self {
        Self {
            first: L::splat(f32::MAX),
            second: L::splat(f32::MAX),
        }
    }

    /// Branchless insert of one candidate distance.
    #[inline(always)]
    fn insert(&mut self, d: L) {
        let nearer = d.lt(self.first);
        let runner_up = L::select(d.lt(self.second), d, self.second);
        self.second = L::select(nearer, self.first, runner_up);
        self.first = L::select(nearer, d, self.first);
    }

    /// `(nearest, second - nearest)` as Euclidean distances.
    #[inline(always)]
    fn distances(self) -> (L, L) {
        let center = self.first.sqrt();
        (center, self.second.sqrt() - center)
    }
}

/// Evaluates 2D cellular noise at already scaled coordinates.
///
/// Returns `(center, edge)`: the distance to the nearest feature point and
/// the extra distance to the second nearest. Neither is negative.
#[inline(always)]
pub fn cellular_2d<L: Lane>(x: L, y: L, seed: L::Int) -> (L, L) {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let base = lattice_base_2d(x0.to_int(), y0.to_int(), seed);
    let mix_b = L::Int::splat(COMPONENT_MIX_B);

    let mut pair = NearestPair::new();
    for n in NEIGHBOURS {
        let h = mix_2d(base.wrapping_add(L::Int::splat(n.offset)));
        let jx = jitter::<L>(h, CELLULAR_2D_MASK);
        let jy = jitter::<L>(h.wrapping_mul(mix_b), CELLULAR_2D_MASK);

        let px = L::splat(n.dx + 0.5) + jx - fx;
        let py = L::splat(n.dy + 0.5) + jy - fy;
        pair.insert(px.mul_add(px, py * py));
    }
    pair.distances()
}

/// Evaluates 3D cellular noise at already scaled coordinates.
///
/// Feature x/y jitter stays in a band around the cell centre; z spans the
/// whole cell depth.
#[inline(always)]
pub fn cellular_3d<L: Lane>(x: L, y: L, z: L, seed: L::Int) -> (L, L) {
    let x0 = x.floor();
    let y0 = y.floor();
    let z0 = z.floor();
    let fx = x - x0;
    let fy = y - y0;
    let fz = z - z0;
    let base = lattice_base_3d(x0.to_int(), y0.to_int(), z0.to_int(), PRIME_Z_CELLULAR, seed);
    let mix_b = L::Int::splat(COMPONENT_MIX_B);
    let mix_c = L::Int::splat(COMPONENT_MIX_C);

    // x/y candidate offsets relative to the sample, shared by all layers.
    let planar: [(L, L, L::Int); 9] = NEIGHBOURS.map(|n| {
        (
            L::splat(n.dx + 0.5) - fx,
            L::splat(n.dy + 0.5) - fy,
            base.wrapping_add(L::Int::splat(n.offset)),
        )
    });

    let mut pair = NearestPair::new();
    for (dz, layer_offset) in LAYERS {
        let layer_offset = L::Int::splat(layer_offset);
        let oz = L::splat(dz) - fz;
        for &(ox, oy, cell) in &planar {
            let h = mix_3d(cell.wrapping_add(layer_offset));
            let px = ox + jitter::<L>(h, CELLULAR_3D_MASK);
            let py = oy + jitter::<L>(h.wrapping_mul(mix_b), CELLULAR_3D_MASK);
            let pz = oz + unit_from_unsigned::<L>(h.wrapping_mul(mix_c));
            pair.insert(px.mul_add(px, py.mul_add(py, pz * pz)));
        }
    }
    pair.distances()
}
