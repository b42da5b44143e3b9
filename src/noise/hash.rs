//! Lattice hashing and hash-to-float conversion.
//!
//! A lattice point is hashed by folding its integer coordinates and the seed
//! into one wrapping 32-bit `base`. Neighbouring corners are reached by adding
//! the per-axis primes to that base, never by recomputing the products.

use super::lane::{Lane, LaneInt};

/// Per-axis multiplier for x.
pub const PRIME_X: i32 = 180_601_904;
/// Per-axis multiplier for y.
pub const PRIME_Y: i32 = 174_181_987;
/// Per-axis multiplier for z in the 3D gradient kernel.
pub const PRIME_Z_GRADIENT: i32 = 738_599_801;
/// Per-axis multiplier for z in the 3D cellular kernel.
pub const PRIME_Z_CELLULAR: i32 = 598_742_741;

/// XOR key of the avalanche multiply.
pub const AVALANCHE_XOR: i32 = 203_663_684;

/// Odd multipliers deriving the second and third float from one corner hash.
pub(crate) const COMPONENT_MIX_B: i32 = 0x2C1B_3C6D;
pub(crate) const COMPONENT_MIX_C: i32 = 0x297A_2D39;

/// Bit masks turning hash bits into a float inside a fixed band.
///
/// The AND mask keeps the sign bit, the low exponent bits that are allowed to
/// vary, and part of the mantissa. The OR mask then pins the remaining
/// exponent bits, so the result is never zero, subnormal, infinite or NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatMask {
    pub and: u32,
    pub or: u32,
}

impl FloatMask {
    /// Smallest magnitude the mask can produce.
    pub fn min_magnitude(self) -> f32 {
        f32::from_bits(self.or & 0x7FFF_FFFF)
    }

    /// Exclusive upper bound on the magnitude the mask can produce.
    pub fn max_magnitude(self) -> f32 {
        let top = (self.or | self.and) & 0x7F80_0000;
        f32::from_bits(top + 0x0080_0000)
    }
}

/// Gradient components for 2D corners: ±[0.25, 0.5).
pub const GRADIENT_2D_MASK: FloatMask = FloatMask { and: 0x807F_FFFF, or: 0x3E80_0000 };
/// Gradient components for 3D corners: ±[0.25, 0.375).
pub const GRADIENT_3D_MASK: FloatMask = FloatMask { and: 0x803F_FFFF, or: 0x3E80_0000 };
/// Feature-point jitter for 2D cells: ±[0.125, 0.5).
pub const CELLULAR_2D_MASK: FloatMask = FloatMask { and: 0x80FF_FFFF, or: 0x3E00_0000 };
/// Feature-point x/y jitter for 3D cells: ±[0.125, 0.5), coarser mantissa.
pub const CELLULAR_3D_MASK: FloatMask = FloatMask { and: 0x80FF_FF00, or: 0x3E00_0000 };
/// Sign bit only, exponent of 1.0: yields exactly ±1.
pub const UNIT_SIGN_MASK: FloatMask = FloatMask { and: 0x8000_0000, or: 0x3F80_0000 };

/// `ix*PRIME_X + iy*PRIME_Y + seed`, wrapping.
#[inline(always)]
pub fn lattice_base_2d<I: LaneInt>(ix: I, iy: I, seed: I) -> I {
    ix.wrapping_mul(I::splat(PRIME_X))
        .wrapping_add(iy.wrapping_mul(I::splat(PRIME_Y)))
        .wrapping_add(seed)
}

/// `ix*PRIME_X + iy*PRIME_Y + iz*prime_z + seed`, wrapping.
#[inline(always)]
pub fn lattice_base_3d<I: LaneInt>(ix: I, iy: I, iz: I, prime_z: i32, seed: I) -> I {
    lattice_base_2d(ix, iy, seed).wrapping_add(iz.wrapping_mul(I::splat(prime_z)))
}

/// Avalanche step for 2D lattices: `h * (h ^ AVALANCHE_XOR)`.
#[inline(always)]
pub fn mix_2d<I: LaneInt>(h: I) -> I {
    h.wrapping_mul(h ^ I::splat(AVALANCHE_XOR))
}

/// Avalanche step for 3D lattices.
///
/// Folds the high half into the low half first; the extra axis otherwise
/// leaves the low-order bits with too little entropy.
#[inline(always)]
pub fn mix_3d<I: LaneInt>(h: I) -> I {
    let h = h ^ h.shift_right(16);
    h.wrapping_mul(h ^ I::splat(AVALANCHE_XOR))
}

/// Reinterprets hash bits as a float after applying `mask`.
///
/// This is a bit cast, not a numeric conversion.
#[inline(always)]
pub fn jitter<L: Lane>(hash: L::Int, mask: FloatMask) -> L {
    let bits = (hash & L::Int::splat(mask.and as i32)) | L::Int::splat(mask.or as i32);
    L::from_bits(bits)
}

/// Maps hash bits read as an unsigned integer onto `[0, 1]`.
///
/// Unlike [`jitter`] this covers the whole unit interval.
#[inline(always)]
pub fn unit_from_unsigned<L: Lane>(hash: L::Int) -> L {
    let signed = L::int_to_float(hash);
    let unsigned = L::select(L::sign_mask(hash), signed + L::splat(4_294_967_296.0), signed);
    unsigned / L::splat(u32::MAX as f32)
}

/// Scalar corner hash of a 2D lattice point.
pub fn corner_hash_2d(ix: i32, iy: i32, seed: i32) -> u32 {
    mix_2d(lattice_base_2d(ix, iy, seed)) as u32
}

/// Scalar corner hash of a 3D lattice point.
pub fn corner_hash_3d(ix: i32, iy: i32, iz: i32, prime_z: i32, seed: i32) -> u32 {
    mix_3d(lattice_base_3d(ix, iy, iz, prime_z, seed)) as u32
}

/// Scalar form of [`jitter`].
pub fn jitter_float(hash: u32, mask: FloatMask) -> f32 {
    jitter::<f32>(hash as i32, mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASKS: [FloatMask; 4] = [
        GRADIENT_2D_MASK,
        GRADIENT_3D_MASK,
        CELLULAR_2D_MASK,
        CELLULAR_3D_MASK,
    ];

    #[test]
    fn test_corner_hash_deterministic() {
        for seed in [0, 1, -7, 42, i32::MAX] {
            assert_eq!(corner_hash_2d(3, -9, seed), corner_hash_2d(3, -9, seed));
            assert_eq!(
                corner_hash_3d(3, -9, 12, PRIME_Z_GRADIENT, seed),
                corner_hash_3d(3, -9, 12, PRIME_Z_GRADIENT, seed)
            );
        }
    }

    #[test]
    fn test_sibling_corners_are_base_deltas() {
        let (ix, iy, iz, seed): (i32, i32, i32, i32) = (-17, 250, 9, 1337);
        let base = lattice_base_3d(ix, iy, iz, PRIME_Z_CELLULAR, seed);

        assert_eq!(
            base.wrapping_add(PRIME_X),
            lattice_base_3d(ix + 1, iy, iz, PRIME_Z_CELLULAR, seed)
        );
        assert_eq!(
            base.wrapping_add(PRIME_Y),
            lattice_base_3d(ix, iy + 1, iz, PRIME_Z_CELLULAR, seed)
        );
        assert_eq!(
            base.wrapping_add(PRIME_Z_CELLULAR),
            lattice_base_3d(ix, iy, iz + 1, PRIME_Z_CELLULAR, seed)
        );
        assert_eq!(
            base.wrapping_sub(PRIME_X),
            lattice_base_3d(ix - 1, iy, iz, PRIME_Z_CELLULAR, seed)
        );
    }

    #[test]
    fn test_neighbouring_corners_differ() {
        let h = corner_hash_2d(0, 0, 42);
        assert_ne!(h, corner_hash_2d(1, 0, 42));
        assert_ne!(h, corner_hash_2d(0, 1, 42));
        assert_ne!(h, corner_hash_2d(0, 0, 43));
    }

    #[test]
    fn test_jitter_is_bit_cast() {
        assert_eq!(jitter_float(0, UNIT_SIGN_MASK), 1.0);
        assert_eq!(jitter_float(0x8000_0000, UNIT_SIGN_MASK), -1.0);
        assert_eq!(jitter_float(0xFFFF_FFFF, UNIT_SIGN_MASK), -1.0);
        assert_eq!(jitter_float(0x0000_0000, GRADIENT_2D_MASK), 0.25);
    }

    #[test]
    fn test_jitter_stays_in_band() {
        for mask in MASKS {
            let lo = mask.min_magnitude();
            let hi = mask.max_magnitude();
            for i in 0..4096u32 {
                let v = jitter_float(corner_hash_2d(i as i32, (i * 7) as i32, 99), mask);
                assert!(v.is_finite() && v != 0.0);
                assert!(
                    v.abs() >= lo && v.abs() < hi,
                    "{v} outside [{lo}, {hi}) for mask {mask:?}"
                );
            }
        }
    }

    #[test]
    fn test_jitter_preserves_sign() {
        let mut negative = 0;
        for i in 0..1000 {
            let h = corner_hash_2d(i, -i, 5);
            let v = jitter_float(h, GRADIENT_2D_MASK);
            assert_eq!(v < 0.0, (h as i32) < 0);
            if v < 0.0 {
                negative += 1;
            }
        }
        assert!(negative > 300 && negative < 700, "sign bit is biased: {negative}");
    }

    #[test]
    fn test_mask_bands() {
        assert_eq!(GRADIENT_2D_MASK.min_magnitude(), 0.25);
        assert_eq!(GRADIENT_2D_MASK.max_magnitude(), 0.5);
        assert_eq!(CELLULAR_2D_MASK.min_magnitude(), 0.125);
        assert_eq!(CELLULAR_2D_MASK.max_magnitude(), 0.5);
    }

    #[test]
    fn test_unit_from_unsigned_range() {
        assert_eq!(unit_from_unsigned::<f32>(0), 0.0);
        assert_eq!(unit_from_unsigned::<f32>(-1), 1.0);
        let mid = unit_from_unsigned::<f32>(i32::MIN);
        assert!((mid - 0.5).abs() < 1e-6);
        for i in 0..1000 {
            let v = unit_from_unsigned::<f32>(corner_hash_2d(i, 3, 8) as i32);
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
