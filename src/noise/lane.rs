//! Numeric lane abstraction shared by every noise kernel.
//!
//! A lane holds `WIDTH` independent `f32` samples. Kernels are written once
//! against [`Lane`] and [`LaneInt`]; the scalar `f32` backend (width 1) and the
//! `wide` vector backends (width 4 and 8) all run the same code path.
//!
//! Every operation is strictly per-lane, so the value computed for one sample
//! never depends on what sits in the neighbouring lanes.

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Sub};

use serde::{Deserialize, Serialize};
use wide::{f32x4, f32x8, i32x4, i32x8, CmpLt};

/// Integer lanes carrying lattice coordinates and hash bits.
///
/// Arithmetic always wraps; hashing relies on two's-complement overflow.
pub trait LaneInt: Copy + BitAnd<Output = Self> + BitOr<Output = Self> + BitXor<Output = Self> {
    /// Broadcasts one value to every lane.
    fn splat(value: i32) -> Self;

    fn wrapping_add(self, rhs: Self) -> Self;

    fn wrapping_mul(self, rhs: Self) -> Self;

    /// Arithmetic right shift.
    fn shift_right(self, bits: i32) -> Self;

    fn shift_left(self, bits: i32) -> Self;
}

/// Float lanes the kernels are written against.
pub trait Lane:
    Copy + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self> + Div<Output = Self>
{
    /// Number of samples processed together.
    const WIDTH: usize;

    /// Integer lanes of the same width.
    type Int: LaneInt;

    /// Per-lane boolean produced by comparisons.
    type Mask: Copy;

    /// Broadcasts one value to every lane.
    fn splat(value: f32) -> Self;

    /// Loads the first `WIDTH` values of `src`.
    fn load(src: &[f32]) -> Self;

    /// Stores all lanes into the first `WIDTH` slots of `dst`.
    fn store(self, dst: &mut [f32]);

    /// Builds a lane one element at a time.
    fn gather(f: impl FnMut(usize) -> f32) -> Self;

    /// Reads back a single lane.
    fn extract(self, lane: usize) -> f32;

    fn floor(self) -> Self;

    /// `self * m + a`, fused where the backend supports it.
    fn mul_add(self, m: Self, a: Self) -> Self;

    fn sqrt(self) -> Self;

    fn lt(self, rhs: Self) -> Self::Mask;

    /// Branchless per-lane choice: `t` where `mask` is set, else `f`.
    fn select(mask: Self::Mask, t: Self, f: Self) -> Self;

    /// Lanes whose integer sign bit is set.
    fn sign_mask(bits: Self::Int) -> Self::Mask;

    /// Numeric conversion of an already integral float.
    fn to_int(self) -> Self::Int;

    /// Numeric conversion from signed integers.
    fn int_to_float(value: Self::Int) -> Self;

    /// Reinterprets integer bits as IEEE-754 floats without conversion.
    fn from_bits(bits: Self::Int) -> Self;
}

impl LaneInt for i32 {
    #[inline(always)]
    fn splat(value: i32) -> Self {
        value
    }

    #[inline(always)]
    fn wrapping_add(self, rhs: Self) -> Self {
        i32::wrapping_add(self, rhs)
    }

    #[inline(always)]
    fn wrapping_mul(self, rhs: Self) -> Self {
        i32::wrapping_mul(self, rhs)
    }

    #[inline(always)]
    fn shift_right(self, bits: i32) -> Self {
        self >> bits
    }

    #[inline(always)]
    fn shift_left(self, bits: i32) -> Self {
        self << bits
    }
}

impl Lane for f32 {
    const WIDTH: usize = 1;

    type Int = i32;
    type Mask = bool;

    #[inline(always)]
    fn splat(value: f32) -> Self {
        value
    }

    #[inline(always)]
    fn load(src: &[f32]) -> Self {
        src[0]
    }

    #[inline(always)]
    fn store(self, dst: &mut [f32]) {
        dst[0] = self;
    }

    #[inline(always)]
    fn gather(mut f: impl FnMut(usize) -> f32) -> Self {
        f(0)
    }

    #[inline(always)]
    fn extract(self, _lane: usize) -> f32 {
        self
    }

    #[inline(always)]
    fn floor(self) -> Self {
        f32::floor(self)
    }

    #[inline(always)]
    fn mul_add(self, m: Self, a: Self) -> Self {
        f32::mul_add(self, m, a)
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }

    #[inline(always)]
    fn lt(self, rhs: Self) -> bool {
        self < rhs
    }

    #[inline(always)]
    fn select(mask: bool, t: Self, f: Self) -> Self {
        if mask {
            t
        } else {
            f
        }
    }

    #[inline(always)]
    fn sign_mask(bits: i32) -> bool {
        bits < 0
    }

    #[inline(always)]
    fn to_int(self) -> i32 {
        self as i32
    }

    #[inline(always)]
    fn int_to_float(value: i32) -> Self {
        value as f32
    }

    #[inline(always)]
    fn from_bits(bits: i32) -> Self {
        f32::from_bits(bits as u32)
    }
}

macro_rules! impl_wide_lane {
    ($float:ident, $int:ident, $width:literal) => {
        impl LaneInt for $int {
            #[inline(always)]
            fn splat(value: i32) -> Self {
                $int::splat(value)
            }

            #[inline(always)]
            fn wrapping_add(self, rhs: Self) -> Self {
                self + rhs
            }

            #[inline(always)]
            fn wrapping_mul(self, rhs: Self) -> Self {
                self * rhs
            }

            #[inline(always)]
            fn shift_right(self, bits: i32) -> Self {
                self >> bits
            }

            #[inline(always)]
            fn shift_left(self, bits: i32) -> Self {
                self << bits
            }
        }

        impl Lane for $float {
            const WIDTH: usize = $width;

            type Int = $int;
            // Comparisons yield all-ones / all-zeros float lanes.
            type Mask = $float;

            #[inline(always)]
            fn splat(value: f32) -> Self {
                $float::splat(value)
            }

            #[inline(always)]
            fn load(src: &[f32]) -> Self {
                let mut values = [0.0f32; $width];
                values.copy_from_slice(&src[..$width]);
                $float::new(values)
            }

            #[inline(always)]
            fn store(self, dst: &mut [f32]) {
                dst[..$width].copy_from_slice(self.as_array_ref());
            }

            #[inline(always)]
            fn gather(f: impl FnMut(usize) -> f32) -> Self {
                $float::new(std::array::from_fn(f))
            }

            #[inline(always)]
            fn extract(self, lane: usize) -> f32 {
                self.as_array_ref()[lane]
            }

            #[inline(always)]
            fn floor(self) -> Self {
                $float::floor(self)
            }

            #[inline(always)]
            fn mul_add(self, m: Self, a: Self) -> Self {
                $float::mul_add(self, m, a)
            }

            #[inline(always)]
            fn sqrt(self) -> Self {
                $float::sqrt(self)
            }

            #[inline(always)]
            fn lt(self, rhs: Self) -> Self {
                self.cmp_lt(rhs)
            }

            #[inline(always)]
            fn select(mask: Self, t: Self, f: Self) -> Self {
                mask.blend(t, f)
            }

            #[inline(always)]
            fn sign_mask(bits: $int) -> Self {
                bytemuck::cast(bits >> 31)
            }

            #[inline(always)]
            fn to_int(self) -> $int {
                self.round_int()
            }

            #[inline(always)]
            fn int_to_float(value: $int) -> Self {
                value.round_float()
            }

            #[inline(always)]
            fn from_bits(bits: $int) -> Self {
                bytemuck::cast(bits)
            }
        }
    };
}

impl_wide_lane!(f32x4, i32x4, 4);
impl_wide_lane!(f32x8, i32x8, 8);

/// Lane type used by the plain entry points.
pub type DefaultLane = f32x8;

/// Runtime choice of numeric backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneWidth {
    /// One sample at a time, plain `f32` math.
    Scalar,
    /// `wide::f32x4`.
    Four,
    /// `wide::f32x8`.
    #[default]
    Eight,
}

impl LaneWidth {
    /// Number of samples per lane.
    pub fn width(self) -> usize {
        match self {
            LaneWidth::Scalar => <f32 as Lane>::WIDTH,
            LaneWidth::Four => <f32x4 as Lane>::WIDTH,
            LaneWidth::Eight => <f32x8 as Lane>::WIDTH,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LaneWidth::Scalar => "scalar",
            LaneWidth::Four => "f32x4",
            LaneWidth::Eight => "f32x8",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lanes<L: Lane>(value: L) -> Vec<f32> {
        (0..L::WIDTH).map(|i| value.extract(i)).collect()
    }

    fn check_backend<L: Lane>() {
        let inputs: Vec<f32> = (0..L::WIDTH).map(|i| i as f32 * 1.75 - 3.2).collect();
        let x = L::load(&inputs);

        let floored = lanes(x.floor());
        for (f, v) in floored.iter().zip(&inputs) {
            assert_eq!(*f, v.floor());
        }

        let ints = x.floor().to_int();
        let back = lanes(L::int_to_float(ints));
        assert_eq!(back, floored);

        let mask = x.lt(L::splat(0.0));
        let chosen = lanes(L::select(mask, L::splat(-1.0), L::splat(1.0)));
        for (c, v) in chosen.iter().zip(&inputs) {
            assert_eq!(*c, if *v < 0.0 { -1.0 } else { 1.0 });
        }

        let mut out = vec![0.0; L::WIDTH];
        L::splat(4.0).sqrt().store(&mut out);
        assert!(out.iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_scalar_backend() {
        check_backend::<f32>();
    }

    #[test]
    fn test_f32x4_backend() {
        check_backend::<f32x4>();
    }

    #[test]
    fn test_f32x8_backend() {
        check_backend::<f32x8>();
    }

    #[test]
    fn test_bit_reinterpretation_matches_scalar() {
        let bits = i32x8::new([
            0x3F80_0000,
            0xBF80_0000_u32 as i32,
            0x4000_0000,
            0,
            0x3E80_0000,
            0x7F7F_FFFF,
            0x0080_0000,
            0xC040_0000_u32 as i32,
        ]);
        let wide_lanes = lanes(<f32x8 as Lane>::from_bits(bits));
        let scalar: Vec<f32> = bits
            .to_array()
            .iter()
            .map(|&b| <f32 as Lane>::from_bits(b))
            .collect();
        assert_eq!(wide_lanes, scalar);
        assert_eq!(wide_lanes[0], 1.0);
        assert_eq!(wide_lanes[1], -1.0);
    }

    #[test]
    fn test_sign_mask_selects_negative_lanes() {
        let bits = i32x4::new([-5, 7, i32::MIN, 0]);
        let mask = <f32x4 as Lane>::sign_mask(bits);
        let picked = lanes(<f32x4 as Lane>::select(mask, f32x4::splat(1.0), f32x4::splat(0.0)));
        assert_eq!(picked, vec![1.0, 0.0, 1.0, 0.0]);
        assert!(<f32 as Lane>::sign_mask(-1));
        assert!(!<f32 as Lane>::sign_mask(1));
    }

    #[test]
    fn test_wrapping_integer_ops() {
        let a = i32x4::splat(i32::MAX);
        let wrapped = LaneInt::wrapping_add(a, i32x4::splat(1)).to_array();
        assert_eq!(wrapped, [i32::MIN; 4]);
        assert_eq!(LaneInt::wrapping_mul(i32::MAX, 2i32), -2);
        assert_eq!(LaneInt::shift_right(-256i32, 4), -16);
    }

    #[test]
    fn test_lane_width_sizes() {
        assert_eq!(LaneWidth::Scalar.width(), 1);
        assert_eq!(LaneWidth::Four.width(), 4);
        assert_eq!(LaneWidth::Eight.width(), 8);
        assert_eq!(LaneWidth::default(), LaneWidth::Eight);
    }
}
