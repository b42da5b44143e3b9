//! Coherent noise evaluation.
//!
//! Kernels are written once against the [`Lane`] abstraction and run on a
//! scalar `f32` backend or on `wide` vector lanes. The batch entry points are
//! the public way in; the kernels are exposed for callers that manage their
//! own lanes.

mod batch;
mod cellular;
mod gradient;
pub mod hash;
mod lane;

pub use batch::{
    NoiseError, evaluate_cellular_2d, evaluate_cellular_2d_with, evaluate_cellular_3d,
    evaluate_cellular_3d_with, evaluate_gradient_2d, evaluate_gradient_2d_with,
    evaluate_gradient_3d, evaluate_gradient_3d_with,
};
pub use cellular::{cellular_2d, cellular_3d};
pub use gradient::{GradientMode, gradient_2d, gradient_3d, lerp, smootherstep};
pub use lane::{DefaultLane, Lane, LaneInt, LaneWidth};
