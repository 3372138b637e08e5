//! Geometry synthesis and kinematics of the offset slider-crank mechanism.
//!
//! All kinematic quantities are expressed in a single frame: origin at the crank centre `O`,
//! `y` along the stroke axis pointing toward the cylinder head, `x` toward the offset side. The
//! piston pin moves on the line `x = e`, and the crank turns in the direction of increasing
//! crank angle (clockwise when drawn with `y` up). Angular rates of the rod (`omega2`, `alpha2`)
//! are measured in the same sense as the crank; moments and cross products elsewhere are
//! counterclockwise-positive.

use thiserror::Error;

mod curves;
mod geometry;
mod kinematics;

pub use curves::{CurveSample, MotionCurves};
pub use geometry::{synthesize_geometry, GeometrySolution};
pub use kinematics::{KinematicState, Linkage};

/// Planar vector type shared by the solver crates.
pub type Vec2 = nalgebra::Vector2<f64>;

/// Divisors smaller than this are treated as a mechanism singularity.
pub const SINGULAR_EPS: f64 = 1.0e-9;

#[derive(Debug, Error)]
pub enum Error {
    /// The stroke, offset and stroke-speed ratio combination has no real mechanism.
    #[error("Infeasible geometry for K = {k}, H = {h}, e = {e}: {reason}")]
    InfeasibleGeometry {
        k: f64,
        h: f64,
        e: f64,
        reason: &'static str,
    },

    /// The offset leaves no dead centre for the given rod and crank lengths (mm).
    #[error("Unreachable offset e = {e} for l = {l}, r = {r}: {reason}")]
    UnreachableOffset {
        e: f64,
        l: f64,
        r: f64,
        reason: &'static str,
    },

    /// `cos(beta)` vanished, the rod is perpendicular to the stroke axis.
    #[error("Divergent motion at crank angle {phi} deg: rod perpendicular to the stroke axis")]
    DivergentMotion { phi: f64 },

    #[error("Illegal input: {msg}")]
    InvalidInput { msg: String },
}
