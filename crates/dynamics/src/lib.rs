//! Dynamic-static (D'Alembert) force analysis, driving-torque cycle integration, flywheel sizing
//! and rotating-mass balancing for the offset slider-crank engine.
//!
//! Forces are expressed in the frame of [`linkage::KinematicState`]; moments and cross products
//! are counterclockwise-positive.

use thiserror::Error;

mod balance;
mod cycle;
mod forces;
pub mod gas;

pub use balance::{balance, Balance, COUNTERWEIGHT_RADIUS_RATIO};
pub use cycle::{
    sample_cycle, summarize_cycle, CycleSummary, DrawingScales, FlywheelSpec, Lobe, TorqueSample,
};
pub use forces::{ForceSolver, ForceState, MassProperties};

/// Gravitational acceleration used to convert weights to masses (m/s²).
pub const GRAVITY: f64 = 9.8;

#[derive(Debug, Error)]
pub enum Error {
    /// The rod is perpendicular to the stroke axis and the force balance has no unique solution.
    #[error("Singular rod orientation at crank angle {phi} deg")]
    SingularOrientation { phi: f64 },

    #[error("Invalid flywheel configuration: {msg}")]
    InvalidFlywheelConfig { msg: String },

    #[error("Illegal input: {msg}")]
    InvalidInput { msg: String },

    #[error(transparent)]
    Linkage(#[from] linkage::Error),
}
