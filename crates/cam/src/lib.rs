//! Disc cam profiles for the valve train of the engine, with an offset roller follower, and the
//! valve timing derived from them.
//!
//! Cam angles are in degrees and lengths in millimetres. Profile points are in the cam frame: the
//! follower axis is `+y` at cam angle zero and the cam turns so that points advance clockwise.

use thiserror::Error;

mod motion;
mod profile;
mod timing;

pub use motion::MotionLaw;
pub use profile::{synthesize_profile, CamProfile, CamProfileOptions, CamSample, CamSpec};
pub use timing::{valve_timing, StrokePhases, ValveEvent, ValveTiming, ValveTimingSpec};

pub type Vec2 = nalgebra::Vector2<f64>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid motion law: rise {rise}, dwell {dwell}, fall {fall}, remain {remain} ({reason})")]
    InvalidMotionLaw {
        rise: f64,
        dwell: f64,
        fall: f64,
        remain: f64,
        reason: &'static str,
    },

    #[error("Invalid cam: {msg}")]
    InvalidCamSpec { msg: String },

    #[error("Illegal input: {msg}")]
    InvalidInput { msg: String },
}
