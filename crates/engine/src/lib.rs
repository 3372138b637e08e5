//! Design report of a single-cylinder four-stroke engine built on an offset slider-crank.
//!
//! [`Analyzer`] takes a [`SchemeParameters`] (one of the [`Preset`] schemes or custom values)
//! and produces a [`SchemeReport`] with the linkage geometry, kinematics at the report
//! positions, piston motion curves, joint forces, the torque cycle with flywheel sizing,
//! rotating-mass balancing, both valve cams and the valve timing.
//!
//! ```no_run
//! use engine::{Analyzer, Preset};
//!
//! let mut analyzer = Analyzer::default();
//! let report = analyzer.analyze(&Preset::VII.parameters());
//! if let Ok(cycle) = &report.cycle {
//!     println!("flywheel inertia {:.3} kg·m²", cycle.summary.je);
//! }
//! ```

use thiserror::Error;

mod analyzer;
mod params;
pub mod positions;
mod report;

pub use analyzer::{Analyzer, AnalyzerOptions};
pub use params::{Preset, SchemeParameters};
pub use positions::AnalysisPosition;
pub use report::{AtPosition, CycleReport, SchemeReport};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Unknown preset {0:?}")]
    UnknownPreset(String),

    #[error(transparent)]
    Linkage(#[from] linkage::Error),

    #[error(transparent)]
    Dynamics(#[from] dynamics::Error),

    #[error(transparent)]
    Cam(#[from] cam::Error),
}
