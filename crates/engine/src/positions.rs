//! Crank positions at which the report tabulates the mechanism. Angles are crank degrees from
//! top dead centre.

use linkage::{GeometrySolution, Linkage};

#[cfg(feature = "serde-serialize")]
use serde::Serialize;

use crate::Error;

#[cfg_attr(feature = "serde-serialize", derive(Serialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalysisPosition {
    pub label: &'static str,
    pub angle: f64,
}

/// Positions of the force analysis over the full 720° cycle. The primed positions sit on the
/// indicator-diagram breakpoints between the 30° marks.
#[rustfmt::skip]
pub const DYNAMIC_POSITIONS: [(&str, f64); 30] = [
    ("A0", 0.0), ("A1", 30.0), ("A2", 60.0), ("A'2", 73.5), ("A3", 90.0),
    ("A4", 120.0), ("A5", 150.0), ("A6", 180.0), ("A'6", 180.1), ("A7", 210.0),
    ("A8", 240.0), ("A9", 270.0), ("A'9", 283.5), ("A10", 300.0), ("A11", 330.0),
    ("A12", 360.0), ("A13", 390.0), ("A14", 420.0), ("A'14", 433.5), ("A15", 450.0),
    ("A16", 480.0), ("A17", 510.0), ("A18", 540.0), ("A'18", 540.1), ("A19", 570.0),
    ("A20", 600.0), ("A21", 630.0), ("A'21", 643.5), ("A22", 660.0), ("A23", 690.0),
];

const KINEMATIC_LABELS: [&str; 12] = [
    "A0", "A1", "A2", "A3", "A4", "A5", "A6", "A7", "A8", "A9", "A10", "A11",
];

/// Scan step (deg) when searching for the largest piston speed.
pub const SPEED_SCAN_STEP: f64 = 0.1;

pub fn dynamic_positions() -> Vec<AnalysisPosition> {
    DYNAMIC_POSITIONS
        .iter()
        .map(|&(label, angle)| AnalysisPosition { label, angle })
        .collect()
}

/// Positions of the kinematic analysis over one crank turn: every 30° plus the two positions of
/// largest piston speed (`A'2`, `A'9`) and bottom dead centre (`A'6`), ordered by angle.
pub fn kinematic_positions(
    geometry: &GeometrySolution,
    linkage: &Linkage,
) -> Result<Vec<AnalysisPosition>, Error> {
    let mut positions: Vec<AnalysisPosition> = KINEMATIC_LABELS
        .iter()
        .enumerate()
        .map(|(i, &label)| AnalysisPosition {
            label,
            angle: 30.0 * i as f64,
        })
        .collect();

    positions.push(AnalysisPosition {
        label: "A'2",
        angle: linkage.max_piston_speed_angle(60.0, 90.0, SPEED_SCAN_STEP)?,
    });
    positions.push(AnalysisPosition {
        label: "A'6",
        angle: geometry.bdc_crank_angle_deg()?,
    });
    positions.push(AnalysisPosition {
        label: "A'9",
        angle: linkage.max_piston_speed_angle(270.0, 300.0, SPEED_SCAN_STEP)?,
    });

    positions.sort_by(|a, b| a.angle.total_cmp(&b.angle));
    Ok(positions)
}
