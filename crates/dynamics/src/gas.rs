//! Indicator-diagram gas pressure over the four-stroke cycle.
//!
//! The table holds the digitized diagram height (mm) at each breakpoint angle (deg, 0 to 720).
//! Repeated angles such as 180/180.1 and 540/540.1 model near-vertical pressure jumps at the
//! valve events. Lookups within [`MATCH_TOLERANCE`] of a breakpoint return the first matching
//! breakpoint; other angles interpolate linearly between the bracketing breakpoints.

use itertools::Itertools;

/// Diagram scale between height and cylinder pressure (N/cm² per mm).
pub const PRESSURE_PER_HEIGHT: f64 = 2.0;

/// Angular distance (deg) under which an angle is taken to be exactly on a breakpoint.
pub const MATCH_TOLERANCE: f64 = 0.01;

/// Cycle length (deg) over which the table wraps.
pub const CYCLE_DEG: f64 = 720.0;

/// `(angle, height)` breakpoints, ordered by angle.
pub const GAS_HEIGHT_TABLE: &[(f64, f64)] = &[
    (0.0, 0.0),
    (30.0, 1.0),
    (60.0, 1.0),
    (73.5, 1.0),
    (90.0, 1.0),
    (120.0, 1.0),
    (150.0, 1.0),
    (180.0, 1.0),
    (180.1, 1.0),
    (210.0, 1.0),
    (240.0, 1.5),
    (270.0, 5.0),
    (283.5, 8.0),
    (300.0, 15.0),
    (330.0, 43.5),
    (360.0, 140.0),
    (390.0, 140.0),
    (420.0, 72.5),
    (433.5, 50.5),
    (450.0, 32.5),
    (480.0, 15.0),
    (510.0, 7.5),
    (540.0, 2.5),
    (540.1, 2.5),
    (570.0, 1.0),
    (600.0, 1.0),
    (630.0, 1.0),
    (643.5, 1.0),
    (660.0, 1.0),
    (690.0, 1.0),
    (720.0, 0.0),
];

/// Diagram height (mm) at a crank angle (deg). Angles outside `0..720` wrap around the cycle.
pub fn gas_height(angle: f64) -> f64 {
    let angle = angle.rem_euclid(CYCLE_DEG);

    if let Some(&(_, height)) = GAS_HEIGHT_TABLE
        .iter()
        .find(|(key, _)| (key - angle).abs() < MATCH_TOLERANCE)
    {
        return height;
    }

    GAS_HEIGHT_TABLE
        .iter()
        .tuple_windows()
        .find(|((lo, _), (hi, _))| angle >= *lo && angle <= *hi)
        .map(|(&(lo, h_lo), &(hi, h_hi))| h_lo + (h_hi - h_lo) * (angle - lo) / (hi - lo))
        .unwrap_or(0.0)
}

/// Piston crown area (cm²) for a bore `d` in millimetres.
pub fn piston_area_cm2(d: f64) -> f64 {
    let d_cm = d / 10.0;
    std::f64::consts::PI * (d_cm / 2.0).powi(2)
}

/// Gas force magnitude (N) on a piston of bore `d` (mm) at a crank angle (deg).
pub fn gas_force(d: f64, angle: f64) -> f64 {
    gas_height(angle) * PRESSURE_PER_HEIGHT * piston_area_cm2(d)
}
