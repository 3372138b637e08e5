//! Position, velocity and acceleration analysis of the slider-crank at a given crank angle,
//! assuming the crank turns at a constant angular velocity.

use std::f64::consts::PI;

use log::trace;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{Error, GeometrySolution, Vec2, SINGULAR_EPS};

/// A slider-crank with fixed link lengths, in SI units.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Linkage {
    /// connecting rod length (m)
    l: f64,
    /// crank length (m)
    r: f64,
    /// offset (m)
    e: f64,
    /// fraction of the rod length from the crank pin to the rod centroid
    lac_ratio: f64,
    /// crank speed (rpm)
    n1: f64,
}

/// Full kinematic state at one crank angle. Lengths in m, velocities in m/s, accelerations in
/// m/s², angular rates in rad/s (rad/s²).
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KinematicState {
    /// crank angle measured from top dead centre (deg)
    pub phi: f64,
    /// crank angle measured from the stroke axis (rad)
    pub phi_geo: f64,
    /// rod angle measured from the stroke axis (rad)
    pub beta: f64,

    /// crank pin `A`
    pub crank_pin: Vec2,
    /// piston pin `B`
    pub piston_pin: Vec2,
    /// rod centroid `C2`
    pub rod_centroid: Vec2,
    /// piston pin position along the stroke axis
    pub slider_y: f64,
    /// piston travel away from top dead centre
    pub displacement: f64,

    pub omega1: f64,
    /// rod angular velocity, positive in the crank's sense of rotation
    pub omega2: f64,
    /// rod angular acceleration, positive in the crank's sense of rotation
    pub alpha2: f64,

    pub v_a: Vec2,
    /// velocity of `B` relative to `A`
    pub v_ba: Vec2,
    pub v_b: Vec2,
    pub v_c2: Vec2,

    pub a_a: Vec2,
    /// normal (centripetal) part of the acceleration of `B` relative to `A`
    pub a_ba_n: Vec2,
    /// tangential part of the acceleration of `B` relative to `A`
    pub a_ba_t: Vec2,
    pub a_ba: Vec2,
    pub a_b: Vec2,
    pub a_c2: Vec2,
}

impl KinematicState {
    /// Piston speed along the stroke, positive moving away from top dead centre.
    pub fn piston_velocity(&self) -> f64 {
        -self.v_b.y
    }

    /// Piston acceleration along the stroke, positive pointing away from top dead centre.
    pub fn piston_acceleration(&self) -> f64 {
        -self.a_b.y
    }

    /// Unit vector along the rod, from the piston pin toward the crank pin.
    pub fn rod_direction(&self) -> Vec2 {
        (self.crank_pin - self.piston_pin).normalize()
    }
}

impl Linkage {
    /// Build a linkage from a synthesized geometry (mm) and the rod/speed data.
    ///
    /// # Arguments
    ///
    /// * `geometry` - rod and crank lengths from [`crate::synthesize_geometry`]
    /// * `lac_ratio` - fraction of the rod length from the crank pin to the rod centroid
    /// * `n1` - crank speed (rpm)
    pub fn new(geometry: &GeometrySolution, lac_ratio: f64, n1: f64) -> Result<Self, Error> {
        Self::from_lengths(geometry.l, geometry.r, geometry.e, lac_ratio, n1)
    }

    /// Build a linkage from explicit lengths in millimetres.
    pub fn from_lengths(l: f64, r: f64, e: f64, lac_ratio: f64, n1: f64) -> Result<Self, Error> {
        if !(l > 0.0 && r > 0.0 && e >= 0.0) {
            return Err(Error::InvalidInput {
                msg: format!("link lengths must be positive: l = {l}, r = {r}, e = {e}"),
            });
        }
        if !(lac_ratio > 0.0 && lac_ratio < 1.0) {
            return Err(Error::InvalidInput {
                msg: format!("rod centroid ratio {lac_ratio} must lie in (0, 1)"),
            });
        }
        if !(n1 > 0.0 && n1.is_finite()) {
            return Err(Error::InvalidInput {
                msg: format!("crank speed n1 = {n1} must be positive"),
            });
        }
        if e >= l + r {
            return Err(Error::UnreachableOffset {
                e,
                l,
                r,
                reason: "offset is not smaller than l + r",
            });
        }

        Ok(Linkage {
            l: l / 1000.0,
            r: r / 1000.0,
            e: e / 1000.0,
            lac_ratio,
            n1,
        })
    }

    /// Connecting rod length (m).
    pub fn rod_length(&self) -> f64 {
        self.l
    }

    /// Crank length (m).
    pub fn crank_length(&self) -> f64 {
        self.r
    }

    /// Offset (m).
    pub fn offset(&self) -> f64 {
        self.e
    }

    pub fn lac_ratio(&self) -> f64 {
        self.lac_ratio
    }

    pub fn n1(&self) -> f64 {
        self.n1
    }

    /// Crank angular velocity (rad/s).
    pub fn omega1(&self) -> f64 {
        2.0 * PI * self.n1 / 60.0
    }

    /// Crank angle (rad, from the stroke axis) of top dead centre.
    pub fn tdc_angle(&self) -> f64 {
        (self.e / (self.l + self.r)).asin()
    }

    /// Piston pin position along the stroke axis at top dead centre.
    pub fn tdc_slider_y(&self) -> f64 {
        ((self.l + self.r).powi(2) - self.e.powi(2)).sqrt()
    }

    /// Solve the full kinematic state.
    ///
    /// # Arguments
    ///
    /// * `phi` - crank angle from top dead centre (deg)
    ///
    /// # Errors
    ///
    /// * `Error::DivergentMotion` if the rod is perpendicular to the stroke axis.
    pub fn solve(&self, phi: f64) -> Result<KinematicState, Error> {
        if !phi.is_finite() {
            return Err(Error::InvalidInput {
                msg: format!("crank angle {phi} is not finite"),
            });
        }
        let Linkage {
            l, r, e, lac_ratio, ..
        } = *self;

        let omega1 = self.omega1();
        let phi_geo = self.tdc_angle() + phi.to_radians();
        let (sin_phi, cos_phi) = phi_geo.sin_cos();

        // position
        let sin_beta = ((e - r * sin_phi) / l).clamp(-1.0, 1.0);
        let beta = sin_beta.asin();
        let cos_beta = beta.cos();
        if cos_beta.abs() < SINGULAR_EPS {
            return Err(Error::DivergentMotion { phi });
        }

        let crank_pin = Vec2::new(r * sin_phi, r * cos_phi);
        let slider_y = r * cos_phi + l * cos_beta;
        let piston_pin = Vec2::new(crank_pin.x + l * sin_beta, slider_y);
        let rod_centroid = crank_pin + (piston_pin - crank_pin) * lac_ratio;

        // velocity
        let v_a = Vec2::new(r * omega1 * cos_phi, -r * omega1 * sin_phi);
        let omega2 = -(r * omega1 * cos_phi) / (l * cos_beta);
        let v_ba = Vec2::new(l * omega2 * cos_beta, -l * omega2 * sin_beta);
        let v_b = v_a + v_ba;
        let v_c2 = v_a + v_ba * lac_ratio;

        // acceleration, the crank has no tangential term at constant speed
        let alpha2 =
            (r * omega1.powi(2) * sin_phi + l * omega2.powi(2) * sin_beta) / (l * cos_beta);
        let a_a = Vec2::new(-r * omega1.powi(2) * sin_phi, -r * omega1.powi(2) * cos_phi);
        let a_ba_n = Vec2::new(-l * omega2.powi(2) * sin_beta, -l * omega2.powi(2) * cos_beta);
        let a_ba_t = Vec2::new(l * alpha2 * cos_beta, -l * alpha2 * sin_beta);
        let a_ba = a_ba_n + a_ba_t;
        let a_b = a_a + a_ba;
        let a_c2 = a_a + a_ba_n * lac_ratio + a_ba_t * lac_ratio;

        trace!("solve(phi={phi:.3}) beta={beta:.6} omega2={omega2:.4} alpha2={alpha2:.4}");

        Ok(KinematicState {
            phi,
            phi_geo,
            beta,
            crank_pin,
            piston_pin,
            rod_centroid,
            slider_y,
            displacement: self.tdc_slider_y() - slider_y,
            omega1,
            omega2,
            alpha2,
            v_a,
            v_ba,
            v_b,
            v_c2,
            a_a,
            a_ba_n,
            a_ba_t,
            a_ba,
            a_b,
            a_c2,
        })
    }

    /// Crank angle (deg from top dead centre) in `lo..=hi` with the largest piston speed, found
    /// by a fixed-step scan.
    pub fn max_piston_speed_angle(&self, lo: f64, hi: f64, step: f64) -> Result<f64, Error> {
        if !(step > 0.0 && hi >= lo) {
            return Err(Error::InvalidInput {
                msg: format!("bad scan range {lo}..={hi} step {step}"),
            });
        }
        let count = ((hi - lo) / step).floor() as usize;
        let mut best = (lo, f64::NEG_INFINITY);
        for i in 0..=count {
            let angle = lo + step * i as f64;
            let speed = self.solve(angle)?.v_b.y.abs();
            if speed > best.1 {
                best = (angle, speed);
            }
        }
        Ok(best.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;
    use crate::synthesize_geometry;

    fn scheme_vii() -> Linkage {
        let geo = synthesize_geometry(1.04, 215.0, 45.0).unwrap();
        Linkage::new(&geo, 0.35, 600.0).unwrap()
    }

    #[test]
    fn test_tdc() {
        let linkage = scheme_vii();
        let state = linkage.solve(0.0).unwrap();

        // crank and rod are collinear at top dead centre
        assert_abs_diff_eq!(state.crank_pin.perp(&state.piston_pin), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(state.displacement, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(state.v_b.y, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(state.piston_pin.x, linkage.offset(), epsilon = 1e-12);
    }

    #[test]
    fn test_bdc_displacement_is_stroke() {
        let geo = synthesize_geometry(1.04, 215.0, 45.0).unwrap();
        let linkage = Linkage::new(&geo, 0.35, 600.0).unwrap();
        let state = linkage.solve(geo.bdc_crank_angle_deg().unwrap()).unwrap();
        assert_relative_eq!(state.displacement, 0.215, max_relative = 1e-9);
        assert_abs_diff_eq!(state.v_b.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_slider_constraint() {
        let linkage = scheme_vii();
        for phi in (0..360).step_by(15) {
            let state = linkage.solve(phi as f64).unwrap();
            // the piston stays on its guide and the rod keeps its length
            assert_abs_diff_eq!(state.piston_pin.x, linkage.offset(), epsilon = 1e-12);
            assert_abs_diff_eq!(state.v_b.x, 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(state.a_b.x, 0.0, epsilon = 1e-6);
            assert_relative_eq!(
                (state.piston_pin - state.crank_pin).norm(),
                linkage.rod_length(),
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_velocity_matches_finite_difference() {
        let linkage = scheme_vii();
        let h: f64 = 1.0e-4;
        let dt = h.to_radians() / linkage.omega1();
        for phi in [10.0, 73.5, 150.0, 283.5] {
            let before = linkage.solve(phi - h).unwrap();
            let state = linkage.solve(phi).unwrap();
            let after = linkage.solve(phi + h).unwrap();

            let v_fd = (after.piston_pin - before.piston_pin) / (2.0 * dt);
            assert_relative_eq!(state.v_b, v_fd, epsilon = 1e-5, max_relative = 1e-5);

            let a_fd = (after.v_c2 - before.v_c2) / (2.0 * dt);
            assert_relative_eq!(state.a_c2, a_fd, epsilon = 1e-3, max_relative = 1e-4);

            let alpha_fd = (after.omega2 - before.omega2) / (2.0 * dt);
            assert_relative_eq!(state.alpha2, alpha_fd, epsilon = 1e-3, max_relative = 1e-4);
        }
    }

    #[test]
    fn test_periodic() {
        let linkage = scheme_vii();
        let a = linkage.solve(0.0).unwrap();
        let b = linkage.solve(360.0).unwrap();
        assert_relative_eq!(a.piston_pin, b.piston_pin, epsilon = 1e-12);
        assert_relative_eq!(a.v_b, b.v_b, epsilon = 1e-9);
        assert_relative_eq!(a.a_c2, b.a_c2, epsilon = 1e-7);
    }

    #[test]
    fn test_max_piston_speed_scan() {
        let linkage = scheme_vii();
        let angle = linkage.max_piston_speed_angle(60.0, 90.0, 0.1).unwrap();
        assert!(angle > 60.0 && angle < 90.0);
        let peak = linkage.solve(angle).unwrap().v_b.y.abs();
        assert!(peak >= linkage.solve(60.0).unwrap().v_b.y.abs());
        assert!(peak >= linkage.solve(90.0).unwrap().v_b.y.abs());
    }

    #[test]
    fn test_invalid_linkage() {
        assert!(matches!(
            Linkage::from_lengths(100.0, 50.0, 10.0, 1.2, 600.0),
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            Linkage::from_lengths(100.0, 50.0, 200.0, 0.3, 600.0),
            Err(Error::UnreachableOffset { .. })
        ));
        let err = Linkage::from_lengths(100.0, 50.0, 200.0, 0.3, 600.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unreachable offset e = 200 for l = 100, r = 50: offset is not smaller than l + r"
        );
    }
}
