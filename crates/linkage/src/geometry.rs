//! Synthesis of the crank and connecting-rod lengths from the stroke, offset and stroke-speed
//! ratio, using the auxiliary-circle construction.

use log::debug;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::Error;

/// Result of the geometry synthesis. Lengths are in millimetres, angles in degrees.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometrySolution {
    /// half-included angle between the two crank extreme positions
    pub theta: f64,
    /// radius of the auxiliary circle through both piston extreme positions
    pub big_r: f64,
    /// distance from the auxiliary circle centre to the stroke chord
    pub cd: f64,
    pub oe: f64,
    pub of: f64,
    /// `l + r`
    pub dist_max: f64,
    /// `l - r`
    pub dist_min: f64,
    pub alpha: f64,
    pub delta: f64,
    /// connecting rod length
    pub l: f64,
    /// crank length
    pub r: f64,
    /// offset the solution was synthesized for
    pub e: f64,
}

/// Solve for the connecting-rod and crank lengths.
///
/// # Arguments
///
/// * `k` - stroke-speed ratio, must be `> 1`
/// * `h` - stroke (mm)
/// * `e` - offset of the stroke line from the crank centre (mm), `0` for an in-line mechanism
///
/// # Errors
///
/// * `Error::InvalidInput` for non-finite or out-of-range arguments.
/// * `Error::InfeasibleGeometry` if the auxiliary-circle construction has no real solution or
///     yields a non-positive rod or crank length.
pub fn synthesize_geometry(k: f64, h: f64, e: f64) -> Result<GeometrySolution, Error> {
    if !(k.is_finite() && h.is_finite() && e.is_finite()) {
        return Err(Error::InvalidInput {
            msg: format!("non-finite geometry input K = {k}, H = {h}, e = {e}"),
        });
    }
    if k <= 1.0 {
        return Err(Error::InvalidInput {
            msg: format!("stroke-speed ratio K = {k} must be greater than 1"),
        });
    }
    if h <= 0.0 {
        return Err(Error::InvalidInput {
            msg: format!("stroke H = {h} must be positive"),
        });
    }
    if e < 0.0 {
        return Err(Error::InvalidInput {
            msg: format!("offset e = {e} must not be negative"),
        });
    }

    let infeasible = |reason| Error::InfeasibleGeometry { k, h, e, reason };

    let theta = 180.0 * (k - 1.0) / (k + 1.0);
    let theta_rad = theta.to_radians();

    let big_r = h / (2.0 * theta_rad.sin());
    let cd = big_r * theta_rad.cos();

    // The auxiliary-circle centre and the crank centre sit on the same side of the stroke line
    // for K close to 1, so the distance between them is |CD - e|.
    let vertical_dist = (cd - e).abs();
    if vertical_dist > big_r {
        return Err(infeasible("offset places the crank centre outside the auxiliary circle"));
    }
    let oe = (big_r.powi(2) - vertical_dist.powi(2)).sqrt();
    let of = oe + h / 2.0;

    let dist_max = (of.powi(2) + e.powi(2)).sqrt();

    let alpha_rad = (oe / big_r).asin();
    let delta_rad = alpha_rad - theta_rad;
    let dist_min = 2.0 * big_r * (delta_rad / 2.0).sin();

    let l = (dist_max + dist_min) / 2.0;
    let r = (dist_max - dist_min) / 2.0;

    if !(l > 0.0) {
        return Err(infeasible("non-positive connecting rod length"));
    }
    if !(r > 0.0) {
        return Err(infeasible("non-positive crank length"));
    }

    debug!("synthesized geometry K={k} H={h} e={e}: l={l:.4} r={r:.4} theta={theta:.4}");

    Ok(GeometrySolution {
        theta,
        big_r,
        cd,
        oe,
        of,
        dist_max,
        dist_min,
        alpha: alpha_rad.to_degrees(),
        delta: delta_rad.to_degrees(),
        l,
        r,
        e,
    })
}

impl GeometrySolution {
    /// Crank angle (rad, from the stroke axis) of top dead centre.
    pub fn tdc_angle(&self) -> f64 {
        (self.e / (self.l + self.r)).asin()
    }

    /// Crank angle (rad, from the stroke axis) of bottom dead centre, where the crank pin lies
    /// on the far side of the crank centre from the piston pin.
    pub fn bdc_angle(&self) -> Result<f64, Error> {
        let ratio = self.e / (self.l - self.r);
        if !(ratio.abs() < 1.0) {
            return Err(Error::UnreachableOffset {
                e: self.e,
                l: self.l,
                r: self.r,
                reason: "offset exceeds l - r, bottom dead centre is unreachable",
            });
        }
        Ok(std::f64::consts::PI + ratio.asin())
    }

    /// Crank rotation (deg) from top dead centre to bottom dead centre.
    pub fn bdc_crank_angle_deg(&self) -> Result<f64, Error> {
        Ok((self.bdc_angle()? - self.tdc_angle()).to_degrees())
    }

    /// Stroke reproduced from `l`, `r` and `e`: the distance between the two dead-centre piston
    /// positions along the stroke axis.
    pub fn stroke_check(&self) -> f64 {
        let top = (self.dist_max.powi(2) - self.e.powi(2)).sqrt();
        let bottom = (self.dist_min.powi(2) - self.e.powi(2)).sqrt();
        top - bottom
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    #[test]
    fn test_scheme_vii() {
        let geo = synthesize_geometry(1.04, 215.0, 45.0).unwrap();

        assert_relative_eq!(geo.theta, 180.0 * 0.04 / 2.04, max_relative = 1e-12);
        assert_relative_eq!(geo.l, 410.571111459593, max_relative = 1e-9);
        assert_relative_eq!(geo.r, 106.80453275331908, max_relative = 1e-9);

        // chord identity H = 2 R sin(theta) recovers the same auxiliary radius
        let theta = geo.theta.to_radians();
        assert_relative_eq!(2.0 * geo.big_r * theta.sin(), 215.0, max_relative = 1e-12);
        let delta = (geo.alpha - geo.theta).to_radians();
        assert_relative_eq!(
            (geo.l - geo.r) / (2.0 * (delta / 2.0).sin()),
            geo.big_r,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_round_trip() {
        for &(k, h, e) in &[
            (1.04, 225.0, 50.0),
            (1.05, 270.0, 60.0),
            (1.08, 210.0, 65.0),
            (1.07, 185.0, 55.0),
        ] {
            let geo = synthesize_geometry(k, h, e).unwrap();
            assert_relative_eq!(geo.l + geo.r, geo.dist_max, max_relative = 1e-6);
            assert_relative_eq!(geo.l - geo.r, geo.dist_min, max_relative = 1e-6);
            assert_relative_eq!(geo.stroke_check(), h, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_dead_centres() {
        let geo = synthesize_geometry(1.04, 215.0, 45.0).unwrap();
        assert_relative_eq!(geo.tdc_angle(), (45.0 / (geo.l + geo.r)).asin());
        // the working stroke is the slower one by exactly the extreme-position angle
        assert_abs_diff_eq!(
            geo.bdc_crank_angle_deg().unwrap(),
            180.0 + geo.theta,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_infeasible() {
        // offset far beyond the auxiliary circle
        assert!(matches!(
            synthesize_geometry(1.04, 215.0, 1.0e5),
            Err(Error::InfeasibleGeometry { .. })
        ));
        assert!(matches!(
            synthesize_geometry(1.0, 215.0, 45.0),
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            synthesize_geometry(1.04, -1.0, 45.0),
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            synthesize_geometry(f64::NAN, 215.0, 45.0),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_unreachable_bdc() {
        let geo = synthesize_geometry(1.04, 215.0, 45.0).unwrap();
        let wide = GeometrySolution { e: 400.0, ..geo };
        match wide.bdc_angle() {
            Err(Error::UnreachableOffset { e, l, r, .. }) => {
                assert_eq!(e, 400.0);
                assert_eq!(l, geo.l);
                assert_eq!(r, geo.r);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!wide.bdc_angle().unwrap_err().to_string().contains("NaN"));
    }
}
