use std::f64::consts::TAU;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::Error;

/// Follower motion program over one cam revolution: a cycloidal rise, an upper dwell, a cycloidal
/// fall and the remaining lower dwell. All angles in degrees.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionLaw {
    pub rise: f64,
    pub dwell: f64,
    pub fall: f64,
    pub remain: f64,
}

impl Default for MotionLaw {
    fn default() -> Self {
        Self {
            rise: 60.0,
            dwell: 10.0,
            fall: 60.0,
            remain: 230.0,
        }
    }
}

impl MotionLaw {
    pub fn validate(&self) -> Result<(), Error> {
        let reason = if !(self.rise > 0.0 && self.fall > 0.0) {
            Some("rise and fall must be positive")
        } else if !(self.dwell >= 0.0 && self.remain >= 0.0) {
            Some("dwells must be non-negative")
        } else if (self.rise + self.dwell + self.fall + self.remain - 360.0).abs() > 1e-9 {
            Some("segments must cover exactly 360 degrees")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidMotionLaw {
                rise: self.rise,
                dwell: self.dwell,
                fall: self.fall,
                remain: self.remain,
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Cam angle (deg) at which the follower is back on the base circle.
    pub fn open_span(&self) -> f64 {
        self.rise + self.dwell + self.fall
    }

    /// Follower lift (mm) at cam angle `theta` (deg) for a total lift `h`.
    pub fn displacement(&self, h: f64, theta: f64) -> f64 {
        let deg = theta.rem_euclid(360.0);
        if deg <= self.rise {
            h * cycloid(deg / self.rise)
        } else if deg <= self.rise + self.dwell {
            h
        } else if deg <= self.open_span() {
            h * (1.0 - cycloid((deg - self.rise - self.dwell) / self.fall))
        } else {
            0.0
        }
    }

    /// Follower lift rate `ds/dθ` (mm/deg).
    pub fn velocity(&self, h: f64, theta: f64) -> f64 {
        let deg = theta.rem_euclid(360.0);
        if deg <= self.rise {
            h / self.rise * cycloid_rate(deg / self.rise)
        } else if deg <= self.rise + self.dwell {
            0.0
        } else if deg <= self.open_span() {
            -h / self.fall * cycloid_rate((deg - self.rise - self.dwell) / self.fall)
        } else {
            0.0
        }
    }
}

/// Normalized cycloidal motion, 0 to 1 over `x` in `[0, 1]`.
fn cycloid(x: f64) -> f64 {
    x - (TAU * x).sin() / TAU
}

fn cycloid_rate(x: f64) -> f64 {
    1.0 - (TAU * x).cos()
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    #[test]
    fn test_key_points() {
        let law = MotionLaw::default();
        law.validate().unwrap();
        assert_eq!(law.displacement(10.0, 0.0), 0.0);
        assert_relative_eq!(law.displacement(10.0, 30.0), 5.0);
        assert_relative_eq!(law.displacement(10.0, 60.0), 10.0);
        assert_eq!(law.displacement(10.0, 65.0), 10.0);
        assert_relative_eq!(law.displacement(10.0, 100.0), 5.0);
        assert_abs_diff_eq!(law.displacement(10.0, 130.0), 0.0, epsilon = 1e-12);
        assert_eq!(law.displacement(10.0, 200.0), 0.0);
        assert_eq!(law.displacement(10.0, 390.0), law.displacement(10.0, 30.0));

        // peak lift rate at mid-rise: 2h/rise
        assert_relative_eq!(law.velocity(10.0, 30.0), 2.0 * 10.0 / 60.0);
        assert_relative_eq!(law.velocity(10.0, 100.0), -2.0 * 10.0 / 60.0);
    }

    #[test]
    fn test_continuity() {
        let law = MotionLaw::default();
        let h = 8.0;
        for boundary in [0.0, 60.0, 70.0, 130.0, 360.0] {
            let (before, after) = (boundary - 1e-7, boundary + 1e-7);
            assert_abs_diff_eq!(
                law.displacement(h, before),
                law.displacement(h, after),
                epsilon = 1e-9
            );
            assert_abs_diff_eq!(law.velocity(h, before), law.velocity(h, after), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_velocity_is_derivative() {
        let law = MotionLaw::default();
        let step = 1e-5;
        for theta in [10.0, 45.0, 66.0, 85.0, 120.0, 250.0] {
            let fd = (law.displacement(9.0, theta + step) - law.displacement(9.0, theta - step))
                / (2.0 * step);
            assert_abs_diff_eq!(law.velocity(9.0, theta), fd, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_invalid() {
        let bad = MotionLaw {
            remain: 200.0,
            ..MotionLaw::default()
        };
        assert!(matches!(bad.validate(), Err(Error::InvalidMotionLaw { .. })));

        let bad = MotionLaw {
            rise: 0.0,
            remain: 290.0,
            ..MotionLaw::default()
        };
        assert!(bad.validate().is_err());
    }
}
