use itertools::Itertools;
use log::{debug, warn};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{Error, MotionLaw, Vec2};

/// Disc cam driving an offset roller follower. Lengths in mm.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CamSpec {
    /// follower lift
    pub h: f64,
    /// base circle radius
    pub r0: f64,
    /// follower offset from the cam centre
    pub e: f64,
}

impl CamSpec {
    pub fn validate(&self) -> Result<(), Error> {
        let Self { h, r0, e } = *self;
        if !(r0 > 0.0 && r0.is_finite()) {
            return Err(Error::InvalidCamSpec {
                msg: format!("base radius r0 = {r0} must be positive"),
            });
        }
        if !(h >= 0.0 && h.is_finite()) {
            return Err(Error::InvalidCamSpec {
                msg: format!("lift h = {h} must be non-negative"),
            });
        }
        if !(e >= 0.0 && e < r0) {
            return Err(Error::InvalidCamSpec {
                msg: format!("offset e = {e} must lie in [0, r0 = {r0})"),
            });
        }
        Ok(())
    }
}

#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CamProfileOptions {
    /// mm
    pub roller_radius: f64,
}

impl Default for CamProfileOptions {
    fn default() -> Self {
        Self {
            roller_radius: 10.0,
        }
    }
}

#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CamSample {
    /// cam angle (deg)
    pub angle: f64,
    /// follower lift (mm)
    pub s: f64,
    /// roller centre path (pitch curve)
    pub theoretical: Vec2,
    /// working surface of the cam
    pub actual: Vec2,
}

/// Sampled cam profile. The last sample closes the curve and repeats the first one at 360°.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct CamProfile {
    pub spec: CamSpec,
    pub law: MotionLaw,
    pub roller_radius: f64,
    pub samples: Vec<CamSample>,
}

/// Synthesize a cam profile with the default roller.
///
/// # Arguments
///
/// * `steps` - number of distinct samples on `[0, 360)`; at least 8
pub fn synthesize_profile(
    spec: &CamSpec,
    law: &MotionLaw,
    steps: usize,
) -> Result<CamProfile, Error> {
    CamProfile::synthesize(spec, law, steps, &CamProfileOptions::default())
}

impl CamProfile {
    pub fn synthesize(
        spec: &CamSpec,
        law: &MotionLaw,
        steps: usize,
        options: &CamProfileOptions,
    ) -> Result<Self, Error> {
        spec.validate()?;
        law.validate()?;
        if steps < 8 {
            return Err(Error::InvalidInput {
                msg: format!("a cam profile needs at least 8 samples, got {steps}"),
            });
        }
        let roller_radius = options.roller_radius;
        if !(roller_radius >= 0.0 && roller_radius.is_finite()) {
            return Err(Error::InvalidInput {
                msg: format!("roller radius {roller_radius} must be non-negative"),
            });
        }

        let CamSpec { h, r0, e } = *spec;
        let step = 360.0 / steps as f64;
        let pitch: Vec<(f64, f64, Vec2)> = (0..steps)
            .map(|i| {
                let angle = step * i as f64;
                let s = law.displacement(h, angle);
                let (sin, cos) = angle.to_radians().sin_cos();
                let point = Vec2::new((s + r0) * sin + e * cos, (s + r0) * cos - e * sin);
                (angle, s, point)
            })
            .collect();

        let mut samples = Vec::with_capacity(steps + 1);
        for (i, &(angle, s, theoretical)) in pitch.iter().enumerate() {
            let prev = pitch[(i + steps - 1) % steps].2;
            let next = pitch[(i + 1) % steps].2;
            let tangent = next - prev;
            let len = tangent.norm();
            if len <= f64::EPSILON {
                return Err(Error::InvalidCamSpec {
                    msg: format!("pitch curve has no tangent at {angle} deg"),
                });
            }
            let normal = Vec2::new(tangent.y, -tangent.x) / len;
            samples.push(CamSample {
                angle,
                s,
                theoretical,
                actual: theoretical + normal * roller_radius,
            });
        }
        samples.push(CamSample {
            angle: 360.0,
            ..samples[0]
        });

        let profile = Self {
            spec: *spec,
            law: *law,
            roller_radius,
            samples,
        };

        if let Some(rho) = profile.min_curvature_radius() {
            debug!("cam h={h} r0={r0} e={e}: min pitch curvature radius {rho:.3} mm");
            if rho <= roller_radius {
                warn!(
                    "cam h={h} r0={r0} e={e} is undercut: curvature radius {rho:.3} mm \
                     does not exceed roller radius {roller_radius} mm"
                );
            }
        }

        Ok(profile)
    }

    /// Distinct samples, without the closing repeat.
    fn distinct(&self) -> &[CamSample] {
        &self.samples[..self.samples.len() - 1]
    }

    /// Smallest radius of curvature (mm) over the convex parts of the pitch curve, estimated from
    /// the circle through each three consecutive samples.
    pub fn min_curvature_radius(&self) -> Option<f64> {
        self.distinct()
            .iter()
            .circular_tuple_windows()
            .filter_map(|(a, b, c)| {
                let (p0, p1, p2) = (a.theoretical, b.theoretical, c.theoretical);
                // points advance clockwise, so convex turns have a negative cross product
                let cross = (p1 - p0).perp(&(p2 - p1));
                (cross < 0.0).then(|| {
                    (p1 - p0).norm() * (p2 - p1).norm() * (p2 - p0).norm() / (2.0 * cross.abs())
                })
            })
            .min_by(f64::total_cmp)
    }

    /// Whether the roller is too large for the sharpest convex part of the pitch curve.
    pub fn is_undercut(&self) -> bool {
        self.min_curvature_radius()
            .map_or(false, |rho| rho <= self.roller_radius)
    }

    pub fn max_lift(&self) -> f64 {
        self.samples.iter().map(|s| s.s).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    #[test_log::test]
    fn test_profile() {
        let spec = CamSpec {
            h: 10.0,
            r0: 60.0,
            e: 7.0,
        };
        let profile = synthesize_profile(&spec, &MotionLaw::default(), 360).unwrap();
        assert_eq!(profile.samples.len(), 361);

        let first = profile.samples[0];
        let last = profile.samples[360];
        assert_eq!(last.angle, 360.0);
        assert_eq!(first.theoretical, last.theoretical);
        assert_eq!(first.actual, last.actual);
        assert_eq!(first.theoretical, Vec2::new(7.0, 60.0));

        for sample in &profile.samples {
            // pitch point distance from the cam centre
            let expected = ((sample.s + 60.0).powi(2) + 49.0).sqrt();
            assert_relative_eq!(sample.theoretical.norm(), expected, max_relative = 1e-12);
            assert_relative_eq!(
                (sample.actual - sample.theoretical).norm(),
                10.0,
                max_relative = 1e-12
            );
        }

        // the roller surface lies inside the pitch curve
        let base = profile.samples[200];
        assert!(base.actual.norm() < base.theoretical.norm());
        assert_relative_eq!(profile.max_lift(), 10.0);
        assert!(!profile.is_undercut());
    }

    #[test]
    fn test_curvature() {
        // on the base circle the pitch curve is a circle of radius sqrt(r0² + e²)
        let spec = CamSpec {
            h: 0.0,
            r0: 40.0,
            e: 0.0,
        };
        let profile = synthesize_profile(&spec, &MotionLaw::default(), 720).unwrap();
        assert_relative_eq!(
            profile.min_curvature_radius().unwrap(),
            40.0,
            max_relative = 1e-9
        );

        let small = CamSpec {
            h: 6.0,
            r0: 8.0,
            e: 0.0,
        };
        let profile = synthesize_profile(&small, &MotionLaw::default(), 360).unwrap();
        assert!(profile.min_curvature_radius().unwrap() <= 8.0 + 1e-9);
        assert!(profile.is_undercut());
    }

    #[test]
    fn test_roller_option() {
        let spec = CamSpec {
            h: 8.0,
            r0: 55.0,
            e: 5.0,
        };
        let options = CamProfileOptions { roller_radius: 0.0 };
        let profile =
            CamProfile::synthesize(&spec, &MotionLaw::default(), 90, &options).unwrap();
        for sample in &profile.samples {
            assert_abs_diff_eq!(sample.actual, sample.theoretical);
        }
    }

    #[test]
    fn test_invalid() {
        let law = MotionLaw::default();
        let spec = |h, r0, e| CamSpec { h, r0, e };
        assert!(matches!(
            synthesize_profile(&spec(10.0, 0.0, 0.0), &law, 360),
            Err(Error::InvalidCamSpec { .. })
        ));
        assert!(synthesize_profile(&spec(-1.0, 50.0, 0.0), &law, 360).is_err());
        assert!(synthesize_profile(&spec(10.0, 50.0, 50.0), &law, 360).is_err());
        assert!(matches!(
            synthesize_profile(&spec(10.0, 50.0, 5.0), &law, 4),
            Err(Error::InvalidInput { .. })
        ));
    }
}
