#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{Error, Linkage};

/// Piston motion at one crank angle, measured along the stroke away from top dead centre.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveSample {
    /// crank angle from top dead centre (deg)
    pub angle: f64,
    /// m
    pub displacement: f64,
    /// m/s
    pub velocity: f64,
    /// m/s²
    pub acceleration: f64,
}

/// Displacement, velocity and acceleration of the piston over one crank revolution.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MotionCurves {
    pub samples: Vec<CurveSample>,
}

impl MotionCurves {
    pub fn max_velocity(&self) -> Option<&CurveSample> {
        self.samples
            .iter()
            .max_by(|a, b| a.velocity.abs().total_cmp(&b.velocity.abs()))
    }

    pub fn max_acceleration(&self) -> Option<&CurveSample> {
        self.samples
            .iter()
            .max_by(|a, b| a.acceleration.abs().total_cmp(&b.acceleration.abs()))
    }
}

impl Linkage {
    /// Sample the piston motion on `0..=360` degrees.
    ///
    /// # Arguments
    ///
    /// * `step` - angular step (deg); `360 / step` is rounded to the nearest whole count
    pub fn motion_curves(&self, step: f64) -> Result<MotionCurves, Error> {
        if !(step > 0.0 && step <= 360.0) {
            return Err(Error::InvalidInput {
                msg: format!("curve step {step} must lie in (0, 360]"),
            });
        }
        let count = (360.0 / step).round().max(1.0) as usize;
        let step = 360.0 / count as f64;

        let samples = (0..=count)
            .map(|i| {
                let angle = step * i as f64;
                let state = self.solve(angle)?;
                Ok(CurveSample {
                    angle,
                    displacement: state.displacement,
                    velocity: state.piston_velocity(),
                    acceleration: state.piston_acceleration(),
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(MotionCurves { samples })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::synthesize_geometry;

    #[test_log::test]
    fn test_curves() {
        let geo = synthesize_geometry(1.04, 215.0, 45.0).unwrap();
        let linkage = Linkage::new(&geo, 0.35, 600.0).unwrap();
        let curves = linkage.motion_curves(2.0).unwrap();

        assert_eq!(curves.samples.len(), 181);
        assert_eq!(curves.samples[0].angle, 0.0);
        assert_eq!(curves.samples[180].angle, 360.0);

        let first = curves.samples.first().unwrap();
        let last = curves.samples.last().unwrap();
        assert_abs_diff_eq!(first.displacement, last.displacement, epsilon = 1e-12);
        assert_abs_diff_eq!(first.velocity, last.velocity, epsilon = 1e-9);

        // displacement never exceeds the stroke
        for sample in &curves.samples {
            assert!(sample.displacement >= -1e-12);
            assert!(sample.displacement <= 0.215 + 1e-9);
        }

        // the piston moves away from TDC during the first half turn
        assert!(curves.samples[45].velocity > 0.0);
        assert!(curves.samples[135].velocity < 0.0);

        // acceleration peaks at top dead centre for a crank-to-rod ratio this small
        let peak = curves.max_acceleration().unwrap();
        assert!(peak.angle < 10.0 || peak.angle > 350.0);
        assert!(curves.max_velocity().unwrap().velocity.abs() > 0.0);
    }

    #[test]
    fn test_bad_step() {
        let geo = synthesize_geometry(1.04, 215.0, 45.0).unwrap();
        let linkage = Linkage::new(&geo, 0.35, 600.0).unwrap();
        assert!(linkage.motion_curves(0.0).is_err());
        assert!(linkage.motion_curves(-2.0).is_err());
    }
}
