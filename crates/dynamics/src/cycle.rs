//! Integration of the driving torque over one four-stroke cycle: mean resistive torque, energy
//! fluctuation, lobe areas of the torque diagram and the flywheel moment of inertia.

use std::f64::consts::PI;

use itertools::{Itertools, MinMaxResult};
use log::debug;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use linkage::Linkage;

use crate::{gas::CYCLE_DEG, Error, ForceSolver};

/// Lobes whose drawn area is below this (mm²) are dropped from the end of a lobe table.
const MIN_TRAILING_AREA: f64 = 0.01;

/// Angular drawing scale of the torque diagram (deg/mm).
const MU_PHI_DEG: f64 = 3.0;

/// Height (mm) of the torque diagram between its extreme values.
const CHART_HEIGHT_MM: f64 = 160.0;

/// Conversion from N·m at rpm to kW.
const KW_PER_NM_RPM: f64 = 1.0 / 9550.0;

/// kW per metric horsepower.
const KW_PER_HP: f64 = 0.735;

/// Driving torque at one crank angle.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TorqueSample {
    /// crank angle from top dead centre (deg)
    pub angle: f64,
    /// N·m
    pub md: f64,
}

#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlywheelSpec {
    /// crank speed (rpm)
    pub n1: f64,
    /// reciprocal of the allowable coefficient of speed fluctuation
    pub delta_limit_inv: f64,
}

/// Scales of the hand-drawn torque diagram used to express lobe areas in mm².
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawingScales {
    /// deg/mm
    pub mu_phi_deg: f64,
    /// rad/mm
    pub mu_phi: f64,
    /// N·m/mm
    pub mu_m: f64,
    /// length of the angle axis for the whole cycle (mm)
    pub chart_length_mm: f64,
}

impl DrawingScales {
    fn from_torque_range(max: f64, min: f64) -> Self {
        Self {
            mu_phi_deg: MU_PHI_DEG,
            mu_phi: MU_PHI_DEG.to_radians(),
            mu_m: (max + min.abs()) / CHART_HEIGHT_MM,
            chart_length_mm: CYCLE_DEG / MU_PHI_DEG,
        }
    }

    /// Drawn area (mm²) of a physical work (N·m).
    pub fn area_mm2(&self, work: f64) -> f64 {
        work / (self.mu_m * self.mu_phi)
    }
}

/// A signed area of the torque diagram between consecutive baseline crossings.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lobe {
    /// deg
    pub start: f64,
    /// deg
    pub end: f64,
    /// N·m
    pub work: f64,
    pub area_mm2: f64,
}

#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct CycleSummary {
    /// mean resistive torque (N·m)
    pub mr: f64,
    pub max_md: f64,
    pub min_md: f64,
    pub scales: DrawingScales,
    /// lobes of `Md` about zero
    pub torque_lobes: Vec<Lobe>,
    /// lobes of `Md - Mr`
    pub energy_lobes: Vec<Lobe>,
    /// mean torque as a height on the drawn diagram (mm)
    pub mean_torque_height_mm: f64,
    /// largest swing of the kinetic energy over the cycle (J)
    pub delta_w_max: f64,
    /// crank angle of the cumulative energy maximum (deg)
    pub max_energy_angle: f64,
    /// crank angle of the cumulative energy minimum (deg)
    pub min_energy_angle: f64,
    /// cumulative `(Md - Mr)` work at the end of the cycle; zero up to rounding
    pub net_energy: f64,
    /// mean crank angular velocity (rad/s)
    pub omega_m: f64,
    /// allowable coefficient of speed fluctuation
    pub delta: f64,
    /// required flywheel moment of inertia (kg·m²)
    pub je: f64,
    /// engine power (hp)
    pub power_hp: f64,
}

/// Driving torque sampled uniformly on `0..720` degrees.
///
/// # Arguments
///
/// * `step` - angular step (deg); `720 / step` is rounded to the nearest whole count
pub fn sample_cycle(
    linkage: &Linkage,
    solver: &ForceSolver,
    step: f64,
) -> Result<Vec<TorqueSample>, Error> {
    if !(step > 0.0 && step <= CYCLE_DEG) {
        return Err(Error::InvalidInput {
            msg: format!("cycle step {step} must lie in (0, 720]"),
        });
    }
    let count = (CYCLE_DEG / step).round().max(2.0) as usize;
    let step = CYCLE_DEG / count as f64;

    (0..count)
        .map(|i| {
            let angle = step * i as f64;
            let state = linkage.solve(angle)?;
            let forces = solver.solve(&state)?;
            Ok(TorqueSample {
                angle,
                md: forces.md,
            })
        })
        .collect()
}

/// Summarize a full cycle of driving torque samples and size the flywheel.
///
/// The samples are one period of the driving torque, ordered by increasing angle. A closing
/// sample 720° after the first one is accepted and treated as the first sample.
///
/// # Errors
///
/// * `Error::InvalidInput` if there are fewer than two samples, angles are not increasing or
///     span more than one cycle, or a torque is not finite.
/// * `Error::InvalidFlywheelConfig` if the speed data is not positive or the torque is constant.
pub fn summarize_cycle(
    samples: &[TorqueSample],
    spec: &FlywheelSpec,
) -> Result<CycleSummary, Error> {
    let samples = distinct_period(samples)?;

    if !(spec.delta_limit_inv > 0.0 && spec.delta_limit_inv.is_finite()) {
        return Err(Error::InvalidFlywheelConfig {
            msg: format!(
                "reciprocal speed fluctuation {} must be positive",
                spec.delta_limit_inv
            ),
        });
    }
    if !(spec.n1 > 0.0 && spec.n1.is_finite()) {
        return Err(Error::InvalidFlywheelConfig {
            msg: format!("crank speed n1 = {} must be positive", spec.n1),
        });
    }

    let (min_md, max_md) = match samples.iter().map(|s| s.md).minmax() {
        MinMaxResult::MinMax(min, max) => (min, max),
        MinMaxResult::OneElement(md) => (md, md),
        MinMaxResult::NoElements => (0.0, 0.0),
    };
    if max_md - min_md <= f64::EPSILON * max_md.abs().max(1.0) {
        return Err(Error::InvalidFlywheelConfig {
            msg: format!("driving torque is constant ({max_md} N·m), the cycle has no lobes"),
        });
    }

    let mr = samples.iter().map(|s| s.md).sum::<f64>() / samples.len() as f64;
    let scales = DrawingScales::from_torque_range(max_md, min_md);

    // cumulative kinetic-energy walk
    let mut energy = 0.0;
    let (mut max_e, mut max_angle) = (0.0, samples[0].angle);
    let (mut min_e, mut min_angle) = (0.0, samples[0].angle);
    for (a, b, db) in segments(samples) {
        energy += trapezoid(a.md - mr, b.md - mr, db);
        if energy > max_e {
            (max_e, max_angle) = (energy, b.angle);
        }
        if energy < min_e {
            (min_e, min_angle) = (energy, b.angle);
        }
    }
    let delta_w_max = max_e - min_e;
    if !(delta_w_max > 0.0) {
        return Err(Error::InvalidFlywheelConfig {
            msg: "no energy fluctuation over the cycle".to_string(),
        });
    }

    let torque_lobes = lobes(samples, 0.0, &scales);
    let energy_lobes = lobes(samples, mr, &scales);
    let mean_torque_height_mm =
        torque_lobes.iter().map(|lobe| lobe.area_mm2).sum::<f64>() / scales.chart_length_mm;

    let omega_m = 2.0 * PI * spec.n1 / 60.0;
    let delta = spec.delta_limit_inv.recip();
    let je = delta_w_max / (omega_m.powi(2) * delta);
    let power_hp = mr * spec.n1 * KW_PER_NM_RPM / KW_PER_HP;

    debug!(
        "cycle: Mr={mr:.4} dW_max={delta_w_max:.4} Je={je:.4} N={power_hp:.4}hp, {} torque lobes",
        torque_lobes.len()
    );

    Ok(CycleSummary {
        mr,
        max_md,
        min_md,
        scales,
        torque_lobes,
        energy_lobes,
        mean_torque_height_mm,
        delta_w_max,
        max_energy_angle: max_angle,
        min_energy_angle: min_angle,
        net_energy: energy,
        omega_m,
        delta,
        je,
        power_hp,
    })
}

/// Validate the samples and drop a closing duplicate of the first one.
fn distinct_period(samples: &[TorqueSample]) -> Result<&[TorqueSample], Error> {
    if samples.len() < 2 {
        return Err(Error::InvalidInput {
            msg: format!("a cycle needs at least two torque samples, got {}", samples.len()),
        });
    }
    if let Some(bad) = samples.iter().find(|s| !(s.md.is_finite() && s.angle.is_finite())) {
        return Err(Error::InvalidInput {
            msg: format!("non-finite torque sample at {} deg", bad.angle),
        });
    }
    if samples.iter().tuple_windows().any(|(a, b)| b.angle <= a.angle) {
        return Err(Error::InvalidInput {
            msg: "torque sample angles must be strictly increasing".to_string(),
        });
    }

    let first = samples[0].angle;
    let last = samples[samples.len() - 1].angle;
    let samples = if (last - first - CYCLE_DEG).abs() < 1e-9 {
        &samples[..samples.len() - 1]
    } else {
        samples
    };
    if samples.len() < 2 || samples[samples.len() - 1].angle - first >= CYCLE_DEG {
        return Err(Error::InvalidInput {
            msg: format!("torque samples span more than one {CYCLE_DEG} deg cycle"),
        });
    }
    Ok(samples)
}

/// Consecutive sample pairs around the periodic cycle, with the step between them (rad).
fn segments(
    samples: &[TorqueSample],
) -> impl Iterator<Item = (&TorqueSample, &TorqueSample, f64)> + '_ {
    samples.iter().circular_tuple_windows().map(|(a, b)| {
        let mut step = b.angle - a.angle;
        if step <= 0.0 {
            step += CYCLE_DEG;
        }
        (a, b, step.to_radians())
    })
}

fn trapezoid(v1: f64, v2: f64, step: f64) -> f64 {
    (v1 + v2) / 2.0 * step
}

/// Split the diagram into lobes about `baseline`. A lobe closes on the segment where the sign of
/// `Md - baseline` changes, that segment included.
fn lobes(samples: &[TorqueSample], baseline: f64, scales: &DrawingScales) -> Vec<Lobe> {
    let mut lobes = Vec::new();
    let mut work = 0.0;
    let mut start = samples[0].angle;
    let mut end = start;

    for (a, b, step) in segments(samples) {
        let v1 = a.md - baseline;
        let v2 = b.md - baseline;
        work += trapezoid(v1, v2, step);
        end = a.angle + step.to_degrees();

        let crossing = (v1 >= 0.0 && v2 < 0.0) || (v1 < 0.0 && v2 >= 0.0);
        if crossing {
            lobes.push(Lobe {
                start,
                end,
                work,
                area_mm2: scales.area_mm2(work),
            });
            work = 0.0;
            start = end;
        }
    }

    if scales.area_mm2(work).abs() > MIN_TRAILING_AREA {
        lobes.push(Lobe {
            start,
            end,
            work,
            area_mm2: scales.area_mm2(work),
        });
    }
    lobes
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;

    /// Two sine periods per cycle, phase shifted so no zero falls on a sample.
    fn sine_cycle(mean: f64, amplitude: f64, count: usize) -> Vec<TorqueSample> {
        (0..count)
            .map(|i| {
                let angle = CYCLE_DEG * i as f64 / count as f64;
                TorqueSample {
                    angle,
                    md: mean + amplitude * (angle + 0.5).to_radians().sin(),
                }
            })
            .collect()
    }

    const SPEC: FlywheelSpec = FlywheelSpec {
        n1: 600.0,
        delta_limit_inv: 90.0,
    };

    #[test]
    fn test_sine_torque() {
        // two periods of a sine over 720 deg: energy swings by 2 * amplitude
        let summary = summarize_cycle(&sine_cycle(100.0, 50.0, 720), &SPEC).unwrap();

        assert_relative_eq!(summary.mr, 100.0, max_relative = 1e-12);
        assert_relative_eq!(summary.delta_w_max, 100.0, max_relative = 1e-3);
        assert_abs_diff_eq!(summary.net_energy, 0.0, epsilon = 1e-9);
        let peak = summary.max_energy_angle;
        assert!((peak - 180.0).abs() <= 1.0 || (peak - 540.0).abs() <= 1.0);

        let omega = 2.0 * PI * 600.0 / 60.0;
        assert_relative_eq!(
            summary.je,
            summary.delta_w_max * 90.0 / omega.powi(2),
            max_relative = 1e-12
        );
        assert_relative_eq!(
            summary.power_hp,
            100.0 * 600.0 / (9550.0 * 0.735),
            max_relative = 1e-12
        );

        // Md stays positive so the raw diagram is a single lobe
        assert_eq!(summary.torque_lobes.len(), 1);
        // about the mean the diagram alternates sign: four half waves
        assert_eq!(summary.energy_lobes.len(), 4);
        let signs: Vec<bool> = summary.energy_lobes.iter().map(|l| l.work > 0.0).collect();
        assert_eq!(signs, vec![true, false, true, false]);
        let total: f64 = summary.energy_lobes.iter().map(|l| l.work).sum();
        assert_abs_diff_eq!(total, 0.0, epsilon = 1e-9);
    }

    #[test_log::test]
    fn test_scheme_vii() {
        use crate::{ForceSolver, MassProperties};
        use linkage::synthesize_geometry;

        let geo = synthesize_geometry(1.04, 215.0, 45.0).unwrap();
        let linkage = Linkage::new(&geo, 0.35, 600.0).unwrap();
        let solver = ForceSolver::new(MassProperties {
            q1: 150.0,
            q2: 120.0,
            q3: 200.0,
            d: 170.0,
            rho_ratio: 0.16,
            l: linkage.rod_length(),
        })
        .unwrap();

        let samples = sample_cycle(&linkage, &solver, 1.0).unwrap();
        assert_eq!(samples.len(), 720);
        let summary = summarize_cycle(&samples, &SPEC).unwrap();

        assert_relative_eq!(summary.mr, 295.038, max_relative = 1e-5);
        assert_relative_eq!(summary.delta_w_max, 4470.53, max_relative = 1e-5);
        assert_relative_eq!(summary.je, 101.92, max_relative = 1e-3);
        assert_relative_eq!(summary.power_hp, 25.22, max_relative = 1e-3);
        assert_abs_diff_eq!(summary.net_energy, 0.0, epsilon = 1e-8);

        assert_eq!(summary.torque_lobes.len(), 6);
        assert_eq!(summary.energy_lobes.len(), 7);
        let total: f64 = summary.energy_lobes.iter().map(|l| l.work).sum();
        assert_abs_diff_eq!(total, 0.0, epsilon = 1e-8);
        let raw: f64 = summary.torque_lobes.iter().map(|l| l.work).sum();
        assert_relative_eq!(raw, summary.mr * 4.0 * PI, max_relative = 1e-9);
    }

    #[test]
    fn test_scales() {
        let summary = summarize_cycle(&sine_cycle(100.0, 50.0, 360), &SPEC).unwrap();
        assert_relative_eq!(summary.scales.mu_m, (150.0 + 50.0) / 160.0, max_relative = 1e-4);
        assert_eq!(summary.scales.chart_length_mm, 240.0);
        // the raw lobe area over the chart length is the mean torque height
        assert_relative_eq!(
            summary.mean_torque_height_mm,
            summary.mr / summary.scales.mu_m,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_closing_sample() {
        let mut samples = sine_cycle(10.0, 5.0, 360);
        let open = summarize_cycle(&samples, &SPEC).unwrap();
        samples.push(TorqueSample {
            angle: 720.0,
            md: samples[0].md,
        });
        let closed = summarize_cycle(&samples, &SPEC).unwrap();
        assert_eq!(open, closed);
    }

    #[test]
    fn test_degenerate() {
        let flat: Vec<_> = (0..10)
            .map(|i| TorqueSample {
                angle: 72.0 * i as f64,
                md: 5.0,
            })
            .collect();
        assert!(matches!(
            summarize_cycle(&flat, &SPEC),
            Err(Error::InvalidFlywheelConfig { .. })
        ));

        let samples = sine_cycle(10.0, 5.0, 36);
        let bad = FlywheelSpec {
            n1: 600.0,
            delta_limit_inv: 0.0,
        };
        assert!(matches!(
            summarize_cycle(&samples, &bad),
            Err(Error::InvalidFlywheelConfig { .. })
        ));

        assert!(matches!(
            summarize_cycle(&samples[..1], &SPEC),
            Err(Error::InvalidInput { .. })
        ));

        let mut reversed = samples.clone();
        reversed.reverse();
        assert!(matches!(
            summarize_cycle(&reversed, &SPEC),
            Err(Error::InvalidInput { .. })
        ));
    }
}
