use std::collections::{hash_map::Entry, HashMap};

use cam::{CamProfile, CamProfileOptions, CamSpec, MotionLaw};
use dynamics::{Balance, ForceSolver, ForceState};
use linkage::{synthesize_geometry, GeometrySolution, KinematicState, Linkage};
use log::{debug, warn};

use crate::{
    positions::{dynamic_positions, kinematic_positions},
    AtPosition, CycleReport, Error, SchemeParameters, SchemeReport,
};

/// Sampling resolution of the report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalyzerOptions {
    /// crank step of the piston motion curves (deg)
    pub curve_step: f64,
    /// crank step of the torque cycle (deg)
    pub cycle_step: f64,
    /// distinct samples per cam profile
    pub cam_steps: usize,
    pub motion_law: MotionLaw,
    pub cam_profile: CamProfileOptions,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            curve_step: 1.0,
            cycle_step: 1.0,
            cam_steps: 360,
            motion_law: MotionLaw::default(),
            cam_profile: CamProfileOptions::default(),
        }
    }
}

type GeometryKey = [u64; 3];
type CamKey = [u64; 7];
type SchemeKey = [u64; 19];

fn geometry_key(k: f64, h: f64, e: f64) -> GeometryKey {
    [k.to_bits(), h.to_bits(), e.to_bits()]
}

fn cam_key(spec: &CamSpec, law: &MotionLaw) -> CamKey {
    [
        spec.h, spec.r0, spec.e, law.rise, law.dwell, law.fall, law.remain,
    ]
    .map(f64::to_bits)
}

fn scheme_key(p: &SchemeParameters) -> SchemeKey {
    let [c1, c2] = p.cams();
    [
        p.h,
        p.d,
        p.e,
        p.k,
        p.lac_ratio,
        p.q1,
        p.q2,
        p.q3,
        p.rho_ratio,
        p.n1,
        p.delta_limit_inv,
        c1.h,
        c1.r0,
        c1.e,
        c2.h,
        c2.r0,
        c2.e,
        p.valve_timing.intake_advance_deg,
        p.valve_timing.exhaust_advance_deg,
    ]
    .map(f64::to_bits)
}

/// Memoized solutions shared between reports.
#[derive(Debug, Default)]
struct Caches {
    geometry: HashMap<GeometryKey, GeometrySolution>,
    cams: HashMap<CamKey, CamProfile>,
}

/// Builds and memoizes [`SchemeReport`]s.
///
/// Geometry solutions are cached by `(K, H, e)`, cam profiles by the cam and its motion law, and
/// whole reports by the full parameter set. Only successful stage results are cached below the
/// report level.
#[derive(Debug, Default)]
pub struct Analyzer {
    options: AnalyzerOptions,
    caches: Caches,
    reports: HashMap<SchemeKey, SchemeReport>,
}

impl Analyzer {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self {
            options,
            caches: Caches::default(),
            reports: HashMap::new(),
        }
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    /// Report for a scheme, computed on first request.
    pub fn analyze(&mut self, params: &SchemeParameters) -> &SchemeReport {
        match self.reports.entry(scheme_key(params)) {
            Entry::Occupied(entry) => {
                debug!("report cache hit");
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(self.caches.report(&self.options, params)),
        }
    }

    /// Memoized geometry synthesis.
    pub fn geometry(&mut self, k: f64, h: f64, e: f64) -> Result<GeometrySolution, Error> {
        self.caches.geometry(k, h, e)
    }

    /// Memoized cam profile with the analyzer's motion law and roller.
    pub fn cam_profile(&mut self, spec: &CamSpec) -> Result<CamProfile, Error> {
        self.caches.cam_profile(&self.options, spec)
    }

    pub fn cached_geometries(&self) -> usize {
        self.caches.geometry.len()
    }

    pub fn cached_cams(&self) -> usize {
        self.caches.cams.len()
    }

    pub fn cached_reports(&self) -> usize {
        self.reports.len()
    }
}

impl Caches {
    fn geometry(&mut self, k: f64, h: f64, e: f64) -> Result<GeometrySolution, Error> {
        match self.geometry.entry(geometry_key(k, h, e)) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => Ok(*entry.insert(synthesize_geometry(k, h, e)?)),
        }
    }

    fn cam_profile(
        &mut self,
        options: &AnalyzerOptions,
        spec: &CamSpec,
    ) -> Result<CamProfile, Error> {
        let law = &options.motion_law;
        match self.cams.entry(cam_key(spec, law)) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let profile =
                    CamProfile::synthesize(spec, law, options.cam_steps, &options.cam_profile)?;
                Ok(entry.insert(profile).clone())
            }
        }
    }

    fn scheme_geometry(&mut self, params: &SchemeParameters) -> Result<GeometrySolution, Error> {
        params.validate_geometry()?;
        self.geometry(params.k, params.h, params.e)
    }

    fn linkage(&mut self, params: &SchemeParameters) -> Result<(GeometrySolution, Linkage), Error> {
        let geometry = self.scheme_geometry(params)?;
        params.validate_motion()?;
        let linkage = Linkage::new(&geometry, params.lac_ratio, params.n1)?;
        Ok((geometry, linkage))
    }

    fn force_solver(&mut self, params: &SchemeParameters) -> Result<(Linkage, ForceSolver), Error> {
        let (_, linkage) = self.linkage(params)?;
        params.validate_masses()?;
        let props = params.mass_properties(linkage.rod_length());
        Ok((linkage, ForceSolver::new(props)?))
    }

    fn report(&mut self, options: &AnalyzerOptions, params: &SchemeParameters) -> SchemeReport {
        debug!("analyzing scheme {params:?}");

        let report = SchemeReport {
            parameters: *params,
            geometry: self.scheme_geometry(params),
            kinematics: self.kinematics(params),
            curves: self
                .linkage(params)
                .and_then(|(_, linkage)| Ok(linkage.motion_curves(options.curve_step)?)),
            forces: self.forces(params),
            cycle: self.cycle(options, params),
            balance: self.balance(params),
            intake_cam: self.cam_profile(options, &params.intake_cam),
            exhaust_cam: self.cam_profile(options, &params.exhaust_cam),
            valve_timing: self.scheme_geometry(params).and_then(|geometry| {
                Ok(cam::valve_timing(
                    geometry.theta,
                    &params.valve_timing,
                    &options.motion_law,
                )?)
            }),
        };

        if let Some(err) = report.first_error() {
            warn!("scheme report incomplete: {err}");
        }
        report
    }

    fn kinematics(
        &mut self,
        params: &SchemeParameters,
    ) -> Result<Vec<AtPosition<KinematicState>>, Error> {
        let (geometry, linkage) = self.linkage(params)?;
        kinematic_positions(&geometry, &linkage)?
            .into_iter()
            .map(|position| {
                Ok(AtPosition {
                    position,
                    value: linkage.solve(position.angle)?,
                })
            })
            .collect()
    }

    fn forces(&mut self, params: &SchemeParameters) -> Result<Vec<AtPosition<ForceState>>, Error> {
        let (linkage, solver) = self.force_solver(params)?;
        dynamic_positions()
            .into_iter()
            .map(|position| {
                let state = linkage.solve(position.angle)?;
                Ok(AtPosition {
                    position,
                    value: solver.solve(&state)?,
                })
            })
            .collect()
    }

    fn cycle(
        &mut self,
        options: &AnalyzerOptions,
        params: &SchemeParameters,
    ) -> Result<CycleReport, Error> {
        let (linkage, solver) = self.force_solver(params)?;
        params.validate_flywheel()?;
        let torque = dynamics::sample_cycle(&linkage, &solver, options.cycle_step)?;
        let summary = dynamics::summarize_cycle(&torque, &params.flywheel())?;
        Ok(CycleReport { torque, summary })
    }

    fn balance(&mut self, params: &SchemeParameters) -> Result<Balance, Error> {
        let (_, linkage) = self.linkage(params)?;
        params.validate_masses()?;
        let props = params.mass_properties(linkage.rod_length());
        Ok(dynamics::balance(
            &props,
            params.lac_ratio,
            linkage.crank_length(),
        )?)
    }
}
