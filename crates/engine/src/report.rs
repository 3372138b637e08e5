use cam::{CamProfile, ValveTiming};
use dynamics::{Balance, CycleSummary, ForceState, TorqueSample};
use linkage::{GeometrySolution, KinematicState, MotionCurves};

#[cfg(feature = "serde-serialize")]
use serde::Serialize;

use crate::{AnalysisPosition, Error, SchemeParameters};

/// A result tabulated at a named crank position.
#[cfg_attr(feature = "serde-serialize", derive(Serialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtPosition<T> {
    pub position: AnalysisPosition,
    pub value: T,
}

#[cfg_attr(feature = "serde-serialize", derive(Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct CycleReport {
    /// driving torque over `0..720` degrees
    pub torque: Vec<TorqueSample>,
    pub summary: CycleSummary,
}

/// Every stage of the report for one scheme. Each stage carries its own result, so one failing
/// stage leaves the others intact.
#[derive(Debug)]
pub struct SchemeReport {
    pub parameters: SchemeParameters,
    pub geometry: Result<GeometrySolution, Error>,
    pub kinematics: Result<Vec<AtPosition<KinematicState>>, Error>,
    pub curves: Result<MotionCurves, Error>,
    pub forces: Result<Vec<AtPosition<ForceState>>, Error>,
    pub cycle: Result<CycleReport, Error>,
    pub balance: Result<Balance, Error>,
    pub intake_cam: Result<CamProfile, Error>,
    pub exhaust_cam: Result<CamProfile, Error>,
    pub valve_timing: Result<ValveTiming, Error>,
}

impl SchemeReport {
    /// Whether every stage succeeded.
    pub fn is_complete(&self) -> bool {
        self.geometry.is_ok()
            && self.kinematics.is_ok()
            && self.curves.is_ok()
            && self.forces.is_ok()
            && self.cycle.is_ok()
            && self.balance.is_ok()
            && self.intake_cam.is_ok()
            && self.exhaust_cam.is_ok()
            && self.valve_timing.is_ok()
    }

    /// Both cam profiles labelled by the valve they drive, intake first.
    pub fn cams(&self) -> [(&'static str, &Result<CamProfile, Error>); 2] {
        [("intake", &self.intake_cam), ("exhaust", &self.exhaust_cam)]
    }

    /// The first stage error, if any.
    pub fn first_error(&self) -> Option<&Error> {
        [
            self.geometry.as_ref().err(),
            self.kinematics.as_ref().err(),
            self.curves.as_ref().err(),
            self.forces.as_ref().err(),
            self.cycle.as_ref().err(),
            self.balance.as_ref().err(),
            self.intake_cam.as_ref().err(),
            self.exhaust_cam.as_ref().err(),
            self.valve_timing.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .next()
    }
}
