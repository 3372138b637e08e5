use std::{fmt, str::FromStr};

use cam::{CamSpec, ValveTimingSpec};
use dynamics::{FlywheelSpec, MassProperties};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::Error;

/// Input data of one engine scheme. Lengths in mm, weights in N, speed in rpm.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchemeParameters {
    /// stroke
    pub h: f64,
    /// bore
    pub d: f64,
    /// offset of the stroke line
    pub e: f64,
    /// stroke-speed ratio
    pub k: f64,
    /// crank pin to rod centroid, as a fraction of the rod length
    pub lac_ratio: f64,
    /// crank weight
    pub q1: f64,
    /// rod weight
    pub q2: f64,
    /// piston assembly weight
    pub q3: f64,
    /// rod radius of gyration, as a fraction of the rod length
    pub rho_ratio: f64,
    pub n1: f64,
    /// reciprocal of the allowable speed fluctuation
    pub delta_limit_inv: f64,
    /// cam of the intake valve
    pub intake_cam: CamSpec,
    /// cam of the exhaust valve
    pub exhaust_cam: CamSpec,
    pub valve_timing: ValveTimingSpec,
}

fn check(ok: bool, name: &'static str, value: f64, reason: &'static str) -> Result<(), Error> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name,
            value,
            reason,
        })
    }
}

impl SchemeParameters {
    /// Check every parameter.
    pub fn validate(&self) -> Result<(), Error> {
        self.validate_geometry()?;
        self.validate_motion()?;
        self.validate_masses()?;
        self.validate_flywheel()?;
        self.intake_cam.validate()?;
        self.exhaust_cam.validate()?;
        Ok(())
    }

    /// Stroke, offset and stroke-speed ratio.
    pub fn validate_geometry(&self) -> Result<(), Error> {
        check(self.h > 0.0, "H", self.h, "stroke must be positive")?;
        check(self.e >= 0.0, "e", self.e, "offset must be non-negative")?;
        check(self.k > 1.0, "K", self.k, "stroke-speed ratio must exceed 1")
    }

    pub fn validate_motion(&self) -> Result<(), Error> {
        check(
            self.lac_ratio > 0.0 && self.lac_ratio < 1.0,
            "lac_ratio",
            self.lac_ratio,
            "rod centroid ratio must lie in (0, 1)",
        )?;
        check(self.n1 > 0.0, "n1", self.n1, "crank speed must be positive")
    }

    pub fn validate_masses(&self) -> Result<(), Error> {
        check(self.d > 0.0, "D", self.d, "bore must be positive")?;
        check(self.q1 >= 0.0, "Q1", self.q1, "weight must be non-negative")?;
        check(self.q2 >= 0.0, "Q2", self.q2, "weight must be non-negative")?;
        check(self.q3 >= 0.0, "Q3", self.q3, "weight must be non-negative")?;
        check(
            self.rho_ratio > 0.0,
            "rho_ratio",
            self.rho_ratio,
            "radius of gyration must be positive",
        )
    }

    pub fn validate_flywheel(&self) -> Result<(), Error> {
        check(
            self.delta_limit_inv > 0.0,
            "delta_limit_inv",
            self.delta_limit_inv,
            "speed fluctuation limit must be positive",
        )
    }

    /// Mass data for the force solver, for a rod of length `l` (m).
    pub fn mass_properties(&self, l: f64) -> MassProperties {
        MassProperties {
            q1: self.q1,
            q2: self.q2,
            q3: self.q3,
            d: self.d,
            rho_ratio: self.rho_ratio,
            l,
        }
    }

    /// Both valve cams, intake first.
    pub fn cams(&self) -> [CamSpec; 2] {
        [self.intake_cam, self.exhaust_cam]
    }

    pub fn flywheel(&self) -> FlywheelSpec {
        FlywheelSpec {
            n1: self.n1,
            delta_limit_inv: self.delta_limit_inv,
        }
    }
}

/// The eight tabulated design schemes.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Preset {
    I,
    II,
    III,
    IV,
    V,
    VI,
    VII,
    VIII,
}

const fn cam(h: f64, e: f64, r0: f64) -> CamSpec {
    CamSpec { h, r0, e }
}

impl Preset {
    pub const ALL: [Preset; 8] = [
        Preset::I,
        Preset::II,
        Preset::III,
        Preset::IV,
        Preset::V,
        Preset::VI,
        Preset::VII,
        Preset::VIII,
    ];

    pub fn parameters(self) -> SchemeParameters {
        #[rustfmt::skip]
        let (h, d, e, k, lac_ratio, q1, q2, q3, rho_ratio, n1, delta_limit_inv, [intake_cam, exhaust_cam]) = match self {
            Preset::I    => (225.0, 170.0, 50.0, 1.04,  0.35, 160.0, 120.0, 190.0, 0.16,  620.0, 100.0, [cam(8.0, 5.0, 55.0), cam(10.0, 0.0, 60.0)]),
            Preset::II   => (270.0, 220.0, 60.0, 1.05,  0.36, 170.0, 135.0, 210.0, 0.165, 610.0, 100.0, [cam(10.0, 0.0, 60.0), cam(8.0, 5.0, 55.0)]),
            Preset::III  => (320.0, 230.0, 70.0, 1.06,  0.38, 190.0, 140.0, 230.0, 0.17,  590.0, 80.0,  [cam(9.0, 3.0, 55.0), cam(9.0, 6.0, 55.0)]),
            Preset::IV   => (185.0, 150.0, 55.0, 1.07,  0.40, 120.0, 110.0, 180.0, 0.18,  630.0, 100.0, [cam(6.0, 0.0, 60.0), cam(7.0, 0.0, 60.0)]),
            Preset::V    => (220.0, 160.0, 68.0, 1.08,  0.35, 135.0, 125.0, 200.0, 0.15,  640.0, 90.0,  [cam(7.0, 0.0, 55.0), cam(6.0, 0.0, 60.0)]),
            Preset::VI   => (200.0, 180.0, 40.0, 1.035, 0.38, 140.0, 115.0, 190.0, 0.17,  650.0, 100.0, [cam(8.0, 4.0, 60.0), cam(8.0, 5.0, 60.0)]),
            Preset::VII  => (215.0, 170.0, 45.0, 1.04,  0.35, 150.0, 120.0, 200.0, 0.16,  600.0, 90.0,  [cam(10.0, 0.0, 55.0), cam(10.0, 7.0, 60.0)]),
            Preset::VIII => (210.0, 160.0, 65.0, 1.08,  0.35, 140.0, 120.0, 190.0, 0.15,  580.0, 100.0, [cam(6.0, 0.0, 55.0), cam(10.0, 3.0, 55.0)]),
        };

        SchemeParameters {
            h,
            d,
            e,
            k,
            lac_ratio,
            q1,
            q2,
            q3,
            rho_ratio,
            n1,
            delta_limit_inv,
            intake_cam,
            exhaust_cam,
            valve_timing: ValveTimingSpec::default(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|preset| preset.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownPreset(s.to_string()))
    }
}
