//! Valve timing of the four-stroke cycle. Crank angles run over `0..720`; the cams turn at half
//! crank speed so their installation angles run over `0..360`.

use std::ops::Range;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{Error, MotionLaw};

/// Valve lead ahead of the ideal stroke boundaries, in crank degrees.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValveTimingSpec {
    pub intake_advance_deg: f64,
    pub exhaust_advance_deg: f64,
}

impl Default for ValveTimingSpec {
    fn default() -> Self {
        Self {
            intake_advance_deg: 10.0,
            exhaust_advance_deg: 32.0,
        }
    }
}

/// Crank-angle extent of each stroke. The offset shifts bottom dead centre by the stroke-speed
/// angle `theta`.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct StrokePhases {
    pub intake: Range<f64>,
    pub compression: Range<f64>,
    pub expansion: Range<f64>,
    pub exhaust: Range<f64>,
}

impl StrokePhases {
    pub fn new(theta: f64) -> Self {
        Self {
            intake: 0.0..180.0 + theta,
            compression: 180.0 + theta..360.0,
            expansion: 360.0..540.0 + theta,
            exhaust: 540.0 + theta..720.0,
        }
    }
}

/// Cam angles (deg) at which a valve opens and closes.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValveEvent {
    pub opens: f64,
    pub closes: f64,
}

#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ValveTiming {
    pub phases: StrokePhases,
    /// open interval of the exhaust cam before the cam zero (deg)
    pub x0_star: f64,
    /// open interval of the exhaust cam after the cam zero (deg)
    pub y0_star: f64,
    pub exhaust: ValveEvent,
    pub intake: ValveEvent,
}

/// Stroke phases and cam installation angles for a mechanism with stroke-speed angle `theta`
/// (deg).
pub fn valve_timing(
    theta: f64,
    spec: &ValveTimingSpec,
    law: &MotionLaw,
) -> Result<ValveTiming, Error> {
    law.validate()?;
    if !(0.0..180.0).contains(&theta) {
        return Err(Error::InvalidInput {
            msg: format!("stroke-speed angle {theta} must lie in [0, 180)"),
        });
    }
    let ValveTimingSpec {
        intake_advance_deg,
        exhaust_advance_deg,
    } = *spec;
    if !(intake_advance_deg >= 0.0 && exhaust_advance_deg >= 0.0) {
        return Err(Error::InvalidInput {
            msg: format!(
                "valve advances must be non-negative: intake {intake_advance_deg}, exhaust {exhaust_advance_deg}"
            ),
        });
    }

    let phases = StrokePhases::new(theta);
    let span = law.open_span();

    let x0_star = (720.0 - phases.exhaust.start + exhaust_advance_deg) / 2.0;
    let y0_star = span - x0_star;
    if y0_star < 0.0 {
        return Err(Error::InvalidInput {
            msg: format!("exhaust lead {x0_star} deg exceeds the cam open span {span} deg"),
        });
    }

    let half_intake = intake_advance_deg / 2.0;
    Ok(ValveTiming {
        phases,
        x0_star,
        y0_star,
        exhaust: ValveEvent {
            opens: 360.0 - x0_star,
            closes: y0_star,
        },
        intake: ValveEvent {
            opens: 360.0 - half_intake,
            closes: span - half_intake,
        },
    })
}
