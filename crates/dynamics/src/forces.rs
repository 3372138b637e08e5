//! Dynamic-static force analysis at one crank position.
//!
//! Inertia loads are applied as external forces and the linkage is closed with static
//! equilibrium: moments on the rod about the piston pin give the tangential crank-pin reaction,
//! the force balance along the stroke gives its normal part, and the guide reaction closes the
//! balance across the stroke.

use log::trace;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use linkage::{KinematicState, Vec2, SINGULAR_EPS};

use crate::{gas, Error, GRAVITY};

/// Mass and load data of the moving links.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassProperties {
    /// crank weight (N), acting at the crank centre
    pub q1: f64,
    /// rod weight (N)
    pub q2: f64,
    /// piston assembly weight (N)
    pub q3: f64,
    /// piston bore (mm)
    pub d: f64,
    /// radius of gyration of the rod about its centroid, as a fraction of the rod length
    pub rho_ratio: f64,
    /// rod length (m)
    pub l: f64,
}

/// All loads and joint reactions at one crank position. Forces in N, moments in N·m.
///
/// Reactions are named `Rij`: the force exerted by link `i` on link `j`, with link 0 the frame,
/// 1 the crank, 2 the rod and 3 the piston.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceState {
    /// crank angle from top dead centre (deg)
    pub phi: f64,
    /// indicator-diagram height (mm)
    pub gas_height: f64,
    pub gas_force: Vec2,
    pub g2: Vec2,
    pub g3: Vec2,

    /// rod inertia force
    pub pi2: Vec2,
    /// rod inertia moment
    pub mi2: f64,
    /// piston inertia force
    pub pi3: Vec2,
    /// resultant of gas force, piston inertia force and piston weight
    pub p_total: Vec2,

    /// unit vector along the rod from the piston pin toward the crank pin
    pub u_ba: Vec2,
    /// part of `R12` along the rod
    pub r12n: Vec2,
    /// part of `R12` across the rod
    pub r12t: Vec2,
    pub r12: Vec2,
    pub r21: Vec2,
    /// guide reaction on the piston, across the stroke
    pub r03: Vec2,
    pub r23: Vec2,
    /// crank bearing reaction
    pub r01: Vec2,

    /// driving torque the rod applies to the crank, positive in the crank's sense of rotation
    pub md: f64,
}

impl ForceState {
    /// Vector sum of all forces on the rod and piston. Zero up to rounding.
    pub fn residual(&self) -> Vec2 {
        self.r12 + self.g2 + self.pi2 + self.p_total + self.r03
    }
}

/// Solves [`ForceState`] for a fixed set of [`MassProperties`].
#[derive(Clone, Copy, Debug)]
pub struct ForceSolver {
    props: MassProperties,
    m2: f64,
    m3: f64,
    /// rod centroidal moment of inertia (kg·m²)
    jc2: f64,
}

impl ForceSolver {
    pub fn new(props: MassProperties) -> Result<Self, Error> {
        let MassProperties {
            q1,
            q2,
            q3,
            d,
            rho_ratio,
            l,
        } = props;
        if [q1, q2, q3].iter().any(|q| !(q.is_finite() && *q >= 0.0)) {
            return Err(Error::InvalidInput {
                msg: format!("weights must be non-negative: Q1 = {q1}, Q2 = {q2}, Q3 = {q3}"),
            });
        }
        if !(d > 0.0 && rho_ratio > 0.0 && l > 0.0) {
            return Err(Error::InvalidInput {
                msg: format!("bore, radius of gyration and rod length must be positive: D = {d}, rho = {rho_ratio}, l = {l}"),
            });
        }

        let m2 = q2 / GRAVITY;
        let m3 = q3 / GRAVITY;
        let jc2 = m2 * (rho_ratio * l).powi(2);

        Ok(Self { props, m2, m3, jc2 })
    }

    pub fn properties(&self) -> &MassProperties {
        &self.props
    }

    /// Rod centroidal moment of inertia (kg·m²).
    pub fn jc2(&self) -> f64 {
        self.jc2
    }

    /// Solve the loads at a kinematic state, taking the gas pressure from the indicator diagram
    /// at the state's crank angle.
    pub fn solve(&self, state: &KinematicState) -> Result<ForceState, Error> {
        self.solve_with_height(state, gas::gas_height(state.phi))
    }

    /// Solve the loads at a kinematic state for an explicit indicator-diagram height (mm).
    ///
    /// # Errors
    ///
    /// * `Error::SingularOrientation` if the rod is perpendicular to the stroke axis.
    pub fn solve_with_height(
        &self,
        state: &KinematicState,
        gas_height: f64,
    ) -> Result<ForceState, Error> {
        let MassProperties { q1, q2, q3, d, l, .. } = self.props;
        let phi = state.phi;

        let r_a = state.crank_pin;
        let r_b = state.piston_pin;
        let r_c2 = state.rod_centroid;

        // gas force always acts along the bore, toward the crank
        let gas_force = Vec2::new(
            0.0,
            -gas_height * gas::PRESSURE_PER_HEIGHT * gas::piston_area_cm2(d),
        );
        let g1 = Vec2::new(0.0, -q1);
        let g2 = Vec2::new(0.0, -q2);
        let g3 = Vec2::new(0.0, -q3);

        let pi2 = -state.a_c2 * self.m2;
        let pi3 = -state.a_b * self.m3;
        // alpha2 is measured in the crank's (clockwise) sense while moments are counterclockwise,
        // so opposing it gives +jc2 * alpha2
        let mi2 = self.jc2 * state.alpha2;

        let p_total = gas_force + pi3 + g3;

        let u_ba = (r_a - r_b).normalize();
        let u_t = Vec2::new(-u_ba.y, u_ba.x);

        // moments on the rod about the piston pin
        let r_c2b = r_c2 - r_b;
        let m_g2 = r_c2b.perp(&g2);
        let m_pi2 = r_c2b.perp(&pi2);
        let r12t = u_t * (-(m_g2 + m_pi2 + mi2) / l);

        // rod and piston together, along the stroke
        if u_ba.y.abs() < SINGULAR_EPS {
            return Err(Error::SingularOrientation { phi });
        }
        let known_y = r12t.y + g2.y + pi2.y + p_total.y;
        let r12n = u_ba * (-known_y / u_ba.y);
        let r12 = r12n + r12t;

        // across the stroke only the guide can react
        let r03 = Vec2::new(-(r12.x + g2.x + pi2.x + p_total.x), 0.0);
        let r23 = -(p_total + r03);

        let r21 = -r12;
        let r01 = r12 - g1;
        let md = -r_a.perp(&r21);

        trace!("forces(phi={phi:.3}) Md={md:.4} R12=({:.3}, {:.3})", r12.x, r12.y);

        Ok(ForceState {
            phi,
            gas_height,
            gas_force,
            g2,
            g3,
            pi2,
            mi2,
            pi3,
            p_total,
            u_ba,
            r12n,
            r12t,
            r12,
            r21,
            r03,
            r23,
            r01,
            md,
        })
    }
}
