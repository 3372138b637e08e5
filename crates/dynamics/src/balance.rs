#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use log::debug;

use crate::{Error, MassProperties, GRAVITY};

/// Counterweight radius as a fraction of the crank length.
pub const COUNTERWEIGHT_RADIUS_RATIO: f64 = 0.5;

/// Link masses reduced to the crank pin `A` and the piston pin `B`, and the counterweight that
/// cancels the rotating part.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Balance {
    /// crank mass (kg)
    pub m1: f64,
    /// share of the rod mass reduced to the crank pin (kg)
    pub m2a: f64,
    /// share of the rod mass reduced to the piston pin (kg)
    pub m2b: f64,
    /// piston assembly mass (kg)
    pub m3: f64,
    /// total rotating mass at the crank pin, `m1 + m2a` (kg)
    pub m_rot: f64,
    /// total reciprocating mass at the piston pin, `m3 + m2b` (kg)
    pub m_recip: f64,
    /// unbalance (kg·m)
    pub mr: f64,
    /// counterweight radius (m)
    pub counterweight_radius: f64,
    /// counterweight mass at `counterweight_radius` (kg)
    pub m_b: f64,
}

impl Balance {
    /// Counterweight mass (kg) that cancels the unbalance when mounted at `radius` (m).
    pub fn counterweight_mass(&self, radius: f64) -> Result<f64, Error> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(Error::InvalidInput {
                msg: format!("counterweight radius {radius} must be positive"),
            });
        }
        Ok(self.mr / radius)
    }
}

/// Reduce the rod to its two pins and size the counterweight for the rotating mass.
///
/// The rod splits statically: `m2a + m2b = m2` and `m2a·lac = m2b·(l − lac)`. The rotating mass
/// `m1 + m2a` is balanced by a counterweight at [`COUNTERWEIGHT_RADIUS_RATIO`] of the crank
/// length. The reciprocating mass is reported but left unbalanced.
///
/// # Arguments
///
/// * `props` - link weights; only `q1`, `q2` and `q3` are used
/// * `lac_ratio` - distance from the crank pin to the rod centroid, as a fraction of the rod length
/// * `crank_length` - m
pub fn balance(
    props: &MassProperties,
    lac_ratio: f64,
    crank_length: f64,
) -> Result<Balance, Error> {
    let MassProperties { q1, q2, q3, .. } = *props;
    if [q1, q2, q3].iter().any(|q| !(q.is_finite() && *q >= 0.0)) {
        return Err(Error::InvalidInput {
            msg: format!("weights must be non-negative: Q1 = {q1}, Q2 = {q2}, Q3 = {q3}"),
        });
    }
    if !(lac_ratio > 0.0 && lac_ratio < 1.0) {
        return Err(Error::InvalidInput {
            msg: format!("rod centroid ratio {lac_ratio} must lie in (0, 1)"),
        });
    }
    if !(crank_length > 0.0 && crank_length.is_finite()) {
        return Err(Error::InvalidInput {
            msg: format!("crank length {crank_length} must be positive"),
        });
    }

    let m1 = q1 / GRAVITY;
    let m2 = q2 / GRAVITY;
    let m3 = q3 / GRAVITY;
    let m2a = m2 * (1.0 - lac_ratio);
    let m2b = m2 - m2a;
    let m_rot = m1 + m2a;
    let m_recip = m3 + m2b;
    let mr = m_rot * crank_length;

    let mut balance = Balance {
        m1,
        m2a,
        m2b,
        m3,
        m_rot,
        m_recip,
        mr,
        counterweight_radius: COUNTERWEIGHT_RADIUS_RATIO * crank_length,
        m_b: 0.0,
    };
    balance.m_b = balance.counterweight_mass(balance.counterweight_radius)?;
    debug!(
        "balance: m_rot={m_rot:.4}kg m_recip={m_recip:.4}kg unbalance={mr:.5}kg·m m_b={:.4}kg",
        balance.m_b
    );

    Ok(balance)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn props(q1: f64, q2: f64, q3: f64) -> MassProperties {
        MassProperties {
            q1,
            q2,
            q3,
            d: 170.0,
            rho_ratio: 0.16,
            l: 0.41,
        }
    }

    #[test]
    fn test_balance() {
        let b = balance(&props(150.0, 120.0, 200.0), 0.35, 0.1068).unwrap();
        assert_relative_eq!(b.m1, 150.0 / 9.8);
        assert_relative_eq!(b.m2a, 120.0 / 9.8 * 0.65);
        assert_relative_eq!(b.m2b, 120.0 / 9.8 * 0.35, max_relative = 1e-12);
        assert_relative_eq!(b.m_rot, b.m1 + b.m2a);
        assert_relative_eq!(b.m_recip, 200.0 / 9.8 + b.m2b);
        assert_relative_eq!(b.mr, b.m_rot * 0.1068);

        // the rod split keeps the centroid in place
        assert_relative_eq!(b.m2a + b.m2b, 120.0 / 9.8, max_relative = 1e-12);
        assert_relative_eq!(b.m2a * 0.35, b.m2b * 0.65, max_relative = 1e-12);

        // half the crank radius needs twice the rotating mass
        assert_relative_eq!(b.counterweight_radius, 0.0534);
        assert_relative_eq!(b.m_b, 2.0 * b.m_rot, max_relative = 1e-12);

        let cw = b.counterweight_mass(0.2).unwrap();
        assert_relative_eq!(cw * 0.2, b.mr, max_relative = 1e-12);
        assert!(b.counterweight_mass(0.0).is_err());
    }

    #[test]
    fn test_invalid() {
        assert!(balance(&props(-1.0, 120.0, 200.0), 0.35, 0.1).is_err());
        assert!(balance(&props(150.0, 120.0, f64::NAN), 0.35, 0.1).is_err());
        assert!(balance(&props(150.0, 120.0, 200.0), 1.0, 0.1).is_err());
        assert!(balance(&props(150.0, 120.0, 200.0), 0.35, 0.0).is_err());
    }
}
