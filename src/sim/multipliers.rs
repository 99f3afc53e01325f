//! Payout multiplier tables
//!
//! Each risk tier maps to a curve that is cheap in the middle of the board
//! and expensive at the edges. High risk additionally pins a handful of
//! positions to fixed values, and the 16-slot high-risk table is a fixed
//! lookup kept exactly as shipped (it is not symmetric).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlinkoError;

/// Shipped 16-slot high-risk table
const HIGH_16: [f64; 16] = [
    1000.0, 180.0, 260.0, 91.0, 48.0, 22.0, 2.0, 2.0, 2.0, 2.0, 24.0, 44.0, 94.0, 268.0, 630.0,
    0.0,
];

/// Risk tier: trades landing-probability spread for payout variance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    #[default]
    High,
}

/// Curve shape for one tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveParams {
    /// Value at the centre
    pub min: f64,
    /// Value at the edges
    pub max: f64,
    /// Exponent applied to the normalised distance from centre
    pub curve: f64,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }

    pub fn curve(&self) -> CurveParams {
        match self {
            RiskTier::Low => CurveParams {
                min: 0.2,
                max: 9.0,
                curve: 1.5,
            },
            RiskTier::Medium => CurveParams {
                min: 0.3,
                max: 25.0,
                curve: 2.5,
            },
            RiskTier::High => CurveParams {
                min: 0.2,
                max: 1000.0,
                curve: 4.0,
            },
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTier {
    type Err = PlinkoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(RiskTier::Low),
            "medium" | "med" => Ok(RiskTier::Medium),
            "high" => Ok(RiskTier::High),
            _ => Err(PlinkoError::UnknownRiskTier(s.to_string())),
        }
    }
}

/// Round the way the payout board displays values:
/// above 10 to whole numbers, above 2 to halves, otherwise to tenths.
pub fn round_multiplier(value: f64) -> f64 {
    if value > 10.0 {
        value.round()
    } else if value > 2.0 {
        (value * 2.0).round() / 2.0
    } else {
        (value * 10.0).round() / 10.0
    }
}

/// Ordered payout multipliers, one per slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierTable {
    pub risk: RiskTier,
    values: Vec<f64>,
}

impl MultiplierTable {
    /// Build the table for `slot_count` slots. Pure and deterministic.
    pub fn generate(risk: RiskTier, slot_count: usize) -> Self {
        if risk == RiskTier::High && slot_count == HIGH_16.len() {
            return Self {
                risk,
                values: HIGH_16.to_vec(),
            };
        }

        let mut values = generate_curve(risk, slot_count);
        if risk == RiskTier::High {
            apply_high_overrides(&mut values);
        }
        Self { risk, values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, slot: usize) -> Option<f64> {
        self.values.get(slot).copied()
    }

    /// Amount returned for `wager` landing in `slot`
    pub fn payout(&self, slot: usize, wager: f64) -> Option<f64> {
        self.get(slot).map(|m| m * wager)
    }

    /// Return-to-player of an ideal lattice where every row is a fair
    /// left/right choice (binomial slot probabilities).
    pub fn expected_value(&self) -> f64 {
        let n = self.values.len();
        if n == 0 {
            return 0.0;
        }
        let rows = (n - 1) as i32;
        let total = 2f64.powi(rows);

        // C(rows, k) built incrementally
        let mut coeff = 1.0;
        let mut ev = 0.0;
        for (k, value) in self.values.iter().enumerate() {
            ev += coeff / total * value;
            coeff = coeff * (rows - k as i32) as f64 / (k as f64 + 1.0);
        }
        ev
    }
}

/// Tier curve before any fixed overrides.
///
/// Distance is measured from the centre `(n - 1) / 2` and normalised to
/// `[0, 1]`, so the result is symmetric for every slot count.
pub fn generate_curve(risk: RiskTier, slot_count: usize) -> Vec<f64> {
    let CurveParams { min, max, curve } = risk.curve();
    let center = (slot_count as f64 - 1.0) / 2.0;

    (0..slot_count)
        .map(|i| {
            let d = if center > 0.0 {
                (i as f64 - center).abs() / center
            } else {
                0.0
            };
            round_multiplier(min + (max - min) * d.powf(curve))
        })
        .collect()
}

/// Fixed high-risk positions. Inner overrides first so the outermost
/// indices win on very short tables.
fn apply_high_overrides(values: &mut [f64]) {
    let n = values.len();
    let center = (n as f64 - 1.0) / 2.0;

    // Interior band [4, n-5]
    for (i, value) in values
        .iter_mut()
        .enumerate()
        .take(n.saturating_sub(4))
        .skip(4)
    {
        let dist = (i as f64 - center).abs();
        if dist <= 1.0 {
            *value = 0.2;
        } else if dist <= 3.0 {
            *value = 2.0;
        }
    }

    for (offset, fixed) in [(2, 26.0), (1, 130.0), (0, 1000.0)] {
        if offset < n {
            values[offset] = fixed;
            values[n - 1 - offset] = fixed;
        }
    }
}
