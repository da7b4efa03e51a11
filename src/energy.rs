//! Energy and loss arithmetic.
//!
//! Every stored energy and loss value goes through [`round2`], so results
//! always carry two decimal digits.
use std::fmt;

use serde::Serialize;

use crate::util::round2;

/// Upper bound (exclusive) of the green loss band, in percent.
pub const GREEN_MAX: f64 = 2.0;
/// Upper bound (inclusive) of the amber loss band, in percent.
pub const AMBER_MAX: f64 = 5.0;

/// Energy consumed between two readings, scaled by the multiplying factor.
///
/// Returns `None` when a reading is missing or the delta is not finite. A
/// negative delta (meter rollover, swapped readings) is clamped to zero.
pub fn energy(day1: Option<f64>, day2: Option<f64>, multiplier: f64) -> Option<f64> {
    let delta = day2? - day1?;
    if !delta.is_finite() {
        return None;
    }
    let e = round2(delta.max(0.0) * multiplier);
    // Negative multipliers clamp too.
    e.is_finite().then_some(e.max(0.0))
}

/// Percentage of `upstream` not accounted for by `downstream`.
///
/// `None` when there is no upstream energy to divide by. Negative values are
/// kept: they mean downstream metering exceeds the source.
pub fn loss_or_null(upstream: Option<f64>, downstream: Option<f64>) -> Option<f64> {
    let u = upstream?;
    if u == 0.0 {
        return None;
    }
    let d = downstream.unwrap_or(0.0);
    Some(round2((u - d) / u * 100.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LossBand {
    Green,
    Amber,
    Red,
}

impl LossBand {
    pub fn classify(loss: Option<f64>) -> Option<LossBand> {
        let pct = loss.filter(|v| !v.is_nan())?;
        Some(if pct < GREEN_MAX {
            LossBand::Green
        } else if pct <= AMBER_MAX {
            LossBand::Amber
        } else {
            LossBand::Red
        })
    }

    /// Band label, or a dash when the loss is undefined.
    pub fn label(loss: Option<f64>) -> String {
        Self::classify(loss)
            .map(|b| b.to_string())
            .unwrap_or_else(|| "—".to_string())
    }
}

impl fmt::Display for LossBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossBand::Green => write!(f, "Green"),
            LossBand::Amber => write!(f, "Amber"),
            LossBand::Red => write!(f, "Red"),
        }
    }
}
