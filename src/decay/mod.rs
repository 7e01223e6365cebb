//! Growth/decay distance functions.
//!
//! Each function maps a horizontal distance and a decay rate to an
//! interpolation weight. Weights start at full strength over the seed and
//! fall toward zero with distance; the engine multiplies them into the gap
//! between a seed's target elevation and the surrounding terrain.

use serde::{Deserialize, Serialize};

/// A distance-to-weight decay function.
///
/// All variants share the signature `eval(distance, rate)` and are pure.
/// `rate == 0.0` disables decay entirely (constant full-strength weight),
/// so callers never divide by the rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DecayFunction {
    /// `max(0, 1 - rate * d)`. Reaches zero at `d = 1/rate`.
    Linear,
    /// `exp(-rate * d)`.
    Exponential,
    /// `1 / (1 + exp(rate * (d - midpoint)))`, a sigmoid falling through
    /// one-half at the configured inflection distance.
    Logistic { midpoint: f64 },
    /// `exp(-(rate * d)^2)`.
    Gaussian,
    /// Cauchy-Lorentz: `1 / (1 + (rate * d)^2)`.
    Lorentz,
    /// `max(0, 1 - (rate * d)^2)`.
    Quadratic,
    /// `max(0, 1 - (rate * d)^3)`.
    Cubic,
}

impl DecayFunction {
    /// Evaluates the decay weight at a horizontal distance.
    ///
    /// # Arguments
    /// * `distance` - Horizontal distance in map units, >= 0
    /// * `rate` - Decay rate, >= 0; zero means no decay
    pub fn eval(&self, distance: f64, rate: f64) -> f64 {
        debug_assert!(distance >= 0.0, "distance must be non-negative");
        debug_assert!(rate >= 0.0, "rate must be non-negative");

        if rate == 0.0 {
            return 1.0;
        }

        match *self {
            Self::Linear => (1.0 - rate * distance).max(0.0),
            Self::Exponential => (-rate * distance).exp(),
            Self::Logistic { midpoint } => 1.0 / (1.0 + (rate * (distance - midpoint)).exp()),
            Self::Gaussian => {
                let t = rate * distance;
                (-(t * t)).exp()
            }
            Self::Lorentz => {
                let t = rate * distance;
                1.0 / (1.0 + t * t)
            }
            Self::Quadratic => {
                let t = rate * distance;
                (1.0 - t * t).max(0.0)
            }
            Self::Cubic => {
                let t = rate * distance;
                (1.0 - t * t * t).max(0.0)
            }
        }
    }

    /// Returns the name of the function family.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Exponential => "exponential",
            Self::Logistic { .. } => "logistic",
            Self::Gaussian => "gaussian",
            Self::Lorentz => "lorentz",
            Self::Quadratic => "quadratic",
            Self::Cubic => "cubic",
        }
    }
}

impl Default for DecayFunction {
    fn default() -> Self {
        Self::Linear
    }
}
