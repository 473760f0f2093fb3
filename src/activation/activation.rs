use serde::{Serialize, Deserialize};
use std::f64::consts::E;

use crate::math::matrix::Matrix;

/// Element-wise non-linearity shared by every layer of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Sigmoid,
    #[serde(rename = "relu")]
    ReLU,
}

impl Activation {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            Activation::ReLU => if x > 0.0 { x } else { 0.0 },
        }
    }

    /// Derivative with respect to the pre-activation `x`.
    ///
    /// Sigmoid recomputes `σ(x)` rather than reading a cached output.
    /// ReLU uses 0 as the subgradient at exactly `x == 0`.
    pub fn derivative_at(&self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            },
            Activation::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
        }
    }

    pub fn apply(&self, z: &Matrix) -> Matrix {
        z.map(|x| self.function(x))
    }

    pub fn derivative(&self, z: &Matrix) -> Matrix {
        z.map(|x| self.derivative_at(x))
    }
}
