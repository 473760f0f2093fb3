use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²) over every entry.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        let n = predicted.rows() * predicted.cols();
        if n == 0 {
            return Err(NnError::shape("mse", predicted.shape(), expected.shape()));
        }
        let diff = predicted.subtract(expected)?;
        Ok(diff.hadamard(&diff)?.sum() / n as f64)
    }

    /// Quadratic cost ½·Σ(predicted - expected)², whose exact gradient is
    /// `derivative()`.
    pub fn cost(predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        let diff = predicted.subtract(expected)?;
        Ok(0.5 * diff.hadamard(&diff)?.sum())
    }

    /// Per-output gradient: predicted - expected
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        predicted.subtract(expected)
    }
}
