use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;
use crate::network::network::Network;

/// Turns integer class labels into `num_classes x 1` target columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneHotEncoder {
    num_classes: usize,
}

impl OneHotEncoder {
    pub fn new(num_classes: usize) -> OneHotEncoder {
        OneHotEncoder { num_classes }
    }

    /// One class per output unit of `network`.
    pub fn for_network(network: &Network) -> OneHotEncoder {
        OneHotEncoder::new(network.output_width())
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn encode(&self, label: usize) -> Result<Matrix> {
        let mut target = Matrix::zeros(self.num_classes, 1);
        target.set(label, 0, 1.0).map_err(|_| NnError::IndexOutOfRange {
            row: label,
            col: 0,
            rows: self.num_classes,
            cols: 1,
        })?;
        Ok(target)
    }

    pub fn encode_all(&self, labels: &[usize]) -> Result<Vec<Matrix>> {
        labels.iter().map(|&label| self.encode(label)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_label_three_of_ten() {
        let target = OneHotEncoder::new(10).encode(3).unwrap();
        assert_eq!(target.shape(), (10, 1));
        for i in 0..10 {
            let expected = if i == 3 { 1.0 } else { 0.0 };
            assert_eq!(target.get(i, 0).unwrap(), expected);
        }
        assert_eq!(target.sum(), 1.0);
    }

    #[test]
    fn label_outside_class_range_fails() {
        let err = OneHotEncoder::new(4).encode(4).unwrap_err();
        assert!(matches!(err, NnError::IndexOutOfRange { row: 4, rows: 4, .. }));
    }

    #[test]
    fn encode_all_keeps_order() {
        let targets = OneHotEncoder::new(3).encode_all(&[2, 0]).unwrap();
        assert_eq!(targets[0].as_slice(), &[0.0, 0.0, 1.0]);
        assert_eq!(targets[1].as_slice(), &[1.0, 0.0, 0.0]);
    }
}
