use rand::Rng;

use crate::error::{NnError, Result};

/// Dense row-major matrix of `f64` backed by one contiguous buffer.
///
/// The shape is fixed at construction. Every binary operation checks shapes
/// and returns `NnError::ShapeMismatch` instead of coercing.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, fill: f64) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![fill; rows * cols],
        }
    }

    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix::new(rows, cols, 0.0)
    }

    /// Wraps a row-major buffer. `data.len()` must equal `rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Matrix> {
        if data.len() != rows * cols {
            return Err(NnError::shape("from_vec", (rows, cols), (data.len(), 1)));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Builds a matrix from nested rows; every row must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Matrix> {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(NnError::shape("from_rows", (rows.len(), cols), (1, row.len())));
            }
            data.extend_from_slice(row);
        }
        Ok(Matrix { rows: rows.len(), cols, data })
    }

    /// A `values.len() x 1` column vector.
    pub fn column(values: Vec<f64>) -> Matrix {
        Matrix {
            rows: values.len(),
            cols: 1,
            data: values,
        }
    }

    /// Independent uniform samples from `[-bound, bound]`.
    pub fn random_uniform<R: Rng + ?Sized>(rows: usize, cols: usize, bound: f64, rng: &mut R) -> Matrix {
        let data = (0..rows * cols)
            .map(|_| rng.gen_range(-bound..=bound))
            .collect();
        Matrix { rows, cols, data }
    }

    /// Stacks equally tall column vectors side by side into one batch matrix.
    pub fn from_columns(columns: &[Matrix]) -> Result<Matrix> {
        let rows = columns.first().map_or(0, |c| c.rows);
        let mut res = Matrix::zeros(rows, columns.len());
        for (j, column) in columns.iter().enumerate() {
            if column.cols != 1 || column.rows != rows {
                return Err(NnError::shape("from_columns", (rows, 1), column.shape()));
            }
            for i in 0..rows {
                res.data[i * res.cols + j] = column.data[i];
            }
        }
        Ok(res)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Row-major view of the entries for in-place content updates.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.check_index(row, col)?;
        Ok(self.data[row * self.cols + col])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        self.check_index(row, col)?;
        self.data[row * self.cols + col] = value;
        Ok(())
    }

    pub fn row(&self, row: usize) -> Result<&[f64]> {
        if row >= self.rows {
            return Err(NnError::IndexOutOfRange { row, col: 0, rows: self.rows, cols: self.cols });
        }
        Ok(&self.data[row * self.cols..(row + 1) * self.cols])
    }

    /// Copies column `col` out as a column vector.
    pub fn col(&self, col: usize) -> Result<Matrix> {
        if col >= self.cols {
            return Err(NnError::IndexOutOfRange { row: 0, col, rows: self.rows, cols: self.cols });
        }
        let values = (0..self.rows).map(|i| self.data[i * self.cols + col]).collect();
        Ok(Matrix::column(values))
    }

    fn check_index(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(NnError::IndexOutOfRange { row, col, rows: self.rows, cols: self.cols });
        }
        Ok(())
    }

    fn check_same_shape(&self, other: &Matrix, op: &'static str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(NnError::shape(op, self.shape(), other.shape()));
        }
        Ok(())
    }

    fn zip_with<F>(&self, other: &Matrix, op: &'static str, f: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_same_shape(other, op)?;
        let data = self.data.iter().zip(&other.data).map(|(&a, &b)| f(a, b)).collect();
        Ok(Matrix { rows: self.rows, cols: self.cols, data })
    }

    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    pub fn subtract(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, "subtract", |a, b| a - b)
    }

    /// Element-wise (Hadamard) product.
    pub fn hadamard(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, "hadamard", |a, b| a * b)
    }

    pub fn scalar_add(&self, scalar: f64) -> Matrix {
        self.map(|x| x + scalar)
    }

    pub fn scalar_subtract(&self, scalar: f64) -> Matrix {
        self.map(|x| x - scalar)
    }

    pub fn scalar_multiply(&self, scalar: f64) -> Matrix {
        self.map(|x| x * scalar)
    }

    /// Matrix product. `self.cols` must equal `other.rows`.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(NnError::shape("multiply", self.shape(), other.shape()));
        }

        let mut res = Matrix::zeros(self.rows, other.cols);

        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = 0.0;

                for k in 0..self.cols {
                    sum += self.data[i * self.cols + k] * other.data[k * other.cols + j];
                }

                res.data[i * res.cols + j] = sum;
            }
        }

        Ok(res)
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[j * res.cols + i] = self.data[i * self.cols + j];
            }
        }

        res
    }

    /// Reshapes into a `rows * cols` column, preserving row-major order.
    pub fn flatten(&self) -> Matrix {
        Matrix::column(self.data.clone())
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Adds the `rows x 1` column `bias` to every column of `self`.
    pub fn add_column_broadcast(&self, bias: &Matrix) -> Result<Matrix> {
        if bias.cols != 1 || bias.rows != self.rows {
            return Err(NnError::shape("add_column_broadcast", self.shape(), bias.shape()));
        }
        let mut res = self.clone();
        for i in 0..self.rows {
            let b = bias.data[i];
            for x in &mut res.data[i * self.cols..(i + 1) * self.cols] {
                *x += b;
            }
        }
        Ok(res)
    }

    /// Row sums as a `rows x 1` column.
    pub fn sum_columns(&self) -> Matrix {
        let sums = (0..self.rows)
            .map(|i| self.data[i * self.cols..(i + 1) * self.cols].iter().sum())
            .collect();
        Matrix::column(sums)
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Row-major index of the largest entry; ties go to the lowest index.
    /// Returns `None` for an empty matrix.
    pub fn argmax(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.data.iter().enumerate() {
            match best {
                Some((_, bv)) if v <= bv => {}
                _ => best = Some((i, v)),
            }
        }
        best.map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn m(rows: &[Vec<f64>]) -> Matrix {
        Matrix::from_rows(rows).unwrap()
    }

    fn assert_close(a: &Matrix, b: &Matrix, eps: f64) {
        assert_eq!(a.shape(), b.shape());
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert_relative_eq!(*x, *y, epsilon = eps);
        }
    }

    #[test]
    fn add_then_subtract_is_identity() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = Matrix::random_uniform(4, 3, 10.0, &mut rng);
        let b = Matrix::random_uniform(4, 3, 10.0, &mut rng);
        let back = a.add(&b).unwrap().subtract(&b).unwrap();
        assert_close(&back, &a, 1e-9);
    }

    #[test]
    fn elementwise_ops_reject_mismatched_shapes() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(3, 2);
        assert!(matches!(a.add(&b), Err(NnError::ShapeMismatch { op: "add", .. })));
        assert!(matches!(a.subtract(&b), Err(NnError::ShapeMismatch { .. })));
        assert!(matches!(a.hadamard(&b), Err(NnError::ShapeMismatch { .. })));
    }

    #[test]
    fn multiply_checks_inner_dimension() {
        let a = Matrix::zeros(2, 3);
        assert!(matches!(a.multiply(&a), Err(NnError::ShapeMismatch { op: "multiply", .. })));
        assert_eq!(a.multiply(&a.transpose()).unwrap().shape(), (2, 2));
    }

    #[test]
    fn multiply_known_product() {
        let a = m(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = m(&[vec![5.0, 6.0], vec![7.0, 8.0]]);
        let c = a.multiply(&b).unwrap();
        assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn transpose_is_an_involution() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = Matrix::random_uniform(3, 5, 1.0, &mut rng);
        assert_eq!(a.transpose().transpose(), a);
        assert_eq!(a.transpose().shape(), (5, 3));
    }

    #[test]
    fn transpose_of_product_reverses_factors() {
        let mut rng = StdRng::seed_from_u64(2);
        let a = Matrix::random_uniform(3, 4, 1.0, &mut rng);
        let b = Matrix::random_uniform(4, 2, 1.0, &mut rng);
        let lhs = a.multiply(&b).unwrap().transpose();
        let rhs = b.transpose().multiply(&a.transpose()).unwrap();
        assert_close(&lhs, &rhs, 1e-12);
    }

    #[test]
    fn scalar_ops_broadcast() {
        let a = m(&[vec![1.0, -2.0]]);
        assert_eq!(a.scalar_add(1.0).as_slice(), &[2.0, -1.0]);
        assert_eq!(a.scalar_subtract(1.0).as_slice(), &[0.0, -3.0]);
        assert_eq!(a.scalar_multiply(-2.0).as_slice(), &[-2.0, 4.0]);
    }

    #[test]
    fn flatten_keeps_row_major_order() {
        let a = m(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let f = a.flatten();
        assert_eq!(f.shape(), (6, 1));
        assert_eq!(f.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn indexed_access_is_bounds_checked() {
        let mut a = Matrix::zeros(2, 2);
        a.set(1, 0, 3.5).unwrap();
        assert_eq!(a.get(1, 0).unwrap(), 3.5);
        assert!(matches!(a.get(2, 0), Err(NnError::IndexOutOfRange { row: 2, .. })));
        assert!(matches!(a.set(0, 2, 1.0), Err(NnError::IndexOutOfRange { col: 2, .. })));
        assert!(a.row(2).is_err());
        assert!(a.col(2).is_err());
    }

    #[test]
    fn from_vec_and_from_rows_validate_lengths() {
        assert!(Matrix::from_vec(2, 2, vec![1.0; 3]).is_err());
        assert!(Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
    }

    #[test]
    fn columns_stack_and_split() {
        let c0 = Matrix::column(vec![1.0, 2.0]);
        let c1 = Matrix::column(vec![3.0, 4.0]);
        let batch = Matrix::from_columns(&[c0.clone(), c1.clone()]).unwrap();
        assert_eq!(batch.as_slice(), &[1.0, 3.0, 2.0, 4.0]);
        assert_eq!(batch.col(0).unwrap(), c0);
        assert_eq!(batch.col(1).unwrap(), c1);
        assert!(Matrix::from_columns(&[c0, Matrix::column(vec![1.0])]).is_err());
    }

    #[test]
    fn bias_broadcast_and_row_sums() {
        let a = m(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = Matrix::column(vec![10.0, 20.0]);
        let s = a.add_column_broadcast(&b).unwrap();
        assert_eq!(s.as_slice(), &[11.0, 12.0, 23.0, 24.0]);
        assert_eq!(a.sum_columns().as_slice(), &[3.0, 7.0]);
        assert!(a.add_column_broadcast(&Matrix::column(vec![1.0])).is_err());
    }

    #[test]
    fn argmax_prefers_first_maximum() {
        let a = Matrix::column(vec![0.1, 0.9, 0.9, 0.2]);
        assert_eq!(a.argmax(), Some(1));
        assert_eq!(Matrix::zeros(0, 0).argmax(), None);
    }

    #[test]
    fn random_uniform_respects_bound() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = Matrix::random_uniform(20, 20, 0.25, &mut rng);
        assert!(a.as_slice().iter().all(|x| x.abs() <= 0.25));
    }
}
