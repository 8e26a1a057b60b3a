//! Dense row-major matrix.
//!
//! Every network quantity is a `Matrix`: a sample is a `1 x width` row, weights are
//! `inputs x outputs`, a batch is `N x width`. Each operation checks its shape
//! precondition and returns [`Error::ShapeMismatch`] instead of reading out of bounds.

use std::fmt;

use crate::matmul::{Backend, Naive};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    /// Row-major, `rows * cols` values.
    data: Vec<f64>,
}

impl Matrix {
    /// Build a matrix from a flat row-major buffer.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidShape(format!(
                "matrix dimensions must be > 0, got {rows}x{cols}"
            )));
        }
        if data.len() != rows * cols {
            return Err(Error::InvalidShape(format!(
                "data length {} does not match {rows}x{cols}",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// A `rows x cols` matrix of zeros.
    ///
    /// Panics if either dimension is zero.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        assert!(rows > 0 && cols > 0, "matrix dimensions must be > 0");
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// A single-row matrix.
    pub fn row_vector(values: Vec<f64>) -> Result<Self> {
        let cols = values.len();
        Self::new(1, cols, values)
    }

    /// Build a matrix from per-row vectors (copied into contiguous storage).
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::InvalidShape(format!(
                    "row {i} has len {}, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Self::new(rows.len(), cols, data)
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Element at `(row, col)`.
    ///
    /// Panics if the index is out of range.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of range for {}x{} matrix",
            self.rows,
            self.cols
        );
        self.data[row * self.cols + col]
    }

    /// Copy row `idx` out as a standalone `1 x cols` matrix.
    pub fn row(&self, idx: usize) -> Result<Matrix> {
        if idx >= self.rows {
            return Err(Error::InvalidShape(format!(
                "row {idx} out of range for {} rows",
                self.rows
            )));
        }
        let start = idx * self.cols;
        Ok(Self {
            rows: 1,
            cols: self.cols,
            data: self.data[start..start + self.cols].to_vec(),
        })
    }

    /// Element-wise map with `f(row, col, value)`.
    pub fn map<F>(&self, mut f: F) -> Matrix
    where
        F: FnMut(usize, usize, f64) -> f64,
    {
        let cols = self.cols;
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(idx, &v)| f(idx / cols, idx % cols, v))
            .collect();
        Self {
            rows: self.rows,
            cols,
            data,
        }
    }

    /// Matrix product using the [`Naive`] backend.
    pub fn matmul(&self, rhs: &Matrix) -> Result<Matrix> {
        self.matmul_with(rhs, &Naive)
    }

    /// Matrix product `self * rhs` computed by `backend`.
    ///
    /// Requires `rhs.rows() == self.cols()`.
    pub fn matmul_with<B: Backend>(&self, rhs: &Matrix, backend: &B) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(self.mismatch("matmul", rhs));
        }
        let (m, k, n) = (self.rows, self.cols, rhs.cols);
        let mut out = Matrix::zeros(m, n);
        backend.gemm(
            m,
            n,
            k,
            1.0,
            &self.data,
            k,
            1,
            &rhs.data,
            n,
            1,
            0.0,
            &mut out.data,
            n,
            1,
        );
        Ok(out)
    }

    pub fn add(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with("add", rhs, |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with("sub", rhs, |a, b| a - b)
    }

    /// Element-wise (Hadamard) product.
    pub fn mul_elem(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with("mul_elem", rhs, |a, b| a * b)
    }

    pub fn scale(&self, s: f64) -> Matrix {
        self.map(|_, _, v| s * v)
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                data.push(self.data[r * self.cols + c]);
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// Horizontal concatenation `[self | rhs]`. Requires equal row counts.
    pub fn hcat(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.rows != rhs.rows {
            return Err(self.mismatch("hcat", rhs));
        }
        let cols = self.cols + rhs.cols;
        let mut data = Vec::with_capacity(self.rows * cols);
        for r in 0..self.rows {
            data.extend_from_slice(&self.data[r * self.cols..(r + 1) * self.cols]);
            data.extend_from_slice(&rhs.data[r * rhs.cols..(r + 1) * rhs.cols]);
        }
        Ok(Self {
            rows: self.rows,
            cols,
            data,
        })
    }

    /// Vertical concatenation (`self` on top of `rhs`). Requires equal column counts.
    pub fn vcat(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.cols {
            return Err(self.mismatch("vcat", rhs));
        }
        let mut data = Vec::with_capacity(self.data.len() + rhs.data.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&rhs.data);
        Ok(Self {
            rows: self.rows + rhs.rows,
            cols: self.cols,
            data,
        })
    }

    /// Copy of `self` grown to `rows` rows by appending zero rows.
    pub(crate) fn pad_rows(&self, rows: usize) -> Matrix {
        if rows <= self.rows {
            return self.clone();
        }
        let mut data = self.data.clone();
        data.resize(rows * self.cols, 0.0);
        Self {
            rows,
            cols: self.cols,
            data,
        }
    }

    fn zip_with<F>(&self, op: &'static str, rhs: &Matrix, f: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.dims() != rhs.dims() {
            return Err(self.mismatch(op, rhs));
        }
        let data = self
            .data
            .iter()
            .zip(&rhs.data)
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    #[inline]
    fn mismatch(&self, op: &'static str, rhs: &Matrix) -> Error {
        Error::ShapeMismatch {
            op,
            left: self.dims(),
            right: rhs.dims(),
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(4);
        for r in 0..self.rows {
            let (open, close) = match (self.rows, r) {
                (1, _) => ('[', ']'),
                (_, 0) => ('⎡', '⎤'),
                (n, r) if r == n - 1 => ('⎣', '⎦'),
                _ => ('⎢', '⎥'),
            };
            write!(f, "{open}")?;
            for c in 0..self.cols {
                write!(f, " {:>width$.precision$}", self.get(r, c), width = precision + 4)?;
            }
            writeln!(f, " {close}")?;
        }
        Ok(())
    }
}
