//! GEMM backends.
//!
//! Every matrix product in the crate goes through a [`Backend`]:
//! - [`Naive`] (default): a simple, safe triple-loop implementation
//! - [`MatrixMultiply`]: a faster backend via the `matrixmultiply` feature
//!
//! [`crate::Network`] is generic over the backend so the two can be swapped (and
//! compared against each other in tests) without touching the layer code.

use std::fmt::Debug;

/// A general matrix multiply: `C = alpha * A * B + beta * C`.
///
/// `A` is `m x k`, `B` is `k x n`, `C` is `m x n`. Each operand is described by a
/// slice plus a row stride and a column stride, so transposed views can be passed
/// without copying.
pub trait Backend: Debug + Clone + Default {
    #[allow(clippy::too_many_arguments)]
    fn gemm(
        &self,
        m: usize,
        n: usize,
        k: usize,
        alpha: f64,
        a: &[f64],
        rsa: usize,
        csa: usize,
        b: &[f64],
        rsb: usize,
        csb: usize,
        beta: f64,
        c: &mut [f64],
        rsc: usize,
        csc: usize,
    );
}

/// Reference backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Naive;

impl Backend for Naive {
    #[inline]
    fn gemm(
        &self,
        m: usize,
        n: usize,
        k: usize,
        alpha: f64,
        a: &[f64],
        rsa: usize,
        csa: usize,
        b: &[f64],
        rsb: usize,
        csb: usize,
        beta: f64,
        c: &mut [f64],
        rsc: usize,
        csc: usize,
    ) {
        debug_assert!(m > 0 && n > 0 && k > 0);

        for i in 0..m {
            for j in 0..n {
                let mut acc = 0.0_f64;
                let a0 = i * rsa;
                let b0 = j * csb;

                for p in 0..k {
                    let av = a[a0 + p * csa];
                    let bv = b[p * rsb + b0];
                    acc = av.mul_add(bv, acc);
                }

                let idx = i * rsc + j * csc;
                c[idx] = alpha * acc + beta * c[idx];
            }
        }
    }
}

/// Backend delegating to `matrixmultiply::dgemm` (feature: `matrixmultiply`).
#[cfg(feature = "matrixmultiply")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatrixMultiply;

#[cfg(feature = "matrixmultiply")]
impl Backend for MatrixMultiply {
    #[inline]
    fn gemm(
        &self,
        m: usize,
        n: usize,
        k: usize,
        alpha: f64,
        a: &[f64],
        rsa: usize,
        csa: usize,
        b: &[f64],
        rsb: usize,
        csb: usize,
        beta: f64,
        c: &mut [f64],
        rsc: usize,
        csc: usize,
    ) {
        debug_assert!(m > 0 && n > 0 && k > 0);
        debug_assert!(a.len() > (m - 1) * rsa + (k - 1) * csa);
        debug_assert!(b.len() > (k - 1) * rsb + (n - 1) * csb);
        debug_assert!(c.len() > (m - 1) * rsc + (n - 1) * csc);

        // SAFETY: callers (`Matrix::matmul_with`) validate the shapes, and the strides
        // above keep every access inside the three slices.
        unsafe {
            matrixmultiply::dgemm(
                m,
                k,
                n,
                alpha,
                a.as_ptr(),
                rsa as isize,
                csa as isize,
                b.as_ptr(),
                rsb as isize,
                csb as isize,
                beta,
                c.as_mut_ptr(),
                rsc as isize,
                csc as isize,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naive_gemm_matches_hand_computed_product() {
        // [1 2 3]   [7  8]   [ 58  64]
        // [4 5 6] x [9 10] = [139 154]
        //           [11 12]
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let mut c = [0.0; 4];
        Naive.gemm(2, 2, 3, 1.0, &a, 3, 1, &b, 2, 1, 0.0, &mut c, 2, 1);
        assert_eq!(c, [58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn naive_gemm_respects_transposed_strides_and_beta() {
        // A^T with A = [1 2; 3 4] stored row-major, read column-major.
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [1.0, 0.0, 0.0, 1.0];
        let mut c = [1.0; 4];
        Naive.gemm(2, 2, 2, 2.0, &a, 1, 2, &b, 2, 1, 1.0, &mut c, 2, 1);
        assert_eq!(c, [3.0, 7.0, 5.0, 9.0]);
    }

    #[cfg(feature = "matrixmultiply")]
    #[test]
    fn matrixmultiply_agrees_with_naive() {
        let a: Vec<f64> = (0..12).map(|v| v as f64 * 0.25 - 1.0).collect();
        let b: Vec<f64> = (0..20).map(|v| (v as f64).sin()).collect();
        let mut c_naive = vec![0.0; 15];
        let mut c_fast = vec![0.0; 15];
        Naive.gemm(3, 5, 4, 1.0, &a, 4, 1, &b, 5, 1, 0.0, &mut c_naive, 5, 1);
        MatrixMultiply.gemm(3, 5, 4, 1.0, &a, 4, 1, &b, 5, 1, 0.0, &mut c_fast, 5, 1);
        for (x, y) in c_naive.iter().zip(&c_fast) {
            assert!((x - y).abs() < 1e-12, "naive={x} fast={y}");
        }
    }
}
