//! Matrix multiplication over property-annotated operands.
//!
//! `C = beta * C + alpha * op(A) * op(B)` where at most one of `A`, `B` is
//! structural. A structural operand is expanded to a general copy first, so
//! every product ends in the same column-major gemm:
//!
//! - symmetric and hermitian operands ignore their operation (`A^T` and `A^H`
//!   are `A` up to the stored half)
//! - triangular operands keep it
//!
//! With the `blas` feature, `f32`, `f64`, `Complex32` and `Complex64` products go
//! through `cblas` gemm; everything else uses [`generic_gemm`].

use crate::checks::{self, check_info, Operand};
use crate::kernel::{check_matrix_arg, Op};
use crate::matrix::{DenseMatrix, MatrixRef};
use crate::property::Prop;
use crate::scalar::Scalar;
use crate::Result;

/// General copy of a structural operand and the operation that still applies to it.
/// `None` when `a` is already general.
fn expanded<T: Scalar>(a: &MatrixRef<'_, T>, op: Op) -> Result<(Option<DenseMatrix<'static, T>>, Op)> {
    match a.prop().ptype() {
        Prop::General => Ok((None, op)),
        ptype => {
            tracing::debug!(property = %a.prop(), n = a.ncols(), "expanding structural operand");
            let op = match ptype {
                Prop::Symmetric | Prop::Hermitian => Op::N,
                _ => op,
            };
            Ok((Some(a.convert_to_general()?), op))
        }
    }
}

/// `C = beta * C + alpha * op_a(A) * op_b(B)`.
#[allow(clippy::too_many_arguments)]
pub fn mult<T: Scalar>(
    alpha: T,
    op_a: Op,
    a: MatrixRef<'_, T>,
    op_b: Op,
    b: MatrixRef<'_, T>,
    beta: T,
    c: &mut DenseMatrix<'_, T>,
) -> Result<()> {
    let operand = |m: &MatrixRef<'_, T>, op: Op| Operand {
        prop: m.prop(),
        nrows: m.nrows(),
        ncols: m.ncols(),
        op,
    };
    checks::mult_check(operand(&a, op_a), operand(&b, op_b), c.prop(), c.nrows(), c.ncols())?;

    let (a_full, op_a) = expanded(&a, op_a)?;
    let (b_full, op_b) = expanded(&b, op_b)?;
    let ga = a_full.as_ref().map_or(a, |full| full.as_ref());
    let gb = b_full.as_ref().map_or(b, |full| full.as_ref());

    let (m, n) = (c.nrows(), c.ncols());
    let k = if op_a.is_transpose() { ga.nrows() } else { ga.ncols() };
    let ldc = c.ld();
    gemm(
        op_a,
        op_b,
        m,
        n,
        k,
        alpha,
        ga.as_slice(),
        ga.ld(),
        gb.as_slice(),
        gb.ld(),
        beta,
        c.as_mut_slice(),
        ldc,
    )
}

/// Column-major gemm, dispatched to BLAS when available for `T`.
#[allow(clippy::too_many_arguments)]
pub fn gemm<T: Scalar>(
    op_a: Op,
    op_b: Op,
    m: usize,
    n: usize,
    k: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    b: &[T],
    ldb: usize,
    beta: T,
    c: &mut [T],
    ldc: usize,
) -> Result<()> {
    let (ar, ac) = if op_a.is_transpose() { (k, m) } else { (m, k) };
    let (br, bc) = if op_b.is_transpose() { (n, k) } else { (k, n) };
    check_info("gemm", check_matrix_arg(ar, ac, a.len(), lda, 8))?;
    check_info("gemm", check_matrix_arg(br, bc, b.len(), ldb, 10))?;
    check_info("gemm", check_matrix_arg(m, n, c.len(), ldc, 13))?;
    if m == 0 || n == 0 {
        return Ok(());
    }

    #[cfg(feature = "blas")]
    {
        if blas_gemm(op_a, op_b, m, n, k, alpha, a, lda, b, ldb, beta, c, ldc) {
            return Ok(());
        }
    }

    generic_gemm(op_a, op_b, m, n, k, alpha, a, lda, b, ldb, beta, c, ldc);
    Ok(())
}

#[inline(always)]
fn fetch<T: Scalar>(op: Op, a: &[T], ld: usize, i: usize, j: usize) -> T {
    match op {
        Op::N => a[i + j * ld],
        Op::T => a[j + i * ld],
        Op::C => a[j + i * ld].conj(),
    }
}

/// Generic gemm: `C = alpha * op_a(A) * op_b(B) + beta * C`.
#[allow(clippy::too_many_arguments)]
pub fn generic_gemm<T: Scalar>(
    op_a: Op,
    op_b: Op,
    m: usize,
    n: usize,
    k: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    b: &[T],
    ldb: usize,
    beta: T,
    c: &mut [T],
    ldc: usize,
) {
    if alpha == T::zero() || k == 0 {
        scale_columns(m, n, beta, c, ldc);
        return;
    }

    for j in 0..n {
        for i in 0..m {
            let mut sum = T::zero();
            for l in 0..k {
                sum = sum + fetch(op_a, a, lda, i, l) * fetch(op_b, b, ldb, l, j);
            }
            let cij = &mut c[i + j * ldc];
            *cij = if beta == T::zero() {
                alpha * sum
            } else if beta == T::one() {
                alpha * sum + *cij
            } else {
                alpha * sum + beta * *cij
            };
        }
    }
}

/// `C = beta * C`
fn scale_columns<T: Scalar>(m: usize, n: usize, beta: T, c: &mut [T], ldc: usize) {
    if beta == T::one() {
        return;
    }
    for j in 0..n {
        for v in &mut c[j * ldc..j * ldc + m] {
            *v = if beta == T::zero() { T::zero() } else { beta * *v };
        }
    }
}

#[cfg(feature = "blas")]
#[allow(clippy::too_many_arguments)]
fn blas_gemm<T: Scalar>(
    op_a: Op,
    op_b: Op,
    m: usize,
    n: usize,
    k: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    b: &[T],
    ldb: usize,
    beta: T,
    c: &mut [T],
    ldc: usize,
) -> bool {
    use crate::blas::{blas_kind, BlasKind};
    use cblas::{Layout, Transpose};
    use num_complex::{Complex32, Complex64};

    let Some(kind) = blas_kind::<T>() else {
        return false;
    };
    let limit = i32::MAX as usize;
    if [m, n, k, lda, ldb, ldc].iter().any(|&d| d > limit) {
        return false;
    }
    let trans = |op: Op| match op {
        Op::N => Transpose::None,
        Op::T => Transpose::Ordinary,
        Op::C => Transpose::Conjugate,
    };
    let (ta, tb) = (trans(op_a), trans(op_b));
    let (m, n, k) = (m as i32, n as i32, k as i32);
    let (lda, ldb, ldc) = (lda as i32, ldb as i32, ldc as i32);

    macro_rules! call {
        ($f:path, $t:ty) => {{
            let alpha = std::mem::transmute_copy::<T, $t>(&alpha);
            let beta = std::mem::transmute_copy::<T, $t>(&beta);
            let a = std::slice::from_raw_parts(a.as_ptr() as *const $t, a.len());
            let b = std::slice::from_raw_parts(b.as_ptr() as *const $t, b.len());
            let c = std::slice::from_raw_parts_mut(c.as_mut_ptr() as *mut $t, c.len());
            $f(Layout::ColumnMajor, ta, tb, m, n, k, alpha, a, lda, b, ldb, beta, c, ldc);
        }};
    }

    // SAFETY: `blas_kind` matched `T` against the concrete type, so every
    // reinterpretation below is an identity cast; extents were validated by `gemm`.
    unsafe {
        match kind {
            BlasKind::Double => call!(cblas::dgemm, f64),
            BlasKind::Single => call!(cblas::sgemm, f32),
            BlasKind::ComplexDouble => call!(cblas::zgemm, Complex64),
            BlasKind::ComplexSingle => call!(cblas::cgemm, Complex32),
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{Property, Uplo};
    use crate::ErrorKind;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    fn general(m: usize, n: usize, data: Vec<f64>) -> DenseMatrix<'static, f64> {
        DenseMatrix::wrap_owned(m, n, data, m, Property::general()).unwrap()
    }

    #[test]
    fn test_generic_gemm_basic() {
        // A = [1 3; 2 4], B = [5 7; 6 8] column-major
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [0.0; 4];
        generic_gemm(Op::N, Op::N, 2, 2, 2, 1.0, &a, 2, &b, 2, 0.0, &mut c, 2);
        assert_eq!(c, [23.0, 34.0, 31.0, 46.0]);
    }

    #[test]
    fn test_generic_gemm_alpha_beta() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [1.0; 4];
        generic_gemm(Op::N, Op::N, 2, 2, 2, 2.0, &a, 2, &b, 2, 3.0, &mut c, 2);
        assert_eq!(c, [49.0, 71.0, 65.0, 95.0]);

        // alpha = 0 only scales C
        generic_gemm(Op::N, Op::N, 2, 2, 2, 0.0, &a, 2, &b, 2, 2.0, &mut c, 2);
        assert_eq!(c, [98.0, 142.0, 130.0, 190.0]);
    }

    #[test]
    fn test_generic_gemm_transposed() {
        // A is 3x2, op(A) = A^T is 2x3; B is 3x2
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let mut c = [0.0; 4];
        generic_gemm(Op::T, Op::N, 2, 2, 3, 1.0, &a, 3, &b, 3, 0.0, &mut c, 2);
        assert_eq!(c, [4.0, 10.0, 2.0, 5.0]);
    }

    #[test]
    fn test_generic_gemm_conjugate() {
        let a = [Complex64::new(0.0, 1.0)];
        let b = [Complex64::new(0.0, 1.0)];
        let mut c = [Complex64::new(0.0, 0.0)];
        generic_gemm(Op::C, Op::N, 1, 1, 1, Complex64::new(1.0, 0.0), &a, 1, &b, 1, Complex64::new(0.0, 0.0), &mut c, 1);
        assert_eq!(c[0], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_mult_general() {
        let a = general(2, 3, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        let b = general(3, 2, vec![7.0, 9.0, 11.0, 8.0, 10.0, 12.0]);
        let mut c = DenseMatrix::<f64>::new(2, 2, Property::general()).unwrap();
        mult(1.0, Op::N, a.as_ref(), Op::N, b.as_ref(), 0.0, &mut c).unwrap();
        assert_eq!(c.as_slice(), &[58.0, 139.0, 64.0, 154.0]);
    }

    #[test]
    fn test_mult_symmetric_operand() {
        let s = DenseMatrix::<f64>::from_fn(3, 3, Property::symmetric(Uplo::Lower), |i, j| (1 + i + 3 * j) as f64)
            .unwrap();
        let full = s.convert_to_general().unwrap();
        let b = general(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let mut c1 = DenseMatrix::<f64>::new(3, 2, Property::general()).unwrap();
        let mut c2 = DenseMatrix::<f64>::new(3, 2, Property::general()).unwrap();
        // the operation of a symmetric operand is ignored
        mult(1.0, Op::T, s.as_ref(), Op::N, b.as_ref(), 0.0, &mut c1).unwrap();
        mult(1.0, Op::N, full.as_ref(), Op::N, b.as_ref(), 0.0, &mut c2).unwrap();
        for (x, y) in c1.as_slice().iter().zip(c2.as_slice()) {
            assert_relative_eq!(*x, *y);
        }
    }

    #[test]
    fn test_mult_triangular_transposed() {
        let t = DenseMatrix::<f64>::from_fn(2, 2, Property::triangular(Uplo::Upper), |_, _| 1.0).unwrap();
        let b = general(2, 1, vec![1.0, 2.0]);
        let mut c = DenseMatrix::<f64>::new(2, 1, Property::general()).unwrap();
        // [1 0; 1 1] * [1; 2]
        mult(1.0, Op::T, t.as_ref(), Op::N, b.as_ref(), 0.0, &mut c).unwrap();
        assert_eq!(c.as_slice(), &[1.0, 3.0]);
    }

    #[test]
    fn test_mult_rejects() {
        let s = DenseMatrix::<f64>::new(2, 2, Property::symmetric(Uplo::Upper)).unwrap();
        let g = DenseMatrix::<f64>::new(2, 2, Property::general()).unwrap();
        let mut c = DenseMatrix::<f64>::new(2, 2, Property::general()).unwrap();

        let err = mult(1.0, Op::N, s.as_ref(), Op::N, s.as_ref(), 0.0, &mut c).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Property);

        let err = mult(1.0, Op::N, s.as_ref(), Op::T, g.as_ref(), 0.0, &mut c).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);

        let mut bad = DenseMatrix::<f64>::new(3, 2, Property::general()).unwrap();
        let err = mult(1.0, Op::N, g.as_ref(), Op::N, g.as_ref(), 0.0, &mut bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dimension);
    }
}
