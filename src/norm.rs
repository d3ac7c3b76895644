//! Property-aware matrix norms.
//!
//! General, symmetric, hermitian and triangular matrices go through the
//! LAPACK-style routines of [`crate::kernel`]. Skew matrices have no such
//! routine and are handled by a scan of the stored half; their diagonal is zero
//! by definition and never read.
//!
//! The symmetric/hermitian Frobenius norm switches to a plain double-counting
//! sum from `KernelConfig::frobenius_fallback_threshold` on.

use crate::blas;
use crate::checks::check_info;
use crate::config::KernelConfig;
use crate::kernel::{self, check_matrix_arg, fmax, Norm, ScaledSum};
use crate::property::{Prop, Property, Uplo};
use crate::scalar::{FloatScalar, Scalar};
use crate::{DenseError, Result};
use num_traits::Zero;

/// Norm `norm` of an `m x n` matrix with property `prop`. Empty matrices have norm zero.
pub fn norm<T: FloatScalar>(norm: Norm, prop: Property, m: usize, n: usize, a: &[T], lda: usize) -> Result<T::Real> {
    if m == 0 || n == 0 {
        return Ok(T::Real::zero());
    }
    let uplo = prop.uplo();
    match prop.ptype() {
        Prop::General => check_info("lange", kernel::lange(norm, m, n, a, lda)),
        Prop::Symmetric | Prop::Hermitian => {
            square(prop, m, n)?;
            let threshold = KernelConfig::global().frobenius_fallback_threshold;
            if norm == Norm::Fro && n >= threshold {
                tracing::debug!(n, threshold, property = %prop, "naive frobenius sum");
                check_info("norm", check_matrix_arg(n, n, a.len(), lda, 5))?;
                return Ok(naive_fro(prop, n, a, lda));
            }
            if prop.is_hermitian() {
                check_info("lanhe", kernel::lanhe(norm, uplo, n, a, lda))
            } else {
                check_info("lansy", kernel::lansy(norm, uplo, n, a, lda))
            }
        }
        Prop::Triangular => {
            // the stored part of a trapezoid never extends past min(m, n)
            // in the direction of its fill
            let k = m.min(n);
            let (rows, cols) = if uplo == Uplo::Upper { (k, n) } else { (m, k) };
            check_info("lantr", kernel::lantr(norm, uplo, rows, cols, a, lda))
        }
        Prop::Skew => {
            square(prop, m, n)?;
            check_info("norm", check_matrix_arg(n, n, a.len(), lda, 5))?;
            Ok(skew_norm(norm, uplo, n, a, lda))
        }
        Prop::Unset => Err(DenseError::Property(format!("invalid property {prop}"))),
    }
}

/// Maximum absolute column sum.
pub fn norm_one<T: FloatScalar>(prop: Property, m: usize, n: usize, a: &[T], lda: usize) -> Result<T::Real> {
    norm(Norm::One, prop, m, n, a, lda)
}

/// Maximum absolute row sum.
pub fn norm_inf<T: FloatScalar>(prop: Property, m: usize, n: usize, a: &[T], lda: usize) -> Result<T::Real> {
    norm(Norm::Inf, prop, m, n, a, lda)
}

/// Largest absolute entry.
pub fn norm_max<T: FloatScalar>(prop: Property, m: usize, n: usize, a: &[T], lda: usize) -> Result<T::Real> {
    norm(Norm::Max, prop, m, n, a, lda)
}

pub fn norm_fro<T: FloatScalar>(prop: Property, m: usize, n: usize, a: &[T], lda: usize) -> Result<T::Real> {
    norm(Norm::Fro, prop, m, n, a, lda)
}

/// Euclidean norm of a single column.
pub fn norm_euc<T: FloatScalar>(m: usize, n: usize, a: &[T], lda: usize) -> Result<T::Real> {
    if n > 1 {
        return Err(DenseError::Unsupported(format!(
            "euclidean norm is defined for single column objects, got {m}x{n}"
        )));
    }
    if m == 0 || n == 0 {
        return Ok(T::Real::zero());
    }
    check_info("nrm2", check_matrix_arg(m, n, a.len(), lda, 4))?;
    Ok(blas::nrm2(&a[..m]))
}

fn square(prop: Property, m: usize, n: usize) -> Result<()> {
    if m != n {
        return Err(DenseError::Dimension(format!(
            "{} matrices must be square, got {m}x{n}",
            prop.name()
        )));
    }
    Ok(())
}

/// `sqrt(sum_{i!=j} 2|a_ij|^2 + sum_i |a_ii|^2)` over the stored half.
fn naive_fro<T: FloatScalar>(prop: Property, n: usize, a: &[T], lda: usize) -> T::Real {
    let uplo = prop.uplo();
    let hermitian = prop.is_hermitian();
    let mut off = T::Real::zero();
    let mut diag = T::Real::zero();
    for j in 0..n {
        let (ibgn, iend) = uplo.row_range(n, j);
        for i in ibgn..iend {
            let v = a[i + j * lda];
            if i == j {
                let d = if hermitian { v.re().abs_sq() } else { v.abs_sq() };
                diag = diag + d;
            } else {
                off = off + v.abs_sq();
            }
        }
    }
    T::sqrt_real(off + off + diag)
}

/// Norm of a skew matrix from its stored half; the diagonal is taken as zero.
fn skew_norm<T: FloatScalar>(norm: Norm, uplo: Uplo, n: usize, a: &[T], lda: usize) -> T::Real {
    let zero = T::Real::zero();
    let off_diagonal = |j: usize| {
        let (ibgn, iend) = uplo.row_range(n, j);
        (ibgn..iend).filter(move |&i| i != j)
    };
    match norm {
        Norm::Max => {
            let mut value = zero;
            for j in 0..n {
                for i in off_diagonal(j) {
                    value = fmax(value, a[i + j * lda].abs());
                }
            }
            value
        }
        // |a_ji| = |a_ij|: column and row sums coincide
        Norm::One | Norm::Inf => {
            let mut work = vec![zero; n];
            for j in 0..n {
                for i in off_diagonal(j) {
                    let absa = a[i + j * lda].abs();
                    work[i] = work[i] + absa;
                    work[j] = work[j] + absa;
                }
            }
            work.into_iter().fold(zero, fmax)
        }
        Norm::Fro => {
            let mut sum = ScaledSum::new();
            for j in 0..n {
                for i in off_diagonal(j) {
                    sum.add(a[i + j * lda]);
                }
            }
            sum.double();
            sum.finish::<T>()
        }
    }
}
