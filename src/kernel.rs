//! Dense kernel routines on column-major buffers.
//!
//! These mirror the fixed-signature routines of a LAPACK-style kernel library
//! (`lacpy`, `laset`, `omatcopy`, `lange`, `lansy`, `lanhe`, `lantr`). A matrix
//! argument is the triple `(slice, ld)` plus its logical extent; entry `(i,j)`
//! lives at `i + j * ld`.
//!
//! Routines validate their arguments and report a bad one the way the kernel
//! library does: `Err(-k)` where `k` is the 1-based position of the argument.
//! Callers turn a non-zero status into a crate error with
//! [`crate::checks::check_info`].

use crate::property::Uplo;
use crate::scalar::{FloatScalar, RealScalar, Scalar};
use num_traits::Zero;
use std::cmp::Ordering;

/// Status of a kernel call. `Err(info)` carries the kernel info code.
pub type Status<T = ()> = std::result::Result<T, i32>;

/// Side tile used by the out-of-place transposition.
const TRANSPOSE_TILE: usize = 32;

// ============================================================================
// Selectors
// ============================================================================

/// Operation applied to an operand.
///
/// This corresponds to the kernel transpose character:
/// - 'N': No transpose
/// - 'T': Transpose
/// - 'C': Conjugate transpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Op {
    #[default]
    N,
    T,
    C,
}

impl Op {
    /// Convert to the kernel character representation.
    pub fn to_char(self) -> char {
        match self {
            Op::N => 'N',
            Op::T => 'T',
            Op::C => 'C',
        }
    }

    /// Transpose or conjugate transpose.
    pub fn is_transpose(self) -> bool {
        self != Op::N
    }

    pub fn is_conjugate(self) -> bool {
        self == Op::C
    }
}

/// Norm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Norm {
    /// Maximum column sum ('1' or 'O').
    One,
    /// Maximum row sum ('I').
    Inf,
    /// Largest absolute entry ('M'). Not a consistent matrix norm.
    Max,
    /// Frobenius norm ('F' or 'E').
    Fro,
}

impl Norm {
    pub fn to_char(self) -> char {
        match self {
            Norm::One => '1',
            Norm::Inf => 'I',
            Norm::Max => 'M',
            Norm::Fro => 'F',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            '1' | 'O' => Some(Norm::One),
            'I' => Some(Norm::Inf),
            'M' => Some(Norm::Max),
            'F' | 'E' => Some(Norm::Fro),
            _ => None,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Minimum slice length holding an `m x n` matrix with leading dimension `ld`.
#[inline]
pub fn required_len(m: usize, n: usize, ld: usize) -> usize {
    if m == 0 || n == 0 {
        0
    } else {
        ld * (n - 1) + m
    }
}

/// Validate a matrix argument whose leading dimension is argument number `ld_pos`
/// and whose data is argument number `ld_pos - 1`.
#[inline]
pub(crate) fn check_matrix_arg(m: usize, n: usize, len: usize, ld: usize, ld_pos: i32) -> Status {
    if ld < m.max(1) {
        return Err(-ld_pos);
    }
    if len < required_len(m, n, ld) {
        return Err(-(ld_pos - 1));
    }
    Ok(())
}

/// Larger of `acc` and `v`. A NaN candidate wins so that it propagates.
#[inline]
pub(crate) fn fmax<R: PartialOrd>(acc: R, v: R) -> R {
    match v.partial_cmp(&acc) {
        Some(Ordering::Greater) | None => v,
        _ => acc,
    }
}

/// Scaled sum of squares, `scale^2 * ssq == sum |x|^2`, robust against overflow.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScaledSum<R> {
    scale: R,
    ssq: R,
}

impl<R: RealScalar> ScaledSum<R> {
    pub(crate) fn new() -> Self {
        Self {
            scale: R::zero(),
            ssq: R::one(),
        }
    }

    #[inline]
    fn add_real(&mut self, x: R) {
        if x == R::zero() {
            return;
        }
        let ax = x.abs();
        if self.scale < ax {
            let r = self.scale / ax;
            self.ssq = R::one() + self.ssq * r * r;
            self.scale = ax;
        } else {
            let r = ax / self.scale;
            self.ssq = self.ssq + r * r;
        }
    }

    /// Accumulate `|v|^2`; complex values contribute both parts.
    #[inline]
    pub(crate) fn add<T: Scalar<Real = R>>(&mut self, v: T) {
        self.add_real(v.re());
        if T::IS_COMPLEX {
            self.add_real(v.im());
        }
    }

    /// Count everything accumulated so far twice.
    pub(crate) fn double(&mut self) {
        self.ssq = self.ssq + self.ssq;
    }

    pub(crate) fn finish<T: FloatScalar<Real = R>>(self) -> R {
        self.scale * T::sqrt_real(self.ssq)
    }
}

// ============================================================================
// Copy / set
// ============================================================================

/// `B = coeff * A` over the part of the `m x n` extent selected by `uplo`.
#[allow(clippy::too_many_arguments)]
pub fn lacpy<T: Scalar>(
    uplo: Uplo,
    m: usize,
    n: usize,
    a: &[T],
    lda: usize,
    b: &mut [T],
    ldb: usize,
    coeff: T,
) -> Status {
    check_matrix_arg(m, n, a.len(), lda, 5)?;
    check_matrix_arg(m, n, b.len(), ldb, 7)?;

    for j in 0..n {
        let (ibgn, iend) = uplo.row_range(m, j);
        if ibgn >= iend {
            continue;
        }
        let src = &a[j * lda + ibgn..j * lda + iend];
        let dst = &mut b[j * ldb + ibgn..j * ldb + iend];
        if coeff == T::one() {
            dst.copy_from_slice(src);
        } else {
            for (d, &s) in dst.iter_mut().zip(src) {
                *d = coeff * s;
            }
        }
    }
    Ok(())
}

/// Set the off-diagonal entries of the `uplo` part to `offdiag` and the diagonal to `diag`.
pub fn laset<T: Scalar>(
    uplo: Uplo,
    m: usize,
    n: usize,
    offdiag: T,
    diag: T,
    a: &mut [T],
    lda: usize,
) -> Status {
    check_matrix_arg(m, n, a.len(), lda, 7)?;

    for j in 0..n {
        let (ibgn, iend) = uplo.row_range(m, j);
        for i in ibgn..iend {
            a[i + j * lda] = if i == j { diag } else { offdiag };
        }
    }
    Ok(())
}

/// Out-of-place `B = coeff * op(A)` where `A` is `m x n`.
///
/// `B` is `m x n` for [`Op::N`] and `n x m` otherwise. Transpositions walk
/// the source in square tiles so both buffers are read and written in
/// cache-sized pieces.
#[allow(clippy::too_many_arguments)]
pub fn omatcopy<T: Scalar>(
    op: Op,
    m: usize,
    n: usize,
    coeff: T,
    a: &[T],
    lda: usize,
    b: &mut [T],
    ldb: usize,
) -> Status {
    check_matrix_arg(m, n, a.len(), lda, 6)?;
    match op {
        Op::N => {
            check_matrix_arg(m, n, b.len(), ldb, 8)?;
            lacpy(Uplo::Full, m, n, a, lda, b, ldb, coeff)
        }
        Op::T | Op::C => {
            check_matrix_arg(n, m, b.len(), ldb, 8)?;
            let conj = op.is_conjugate();
            for jj in (0..n).step_by(TRANSPOSE_TILE) {
                let jend = (jj + TRANSPOSE_TILE).min(n);
                for ii in (0..m).step_by(TRANSPOSE_TILE) {
                    let iend = (ii + TRANSPOSE_TILE).min(m);
                    for j in jj..jend {
                        for i in ii..iend {
                            let v = a[i + j * lda];
                            let v = if conj { v.conj() } else { v };
                            b[j + i * ldb] = coeff * v;
                        }
                    }
                }
            }
            Ok(())
        }
    }
}

// ============================================================================
// Norms
// ============================================================================

/// Norm of the `uplo` part of an `m x n` extent, every stored entry counted once.
fn norm_region<T: FloatScalar>(
    norm: Norm,
    uplo: Uplo,
    m: usize,
    n: usize,
    a: &[T],
    lda: usize,
) -> T::Real {
    let zero = T::Real::zero();
    match norm {
        Norm::Max => {
            let mut value = zero;
            for j in 0..n {
                let (ibgn, iend) = uplo.row_range(m, j);
                for i in ibgn..iend {
                    value = fmax(value, a[i + j * lda].abs());
                }
            }
            value
        }
        Norm::One => {
            let mut value = zero;
            for j in 0..n {
                let (ibgn, iend) = uplo.row_range(m, j);
                let mut sum = zero;
                for i in ibgn..iend {
                    sum = sum + a[i + j * lda].abs();
                }
                value = fmax(value, sum);
            }
            value
        }
        Norm::Inf => {
            let mut work = vec![zero; m];
            for j in 0..n {
                let (ibgn, iend) = uplo.row_range(m, j);
                for i in ibgn..iend {
                    work[i] = work[i] + a[i + j * lda].abs();
                }
            }
            work.into_iter().fold(zero, fmax)
        }
        Norm::Fro => {
            let mut sum = ScaledSum::new();
            for j in 0..n {
                let (ibgn, iend) = uplo.row_range(m, j);
                for i in ibgn..iend {
                    sum.add(a[i + j * lda]);
                }
            }
            sum.finish::<T>()
        }
    }
}

/// Norm of a general `m x n` matrix.
pub fn lange<T: FloatScalar>(norm: Norm, m: usize, n: usize, a: &[T], lda: usize) -> Status<T::Real> {
    check_matrix_arg(m, n, a.len(), lda, 5)?;
    Ok(norm_region(norm, Uplo::Full, m, n, a, lda))
}

/// Norm of an `m x n` trapezoidal matrix stored in its `uplo` part (non-unit diagonal).
pub fn lantr<T: FloatScalar>(
    norm: Norm,
    uplo: Uplo,
    m: usize,
    n: usize,
    a: &[T],
    lda: usize,
) -> Status<T::Real> {
    if uplo == Uplo::Full {
        return Err(-2);
    }
    check_matrix_arg(m, n, a.len(), lda, 6)?;
    Ok(norm_region(norm, uplo, m, n, a, lda))
}

/// Norm of an `n x n` symmetric matrix stored in its `uplo` part.
pub fn lansy<T: FloatScalar>(norm: Norm, uplo: Uplo, n: usize, a: &[T], lda: usize) -> Status<T::Real> {
    if uplo == Uplo::Full {
        return Err(-2);
    }
    check_matrix_arg(n, n, a.len(), lda, 5)?;
    Ok(mirrored_norm(norm, uplo, n, a, lda, |v: T| v))
}

/// Norm of an `n x n` hermitian matrix stored in its `uplo` part.
///
/// The imaginary part of the diagonal is ignored.
pub fn lanhe<T: FloatScalar>(norm: Norm, uplo: Uplo, n: usize, a: &[T], lda: usize) -> Status<T::Real> {
    if uplo == Uplo::Full {
        return Err(-2);
    }
    check_matrix_arg(n, n, a.len(), lda, 5)?;
    Ok(mirrored_norm(norm, uplo, n, a, lda, |v: T| T::from_re(v.re())))
}

/// Norm of a matrix whose unstored half mirrors the stored one up to conjugation.
/// Off-diagonal entries count twice, diagonal entries go through `diag` first.
fn mirrored_norm<T: FloatScalar>(
    norm: Norm,
    uplo: Uplo,
    n: usize,
    a: &[T],
    lda: usize,
    diag: impl Fn(T) -> T,
) -> T::Real {
    let zero = T::Real::zero();
    match norm {
        Norm::Max => {
            let mut value = zero;
            for j in 0..n {
                let (ibgn, iend) = uplo.row_range(n, j);
                for i in ibgn..iend {
                    let v = a[i + j * lda];
                    let v = if i == j { diag(v) } else { v };
                    value = fmax(value, v.abs());
                }
            }
            value
        }
        // symmetric structure: one and inf norms coincide
        Norm::One | Norm::Inf => {
            let mut work = vec![zero; n];
            for j in 0..n {
                let (ibgn, iend) = uplo.row_range(n, j);
                for i in ibgn..iend {
                    let v = a[i + j * lda];
                    if i == j {
                        work[j] = work[j] + diag(v).abs();
                    } else {
                        let absa = v.abs();
                        work[i] = work[i] + absa;
                        work[j] = work[j] + absa;
                    }
                }
            }
            work.into_iter().fold(zero, fmax)
        }
        Norm::Fro => {
            let mut sum = ScaledSum::new();
            for j in 0..n {
                let (ibgn, iend) = uplo.row_range(n, j);
                for i in ibgn..iend {
                    if i != j {
                        sum.add(a[i + j * lda]);
                    }
                }
            }
            sum.double();
            for j in 0..n {
                sum.add(diag(a[j + j * lda]));
            }
            sum.finish::<T>()
        }
    }
}
