//! Property-driven bulk kernels on column-major buffers.
//!
//! Triangular regions are processed by divide and conquer: an `n x n`
//! triangle below the recursion threshold is handled column by column, larger
//! ones are split at `n0 = n/2` into two diagonal triangles (recursed) and one
//! off-diagonal rectangle (handled as a full block). The two diagonal halves
//! live in disjoint column ranges of the buffer, so with the `parallel` feature
//! they run concurrently through `rayon::join`.
//!
//! All entry points validate the buffer against `(m, n, ld)` and report a
//! mismatch as a kernel error; property checks happen one layer up.

use crate::blas;
use crate::checks::check_info;
use crate::config::KernelConfig;
use crate::element_op::{diagonal_element, Conj, ElementOp, Identity, Negate};
use crate::kernel::{self, check_matrix_arg, Op};
use crate::property::{Prop, Property, Uplo};
use crate::scalar::{ComplexScalar, Scalar};
use crate::{DenseError, Result};

// ============================================================================
// Recursion plumbing
// ============================================================================

/// Run two closures over disjoint data, concurrently when `parallel` is enabled.
#[inline]
fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    #[cfg(feature = "parallel")]
    {
        rayon::join(a, b)
    }
    #[cfg(not(feature = "parallel"))]
    {
        (a(), b())
    }
}

/// Recursion dispatch is logged at `trace` level, or at `debug` when the trace switch is on.
fn trace_recursion(kernel: &'static str, n: usize, threshold: usize) {
    let recursive = n >= threshold;
    if KernelConfig::global().trace {
        tracing::debug!(kernel, n, threshold, recursive, "triangular dispatch");
    } else {
        tracing::trace!(kernel, n, threshold, recursive, "triangular dispatch");
    }
}

/// Apply `f` to every stored column segment of an `n x n` triangle.
///
/// `f` receives contiguous pieces of columns; together they cover exactly the
/// `uplo` part of the triangle.
fn tri_apply<T, F>(uplo: Uplo, n: usize, a: &mut [T], lda: usize, threshold: usize, f: &F)
where
    T: Scalar,
    F: Fn(&mut [T]) + Sync,
{
    if n < threshold.max(2) {
        for j in 0..n {
            let (ibgn, iend) = uplo.row_range(n, j);
            f(&mut a[j * lda + ibgn..j * lda + iend]);
        }
        return;
    }

    let n0 = n / 2;
    let n1 = n - n0;
    let (left, right) = a.split_at_mut(n0 * lda);

    join(
        || tri_apply(uplo, n0, &mut *left, lda, threshold, f),
        || tri_apply(uplo, n1, &mut right[n0..], lda, threshold, f),
    );

    if uplo == Uplo::Upper {
        rect_apply(n0, n1, right, lda, f);
    } else {
        rect_apply(n1, n0, &mut left[n0..], lda, f);
    }
}

/// Apply `f` to every column of an `m x n` rectangle.
fn rect_apply<T, F>(m: usize, n: usize, a: &mut [T], lda: usize, f: &F)
where
    T: Scalar,
    F: Fn(&mut [T]),
{
    if m == 0 {
        return;
    }
    for j in 0..n {
        f(&mut a[j * lda..j * lda + m]);
    }
}

/// Apply `f` to the `uplo` part of an `m x n` (possibly trapezoidal) extent.
///
/// The square `k x k` head, `k = min(m, n)`, goes through the recursive
/// triangle; the remaining rectangle (columns `k..n` for upper, rows `k..m`
/// for lower) is processed as a full block.
fn region_apply<T, F>(uplo: Uplo, m: usize, n: usize, a: &mut [T], lda: usize, threshold: usize, f: &F)
where
    T: Scalar,
    F: Fn(&mut [T]) + Sync,
{
    match uplo {
        Uplo::Full => rect_apply(m, n, a, lda, f),
        Uplo::Upper | Uplo::Lower => {
            let k = m.min(n);
            tri_apply(uplo, k, a, lda, threshold, f);
            if uplo == Uplo::Upper && n > k {
                rect_apply(m, n - k, &mut a[k * lda..], lda, f);
            }
            if uplo == Uplo::Lower && m > k {
                rect_apply(m - k, n, &mut a[k..], lda, f);
            }
        }
    }
}

// ============================================================================
// Scale / conjugate / fill
// ============================================================================

/// `A = coeff * A` over the `uplo` part of an `m x n` extent.
///
/// `coeff == 1` returns immediately, `coeff == 0` writes zeros.
pub fn scale<T: Scalar>(uplo: Uplo, m: usize, n: usize, a: &mut [T], lda: usize, coeff: T) -> Result<()> {
    scale_with(uplo, m, n, a, lda, coeff, KernelConfig::global().recursion_threshold)
}

fn scale_with<T: Scalar>(
    uplo: Uplo,
    m: usize,
    n: usize,
    a: &mut [T],
    lda: usize,
    coeff: T,
    threshold: usize,
) -> Result<()> {
    check_info("scale", check_matrix_arg(m, n, a.len(), lda, 5))?;
    if m == 0 || n == 0 || coeff == T::one() {
        return Ok(());
    }
    if coeff == T::zero() {
        return zero(uplo, m, n, a, lda);
    }
    trace_recursion("scale", m.min(n), threshold);
    region_apply(uplo, m, n, a, lda, threshold, &|col: &mut [T]| blas::scal(coeff, col));
    Ok(())
}

/// `A = coeff * conj(A)` over the `uplo` part of an `m x n` extent.
pub fn conjugate<T: ComplexScalar>(
    uplo: Uplo,
    m: usize,
    n: usize,
    a: &mut [T],
    lda: usize,
    coeff: T,
) -> Result<()> {
    conjugate_with(uplo, m, n, a, lda, coeff, KernelConfig::global().recursion_threshold)
}

fn conjugate_with<T: ComplexScalar>(
    uplo: Uplo,
    m: usize,
    n: usize,
    a: &mut [T],
    lda: usize,
    coeff: T,
    threshold: usize,
) -> Result<()> {
    check_info("conjugate", check_matrix_arg(m, n, a.len(), lda, 5))?;
    if m == 0 || n == 0 {
        return Ok(());
    }
    if coeff == T::zero() {
        return zero(uplo, m, n, a, lda);
    }
    trace_recursion("conjugate", m.min(n), threshold);
    region_apply(uplo, m, n, a, lda, threshold, &|col: &mut [T]| {
        for v in col.iter_mut() {
            *v = coeff * v.conj();
        }
    });
    Ok(())
}

/// Fill the `uplo` part with `val`, writing `dval` on the diagonal.
pub fn fill<T: Scalar>(uplo: Uplo, m: usize, n: usize, a: &mut [T], lda: usize, val: T, dval: T) -> Result<()> {
    check_info("laset", kernel::laset(uplo, m, n, val, dval, a, lda))
}

/// Zero the `uplo` part.
pub fn zero<T: Scalar>(uplo: Uplo, m: usize, n: usize, a: &mut [T], lda: usize) -> Result<()> {
    fill(uplo, m, n, a, lda, T::zero(), T::zero())
}

/// Fill a matrix with property `prop` so that it satisfies the structure:
/// hermitian diagonals keep only the real part of `val`, skew diagonals are zero.
pub fn fill_property<T: Scalar>(prop: Property, m: usize, n: usize, a: &mut [T], lda: usize, val: T) -> Result<()> {
    let dval = diagonal_element(val, prop.ptype());
    fill(prop.uplo(), m, n, a, lda, val, dval)
}

// ============================================================================
// Copy / transpose
// ============================================================================

/// `B = coeff * A` over the `uplo` part of an `m x n` extent.
#[allow(clippy::too_many_arguments)]
pub fn copy<T: Scalar>(
    uplo: Uplo,
    m: usize,
    n: usize,
    a: &[T],
    lda: usize,
    b: &mut [T],
    ldb: usize,
    coeff: T,
) -> Result<()> {
    check_info("lacpy", kernel::lacpy(uplo, m, n, a, lda, b, ldb, coeff))
}

/// `B = coeff * A^T` where `A` is `m x n` and `B` is `n x m`.
pub fn transpose<T: Scalar>(m: usize, n: usize, a: &[T], lda: usize, b: &mut [T], ldb: usize, coeff: T) -> Result<()> {
    check_info("omatcopy", kernel::omatcopy(Op::T, m, n, coeff, a, lda, b, ldb))
}

/// `B = coeff * A^H` where `A` is `m x n` and `B` is `n x m`.
pub fn conjugate_transpose<T: ComplexScalar>(
    m: usize,
    n: usize,
    a: &[T],
    lda: usize,
    b: &mut [T],
    ldb: usize,
    coeff: T,
) -> Result<()> {
    check_info("omatcopy", kernel::omatcopy(Op::C, m, n, coeff, a, lda, b, ldb))
}

/// `B += alpha * A` over the `uplo` part of an `m x n` extent.
#[allow(clippy::too_many_arguments)]
pub fn update<T: Scalar>(
    uplo: Uplo,
    m: usize,
    n: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    b: &mut [T],
    ldb: usize,
) -> Result<()> {
    check_info("update", check_matrix_arg(m, n, a.len(), lda, 5))?;
    check_info("update", check_matrix_arg(m, n, b.len(), ldb, 7))?;
    for j in 0..n {
        let (ibgn, iend) = uplo.row_range(m, j);
        let src = &a[j * lda + ibgn..j * lda + iend];
        let dst = &mut b[j * ldb + ibgn..j * ldb + iend];
        for (d, &s) in dst.iter_mut().zip(src) {
            *d = *d + alpha * s;
        }
    }
    Ok(())
}

// ============================================================================
// Structural to general expansion
// ============================================================================

/// Materialize the unstored half of an `n x n` matrix, in place.
fn xx2ge_with<T: Scalar, F: ElementOp>(uplo: Uplo, n: usize, a: &mut [T], lda: usize, threshold: usize) -> Result<()> {
    check_info("xx2ge", check_matrix_arg(n, n, a.len(), lda, 4))?;
    if uplo == Uplo::Full {
        return Err(DenseError::Property(
            "structural expansion needs an upper or lower fill".into(),
        ));
    }
    trace_recursion("xx2ge", n, threshold);
    xx2ge_rec::<T, F>(uplo, n, a, lda, threshold)
}

fn xx2ge_rec<T: Scalar, F: ElementOp>(uplo: Uplo, n: usize, a: &mut [T], lda: usize, threshold: usize) -> Result<()> {
    if n < threshold.max(2) {
        for j in 0..n {
            let (ibgn, iend) = uplo.row_range(n, j);
            for i in ibgn..iend {
                if i == j {
                    a[j + j * lda] = F::diag(a[j + j * lda]);
                } else {
                    a[j + i * lda] = F::apply(a[i + j * lda]);
                }
            }
        }
        return Ok(());
    }

    let n0 = n / 2;
    let n1 = n - n0;
    let (left, right) = a.split_at_mut(n0 * lda);

    let (r0, r1) = join(
        || xx2ge_rec::<T, F>(uplo, n0, &mut *left, lda, threshold),
        || xx2ge_rec::<T, F>(uplo, n1, &mut right[n0..], lda, threshold),
    );
    r0?;
    r1?;

    // mirror the stored off-diagonal rectangle into its transpose position
    let status = match uplo {
        Uplo::Upper => kernel::omatcopy(F::TRANSPOSE, n0, n1, F::coeff(), right, lda, &mut left[n0..], lda),
        _ => kernel::omatcopy(F::TRANSPOSE, n1, n0, F::coeff(), &left[n0..], lda, right, lda),
    };
    check_info("omatcopy", status)
}

/// Symmetric to general: `A[j,i] = A[i,j]`.
pub fn sy2ge<T: Scalar>(uplo: Uplo, n: usize, a: &mut [T], lda: usize) -> Result<()> {
    xx2ge_with::<T, Identity>(uplo, n, a, lda, KernelConfig::global().recursion_threshold)
}

/// Hermitian to general: `A[j,i] = conj(A[i,j])`, imaginary part of the diagonal cleared.
pub fn he2ge<T: ComplexScalar>(uplo: Uplo, n: usize, a: &mut [T], lda: usize) -> Result<()> {
    xx2ge_with::<T, Conj>(uplo, n, a, lda, KernelConfig::global().recursion_threshold)
}

/// Skew to general: `A[j,i] = -A[i,j]`, diagonal zeroed.
pub fn ss2ge<T: Scalar>(uplo: Uplo, n: usize, a: &mut [T], lda: usize) -> Result<()> {
    xx2ge_with::<T, Negate>(uplo, n, a, lda, KernelConfig::global().recursion_threshold)
}

/// Triangular to general: zero the complement of the `uplo` part of an `m x n` extent.
pub fn tr2ge<T: Scalar>(uplo: Uplo, m: usize, n: usize, a: &mut [T], lda: usize) -> Result<()> {
    check_info("tr2ge", check_matrix_arg(m, n, a.len(), lda, 5))?;
    for j in 0..n {
        let (ibgn, iend) = match uplo {
            Uplo::Upper => ((j + 1).min(m), m),
            Uplo::Lower => (0, j.min(m)),
            Uplo::Full => (0, 0),
        };
        for v in &mut a[j * lda + ibgn..j * lda + iend] {
            *v = T::zero();
        }
    }
    Ok(())
}

/// Expand a matrix with property `prop` to a general one, in place.
///
/// Hermitian expansion conjugates; a hermitian property on a non-complex kind
/// never passes the consistency checks, and for such kinds conjugation is the
/// identity anyway.
pub fn to_general<T: Scalar>(prop: Property, m: usize, n: usize, a: &mut [T], lda: usize) -> Result<()> {
    let threshold = KernelConfig::global().recursion_threshold;
    match prop.ptype() {
        Prop::General => Ok(()),
        Prop::Symmetric => xx2ge_with::<T, Identity>(prop.uplo(), n, a, lda, threshold),
        Prop::Hermitian => xx2ge_with::<T, Conj>(prop.uplo(), n, a, lda, threshold),
        Prop::Skew => xx2ge_with::<T, Negate>(prop.uplo(), n, a, lda, threshold),
        Prop::Triangular => tr2ge(prop.uplo(), m, n, a, lda),
        Prop::Unset => Err(DenseError::Property(format!("invalid property {prop}"))),
    }
}

// ============================================================================
// Real / imaginary parts
// ============================================================================

/// `B = re(A)` over the `uplo` part.
#[allow(clippy::too_many_arguments)]
pub fn get_real<T: ComplexScalar>(
    uplo: Uplo,
    m: usize,
    n: usize,
    a: &[T],
    lda: usize,
    b: &mut [T::Real],
    ldb: usize,
) -> Result<()> {
    map_parts(uplo, m, n, a, lda, b, ldb, |v: T| v.re())
}

/// `B = im(A)` over the `uplo` part.
#[allow(clippy::too_many_arguments)]
pub fn get_imag<T: ComplexScalar>(
    uplo: Uplo,
    m: usize,
    n: usize,
    a: &[T],
    lda: usize,
    b: &mut [T::Real],
    ldb: usize,
) -> Result<()> {
    map_parts(uplo, m, n, a, lda, b, ldb, |v: T| v.im())
}

/// `re(B) = A` over the `uplo` part, imaginary parts kept.
#[allow(clippy::too_many_arguments)]
pub fn set_real<T: ComplexScalar>(
    uplo: Uplo,
    m: usize,
    n: usize,
    a: &[T::Real],
    lda: usize,
    b: &mut [T],
    ldb: usize,
) -> Result<()> {
    zip_parts(uplo, m, n, a, lda, b, ldb, |r, v: T| T::from_parts(r, v.im()))
}

/// `im(B) = A` over the `uplo` part, real parts kept.
#[allow(clippy::too_many_arguments)]
pub fn set_imag<T: ComplexScalar>(
    uplo: Uplo,
    m: usize,
    n: usize,
    a: &[T::Real],
    lda: usize,
    b: &mut [T],
    ldb: usize,
) -> Result<()> {
    zip_parts(uplo, m, n, a, lda, b, ldb, |r, v: T| T::from_parts(v.re(), r))
}

#[allow(clippy::too_many_arguments)]
fn map_parts<T: Scalar, U: Scalar>(
    uplo: Uplo,
    m: usize,
    n: usize,
    a: &[T],
    lda: usize,
    b: &mut [U],
    ldb: usize,
    f: impl Fn(T) -> U,
) -> Result<()> {
    check_info("copy", check_matrix_arg(m, n, a.len(), lda, 5))?;
    check_info("copy", check_matrix_arg(m, n, b.len(), ldb, 7))?;
    for j in 0..n {
        let (ibgn, iend) = uplo.row_range(m, j);
        for i in ibgn..iend {
            b[i + j * ldb] = f(a[i + j * lda]);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn zip_parts<T: Scalar, U: Scalar>(
    uplo: Uplo,
    m: usize,
    n: usize,
    a: &[U],
    lda: usize,
    b: &mut [T],
    ldb: usize,
    f: impl Fn(U, T) -> T,
) -> Result<()> {
    check_info("copy", check_matrix_arg(m, n, a.len(), lda, 5))?;
    check_info("copy", check_matrix_arg(m, n, b.len(), ldb, 7))?;
    for j in 0..n {
        let (ibgn, iend) = uplo.row_range(m, j);
        for i in ibgn..iend {
            let k = i + j * ldb;
            b[k] = f(a[i + j * lda], b[k]);
        }
    }
    Ok(())
}
