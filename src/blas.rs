//! BLAS integration for contiguous column segments.
//!
//! The bulk kernels spend most of their time scaling contiguous column
//! pieces and the Euclidean norm is a single contiguous sweep. With the `blas`
//! feature these go through `cblas` for `f32`, `f64`, `Complex32` and
//! `Complex64`; every other kind, and every build without the feature, uses
//! the generic fallbacks below.

use crate::kernel::ScaledSum;
use crate::scalar::{FloatScalar, Scalar};
use std::any::TypeId;

/// Element kinds with a BLAS counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlasKind {
    Single,
    Double,
    ComplexSingle,
    ComplexDouble,
}

/// BLAS kind of `T`, if any.
pub fn blas_kind<T: 'static>() -> Option<BlasKind> {
    let id = TypeId::of::<T>();
    if id == TypeId::of::<f32>() {
        Some(BlasKind::Single)
    } else if id == TypeId::of::<f64>() {
        Some(BlasKind::Double)
    } else if id == TypeId::of::<num_complex::Complex32>() {
        Some(BlasKind::ComplexSingle)
    } else if id == TypeId::of::<num_complex::Complex64>() {
        Some(BlasKind::ComplexDouble)
    } else {
        None
    }
}

// ============================================================================
// BLAS-backed operations (feature-gated)
// ============================================================================

#[cfg(feature = "blas")]
mod blas_impl {
    use super::*;
    use num_complex::{Complex32, Complex64};

    /// BLAS scal: x = alpha * x. Returns `false` when `T` has no BLAS kind.
    pub fn blas_scal<T: Scalar>(alpha: T, x: &mut [T]) -> bool {
        let n = x.len() as i32;
        let ptr = x.as_mut_ptr();
        let len = x.len();

        // SAFETY: `blas_kind` matched `T` against the concrete type, so the
        // value and slice reinterpretations below are identity casts.
        unsafe {
            match blas_kind::<T>() {
                Some(BlasKind::Double) => {
                    let alpha = std::mem::transmute_copy::<T, f64>(&alpha);
                    let x = std::slice::from_raw_parts_mut(ptr as *mut f64, len);
                    cblas::dscal(n, alpha, x, 1);
                }
                Some(BlasKind::Single) => {
                    let alpha = std::mem::transmute_copy::<T, f32>(&alpha);
                    let x = std::slice::from_raw_parts_mut(ptr as *mut f32, len);
                    cblas::sscal(n, alpha, x, 1);
                }
                Some(BlasKind::ComplexDouble) => {
                    let alpha = std::mem::transmute_copy::<T, Complex64>(&alpha);
                    let x = std::slice::from_raw_parts_mut(ptr as *mut Complex64, len);
                    cblas::zscal(n, alpha, x, 1);
                }
                Some(BlasKind::ComplexSingle) => {
                    let alpha = std::mem::transmute_copy::<T, Complex32>(&alpha);
                    let x = std::slice::from_raw_parts_mut(ptr as *mut Complex32, len);
                    cblas::cscal(n, alpha, x, 1);
                }
                None => return false,
            }
        }
        true
    }

    /// BLAS nrm2: Euclidean norm of a contiguous slice.
    pub fn blas_nrm2<T: FloatScalar>(x: &[T]) -> Option<T::Real> {
        let n = x.len() as i32;
        let ptr = x.as_ptr();
        let len = x.len();

        // SAFETY: see `blas_scal`; the result kind matches `T::Real`.
        unsafe {
            match blas_kind::<T>()? {
                BlasKind::Double => {
                    let x = std::slice::from_raw_parts(ptr as *const f64, len);
                    let r = cblas::dnrm2(n, x, 1);
                    Some(std::mem::transmute_copy(&r))
                }
                BlasKind::Single => {
                    let x = std::slice::from_raw_parts(ptr as *const f32, len);
                    let r = cblas::snrm2(n, x, 1);
                    Some(std::mem::transmute_copy(&r))
                }
                BlasKind::ComplexDouble => {
                    let x = std::slice::from_raw_parts(ptr as *const Complex64, len);
                    let r = cblas::dznrm2(n, x, 1);
                    Some(std::mem::transmute_copy(&r))
                }
                BlasKind::ComplexSingle => {
                    let x = std::slice::from_raw_parts(ptr as *const Complex32, len);
                    let r = cblas::scnrm2(n, x, 1);
                    Some(std::mem::transmute_copy(&r))
                }
            }
        }
    }
}

#[cfg(feature = "blas")]
pub use blas_impl::{blas_nrm2, blas_scal};

// ============================================================================
// Generic fallback implementations (always available)
// ============================================================================

/// Generic scal: x = alpha * x
pub fn generic_scal<T: Scalar>(alpha: T, x: &mut [T]) {
    for v in x.iter_mut() {
        *v = alpha * *v;
    }
}

/// Generic nrm2 with overflow-safe scaling.
pub fn generic_nrm2<T: FloatScalar>(x: &[T]) -> T::Real {
    let mut sum = ScaledSum::new();
    for &v in x {
        sum.add(v);
    }
    sum.finish::<T>()
}

// ============================================================================
// Dispatch
// ============================================================================

/// x = alpha * x on a contiguous slice.
#[inline]
pub fn scal<T: Scalar>(alpha: T, x: &mut [T]) {
    #[cfg(feature = "blas")]
    {
        if x.len() <= i32::MAX as usize && blas_scal(alpha, x) {
            return;
        }
    }
    generic_scal(alpha, x)
}

/// Euclidean norm of a contiguous slice.
#[inline]
pub fn nrm2<T: FloatScalar>(x: &[T]) -> T::Real {
    #[cfg(feature = "blas")]
    {
        if x.len() <= i32::MAX as usize {
            if let Some(r) = blas_nrm2(x) {
                return r;
            }
        }
    }
    generic_nrm2(x)
}
