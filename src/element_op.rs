//! Element-wise operations used to mirror the stored half of a structural matrix.
//!
//! When the unstored half of a matrix is materialised, each off-diagonal entry
//! `a(i,j)` is written to `(j,i)` through one of three operations:
//! - `identity` for symmetric matrices
//! - `conj` for hermitian matrices
//! - `neg` for skew matrices
//!
//! The operation also decides what happens to the diagonal: untouched,
//! imaginary part cleared, or zeroed. Operations are types so the kernels
//! monomorphize per structure instead of branching per element.

use crate::kernel::Op;
use crate::property::Prop;
use crate::scalar::Scalar;

/// Mirror operation applied when writing `(j,i)` from `(i,j)`.
pub trait ElementOp: Copy + Default + Send + Sync + 'static {
    /// Apply the operation to an off-diagonal value.
    fn apply<T: Scalar>(value: T) -> T;

    /// Normalize a diagonal value so it satisfies the structure.
    fn diag<T: Scalar>(value: T) -> T;

    /// Transposition that mirrors a whole rectangle: `B = coeff() * op(A)`.
    const TRANSPOSE: Op;

    fn coeff<T: Scalar>() -> T;
}

/// `f(x) = x`. Symmetric mirror.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

/// `f(x) = conj(x)`. Hermitian mirror, real diagonal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Conj;

/// `f(x) = -x`. Skew mirror, zero diagonal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Negate;

impl ElementOp for Identity {
    const TRANSPOSE: Op = Op::T;

    fn coeff<T: Scalar>() -> T {
        T::one()
    }

    #[inline(always)]
    fn apply<T: Scalar>(value: T) -> T {
        value
    }

    #[inline(always)]
    fn diag<T: Scalar>(value: T) -> T {
        value
    }
}

impl ElementOp for Conj {
    const TRANSPOSE: Op = Op::C;

    fn coeff<T: Scalar>() -> T {
        T::one()
    }

    #[inline(always)]
    fn apply<T: Scalar>(value: T) -> T {
        value.conj()
    }

    #[inline(always)]
    fn diag<T: Scalar>(value: T) -> T {
        T::from_re(value.re())
    }
}

impl ElementOp for Negate {
    const TRANSPOSE: Op = Op::T;

    fn coeff<T: Scalar>() -> T {
        -T::one()
    }

    #[inline(always)]
    fn apply<T: Scalar>(value: T) -> T {
        -value
    }

    #[inline(always)]
    fn diag<T: Scalar>(_value: T) -> T {
        T::zero()
    }
}

/// Value stored at `(j,i)` for a matrix of type `ptype` holding `value` at `(i,j)`.
///
/// Runtime counterpart of [`ElementOp::apply`] for loops that are not worth
/// monomorphizing (permutations).
#[inline]
pub fn opposite_element<T: Scalar>(value: T, ptype: Prop) -> T {
    match ptype {
        Prop::Hermitian => Conj::apply(value),
        Prop::Skew => Negate::apply(value),
        _ => Identity::apply(value),
    }
}

/// Value stored on the diagonal of a matrix of type `ptype` when `value` is requested.
#[inline]
pub fn diagonal_element<T: Scalar>(value: T, ptype: Prop) -> T {
    match ptype {
        Prop::Hermitian => Conj::diag(value),
        Prop::Skew => Negate::diag(value),
        _ => Identity::diag(value),
    }
}
