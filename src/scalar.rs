//! Element kinds supported by the dense kernels.
//!
//! Three capability levels are exposed as traits so that operations which are
//! undefined for a kind do not compile against it:
//!
//! - [`Scalar`]: every element kind (`i32`, `i64`, `f32`, `f64`, `Complex32`, `Complex64`).
//!   Enough for copy, scale, fill, permute and structural expansion.
//! - [`FloatScalar`]: floating point kinds. Required by the norm engine.
//! - [`ComplexScalar`]: complex kinds. Required by conjugation and real/imaginary splits.

use num_complex::Complex;
use num_traits::{One, Zero};
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Closed capability set shared by all element kinds.
pub trait Scalar:
    Copy
    + Send
    + Sync
    + Debug
    + Default
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + Zero
    + One
    + 'static
{
    /// The matching real kind (`Self` for non-complex kinds).
    type Real: RealScalar;

    /// `true` for complex kinds.
    const IS_COMPLEX: bool;

    /// Complex conjugate; identity for non-complex kinds.
    fn conj(self) -> Self;

    /// Absolute value (modulus for complex kinds).
    fn abs(self) -> Self::Real;

    /// Squared absolute value.
    fn abs_sq(self) -> Self::Real;

    /// Real part.
    fn re(self) -> Self::Real;

    /// Imaginary part; zero for non-complex kinds.
    fn im(self) -> Self::Real;

    /// Embed a real value.
    fn from_re(re: Self::Real) -> Self;
}

/// Non-complex kinds, used as the real counterpart of every [`Scalar`].
pub trait RealScalar: Scalar<Real = Self> + PartialOrd + Div<Output = Self> {}

/// Floating point kinds, real or complex.
pub trait FloatScalar: Scalar {
    /// Square root in the real counterpart.
    fn sqrt_real(x: Self::Real) -> Self::Real;
}

/// Complex kinds.
pub trait ComplexScalar: FloatScalar {
    fn from_parts(re: Self::Real, im: Self::Real) -> Self;
}

macro_rules! impl_scalar_real {
    ($($t:ty => $abs:expr),*) => {
        $(
            impl Scalar for $t {
                type Real = $t;
                const IS_COMPLEX: bool = false;

                #[inline(always)]
                fn conj(self) -> Self { self }
                #[inline(always)]
                fn abs(self) -> Self { ($abs)(self) }
                #[inline(always)]
                fn abs_sq(self) -> Self { self * self }
                #[inline(always)]
                fn re(self) -> Self { self }
                #[inline(always)]
                fn im(self) -> Self { <$t as Zero>::zero() }
                #[inline(always)]
                fn from_re(re: Self) -> Self { re }
            }

            impl RealScalar for $t {}
        )*
    };
}

impl_scalar_real!(
    i32 => i32::abs,
    i64 => i64::abs,
    f32 => f32::abs,
    f64 => f64::abs
);

macro_rules! impl_scalar_complex {
    ($($t:ty),*) => {
        $(
            impl FloatScalar for $t {
                #[inline(always)]
                fn sqrt_real(x: $t) -> $t { x.sqrt() }
            }

            impl Scalar for Complex<$t> {
                type Real = $t;
                const IS_COMPLEX: bool = true;

                #[inline(always)]
                fn conj(self) -> Self { Complex::conj(&self) }
                #[inline(always)]
                fn abs(self) -> $t { self.norm() }
                #[inline(always)]
                fn abs_sq(self) -> $t { self.norm_sqr() }
                #[inline(always)]
                fn re(self) -> $t { self.re }
                #[inline(always)]
                fn im(self) -> $t { self.im }
                #[inline(always)]
                fn from_re(re: $t) -> Self { Complex::new(re, 0.0) }
            }

            impl FloatScalar for Complex<$t> {
                #[inline(always)]
                fn sqrt_real(x: $t) -> $t { x.sqrt() }
            }

            impl ComplexScalar for Complex<$t> {
                #[inline(always)]
                fn from_parts(re: $t, im: $t) -> Self { Complex::new(re, im) }
            }
        )*
    };
}

impl_scalar_complex!(f32, f64);
