//! Random sample data.
//!
//! Entries are drawn uniformly from `[low, high)`; complex kinds draw the real
//! and imaginary parts independently from the same range. Only the stored half
//! of a structural matrix is written, and the diagonal is normalized so that
//! the result satisfies its property: hermitian diagonals are real, skew
//! diagonals are zero.

use crate::checks::check_info;
use crate::element_op::diagonal_element;
use crate::kernel::check_matrix_arg;
use crate::property::Property;
use crate::scalar::Scalar;
use crate::{DenseError, Result};
use num_complex::Complex;
use rand::Rng;

/// Element kinds that can be sampled uniformly.
pub trait RandomScalar: Scalar {
    /// Range used when the caller gives none.
    fn default_range() -> (Self::Real, Self::Real);

    /// One sample with every part in `[low, high)`. Requires `low < high`.
    fn sample<R: Rng + ?Sized>(rng: &mut R, low: Self::Real, high: Self::Real) -> Self;
}

macro_rules! impl_random_real {
    ($($t:ty => ($lo:expr, $hi:expr)),*) => {
        $(
            impl RandomScalar for $t {
                fn default_range() -> ($t, $t) {
                    ($lo, $hi)
                }

                #[inline]
                fn sample<R: Rng + ?Sized>(rng: &mut R, low: $t, high: $t) -> $t {
                    rng.gen_range(low..high)
                }
            }
        )*
    };
}

impl_random_real!(
    i32 => (0, 100),
    i64 => (0, 100),
    f32 => (0.0, 1.0),
    f64 => (0.0, 1.0)
);

macro_rules! impl_random_complex {
    ($($t:ty),*) => {
        $(
            impl RandomScalar for Complex<$t> {
                fn default_range() -> ($t, $t) {
                    (0.0, 1.0)
                }

                #[inline]
                fn sample<R: Rng + ?Sized>(rng: &mut R, low: $t, high: $t) -> Self {
                    Complex::new(rng.gen_range(low..high), rng.gen_range(low..high))
                }
            }
        )*
    };
}

impl_random_complex!(f32, f64);

/// Fill the stored half of an `m x n` matrix with property `prop` with samples from `[low, high)`.
#[allow(clippy::too_many_arguments)]
pub fn fill_random<T: RandomScalar, R: Rng + ?Sized>(
    rng: &mut R,
    prop: Property,
    m: usize,
    n: usize,
    a: &mut [T],
    lda: usize,
    low: T::Real,
    high: T::Real,
) -> Result<()> {
    if low.partial_cmp(&high) != Some(std::cmp::Ordering::Less) {
        return Err(DenseError::InvalidArgument(format!(
            "empty sampling range [{low:?}, {high:?})"
        )));
    }
    check_info("rand", check_matrix_arg(m, n, a.len(), lda, 5))?;

    let uplo = prop.uplo();
    for j in 0..n {
        let (ibgn, iend) = uplo.row_range(m, j);
        for i in ibgn..iend {
            let v = T::sample(rng, low, high);
            a[i + j * lda] = if i == j { diagonal_element(v, prop.ptype()) } else { v };
        }
    }
    Ok(())
}
