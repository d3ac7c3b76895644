//! Permutations and the kernels that apply them to column-major buffers.
//!
//! A general matrix accepts a row permutation `P` and/or a column permutation
//! `Q`: `B[P[i], Q[j]] = A[i, j]`. Symmetric, hermitian and skew matrices only
//! accept similarity permutations `P*A*P'`, which are applied to the stored
//! half alone: an entry whose image would land in the unstored half is written
//! at the mirrored position through the structure's mirror operation instead.

use crate::checks::check_info;
use crate::element_op::opposite_element;
use crate::kernel::{self, check_matrix_arg};
use crate::property::{Prop, Property, Uplo};
use crate::scalar::Scalar;
use crate::{DenseError, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::Index;

/// A bijection on `0..n`, stored as the image of every index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Permutation {
    map: Vec<usize>,
}

impl Permutation {
    /// The identity permutation of size `n`.
    pub fn identity(n: usize) -> Self {
        Self {
            map: (0..n).collect(),
        }
    }

    /// Uniformly random permutation of size `n`.
    pub fn random(n: usize) -> Self {
        Self::random_with(&mut rand::thread_rng(), n)
    }

    /// Uniformly random permutation of size `n` drawn from `rng` (Fisher-Yates).
    pub fn random_with<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Self {
        let mut map: Vec<usize> = (0..n).collect();
        map.shuffle(rng);
        Self { map }
    }

    /// Build from explicit images; fails unless `map` is a bijection on `0..map.len()`.
    pub fn from_vec(map: Vec<usize>) -> Result<Self> {
        let n = map.len();
        let mut seen = vec![false; n];
        for (i, &p) in map.iter().enumerate() {
            if p >= n {
                return Err(DenseError::InvalidArgument(format!(
                    "permutation entry {i} maps to {p}, outside 0..{n}"
                )));
            }
            if std::mem::replace(&mut seen[p], true) {
                return Err(DenseError::InvalidArgument(format!(
                    "permutation image {p} appears more than once"
                )));
            }
        }
        Ok(Self { map })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Image of `i`.
    #[inline]
    pub fn get(&self, i: usize) -> Option<usize> {
        self.map.get(i).copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.map
    }

    /// The inverse permutation, `inv[P[i]] = i`.
    pub fn inverse(&self) -> Self {
        let mut map = vec![0; self.len()];
        for (i, &p) in self.map.iter().enumerate() {
            map[p] = i;
        }
        Self { map }
    }

    /// The composition `P * self`: applying the result equals applying `self`, then `p`.
    pub fn permute_left(&self, p: &Permutation) -> Result<Self> {
        if p.len() != self.len() {
            return Err(DenseError::Dimension(format!(
                "cannot compose permutations of sizes {} and {}",
                p.len(),
                self.len()
            )));
        }
        Ok(Self {
            map: self.map.iter().map(|&i| p.map[i]).collect(),
        })
    }

    /// In-place `self = P * self`.
    pub fn ipermute_left(&mut self, p: &Permutation) -> Result<()> {
        *self = self.permute_left(p)?;
        Ok(())
    }
}

impl Index<usize> for Permutation {
    type Output = usize;

    fn index(&self, i: usize) -> &usize {
        &self.map[i]
    }
}

// ============================================================================
// Kernels
// ============================================================================

/// `B = P * A * Q` for an `m x n` matrix with property `prop`.
///
/// `None` stands for the identity. General matrices use both sides;
/// symmetric, hermitian and skew matrices take `p` as a similarity
/// permutation and ignore `q`. `B` receives the same property as `A`.
#[allow(clippy::too_many_arguments)]
pub fn permute<T: Scalar>(
    prop: Property,
    m: usize,
    n: usize,
    a: &[T],
    lda: usize,
    b: &mut [T],
    ldb: usize,
    p: Option<&Permutation>,
    q: Option<&Permutation>,
) -> Result<()> {
    check_info("permute", check_matrix_arg(m, n, a.len(), lda, 5))?;
    check_info("permute", check_matrix_arg(m, n, b.len(), ldb, 7))?;
    if m == 0 || n == 0 {
        return Ok(());
    }
    if p.is_some_and(|p| p.len() != m) || q.is_some_and(|q| q.len() != n) {
        return Err(DenseError::Dimension(format!(
            "permutation sizes do not match the {m}x{n} matrix"
        )));
    }

    match prop.ptype() {
        Prop::General => {
            match (p, q) {
                (Some(p), Some(q)) => {
                    for j in 0..n {
                        let qj = q[j];
                        for i in 0..m {
                            b[p[i] + qj * ldb] = a[i + j * lda];
                        }
                    }
                }
                (Some(p), None) => {
                    for j in 0..n {
                        for i in 0..m {
                            b[p[i] + j * ldb] = a[i + j * lda];
                        }
                    }
                }
                (None, Some(q)) => {
                    for j in 0..n {
                        let qj = q[j];
                        b[qj * ldb..qj * ldb + m].copy_from_slice(&a[j * lda..j * lda + m]);
                    }
                }
                (None, None) => {
                    check_info("lacpy", kernel::lacpy(Uplo::Full, m, n, a, lda, b, ldb, T::one()))?;
                }
            }
            Ok(())
        }
        Prop::Symmetric | Prop::Hermitian | Prop::Skew => {
            if m != n {
                return Err(DenseError::Dimension(format!(
                    "{} matrices must be square, got {m}x{n}",
                    prop.name()
                )));
            }
            match p {
                Some(p) => permute_mirror(prop, n, a, lda, b, ldb, p),
                None => check_info("lacpy", kernel::lacpy(prop.uplo(), m, n, a, lda, b, ldb, T::one()))?,
            }
            Ok(())
        }
        Prop::Triangular | Prop::Unset => Err(DenseError::Property(format!(
            "permutation not defined for {prop} matrices"
        ))),
    }
}

/// Similarity permutation of the stored half, keeping the fill side.
fn permute_mirror<T: Scalar>(prop: Property, n: usize, a: &[T], lda: usize, b: &mut [T], ldb: usize, p: &Permutation) {
    let uplo = prop.uplo();
    let ptype = prop.ptype();
    for j in 0..n {
        let pj = p[j];
        let (ibgn, iend) = uplo.row_range(n, j);
        for i in ibgn..iend {
            let pi = p[i];
            let aij = a[i + j * lda];
            let flipped = match uplo {
                Uplo::Upper => pj < pi,
                Uplo::Lower => pj > pi,
                Uplo::Full => false,
            };
            if flipped {
                b[pj + pi * ldb] = opposite_element(aij, ptype);
            } else {
                b[pi + pj * ldb] = aij;
            }
        }
    }
}
