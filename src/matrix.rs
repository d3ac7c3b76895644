//! Dense matrix objects: owning/borrowing matrices and read-only views.
//!
//! [`DenseMatrix`] either owns its buffer or borrows a caller's buffer
//! mutably. Aliases produced by [`DenseMatrix::rcopy`] and
//! [`DenseMatrix::block_mut`] are themselves `DenseMatrix` values borrowing the
//! source, so the source cannot be touched, moved or cleared while they live.
//! [`MatrixRef`] is the shared read-only view every non-mutating operation is
//! written against; [`Guard`] wraps one and is only handed out by
//! [`DenseMatrix::rcopy_const`] and the `block_ref` methods.

use crate::checks::{self, BlockPart};
use crate::element_op::{diagonal_element, Conj, ElementOp};
use crate::kernel::required_len;
use crate::norm;
use crate::perm::{self, Permutation};
use crate::property::Property;
use crate::random::{self, RandomScalar};
use crate::scalar::{ComplexScalar, FloatScalar, Scalar};
use crate::{bulk, DenseError, Result};
use rand::Rng;
use std::ops::{Deref, Index, IndexMut, Range};

#[derive(Debug)]
enum Storage<'a, T> {
    Empty,
    Owned(Vec<T>),
    Borrowed(&'a mut [T]),
}

impl<T> Storage<'_, T> {
    fn as_slice(&self) -> &[T] {
        match self {
            Storage::Empty => &[],
            Storage::Owned(v) => v.as_slice(),
            Storage::Borrowed(s) => &s[..],
        }
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        match self {
            Storage::Empty => &mut [],
            Storage::Owned(v) => v.as_mut_slice(),
            Storage::Borrowed(s) => &mut s[..],
        }
    }
}

/// Property of a sub-block and the buffer range holding it.
#[allow(clippy::too_many_arguments)]
fn block_extent(
    prop: Property,
    nrows: usize,
    ncols: usize,
    ld: usize,
    ibgn: usize,
    jbgn: usize,
    ni: usize,
    nj: usize,
) -> Result<(Property, Range<usize>)> {
    if ni == 0 || nj == 0 {
        return Err(DenseError::Dimension(format!("zero-sized block ({ni}x{nj})")));
    }
    let derived = checks::block_property(prop, nrows, ncols, ibgn, jbgn, ni, nj)?;
    let offset = ibgn + jbgn * ld;
    Ok((derived, offset..offset + required_len(ni, nj, ld)))
}

// ============================================================================
// MatrixRef
// ============================================================================

/// Read-only view of a column-major matrix.
#[derive(Debug, Clone, Copy)]
pub struct MatrixRef<'a, T> {
    data: &'a [T],
    nrows: usize,
    ncols: usize,
    ld: usize,
    prop: Property,
}

impl<'a, T: Scalar> MatrixRef<'a, T> {
    /// View `data` as an `nrows x ncols` matrix with leading dimension `ld`.
    pub fn new(nrows: usize, ncols: usize, data: &'a [T], ld: usize, prop: Property) -> Result<Self> {
        checks::dense_consistency::<T>(prop, nrows, ncols, data.len(), ld)?;
        Ok(Self {
            data,
            nrows,
            ncols,
            ld,
            prop,
        })
    }

    fn empty() -> Self {
        Self {
            data: &[],
            nrows: 0,
            ncols: 0,
            ld: 0,
            prop: Property::invalid(),
        }
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn ld(&self) -> usize {
        self.ld
    }

    #[inline]
    pub fn prop(&self) -> Property {
        self.prop
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nrows == 0 || self.ncols == 0
    }

    /// The backing slice, starting at entry `(0,0)`.
    #[inline]
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Entry `(i,j)` as stored. Entries outside the stored half are returned as-is.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<T> {
        if i < self.nrows && j < self.ncols {
            Some(self.data[i + j * self.ld])
        } else {
            None
        }
    }

    /// Deep copy into a new owned matrix with `ld == nrows`.
    ///
    /// Only the stored half is copied; the other half of the result is zero.
    pub fn copy(&self) -> DenseMatrix<'static, T> {
        if self.is_empty() {
            return DenseMatrix::empty();
        }
        let (m, n) = (self.nrows, self.ncols);
        let mut data = vec![T::zero(); m * n];
        for j in 0..n {
            let (ibgn, iend) = self.prop.uplo().row_range(m, j);
            data[j * m + ibgn..j * m + iend].copy_from_slice(&self.data[j * self.ld + ibgn..j * self.ld + iend]);
        }
        DenseMatrix::from_parts(m, n, m, self.prop, Storage::Owned(data))
    }

    /// `coeff * A` as a new matrix.
    pub fn scaled(&self, coeff: T) -> Result<DenseMatrix<'static, T>> {
        let mut out = self.copy();
        out.scale(coeff)?;
        Ok(out)
    }

    /// `A^T` as a new general matrix. Only general matrices can be transposed.
    pub fn transpose(&self) -> Result<DenseMatrix<'static, T>> {
        if self.is_empty() {
            return Ok(DenseMatrix::empty());
        }
        checks::transpose_check(self.prop, false)?;
        let mut out = DenseMatrix::new(self.ncols, self.nrows, Property::general())?;
        bulk::transpose(self.nrows, self.ncols, self.data, self.ld, out.as_mut_slice(), self.ncols, T::one())?;
        Ok(out)
    }

    /// Copy with the unstored half materialized.
    pub fn convert_to_general(&self) -> Result<DenseMatrix<'static, T>> {
        let mut out = self.copy();
        out.convert_to_general_in_place()?;
        Ok(out)
    }

    fn sub(&self, ibgn: usize, jbgn: usize, ni: usize, nj: usize) -> Result<MatrixRef<'a, T>> {
        let (prop, range) = block_extent(self.prop, self.nrows, self.ncols, self.ld, ibgn, jbgn, ni, nj)?;
        let data: &'a [T] = self.data;
        Ok(MatrixRef {
            data: &data[range],
            nrows: ni,
            ncols: nj,
            ld: self.ld,
            prop,
        })
    }

    /// Deep copy of the `ni x nj` block starting at `(ibgn, jbgn)`.
    pub fn block(&self, ibgn: usize, jbgn: usize, ni: usize, nj: usize) -> Result<DenseMatrix<'static, T>> {
        Ok(self.sub(ibgn, jbgn, ni, nj)?.copy())
    }

    /// Read-only alias of the `ni x nj` block starting at `(ibgn, jbgn)`.
    pub fn block_ref(&self, ibgn: usize, jbgn: usize, ni: usize, nj: usize) -> Result<Guard<'a, T>> {
        Ok(Guard {
            view: self.sub(ibgn, jbgn, ni, nj)?,
        })
    }

    fn permuted(&self, p: Option<&Permutation>, q: Option<&Permutation>) -> Result<DenseMatrix<'static, T>> {
        let mut out = DenseMatrix::new(self.nrows, self.ncols, self.prop)?;
        let m = self.nrows;
        perm::permute(self.prop, m, self.ncols, self.data, self.ld, out.as_mut_slice(), m, p, q)?;
        Ok(out)
    }

    /// `P * A * Q` for a general matrix; `None` means identity.
    pub fn permute(&self, p: Option<&Permutation>, q: Option<&Permutation>) -> Result<DenseMatrix<'static, T>> {
        match (p, q) {
            (Some(p), Some(q)) => self.permute_left_right(p, q),
            (Some(p), None) => self.permute_left(p),
            (None, Some(q)) => self.permute_right(q),
            (None, None) => Ok(self.copy()),
        }
    }

    /// `P * A * Q`: `B[P[i], Q[j]] = A[i, j]`.
    pub fn permute_left_right(&self, p: &Permutation, q: &Permutation) -> Result<DenseMatrix<'static, T>> {
        if self.is_empty() {
            checks::perm_op_check(0, 0, p.len(), q.len())?;
            return Ok(DenseMatrix::empty());
        }
        checks::perm_ge_check(self.prop, self.nrows, self.ncols, p.len(), q.len())?;
        self.permuted(Some(p), Some(q))
    }

    /// Row permutation `P * A`.
    pub fn permute_left(&self, p: &Permutation) -> Result<DenseMatrix<'static, T>> {
        if self.is_empty() {
            checks::perm_op_check(0, 0, p.len(), 0)?;
            return Ok(DenseMatrix::empty());
        }
        checks::perm_ge_check(self.prop, self.nrows, self.ncols, p.len(), self.ncols)?;
        self.permuted(Some(p), None)
    }

    /// Column permutation `A * Q`.
    pub fn permute_right(&self, q: &Permutation) -> Result<DenseMatrix<'static, T>> {
        if self.is_empty() {
            checks::perm_op_check(0, 0, 0, q.len())?;
            return Ok(DenseMatrix::empty());
        }
        checks::perm_ge_check(self.prop, self.nrows, self.ncols, self.nrows, q.len())?;
        self.permuted(None, Some(q))
    }

    /// Similarity permutation `P * A * P^T`; the result keeps the property of `A`.
    pub fn permute_similarity(&self, p: &Permutation) -> Result<DenseMatrix<'static, T>> {
        if self.is_empty() {
            checks::perm_op_check(0, 0, p.len(), p.len())?;
            return Ok(DenseMatrix::empty());
        }
        checks::perm_similarity_check(self.prop, self.nrows, self.ncols, p.len())?;
        if self.prop.is_general() {
            self.permuted(Some(p), Some(p))
        } else {
            self.permuted(Some(p), None)
        }
    }
}

impl<T: FloatScalar> MatrixRef<'_, T> {
    pub fn norm_one(&self) -> Result<T::Real> {
        norm::norm_one(self.prop, self.nrows, self.ncols, self.data, self.ld)
    }

    pub fn norm_inf(&self) -> Result<T::Real> {
        norm::norm_inf(self.prop, self.nrows, self.ncols, self.data, self.ld)
    }

    pub fn norm_max(&self) -> Result<T::Real> {
        norm::norm_max(self.prop, self.nrows, self.ncols, self.data, self.ld)
    }

    pub fn norm_fro(&self) -> Result<T::Real> {
        norm::norm_fro(self.prop, self.nrows, self.ncols, self.data, self.ld)
    }

    /// Euclidean norm; single column only.
    pub fn norm_euc(&self) -> Result<T::Real> {
        norm::norm_euc(self.nrows, self.ncols, self.data, self.ld)
    }
}

impl<T: ComplexScalar> MatrixRef<'_, T> {
    /// `conj(A)` as a new matrix.
    pub fn conjugated(&self) -> Result<DenseMatrix<'static, T>> {
        let mut out = self.copy();
        out.conjugate()?;
        Ok(out)
    }

    /// `A^H` as a new general matrix.
    pub fn conjugate_transpose(&self) -> Result<DenseMatrix<'static, T>> {
        if self.is_empty() {
            return Ok(DenseMatrix::empty());
        }
        checks::transpose_check(self.prop, true)?;
        let mut out = DenseMatrix::new(self.ncols, self.nrows, Property::general())?;
        bulk::conjugate_transpose(self.nrows, self.ncols, self.data, self.ld, out.as_mut_slice(), self.ncols, T::one())?;
        Ok(out)
    }

    /// Real part; the real part of a hermitian matrix is symmetric.
    pub fn real_part(&self) -> Result<DenseMatrix<'static, T::Real>> {
        if self.is_empty() {
            return Ok(DenseMatrix::empty());
        }
        let mut out = DenseMatrix::new(self.nrows, self.ncols, self.prop.real_part())?;
        let m = self.nrows;
        bulk::get_real(self.prop.uplo(), m, self.ncols, self.data, self.ld, out.as_mut_slice(), m)?;
        Ok(out)
    }

    /// Imaginary part; the imaginary part of a hermitian matrix is skew.
    pub fn imag_part(&self) -> Result<DenseMatrix<'static, T::Real>> {
        if self.is_empty() {
            return Ok(DenseMatrix::empty());
        }
        let mut out = DenseMatrix::new(self.nrows, self.ncols, self.prop.imag_part())?;
        let m = self.nrows;
        bulk::get_imag(self.prop.uplo(), m, self.ncols, self.data, self.ld, out.as_mut_slice(), m)?;
        Ok(out)
    }

    pub fn real_block(&self, ibgn: usize, jbgn: usize, ni: usize, nj: usize) -> Result<DenseMatrix<'static, T::Real>> {
        self.sub(ibgn, jbgn, ni, nj)?.real_part()
    }

    pub fn imag_block(&self, ibgn: usize, jbgn: usize, ni: usize, nj: usize) -> Result<DenseMatrix<'static, T::Real>> {
        self.sub(ibgn, jbgn, ni, nj)?.imag_part()
    }
}

impl<T> Index<(usize, usize)> for MatrixRef<'_, T> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        assert!(i < self.nrows && j < self.ncols, "index ({i},{j}) out of bounds");
        &self.data[i + j * self.ld]
    }
}

// ============================================================================
// Guard
// ============================================================================

/// Immutable alias of a matrix or of one of its blocks.
#[derive(Debug, Clone, Copy)]
pub struct Guard<'a, T> {
    view: MatrixRef<'a, T>,
}

impl<'a, T> Guard<'a, T> {
    /// The guarded view.
    pub fn get(&self) -> &MatrixRef<'a, T> {
        &self.view
    }
}

impl<'a, T> Deref for Guard<'a, T> {
    type Target = MatrixRef<'a, T>;

    fn deref(&self) -> &MatrixRef<'a, T> {
        &self.view
    }
}

// ============================================================================
// DenseMatrix
// ============================================================================

/// A column-major matrix that owns its storage or borrows it mutably.
///
/// The empty state (`0 x 0`, no storage) is what [`DenseMatrix::clear`] and
/// [`DenseMatrix::move_out`] leave behind.
#[derive(Debug)]
pub struct DenseMatrix<'a, T> {
    nrows: usize,
    ncols: usize,
    ld: usize,
    prop: Property,
    storage: Storage<'a, T>,
}

impl<T> Default for DenseMatrix<'_, T> {
    fn default() -> Self {
        Self {
            nrows: 0,
            ncols: 0,
            ld: 0,
            prop: Property::invalid(),
            storage: Storage::Empty,
        }
    }
}

impl<'a, T: Scalar> DenseMatrix<'a, T> {
    fn from_parts(nrows: usize, ncols: usize, ld: usize, prop: Property, storage: Storage<'a, T>) -> Self {
        Self {
            nrows,
            ncols,
            ld,
            prop,
            storage,
        }
    }

    /// The empty matrix.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Zero-filled `nrows x ncols` matrix. A zero dimension gives the empty matrix.
    pub fn new(nrows: usize, ncols: usize, prop: Property) -> Result<Self> {
        if nrows == 0 || ncols == 0 {
            return Ok(Self::empty());
        }
        checks::property_compatibility::<T>(prop, nrows, ncols)?;
        Ok(Self::from_parts(
            nrows,
            ncols,
            nrows,
            prop,
            Storage::Owned(vec![T::zero(); nrows * ncols]),
        ))
    }

    pub fn zeros(nrows: usize, ncols: usize, prop: Property) -> Result<Self> {
        Self::new(nrows, ncols, prop)
    }

    /// Matrix whose stored half is `f(i, j)`.
    ///
    /// Diagonal values are normalized to the property: hermitian diagonals keep
    /// their real part, skew diagonals are zero.
    pub fn from_fn(nrows: usize, ncols: usize, prop: Property, mut f: impl FnMut(usize, usize) -> T) -> Result<Self> {
        let mut out = Self::new(nrows, ncols, prop)?;
        let uplo = prop.uplo();
        let data = out.storage.as_mut_slice();
        for j in 0..ncols {
            let (ibgn, iend) = uplo.row_range(nrows, j);
            for i in ibgn..iend {
                let v = f(i, j);
                data[i + j * nrows] = if i == j { diagonal_element(v, prop.ptype()) } else { v };
            }
        }
        Ok(out)
    }

    /// Take ownership of `data` laid out with leading dimension `ld`.
    pub fn wrap_owned(nrows: usize, ncols: usize, data: Vec<T>, ld: usize, prop: Property) -> Result<Self> {
        checks::dense_consistency::<T>(prop, nrows, ncols, data.len(), ld)?;
        Ok(Self::from_parts(nrows, ncols, ld, prop, Storage::Owned(data)))
    }

    /// Borrow `data` laid out with leading dimension `ld`. Clearing the result
    /// leaves `data` alone.
    pub fn wrap(nrows: usize, ncols: usize, data: &'a mut [T], ld: usize, prop: Property) -> Result<Self> {
        checks::dense_consistency::<T>(prop, nrows, ncols, data.len(), ld)?;
        Ok(Self::from_parts(nrows, ncols, ld, prop, Storage::Borrowed(data)))
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn ld(&self) -> usize {
        self.ld
    }

    #[inline]
    pub fn prop(&self) -> Property {
        self.prop
    }

    /// Whether dropping or clearing this matrix frees its buffer.
    #[inline]
    pub fn is_owner(&self) -> bool {
        matches!(self.storage, Storage::Owned(_))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nrows == 0 || self.ncols == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.storage.as_slice()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.storage.as_mut_slice()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<T> {
        self.as_ref().get(i, j)
    }

    #[inline]
    pub fn entry_mut(&mut self, i: usize, j: usize) -> Option<&mut T> {
        if i < self.nrows && j < self.ncols {
            let k = i + j * self.ld;
            Some(&mut self.storage.as_mut_slice()[k])
        } else {
            None
        }
    }

    /// Read-only view.
    pub fn as_ref(&self) -> MatrixRef<'_, T> {
        if self.is_empty() {
            return MatrixRef::empty();
        }
        MatrixRef {
            data: self.storage.as_slice(),
            nrows: self.nrows,
            ncols: self.ncols,
            ld: self.ld,
            prop: self.prop,
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Deep copy into a new owned matrix.
    pub fn copy(&self) -> DenseMatrix<'static, T> {
        self.as_ref().copy()
    }

    /// Mutable alias sharing this matrix's storage.
    pub fn rcopy(&mut self) -> DenseMatrix<'_, T> {
        if self.is_empty() {
            return DenseMatrix::empty();
        }
        let (nrows, ncols, ld, prop) = (self.nrows, self.ncols, self.ld, self.prop);
        DenseMatrix::from_parts(nrows, ncols, ld, prop, Storage::Borrowed(self.storage.as_mut_slice()))
    }

    /// Immutable alias sharing this matrix's storage.
    pub fn rcopy_const(&self) -> Guard<'_, T> {
        Guard { view: self.as_ref() }
    }

    /// Move the contents out, leaving `self` empty.
    pub fn move_out(&mut self) -> DenseMatrix<'a, T> {
        std::mem::take(self)
    }

    /// Release the storage (if owned) and reset to the empty state.
    pub fn clear(&mut self) {
        *self = Self::empty();
    }

    // ------------------------------------------------------------------------
    // Bulk operations
    // ------------------------------------------------------------------------

    /// Fill the stored half with `val`; hermitian diagonals get `re(val)`, skew diagonals zero.
    pub fn fill(&mut self, val: T) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let (m, n, ld, prop) = (self.nrows, self.ncols, self.ld, self.prop);
        bulk::fill_property(prop, m, n, self.storage.as_mut_slice(), ld, val)
    }

    /// `A = coeff * A` over the stored half.
    pub fn scale(&mut self, coeff: T) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let (m, n, ld, uplo) = (self.nrows, self.ncols, self.ld, self.prop.uplo());
        bulk::scale(uplo, m, n, self.storage.as_mut_slice(), ld, coeff)
    }

    pub fn scaled(&self, coeff: T) -> Result<DenseMatrix<'static, T>> {
        self.as_ref().scaled(coeff)
    }

    pub fn transpose(&self) -> Result<DenseMatrix<'static, T>> {
        self.as_ref().transpose()
    }

    pub fn convert_to_general(&self) -> Result<DenseMatrix<'static, T>> {
        self.as_ref().convert_to_general()
    }

    /// Materialize the unstored half and mark the matrix general.
    pub fn convert_to_general_in_place(&mut self) -> Result<()> {
        if self.is_empty() || self.prop.is_general() {
            return Ok(());
        }
        let (m, n, ld, prop) = (self.nrows, self.ncols, self.ld, self.prop);
        bulk::to_general(prop, m, n, self.storage.as_mut_slice(), ld)?;
        self.prop = Property::general();
        Ok(())
    }

    /// `A += alpha * other` over the stored half; shapes and properties must match.
    pub fn update(&mut self, alpha: T, other: MatrixRef<'_, T>) -> Result<()> {
        checks::similarity_check(self.prop, self.nrows, self.ncols, other.prop, other.nrows, other.ncols)?;
        if self.is_empty() {
            return Ok(());
        }
        let (m, n, ld, uplo) = (self.nrows, self.ncols, self.ld, self.prop.uplo());
        bulk::update(uplo, m, n, alpha, other.data, other.ld, self.storage.as_mut_slice(), ld)
    }

    /// `alpha * a + beta * b` as a new matrix.
    pub fn sum(alpha: T, a: MatrixRef<'_, T>, beta: T, b: MatrixRef<'_, T>) -> Result<DenseMatrix<'static, T>> {
        checks::similarity_check(a.prop, a.nrows, a.ncols, b.prop, b.nrows, b.ncols)?;
        let mut out = a.scaled(alpha)?;
        out.update(beta, b)?;
        Ok(out)
    }

    // ------------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------------

    pub fn block(&self, ibgn: usize, jbgn: usize, ni: usize, nj: usize) -> Result<DenseMatrix<'static, T>> {
        self.as_ref().block(ibgn, jbgn, ni, nj)
    }

    pub fn block_ref(&self, ibgn: usize, jbgn: usize, ni: usize, nj: usize) -> Result<Guard<'_, T>> {
        self.as_ref().block_ref(ibgn, jbgn, ni, nj)
    }

    /// Mutable alias of the `ni x nj` block starting at `(ibgn, jbgn)`.
    pub fn block_mut(&mut self, ibgn: usize, jbgn: usize, ni: usize, nj: usize) -> Result<DenseMatrix<'_, T>> {
        let ld = self.ld;
        let (prop, range) = block_extent(self.prop, self.nrows, self.ncols, ld, ibgn, jbgn, ni, nj)?;
        let data = &mut self.storage.as_mut_slice()[range];
        Ok(DenseMatrix::from_parts(ni, nj, ld, prop, Storage::Borrowed(data)))
    }

    /// Overwrite the block at `(ibgn, jbgn)` with `src`.
    ///
    /// `src.prop()` must equal the property derived for the target region.
    pub fn set_block(&mut self, ibgn: usize, jbgn: usize, src: MatrixRef<'_, T>) -> Result<()> {
        checks::set_block_check(
            src.prop,
            self.prop,
            self.nrows,
            self.ncols,
            ibgn,
            jbgn,
            src.nrows,
            src.ncols,
            BlockPart::Whole,
        )?;
        let ld = self.ld;
        let dst = &mut self.storage.as_mut_slice()[ibgn + jbgn * ld..];
        bulk::copy(src.prop.uplo(), src.nrows, src.ncols, src.data, src.ld, dst, ld, T::one())
    }

    // ------------------------------------------------------------------------
    // Permutations
    // ------------------------------------------------------------------------

    pub fn permute(&self, p: Option<&Permutation>, q: Option<&Permutation>) -> Result<DenseMatrix<'static, T>> {
        self.as_ref().permute(p, q)
    }

    pub fn permute_left_right(&self, p: &Permutation, q: &Permutation) -> Result<DenseMatrix<'static, T>> {
        self.as_ref().permute_left_right(p, q)
    }

    pub fn permute_left(&self, p: &Permutation) -> Result<DenseMatrix<'static, T>> {
        self.as_ref().permute_left(p)
    }

    pub fn permute_right(&self, q: &Permutation) -> Result<DenseMatrix<'static, T>> {
        self.as_ref().permute_right(q)
    }

    pub fn permute_similarity(&self, p: &Permutation) -> Result<DenseMatrix<'static, T>> {
        self.as_ref().permute_similarity(p)
    }

    /// Overwrite the stored half with the same half of `src` (`src.ld == nrows`).
    fn assign(&mut self, src: &DenseMatrix<'_, T>) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let (m, n, ld, uplo) = (self.nrows, self.ncols, self.ld, self.prop.uplo());
        bulk::copy(uplo, m, n, src.as_slice(), src.ld, self.storage.as_mut_slice(), ld, T::one())
    }

    pub fn ipermute_left_right(&mut self, p: &Permutation, q: &Permutation) -> Result<()> {
        let tmp = self.permute_left_right(p, q)?;
        self.assign(&tmp)
    }

    pub fn ipermute_left(&mut self, p: &Permutation) -> Result<()> {
        let tmp = self.permute_left(p)?;
        self.assign(&tmp)
    }

    pub fn ipermute_right(&mut self, q: &Permutation) -> Result<()> {
        let tmp = self.permute_right(q)?;
        self.assign(&tmp)
    }

    pub fn ipermute_similarity(&mut self, p: &Permutation) -> Result<()> {
        let tmp = self.permute_similarity(p)?;
        self.assign(&tmp)
    }
}

impl<T: RandomScalar> DenseMatrix<'_, T> {
    /// Random matrix with entries in the default range of `T`.
    pub fn random(nrows: usize, ncols: usize, prop: Property) -> Result<Self> {
        let (low, high) = T::default_range();
        Self::random_with(&mut rand::thread_rng(), nrows, ncols, prop, low, high)
    }

    /// Random matrix with entries drawn from `rng` in `[low, high)`.
    pub fn random_with<R: Rng + ?Sized>(
        rng: &mut R,
        nrows: usize,
        ncols: usize,
        prop: Property,
        low: T::Real,
        high: T::Real,
    ) -> Result<Self> {
        let mut out = Self::new(nrows, ncols, prop)?;
        if out.is_empty() {
            return Ok(out);
        }
        random::fill_random(rng, prop, nrows, ncols, out.storage.as_mut_slice(), nrows, low, high)?;
        Ok(out)
    }
}

impl<T: FloatScalar> DenseMatrix<'_, T> {
    pub fn norm_one(&self) -> Result<T::Real> {
        self.as_ref().norm_one()
    }

    pub fn norm_inf(&self) -> Result<T::Real> {
        self.as_ref().norm_inf()
    }

    pub fn norm_max(&self) -> Result<T::Real> {
        self.as_ref().norm_max()
    }

    pub fn norm_fro(&self) -> Result<T::Real> {
        self.as_ref().norm_fro()
    }

    pub fn norm_euc(&self) -> Result<T::Real> {
        self.as_ref().norm_euc()
    }
}

impl<T: ComplexScalar> DenseMatrix<'_, T> {
    /// `A = conj(A)` over the stored half.
    pub fn conjugate(&mut self) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let (m, n, ld, uplo) = (self.nrows, self.ncols, self.ld, self.prop.uplo());
        bulk::conjugate(uplo, m, n, self.storage.as_mut_slice(), ld, T::one())
    }

    pub fn conjugated(&self) -> Result<DenseMatrix<'static, T>> {
        self.as_ref().conjugated()
    }

    pub fn conjugate_transpose(&self) -> Result<DenseMatrix<'static, T>> {
        self.as_ref().conjugate_transpose()
    }

    pub fn real_part(&self) -> Result<DenseMatrix<'static, T::Real>> {
        self.as_ref().real_part()
    }

    pub fn imag_part(&self) -> Result<DenseMatrix<'static, T::Real>> {
        self.as_ref().imag_part()
    }

    pub fn real_block(&self, ibgn: usize, jbgn: usize, ni: usize, nj: usize) -> Result<DenseMatrix<'static, T::Real>> {
        self.as_ref().real_block(ibgn, jbgn, ni, nj)
    }

    pub fn imag_block(&self, ibgn: usize, jbgn: usize, ni: usize, nj: usize) -> Result<DenseMatrix<'static, T::Real>> {
        self.as_ref().imag_block(ibgn, jbgn, ni, nj)
    }

    /// Overwrite the real part of the block at `(ibgn, jbgn)`.
    ///
    /// Inside a hermitian region `src` must be symmetric.
    pub fn set_real_block(&mut self, ibgn: usize, jbgn: usize, src: MatrixRef<'_, T::Real>) -> Result<()> {
        checks::set_block_check(
            src.prop,
            self.prop,
            self.nrows,
            self.ncols,
            ibgn,
            jbgn,
            src.nrows,
            src.ncols,
            BlockPart::Real,
        )?;
        let ld = self.ld;
        let dst = &mut self.storage.as_mut_slice()[ibgn + jbgn * ld..];
        bulk::set_real(src.prop.uplo(), src.nrows, src.ncols, src.data, src.ld, dst, ld)
    }

    /// Overwrite the imaginary part of the block at `(ibgn, jbgn)`.
    ///
    /// Inside a hermitian region `src` must be skew; the diagonal stays real.
    pub fn set_imag_block(&mut self, ibgn: usize, jbgn: usize, src: MatrixRef<'_, T::Real>) -> Result<()> {
        checks::set_block_check(
            src.prop,
            self.prop,
            self.nrows,
            self.ncols,
            ibgn,
            jbgn,
            src.nrows,
            src.ncols,
            BlockPart::Imag,
        )?;
        let ld = self.ld;
        let on_diagonal = self.prop.is_hermitian() && ibgn == jbgn;
        let dst = &mut self.storage.as_mut_slice()[ibgn + jbgn * ld..];
        bulk::set_imag(src.prop.uplo(), src.nrows, src.ncols, src.data, src.ld, dst, ld)?;
        if on_diagonal {
            for k in 0..src.nrows {
                dst[k + k * ld] = Conj::diag(dst[k + k * ld]);
            }
        }
        Ok(())
    }
}

impl<T> Index<(usize, usize)> for DenseMatrix<'_, T> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        assert!(i < self.nrows && j < self.ncols, "index ({i},{j}) out of bounds");
        &self.storage.as_slice()[i + j * self.ld]
    }
}

impl<T> IndexMut<(usize, usize)> for DenseMatrix<'_, T> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        assert!(i < self.nrows && j < self.ncols, "index ({i},{j}) out of bounds");
        let k = i + j * self.ld;
        &mut self.storage.as_mut_slice()[k]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Uplo;
    use crate::ErrorKind;
    use approx::assert_relative_eq;
    use num_complex::Complex64;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seq(m: usize, n: usize, prop: Property) -> DenseMatrix<'static, f64> {
        DenseMatrix::from_fn(m, n, prop, |i, j| (i + m * j) as f64).unwrap()
    }

    #[test]
    fn test_new_zero_dims_is_empty() {
        let a = DenseMatrix::<f64>::new(0, 3, Property::general()).unwrap();
        assert!(a.is_empty());
        assert!(!a.is_owner());
        assert_eq!(a.norm_fro().unwrap(), 0.0);
    }

    #[test]
    fn test_new_rejects_bad_property() {
        let err = DenseMatrix::<f64>::new(2, 3, Property::symmetric(Uplo::Lower)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Property);
        let err = DenseMatrix::<f64>::new(2, 2, Property::hermitian(Uplo::Lower)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Property);
        assert!(DenseMatrix::<Complex64>::new(2, 2, Property::hermitian(Uplo::Lower)).is_ok());
    }

    #[test]
    fn test_wrap_validation() {
        let mut buf = vec![0.0f64; 5];
        let err = DenseMatrix::wrap(3, 2, &mut buf, 2, Property::general()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dimension);
        let err = DenseMatrix::wrap(3, 2, &mut buf, 3, Property::general()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dimension);
        let err = DenseMatrix::wrap(0, 2, &mut buf, 3, Property::general()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dimension);
        let err = DenseMatrix::wrap(2, 2, &mut buf, 2, Property::invalid()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Property);
    }

    #[test]
    fn test_wrap_borrowed_writes_through() {
        let mut buf = vec![1.0f64; 6];
        {
            let mut a = DenseMatrix::wrap(2, 2, &mut buf, 3, Property::general()).unwrap();
            assert!(!a.is_owner());
            a.scale(2.0).unwrap();
            a.clear();
            assert!(a.is_empty());
        }
        // row 2 is padding
        assert_eq!(buf, vec![2.0, 2.0, 1.0, 2.0, 2.0, 1.0]);
    }

    #[test]
    fn test_wrap_owned() {
        let a = DenseMatrix::wrap_owned(2, 2, vec![1.0, 2.0, 3.0, 4.0], 2, Property::general()).unwrap();
        assert!(a.is_owner());
        assert_eq!(a[(1, 1)], 4.0);
    }

    #[test]
    fn test_move_out_resets_source() {
        let mut a = seq(3, 3, Property::general());
        let b = a.move_out();
        assert!(a.is_empty());
        assert!(!a.is_owner());
        assert_eq!(a.prop(), Property::invalid());
        assert!(b.is_owner());
        assert_eq!(b[(2, 2)], 8.0);
    }

    #[test]
    fn test_rcopy_aliases() {
        let mut a = seq(3, 3, Property::general());
        {
            let mut r = a.rcopy();
            assert!(!r.is_owner());
            r[(0, 1)] = -1.0;
        }
        assert_eq!(a[(0, 1)], -1.0);

        let g = a.rcopy_const();
        assert_eq!(g.get().get(0, 1), Some(-1.0));
        assert_eq!(g.nrows(), 3);
    }

    #[test]
    fn test_copy_is_deep() {
        let mut a = seq(2, 2, Property::general());
        let b = a.copy();
        a[(0, 0)] = 100.0;
        assert_eq!(b[(0, 0)], 0.0);
        assert_eq!(b.ld(), 2);
    }

    #[test]
    fn test_copy_tight_ld_from_padded() {
        let buf: Vec<f64> = (0..8).map(|k| k as f64).collect();
        let v = MatrixRef::new(3, 2, &buf, 4, Property::general()).unwrap();
        let c = v.copy();
        assert_eq!(c.ld(), 3);
        assert_eq!(c.as_slice(), &[0.0, 1.0, 2.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_from_fn_normalizes_diagonal() {
        let h = DenseMatrix::<Complex64>::from_fn(3, 3, Property::hermitian(Uplo::Lower), |i, j| {
            Complex64::new(1.0 + i as f64, 1.0 + j as f64)
        })
        .unwrap();
        for k in 0..3 {
            assert_eq!(h[(k, k)].im, 0.0);
        }
        // upper half not stored
        assert_eq!(h[(0, 2)], Complex64::new(0.0, 0.0));

        let s = DenseMatrix::<f64>::from_fn(3, 3, Property::skew(Uplo::Upper), |_, _| 5.0).unwrap();
        assert_eq!(s[(1, 1)], 0.0);
        assert_eq!(s[(0, 1)], 5.0);
    }

    #[test]
    fn test_fill() {
        let mut s = DenseMatrix::<f64>::new(3, 3, Property::skew(Uplo::Lower)).unwrap();
        s.fill(2.0).unwrap();
        assert_eq!(s[(2, 0)], 2.0);
        assert_eq!(s[(1, 1)], 0.0);
        assert_eq!(s[(0, 2)], 0.0);
    }

    #[test]
    fn test_get_and_entry_mut() {
        let mut a = seq(2, 3, Property::general());
        assert_eq!(a.get(1, 2), Some(5.0));
        assert_eq!(a.get(2, 0), None);
        *a.entry_mut(0, 0).unwrap() = 9.0;
        assert_eq!(a[(0, 0)], 9.0);
        assert!(a.entry_mut(0, 3).is_none());
    }

    #[test]
    fn test_transpose_general_only() {
        let a = seq(2, 3, Property::general());
        let t = a.transpose().unwrap();
        assert_eq!((t.nrows(), t.ncols()), (3, 2));
        assert_eq!(t[(2, 1)], a[(1, 2)]);

        let s = seq(3, 3, Property::symmetric(Uplo::Upper));
        let err = s.transpose().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_conjugate_and_conjugate_transpose() {
        let mut a = DenseMatrix::<Complex64>::from_fn(2, 2, Property::general(), |i, j| {
            Complex64::new(i as f64, j as f64)
        })
        .unwrap();
        let h = a.conjugate_transpose().unwrap();
        assert_eq!(h[(1, 0)], Complex64::new(0.0, -1.0));
        a.conjugate().unwrap();
        assert_eq!(a[(0, 1)], Complex64::new(0.0, -1.0));
        let c = a.conjugated().unwrap();
        assert_eq!(c[(0, 1)], Complex64::new(0.0, 1.0));
    }

    #[test]
    fn test_convert_to_general_in_place() {
        let mut s = seq(3, 3, Property::symmetric(Uplo::Lower));
        s.convert_to_general_in_place().unwrap();
        assert!(s.prop().is_general());
        assert_eq!(s[(0, 2)], s[(2, 0)]);
    }

    #[test]
    fn test_update_and_sum() {
        let a = seq(3, 3, Property::symmetric(Uplo::Upper));
        let mut c = a.copy();
        c.update(2.0, a.as_ref()).unwrap();
        assert_eq!(c[(0, 2)], 3.0 * a[(0, 2)]);

        let s = DenseMatrix::sum(1.0, a.as_ref(), -1.0, a.as_ref()).unwrap();
        assert_eq!(s.norm_max().unwrap(), 0.0);

        let g = seq(3, 3, Property::general());
        let err = c.update(1.0, g.as_ref()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Property);
    }

    #[test]
    fn test_block_derivation() {
        let s = seq(5, 5, Property::symmetric(Uplo::Lower));
        let d = s.block(1, 1, 3, 3).unwrap();
        assert_eq!(d.prop(), Property::symmetric(Uplo::Lower));
        assert_eq!(d[(2, 0)], s[(3, 1)]);

        let off = s.block(3, 0, 2, 2).unwrap();
        assert!(off.prop().is_general());
        assert_eq!(off[(1, 1)], s[(4, 1)]);

        let err = s.block(1, 1, 3, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Property);
        let err = s.block(4, 4, 2, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn test_block_ref_and_block_mut_alias() {
        let mut a = seq(4, 4, Property::general());
        {
            let mut b = a.block_mut(1, 2, 2, 2).unwrap();
            assert_eq!(b.ld(), 4);
            b.scale(0.0).unwrap();
        }
        assert_eq!(a[(1, 2)], 0.0);
        assert_eq!(a[(2, 3)], 0.0);
        assert_eq!(a[(0, 2)], 8.0);

        let g = a.block_ref(0, 0, 2, 2).unwrap();
        assert_eq!(g[(1, 1)], 5.0);
    }

    #[test]
    fn test_set_block() {
        let mut s = DenseMatrix::<f64>::new(4, 4, Property::symmetric(Uplo::Lower)).unwrap();
        let d = seq(2, 2, Property::symmetric(Uplo::Lower));
        s.set_block(2, 2, d.as_ref()).unwrap();
        assert_eq!(s[(3, 2)], d[(1, 0)]);

        let g = seq(2, 2, Property::general());
        s.set_block(2, 0, g.as_ref()).unwrap();
        assert_eq!(s[(3, 1)], 3.0);

        // general block on the diagonal of a symmetric matrix
        let err = s.set_block(0, 0, g.as_ref()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Property);
    }

    #[test]
    fn test_real_imag_blocks_of_hermitian() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut h = DenseMatrix::<Complex64>::random_with(&mut rng, 4, 4, Property::hermitian(Uplo::Upper), -1.0, 1.0)
            .unwrap();

        let re = h.real_part().unwrap();
        let im = h.imag_part().unwrap();
        assert_eq!(re.prop(), Property::symmetric(Uplo::Upper));
        assert_eq!(im.prop(), Property::skew(Uplo::Upper));
        assert_eq!(re[(0, 3)], h[(0, 3)].re);
        assert_eq!(im[(1, 2)], h[(1, 2)].im);

        let rb = h.real_block(1, 1, 2, 2).unwrap();
        assert_eq!(rb.prop(), Property::symmetric(Uplo::Upper));

        let sym = DenseMatrix::<f64>::from_fn(2, 2, Property::symmetric(Uplo::Upper), |_, _| 7.0).unwrap();
        h.set_real_block(1, 1, sym.as_ref()).unwrap();
        assert_eq!(h[(1, 2)].re, 7.0);

        let skew = DenseMatrix::<f64>::from_fn(2, 2, Property::skew(Uplo::Upper), |_, _| 3.0).unwrap();
        h.set_imag_block(1, 1, skew.as_ref()).unwrap();
        assert_eq!(h[(1, 2)].im, 3.0);
        assert_eq!(h[(1, 1)].im, 0.0);

        // a symmetric block is not the imaginary part of a hermitian region
        let err = h.set_imag_block(1, 1, sym.as_ref()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Property);
    }

    #[test]
    fn test_permute_three_by_three() {
        let a = seq(3, 3, Property::general());
        let p = Permutation::from_vec(vec![1, 2, 0]).unwrap();
        let q = Permutation::from_vec(vec![2, 0, 1]).unwrap();
        let pa = a.permute_left(&p).unwrap();
        let aq = a.permute_right(&q).unwrap();
        let paq = a.permute_left_right(&p, &q).unwrap();
        for j in 0..3 {
            for i in 0..3 {
                assert_eq!(pa[(p[i], j)], a[(i, j)]);
                assert_eq!(aq[(i, q[j])], a[(i, j)]);
                assert_eq!(paq[(p[i], q[j])], a[(i, j)]);
            }
        }
        let both = a.permute(Some(&p), Some(&q)).unwrap();
        assert_eq!(both.as_slice(), paq.as_slice());
    }

    #[test]
    fn test_permute_checks() {
        let s = seq(3, 3, Property::symmetric(Uplo::Lower));
        let p = Permutation::identity(3);
        assert_eq!(s.permute_left(&p).unwrap_err().kind(), ErrorKind::Unsupported);

        let t = seq(3, 3, Property::triangular(Uplo::Lower));
        assert_eq!(t.permute_similarity(&p).unwrap_err().kind(), ErrorKind::Property);

        let g = seq(3, 3, Property::general());
        let short = Permutation::identity(2);
        assert_eq!(g.permute_left(&short).unwrap_err().kind(), ErrorKind::Dimension);
    }

    #[test]
    fn test_permute_empty() {
        let mut e = DenseMatrix::<f64>::empty();
        let none = Permutation::identity(0);
        assert!(e.permute_left(&none).unwrap().is_empty());
        assert!(e.permute_right(&none).unwrap().is_empty());
        assert!(e.permute_left_right(&none, &none).unwrap().is_empty());
        assert!(e.permute_similarity(&none).unwrap().is_empty());
        e.ipermute_left(&none).unwrap();
        e.ipermute_similarity(&none).unwrap();
        assert!(e.is_empty());

        let p = Permutation::identity(2);
        assert_eq!(e.permute_left(&p).unwrap_err().kind(), ErrorKind::Dimension);
        assert_eq!(e.permute_similarity(&p).unwrap_err().kind(), ErrorKind::Dimension);
    }

    #[test]
    fn test_ipermute_similarity_roundtrip() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut s = DenseMatrix::<f64>::random_with(&mut rng, 6, 6, Property::skew(Uplo::Lower), -1.0, 1.0).unwrap();
        let orig = s.copy();
        let p = Permutation::random_with(&mut rng, 6);
        s.ipermute_similarity(&p).unwrap();
        s.ipermute_similarity(&p.inverse()).unwrap();
        for j in 0..6 {
            for i in j..6 {
                assert_relative_eq!(s[(i, j)], orig[(i, j)]);
            }
        }
    }

    #[test]
    fn test_ipermute_left_right() {
        let mut a = seq(2, 3, Property::general());
        let p = Permutation::from_vec(vec![1, 0]).unwrap();
        let q = Permutation::from_vec(vec![1, 2, 0]).unwrap();
        let want = a.permute_left_right(&p, &q).unwrap();
        a.ipermute_left_right(&p, &q).unwrap();
        assert_eq!(a.as_slice(), want.as_slice());
        a.ipermute_left(&p).unwrap();
        a.ipermute_right(&q.inverse()).unwrap();
        assert_eq!(a.as_slice(), seq(2, 3, Property::general()).as_slice());
    }

    #[test]
    fn test_norms_forwarded() {
        let v = DenseMatrix::<f64>::wrap_owned(2, 1, vec![3.0, 4.0], 2, Property::general()).unwrap();
        assert_relative_eq!(v.norm_euc().unwrap(), 5.0, epsilon = 1e-12);
        assert_eq!(v.norm_one().unwrap(), 7.0);
        assert_eq!(v.norm_inf().unwrap(), 4.0);
    }
}
