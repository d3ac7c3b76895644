//! Precondition gate for every matrix operation.
//!
//! Each check runs before any memory is touched. A failing check returns the
//! error kind of the taxonomy in [`crate::DenseError`] with a message naming the
//! offending property or dimension.

use crate::kernel::{required_len, Op, Status};
use crate::property::{Prop, Property, Uplo};
use crate::scalar::Scalar;
use crate::{DenseError, Result};

/// Consistency of a dense matrix descriptor.
///
/// `len` is the length of the backing slice; it must cover the
/// `(rows, cols, ld)` footprint.
pub fn dense_consistency<T: Scalar>(
    prop: Property,
    nrows: usize,
    ncols: usize,
    len: usize,
    ld: usize,
) -> Result<()> {
    if nrows == 0 || ncols == 0 {
        return Err(DenseError::Dimension(format!(
            "zero-sized matrix ({nrows}x{ncols})"
        )));
    }
    if ld < nrows {
        return Err(DenseError::Dimension(format!(
            "invalid leading dimension {ld} for {nrows} rows"
        )));
    }
    let required = required_len(nrows, ncols, ld);
    if len < required {
        return Err(DenseError::Dimension(format!(
            "storage of {len} elements cannot hold {nrows}x{ncols} with leading dimension {ld} (needs {required})"
        )));
    }
    property_compatibility::<T>(prop, nrows, ncols)
}

/// Whether `prop` is usable on an `nrows x ncols` matrix of element kind `T`.
pub fn property_compatibility<T: Scalar>(prop: Property, nrows: usize, ncols: usize) -> Result<()> {
    if !prop.is_valid() {
        return Err(DenseError::Property(format!("invalid property {prop}")));
    }
    if prop.is_square_required() && nrows != ncols {
        return Err(DenseError::Property(format!(
            "{} matrices must be square, got {nrows}x{ncols}",
            prop.name()
        )));
    }
    if prop.is_hermitian() && !T::IS_COMPLEX {
        return Err(DenseError::Property(
            "Hermitian property requires a complex element type".into(),
        ));
    }
    Ok(())
}

/// Derive the property of the block `[ibgn, ibgn+ni) x [jbgn, jbgn+nj)`.
///
/// - A block starting on the diagonal of a structural matrix must be square
///   and keeps the property.
/// - A block starting off the diagonal must lie entirely in the stored half
///   and becomes general.
pub fn block_property(
    prop: Property,
    nrows: usize,
    ncols: usize,
    ibgn: usize,
    jbgn: usize,
    ni: usize,
    nj: usize,
) -> Result<Property> {
    let iend = ibgn.checked_add(ni);
    let jend = jbgn.checked_add(nj);
    let (iend, jend) = match (iend, jend) {
        (Some(iend), Some(jend))
            if ibgn < nrows && jbgn < ncols && iend <= nrows && jend <= ncols =>
        {
            (iend, jend)
        }
        _ => {
            return Err(DenseError::Bounds(format!(
                "block ({ibgn},{jbgn})+({ni}x{nj}) exceeds matrix dimensions {nrows}x{ncols}"
            )))
        }
    };

    let name = prop.name();
    match prop.uplo() {
        Uplo::Full => Ok(prop),
        Uplo::Lower => {
            if jbgn > ibgn {
                return Err(DenseError::Property(format!(
                    "start of block should be in lower part for {name} matrices"
                )));
            }
            if ibgn == jbgn {
                if iend != jend {
                    return Err(DenseError::Property(format!(
                        "start of block on diagonal of {name} matrices should be associated with a diagonal block"
                    )));
                }
                Ok(prop)
            } else {
                if jend > ibgn + 1 {
                    return Err(DenseError::Property(format!(
                        "block overlaps with upper part of {name} matrix"
                    )));
                }
                Ok(Property::general())
            }
        }
        Uplo::Upper => {
            if ibgn > jbgn {
                return Err(DenseError::Property(format!(
                    "start of block should be in upper part for {name} matrices"
                )));
            }
            if ibgn == jbgn {
                if iend != jend {
                    return Err(DenseError::Property(format!(
                        "start of block on diagonal of {name} matrices should be associated with a diagonal block"
                    )));
                }
                Ok(prop)
            } else {
                if iend > jbgn + 1 {
                    return Err(DenseError::Property(format!(
                        "block overlaps with lower part of {name} matrix"
                    )));
                }
                Ok(Property::general())
            }
        }
    }
}

/// Which part of a complex target a block is written into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPart {
    Whole,
    Real,
    Imag,
}

/// Check that a block with property `block_prop` may be written at `(ibgn, jbgn)`.
///
/// The property derived for the target region must equal `block_prop`
/// exactly. The real part of a hermitian region is symmetric and its
/// imaginary part is skew.
#[allow(clippy::too_many_arguments)]
pub fn set_block_check(
    block_prop: Property,
    prop: Property,
    nrows: usize,
    ncols: usize,
    ibgn: usize,
    jbgn: usize,
    ni: usize,
    nj: usize,
    part: BlockPart,
) -> Result<()> {
    let derived = block_property(prop, nrows, ncols, ibgn, jbgn, ni, nj)?;
    let expected = match part {
        BlockPart::Whole => derived,
        BlockPart::Real => derived.real_part(),
        BlockPart::Imag => derived.imag_part(),
    };
    if expected != block_prop {
        return Err(DenseError::Property(format!(
            "block property {block_prop} does not match target region {expected}"
        )));
    }
    Ok(())
}

/// Permutation sizes must match the matrix dimensions.
pub fn perm_op_check(nrows: usize, ncols: usize, np: usize, nq: usize) -> Result<()> {
    if nrows != np || ncols != nq {
        return Err(DenseError::Dimension(format!(
            "permutations of size ({np},{nq}) for permute operation on {nrows}x{ncols} matrix"
        )));
    }
    Ok(())
}

/// One and two sided permutations only apply to general matrices.
pub fn perm_ge_check(prop: Property, nrows: usize, ncols: usize, np: usize, nq: usize) -> Result<()> {
    if !prop.is_general() {
        return Err(DenseError::Unsupported(
            "right/left sided permutations are applied on non-empty general matrices".into(),
        ));
    }
    perm_op_check(nrows, ncols, np, nq)
}

/// Similarity permutations `P*A*P'` preserve symmetric, hermitian, skew and general structure.
pub fn perm_similarity_check(prop: Property, nrows: usize, ncols: usize, np: usize) -> Result<()> {
    if prop.is_triangular() || !prop.is_valid() {
        return Err(DenseError::Property(format!(
            "similarity permutation not defined for {prop} matrices"
        )));
    }
    if nrows != ncols {
        return Err(DenseError::Dimension(format!(
            "similarity permutation needs a square matrix, got {nrows}x{ncols}"
        )));
    }
    perm_op_check(nrows, ncols, np, np)
}

/// Transpositions are only defined for general matrices.
pub fn transpose_check(prop: Property, conjugate: bool) -> Result<()> {
    if !prop.is_general() {
        let what = if conjugate {
            "conjugate transpositions"
        } else {
            "transpositions"
        };
        return Err(DenseError::Unsupported(format!(
            "{what} are applied on non-empty general matrices"
        )));
    }
    Ok(())
}

/// Two operands of an element-wise operation must agree in shape and property.
pub fn similarity_check(
    prop1: Property,
    nrows1: usize,
    ncols1: usize,
    prop2: Property,
    nrows2: usize,
    ncols2: usize,
) -> Result<()> {
    if nrows1 != nrows2 || ncols1 != ncols2 {
        return Err(DenseError::Dimension(format!(
            "operands of size {nrows1}x{ncols1} and {nrows2}x{ncols2}"
        )));
    }
    if prop1 != prop2 {
        return Err(DenseError::Property(format!(
            "operands with properties {prop1} and {prop2}"
        )));
    }
    Ok(())
}

/// Shape and property of one multiply operand.
#[derive(Debug, Clone, Copy)]
pub struct Operand {
    pub prop: Property,
    pub nrows: usize,
    pub ncols: usize,
    pub op: Op,
}

impl Operand {
    fn is_syhe(&self) -> bool {
        matches!(self.prop.ptype(), Prop::Symmetric | Prop::Hermitian)
    }

    fn is_structural(&self) -> bool {
        self.is_syhe() || self.prop.is_triangular()
    }
}

/// Consistency of `C = beta*C + alpha*op(A)*op(B)`.
///
/// Symmetric and hermitian operands ignore their operation when sizing the
/// product. At most one operand may be non-general, and a general operand
/// next to a structural one must not be transposed.
pub fn mult_check(a: Operand, b: Operand, c_prop: Property, c_nrows: usize, c_ncols: usize) -> Result<()> {
    if !a.prop.is_valid() || !b.prop.is_valid() || !c_prop.is_valid() {
        return Err(DenseError::Property("invalid operand property".into()));
    }

    let (syhe_a, syhe_b) = (a.is_syhe(), b.is_syhe());
    let m = if !syhe_a && a.op.is_transpose() { a.ncols } else { a.nrows };
    let ka = if !syhe_a && a.op.is_transpose() { a.nrows } else { a.ncols };
    let n = if !syhe_b && b.op.is_transpose() { b.nrows } else { b.ncols };
    let kb = if !syhe_b && b.op.is_transpose() { b.ncols } else { b.nrows };

    if c_nrows != m || c_ncols != n || ka != kb {
        return Err(DenseError::Dimension(format!(
            "cannot multiply {}x{} ({}) by {}x{} ({}) into {c_nrows}x{c_ncols}",
            a.nrows,
            a.ncols,
            a.op.to_char(),
            b.nrows,
            b.ncols,
            b.op.to_char()
        )));
    }

    if !c_prop.is_general() {
        return Err(DenseError::Property(format!(
            "product must be stored in a general matrix, got {c_prop}"
        )));
    }

    if a.prop.is_general() && b.prop.is_general() {
        return Ok(());
    }

    let not_allowed = |general: &Operand| {
        if general.op.is_transpose() {
            Err(DenseError::Unsupported(format!(
                "operation {} on the general operand of a structured product",
                general.op.to_char()
            )))
        } else {
            Ok(())
        }
    };

    if a.is_structural() && b.prop.is_general() {
        return not_allowed(&b);
    }
    if b.is_structural() && a.prop.is_general() {
        return not_allowed(&a);
    }

    Err(DenseError::Property(format!(
        "unsupported operand properties {} and {}",
        a.prop, b.prop
    )))
}

/// Turn a kernel status into a crate error, keeping the info code.
pub fn check_info<T>(routine: &'static str, status: Status<T>) -> Result<T> {
    status.map_err(|info| DenseError::ExternalKernel { routine, info })
}
