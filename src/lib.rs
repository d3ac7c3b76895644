//! Property-aware bulk kernels for column-major dense matrices.
//!
//! A matrix is a column-major buffer with a leading dimension, annotated with a
//! structural [`Property`]: general, symmetric, hermitian, triangular or skew,
//! together with the half of the buffer that holds meaningful data. Every bulk
//! operation in this crate (scaling, conjugation, transposition, expansion to a
//! general matrix, permutation, norms, sub-block extraction) reads the property
//! and only touches the authoritative half.
//!
//! # Core Types
//!
//! - [`DenseMatrix`]: owning or borrowing matrix object
//! - [`MatrixRef`]: read-only view used by every non-mutating operation
//! - [`Guard`]: read-only alias obtained from a shared reference
//! - [`Property`] ([`Prop`] x [`Uplo`]): structural annotation
//! - [`Permutation`]: bijection on `0..n`
//!
//! # Ownership
//!
//! Storage is either owned (`Vec<T>`) or borrowed (`&mut [T]`). Aliases created
//! by [`DenseMatrix::rcopy`], [`DenseMatrix::block_mut`] or
//! [`DenseMatrix::block_ref`] borrow their source, so the borrow checker
//! enforces that the source outlives them and is not mutated meanwhile.
//! No locking is involved: views are zero-copy.
//!
//! # Example
//!
//! ```rust
//! use strided_dense::{DenseMatrix, Property, Uplo};
//!
//! // 3x3 symmetric matrix, lower half stored
//! let mut a = DenseMatrix::<f64>::from_fn(3, 3, Property::symmetric(Uplo::Lower), |i, j| {
//!     (i + 3 * j) as f64
//! })
//! .unwrap();
//!
//! a.scale(2.0).unwrap();
//! let g = a.convert_to_general().unwrap();
//! assert_eq!(g.get(0, 2), g.get(2, 0));
//! assert!(a.norm_fro().unwrap() > 0.0);
//! ```
//!
//! # Logging
//!
//! Dispatch decisions are emitted as [`tracing`] events. Install a subscriber
//! in the application to see them; see [`KernelConfig`] for tunables.

pub mod blas;
pub mod bulk;
pub mod checks;
pub mod config;
mod element_op;
pub mod kernel;
pub mod linalg;
mod matrix;
pub mod norm;
pub mod perm;
mod property;
pub mod random;
mod scalar;

// ============================================================================
// Property model and element kinds
// ============================================================================
pub use element_op::{opposite_element, Conj, ElementOp, Identity, Negate};
pub use property::{Prop, Property, Uplo};
pub use scalar::{ComplexScalar, FloatScalar, RealScalar, Scalar};

// ============================================================================
// Matrix objects
// ============================================================================
pub use matrix::{DenseMatrix, Guard, MatrixRef};

// ============================================================================
// Permutations, multiply and configuration
// ============================================================================
pub use config::KernelConfig;
pub use kernel::Op;
pub use linalg::mult;
pub use perm::Permutation;

// ============================================================================
// Error types
// ============================================================================

/// Taxonomy of [`DenseError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Dimension,
    Property,
    Bounds,
    Unsupported,
    ExternalKernel,
    InvalidArgument,
}

/// Errors raised by the consistency checks and kernels.
///
/// Every check runs before memory is touched, so an error never leaves a
/// partially updated matrix behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DenseError {
    /// Zero or mismatched rows/columns/leading dimension.
    #[error("invalid dimensions: {0}")]
    Dimension(String),

    /// Invalid property, or a property incompatible with the shape or with another operand.
    #[error("invalid property: {0}")]
    Property(String),

    /// A block or index exceeds the matrix extent.
    #[error("out of bounds: {0}")]
    Bounds(String),

    /// Operation undefined for this type/property combination.
    #[error("operation not allowed: {0}")]
    Unsupported(String),

    /// A dense kernel reported a non-zero status.
    #[error("kernel {routine} failed with info {info}")]
    ExternalKernel { routine: &'static str, info: i32 },

    /// A caller supplied value is malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DenseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DenseError::Dimension(_) => ErrorKind::Dimension,
            DenseError::Property(_) => ErrorKind::Property,
            DenseError::Bounds(_) => ErrorKind::Bounds,
            DenseError::Unsupported(_) => ErrorKind::Unsupported,
            DenseError::ExternalKernel { .. } => ErrorKind::ExternalKernel,
            DenseError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }
}

/// Result type for dense matrix operations.
pub type Result<T> = std::result::Result<T, DenseError>;
