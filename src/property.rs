//! Structural property of a column-major matrix.
//!
//! A [`Property`] pairs a structural type ([`Prop`]) with a fill side ([`Uplo`]).
//! The fill side tells every kernel which half of the buffer is authoritative:
//!
//! | type       | allowed fill     | square |
//! |------------|------------------|--------|
//! | General    | Full             | no     |
//! | Symmetric  | Upper, Lower     | yes    |
//! | Hermitian  | Upper, Lower     | yes    |
//! | Triangular | Upper, Lower     | no (trapezoidal) |
//! | Skew       | Upper, Lower     | yes    |
//!
//! Any other combination, and [`Prop::Unset`], is a representable but invalid
//! state that the consistency checks reject before memory is touched.

use std::fmt;

/// Structural type of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Prop {
    /// No structure assigned. Always invalid.
    Unset,
    /// Plain rectangular matrix, every entry stored.
    #[default]
    General,
    /// `A[j,i] == A[i,j]`.
    Symmetric,
    /// `A[j,i] == conj(A[i,j])`, real diagonal.
    Hermitian,
    /// Zeros outside the stored half.
    Triangular,
    /// `A[j,i] == -A[i,j]`, zero diagonal.
    Skew,
}

impl Prop {
    /// Human readable name, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Prop::Unset => "Unset",
            Prop::General => "General",
            Prop::Symmetric => "Symmetric",
            Prop::Hermitian => "Hermitian",
            Prop::Triangular => "Triangular",
            Prop::Skew => "Skew",
        }
    }
}

/// Fill side: which part of the buffer holds meaningful data.
///
/// Corresponds to the `uplo` character of dense kernel libraries:
/// - 'F': full
/// - 'U': upper triangle (including diagonal)
/// - 'L': lower triangle (including diagonal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Uplo {
    #[default]
    Full,
    Upper,
    Lower,
}

impl Uplo {
    /// Convert to the kernel character representation.
    pub fn to_char(self) -> char {
        match self {
            Uplo::Full => 'F',
            Uplo::Upper => 'U',
            Uplo::Lower => 'L',
        }
    }

    /// Parse a kernel character (case-insensitive).
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'F' => Some(Uplo::Full),
            'U' => Some(Uplo::Upper),
            'L' => Some(Uplo::Lower),
            _ => None,
        }
    }

    /// Row range `[ibgn, iend)` of column `j` covered by this fill in an `m x n` buffer.
    ///
    /// For the upper fill the range is clipped to `m` so trapezoidal
    /// (`m < n`) matrices work unchanged.
    #[inline]
    pub fn row_range(self, m: usize, j: usize) -> (usize, usize) {
        match self {
            Uplo::Full => (0, m),
            Uplo::Upper => (0, (j + 1).min(m)),
            Uplo::Lower => (j.min(m), m),
        }
    }
}

/// Immutable (structural type, fill side) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Property {
    ptype: Prop,
    uplo: Uplo,
}

impl Default for Property {
    fn default() -> Self {
        Self::general()
    }
}

impl Property {
    /// Create a property from its parts. The result may be invalid; see [`Property::is_valid`].
    pub const fn new(ptype: Prop, uplo: Uplo) -> Self {
        Self { ptype, uplo }
    }

    pub const fn general() -> Self {
        Self::new(Prop::General, Uplo::Full)
    }

    pub const fn symmetric(uplo: Uplo) -> Self {
        Self::new(Prop::Symmetric, uplo)
    }

    pub const fn hermitian(uplo: Uplo) -> Self {
        Self::new(Prop::Hermitian, uplo)
    }

    pub const fn triangular(uplo: Uplo) -> Self {
        Self::new(Prop::Triangular, uplo)
    }

    pub const fn skew(uplo: Uplo) -> Self {
        Self::new(Prop::Skew, uplo)
    }

    /// The "no property" state.
    pub const fn invalid() -> Self {
        Self::new(Prop::Unset, Uplo::Full)
    }

    #[inline]
    pub fn ptype(&self) -> Prop {
        self.ptype
    }

    #[inline]
    pub fn uplo(&self) -> Uplo {
        self.uplo
    }

    #[inline]
    pub fn uplo_char(&self) -> char {
        self.uplo.to_char()
    }

    /// Check the (type, fill) combination.
    pub fn is_valid(&self) -> bool {
        match self.ptype {
            Prop::Unset => false,
            Prop::General => self.uplo == Uplo::Full,
            Prop::Symmetric | Prop::Hermitian | Prop::Triangular | Prop::Skew => {
                self.uplo != Uplo::Full
            }
        }
    }

    /// Whether the property only makes sense on square matrices.
    pub fn is_square_required(&self) -> bool {
        matches!(self.ptype, Prop::Symmetric | Prop::Hermitian | Prop::Skew)
    }

    pub fn is_general(&self) -> bool {
        self.ptype == Prop::General
    }

    pub fn is_symmetric(&self) -> bool {
        self.ptype == Prop::Symmetric
    }

    pub fn is_hermitian(&self) -> bool {
        self.ptype == Prop::Hermitian
    }

    pub fn is_triangular(&self) -> bool {
        self.ptype == Prop::Triangular
    }

    pub fn is_skew(&self) -> bool {
        self.ptype == Prop::Skew
    }

    pub fn is_full(&self) -> bool {
        self.uplo == Uplo::Full
    }

    pub fn is_upper(&self) -> bool {
        self.uplo == Uplo::Upper
    }

    pub fn is_lower(&self) -> bool {
        self.uplo == Uplo::Lower
    }

    /// Name of the structural type.
    pub fn name(&self) -> &'static str {
        self.ptype.name()
    }

    /// Property of the real part of a matrix with this property.
    ///
    /// The real part of a Hermitian matrix is symmetric.
    pub fn real_part(&self) -> Self {
        match self.ptype {
            Prop::Hermitian => Self::symmetric(self.uplo),
            _ => *self,
        }
    }

    /// Property of the imaginary part of a matrix with this property.
    ///
    /// The imaginary part of a Hermitian matrix is skew.
    pub fn imag_part(&self) -> Self {
        match self.ptype {
            Prop::Hermitian => Self::skew(self.uplo),
            _ => *self,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fill = match self.uplo {
            Uplo::Full => "Full",
            Uplo::Upper => "Upper",
            Uplo::Lower => "Lower",
        };
        write!(f, "{}/{}", self.name(), fill)
    }
}
