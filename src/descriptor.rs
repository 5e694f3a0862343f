//! Tensor descriptors: shapes, element types and dimension-range bounds.

use std::fmt;

use smallvec::{smallvec, SmallVec};

/// Inline storage for dimension lists.
///
/// Five covers the operator catalog's common NCHW-plus-batch shapes without
/// spilling to the heap.
pub type DimVec = SmallVec<[Dim; 5]>;

/// Size of a single tensor dimension.
///
/// A dimension is either a concrete non-negative extent or dynamic, meaning
/// its extent is decided at runtime. Dynamic dimensions are a distinct
/// variant rather than a sentinel integer, so arithmetic on extents can never
/// be applied to a placeholder by accident.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Dim {
    /// Concrete extent, known at compile time.
    Fixed(i64),

    /// Extent decided at runtime. The dimension exists, its size does not.
    Unknown,
}

impl Dim {
    /// Return the concrete extent, if there is one.
    pub fn fixed(self) -> Option<i64> {
        match self {
            Dim::Fixed(size) => Some(size),
            Dim::Unknown => None,
        }
    }

    /// Shift a concrete extent by `delta`. Dynamic extents are unaffected.
    pub fn offset(self, delta: i64) -> Dim {
        match self {
            Dim::Fixed(size) => Dim::Fixed(size + delta),
            Dim::Unknown => Dim::Unknown,
        }
    }
}

impl From<i64> for Dim {
    fn from(size: i64) -> Dim {
        Dim::Fixed(size)
    }
}

/// Shape of a tensor at compile time.
///
/// Shapes come in three levels of knowledge: every extent known, some extents
/// dynamic ([`Dim::Unknown`]) but the rank known, or the rank itself unknown.
/// The last case carries no dimension list at all.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Shape {
    /// Ranked shape; individual dimensions may still be dynamic.
    Dims(DimVec),

    /// The number of dimensions is not known at compile time.
    UnknownRank,
}

impl Shape {
    /// Create a ranked shape from concrete extents.
    pub fn fixed(sizes: &[i64]) -> Shape {
        Shape::Dims(sizes.iter().map(|&size| Dim::Fixed(size)).collect())
    }

    /// Create a ranked shape of `rank` dynamic dimensions.
    pub fn dynamic(rank: usize) -> Shape {
        Shape::Dims(smallvec![Dim::Unknown; rank])
    }

    /// Create a ranked shape from a dimension list.
    pub fn from_dims(dims: DimVec) -> Shape {
        Shape::Dims(dims)
    }

    /// Return the number of dimensions, or `None` if the rank is unknown.
    pub fn rank(&self) -> Option<usize> {
        match self {
            Shape::Dims(dims) => Some(dims.len()),
            Shape::UnknownRank => None,
        }
    }

    /// Return the dimension list, or `None` if the rank is unknown.
    pub fn dims(&self) -> Option<&[Dim]> {
        match self {
            Shape::Dims(dims) => Some(dims),
            Shape::UnknownRank => None,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::UnknownRank => write!(f, "(?)"),
            Shape::Dims(dims) => {
                write!(f, "(")?;
                for (i, dim) in dims.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match dim {
                        Dim::Fixed(size) => write!(f, "{}", size)?,
                        Dim::Unknown => write!(f, "?")?,
                    }
                }
                write!(f, ")")
            }
        }
    }
}

/// Bounds on the runtime extent of a dynamic dimension.
///
/// `min` is always a concrete non-negative bound. `max` is `None` when the
/// extent has no known upper bound.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct DimRange {
    pub min: i64,
    pub max: Option<i64>,
}

impl DimRange {
    /// Range of a dimension fully resolved to `value`.
    pub fn pin_exact(value: i64) -> DimRange {
        DimRange {
            min: value,
            max: Some(value),
        }
    }

    /// Range of a dimension about which nothing above `min_floor` is known.
    pub fn widen_unbounded(min_floor: i64) -> DimRange {
        DimRange {
            min: min_floor,
            max: None,
        }
    }

    /// Shift both bounds by a finite `delta`.
    ///
    /// An unbounded maximum stays unbounded under any finite additive shift.
    pub fn offset_add(self, delta: i64) -> DimRange {
        DimRange {
            min: self.min + delta,
            max: self.max.map(|max| max + delta),
        }
    }
}

/// Derive default ranges for a ranked shape: fixed dimensions are pinned to
/// their extent, dynamic dimensions get `(1, unbounded)`.
///
/// Returns `None` when the rank is unknown, as no per-dimension bounds can
/// exist.
pub fn default_ranges(shape: &Shape) -> Option<Vec<DimRange>> {
    let dims = shape.dims()?;
    Some(
        dims.iter()
            .map(|dim| match dim {
                Dim::Fixed(size) => DimRange::pin_exact(*size),
                Dim::Unknown => DimRange::widen_unbounded(1),
            })
            .collect(),
    )
}

/// Element type of a tensor.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum DataType {
    Int32,
    Int64,
    Uint64,
    Float16,
    Float32,
    Float64,
    Bool,
}

/// Compile-time description of a tensor: shape, element type and optional
/// per-dimension range bounds.
///
/// Descriptors are owned by graph nodes. Inference reads the descriptors of a
/// node's inputs and overwrites the descriptor of its output in place; a
/// failed inference call leaves every descriptor untouched.
///
/// When `ranges` is present it holds exactly one entry per dimension.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TensorDesc {
    pub shape: Shape,
    pub dtype: DataType,
    pub ranges: Option<Vec<DimRange>>,
}

impl TensorDesc {
    pub fn new(shape: Shape, dtype: DataType) -> TensorDesc {
        TensorDesc {
            shape,
            dtype,
            ranges: None,
        }
    }

    pub fn with_ranges(mut self, ranges: Vec<DimRange>) -> TensorDesc {
        debug_assert_eq!(self.shape.rank(), Some(ranges.len()));
        self.ranges = Some(ranges);
        self
    }

    /// Shorthand for [`Shape::rank`] on this descriptor's shape.
    pub fn rank(&self) -> Option<usize> {
        self.shape.rank()
    }
}
