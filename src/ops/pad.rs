//! The Pad operator family.
//!
//! Six variants share one core algorithm. `PadD`, `PadV2D` and `PadV3D` take
//! the padding amounts as a compile-time attribute; `Pad`, `PadV2` and
//! `PadV3` take them as an input tensor which may or may not be resolvable to
//! a constant. The V3 variants additionally support a non-contiguous
//! ("split") encoding of the padding list.

use smallvec::SmallVec;

use crate::descriptor::{default_ranges, DimVec, Shape, TensorDesc};
use crate::infer::{
    attr_bool_or, attr_int_list_list, require_input, write_output, InferError, InferShapes,
};
use crate::node::GraphNode;

/// Encoding of a flat padding list.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PadLayout {
    /// `[before_0, after_0, before_1, after_1, ...]` — pairs are adjacent.
    Paired,

    /// `[before_0, before_1, ..., after_0, after_1, ...]` — all "before"
    /// amounts first, then all "after" amounts, in dimension order.
    Split,
}

/// Per-dimension `(before, after)` padding amounts, normalized to paired
/// layout.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaddingSpec {
    pairs: SmallVec<[(i64, i64); 5]>,
}

impl PaddingSpec {
    /// Build a spec from a flat list, normalizing `layout` to paired.
    ///
    /// The list length must be even (two amounts per dimension).
    pub fn from_flat(values: &[i64], layout: PadLayout) -> Result<PaddingSpec, InferError> {
        if values.len() % 2 != 0 {
            return Err(InferError::ShapeMismatch(
                "flat padding list must hold two amounts per dimension",
            ));
        }
        let rank = values.len() / 2;
        let pairs = (0..rank)
            .map(|i| match layout {
                PadLayout::Paired => (values[2 * i], values[2 * i + 1]),
                PadLayout::Split => (values[i], values[i + rank]),
            })
            .collect();
        Ok(PaddingSpec { pairs })
    }

    /// Build a spec from a pair-structured attribute.
    ///
    /// Each row must have exactly two entries. With [`PadLayout::Split`] the
    /// rows are a width-2 packing of a split flat list and are re-paired by
    /// dimension order.
    pub fn from_nested(rows: &[Vec<i64>], layout: PadLayout) -> Result<PaddingSpec, InferError> {
        for row in rows {
            if row.len() != 2 {
                return Err(InferError::ShapeMismatch(
                    "padding pairs must have exactly two entries",
                ));
            }
        }
        match layout {
            PadLayout::Paired => Ok(PaddingSpec {
                pairs: rows.iter().map(|row| (row[0], row[1])).collect(),
            }),
            PadLayout::Split => {
                let flat: Vec<i64> = rows.iter().flatten().copied().collect();
                PaddingSpec::from_flat(&flat, PadLayout::Split)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Combined `before + after` amount for dimension `i`.
    pub fn total(&self, i: usize) -> i64 {
        let (before, after) = self.pairs[i];
        before + after
    }
}

/// Shared core: add padding amounts to a shape and its ranges.
///
/// A dynamic dimension keeps its marker and the shift lands on its range
/// instead. The attribute- and tensor-defined variants behave identically
/// here; padding amounts are compile-time values in both by the time they
/// reach the core.
fn pad_shape_and_range(input: &TensorDesc, spec: &PaddingSpec) -> Result<TensorDesc, InferError> {
    // Nothing about padding can be known without a rank.
    let Some(dims) = input.shape.dims() else {
        return Ok(TensorDesc::new(Shape::UnknownRank, input.dtype));
    };

    if spec.len() != dims.len() {
        return Err(InferError::ShapeMismatch(
            "padding entries must match input rank",
        ));
    }

    let out_dims: DimVec = dims
        .iter()
        .enumerate()
        .map(|(i, dim)| dim.offset(spec.total(i)))
        .collect();

    let out_ranges = input.ranges.as_ref().map(|ranges| {
        ranges
            .iter()
            .enumerate()
            .map(|(i, range)| range.offset_add(spec.total(i)))
            .collect::<Vec<_>>()
    });

    let mut out = TensorDesc::new(Shape::from_dims(out_dims), input.dtype);
    if let Some(ranges) = out_ranges {
        out = out.with_ranges(ranges);
    }
    Ok(out)
}

/// Degraded result for a tensor-defined variant whose padding input is not a
/// compile-time constant: rank is preserved but every extent becomes dynamic,
/// with made-up `(1, unbounded)` bounds. Deliberate information loss, not an
/// error.
fn degraded_pad_output(input: &TensorDesc) -> TensorDesc {
    match input.rank() {
        None => TensorDesc::new(Shape::UnknownRank, input.dtype),
        Some(rank) => {
            // A scalar still produces one padded dimension.
            let shape = Shape::dynamic(rank.max(1));
            let ranges = default_ranges(&shape).unwrap_or_default();
            TensorDesc::new(shape, input.dtype).with_ranges(ranges)
        }
    }
}

/// Shared entry point for the attribute-defined variants.
fn infer_attr_pad(node: &mut dyn GraphNode, layout: PadLayout) -> Result<(), InferError> {
    let rows = attr_int_list_list(node, "paddings")?.to_vec();
    let input = require_input(node, "x")?.clone();

    if input.shape == Shape::UnknownRank {
        return write_output(node, "y", TensorDesc::new(Shape::UnknownRank, input.dtype));
    }

    let spec = PaddingSpec::from_nested(&rows, layout)?;
    let out = pad_shape_and_range(&input, &spec)?;
    write_output(node, "y", out)
}

/// Shared entry point for the tensor-defined variants.
fn infer_tensor_pad(node: &mut dyn GraphNode, layout: PadLayout) -> Result<(), InferError> {
    let input = require_input(node, "x")?.clone();

    let Some(value) = node.const_input("paddings") else {
        return write_output(node, "y", degraded_pad_output(&input));
    };
    let flat = value.to_dims()?;

    if input.shape == Shape::UnknownRank {
        return write_output(node, "y", TensorDesc::new(Shape::UnknownRank, input.dtype));
    }

    // A scalar input pads as a one-element vector.
    let input = if input.rank() == Some(0) {
        TensorDesc {
            shape: Shape::fixed(&[1]),
            ..input
        }
    } else {
        input
    };

    let spec = PaddingSpec::from_flat(&flat, layout)?;
    let out = pad_shape_and_range(&input, &spec)?;
    write_output(node, "y", out)
}

/// Return the layout selected by the `paddings_contiguous` attribute, which
/// defaults to true (paired).
fn v3_layout(node: &dyn GraphNode) -> PadLayout {
    if attr_bool_or(node, "paddings_contiguous", true) {
        PadLayout::Paired
    } else {
        PadLayout::Split
    }
}

/// Pad operator: padding amounts come from the `paddings` input tensor.
pub struct Pad;

impl InferShapes for Pad {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError> {
        infer_tensor_pad(node, PadLayout::Paired)
    }
}

/// PadD operator: padding amounts come from the `paddings` attribute.
pub struct PadD;

impl InferShapes for PadD {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError> {
        infer_attr_pad(node, PadLayout::Paired)
    }
}

/// PadV2 operator. Pads with a constant value; the value input does not
/// affect the output shape, so inference matches [`Pad`].
pub struct PadV2;

impl InferShapes for PadV2 {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError> {
        infer_tensor_pad(node, PadLayout::Paired)
    }
}

/// PadV2D operator: the attribute-defined form of [`PadV2`].
pub struct PadV2D;

impl InferShapes for PadV2D {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError> {
        infer_attr_pad(node, PadLayout::Paired)
    }
}

/// PadV3 operator. Like [`Pad`] but the `paddings_contiguous` attribute
/// (default true) selects between paired and split list layouts.
pub struct PadV3;

impl InferShapes for PadV3 {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError> {
        let layout = v3_layout(node);
        infer_tensor_pad(node, layout)
    }
}

/// PadV3D operator: the attribute-defined form of [`PadV3`].
pub struct PadV3D;

impl InferShapes for PadV3D {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError> {
        let layout = v3_layout(node);
        infer_attr_pad(node, layout)
    }
}
