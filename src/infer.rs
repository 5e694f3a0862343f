//! The shape inference trait, its error type and shared helpers.

use std::error::Error;
use std::fmt;
use std::fmt::Display;

use crate::descriptor::{Dim, DimVec, TensorDesc};
use crate::node::{AttrValue, GraphNode};

/// Reasons why shape inference may fail for a node.
///
/// Every variant is fatal for the node: the host decides whether to abort
/// compilation or mark the node invalid. An input whose constant value cannot
/// be resolved is *not* an error; that case is the `None` arm of
/// [`GraphNode::const_input`] and routes into a deliberately widened dynamic
/// result.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InferError {
    /// Input shapes, padding lengths or pair widths are inconsistent.
    ShapeMismatch(&'static str),

    /// A required compile-time attribute is absent or has the wrong type.
    AttributeMissing(&'static str),

    /// A resolved constant's element type is neither 32- nor 64-bit integer.
    UnsupportedElementType,

    /// An attribute violates a bounded-length or positivity constraint.
    InvalidAttributeRange(&'static str),

    /// An input does not satisfy a required minimum or exact rank.
    RankViolation(&'static str),

    /// The node does not declare an input or output slot the operator needs.
    MissingInput(&'static str),
}

impl Display for InferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferError::ShapeMismatch(details) => write!(f, "shape mismatch: {}", details),
            InferError::AttributeMissing(name) => {
                write!(f, "required attribute \"{}\" is missing or mistyped", name)
            }
            InferError::UnsupportedElementType => {
                write!(f, "constant element type must be int32 or int64")
            }
            InferError::InvalidAttributeRange(details) => {
                write!(f, "attribute out of range: {}", details)
            }
            InferError::RankViolation(details) => write!(f, "rank violation: {}", details),
            InferError::MissingInput(name) => {
                write!(f, "node does not declare slot \"{}\"", name)
            }
        }
    }
}

impl Error for InferError {}

/// Compute a node's output descriptor(s) from its input descriptors,
/// attributes and constant-folded inputs.
///
/// There is one implementing struct per operator kind. All results are
/// written back onto the node in place; on error no descriptor is modified.
/// Calls are idempotent: re-running with identical inputs rewrites identical
/// descriptors.
pub trait InferShapes {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError>;
}

/// Fetch a required input descriptor or fail with [`InferError::MissingInput`].
pub(crate) fn require_input<'a>(
    node: &'a dyn GraphNode,
    name: &'static str,
) -> Result<&'a TensorDesc, InferError> {
    node.input(name).ok_or(InferError::MissingInput(name))
}

/// Overwrite the named output descriptor.
///
/// Callers must have finished all validation: this is the success write.
pub(crate) fn write_output(
    node: &mut dyn GraphNode,
    name: &'static str,
    desc: TensorDesc,
) -> Result<(), InferError> {
    let out = node.output_mut(name).ok_or(InferError::MissingInput(name))?;
    *out = desc;
    Ok(())
}

/// Require a ranked shape with exactly `rank` dimensions.
pub(crate) fn with_rank<'a>(
    desc: &'a TensorDesc,
    rank: usize,
    context: &'static str,
) -> Result<&'a [Dim], InferError> {
    match desc.shape.dims() {
        Some(dims) if dims.len() == rank => Ok(dims),
        _ => Err(InferError::RankViolation(context)),
    }
}

/// Require a ranked shape with at least `rank` dimensions.
pub(crate) fn with_rank_at_least<'a>(
    desc: &'a TensorDesc,
    rank: usize,
    context: &'static str,
) -> Result<&'a [Dim], InferError> {
    match desc.shape.dims() {
        Some(dims) if dims.len() >= rank => Ok(dims),
        _ => Err(InferError::RankViolation(context)),
    }
}

/// Copy `dims` with the dimension at `index` replaced.
pub(crate) fn replace_dim(dims: &[Dim], index: usize, dim: Dim) -> DimVec {
    let mut out: DimVec = dims.iter().copied().collect();
    out[index] = dim;
    out
}

/// Fetch a required integer attribute.
pub(crate) fn attr_int(node: &dyn GraphNode, name: &'static str) -> Result<i64, InferError> {
    match node.attr(name) {
        Some(AttrValue::Int(value)) => Ok(*value),
        _ => Err(InferError::AttributeMissing(name)),
    }
}

/// Fetch a required integer-list attribute.
pub(crate) fn attr_int_list<'a>(
    node: &'a dyn GraphNode,
    name: &'static str,
) -> Result<&'a [i64], InferError> {
    match node.attr(name) {
        Some(AttrValue::IntList(values)) => Ok(values),
        _ => Err(InferError::AttributeMissing(name)),
    }
}

/// Fetch a required nested integer-list attribute.
pub(crate) fn attr_int_list_list<'a>(
    node: &'a dyn GraphNode,
    name: &'static str,
) -> Result<&'a [Vec<i64>], InferError> {
    match node.attr(name) {
        Some(AttrValue::IntListList(values)) => Ok(values),
        _ => Err(InferError::AttributeMissing(name)),
    }
}

/// Fetch an optional boolean attribute, defaulting when absent or mistyped.
pub(crate) fn attr_bool_or(node: &dyn GraphNode, name: &str, default: bool) -> bool {
    match node.attr(name) {
        Some(AttrValue::Bool(value)) => *value,
        _ => default,
    }
}

/// Validate the `[1, 8]` length bound that the operator catalog places on
/// attribute-defined dims/shape lists.
pub(crate) fn check_dims_attr_len(len: usize, context: &'static str) -> Result<(), InferError> {
    if (1..=8).contains(&len) {
        Ok(())
    } else {
        Err(InferError::InvalidAttributeRange(context))
    }
}
