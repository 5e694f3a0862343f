//! The BroadcastTo operator pair.

use crate::descriptor::{DimRange, Shape, TensorDesc};
use crate::infer::{
    attr_int_list, check_dims_attr_len, require_input, write_output, InferError, InferShapes,
};
use crate::node::GraphNode;

/// BroadcastTo operator: the target extents come from the values of the
/// 1-D `shape` input tensor; data and element type come from `x`.
pub struct BroadcastTo;

impl InferShapes for BroadcastTo {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError> {
        let dtype = require_input(node, "x")?.dtype;

        let Some(value) = node.const_input("shape") else {
            let shape_input = require_input(node, "shape")?;

            // The shape input is itself a vector of target extents, so its
            // own rank can be at most 1.
            let dims = match shape_input.shape.dims() {
                Some(dims) if dims.len() <= 1 => dims,
                _ => {
                    return Err(InferError::ShapeMismatch(
                        "shape input must be a vector of target extents",
                    ))
                }
            };

            // The number of target extents gives the output rank even though
            // the extents themselves are unknown.
            let out = if dims.is_empty() {
                // A scalar shape input broadcasts to a scalar.
                TensorDesc::new(Shape::fixed(&[]), dtype)
            } else if let Some(len) = dims[0].fixed() {
                let shape = Shape::dynamic(len as usize);
                let ranges = vec![DimRange::widen_unbounded(1); len as usize];
                TensorDesc::new(shape, dtype).with_ranges(ranges)
            } else {
                // Dynamic extent count: not even the rank is known.
                TensorDesc::new(Shape::UnknownRank, dtype)
            };
            return write_output(node, "y", out);
        };

        let extents = value.to_dims()?;
        let ranges: Vec<DimRange> = extents.iter().map(|&e| DimRange::pin_exact(e)).collect();
        let out = TensorDesc::new(Shape::fixed(&extents), dtype).with_ranges(ranges);
        write_output(node, "y", out)
    }
}

/// BroadcastToD operator: the target extents come from the `shape`
/// attribute.
pub struct BroadcastToD;

impl InferShapes for BroadcastToD {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError> {
        let extents = attr_int_list(node, "shape")?.to_vec();
        check_dims_attr_len(extents.len(), "shape length must be between 1 and 8")?;
        let dtype = require_input(node, "x")?.dtype;
        write_output(node, "y", TensorDesc::new(Shape::fixed(&extents), dtype))
    }
}
