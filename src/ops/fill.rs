//! The Fill operator family.
//!
//! `Fill` and `FillV2` read the output extents from the *values* of a 1-D
//! `dims` input tensor; the `value` input contributes only its element type.
//! Resolving the dims constant also tells us the total element count, which
//! is propagated back upstream by tightening the range of the `dims` input
//! itself — the only feedback write onto an input descriptor in the catalog.
//! `FillD` and `FillV2D` read the extents from an attribute instead.

use crate::descriptor::{DataType, DimRange, Shape, TensorDesc};
use crate::infer::{
    attr_int_list, check_dims_attr_len, require_input, write_output, InferError, InferShapes,
};
use crate::node::{Constant, GraphNode};

/// Range tightening to apply to an input descriptor as a by-product of
/// inferring the output.
///
/// Modeled as an explicit value rather than a hidden mutation so that who
/// writes which descriptor stays visible and the pure core stays testable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InputFeedback {
    /// Name of the input slot to tighten.
    pub input: &'static str,
    /// Replacement ranges, one per dimension of that input's shape.
    pub ranges: Vec<DimRange>,
}

/// Result of a pure inference core: the output descriptor plus any feedback
/// write for an input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InferOutcome {
    pub output: TensorDesc,
    pub feedback: Option<InputFeedback>,
}

impl InferOutcome {
    fn output_only(output: TensorDesc) -> InferOutcome {
        InferOutcome {
            output,
            feedback: None,
        }
    }

    /// Apply the output (and any feedback) to the node. The success write.
    fn apply(self, node: &mut dyn GraphNode, output_name: &'static str) -> Result<(), InferError> {
        // Both slots must exist before either write happens, so a missing
        // output cannot leave the feedback half-applied.
        if node.output(output_name).is_none() {
            return Err(InferError::MissingInput(output_name));
        }
        if let Some(feedback) = self.feedback {
            let input = node
                .input_mut(feedback.input)
                .ok_or(InferError::MissingInput(feedback.input))?;
            input.ranges = Some(feedback.ranges);
        }
        write_output(node, output_name, self.output)
    }
}

/// Pure core for the tensor-driven Fill variants.
///
/// `resolved` is the constant-folded value of the `dims` input, if the
/// resolver found one.
fn fill_outcome(
    dims_input: &TensorDesc,
    value_dtype: DataType,
    resolved: Option<&Constant>,
) -> Result<InferOutcome, InferError> {
    let Some(value) = resolved else {
        // Degrade: the dims *values* are unknown, but the dims tensor's own
        // first extent is the number of output dimensions.
        let Some(dims) = dims_input.shape.dims() else {
            return Ok(InferOutcome::output_only(TensorDesc::new(
                Shape::UnknownRank,
                value_dtype,
            )));
        };

        // Whatever the eventual dims turn out to be, each is at least 1.
        let feedback = Some(InputFeedback {
            input: "dims",
            ranges: vec![DimRange::widen_unbounded(1); dims.len()],
        });

        let rank = dims.first().and_then(|dim| dim.fixed()).unwrap_or(0);
        let output = if rank > 0 {
            let shape = Shape::dynamic(rank as usize);
            let ranges = vec![DimRange::widen_unbounded(1); rank as usize];
            TensorDesc::new(shape, value_dtype).with_ranges(ranges)
        } else {
            // Zero or dynamic dims count: even the output rank is unknown.
            TensorDesc::new(Shape::UnknownRank, value_dtype)
        };
        return Ok(InferOutcome { output, feedback });
    };

    let extents = value.to_dims()?;
    if extents.iter().any(|&e| e < 0) {
        return Err(InferError::ShapeMismatch("dims values must be non-negative"));
    }
    let ranges: Vec<DimRange> = extents.iter().map(|&e| DimRange::pin_exact(e)).collect();
    let output = TensorDesc::new(Shape::fixed(&extents), value_dtype).with_ranges(ranges);

    // The product of the extents is the exact element count the dims input
    // describes; pin its range to it. Saturate rather than wrap on absurdly
    // large extents.
    let product: i64 = extents.iter().fold(1i64, |acc, &e| acc.saturating_mul(e));
    let feedback = dims_input.rank().map(|rank| InputFeedback {
        input: "dims",
        ranges: vec![DimRange::pin_exact(product); rank],
    });

    Ok(InferOutcome { output, feedback })
}

/// Shared entry point for the tensor-driven variants.
fn infer_tensor_fill(node: &mut dyn GraphNode) -> Result<(), InferError> {
    let dims_input = require_input(node, "dims")?.clone();
    let value_dtype = require_input(node, "value")?.dtype;
    let resolved = node.const_input("dims");

    let outcome = fill_outcome(&dims_input, value_dtype, resolved.as_ref())?;
    outcome.apply(node, "y")
}

/// Fill operator: output extents come from the `dims` input tensor's values,
/// the element type from the `value` input.
pub struct Fill;

impl InferShapes for Fill {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError> {
        infer_tensor_fill(node)
    }
}

/// FillV2 operator. Shape inference matches [`Fill`].
pub struct FillV2;

impl InferShapes for FillV2 {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError> {
        infer_tensor_fill(node)
    }
}

/// FillD operator: output extents come from the `dims` attribute, the
/// element type from the `value` input.
pub struct FillD;

impl InferShapes for FillD {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError> {
        let extents = attr_int_list(node, "dims")?.to_vec();
        check_dims_attr_len(extents.len(), "dims length must be between 1 and 8")?;
        let value_dtype = require_input(node, "value")?.dtype;
        write_output(node, "y", TensorDesc::new(Shape::fixed(&extents), value_dtype))
    }
}

/// FillV2D operator. Like [`FillD`] but the output element type is always
/// 32-bit float, regardless of any inputs. The asymmetry with `FillD` is part
/// of the catalog.
pub struct FillV2D;

impl InferShapes for FillV2D {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError> {
        let extents = attr_int_list(node, "dims")?.to_vec();
        check_dims_attr_len(extents.len(), "dims length must be between 1 and 8")?;
        write_output(
            node,
            "y",
            TensorDesc::new(Shape::fixed(&extents), DataType::Float32),
        )
    }
}

#[cfg(test)]
mod tests {
    use ngc_testing::TestCases;

    use super::{fill_outcome, Fill, FillD, FillV2D, InferShapes, InputFeedback};
    use crate::descriptor::{DataType, DimRange, Shape, TensorDesc};
    use crate::infer::InferError;
    use crate::node::{AttrValue, Constant, GraphNode, Node};

    fn fill_node(dims_desc: TensorDesc) -> Node {
        Node::new("fill")
            .with_input("dims", dims_desc)
            .with_input(
                "value",
                TensorDesc::new(Shape::fixed(&[]), DataType::Float32),
            )
            .with_output("y", TensorDesc::new(Shape::UnknownRank, DataType::Float32))
    }

    #[test]
    fn test_fill_resolved_pins_output_and_dims_range() {
        let mut node = fill_node(TensorDesc::new(Shape::fixed(&[3]), DataType::Int32))
            .with_const_input("dims", Constant::Int32(vec![2, 3, 4]));
        Fill.infer(&mut node).unwrap();

        let out = node.output("y").unwrap();
        assert_eq!(out.shape, Shape::fixed(&[2, 3, 4]));
        assert_eq!(out.dtype, DataType::Float32);
        assert_eq!(
            out.ranges,
            Some(vec![
                DimRange::pin_exact(2),
                DimRange::pin_exact(3),
                DimRange::pin_exact(4),
            ])
        );

        // The total element count propagates upstream onto the dims input.
        assert_eq!(
            node.input("dims").unwrap().ranges,
            Some(vec![DimRange::pin_exact(24)])
        );
    }

    #[test]
    fn test_fill_unresolved_uses_dims_input_shape() {
        let mut node = fill_node(TensorDesc::new(Shape::fixed(&[3]), DataType::Int32));
        Fill.infer(&mut node).unwrap();

        let out = node.output("y").unwrap();
        assert_eq!(out.shape, Shape::dynamic(3));
        assert_eq!(out.ranges, Some(vec![DimRange::widen_unbounded(1); 3]));
        assert_eq!(
            node.input("dims").unwrap().ranges,
            Some(vec![DimRange::widen_unbounded(1)])
        );
    }

    #[test]
    fn test_fill_unresolved_degenerate_dims_shapes() {
        #[derive(Debug)]
        struct Case {
            dims_desc: TensorDesc,
            expected_shape: Shape,
        }

        let cases = [
            // Unknown dims count collapses the output to unknown rank.
            Case {
                dims_desc: TensorDesc::new(Shape::dynamic(1), DataType::Int32),
                expected_shape: Shape::UnknownRank,
            },
            Case {
                dims_desc: TensorDesc::new(Shape::fixed(&[0]), DataType::Int32),
                expected_shape: Shape::UnknownRank,
            },
            Case {
                dims_desc: TensorDesc::new(Shape::UnknownRank, DataType::Int32),
                expected_shape: Shape::UnknownRank,
            },
        ];

        cases.test_each(|case| {
            let mut node = fill_node(case.dims_desc.clone());
            Fill.infer(&mut node).unwrap();
            assert_eq!(node.output("y").unwrap().shape, case.expected_shape);
        });
    }

    #[test]
    fn test_fill_outcome_feedback_is_explicit() {
        let dims_input = TensorDesc::new(Shape::fixed(&[2]), DataType::Int64);
        let resolved = Constant::Int64(vec![4, 5]);
        let outcome = fill_outcome(&dims_input, DataType::Float16, Some(&resolved)).unwrap();

        assert_eq!(outcome.output.shape, Shape::fixed(&[4, 5]));
        assert_eq!(outcome.output.dtype, DataType::Float16);
        assert_eq!(
            outcome.feedback,
            Some(InputFeedback {
                input: "dims",
                ranges: vec![DimRange::pin_exact(20)],
            })
        );
    }

    #[test]
    fn test_fill_reruns_are_idempotent() {
        let mut node = fill_node(TensorDesc::new(Shape::fixed(&[3]), DataType::Int32))
            .with_const_input("dims", Constant::Int32(vec![2, 3, 4]));
        Fill.infer(&mut node).unwrap();
        let first_output = node.output("y").unwrap().clone();
        let first_dims = node.input("dims").unwrap().clone();

        // A second run sees the tightened dims range and must settle on the
        // same result.
        Fill.infer(&mut node).unwrap();
        assert_eq!(node.output("y").unwrap(), &first_output);
        assert_eq!(node.input("dims").unwrap(), &first_dims);
    }

    #[test]
    fn test_fill_missing_output_leaves_dims_untouched() {
        // The feedback write must not land if the output slot is absent.
        let mut node = Node::new("fill")
            .with_input("dims", TensorDesc::new(Shape::fixed(&[3]), DataType::Int32))
            .with_input(
                "value",
                TensorDesc::new(Shape::fixed(&[]), DataType::Float32),
            )
            .with_const_input("dims", Constant::Int32(vec![2, 3, 4]));
        assert_eq!(Fill.infer(&mut node), Err(InferError::MissingInput("y")));
        assert_eq!(node.input("dims").unwrap().ranges, None);
    }

    #[test]
    fn test_fill_rejects_negative_dims() {
        let mut node = fill_node(TensorDesc::new(Shape::fixed(&[2]), DataType::Int32))
            .with_const_input("dims", Constant::Int32(vec![2, -1]));
        assert_eq!(
            Fill.infer(&mut node),
            Err(InferError::ShapeMismatch("dims values must be non-negative"))
        );
        assert_eq!(node.input("dims").unwrap().ranges, None);
        assert_eq!(node.output("y").unwrap().shape, Shape::UnknownRank);
    }

    #[test]
    fn test_fill_rejects_float_dims() {
        let mut node = fill_node(TensorDesc::new(Shape::fixed(&[2]), DataType::Float32))
            .with_const_input("dims", Constant::Float32(vec![2.0, 3.0]));
        assert_eq!(
            Fill.infer(&mut node),
            Err(InferError::UnsupportedElementType)
        );
        // No partial writes on failure.
        assert_eq!(node.input("dims").unwrap().ranges, None);
        assert_eq!(node.output("y").unwrap().shape, Shape::UnknownRank);
    }

    #[test]
    fn test_fill_d() {
        let mut node = Node::new("fill_d")
            .with_input(
                "value",
                TensorDesc::new(Shape::fixed(&[]), DataType::Int64),
            )
            .with_output("y", TensorDesc::new(Shape::UnknownRank, DataType::Float32))
            .with_attr("dims", AttrValue::IntList(vec![2, 7]));
        FillD.infer(&mut node).unwrap();

        let out = node.output("y").unwrap();
        assert_eq!(out.shape, Shape::fixed(&[2, 7]));
        assert_eq!(out.dtype, DataType::Int64);
        assert_eq!(out.ranges, None);
    }

    #[test]
    fn test_fill_v2_d_forces_float() {
        let mut node = Node::new("fill_v2_d")
            .with_output("y", TensorDesc::new(Shape::UnknownRank, DataType::Int32))
            .with_attr("dims", AttrValue::IntList(vec![4]));
        FillV2D.infer(&mut node).unwrap();

        let out = node.output("y").unwrap();
        assert_eq!(out.shape, Shape::fixed(&[4]));
        assert_eq!(out.dtype, DataType::Float32);
    }

    #[test]
    fn test_fill_attr_dims_length_bounds() {
        #[derive(Debug)]
        struct Case {
            dims: Vec<i64>,
            ok: bool,
        }

        let cases = [
            Case {
                dims: vec![],
                ok: false,
            },
            Case {
                dims: vec![1],
                ok: true,
            },
            Case {
                dims: (1..=8).collect(),
                ok: true,
            },
            Case {
                dims: (1..=9).collect(),
                ok: false,
            },
        ];

        cases.test_each(|case| {
            let mut node = Node::new("fill_v2_d")
                .with_output("y", TensorDesc::new(Shape::UnknownRank, DataType::Float32))
                .with_attr("dims", AttrValue::IntList(case.dims.clone()));
            let result = FillV2D.infer(&mut node);
            if case.ok {
                result.unwrap();
            } else {
                assert_eq!(
                    result,
                    Err(InferError::InvalidAttributeRange(
                        "dims length must be between 1 and 8"
                    ))
                );
            }
        });
    }
}
