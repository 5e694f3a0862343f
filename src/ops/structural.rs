//! Diag and the fixed-rank hardware-layout operators.

use crate::descriptor::{DataType, Dim, DimVec, Shape, TensorDesc};
use crate::infer::{
    attr_int, replace_dim, require_input, with_rank, with_rank_at_least, write_output, InferError,
    InferShapes,
};
use crate::node::GraphNode;

/// Diag operator: builds a diagonal tensor, so the output shape is the input
/// shape concatenated with itself.
pub struct Diag;

impl InferShapes for Diag {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError> {
        let input = require_input(node, "x")?;
        let dtype = input.dtype;

        let out_shape = match input.shape.dims() {
            Some(dims) => {
                let mut doubled: DimVec = dims.iter().copied().collect();
                doubled.extend_from_slice(dims);
                Shape::from_dims(doubled)
            }
            None => Shape::UnknownRank,
        };

        write_output(node, "y", TensorDesc::new(out_shape, dtype))
    }
}

/// AscendPadding operator: widens the trailing unit dimension of a
/// `(..., 1)` tensor to `pad_dim_size`.
pub struct AscendPadding;

impl InferShapes for AscendPadding {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError> {
        let input = require_input(node, "x")?;
        let dims = with_rank_at_least(input, 2, "x must have rank at least 2")?;
        let dtype = input.dtype;

        let last = dims.len() - 1;
        if dims[last] != Dim::Fixed(1) {
            return Err(InferError::ShapeMismatch("the last dimension of x must be 1"));
        }

        let pad_dim_size = attr_int(node, "pad_dim_size")?;
        if pad_dim_size <= 0 {
            return Err(InferError::InvalidAttributeRange(
                "pad_dim_size must be positive",
            ));
        }

        let out_dims = replace_dim(dims, last, Dim::Fixed(pad_dim_size));
        write_output(node, "y", TensorDesc::new(Shape::from_dims(out_dims), dtype))
    }
}

/// EmbeddingRankId operator: maps each lookup index to a row of the
/// `(hosts, 3)` address table. The output is always unsigned 64-bit.
pub struct EmbeddingRankId;

impl InferShapes for EmbeddingRankId {
    fn infer(&self, node: &mut dyn GraphNode) -> Result<(), InferError> {
        let addr_table = require_input(node, "addr_table")?;
        let addr_dims = with_rank(addr_table, 2, "addr_table must have rank 2")?;

        if addr_dims[1] != Dim::Fixed(3) {
            return Err(InferError::ShapeMismatch(
                "the last dimension of addr_table must be 3",
            ));
        }
        match addr_dims[0].fixed() {
            Some(hosts) if hosts > 0 => {}
            _ => {
                return Err(InferError::ShapeMismatch(
                    "the first dimension of addr_table must be positive",
                ))
            }
        }

        let index = require_input(node, "index")?;
        let index_dims = with_rank(index, 1, "index must have rank 1")?;
        let index_len = index_dims[0];

        let row_memory = attr_int(node, "row_memory")?;
        if row_memory <= 0 {
            return Err(InferError::InvalidAttributeRange(
                "row_memory must be positive",
            ));
        }

        let out_dims = replace_dim(addr_dims, 0, index_len);
        write_output(
            node,
            "rank_id",
            TensorDesc::new(Shape::from_dims(out_dims), DataType::Uint64),
        )
    }
}

#[cfg(test)]
mod tests {
    use ngc_testing::TestCases;

    use super::{AscendPadding, Diag, EmbeddingRankId, InferShapes};
    use crate::descriptor::{DataType, Dim, Shape, TensorDesc};
    use crate::infer::InferError;
    use crate::node::{AttrValue, GraphNode, Node};

    #[test]
    fn test_diag_doubles_rank() {
        #[derive(Debug)]
        struct Case {
            input: Shape,
            expected: Shape,
        }

        let cases = [
            Case {
                input: Shape::fixed(&[5, 7]),
                expected: Shape::fixed(&[5, 7, 5, 7]),
            },
            Case {
                input: Shape::fixed(&[3]),
                expected: Shape::fixed(&[3, 3]),
            },
            Case {
                input: Shape::Dims([Dim::Unknown, Dim::Fixed(2)].into_iter().collect()),
                expected: Shape::Dims(
                    [Dim::Unknown, Dim::Fixed(2), Dim::Unknown, Dim::Fixed(2)]
                        .into_iter()
                        .collect(),
                ),
            },
            Case {
                input: Shape::UnknownRank,
                expected: Shape::UnknownRank,
            },
        ];

        cases.test_each(|case| {
            let mut node = Node::new("diag")
                .with_input("x", TensorDesc::new(case.input.clone(), DataType::Float32))
                .with_output("y", TensorDesc::new(Shape::UnknownRank, DataType::Int32));
            Diag.infer(&mut node).unwrap();

            let out = node.output("y").unwrap();
            assert_eq!(out.shape, case.expected);
            assert_eq!(out.dtype, DataType::Float32);
            assert_eq!(out.ranges, None);
        });
    }

    fn ascend_padding_node(input_shape: Shape, pad_dim_size: i64) -> Node {
        Node::new("ascend_padding")
            .with_input("x", TensorDesc::new(input_shape, DataType::Float32))
            .with_output("y", TensorDesc::new(Shape::UnknownRank, DataType::Float32))
            .with_attr("pad_dim_size", AttrValue::Int(pad_dim_size))
    }

    #[test]
    fn test_ascend_padding() {
        let mut node = ascend_padding_node(Shape::fixed(&[4, 1]), 8);
        AscendPadding.infer(&mut node).unwrap();
        assert_eq!(node.output("y").unwrap().shape, Shape::fixed(&[4, 8]));

        let mut node = ascend_padding_node(Shape::fixed(&[2, 6, 1]), 32);
        AscendPadding.infer(&mut node).unwrap();
        assert_eq!(node.output("y").unwrap().shape, Shape::fixed(&[2, 6, 32]));
    }

    #[test]
    fn test_ascend_padding_invalid() {
        #[derive(Debug)]
        struct Case {
            input: Shape,
            pad_dim_size: i64,
            expected: InferError,
        }

        let cases = [
            Case {
                input: Shape::fixed(&[4]),
                pad_dim_size: 8,
                expected: InferError::RankViolation("x must have rank at least 2"),
            },
            Case {
                input: Shape::UnknownRank,
                pad_dim_size: 8,
                expected: InferError::RankViolation("x must have rank at least 2"),
            },
            Case {
                input: Shape::fixed(&[4, 2]),
                pad_dim_size: 8,
                expected: InferError::ShapeMismatch("the last dimension of x must be 1"),
            },
            Case {
                input: Shape::fixed(&[4, 1]),
                pad_dim_size: 0,
                expected: InferError::InvalidAttributeRange("pad_dim_size must be positive"),
            },
        ];

        cases.test_each(|case| {
            let mut node = ascend_padding_node(case.input.clone(), case.pad_dim_size);
            assert_eq!(AscendPadding.infer(&mut node), Err(case.expected.clone()));
            // Failure leaves the placeholder output untouched.
            assert_eq!(node.output("y").unwrap().shape, Shape::UnknownRank);
        });
    }

    fn embedding_rank_id_node(addr_shape: Shape, index_shape: Shape, row_memory: i64) -> Node {
        Node::new("embedding_rank_id")
            .with_input("addr_table", TensorDesc::new(addr_shape, DataType::Uint64))
            .with_input("index", TensorDesc::new(index_shape, DataType::Int32))
            .with_output(
                "rank_id",
                TensorDesc::new(Shape::UnknownRank, DataType::Float32),
            )
            .with_attr("row_memory", AttrValue::Int(row_memory))
    }

    #[test]
    fn test_embedding_rank_id() {
        let mut node = embedding_rank_id_node(Shape::fixed(&[10, 3]), Shape::fixed(&[6]), 256);
        EmbeddingRankId.infer(&mut node).unwrap();

        let out = node.output("rank_id").unwrap();
        assert_eq!(out.shape, Shape::fixed(&[6, 3]));
        assert_eq!(out.dtype, DataType::Uint64);
    }

    #[test]
    fn test_embedding_rank_id_invalid() {
        #[derive(Debug)]
        struct Case {
            addr_shape: Shape,
            index_shape: Shape,
            row_memory: i64,
            expected: InferError,
        }

        let cases = [
            Case {
                addr_shape: Shape::fixed(&[10, 3, 1]),
                index_shape: Shape::fixed(&[6]),
                row_memory: 256,
                expected: InferError::RankViolation("addr_table must have rank 2"),
            },
            Case {
                addr_shape: Shape::fixed(&[10, 4]),
                index_shape: Shape::fixed(&[6]),
                row_memory: 256,
                expected: InferError::ShapeMismatch("the last dimension of addr_table must be 3"),
            },
            Case {
                addr_shape: Shape::fixed(&[0, 3]),
                index_shape: Shape::fixed(&[6]),
                row_memory: 256,
                expected: InferError::ShapeMismatch(
                    "the first dimension of addr_table must be positive",
                ),
            },
            Case {
                addr_shape: Shape::fixed(&[10, 3]),
                index_shape: Shape::fixed(&[6, 1]),
                row_memory: 256,
                expected: InferError::RankViolation("index must have rank 1"),
            },
            Case {
                addr_shape: Shape::fixed(&[10, 3]),
                index_shape: Shape::fixed(&[6]),
                row_memory: 0,
                expected: InferError::InvalidAttributeRange("row_memory must be positive"),
            },
        ];

        cases.test_each(|case| {
            let mut node = embedding_rank_id_node(
                case.addr_shape.clone(),
                case.index_shape.clone(),
                case.row_memory,
            );
            assert_eq!(EmbeddingRankId.infer(&mut node), Err(case.expected.clone()));
            assert_eq!(node.output("rank_id").unwrap().shape, Shape::UnknownRank);
        });
    }
}
