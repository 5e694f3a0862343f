//! Shape inference for tensor-graph operators.
//!
//! # About shape inference
//!
//! A tensor-graph compiler needs to know the shape, element type and likely
//! size bounds of every value in the graph long before any data exists:
//! memory planning, operator selection and graph optimization all depend on
//! it. Graph inputs may have dynamic dimensions (a batch size, a sequence
//! length), so inference works over a three-valued representation of shape
//! knowledge: every extent known, some extents dynamic but the rank known,
//! or the rank itself unknown.
//!
//! The engine in this crate covers a family of operators whose output shapes
//! follow from padding arithmetic, shape-describing constant inputs or
//! structural rules: the Pad family, the Fill family, BroadcastTo, Diag and
//! two hardware-layout operators. Each inference call reads a node's input
//! descriptors, attributes and (for tensor-driven variants) constant-folded
//! input values, and writes the resulting output descriptor back onto the
//! node in place. Per-dimension range bounds are carried alongside shapes
//! and transformed under the same operations, so a downstream consumer
//! knows not just that a dimension is dynamic but how large it may get.
//!
//! Constant resolution may legitimately fail: a padding or shape input whose
//! producer is not constant-like simply has no compile-time value. Every
//! tensor-driven operator has a defined degraded result for that case —
//! typically the input rank with all extents dynamic and widened bounds —
//! so unresolvable constants never abort compilation.
//!
//! # Crate overview
//!
//! The main export is the [`InferShapes`] trait plus the types which
//! implement it in [`ops`], one per operator kind. Operators see the graph
//! through the [`GraphNode`] trait, which the host compiler implements over
//! its own node storage; [`Node`] is a ready-made in-memory implementation.
//!
//! ```
//! use ngc_shape_inference::ops::Diag;
//! use ngc_shape_inference::{
//!     DataType, GraphNode, InferShapes, Node, Shape, TensorDesc,
//! };
//!
//! let mut node = Node::new("diag_1")
//!     .with_input("x", TensorDesc::new(Shape::fixed(&[5, 7]), DataType::Float32))
//!     .with_output("y", TensorDesc::new(Shape::UnknownRank, DataType::Float32));
//! Diag.infer(&mut node).unwrap();
//! assert_eq!(node.output("y").unwrap().shape, Shape::fixed(&[5, 7, 5, 7]));
//! ```

mod descriptor;
mod infer;
mod node;
pub mod ops;

pub use descriptor::{default_ranges, DataType, Dim, DimRange, DimVec, Shape, TensorDesc};
pub use infer::{InferError, InferShapes};
pub use node::{AttrValue, Constant, GraphNode, Node};
