//! Graph node abstraction consumed by the inference functions.
//!
//! The host compiler owns node and descriptor storage; inference only needs
//! named access to input/output descriptors, attributes and constant-folded
//! input values. [`GraphNode`] is that boundary, and [`Node`] is a concrete
//! implementation usable by hosts and tests.

use rustc_hash::FxHashMap;

use crate::descriptor::TensorDesc;
use crate::infer::InferError;

/// Value of a compile-time node attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Bool(bool),
    IntList(Vec<i64>),
    /// Nested integer lists, used for pair-structured attributes such as
    /// paddings. Inner lists are not guaranteed to have width 2; operators
    /// validate that.
    IntListList(Vec<Vec<i64>>),
}

/// A constant tensor value resolved at compile time.
///
/// Produced by the host's constant-folding machinery for inputs whose
/// producer is constant-like. Only the encodings the operator catalog can
/// consume are represented.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
}

impl Constant {
    /// Number of elements in the resolved value.
    pub fn len(&self) -> usize {
        match self {
            Constant::Int32(values) => values.len(),
            Constant::Int64(values) => values.len(),
            Constant::Float32(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode the value as a list of dimension extents.
    ///
    /// Shape-describing constants must be 32- or 64-bit integers; any other
    /// element type is a hard error, not a degrade-to-dynamic case.
    pub fn to_dims(&self) -> Result<Vec<i64>, InferError> {
        match self {
            Constant::Int32(values) => Ok(values.iter().map(|&v| v as i64).collect()),
            Constant::Int64(values) => Ok(values.clone()),
            Constant::Float32(_) => Err(InferError::UnsupportedElementType),
        }
    }
}

/// Named access to a graph node's descriptors, attributes and constant
/// inputs.
///
/// Inference calls mutate only the descriptors reachable through the node
/// they were handed, so the host may run inference for independent nodes on
/// separate threads.
pub trait GraphNode {
    /// Name of the node, for diagnostics.
    fn name(&self) -> &str;

    /// Descriptor of the named input, if the node declares it.
    fn input(&self, name: &str) -> Option<&TensorDesc>;

    /// Mutable descriptor of the named input.
    ///
    /// Used only for the feedback write where resolving an output shape also
    /// tightens the range of a shape-describing input.
    fn input_mut(&mut self, name: &str) -> Option<&mut TensorDesc>;

    /// Descriptor of the named output, if the node declares it.
    fn output(&self, name: &str) -> Option<&TensorDesc>;

    /// Mutable descriptor of the named output.
    fn output_mut(&mut self, name: &str) -> Option<&mut TensorDesc>;

    /// Value of the named compile-time attribute.
    fn attr(&self, name: &str) -> Option<&AttrValue>;

    /// Attempt to fetch a compile-time value for the named input.
    ///
    /// `None` means the producing value is not a compile-time constant. That
    /// is expected control flow, never a failure: callers degrade to a
    /// dynamic-shape result.
    fn const_input(&self, name: &str) -> Option<Constant>;
}

/// In-memory [`GraphNode`] implementation.
#[derive(Clone, Debug)]
pub struct Node {
    name: String,
    inputs: Vec<(String, TensorDesc)>,
    outputs: Vec<(String, TensorDesc)>,
    attrs: FxHashMap<String, AttrValue>,
    const_inputs: FxHashMap<String, Constant>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Node {
        Node {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            attrs: FxHashMap::default(),
            const_inputs: FxHashMap::default(),
        }
    }

    /// Declare an input slot with its descriptor.
    pub fn with_input(mut self, name: impl Into<String>, desc: TensorDesc) -> Node {
        self.inputs.push((name.into(), desc));
        self
    }

    /// Declare an output slot with its placeholder descriptor.
    pub fn with_output(mut self, name: impl Into<String>, desc: TensorDesc) -> Node {
        self.outputs.push((name.into(), desc));
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: AttrValue) -> Node {
        self.attrs.insert(name.into(), value);
        self
    }

    /// Attach a constant-folded value to an input slot.
    pub fn with_const_input(mut self, name: impl Into<String>, value: Constant) -> Node {
        self.const_inputs.insert(name.into(), value);
        self
    }
}

impl GraphNode for Node {
    fn name(&self) -> &str {
        &self.name
    }

    fn input(&self, name: &str) -> Option<&TensorDesc> {
        self.inputs
            .iter()
            .find(|(slot, _)| slot == name)
            .map(|(_, desc)| desc)
    }

    fn input_mut(&mut self, name: &str) -> Option<&mut TensorDesc> {
        self.inputs
            .iter_mut()
            .find(|(slot, _)| slot == name)
            .map(|(_, desc)| desc)
    }

    fn output(&self, name: &str) -> Option<&TensorDesc> {
        self.outputs
            .iter()
            .find(|(slot, _)| slot == name)
            .map(|(_, desc)| desc)
    }

    fn output_mut(&mut self, name: &str) -> Option<&mut TensorDesc> {
        self.outputs
            .iter_mut()
            .find(|(slot, _)| slot == name)
            .map(|(_, desc)| desc)
    }

    fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    fn const_input(&self, name: &str) -> Option<Constant> {
        self.const_inputs.get(name).cloned()
    }
}
