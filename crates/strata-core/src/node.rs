//! Operation nodes.

use strata_onnx::NodeProto;

use crate::attribute::Attributes;
use crate::opset::canonical_domain;
use crate::tensor::TensorOptions;
use crate::Result;

/// One operator invocation.
///
/// Nodes are wired to each other only through tensor names. Adjacency lives
/// in the owning [`Graph`](crate::Graph).
#[derive(Debug, Default, PartialEq)]
pub struct Node {
    /// Node name (may be empty).
    pub name: String,

    /// Operator domain, canonicalised (empty becomes `ai.onnx`).
    pub domain: String,

    /// Operator type (e.g. "Add", "Relu").
    pub op_type: String,

    /// Input tensor names, in order. A name may repeat and an empty name
    /// marks an omitted optional input.
    pub inputs: Vec<String>,

    /// Output tensor names, in order.
    pub outputs: Vec<String>,

    pub attributes: Attributes,

    pub doc_string: String,
}

impl Node {
    /// Create a node in the default domain.
    pub fn new(op_type: impl Into<String>) -> Self {
        Self {
            domain: canonical_domain("").to_string(),
            op_type: op_type.into(),
            ..Default::default()
        }
    }

    /// Build a node from its record, resolving its attributes.
    pub fn from_proto(proto: &NodeProto, options: &TensorOptions) -> Result<Self> {
        Ok(Self {
            name: proto.name.clone(),
            domain: canonical_domain(&proto.domain).to_string(),
            op_type: proto.op_type.clone(),
            inputs: proto.input.clone(),
            outputs: proto.output.clone(),
            attributes: Attributes::from_protos(&proto.attribute, options)?,
            doc_string: proto.doc_string.clone(),
        })
    }

    /// Name for diagnostics: the node name, or the op type if unnamed.
    pub fn label(&self) -> &str {
        if self.name.is_empty() { &self.op_type } else { &self.name }
    }

    /// Release tensors held by this node's attributes.
    pub fn release(&mut self) -> usize {
        self.attributes.release()
    }
}
