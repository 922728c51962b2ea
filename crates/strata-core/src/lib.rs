//! Core intermediate representation for Strata.
//!
//! This crate turns decoded ONNX records into a validated, queryable IR:
//! - Tensor value model (`DataType`, `Shape`, `ValueInfo`, `Tensor`)
//! - Attribute resolution (`Attribute`, `Attributes`)
//! - Dependency graph of operation nodes (`Graph`, `Node`, `Constant`)
//! - Versioned model container (`Model`, `OperatorSetId`)
//!
//! # Example
//!
//! ```no_run
//! use strata_core::{Model, TensorOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = Model::load("model.onnx", &TensorOptions::default())?;
//! let graph = model.graph();
//!
//! for &id in graph.topological_order() {
//!     let node = graph.node(id).ok_or("missing node")?;
//!     println!("{} <- {:?}", node.op_type, graph.predecessors(id));
//! }
//! # Ok(())
//! # }
//! ```

pub mod attribute;
pub mod graph;
pub mod model;
pub mod node;
pub mod opset;
pub mod tensor;
pub mod types;

mod buffer;
mod tensor_proto;

use std::fmt;

// Re-export commonly used types
pub use attribute::{Attribute, AttributeKind, AttributeValue, Attributes};
pub use graph::{Constant, Graph, GraphInput, GraphOutput, NodeId, OutputSource};
pub use model::{MAX_SUPPORTED_IR_VERSION, MIN_SUPPORTED_IR_VERSION, Model};
pub use node::Node;
pub use opset::{DEFAULT_DOMAIN, OperatorSetId, canonical_domain};
pub use tensor::{AllocationPolicy, ByteOrder, Tensor, TensorOptions, TensorView};
pub use types::{DataType, Shape, ValueInfo};

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for strata-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported IR version {version} (supported: {min}..={max})")]
    UnsupportedIrVersion { version: i64, min: i64, max: i64 },

    #[error("Invalid graph structure ({code}): {message}")]
    Graph {
        code: GraphErrorCode,
        message: String,
    },

    /// A required attribute is absent for the operator version in play.
    #[error("Illegal argument: {op_type} requires attribute '{name}'")]
    MissingAttribute { op_type: String, name: String },

    #[error("Attribute '{name}' is {actual}, requested as {expected}")]
    AttributeKind {
        name: String,
        expected: AttributeKind,
        actual: AttributeKind,
    },

    #[error("Invalid UTF-8 in attribute '{name}'")]
    InvalidUtf8 { name: String },

    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Tensor {0} has been released")]
    TensorReleased(String),

    #[error(transparent)]
    Onnx(#[from] strata_onnx::OnnxError),
}

impl Error {
    pub(crate) fn graph(code: GraphErrorCode, message: impl Into<String>) -> Self {
        Error::Graph {
            code,
            message: message.into(),
        }
    }

    /// The graph error code, if this is a graph-structure error.
    pub fn graph_code(&self) -> Option<GraphErrorCode> {
        match self {
            Error::Graph { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Reason a graph failed structural validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphErrorCode {
    /// The model record carries no graph.
    MissingGraph,

    /// No graph inputs are declared.
    MissingInputs,

    /// No graph outputs are declared.
    MissingOutputs,

    /// A declared output is produced by no node, input or constant.
    DanglingOutput,

    /// A node consumes one of its own outputs.
    SelfLoop,

    /// The dependency edges form a cycle.
    Cycle,
}

impl fmt::Display for GraphErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            GraphErrorCode::MissingGraph => "missing graph",
            GraphErrorCode::MissingInputs => "missing inputs",
            GraphErrorCode::MissingOutputs => "missing outputs",
            GraphErrorCode::DanglingOutput => "dangling output",
            GraphErrorCode::SelfLoop => "self loop",
            GraphErrorCode::Cycle => "cycle",
        };
        f.write_str(code)
    }
}
