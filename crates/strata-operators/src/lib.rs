//! Versioned operator contracts for Strata.
//!
//! An operator's legal inputs, attributes and element types change across
//! operator-set versions. This crate describes each version as its own input
//! bundle, built from a [`Node`](strata_core::Node) and the node's live
//! tensors, and dispatches on `(domain, version, op_type)` through
//! [`OperatorSets`].
//!
//! # Operators
//!
//! - **Activation**: Relu (1, 6, 14)
//! - **Elementwise**: Add (1, 6, 7, 14), Clip (1, 6, 11, 12)
//! - **Type conversion**: Cast (1, 6)
//! - **Shape manipulation**: Concat (1, 4)
//!
//! # Example
//!
//! ```no_run
//! use strata_core::{Model, TensorOptions};
//! use strata_operators::OperatorSets;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = Model::load("model.onnx", &TensorOptions::default())?;
//! let sets = OperatorSets::from_imports(model.opset_imports());
//!
//! for &id in model.graph().topological_order() {
//!     let Some(node) = model.graph().node(id) else { continue };
//!     match sets.resolve_node(node) {
//!         Some(op) => println!("{} -> {}@{}", node.label(), op.op_type(), op.since_version()),
//!         None => println!("{} has no known operator", node.label()),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod field;
pub mod operator;
pub mod operators;

mod registry;

pub use field::{
    AttributeField, Field, LiveTensors, OperatorInputs, OperatorOutputs, TensorField,
    TypeConstraint,
};
pub use operator::Operator;
pub use registry::{OperatorSet, OperatorSets};

use strata_core::DataType;

/// Result type for operator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for operator operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A live tensor's element type is not legal for its slot. Reported
    /// separately from model errors so callers can tell an unsupported
    /// backend type from a malformed model.
    #[error("{op_type}: {name} (slot {slot}) is {actual}, type constraint allows {allowed:?}")]
    TypeConstraint {
        op_type: String,
        slot: usize,
        name: String,
        allowed: Vec<DataType>,
        actual: DataType,
    },

    /// An accessor for a field that this operator version retracted.
    #[error("{op_type}: '{field}' is deprecated as of version {version}")]
    Deprecated {
        op_type: String,
        field: String,
        version: i64,
    },

    #[error("{op_type}: required input {name} (slot {slot}) is missing")]
    MissingInput {
        op_type: String,
        slot: usize,
        name: String,
    },

    #[error(transparent)]
    Core(#[from] strata_core::Error),
}

impl Error {
    pub(crate) fn deprecated(op_type: &str, field: &str, version: i64) -> Self {
        Error::Deprecated {
            op_type: op_type.to_string(),
            field: field.to_string(),
            version,
        }
    }
}
