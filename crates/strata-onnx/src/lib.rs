//! ONNX protobuf records for Strata.
//!
//! This crate is the boundary between serialized model files and the Strata
//! IR. It declares the decoded record types and a thin loader; everything
//! downstream treats these records as read-only input.
//!
//! # Example
//!
//! ```no_run
//! use strata_onnx::load_model;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = load_model("model.onnx")?;
//!
//! println!("IR version: {}", model.ir_version);
//! if let Some(graph) = &model.graph {
//!     println!("Nodes: {}", graph.node.len());
//! }
//! # Ok(())
//! # }
//! ```

use prost::Message;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub mod onnx;

pub use onnx::{
    AttributeProto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, StringStringEntryProto,
    TensorProto, TensorShapeProto, TypeProto, ValueInfoProto,
};

/// Errors that can occur when loading ONNX records.
#[derive(Debug, Error)]
pub enum OnnxError {
    #[error("Failed to read ONNX file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse ONNX protobuf: {0}")]
    DecodeError(#[from] prost::DecodeError),
}

/// Result type for ONNX operations.
pub type Result<T> = std::result::Result<T, OnnxError>;

/// Decode a `ModelProto` from its wire bytes.
pub fn decode_model(bytes: &[u8]) -> Result<ModelProto> {
    Ok(ModelProto::decode(bytes)?)
}

/// Load an ONNX model from a file.
///
/// # Example
///
/// ```no_run
/// use strata_onnx::load_model;
///
/// let model = load_model("path/to/model.onnx")?;
/// # Ok::<(), strata_onnx::OnnxError>(())
/// ```
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<ModelProto> {
    let bytes = fs::read(path)?;
    decode_model(&bytes)
}
