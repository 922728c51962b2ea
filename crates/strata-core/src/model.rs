//! Versioned model container.

use std::collections::HashMap;
use std::path::Path;

use strata_onnx::ModelProto;
use tracing::debug;

use crate::graph::Graph;
use crate::opset::{OperatorSetId, canonical_domain};
use crate::tensor::TensorOptions;
use crate::{Error, GraphErrorCode, Result};

/// Oldest IR version this crate reads.
pub const MIN_SUPPORTED_IR_VERSION: i64 = 3;

/// Newest IR version this crate reads.
pub const MAX_SUPPORTED_IR_VERSION: i64 = 10;

/// A loaded model: one validated graph plus its version information.
#[derive(Debug)]
pub struct Model {
    ir_version: i64,
    model_version: i64,
    producer_name: String,
    producer_version: String,
    domain: String,
    doc_string: String,
    metadata_props: HashMap<String, String>,
    opset_imports: Vec<OperatorSetId>,
    options: TensorOptions,
    graph: Graph,
}

impl Model {
    /// Build a model from a decoded record.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedIrVersion` if the IR version is outside
    /// [`MIN_SUPPORTED_IR_VERSION`]..=[`MAX_SUPPORTED_IR_VERSION`], a
    /// `MissingGraph` error if the record has no graph, and any error from
    /// building the graph.
    #[tracing::instrument(
        skip_all,
        fields(ir_version = proto.ir_version, producer = %proto.producer_name)
    )]
    pub fn from_proto(proto: &ModelProto, options: &TensorOptions) -> Result<Self> {
        if !(MIN_SUPPORTED_IR_VERSION..=MAX_SUPPORTED_IR_VERSION).contains(&proto.ir_version) {
            return Err(Error::UnsupportedIrVersion {
                version: proto.ir_version,
                min: MIN_SUPPORTED_IR_VERSION,
                max: MAX_SUPPORTED_IR_VERSION,
            });
        }

        let graph_proto = proto.graph.as_ref().ok_or_else(|| {
            Error::graph(GraphErrorCode::MissingGraph, "model record has no graph")
        })?;

        let opset_imports = OperatorSetId::from_imports(&proto.opset_import);
        let graph = Graph::from_proto(graph_proto, options)?;

        debug!(
            opsets = ?opset_imports.iter().map(OperatorSetId::id).collect::<Vec<_>>(),
            "loaded model"
        );

        Ok(Self {
            ir_version: proto.ir_version,
            model_version: proto.model_version,
            producer_name: proto.producer_name.clone(),
            producer_version: proto.producer_version.clone(),
            domain: proto.domain.clone(),
            doc_string: proto.doc_string.clone(),
            metadata_props: proto
                .metadata_props
                .iter()
                .map(|entry| (entry.key.clone(), entry.value.clone()))
                .collect(),
            opset_imports,
            options: *options,
            graph,
        })
    }

    /// Decode and build a model from its wire bytes.
    pub fn decode(bytes: &[u8], options: &TensorOptions) -> Result<Self> {
        let proto = strata_onnx::decode_model(bytes)?;
        Self::from_proto(&proto, options)
    }

    /// Load and build a model from a file.
    pub fn load<P: AsRef<Path>>(path: P, options: &TensorOptions) -> Result<Self> {
        let proto = strata_onnx::load_model(path)?;
        Self::from_proto(&proto, options)
    }

    pub fn ir_version(&self) -> i64 {
        self.ir_version
    }

    pub fn model_version(&self) -> i64 {
        self.model_version
    }

    pub fn producer_name(&self) -> &str {
        &self.producer_name
    }

    pub fn producer_version(&self) -> &str {
        &self.producer_version
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn doc_string(&self) -> &str {
        &self.doc_string
    }

    pub fn metadata_props(&self) -> &HashMap<String, String> {
        &self.metadata_props
    }

    /// Imported operator sets. Never empty.
    pub fn opset_imports(&self) -> &[OperatorSetId] {
        &self.opset_imports
    }

    /// Imported version of `domain`, with the empty domain meaning `ai.onnx`.
    pub fn opset_version(&self, domain: &str) -> Option<i64> {
        let domain = canonical_domain(domain);
        self.opset_imports
            .iter()
            .find(|id| id.domain() == domain)
            .map(OperatorSetId::version)
    }

    /// Options the model's tensors were decoded with.
    pub fn tensor_options(&self) -> &TensorOptions {
        &self.options
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Release every tensor reachable from the graph.
    pub fn release(&mut self) -> usize {
        self.graph.release()
    }
}
