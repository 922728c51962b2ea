//! Dependency graph of operation nodes.
//!
//! A [`Graph`] is built once from a decoded graph record and is read-only
//! afterwards. Nodes are stored in a petgraph `DiGraph`, with an edge
//! `producer -> consumer` for every tensor name one node writes and another
//! reads. Constants and graph inputs have no edges of their own.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use strata_onnx::{GraphProto, TensorProto, ValueInfoProto};
use tracing::{debug, warn};

use crate::node::Node;
use crate::tensor::{Tensor, TensorOptions};
use crate::types::ValueInfo;
use crate::{Error, GraphErrorCode, Result};

/// Identifier of a node within its graph.
pub type NodeId = NodeIndex;

/// A tensor baked into the model.
#[derive(Debug, PartialEq)]
pub struct Constant {
    pub name: String,
    pub doc_string: String,
    pub tensor: Tensor,
}

impl Constant {
    pub fn from_proto(proto: &TensorProto, options: &TensorOptions) -> Result<Self> {
        Ok(Self {
            name: proto.name.clone(),
            doc_string: proto.doc_string.clone(),
            tensor: Tensor::from_proto(proto, options)?,
        })
    }
}

/// A declared graph input.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphInput {
    pub name: String,
    pub doc_string: String,
    pub value_info: ValueInfo,
}

impl GraphInput {
    pub fn from_proto(proto: &ValueInfoProto) -> Result<Self> {
        Ok(Self {
            name: proto.name.clone(),
            doc_string: proto.doc_string.clone(),
            value_info: ValueInfo::from_proto(proto)?,
        })
    }
}

/// Where a graph output's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputSource {
    /// Written by a node.
    Node(NodeId),
    /// Passed straight through from a graph input.
    Input,
    /// Read straight from a constant.
    Constant,
}

/// A declared graph output.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphOutput {
    pub name: String,
    pub doc_string: String,
    pub value_info: ValueInfo,
    pub source: OutputSource,
}

impl GraphOutput {
    /// The node writing this output, if any.
    pub fn producing_node(&self) -> Option<NodeId> {
        match self.source {
            OutputSource::Node(id) => Some(id),
            OutputSource::Input | OutputSource::Constant => None,
        }
    }
}

/// A validated, acyclic graph of operation nodes.
#[derive(Debug)]
pub struct Graph {
    pub name: String,
    pub doc_string: String,

    dag: DiGraph<Node, ()>,

    /// Node ids in dependency order.
    order: Vec<NodeId>,

    /// Tensor name -> producing node.
    producers: HashMap<String, NodeId>,

    /// Tensor name -> consuming nodes, each listed once.
    consumers: HashMap<String, Vec<NodeId>>,

    constants: Vec<Constant>,
    inputs: Vec<GraphInput>,
    outputs: Vec<GraphOutput>,
}

impl Graph {
    /// Build and validate a graph from its record.
    ///
    /// # Errors
    ///
    /// Fails with a `Graph` error when no inputs or outputs are declared,
    /// when a node reads its own output, when the nodes form a cycle, or when
    /// a declared output is produced by no node, input or constant. Attribute
    /// and tensor decoding errors are propagated.
    #[tracing::instrument(skip_all, fields(graph = %proto.name, nodes = proto.node.len()))]
    pub fn from_proto(proto: &GraphProto, options: &TensorOptions) -> Result<Self> {
        if proto.input.is_empty() {
            return Err(Error::graph(
                GraphErrorCode::MissingInputs,
                format!("graph '{}' declares no inputs", proto.name),
            ));
        }
        if proto.output.is_empty() {
            return Err(Error::graph(
                GraphErrorCode::MissingOutputs,
                format!("graph '{}' declares no outputs", proto.name),
            ));
        }

        let mut dag = DiGraph::with_capacity(proto.node.len(), proto.node.len());
        let mut producers: HashMap<String, NodeId> = HashMap::new();
        let mut consumers: HashMap<String, Vec<NodeId>> = HashMap::new();

        for node_proto in &proto.node {
            let node = Node::from_proto(node_proto, options)?;
            let id = dag.add_node(node);
            let node = &dag[id];

            for output in node.outputs.iter().filter(|name| !name.is_empty()) {
                if let Some(previous) = producers.insert(output.clone(), id) {
                    warn!(
                        tensor = %output,
                        previous = dag[previous].label(),
                        current = node.label(),
                        "tensor has more than one producer, keeping the last"
                    );
                }
            }

            for input in node.inputs.iter().filter(|name| !name.is_empty()) {
                let readers = consumers.entry(input.clone()).or_default();
                if !readers.contains(&id) {
                    readers.push(id);
                }
            }
        }

        let constants = proto
            .initializer
            .iter()
            .map(|init| Constant::from_proto(init, options))
            .collect::<Result<Vec<_>>>()?;

        let inputs = proto
            .input
            .iter()
            .map(GraphInput::from_proto)
            .collect::<Result<Vec<_>>>()?;

        // Walk producers in node order so edge order does not depend on
        // hash iteration.
        let mut edges = Vec::new();
        for producer in dag.node_indices() {
            for output in &dag[producer].outputs {
                if producers.get(output) != Some(&producer) {
                    continue;
                }
                for &consumer in consumers.get(output).into_iter().flatten() {
                    if consumer == producer {
                        return Err(Error::graph(
                            GraphErrorCode::SelfLoop,
                            format!(
                                "node '{}' consumes its own output '{output}'",
                                dag[producer].label()
                            ),
                        ));
                    }
                    edges.push((producer, consumer));
                }
            }
        }
        for (producer, consumer) in edges {
            dag.update_edge(producer, consumer, ());
        }

        let order = toposort(&dag, None).map_err(|cycle| {
            Error::graph(
                GraphErrorCode::Cycle,
                format!("node '{}' is part of a cycle", dag[cycle.node_id()].label()),
            )
        })?;

        let mut graph = Self {
            name: proto.name.clone(),
            doc_string: proto.doc_string.clone(),
            dag,
            order,
            producers,
            consumers,
            constants,
            inputs,
            outputs: Vec::with_capacity(proto.output.len()),
        };

        for output in &proto.output {
            let source = graph.resolve_output(&output.name)?;
            graph.outputs.push(GraphOutput {
                name: output.name.clone(),
                doc_string: output.doc_string.clone(),
                value_info: ValueInfo::from_proto(output)?,
                source,
            });
        }

        debug!(
            nodes = graph.dag.node_count(),
            edges = graph.dag.edge_count(),
            constants = graph.constants.len(),
            inputs = graph.inputs.len(),
            outputs = graph.outputs.len(),
            "built graph"
        );

        Ok(graph)
    }

    fn resolve_output(&self, name: &str) -> Result<OutputSource> {
        if let Some(&id) = self.producers.get(name) {
            Ok(OutputSource::Node(id))
        } else if self.inputs.iter().any(|input| input.name == name) {
            Ok(OutputSource::Input)
        } else if self.is_constant(name) {
            Ok(OutputSource::Constant)
        } else {
            Err(Error::graph(
                GraphErrorCode::DanglingOutput,
                format!("output '{name}' is not produced by any node, input or constant"),
            ))
        }
    }

    // ── Node access ──

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.dag.node_weight(id)
    }

    /// Iterate over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.dag
            .node_indices()
            .map(move |id| (id, &self.dag[id]))
    }

    pub fn node_count(&self) -> usize {
        self.dag.node_count()
    }

    /// Number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.dag.edge_count()
    }

    /// Nodes that `id` directly depends on, in id order.
    pub fn predecessors(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Nodes that directly depend on `id`, in id order.
    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: NodeId, direction: Direction) -> Vec<NodeId> {
        let mut ids: Vec<_> = self.dag.neighbors_directed(id, direction).collect();
        ids.sort_unstable();
        ids
    }

    /// Node ids ordered so every node comes after its predecessors.
    pub fn topological_order(&self) -> &[NodeId] {
        &self.order
    }

    /// The node writing tensor `name`.
    pub fn producer_of(&self, name: &str) -> Option<NodeId> {
        self.producers.get(name).copied()
    }

    /// Nodes reading tensor `name`.
    pub fn consumers_of(&self, name: &str) -> &[NodeId] {
        self.consumers.get(name).map_or(&[], Vec::as_slice)
    }

    // ── Lookup by name ──

    /// Find a node by name, ignoring ASCII case.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes()
            .find(|(_, node)| node.name.eq_ignore_ascii_case(name))
            .map(|(id, _)| id)
    }

    /// Find a declared input by name, ignoring ASCII case.
    pub fn find_input(&self, name: &str) -> Option<&GraphInput> {
        self.inputs
            .iter()
            .find(|input| input.name.eq_ignore_ascii_case(name))
    }

    /// Find a declared output by name, ignoring ASCII case.
    pub fn find_output(&self, name: &str) -> Option<&GraphOutput> {
        self.outputs
            .iter()
            .find(|output| output.name.eq_ignore_ascii_case(name))
    }

    /// Find a constant by name, ignoring ASCII case.
    pub fn find_constant(&self, name: &str) -> Option<&Constant> {
        self.constants
            .iter()
            .find(|constant| constant.name.eq_ignore_ascii_case(name))
    }

    /// Check if `name` is backed by a constant, including inputs that an
    /// initializer provides a default for.
    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.iter().any(|constant| constant.name == name)
    }

    pub fn inputs(&self) -> &[GraphInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[GraphOutput] {
        &self.outputs
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    /// Release every tensor owned by the graph: constants and node
    /// attributes. Returns the number of buffers freed by this call.
    pub fn release(&mut self) -> usize {
        let mut released = 0;
        for constant in &mut self.constants {
            if constant.tensor.release() {
                released += 1;
            } else {
                warn!(constant = %constant.name, "constant was already released");
            }
        }
        for node in self.dag.node_weights_mut() {
            released += node.release();
        }
        debug!(graph = %self.name, released, "released graph tensors");
        released
    }
}
