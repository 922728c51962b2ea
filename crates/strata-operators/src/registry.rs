//! Operator sets and ordered resolution.

use std::collections::HashMap;

use strata_core::{DEFAULT_DOMAIN, Node, OperatorSetId};
use tracing::{debug, trace};

use crate::operator::Operator;
use crate::operators;

/// The operators of one `(domain, version)` set, keyed by op type.
pub struct OperatorSet {
    id: OperatorSetId,
    operators: HashMap<String, Box<dyn Operator>>,
}

impl OperatorSet {
    /// Create an empty operator set.
    pub fn new(id: OperatorSetId) -> Self {
        Self {
            id,
            operators: HashMap::new(),
        }
    }

    /// The default-domain operators in effect at `version`: for each op type,
    /// the newest contract whose since-version is not after `version`.
    pub fn standard(version: i64) -> Self {
        let mut set = Self::new(OperatorSetId::new(DEFAULT_DOMAIN, version));
        for operator in operators::all_versions() {
            if operator.since_version() > version {
                continue;
            }
            let newer = set
                .operators
                .get(operator.op_type())
                .is_none_or(|current| current.since_version() < operator.since_version());
            if newer {
                set.operators.insert(operator.op_type().to_string(), operator);
            }
        }
        trace!(opset = %set.id, operators = set.len(), "built standard operator set");
        set
    }

    /// Register an operator under its op type, replacing any previous one.
    ///
    /// Returns `self` for method chaining.
    pub fn register<O>(&mut self, operator: O) -> &mut Self
    where
        O: Operator + 'static,
    {
        self.operators
            .insert(operator.op_type().to_string(), Box::new(operator));
        self
    }

    pub fn id(&self) -> &OperatorSetId {
        &self.id
    }

    /// Look up an operator by op type.
    pub fn get(&self, op_type: &str) -> Option<&dyn Operator> {
        self.operators.get(op_type).map(|op| op.as_ref())
    }

    pub fn contains(&self, op_type: &str) -> bool {
        self.operators.contains_key(op_type)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Iterate over all registered op types.
    pub fn op_types(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(|s| s.as_str())
    }
}

impl std::fmt::Debug for OperatorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut op_types: Vec<_> = self.op_types().collect();
        op_types.sort_unstable();
        f.debug_struct("OperatorSet")
            .field("id", &self.id)
            .field("operators", &op_types)
            .finish()
    }
}

/// Operator sets consulted in order.
#[derive(Debug, Default)]
pub struct OperatorSets {
    sets: Vec<OperatorSet>,
}

impl OperatorSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the sets for a model's imports. Default-domain imports get the
    /// standard operators for their version; other domains start empty.
    pub fn from_imports(imports: &[OperatorSetId]) -> Self {
        let mut sets = Self::new();
        for id in imports {
            if id.domain() == DEFAULT_DOMAIN {
                sets.push(OperatorSet::standard(id.version()));
            } else {
                debug!(opset = %id, "no built-in operators for domain");
                sets.push(OperatorSet::new(id.clone()));
            }
        }
        sets
    }

    /// Append a set, consulted after every set already present.
    pub fn push(&mut self, set: OperatorSet) -> &mut Self {
        self.sets.push(set);
        self
    }

    /// The first operator registered for `op_type`, or `None` if no set
    /// has one.
    pub fn resolve(&self, op_type: &str) -> Option<&dyn Operator> {
        self.sets.iter().find_map(|set| set.get(op_type))
    }

    /// Resolve a node, preferring sets in the node's domain.
    pub fn resolve_node(&self, node: &Node) -> Option<&dyn Operator> {
        self.sets
            .iter()
            .filter(|set| set.id().domain() == node.domain)
            .find_map(|set| set.get(&node.op_type))
            .or_else(|| self.resolve(&node.op_type))
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperatorSet> {
        self.sets.iter()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
