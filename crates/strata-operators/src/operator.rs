//! Operator trait for version dispatch.

use strata_core::{DEFAULT_DOMAIN, Node};

use crate::Result;
use crate::field::LiveTensors;

/// One version of an operator contract.
///
/// Implementations are stateless: each node visit binds fresh input and
/// output bundles from the node's current live tensors.
///
/// # Example
///
/// ```ignore
/// let op = sets.resolve("Relu").ok_or("unknown op")?;
/// op.validate(node, &[Some(&x)], &[Some(&y)])?;
/// ```
pub trait Operator: Send + Sync {
    /// Operator type (e.g. "Add", "Relu").
    fn op_type(&self) -> &str;

    fn domain(&self) -> &str {
        DEFAULT_DOMAIN
    }

    /// First operator-set version this contract applies to.
    fn since_version(&self) -> i64;

    /// Check a node and its live tensors against this version's contract.
    fn validate(
        &self,
        node: &Node,
        inputs: &LiveTensors<'_>,
        outputs: &LiveTensors<'_>,
    ) -> Result<()>;
}

/// Declare the [`Operator`] for one version from its input and output
/// bundles.
macro_rules! operator_version {
    ($(#[$meta:meta])* $name:ident, $inputs:ident, $outputs:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl $crate::operator::Operator for $name {
            fn op_type(&self) -> &str {
                <$inputs<'static> as $crate::field::OperatorInputs<'static>>::OP_TYPE
            }

            fn since_version(&self) -> i64 {
                <$inputs<'static> as $crate::field::OperatorInputs<'static>>::SINCE_VERSION
            }

            fn validate(
                &self,
                node: &strata_core::Node,
                inputs: &$crate::field::LiveTensors<'_>,
                outputs: &$crate::field::LiveTensors<'_>,
            ) -> $crate::Result<()> {
                <$inputs<'_> as $crate::field::OperatorInputs<'_>>::from_node(node, inputs)?;
                <$outputs<'_> as $crate::field::OperatorOutputs<'_>>::from_node(node, outputs)?;
                Ok(())
            }
        }
    };
}

pub(crate) use operator_version;

#[cfg(test)]
mod tests {
    use super::*;

    struct MockOp;

    impl Operator for MockOp {
        fn op_type(&self) -> &str {
            "Mock"
        }

        fn since_version(&self) -> i64 {
            1
        }

        fn validate(
            &self,
            _node: &Node,
            _inputs: &LiveTensors<'_>,
            _outputs: &LiveTensors<'_>,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_operator_trait_object() {
        let op: Box<dyn Operator> = Box::new(MockOp);
        assert_eq!(op.op_type(), "Mock");
        assert_eq!(op.domain(), "ai.onnx");
        assert!(op.validate(&Node::new("Mock"), &[], &[]).is_ok());
    }
}
