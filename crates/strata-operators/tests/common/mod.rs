//! Common helpers for operator contract tests.
#![allow(dead_code)]

use strata_core::{Attribute, DataType, Node, Shape, Tensor, TensorOptions};

/// Install a test subscriber once per binary. Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .try_init();
}

/// A zero-filled tensor of `len` elements.
pub fn tensor(data_type: DataType, len: usize) -> Tensor {
    Tensor::allocate(data_type, Shape::new(vec![len]), &TensorOptions::default())
        .expect("allocation should succeed")
}

/// A node with the given attributes.
pub fn node(op_type: &str, attributes: Vec<(&str, Attribute)>) -> Node {
    let mut node = Node::new(op_type);
    node.name = format!("{}_0", op_type.to_lowercase());
    for (name, value) in attributes {
        node.attributes.insert(name, value);
    }
    node
}
