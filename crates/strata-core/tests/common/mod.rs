//! Common record builders for core integration tests.
//!
//! Each test binary compiles this module separately and uses only some of it.
#![allow(dead_code)]

use strata_core::DataType;
use strata_onnx::onnx::tensor_shape_proto::{Dimension, dimension};
use strata_onnx::onnx::type_proto;
use strata_onnx::{
    GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto, TensorShapeProto,
    TypeProto, ValueInfoProto,
};

/// Install a test subscriber once per binary. Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A value-info record for a static FLOAT tensor.
pub fn value_info(name: &str, dims: &[i64]) -> ValueInfoProto {
    ValueInfoProto {
        name: name.to_string(),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: DataType::Float.to_onnx(),
                shape: Some(TensorShapeProto {
                    dim: dims
                        .iter()
                        .map(|&d| Dimension {
                            value: Some(dimension::Value::DimValue(d)),
                            ..Default::default()
                        })
                        .collect(),
                }),
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// A node record without attributes.
pub fn node(name: &str, op_type: &str, inputs: &[&str], outputs: &[&str]) -> NodeProto {
    NodeProto {
        name: name.to_string(),
        op_type: op_type.to_string(),
        input: inputs.iter().map(|s| s.to_string()).collect(),
        output: outputs.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

/// A graph record with FLOAT[4] boundary values.
pub fn graph(nodes: Vec<NodeProto>, inputs: &[&str], outputs: &[&str]) -> GraphProto {
    GraphProto {
        name: "test_graph".to_string(),
        node: nodes,
        input: inputs.iter().map(|name| value_info(name, &[4])).collect(),
        output: outputs.iter().map(|name| value_info(name, &[4])).collect(),
        ..Default::default()
    }
}

/// A model record wrapping `graph` with one default-domain import.
pub fn model(ir_version: i64, graph: GraphProto) -> ModelProto {
    ModelProto {
        ir_version,
        producer_name: "strata-test".to_string(),
        opset_import: vec![OperatorSetIdProto {
            domain: String::new(),
            version: 13,
        }],
        graph: Some(graph),
        ..Default::default()
    }
}

/// A FLOAT initializer stored as a typed list.
pub fn float_initializer(name: &str, dims: &[i64], values: &[f32]) -> TensorProto {
    TensorProto {
        name: name.to_string(),
        dims: dims.to_vec(),
        data_type: DataType::Float.to_onnx(),
        float_data: values.to_vec(),
        ..Default::default()
    }
}

/// Little-endian packing of `values`, as the wire format stores raw data.
pub fn le_bytes_f32(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn le_bytes_i64(values: &[i64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
