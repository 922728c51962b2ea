//! Tests for building models from model records.

mod common;

use common::{graph, init_tracing, model, node};
use prost::Message;
use strata_core::attribute::Attribute;
use strata_core::{
    Error, GraphErrorCode, MAX_SUPPORTED_IR_VERSION, MIN_SUPPORTED_IR_VERSION, Model,
    TensorOptions,
};
use strata_onnx::onnx::attribute_proto::AttributeType;
use strata_onnx::{AttributeProto, StringStringEntryProto};

fn relu_graph() -> strata_onnx::GraphProto {
    graph(vec![node("relu", "Relu", &["x"], &["y"])], &["x"], &["y"])
}

#[test]
fn test_supported_ir_versions() {
    init_tracing();

    for version in MIN_SUPPORTED_IR_VERSION..=MAX_SUPPORTED_IR_VERSION {
        let model = Model::from_proto(&model(version, relu_graph()), &TensorOptions::default())
            .unwrap();
        assert_eq!(model.ir_version(), version);
    }
}

#[test]
fn test_unsupported_ir_versions() {
    for version in [0, MIN_SUPPORTED_IR_VERSION - 1, MAX_SUPPORTED_IR_VERSION + 1] {
        let err = Model::from_proto(&model(version, relu_graph()), &TensorOptions::default())
            .unwrap_err();
        assert!(
            matches!(err, Error::UnsupportedIrVersion { version: v, .. } if v == version),
            "unexpected error for IR {version}: {err}"
        );
    }
}

#[test]
fn test_graph_errors_propagate() {
    let proto = model(7, graph(vec![node("n", "Relu", &["x"], &["y"])], &[], &["y"]));
    let err = Model::from_proto(&proto, &TensorOptions::default()).unwrap_err();
    assert_eq!(err.graph_code(), Some(GraphErrorCode::MissingInputs));
}

#[test]
fn test_decode_from_bytes_with_metadata() {
    let mut proto = model(8, relu_graph());
    proto.model_version = 3;
    proto.producer_version = "1.2".to_string();
    proto.doc_string = "tiny".to_string();
    proto.metadata_props = vec![StringStringEntryProto {
        key: "author".to_string(),
        value: "tests".to_string(),
    }];

    let bytes = proto.encode_to_vec();
    let model = Model::decode(&bytes, &TensorOptions::default()).unwrap();

    assert_eq!(model.model_version(), 3);
    assert_eq!(model.producer_name(), "strata-test");
    assert_eq!(model.producer_version(), "1.2");
    assert_eq!(model.doc_string(), "tiny");
    assert_eq!(model.metadata_props().get("author").map(String::as_str), Some("tests"));
    assert_eq!(model.opset_version(""), Some(13));
    assert_eq!(model.graph().node_count(), 1);
}

#[test]
fn test_decode_garbage() {
    let result = Model::decode(&[0xff, 0xff, 0xff], &TensorOptions::default());
    assert!(matches!(result, Err(Error::Onnx(_))));
}

#[test]
fn test_options_reach_tensor_attributes() {
    let mut graph_proto = graph(
        vec![node("constant", "Constant", &[], &["y"])],
        &["x"],
        &["y"],
    );
    graph_proto.node[0].attribute = vec![AttributeProto {
        name: "value".to_string(),
        r#type: AttributeType::Tensor as i32,
        t: Some(common::float_initializer("", &[2], &[1.0, 2.0])),
        ..Default::default()
    }];

    let mut model =
        Model::from_proto(&model(9, graph_proto), &TensorOptions::direct()).unwrap();
    let graph = model.graph();
    let id = graph.find_node("constant").unwrap();
    let value = graph.node(id).unwrap().attributes.get("value");
    assert!(matches!(value, Some(Attribute::Tensor(t)) if t.is_direct()));

    assert_eq!(model.release(), 1);
}
