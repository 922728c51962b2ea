//! Tests for resolving model nodes to operator versions.

mod common;

use common::{init_tracing, tensor};
use strata_core::{DataType, Model, OperatorSetId, TensorOptions};
use strata_onnx::{GraphProto, ModelProto, NodeProto, OperatorSetIdProto, ValueInfoProto};
use strata_operators::{Error, OperatorSets};

fn value(name: &str) -> ValueInfoProto {
    ValueInfoProto {
        name: name.to_string(),
        ..Default::default()
    }
}

fn add_relu_model(opset_import: Vec<OperatorSetIdProto>) -> ModelProto {
    ModelProto {
        ir_version: 7,
        opset_import,
        graph: Some(GraphProto {
            name: "add_relu".to_string(),
            node: vec![
                NodeProto {
                    name: "A".to_string(),
                    op_type: "Add".to_string(),
                    input: vec!["x".to_string(), "y".to_string()],
                    output: vec!["z".to_string()],
                    ..Default::default()
                },
                NodeProto {
                    name: "B".to_string(),
                    op_type: "Relu".to_string(),
                    input: vec!["z".to_string()],
                    output: vec!["out".to_string()],
                    ..Default::default()
                },
            ],
            input: vec![value("x"), value("y")],
            output: vec![value("out")],
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[test]
fn test_resolve_model_nodes() {
    init_tracing();

    let proto = add_relu_model(vec![OperatorSetIdProto {
        domain: String::new(),
        version: 13,
    }]);
    let model = Model::from_proto(&proto, &TensorOptions::default()).unwrap();
    let sets = OperatorSets::from_imports(model.opset_imports());
    let graph = model.graph();

    let a = graph.node(graph.find_node("A").unwrap()).unwrap();
    let op = sets.resolve_node(a).unwrap();
    assert_eq!((op.op_type(), op.since_version()), ("Add", 7));

    let x = tensor(DataType::Float, 4);
    let y = tensor(DataType::Float, 4);
    let z = tensor(DataType::Float, 4);
    op.validate(a, &[Some(&x), Some(&y)], &[Some(&z)]).unwrap();

    let i = tensor(DataType::Int8, 4);
    let err = op.validate(a, &[Some(&i), Some(&i)], &[Some(&z)]).unwrap_err();
    assert!(matches!(err, Error::TypeConstraint { ref op_type, .. } if op_type == "Add"));

    let err = op.validate(a, &[Some(&x), Some(&y)], &[]).unwrap_err();
    assert!(matches!(err, Error::MissingInput { slot: 0, .. }));
}

#[test]
fn test_default_import_resolves_version_one() {
    let model = Model::from_proto(&add_relu_model(vec![]), &TensorOptions::default()).unwrap();
    assert_eq!(model.opset_imports(), &[OperatorSetId::new("", 1)]);

    let sets = OperatorSets::from_imports(model.opset_imports());
    assert_eq!(sets.len(), 1);
    assert_eq!(sets.resolve("Relu").map(|op| op.since_version()), Some(1));
    assert!(sets.resolve("Clip").is_some());
}

#[test]
fn test_unknown_op_is_not_found() {
    let sets = OperatorSets::from_imports(&[
        OperatorSetId::new("com.example", 1),
        OperatorSetId::new("", 14),
    ]);
    assert_eq!(sets.len(), 2);
    assert!(sets.iter().next().is_some_and(|set| set.is_empty()));
    assert!(sets.resolve("FusedGelu").is_none());
    assert_eq!(sets.resolve("Add").map(|op| op.since_version()), Some(14));
}
