//! Tests for building dependency graphs from graph records.

mod common;

use common::{float_initializer, graph, init_tracing, node, value_info};
use strata_core::{Graph, GraphErrorCode, OutputSource, TensorOptions};

fn build(proto: &strata_onnx::GraphProto) -> strata_core::Result<Graph> {
    Graph::from_proto(proto, &TensorOptions::default())
}

#[test]
fn test_add_relu_scenario() {
    init_tracing();

    let proto = graph(
        vec![
            node("A", "Add", &["x", "y"], &["z"]),
            node("B", "Relu", &["z"], &["out"]),
        ],
        &["x", "y"],
        &["out"],
    );
    let graph = build(&proto).unwrap();

    let a = graph.find_node("A").unwrap();
    let b = graph.find_node("B").unwrap();

    assert_eq!(graph.predecessors(b), vec![a]);
    assert_eq!(graph.successors(a), vec![b]);
    assert!(graph.predecessors(a).is_empty());
    assert_eq!(graph.find_output("out").unwrap().producing_node(), Some(b));
    assert_eq!(graph.node(b).unwrap().op_type, "Relu");
    assert_eq!(graph.inputs().len(), 2);
}

#[test]
fn test_fan_out() {
    init_tracing();

    for k in 2..=5 {
        let mut nodes = vec![node("producer", "Relu", &["x"], &["shared"])];
        let mut outputs = Vec::new();
        for i in 0..k {
            outputs.push(format!("out{i}"));
            nodes.push(node(&format!("consumer{i}"), "Relu", &["shared"], &[outputs[i].as_str()]));
        }
        let output_names: Vec<&str> = outputs.iter().map(String::as_str).collect();

        let proto = graph(nodes, &["x"], &output_names);
        let graph = build(&proto).unwrap();

        let producer = graph.find_node("producer").unwrap();
        let successors = graph.successors(producer);
        assert_eq!(successors.len(), k);
        for consumer in successors {
            assert_eq!(graph.predecessors(consumer), vec![producer]);
        }
    }
}

#[test]
fn test_missing_inputs_or_outputs() {
    let nodes = || vec![node("n", "Relu", &["x"], &["y"])];

    let err = build(&graph(nodes(), &[], &["y"])).unwrap_err();
    assert_eq!(err.graph_code(), Some(GraphErrorCode::MissingInputs));

    let err = build(&graph(nodes(), &["x"], &[])).unwrap_err();
    assert_eq!(err.graph_code(), Some(GraphErrorCode::MissingOutputs));

    assert!(build(&graph(nodes(), &["x"], &["y"])).is_ok());
}

#[test]
fn test_dangling_output_rejected() {
    let proto = graph(vec![node("n", "Relu", &["x"], &["y"])], &["x"], &["nowhere"]);
    let err = build(&proto).unwrap_err();
    assert_eq!(err.graph_code(), Some(GraphErrorCode::DanglingOutput));
}

#[test]
fn test_cycle_rejected() {
    let proto = graph(
        vec![
            node("a", "Add", &["x", "c"], &["a_out"]),
            node("b", "Relu", &["a_out"], &["b_out"]),
            node("c", "Relu", &["b_out"], &["c"]),
        ],
        &["x"],
        &["c"],
    );
    let err = build(&proto).unwrap_err();
    assert_eq!(err.graph_code(), Some(GraphErrorCode::Cycle));
}

#[test]
fn test_constants_and_shadowed_inputs() {
    let mut proto = graph(
        vec![node("add", "Add", &["x", "bias"], &["y"])],
        &["x", "bias"],
        &["y"],
    );
    proto.initializer = vec![float_initializer("bias", &[4], &[0.1, 0.2, 0.3, 0.4])];

    let graph = build(&proto).unwrap();
    assert_eq!(graph.constants().len(), 1);
    assert!(graph.find_input("bias").is_some());
    assert!(graph.is_constant("bias"));
    assert!(!graph.is_constant("x"));

    let bias = graph.find_constant("BIAS").unwrap();
    assert_eq!(bias.tensor.to_vec::<f32>().unwrap(), vec![0.1, 0.2, 0.3, 0.4]);
    // Constants add no edges.
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_input_value_info_decoded() {
    let mut proto = graph(vec![node("n", "Relu", &["x"], &["y"])], &["x"], &["y"]);
    proto.input = vec![value_info("x", &[1, 3, 8, 8])];

    let graph = build(&proto).unwrap();
    let input = graph.find_input("X").unwrap();
    assert_eq!(input.value_info.shape.dims(), &[1, 3, 8, 8]);
    assert_eq!(input.value_info.data_type, strata_core::DataType::Float);
}

#[test]
fn test_pass_through_output() {
    let proto = graph(vec![node("n", "Relu", &["x"], &["y"])], &["x"], &["y", "x"]);
    let graph = build(&proto).unwrap();
    assert_eq!(graph.find_output("x").unwrap().source, OutputSource::Input);
}

#[test]
fn test_release_graph_tensors() {
    let mut proto = graph(vec![node("n", "Add", &["x", "w"], &["y"])], &["x"], &["y"]);
    proto.initializer = vec![float_initializer("w", &[2], &[1.0, 2.0])];

    let mut graph = Graph::from_proto(&proto, &TensorOptions::direct()).unwrap();
    assert_eq!(graph.release(), 1);
    assert_eq!(graph.release(), 0);
    assert!(graph.find_constant("w").unwrap().tensor.is_released());
}
