use ir::{Arg, DataType, Graph, Operator, Shape, Tensor, TensorId};

// cargo run --release
fn main() {
    // 构造计算图：conv2d -> relu -> dense
    let mut graph = Graph::named("demo");

    let tensors = [
        ("image", DataType::F32, Shape::new([1, 3, 224, 224])),
        ("conv.w", DataType::F32, Shape::new([64, 3, 3, 3])),
        ("conv.y", DataType::F32, Shape::new([1, 64, 224, 224])),
        ("relu.y", DataType::F32, Shape::new([1, 64, 224, 224])),
        ("dense.w", DataType::F32, Shape::new([64 * 224 * 224, 1000])),
        ("logits", DataType::F32, Shape::new([1, 1000])),
    ];
    for (id, dt, shape) in tensors {
        graph
            .add_tensor(Tensor::new(id, dt, shape).named(id))
            .unwrap()
    }

    let t = TensorId::from;
    graph
        .add_operator(
            Operator::new(0u64, "conv2d", [t("image"), t("conv.w")], [t("conv.y")])
                .named("conv")
                .with_arg("strides", Arg::arr([Arg::int(1), Arg::int(1)]))
                .with_arg("padding", "same"),
        )
        .unwrap();
    graph
        .add_operator(Operator::new(1u64, "relu", [t("conv.y")], [t("relu.y")]).named("relu"))
        .unwrap();
    graph
        .add_operator(
            Operator::new(2u64, "dense", [t("relu.y"), t("dense.w")], [t("logits")])
                .named("dense"),
        )
        .unwrap();

    graph.set_inputs([t("image")]).unwrap();
    graph.set_outputs([t("logits")]).unwrap();
    graph.validate().unwrap();

    println!("{graph}");
    println!();

    // 张量清单
    let name_width = graph
        .tensors()
        .map(|t| t.name.as_deref().unwrap_or_default().len())
        .max()
        .unwrap_or(0)
        + 2;
    for tensor in graph.tensors() {
        println!(
            "%{:·<name_width$}{} {} {} bytes",
            tensor.name.as_deref().unwrap_or_default(),
            tensor.dt,
            tensor.shape,
            tensor.nbytes(),
        )
    }
    println!();

    // 执行调度
    for (i, id) in graph.topological_order().unwrap().iter().enumerate() {
        let op = graph.get_operator(id).unwrap();
        println!(
            "{i:>3} #{id} {} ({}) <- {:?}",
            op.name.as_deref().unwrap_or_default(),
            op.op,
            op.inputs,
        )
    }
}
