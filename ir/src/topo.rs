use crate::{Graph, GraphError, OperatorId};
use itertools::Itertools;
use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
};

impl Graph {
    /// 确定性拓扑排序
    ///
    /// Kahn 算法：算子间依赖边为「消费者依赖其输入的生产者」，并行边只计一次；
    /// 就绪算子经最小堆按 id 升序出队，同一张图的排序结果可复现。
    /// 遍历不完整说明引用图成环。
    pub fn topological_order(&self) -> Result<Vec<OperatorId>, GraphError> {
        let mut in_degree = self
            .operators()
            .map(|op| (&op.id, 0usize))
            .collect::<HashMap<_, _>>();
        let mut successors = HashMap::new();
        for op in self.operators() {
            let dependents = op
                .outputs
                .iter()
                .flat_map(|t| self.get_tensor(t).unwrap().consumers())
                .unique()
                .collect::<Vec<_>>();
            for c in &dependents {
                *in_degree.get_mut(*c).unwrap() += 1
            }
            successors.insert(&op.id, dependents);
        }

        let mut ready = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| Reverse(*id))
            .collect::<BinaryHeap<_>>();
        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(Reverse(id)) = ready.pop() {
            order.push(id.clone());
            for &c in &successors[id] {
                let degree = in_degree.get_mut(c).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(c))
                }
            }
        }
        if order.len() == successors.len() {
            Ok(order)
        } else {
            Err(GraphError::CycleDetected)
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{DataType, Graph, Operator, OperatorId, Tensor, TensorId};

    fn t(id: &str) -> TensorId {
        id.into()
    }

    fn add_tensors(graph: &mut Graph, ids: &[&str]) {
        for id in ids {
            graph
                .add_tensor(Tensor::new(*id, DataType::F32, [4]))
                .unwrap()
        }
    }

    #[test]
    fn test_order() {
        let mut graph = Graph::new();
        add_tensors(&mut graph, &["t1", "t2"]);
        // 先插入消费者，再插入生产者
        graph
            .add_operator(Operator::new("op2", "relu", [t("t1")], [t("t2")]))
            .unwrap();
        graph
            .add_operator(Operator::new("op1", "source", [], [t("t1")]))
            .unwrap();

        let order = graph.topological_order().unwrap();
        let expected: [OperatorId; 2] = ["op1".into(), "op2".into()];
        assert_eq!(order, expected);
        // 图未变化时结果可复现
        assert_eq!(graph.topological_order().unwrap(), order)
    }

    #[test]
    fn test_tie_break() {
        let mut graph = Graph::new();
        add_tensors(&mut graph, &["a", "b", "c", "d"]);
        // 四个互不依赖的算子：数字 id 在前，字符串 id 在后，各按自然序
        for (id, out) in [
            (OperatorId::from("z"), "a"),
            (OperatorId::from(10u64), "b"),
            (OperatorId::from(2u64), "c"),
            (OperatorId::from("y"), "d"),
        ] {
            graph
                .add_operator(Operator::new(id, "source", [], [t(out)]))
                .unwrap()
        }
        let expected: [OperatorId; 4] = [2u64.into(), 10u64.into(), "y".into(), "z".into()];
        assert_eq!(graph.topological_order().unwrap(), expected)
    }

    #[test]
    fn test_diamond() {
        let mut graph = Graph::new();
        add_tensors(&mut graph, &["x", "l", "r", "y"]);
        graph
            .add_operator(Operator::new("join", "add", [t("l"), t("r")], [t("y")]))
            .unwrap();
        graph
            .add_operator(Operator::new("right", "relu", [t("x")], [t("r")]))
            .unwrap();
        graph
            .add_operator(Operator::new("left", "relu", [t("x")], [t("l")]))
            .unwrap();

        let order = graph.topological_order().unwrap();
        assert_eq!(order.len(), 3);
        let pos =
            |id: &str| order.iter().position(|x| x == &id.into()).unwrap();
        assert!(pos("left") < pos("join"));
        assert!(pos("right") < pos("join"));
        // 两个就绪算子按 id 升序
        assert!(pos("left") < pos("right"))
    }

    #[test]
    fn test_empty() {
        assert!(Graph::new().topological_order().unwrap().is_empty())
    }

    #[test]
    fn test_parallel_edges() {
        let mut graph = Graph::new();
        add_tensors(&mut graph, &["a", "b", "c"]);
        // split 的两个输出都流向同一个消费者
        graph
            .add_operator(Operator::new("split", "split", [], [t("a"), t("b")]))
            .unwrap();
        graph
            .add_operator(Operator::new("merge", "add", [t("a"), t("b")], [t("c")]))
            .unwrap();
        let expected: [OperatorId; 2] = ["split".into(), "merge".into()];
        assert_eq!(graph.topological_order().unwrap(), expected)
    }
}
