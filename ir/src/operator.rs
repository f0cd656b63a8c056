use crate::{Arg, OperatorId, TensorId};
use std::collections::HashMap;

/// 计算图中的运算节点
#[derive(Clone, PartialEq, Debug)]
pub struct Operator {
    pub id: OperatorId,
    /// 运算类型标签，如 "conv2d"、"relu"
    pub op: String,
    pub name: Option<String>,
    pub inputs: Box<[TensorId]>,
    pub outputs: Box<[TensorId]>,
    pub attributes: HashMap<String, Arg>,
}

impl Operator {
    pub fn new(
        id: impl Into<OperatorId>,
        op: impl ToString,
        inputs: impl IntoIterator<Item = TensorId>,
        outputs: impl IntoIterator<Item = TensorId>,
    ) -> Self {
        Self {
            id: id.into(),
            op: op.to_string(),
            name: None,
            inputs: inputs.into_iter().collect(),
            outputs: outputs.into_iter().collect(),
            attributes: Default::default(),
        }
    }

    pub fn named(mut self, name: impl ToString) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_arg(mut self, key: impl ToString, value: impl Into<Arg>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}
