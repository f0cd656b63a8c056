use crate::{Operator, OperatorId, Tensor, TensorId};
use itertools::Itertools;
use patricia_tree::PatriciaMap;
use std::{
    collections::{HashMap, HashSet},
    fmt,
};

/// 计算图容器
///
/// 独占图内全部张量和算子，维护两者之间的引用关系。每个成功返回的修改操作
/// 都把图从一个合法状态转移到下一个合法状态；失败的操作不留下任何痕迹。
#[derive(Clone, Default)]
pub struct Graph {
    pub name: Option<String>,
    tensors: HashMap<TensorId, Tensor>,
    operators: HashMap<OperatorId, Operator>,
    inputs: Vec<TensorId>,
    outputs: Vec<TensorId>,
    // 名字到 id 的索引，随节点增删维护；名字允许重复
    tensor_names: PatriciaMap<Vec<TensorId>>,
    operator_names: PatriciaMap<Vec<OperatorId>>,
}

/// 图操作失败的原因；任何失败都不改变图的可见状态
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GraphError {
    DuplicateId,
    UnknownTensor,
    NotFound,
    MultipleProducers,
    TensorInUse,
    CycleDetected,
}

impl Graph {
    /// 创建空图
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl ToString) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// 登记张量
    ///
    /// 生产者、消费者是推导出的关系，即使传入的张量带有（例如从别的图克隆出来），
    /// 也一律清空，由本图在算子插入时重建。
    pub fn add_tensor(&mut self, mut tensor: Tensor) -> Result<(), GraphError> {
        if self.tensors.contains_key(&tensor.id) {
            return Err(GraphError::DuplicateId);
        }
        tensor.producer = None;
        tensor.consumers.clear();
        if let Some(name) = &tensor.name {
            register_name(&mut self.tensor_names, name, &tensor.id)
        }
        self.tensors.insert(tensor.id.clone(), tensor);
        Ok(())
    }

    /// 插入算子并在其两侧张量上建立反向引用
    ///
    /// 全部检查通过之前不写入任何内容。
    pub fn add_operator(&mut self, operator: Operator) -> Result<(), GraphError> {
        if self.operators.contains_key(&operator.id) {
            return Err(GraphError::DuplicateId);
        }
        // 输出不允许重复，输入允许：同一张量可以被同一算子消费多次
        if !operator.outputs.iter().all_unique() {
            return Err(GraphError::DuplicateId);
        }
        for id in operator.inputs.iter().chain(&operator.outputs) {
            if !self.tensors.contains_key(id) {
                return Err(GraphError::UnknownTensor);
            }
        }
        for id in &operator.outputs {
            if self.tensors[id].producer.is_some() {
                return Err(GraphError::MultipleProducers);
            }
        }
        self.check_acyclic(&operator)?;

        for id in &operator.inputs {
            let consumers = &mut self.tensors.get_mut(id).unwrap().consumers;
            if !consumers.contains(&operator.id) {
                consumers.push(operator.id.clone())
            }
        }
        for id in &operator.outputs {
            self.tensors.get_mut(id).unwrap().producer = Some(operator.id.clone())
        }
        if let Some(name) = &operator.name {
            register_name(&mut self.operator_names, name, &operator.id)
        }
        self.operators.insert(operator.id.clone(), operator);
        Ok(())
    }

    /// 检查插入算子是否会使引用图成环
    ///
    /// 新算子接在「输入的生产者」之后、「输出的消费者」之前；
    /// 若后者已能到达前者，插入即成环。
    fn check_acyclic(&self, operator: &Operator) -> Result<(), GraphError> {
        if operator.inputs.iter().any(|id| operator.outputs.contains(id)) {
            return Err(GraphError::CycleDetected);
        }
        let targets = operator
            .inputs
            .iter()
            .filter_map(|id| self.tensors[id].producer.as_ref())
            .collect::<HashSet<_>>();
        if targets.is_empty() {
            return Ok(());
        }
        let mut stack = operator
            .outputs
            .iter()
            .flat_map(|id| self.tensors[id].consumers.iter())
            .collect::<Vec<_>>();
        let mut visited = HashSet::new();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if targets.contains(id) {
                return Err(GraphError::CycleDetected);
            }
            stack.extend(
                self.operators[id]
                    .outputs
                    .iter()
                    .flat_map(|t| self.tensors[t].consumers.iter()),
            )
        }
        Ok(())
    }

    /// 移除算子，先解除它在两侧张量上的反向引用
    pub fn remove_operator(&mut self, id: &OperatorId) -> Result<(), GraphError> {
        let Some(operator) = self.operators.remove(id) else {
            return Err(GraphError::NotFound);
        };
        for t in &operator.inputs {
            self.tensors
                .get_mut(t)
                .unwrap()
                .consumers
                .retain(|c| c != id)
        }
        for t in &operator.outputs {
            self.tensors.get_mut(t).unwrap().producer = None
        }
        if let Some(name) = &operator.name {
            unregister_name(&mut self.operator_names, name, id)
        }
        Ok(())
    }

    /// 移除张量；仍被算子或全图输入输出引用的张量不可移除
    pub fn remove_tensor(&mut self, id: &TensorId) -> Result<(), GraphError> {
        let Some(tensor) = self.tensors.get(id) else {
            return Err(GraphError::NotFound);
        };
        if tensor.producer.is_some()
            || !tensor.consumers.is_empty()
            || self.inputs.contains(id)
            || self.outputs.contains(id)
        {
            return Err(GraphError::TensorInUse);
        }
        let tensor = self.tensors.remove(id).unwrap();
        if let Some(name) = &tensor.name {
            unregister_name(&mut self.tensor_names, name, id)
        }
        Ok(())
    }

    /// 指定全图输入，整体替换原列表
    pub fn set_inputs(
        &mut self,
        ids: impl IntoIterator<Item = TensorId>,
    ) -> Result<(), GraphError> {
        self.inputs = self.check_io(ids)?;
        Ok(())
    }

    /// 指定全图输出，整体替换原列表
    pub fn set_outputs(
        &mut self,
        ids: impl IntoIterator<Item = TensorId>,
    ) -> Result<(), GraphError> {
        self.outputs = self.check_io(ids)?;
        Ok(())
    }

    fn check_io(
        &self,
        ids: impl IntoIterator<Item = TensorId>,
    ) -> Result<Vec<TensorId>, GraphError> {
        let ids = ids.into_iter().collect::<Vec<_>>();
        if !ids.iter().all_unique() {
            return Err(GraphError::DuplicateId);
        }
        if ids.iter().any(|id| !self.tensors.contains_key(id)) {
            return Err(GraphError::UnknownTensor);
        }
        Ok(ids)
    }

    #[inline]
    pub fn get_tensor(&self, id: &TensorId) -> Option<&Tensor> {
        self.tensors.get(id)
    }

    #[inline]
    pub fn get_operator(&self, id: &OperatorId) -> Option<&Operator> {
        self.operators.get(id)
    }

    /// 按名字查找张量；重名时返回最早登记的
    pub fn find_tensor(&self, name: impl AsRef<str>) -> Option<&Tensor> {
        let ids = self.tensor_names.get(name.as_ref())?;
        self.tensors.get(ids.first()?)
    }

    /// 按名字查找算子；重名时返回最早登记的
    pub fn find_operator(&self, name: impl AsRef<str>) -> Option<&Operator> {
        let ids = self.operator_names.get(name.as_ref())?;
        self.operators.get(ids.first()?)
    }

    #[inline]
    pub fn inputs(&self) -> &[TensorId] {
        &self.inputs
    }

    #[inline]
    pub fn outputs(&self) -> &[TensorId] {
        &self.outputs
    }

    /// 全图输入对应的张量
    pub fn input_tensors(&self) -> impl Iterator<Item = &Tensor> {
        self.inputs.iter().map(|id| &self.tensors[id])
    }

    /// 全图输出对应的张量
    pub fn output_tensors(&self) -> impl Iterator<Item = &Tensor> {
        self.outputs.iter().map(|id| &self.tensors[id])
    }

    pub fn tensors(&self) -> impl Iterator<Item = &Tensor> {
        self.tensors.values()
    }

    pub fn operators(&self) -> impl Iterator<Item = &Operator> {
        self.operators.values()
    }

    #[inline]
    pub fn n_tensors(&self) -> usize {
        self.tensors.len()
    }

    #[inline]
    pub fn n_operators(&self) -> usize {
        self.operators.len()
    }

    /// 完整性自检
    ///
    /// 正常使用中不变式恒成立，此检查不应失败；用于测试和防御性验证。
    pub fn validate(&self) -> Result<(), GraphError> {
        for op in self.operators.values() {
            for id in op.inputs.iter().chain(&op.outputs) {
                if !self.tensors.contains_key(id) {
                    return Err(GraphError::UnknownTensor);
                }
            }
        }
        for (id, tensor) in &self.tensors {
            if let Some(p) = &tensor.producer {
                match self.operators.get(p) {
                    Some(op) if op.outputs.contains(id) => {}
                    _ => return Err(GraphError::NotFound),
                }
            }
            for c in &tensor.consumers {
                match self.operators.get(c) {
                    Some(op) if op.inputs.contains(id) => {}
                    _ => return Err(GraphError::NotFound),
                }
            }
        }
        for id in self.inputs.iter().chain(&self.outputs) {
            if !self.tensors.contains_key(id) {
                return Err(GraphError::UnknownTensor);
            }
        }
        // 拓扑遍历本身就是环检测
        self.topological_order().map(drop)
    }
}

fn register_name<T: Clone>(names: &mut PatriciaMap<Vec<T>>, name: &str, id: &T) {
    match names.get_mut(name) {
        Some(ids) => ids.push(id.clone()),
        None => {
            names.insert(name, vec![id.clone()]);
        }
    }
}

fn unregister_name<T: PartialEq>(names: &mut PatriciaMap<Vec<T>>, name: &str, id: &T) {
    if let Some(ids) = names.get_mut(name) {
        ids.retain(|x| x != id);
        if ids.is_empty() {
            names.remove(name);
        }
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        // 名字索引是推导数据，不参与比较
        self.name == other.name
            && self.tensors == other.tensors
            && self.operators == other.operators
            && self.inputs == other.inputs
            && self.outputs == other.outputs
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("name", &self.name)
            .field("tensors", &self.tensors)
            .field("operators", &self.operators)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} tensors, {} operators",
            self.name.as_deref().unwrap_or("<anonymous>"),
            self.tensors.len(),
            self.operators.len()
        )
    }
}
