mod arg;
mod graph;
mod id;
mod operator;
mod tensor;
mod topo;

pub use arg::Arg;
pub use graph::{Graph, GraphError};
pub use id::{Id, OperatorId, TensorId};
pub use operator::Operator;
pub use tensor::{DataType, Shape, Tensor};
