//! Reliability Dependency Graph (RDG) and diagram transformation.
//!
//! Each behavioral diagram becomes one [`RdgNode`]: a probabilistic
//! [`StateModel`](reliant_model::StateModel) guarded by a presence condition.
//! Optional fragments embedded in a diagram become nodes of their own, called
//! from the enclosing model through an interface and recorded as its
//! dependencies. The resulting [`DependencyGraph`] may be diamond-shaped but
//! never cyclic; [`DependencyGraph::transitive_closure`] lists the nodes a
//! root depends on, leaves first.

pub mod diagram;
pub mod error;
pub mod graph;
pub mod node;
pub mod transform;

pub use diagram::{DiagramElement, Fragment, FragmentKind, Message, MessageKind, SequenceDiagram};
pub use error::GraphError;
pub use graph::DependencyGraph;
pub use node::{validate_node_id, NodeId, RdgNode, RESERVED_ID_PREFIX, UNCONDITIONAL};
pub use transform::DiagramTransformer;
