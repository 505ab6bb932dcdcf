//! Editable graph model: nodes, edges and session-scoped ids.

mod edge;
mod ids;
mod node;

pub use edge::{EdgeAttributes, GraphEdge, SourceHandle, TARGET_HANDLE};
pub use ids::IdAllocator;
pub use node::{
    Action, GraphNode, HandleDirection, NodeData, NodeId, NodeKind, Position, Recognition,
};
