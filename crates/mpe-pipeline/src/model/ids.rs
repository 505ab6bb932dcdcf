//! Node id allocation.

use super::{NodeId, NodeKind};

/// Allocates session-unique node ids such as `p_1` or `e_2`.
///
/// One counter is shared by every kind. The allocator belongs to an import
/// session and is passed around explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdAllocator {
    /// Creates an allocator whose first id uses `next`.
    pub const fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// Allocates the next id for a node of `kind`.
    pub fn allocate(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::new(format!("{}_{}", kind.id_prefix(), self.next));
        self.next += 1;
        id
    }

    /// Restarts numbering from 1.
    pub fn reset(&mut self) {
        self.next = 1;
    }

    /// Number the next allocation will use.
    #[inline]
    pub fn peek(&self) -> u64 {
        self.next
    }
}
