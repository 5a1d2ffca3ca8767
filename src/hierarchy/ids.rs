use std::fmt;

use serde::{Deserialize, Serialize};

/// Binding identifier handed out while flattening a hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Visit counter owned by a single hierarchy.
///
/// The counter advances once per visited node, whether or not that node
/// receives a fresh id, so newly assigned ids are unique but not dense.
#[derive(Clone, Debug, Default)]
pub(crate) struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub(crate) fn advance(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    #[cfg(test)]
    pub(crate) fn visited(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_is_monotonic_from_zero() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.advance(), NodeId(0));
        assert_eq!(ids.advance(), NodeId(1));
        assert_eq!(ids.visited(), 2);
    }
}
