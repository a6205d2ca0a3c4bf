//! Capability traits shared by the node types.
//!
//! Two capability sets keep structure rules explicit: ordinary containers
//! ([`crate::Scene`], [`crate::Surface`]) implement [`Container`], while the
//! [`crate::Viewport`] has a fixed structure and only exposes its own
//! role-specific operations. Everything that renders implements [`Paint`].

use crate::foundation::core::NodeId;
use crate::foundation::error::EaselResult;

/// Anything with a stable identity.
pub trait Node {
    fn id(&self) -> NodeId;
}

/// Immediate and batched repaint.
pub trait Paint {
    /// Repaint now.
    fn draw(&mut self);

    /// Request a repaint for the current frame. Repeated requests coalesce.
    fn batch(&mut self);

    /// Perform pending batched repaints; returns how many repaints ran.
    fn flush(&mut self) -> usize;
}

/// Mutable, ordered collection of children (index 0 is painted first).
pub trait Container {
    type Child: Node;

    /// Append a child on top of the paint order.
    fn add(&mut self, child: Self::Child) -> EaselResult<()>;

    /// Detach and return the child with `id`.
    fn remove(&mut self, id: NodeId) -> Option<Self::Child>;

    /// Detach every child, back to front.
    fn remove_all(&mut self) -> Vec<Self::Child>;

    fn children(&self) -> &[Self::Child];

    fn move_up(&mut self, id: NodeId) -> bool;

    fn move_down(&mut self, id: NodeId) -> bool;

    fn move_to_top(&mut self, id: NodeId) -> bool;

    fn move_to_bottom(&mut self, id: NodeId) -> bool;

    fn len(&self) -> usize {
        self.children().len()
    }

    fn is_empty(&self) -> bool {
        self.children().is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Reorder {
    Up,
    Down,
    Top,
    Bottom,
}

/// Shared z-order manipulation; returns false when `id` is absent or already in place.
pub(crate) fn reorder<T: Node>(items: &mut Vec<T>, id: NodeId, how: Reorder) -> bool {
    let Some(idx) = items.iter().position(|c| c.id() == id) else {
        return false;
    };
    let last = items.len() - 1;
    match how {
        Reorder::Up if idx < last => items.swap(idx, idx + 1),
        Reorder::Down if idx > 0 => items.swap(idx, idx - 1),
        Reorder::Top if idx < last => {
            let item = items.remove(idx);
            items.push(item);
        }
        Reorder::Bottom if idx > 0 => {
            let item = items.remove(idx);
            items.insert(0, item);
        }
        _ => return false,
    }
    true
}
