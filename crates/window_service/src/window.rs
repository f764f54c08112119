//! Window metadata and the presentation-layer boundary
//!
//! A window is a connection-graph node the registry can show. Its static
//! stacking data lives in a [`WindowSpec`] supplied when the type is
//! registered in the catalog; its visibility state is owned by the
//! registry, which is the only writer.

use crate::graph::{Connectable, NodeId};

/// Handle to a window node in the registry's connection graph.
pub type WindowId = NodeId;

/// Marker for connection-graph nodes that can be shown through the
/// registry. Sub-components implement [`Connectable`] only.
pub trait Window: Connectable {}

/// Static per-type window data supplied at catalog registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    /// Stacking priority; lower sorts first, equal priorities keep
    /// most-recent-show order. Defaults to 0.
    pub priority: i32,
    /// Exempt from bulk-hide: `hide_all` leaves this window visible.
    pub ignore_auto_hide: bool,
    /// Excluded from input blocking: a visible window with this flag does
    /// not make the registry report input as blocked.
    pub ignore_input: bool,
}

impl WindowSpec {
    /// Spec with default flags and the given stacking priority.
    pub fn with_priority(priority: i32) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }

    /// Mark the window exempt from bulk-hide.
    #[must_use]
    pub fn exempt_from_auto_hide(mut self) -> Self {
        self.ignore_auto_hide = true;
        self
    }

    /// Mark the window as not blocking input while visible.
    #[must_use]
    pub fn exempt_from_input(mut self) -> Self {
        self.ignore_input = true;
        self
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            priority: 0,
            ignore_auto_hide: false,
            ignore_input: false,
        }
    }
}

/// Opaque presentation-layer container (the "canvas").
///
/// The registry only re-parents windows into it and pushes each window's
/// position in the sorted visible ordering so the presentation layer can
/// stack them. Everything else about rendering is out of scope.
pub trait ContainerRoot {
    /// Re-parent a window under this container.
    fn adopt(&mut self, window: WindowId);

    /// Assign a window its position index in the sorted visible ordering.
    fn set_stack_index(&mut self, window: WindowId, index: usize);
}
