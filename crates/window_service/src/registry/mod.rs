//! Window registry - the stack of mutually-exclusive UI windows
//!
//! Single source of truth for which window is visible, in what order, and
//! parented to which container. The registry owns the connection graph,
//! keeps at most one live instance per window type (lazily built from the
//! catalog on first show), and maintains the priority-sorted visible
//! ordering that drives z-order in the presentation layer.
//!
//! State machine per window type:
//! `NotInstantiated -> Cached(hidden) <-> Cached(visible) -> Destroyed`.
//!
//! The original design hid all of this behind a process-wide singleton;
//! here the host composition root owns one `WindowRegistry` and tests
//! build their own, with [`WindowRegistry::reset`] for isolation.

use crate::catalog::Catalog;
use crate::events::Signal;
use crate::graph::{ConnectState, ConnectionGraph};
use crate::resolve::DependencySet;
use crate::window::{ContainerRoot, Window, WindowId, WindowSpec};
use slotmap::SecondaryMap;
use std::any::TypeId;
use std::collections::HashMap;

/// Per-instance window state. The registry is the only writer of
/// `visible`.
struct WindowState {
    type_id: TypeId,
    spec: WindowSpec,
    visible: bool,
}

/// Process-owned window registry: catalog, instance cache, visible
/// ordering and broadcast signals.
pub struct WindowRegistry {
    graph: ConnectionGraph,
    catalog: Catalog,
    /// One live instance per window type, created on first show.
    instances: HashMap<TypeId, WindowId>,
    windows: SecondaryMap<WindowId, WindowState>,
    /// Authoritative visible ordering, sorted by priority ascending.
    visible: Vec<WindowId>,
    root: Option<Box<dyn ContainerRoot>>,
    on_show: Signal<WindowId>,
    on_hide: Signal<WindowId>,
    on_update_visible: Signal<()>,
}

impl WindowRegistry {
    /// Create a registry over an assembled catalog.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            graph: ConnectionGraph::new(),
            catalog,
            instances: HashMap::new(),
            windows: SecondaryMap::new(),
            visible: Vec::new(),
            root: None,
            on_show: Signal::new(),
            on_hide: Signal::new(),
            on_update_visible: Signal::new(),
        }
    }

    /// Show a window type, instantiating it from the catalog on first use.
    ///
    /// Re-showing an already-visible window re-parents it, re-broadcasts
    /// `on_show` and moves it to the back of its priority band, without
    /// duplicating its entry in the visible ordering. Returns `None` when
    /// the type has no catalog prototype; nothing is broadcast and the
    /// ordering is untouched.
    pub fn show<T: Window>(&mut self) -> Option<WindowId> {
        self.show_with::<T>(&DependencySet::new())
    }

    /// [`WindowRegistry::show`] with external dependencies forwarded to
    /// the window's `apply_resolving` hook on first instantiation.
    pub fn show_with<T: Window>(&mut self, deps: &DependencySet) -> Option<WindowId> {
        self.show_type(TypeId::of::<T>(), deps)
    }

    fn show_type(&mut self, type_id: TypeId, deps: &DependencySet) -> Option<WindowId> {
        let id = if let Some(&cached) = self.instances.get(&type_id) {
            // Reuse the cached instance, re-parenting into the current root.
            if let Some(root) = self.root.as_mut() {
                root.adopt(cached);
            }
            cached
        } else {
            let entry = self.catalog.entry(type_id)?;
            let behaviour = entry.instantiate();
            let spec = entry.spec;
            let type_name = entry.type_name;
            log::debug!("registry: instantiating {type_name}");

            let id = self.graph.insert_boxed(behaviour, type_name);
            let anchor = self.graph.root();
            self.graph.connect(anchor, id, deps);

            self.windows.insert(
                id,
                WindowState {
                    type_id,
                    spec,
                    visible: false,
                },
            );
            self.instances.insert(type_id, id);

            if let Some(root) = self.root.as_mut() {
                root.adopt(id);
            }
            id
        };

        self.windows[id].visible = true;
        self.graph.invoke_show(id);
        self.on_show.emit(&id);

        // Idempotent membership: a re-shown window moves to the back of
        // its priority band instead of gaining a second entry.
        if let Some(position) = self.visible.iter().position(|entry| *entry == id) {
            self.visible.remove(position);
        }
        self.visible.push(id);

        self.resort_visible();
        self.on_update_visible.emit(&());
        Some(id)
    }

    /// Hide the top window. Returns `false` with no side effect (and no
    /// broadcast) when nothing is visible.
    pub fn hide(&mut self) -> bool {
        self.hide_top().is_some()
    }

    /// Hide the top window and return its handle.
    ///
    /// Broadcast ordering: `on_update_visible` fires before the window's
    /// hide lifecycle, then `on_hide` carries the hidden window.
    pub fn hide_top(&mut self) -> Option<WindowId> {
        let id = self.visible.pop()?;

        self.on_update_visible.emit(&());
        self.windows[id].visible = false;
        self.graph.invoke_hide(id);
        self.on_hide.emit(&id);
        Some(id)
    }

    /// Hide every visible window not flagged `ignore_auto_hide`.
    ///
    /// Each hidden window gets its hide lifecycle and an `on_hide`
    /// broadcast; one final `on_update_visible` fires after the ordering
    /// is rebuilt. A failing hide hook is reported and never blocks the
    /// remaining windows.
    pub fn hide_all(&mut self) {
        let all = std::mem::take(&mut self.visible);
        let mut kept = Vec::new();

        for id in all {
            if self.windows[id].spec.ignore_auto_hide {
                kept.push(id);
                continue;
            }

            self.windows[id].visible = false;
            self.graph.invoke_hide(id);
            self.on_hide.emit(&id);
        }

        self.visible = kept;
        self.on_update_visible.emit(&());
    }

    /// Peek (not pop) the top of the visible ordering.
    pub fn top(&self) -> Option<WindowId> {
        self.visible.last().copied()
    }

    /// Peek the top window if it is of type `T`.
    pub fn top_as<T: Window>(&self) -> Option<&T> {
        self.graph.get::<T>(self.top()?)
    }

    /// First visible window of type `T`, scanning in stack order.
    pub fn visible_as<T: Window>(&self) -> Option<&T> {
        self.visible.iter().find_map(|id| self.graph.get::<T>(*id))
    }

    /// Typed access to a cached window instance.
    pub fn get<T: Window>(&self, id: WindowId) -> Option<&T> {
        self.graph.get::<T>(id)
    }

    /// Typed mutable access to a cached window instance.
    pub fn get_mut<T: Window>(&mut self, id: WindowId) -> Option<&mut T> {
        self.graph.get_mut::<T>(id)
    }

    /// Read-only listing of the visible ordering, bottom to top.
    pub fn visible_windows(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.visible.iter().copied()
    }

    /// Number of currently visible windows.
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// Whether a cached window is currently visible.
    pub fn is_visible(&self, id: WindowId) -> bool {
        self.windows.get(id).is_some_and(|state| state.visible)
    }

    /// Stacking spec of a cached window.
    pub fn spec(&self, id: WindowId) -> Option<&WindowSpec> {
        self.windows.get(id).map(|state| &state.spec)
    }

    /// Whether any visible window blocks input (i.e. is not flagged
    /// `ignore_input`).
    pub fn blocks_input(&self) -> bool {
        self.visible
            .iter()
            .any(|id| !self.windows[*id].spec.ignore_input)
    }

    /// Swap the presentation container and re-parent every currently
    /// visible window into it. No visibility change, no broadcast.
    pub fn change_root(&mut self, mut root: Box<dyn ContainerRoot>) {
        for id in &self.visible {
            root.adopt(*id);
        }
        self.root = Some(root);
    }

    /// Destroy a cached window instance: drop it from the cache and the
    /// visible ordering, cascade its detach lifecycle through the graph
    /// and broadcast `on_update_visible`.
    ///
    /// Safe to call for a window that was never visible; returns `false`
    /// for an unknown handle.
    pub fn destroy_window(&mut self, id: WindowId) -> bool {
        let Some(state) = self.windows.get(id) else {
            return false;
        };
        let type_name = self.graph.type_name_of(id).unwrap_or("<window>");
        log::debug!("registry: destroying {type_name}");

        self.instances.remove(&state.type_id);
        if let Some(position) = self.visible.iter().position(|entry| *entry == id) {
            self.visible.remove(position);
        }

        // Detach lifecycle cascades through the window's sub-components,
        // then the whole subtree leaves the arena.
        let subtree = self.graph.collect_subtree(id);
        if self.graph.state(id) == Some(ConnectState::Connected) {
            let anchor = self.graph.root();
            self.graph.disconnect(anchor, id);
        }
        for node in subtree {
            self.graph.remove(node);
        }

        self.windows.remove(id);
        self.on_update_visible.emit(&());
        true
    }

    /// Tear down every cached instance and start from an empty graph,
    /// keeping the catalog and signal subscriptions. Test isolation hook.
    pub fn reset(&mut self) {
        let anchor = self.graph.root();
        self.graph.disconnect_all(anchor);
        self.graph = ConnectionGraph::new();
        self.instances.clear();
        self.windows.clear();
        self.visible.clear();
    }

    /// The connection graph, for attaching sub-components to windows.
    pub fn graph(&self) -> &ConnectionGraph {
        &self.graph
    }

    /// Mutable access to the connection graph.
    pub fn graph_mut(&mut self) -> &mut ConnectionGraph {
        &mut self.graph
    }

    /// The catalog this registry instantiates from.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Broadcast fired when a window is shown.
    pub fn on_show(&mut self) -> &mut Signal<WindowId> {
        &mut self.on_show
    }

    /// Broadcast fired when a window is hidden.
    pub fn on_hide(&mut self) -> &mut Signal<WindowId> {
        &mut self.on_hide
    }

    /// Broadcast fired whenever the visible ordering changes.
    pub fn on_update_visible(&mut self) -> &mut Signal<()> {
        &mut self.on_update_visible
    }

    /// Stable re-sort by priority ascending, then push position indexes
    /// to the container root so the presentation layer can stack windows.
    fn resort_visible(&mut self) {
        let windows = &self.windows;
        self.visible.sort_by_key(|id| windows[*id].spec.priority);

        if let Some(root) = self.root.as_mut() {
            for (index, id) in self.visible.iter().enumerate() {
                root.set_stack_index(*id, index);
            }
        }
    }
}
