//! Connection graph - the attach/detach lifecycle protocol
//!
//! Every window and every sub-component is a node in an arena-backed graph.
//! Nodes carry a tri-state lifecycle flag and an ordered child list; attach
//! and detach follow a strict protocol:
//!
//! 1. A node may only transition `Unattached -> Connected` once per attach.
//! 2. `Disconnected` is terminal for that attachment - only an explicit
//!    [`ConnectionGraph::reconnect`] re-attaches the node.
//! 3. Detaching a node detaches all of its own children first (depth-first),
//!    so no `Connected` descendant survives its ancestor's detachment.
//!
//! Protocol violations (double-connect, disconnect of an unconnected node)
//! are logged, counted, and turn the operation into a no-op; they never
//! abort the caller.

use crate::resolve::DependencySet;
use bitflags::bitflags;
use slotmap::{new_key_type, SlotMap};
use std::any::Any;

new_key_type! {
    /// Stable handle to a node in the connection graph arena.
    pub struct NodeId;
}

/// Lifecycle flag carried by every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectState {
    /// Created but never attached.
    Unattached,
    /// Currently attached to a parent.
    Connected,
    /// Detached; terminal until an explicit reconnect.
    Disconnected,
}

bitflags! {
    /// Optional lifecycle hooks a node declares.
    ///
    /// Sampled once when the node enters the arena and cached on its slot,
    /// so the graph never re-queries the node while running a lifecycle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        /// Node implements [`Connectable::init`].
        const INIT = 1 << 0;
        /// Node implements [`Connectable::apply_resolving`].
        const RESOLVE = 1 << 1;
        /// Node implements [`Connectable::begin_play`].
        const BEGIN_PLAY = 1 << 2;
        /// Node implements [`Connectable::unload`].
        const UNLOAD = 1 << 3;
        /// Node implements [`Connectable::on_show`].
        const SHOW = 1 << 4;
        /// Node implements [`Connectable::on_hide`].
        const HIDE = 1 << 5;
    }
}

/// Error reported by a failing lifecycle hook.
///
/// Hook failures are caught at the graph boundary, logged with the
/// offending node's type name, and never propagated to the caller.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

/// Result type returned by lifecycle hooks.
pub type HookResult = Result<(), HookError>;

/// Behaviour attached to a graph node.
///
/// All hooks are optional: a node declares the ones it implements through
/// [`Connectable::capabilities`] and the graph only invokes declared hooks.
/// The default bodies are no-ops so implementors override exactly what
/// they declare.
pub trait Connectable: Any {
    /// The set of lifecycle hooks this node implements.
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    /// Called first when the node is attached.
    fn init(&mut self) -> HookResult {
        Ok(())
    }

    /// Called after `init` with the external dependencies supplied to the
    /// attach operation.
    fn apply_resolving(&mut self, _deps: &DependencySet) -> HookResult {
        Ok(())
    }

    /// Called last in the attach sequence.
    fn begin_play(&mut self) -> HookResult {
        Ok(())
    }

    /// Called when the node is detached, after all of its own children
    /// have been detached.
    fn unload(&mut self) -> HookResult {
        Ok(())
    }

    /// Called when the registry makes a window node visible.
    fn on_show(&mut self) -> HookResult {
        Ok(())
    }

    /// Called when the registry hides a window node.
    fn on_hide(&mut self) -> HookResult {
        Ok(())
    }

    /// Upcast for typed access to the concrete node.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed access to the concrete node.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Anchor behaviour for the permanent graph root.
struct RootAnchor;

impl Connectable for RootAnchor {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Arena slot for one node.
struct NodeSlot {
    behaviour: Box<dyn Connectable>,
    type_name: &'static str,
    caps: Capabilities,
    state: ConnectState,
    /// Non-owning back-reference to the attaching parent.
    /// Valid only while `Connected`; cleared on detach.
    parent: Option<NodeId>,
    /// Attached children in insertion order (cascade order on teardown).
    children: Vec<NodeId>,
}

/// Arena-backed connection graph shared by windows and sub-components.
///
/// Ownership flows parent to child through handles only; the arena owns
/// every node, so cycles cannot keep anything alive and teardown is a
/// plain depth-first traversal.
pub struct ConnectionGraph {
    nodes: SlotMap<NodeId, NodeSlot>,
    root: NodeId,
    violations: u64,
}

impl ConnectionGraph {
    /// Create an empty graph with its permanent root anchor.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeSlot {
            behaviour: Box::new(RootAnchor),
            type_name: "RootAnchor",
            caps: Capabilities::empty(),
            state: ConnectState::Connected,
            parent: None,
            children: Vec::new(),
        });

        Self {
            nodes,
            root,
            violations: 0,
        }
    }

    /// Handle of the permanent root anchor. Windows attach under it.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of protocol violations reported so far.
    ///
    /// Every violation is also emitted through `log::error!`; this counter
    /// is the observable error channel for callers and tests.
    pub fn violations(&self) -> u64 {
        self.violations
    }

    /// Insert a new node in the `Unattached` state.
    pub fn insert<T: Connectable>(&mut self, behaviour: T) -> NodeId {
        self.insert_boxed(Box::new(behaviour), std::any::type_name::<T>())
    }

    /// Insert an already-boxed node, typically built by a catalog prototype.
    pub fn insert_boxed(
        &mut self,
        behaviour: Box<dyn Connectable>,
        type_name: &'static str,
    ) -> NodeId {
        let caps = behaviour.capabilities();
        self.nodes.insert(NodeSlot {
            behaviour,
            type_name,
            caps,
            state: ConnectState::Unattached,
            parent: None,
            children: Vec::new(),
        })
    }

    /// Whether the handle refers to a live arena slot.
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    /// Lifecycle state of a node, if it exists.
    pub fn state(&self, node: NodeId) -> Option<ConnectState> {
        self.nodes.get(node).map(|slot| slot.state)
    }

    /// Parent of a node while it is `Connected`.
    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|slot| slot.parent)
    }

    /// Attached children of a node in insertion order.
    pub fn children_of(&self, node: NodeId) -> &[NodeId] {
        match self.nodes.get(node) {
            Some(slot) => &slot.children,
            None => &[],
        }
    }

    /// Type name recorded for a node when it entered the arena.
    pub fn type_name_of(&self, node: NodeId) -> Option<&'static str> {
        self.nodes.get(node).map(|slot| slot.type_name)
    }

    /// Typed access to a node's behaviour.
    pub fn get<T: Connectable>(&self, node: NodeId) -> Option<&T> {
        self.nodes
            .get(node)
            .and_then(|slot| slot.behaviour.as_any().downcast_ref::<T>())
    }

    /// Typed mutable access to a node's behaviour.
    pub fn get_mut<T: Connectable>(&mut self, node: NodeId) -> Option<&mut T> {
        self.nodes
            .get_mut(node)
            .and_then(|slot| slot.behaviour.as_any_mut().downcast_mut::<T>())
    }

    /// Attach `child` under `parent` and run its attach lifecycle.
    ///
    /// Runs `init`, `apply_resolving` and `begin_play` in that order, each
    /// gated on the child's declared capabilities. Attaching an
    /// already-`Connected` child is a reported violation and a no-op.
    /// Returns the child handle for chaining.
    pub fn connect(&mut self, parent: NodeId, child: NodeId, deps: &DependencySet) -> NodeId {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            self.report_violation("invalid connection - unknown node handle".to_string());
            return child;
        }

        if parent == child {
            let name = self.nodes[child].type_name;
            self.report_violation(format!("invalid connection - {name} cannot attach to itself"));
            return child;
        }

        if self.nodes[child].state == ConnectState::Connected {
            let parent_name = self.nodes[parent].type_name;
            let child_name = self.nodes[child].type_name;
            self.report_violation(format!(
                "invalid connection - {parent_name} and already connected {child_name}"
            ));
            return child;
        }

        {
            let slot = &mut self.nodes[child];
            slot.parent = Some(parent);
            slot.state = ConnectState::Connected;
        }
        self.nodes[parent].children.push(child);

        self.run_attach_hooks(child, deps);
        child
    }

    /// Detach `child` from `parent`, cascading through its descendants.
    ///
    /// All of the child's own children detach first (depth-first), then the
    /// child's `unload` hook runs, its back-reference is cleared and it is
    /// marked `Disconnected`. Returns `false` (after a reported violation)
    /// when the child is not currently attached under `parent`.
    pub fn disconnect(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            self.report_violation("invalid disconnection - unknown node handle".to_string());
            return false;
        }

        let slot = &self.nodes[child];
        if slot.state != ConnectState::Connected || slot.parent != Some(parent) {
            let parent_name = self.nodes[parent].type_name;
            let child_name = self.nodes[child].type_name;
            self.report_violation(format!(
                "invalid disconnection - {child_name} is not connected under {parent_name}"
            ));
            return false;
        }

        let position = self.nodes[parent]
            .children
            .iter()
            .position(|entry| *entry == child);
        if let Some(position) = position {
            self.nodes[parent].children.remove(position);
        }

        self.cascade_detach(child);
        true
    }

    /// Detach every currently-`Connected` child of `parent` in current
    /// order. Tolerant of an empty child list.
    pub fn disconnect_all(&mut self, parent: NodeId) {
        let Some(slot) = self.nodes.get_mut(parent) else {
            return;
        };

        let children = std::mem::take(&mut slot.children);
        for child in children {
            if self.state(child) == Some(ConnectState::Connected) {
                self.cascade_detach(child);
            }
        }
    }

    /// Detach-then-attach in one operation.
    ///
    /// The only sanctioned way to bring a `Disconnected` node back: if the
    /// child is currently `Connected` it is disconnected first, then
    /// connected under `parent` with the supplied dependencies.
    pub fn reconnect(&mut self, parent: NodeId, child: NodeId, deps: &DependencySet) -> NodeId {
        if self.state(child) == Some(ConnectState::Connected) {
            if let Some(current) = self.parent_of(child) {
                self.disconnect(current, child);
            }
        }

        self.connect(parent, child, deps)
    }

    /// Self-detachment: detach `child` through its recorded parent.
    ///
    /// Lets a node ask to be removed without holding a handle that can
    /// mutate its parent's child list directly.
    pub fn request_disconnect(&mut self, child: NodeId) -> bool {
        let parent = self.nodes.get(child).and_then(|slot| slot.parent);
        match parent {
            Some(parent) => self.disconnect(parent, child),
            None => {
                let name = self
                    .nodes
                    .get(child)
                    .map_or("<unknown>", |slot| slot.type_name);
                self.report_violation(format!(
                    "invalid disconnection - {name} has no attached parent"
                ));
                false
            }
        }
    }

    /// Collect `node` and every descendant reachable through child lists.
    ///
    /// Taken *before* a cascading disconnect clears the lists, so the
    /// caller can drop the whole subtree from the arena afterwards.
    pub fn collect_subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut collected = Vec::new();
        let mut pending = vec![node];

        while let Some(current) = pending.pop() {
            if let Some(slot) = self.nodes.get(current) {
                collected.push(current);
                pending.extend(slot.children.iter().copied());
            }
        }

        collected
    }

    /// Drop a fully detached node from the arena.
    ///
    /// Removing a node that is still `Connected` is a reported violation
    /// and a no-op; disconnect it first.
    pub fn remove(&mut self, node: NodeId) -> bool {
        match self.nodes.get(node) {
            None => false,
            Some(slot) if slot.state == ConnectState::Connected => {
                let name = slot.type_name;
                self.report_violation(format!(
                    "invalid removal - {name} is still connected"
                ));
                false
            }
            Some(_) => self.nodes.remove(node).is_some(),
        }
    }

    /// Run a window node's `on_show` hook if declared.
    pub(crate) fn invoke_show(&mut self, node: NodeId) {
        let Some(slot) = self.nodes.get_mut(node) else {
            return;
        };
        if slot.caps.contains(Capabilities::SHOW) {
            if let Err(error) = slot.behaviour.on_show() {
                log::error!("show hook failed for {}: {error}", slot.type_name);
            }
        }
    }

    /// Run a window node's `on_hide` hook if declared.
    pub(crate) fn invoke_hide(&mut self, node: NodeId) {
        let Some(slot) = self.nodes.get_mut(node) else {
            return;
        };
        if slot.caps.contains(Capabilities::HIDE) {
            if let Err(error) = slot.behaviour.on_hide() {
                log::error!("hide hook failed for {}: {error}", slot.type_name);
            }
        }
    }

    /// Attach lifecycle: `init`, then `apply_resolving`, then `begin_play`.
    /// Each hook failure is logged with the node's type name and contained.
    fn run_attach_hooks(&mut self, node: NodeId, deps: &DependencySet) {
        let caps = self.nodes[node].caps;

        if caps.contains(Capabilities::INIT) {
            let slot = &mut self.nodes[node];
            if let Err(error) = slot.behaviour.init() {
                log::error!("init hook failed for {}: {error}", slot.type_name);
            }
        }

        if caps.contains(Capabilities::RESOLVE) {
            let slot = &mut self.nodes[node];
            if let Err(error) = slot.behaviour.apply_resolving(deps) {
                log::error!("resolve hook failed for {}: {error}", slot.type_name);
            }
        }

        if caps.contains(Capabilities::BEGIN_PLAY) {
            let slot = &mut self.nodes[node];
            if let Err(error) = slot.behaviour.begin_play() {
                log::error!("begin_play hook failed for {}: {error}", slot.type_name);
            }
        }
    }

    /// Depth-first teardown: descendants fully detach before the node's
    /// own `unload` runs, so no `Connected` descendant outlives it.
    fn cascade_detach(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node].children);
        for child in children {
            if self.state(child) == Some(ConnectState::Connected) {
                self.cascade_detach(child);
            }
        }

        let slot = &mut self.nodes[node];
        if slot.caps.contains(Capabilities::UNLOAD) {
            if let Err(error) = slot.behaviour.unload() {
                log::error!("unload hook failed for {}: {error}", slot.type_name);
            }
        }

        let slot = &mut self.nodes[node];
        slot.parent = None;
        slot.state = ConnectState::Disconnected;
    }

    fn report_violation(&mut self, message: String) {
        self.violations += 1;
        log::error!("{message}");
    }
}

impl Default for ConnectionGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type HookLog = Rc<RefCell<Vec<&'static str>>>;

    struct Probe {
        log: HookLog,
        fail_unload: bool,
    }

    impl Probe {
        fn new(log: &HookLog) -> Self {
            Self {
                log: Rc::clone(log),
                fail_unload: false,
            }
        }

        fn failing_unload(log: &HookLog) -> Self {
            Self {
                log: Rc::clone(log),
                fail_unload: true,
            }
        }
    }

    impl Connectable for Probe {
        fn capabilities(&self) -> Capabilities {
            Capabilities::INIT
                | Capabilities::RESOLVE
                | Capabilities::BEGIN_PLAY
                | Capabilities::UNLOAD
        }

        fn init(&mut self) -> HookResult {
            self.log.borrow_mut().push("init");
            Ok(())
        }

        fn apply_resolving(&mut self, _deps: &DependencySet) -> HookResult {
            self.log.borrow_mut().push("resolve");
            Ok(())
        }

        fn begin_play(&mut self) -> HookResult {
            self.log.borrow_mut().push("begin_play");
            Ok(())
        }

        fn unload(&mut self) -> HookResult {
            self.log.borrow_mut().push("unload");
            if self.fail_unload {
                return Err("unload exploded".into());
            }
            Ok(())
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    struct Bare;

    impl Connectable for Bare {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    #[test]
    fn connect_attaches_and_runs_hooks_in_order() {
        let log: HookLog = Rc::default();
        let mut graph = ConnectionGraph::new();
        let root = graph.root();
        let node = graph.insert(Probe::new(&log));

        assert_eq!(graph.state(node), Some(ConnectState::Unattached));

        graph.connect(root, node, &DependencySet::new());

        assert_eq!(graph.state(node), Some(ConnectState::Connected));
        assert_eq!(graph.parent_of(node), Some(root));
        assert_eq!(graph.children_of(root), &[node]);
        assert_eq!(*log.borrow(), vec!["init", "resolve", "begin_play"]);
        assert_eq!(graph.violations(), 0);
    }

    #[test]
    fn double_connect_is_a_reported_no_op() {
        let log: HookLog = Rc::default();
        let mut graph = ConnectionGraph::new();
        let root = graph.root();
        let node = graph.insert(Probe::new(&log));

        graph.connect(root, node, &DependencySet::new());
        log.borrow_mut().clear();

        let returned = graph.connect(root, node, &DependencySet::new());

        assert_eq!(returned, node);
        assert_eq!(graph.violations(), 1);
        assert_eq!(graph.children_of(root), &[node]);
        assert!(log.borrow().is_empty(), "hooks must not rerun");
    }

    #[test]
    fn disconnect_of_unconnected_node_is_a_reported_no_op() {
        let mut graph = ConnectionGraph::new();
        let root = graph.root();
        let node = graph.insert(Bare);

        assert!(!graph.disconnect(root, node));
        assert_eq!(graph.violations(), 1);
        assert_eq!(graph.state(node), Some(ConnectState::Unattached));
    }

    #[test]
    fn disconnect_cascades_depth_first() {
        let log: HookLog = Rc::default();
        let mut graph = ConnectionGraph::new();
        let root = graph.root();
        let a = graph.insert(Probe::new(&log));
        let b = graph.insert(Probe::new(&log));
        let c = graph.insert(Probe::new(&log));

        let deps = DependencySet::new();
        graph.connect(root, a, &deps);
        graph.connect(a, b, &deps);
        graph.connect(b, c, &deps);
        log.borrow_mut().clear();

        assert!(graph.disconnect(root, a));

        assert_eq!(graph.state(a), Some(ConnectState::Disconnected));
        assert_eq!(graph.state(b), Some(ConnectState::Disconnected));
        assert_eq!(graph.state(c), Some(ConnectState::Disconnected));
        assert!(graph.children_of(a).is_empty());
        assert!(graph.children_of(root).is_empty());
        // Deepest unload runs first.
        assert_eq!(*log.borrow(), vec!["unload", "unload", "unload"]);
        assert_eq!(graph.parent_of(b), None);
    }

    #[test]
    fn failing_unload_does_not_stop_the_cascade() {
        let log: HookLog = Rc::default();
        let mut graph = ConnectionGraph::new();
        let root = graph.root();
        let a = graph.insert(Probe::new(&log));
        let b = graph.insert(Probe::failing_unload(&log));
        let c = graph.insert(Probe::new(&log));

        let deps = DependencySet::new();
        graph.connect(root, a, &deps);
        graph.connect(a, b, &deps);
        graph.connect(b, c, &deps);

        assert!(graph.disconnect(root, a));

        assert_eq!(graph.state(a), Some(ConnectState::Disconnected));
        assert_eq!(graph.state(b), Some(ConnectState::Disconnected));
        assert_eq!(graph.state(c), Some(ConnectState::Disconnected));
    }

    #[test]
    fn disconnect_all_is_tolerant_of_empty_lists() {
        let mut graph = ConnectionGraph::new();
        let root = graph.root();

        graph.disconnect_all(root);

        assert_eq!(graph.violations(), 0);
        assert!(graph.children_of(root).is_empty());
    }

    #[test]
    fn disconnect_all_detaches_in_insertion_order() {
        let log: HookLog = Rc::default();
        let mut graph = ConnectionGraph::new();
        let root = graph.root();
        let first = graph.insert(Probe::new(&log));
        let second = graph.insert(Probe::new(&log));

        let deps = DependencySet::new();
        graph.connect(root, first, &deps);
        graph.connect(root, second, &deps);

        graph.disconnect_all(root);

        assert!(graph.children_of(root).is_empty());
        assert_eq!(graph.state(first), Some(ConnectState::Disconnected));
        assert_eq!(graph.state(second), Some(ConnectState::Disconnected));
    }

    #[test]
    fn reconnect_matches_disconnect_then_connect() {
        let log: HookLog = Rc::default();
        let mut graph = ConnectionGraph::new();
        let root = graph.root();
        let node = graph.insert(Probe::new(&log));

        let deps = DependencySet::new();
        graph.connect(root, node, &deps);
        log.borrow_mut().clear();

        graph.reconnect(root, node, &deps);

        assert_eq!(graph.state(node), Some(ConnectState::Connected));
        assert_eq!(graph.children_of(root), &[node]);
        assert_eq!(
            *log.borrow(),
            vec!["unload", "init", "resolve", "begin_play"]
        );
        assert_eq!(graph.violations(), 0);
    }

    #[test]
    fn disconnected_is_terminal_without_explicit_reconnect() {
        let log: HookLog = Rc::default();
        let mut graph = ConnectionGraph::new();
        let root = graph.root();
        let node = graph.insert(Probe::new(&log));

        let deps = DependencySet::new();
        graph.connect(root, node, &deps);
        graph.disconnect(root, node);

        assert_eq!(graph.state(node), Some(ConnectState::Disconnected));

        // Explicit reconnect is the sanctioned path back.
        graph.reconnect(root, node, &deps);
        assert_eq!(graph.state(node), Some(ConnectState::Connected));
    }

    #[test]
    fn request_disconnect_goes_through_the_recorded_parent() {
        let log: HookLog = Rc::default();
        let mut graph = ConnectionGraph::new();
        let root = graph.root();
        let parent = graph.insert(Probe::new(&log));
        let child = graph.insert(Probe::new(&log));

        let deps = DependencySet::new();
        graph.connect(root, parent, &deps);
        graph.connect(parent, child, &deps);

        assert!(graph.request_disconnect(child));
        assert_eq!(graph.state(child), Some(ConnectState::Disconnected));
        assert!(graph.children_of(parent).is_empty());

        // Without a recorded parent the request is a reported violation.
        assert!(!graph.request_disconnect(child));
        assert_eq!(graph.violations(), 1);
    }

    #[test]
    fn remove_requires_a_detached_node() {
        let mut graph = ConnectionGraph::new();
        let root = graph.root();
        let node = graph.insert(Bare);

        graph.connect(root, node, &DependencySet::new());
        assert!(!graph.remove(node));
        assert_eq!(graph.violations(), 1);

        graph.disconnect(root, node);
        assert!(graph.remove(node));
        assert!(!graph.contains(node));
    }

    #[test]
    fn typed_access_downcasts_the_behaviour() {
        let log: HookLog = Rc::default();
        let mut graph = ConnectionGraph::new();
        let node = graph.insert(Probe::new(&log));

        assert!(graph.get::<Probe>(node).is_some());
        assert!(graph.get::<Bare>(node).is_none());
    }
}
