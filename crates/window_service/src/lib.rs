//! # Window Service
//!
//! A runtime registry for a stack of mutually-exclusive UI windows, plus
//! the connection-graph lifecycle protocol every window and sub-component
//! obeys.
//!
//! ## Features
//!
//! - **Window registry**: one live instance per window type, lazily built
//!   from a catalog, with a priority-sorted visible ordering as the single
//!   authority for "top window" and z-order
//! - **Connection graph**: arena-backed attach/detach protocol with
//!   capability-gated lifecycle hooks and exception-safe cascading teardown
//! - **Catalog**: immutable type-to-prototype mapping assembled from a
//!   RON/TOML manifest, optionally partitioned by deployment target
//! - **Broadcast signals**: synchronous show/hide/visibility-changed
//!   multicast for external observers
//!
//! ## Quick Start
//!
//! ```rust
//! use window_service::prelude::*;
//! use std::any::Any;
//!
//! struct PauseMenu;
//!
//! impl Connectable for PauseMenu {
//!     fn as_any(&self) -> &dyn Any { self }
//!     fn as_any_mut(&mut self) -> &mut dyn Any { self }
//! }
//!
//! impl Window for PauseMenu {}
//!
//! let mut catalog = Catalog::new();
//! catalog
//!     .register::<PauseMenu, _>("pause_menu", WindowSpec::with_priority(10), || PauseMenu)
//!     .unwrap();
//!
//! let mut registry = WindowRegistry::new(catalog);
//! let menu = registry.show::<PauseMenu>().unwrap();
//! assert_eq!(registry.top(), Some(menu));
//! assert!(registry.hide());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod catalog;
pub mod events;
pub mod graph;
pub mod registry;
pub mod resolve;
pub mod window;

pub use catalog::{Catalog, CatalogError, CatalogManifest, PlatformGroup, Prototypes};
pub use graph::{Capabilities, ConnectState, Connectable, ConnectionGraph, HookError, HookResult, NodeId};
pub use registry::WindowRegistry;
pub use window::{ContainerRoot, Window, WindowId, WindowSpec};

/// Common imports for window service users.
pub mod prelude {
    pub use crate::catalog::{Catalog, CatalogError, CatalogManifest, PlatformGroup, Prototypes};
    pub use crate::events::{Signal, Subscription};
    pub use crate::graph::{
        Capabilities, ConnectState, Connectable, ConnectionGraph, HookError, HookResult, NodeId,
    };
    pub use crate::registry::WindowRegistry;
    pub use crate::resolve::DependencySet;
    pub use crate::window::{ContainerRoot, Window, WindowId, WindowSpec};
}
