//! Window catalog - prototype registration and runtime assembly
//!
//! The catalog is the immutable type-to-prototype mapping the registry
//! instantiates windows from. It is assembled once at startup from two
//! halves: code-side prototype registrations ([`Prototypes`]) and the
//! authored manifest asset ([`CatalogManifest`]) that lists which windows
//! ship, optionally partitioned by deployment target.
//!
//! Authoring-time validation is strict (duplicates are configuration
//! errors); runtime assembly is permissive (first registration wins,
//! duplicates and unknown names are logged and skipped).

mod manifest;

pub use manifest::{CatalogManifest, FALLBACK_MANIFEST, PRIMARY_MANIFEST};

use crate::graph::Connectable;
use crate::window::{Window, WindowSpec};
use std::any::TypeId;
use std::collections::HashMap;

/// Catalog configuration and loading errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Manifest file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest file could not be parsed.
    #[error("parse error in {path}: {message}")]
    Parse {
        /// Path of the offending manifest.
        path: String,
        /// Parser diagnostic.
        message: String,
    },

    /// Manifest file extension is not a supported format.
    #[error("unsupported manifest format: {0}")]
    UnsupportedFormat(String),

    /// Neither the primary nor the fallback manifest exists.
    #[error("no catalog manifest in {dir} (tried windows.ron and windows.default.ron)")]
    MissingManifest {
        /// Directory that was searched.
        dir: String,
    },

    /// A prototype name or window type was registered twice.
    #[error("duplicate prototype registration: {name}")]
    DuplicateRegistration {
        /// Offending prototype name.
        name: String,
    },

    /// A window name appears more than once within one deployment
    /// partition of the manifest.
    #[error("duplicate window entry {name} in group {group}")]
    DuplicateEntry {
        /// Offending window name.
        name: String,
        /// Manifest group containing the duplicate.
        group: &'static str,
    },
}

/// Deployment partition selecting which manifest groups apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformGroup {
    /// Desktop targets (Windows, Linux, macOS).
    Standalone,
    /// Mobile targets (Android, iOS).
    Mobile,
}

impl PlatformGroup {
    /// Partition for the compilation target.
    pub fn current() -> Self {
        if cfg!(any(target_os = "android", target_os = "ios")) {
            Self::Mobile
        } else {
            Self::Standalone
        }
    }
}

/// One registered window prototype: type identity, stacking spec and a
/// constructor used as the instantiation template.
struct Prototype {
    type_id: TypeId,
    type_name: &'static str,
    spec: WindowSpec,
    build: Box<dyn Fn() -> Box<dyn Connectable>>,
}

/// Code-side prototype registrations, keyed by manifest name.
#[derive(Default)]
pub struct Prototypes {
    by_name: HashMap<String, Prototype>,
}

impl Prototypes {
    /// Create an empty registration set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window prototype under its manifest name.
    ///
    /// Registering the same name or the same window type twice is a
    /// configuration error.
    pub fn register<T, F>(
        &mut self,
        name: &str,
        spec: WindowSpec,
        build: F,
    ) -> Result<(), CatalogError>
    where
        T: Window,
        F: Fn() -> T + 'static,
    {
        let type_id = TypeId::of::<T>();
        let duplicate = self.by_name.contains_key(name)
            || self.by_name.values().any(|proto| proto.type_id == type_id);
        if duplicate {
            return Err(CatalogError::DuplicateRegistration {
                name: name.to_string(),
            });
        }

        self.by_name.insert(
            name.to_string(),
            Prototype {
                type_id,
                type_name: std::any::type_name::<T>(),
                spec,
                build: Box::new(move || Box::new(build())),
            },
        );
        Ok(())
    }

    /// Number of registered prototypes.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether no prototype has been registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn take(&mut self, name: &str) -> Option<Prototype> {
        self.by_name.remove(name)
    }
}

pub(crate) struct CatalogEntry {
    pub(crate) name: String,
    pub(crate) type_name: &'static str,
    pub(crate) spec: WindowSpec,
    build: Box<dyn Fn() -> Box<dyn Connectable>>,
}

impl CatalogEntry {
    pub(crate) fn instantiate(&self) -> Box<dyn Connectable> {
        (self.build)()
    }
}

/// Immutable type-to-prototype mapping the registry draws from.
#[derive(Default)]
pub struct Catalog {
    entries: HashMap<TypeId, CatalogEntry>,
}

impl Catalog {
    /// Create an empty catalog for direct, manifest-free registration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window type directly.
    ///
    /// Strict: a second registration of the same window type is a
    /// configuration error, mirroring the authoring-time validator.
    pub fn register<T, F>(
        &mut self,
        name: &str,
        spec: WindowSpec,
        build: F,
    ) -> Result<(), CatalogError>
    where
        T: Window,
        F: Fn() -> T + 'static,
    {
        let type_id = TypeId::of::<T>();
        if self.entries.contains_key(&type_id) {
            return Err(CatalogError::DuplicateRegistration {
                name: name.to_string(),
            });
        }

        self.entries.insert(
            type_id,
            CatalogEntry {
                name: name.to_string(),
                type_name: std::any::type_name::<T>(),
                spec,
                build: Box::new(move || Box::new(build())),
            },
        );
        Ok(())
    }

    /// Assemble the catalog from a manifest and the registered prototypes.
    ///
    /// Walks the shared group, then the group for `platform`, in manifest
    /// order. Permissive by design: duplicate entries within a partition
    /// are skipped (first wins) and manifest names with no registered
    /// prototype are logged and skipped. Run
    /// [`CatalogManifest::validate`] to surface those as errors at
    /// authoring time instead.
    pub fn assemble(
        manifest: &CatalogManifest,
        mut prototypes: Prototypes,
        platform: PlatformGroup,
    ) -> Self {
        let mut catalog = Self::new();

        for name in manifest.names_for(platform) {
            let Some(prototype) = prototypes.take(name) else {
                if catalog.contains_name(name) {
                    log::warn!("catalog: duplicate entry {name} ignored");
                } else {
                    log::error!("catalog: no prototype registered for {name}");
                }
                continue;
            };

            log::debug!("catalog: {name} -> {}", prototype.type_name);
            catalog.entries.insert(
                prototype.type_id,
                CatalogEntry {
                    name: name.to_string(),
                    type_name: prototype.type_name,
                    spec: prototype.spec,
                    build: prototype.build,
                },
            );
        }

        if !prototypes.is_empty() {
            for name in prototypes.by_name.keys() {
                log::warn!("catalog: prototype {name} is not listed in the manifest");
            }
        }

        catalog
    }

    /// Whether a window type is present.
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.entries.contains_key(&type_id)
    }

    /// Number of catalog entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Manifest names of all entries, unordered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|entry| entry.name.as_str())
    }

    pub(crate) fn entry(&self, type_id: TypeId) -> Option<&CatalogEntry> {
        self.entries.get(&type_id)
    }

    fn contains_name(&self, name: &str) -> bool {
        self.entries.values().any(|entry| entry.name == name)
    }
}
