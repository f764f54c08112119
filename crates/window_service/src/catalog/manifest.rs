//! Catalog manifest asset
//!
//! The authored list of shipped windows, loaded once at startup. Supports
//! RON and TOML, dispatched on file extension. A missing primary manifest
//! falls back to [`FALLBACK_MANIFEST`] before giving up.

use super::{CatalogError, PlatformGroup};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Primary manifest file name looked up by [`CatalogManifest::load_from_dir`].
pub const PRIMARY_MANIFEST: &str = "windows.ron";

/// Fallback manifest file name used when the primary is absent.
pub const FALLBACK_MANIFEST: &str = "windows.default.ron";

/// Static window list, optionally partitioned by deployment target.
///
/// `all` applies everywhere; `standalone` and `mobile` extend it for the
/// matching [`PlatformGroup`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// Windows shipped on every target.
    #[serde(default)]
    pub all: Vec<String>,

    /// Additional windows for desktop targets.
    #[serde(default)]
    pub standalone: Vec<String>,

    /// Additional windows for mobile targets.
    #[serde(default)]
    pub mobile: Vec<String>,
}

impl CatalogManifest {
    /// Load a manifest from a single file, dispatching on extension
    /// (`.ron` or `.toml`).
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path)?;

        if display.ends_with(".ron") {
            ron::from_str(&contents).map_err(|error| CatalogError::Parse {
                path: display,
                message: error.to_string(),
            })
        } else if display.ends_with(".toml") {
            toml::from_str(&contents).map_err(|error| CatalogError::Parse {
                path: display,
                message: error.to_string(),
            })
        } else {
            Err(CatalogError::UnsupportedFormat(display))
        }
    }

    /// Load the manifest from an asset directory.
    ///
    /// Tries [`PRIMARY_MANIFEST`] first, then [`FALLBACK_MANIFEST`] with a
    /// warning, then reports [`CatalogError::MissingManifest`].
    pub fn load_from_dir(dir: &Path) -> Result<Self, CatalogError> {
        let primary = dir.join(PRIMARY_MANIFEST);
        if primary.is_file() {
            return Self::load_from_file(&primary);
        }

        let fallback = dir.join(FALLBACK_MANIFEST);
        if fallback.is_file() {
            log::warn!(
                "catalog: {PRIMARY_MANIFEST} not found in {}, using {FALLBACK_MANIFEST}",
                dir.display()
            );
            return Self::load_from_file(&fallback);
        }

        Err(CatalogError::MissingManifest {
            dir: dir.display().to_string(),
        })
    }

    /// Authoring-time validation: report every duplicate name within a
    /// deployment partition (the shared group combined with each
    /// platform group) as a configuration error.
    ///
    /// Runtime assembly stays permissive regardless; this is the strict
    /// check meant for tooling and tests.
    pub fn validate(&self) -> Vec<CatalogError> {
        let mut errors = Vec::new();

        for (group, extension) in [
            ("standalone", &self.standalone),
            ("mobile", &self.mobile),
        ] {
            let mut seen = std::collections::HashSet::new();
            for name in self.all.iter().chain(extension) {
                if !seen.insert(name.as_str()) {
                    errors.push(CatalogError::DuplicateEntry {
                        name: name.clone(),
                        group,
                    });
                }
            }
        }

        errors
    }

    /// Manifest names applying to `platform`, in manifest order: the
    /// shared group first, then the platform extension.
    pub(crate) fn names_for(&self, platform: PlatformGroup) -> impl Iterator<Item = &str> {
        let extension = match platform {
            PlatformGroup::Standalone => &self.standalone,
            PlatformGroup::Mobile => &self.mobile,
        };
        self.all
            .iter()
            .chain(extension)
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ron_manifests() {
        let source = r#"(
            all: ["dialog", "toast"],
            standalone: ["debug_console"],
        )"#;

        let manifest: CatalogManifest = ron::from_str(source).unwrap();
        assert_eq!(manifest.all, vec!["dialog", "toast"]);
        assert_eq!(manifest.standalone, vec!["debug_console"]);
        assert!(manifest.mobile.is_empty());
    }

    #[test]
    fn parses_toml_manifests() {
        let source = r#"
            all = ["dialog"]
            mobile = ["touch_hud"]
        "#;

        let manifest: CatalogManifest = toml::from_str(source).unwrap();
        assert_eq!(manifest.all, vec!["dialog"]);
        assert_eq!(manifest.mobile, vec!["touch_hud"]);
    }

    #[test]
    fn validate_reports_duplicates_per_partition() {
        let manifest = CatalogManifest {
            all: vec!["dialog".to_string()],
            standalone: vec!["dialog".to_string()],
            mobile: vec!["toast".to_string(), "toast".to_string()],
        };

        let errors = manifest.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|error| matches!(
            error,
            CatalogError::DuplicateEntry { name, group: "standalone" } if name == "dialog"
        )));
        assert!(errors.iter().any(|error| matches!(
            error,
            CatalogError::DuplicateEntry { name, group: "mobile" } if name == "toast"
        )));
    }

    #[test]
    fn clean_manifest_validates_without_errors() {
        let manifest = CatalogManifest {
            all: vec!["dialog".to_string()],
            standalone: vec!["console".to_string()],
            mobile: vec!["touch_hud".to_string()],
        };

        assert!(manifest.validate().is_empty());
    }

    #[test]
    fn load_from_dir_falls_back_to_the_default_manifest() {
        let dir = std::env::temp_dir().join("window_service_manifest_fallback");
        std::fs::create_dir_all(&dir).unwrap();
        let _ = std::fs::remove_file(dir.join(PRIMARY_MANIFEST));
        std::fs::write(dir.join(FALLBACK_MANIFEST), r#"(all: ["dialog"])"#).unwrap();

        let manifest = CatalogManifest::load_from_dir(&dir).unwrap();
        assert_eq!(manifest.all, vec!["dialog"]);

        std::fs::remove_file(dir.join(FALLBACK_MANIFEST)).unwrap();
        assert!(matches!(
            CatalogManifest::load_from_dir(&dir),
            Err(CatalogError::MissingManifest { .. })
        ));
    }
}
