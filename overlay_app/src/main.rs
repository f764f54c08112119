//! Overlay demo application
//!
//! A composition root for the window service: registers window prototypes,
//! loads the catalog manifest from `assets/`, installs a container root and
//! drives a small show/hide script so the stack behaviour is visible in
//! the log output.

use std::any::Any;
use std::path::PathBuf;

use window_service::prelude::*;

/// Score service handed to windows through `apply_resolving`.
struct ScoreFeed {
    points: u32,
}

/// Always-on HUD; exempt from bulk-hide and input blocking.
struct MainHud;

impl Connectable for MainHud {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Window for MainHud {}

/// Pause menu with a resolved score readout and an attached sub-component.
struct PauseMenu {
    points: u32,
}

impl Connectable for PauseMenu {
    fn capabilities(&self) -> Capabilities {
        Capabilities::RESOLVE | Capabilities::SHOW | Capabilities::HIDE
    }

    fn apply_resolving(&mut self, deps: &DependencySet) -> HookResult {
        let feed = deps
            .get::<ScoreFeed>()
            .ok_or_else(|| HookError::from("pause menu needs a ScoreFeed"))?;
        self.points = feed.points;
        Ok(())
    }

    fn on_show(&mut self) -> HookResult {
        log::info!("pause menu up, score readout: {}", self.points);
        Ok(())
    }

    fn on_hide(&mut self) -> HookResult {
        log::info!("pause menu down");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Window for PauseMenu {}

/// Sub-component of the pause menu; releases its sound handle on unload.
struct ClickSound;

impl Connectable for ClickSound {
    fn capabilities(&self) -> Capabilities {
        Capabilities::INIT | Capabilities::UNLOAD
    }

    fn init(&mut self) -> HookResult {
        log::debug!("click sound loaded");
        Ok(())
    }

    fn unload(&mut self) -> HookResult {
        log::debug!("click sound released");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Short-lived notification window.
struct Toast;

impl Connectable for Toast {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Window for Toast {}

/// Desktop-only developer console.
struct DebugConsole;

impl Connectable for DebugConsole {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Window for DebugConsole {}

/// Stand-in canvas: records adoption and stacking in the log.
struct LogCanvas;

impl ContainerRoot for LogCanvas {
    fn adopt(&mut self, window: WindowId) {
        log::debug!("canvas adopts {window:?}");
    }

    fn set_stack_index(&mut self, window: WindowId, index: usize) {
        log::debug!("canvas stacks {window:?} at {index}");
    }
}

fn register_prototypes() -> Result<Prototypes, CatalogError> {
    let mut prototypes = Prototypes::new();
    prototypes.register::<MainHud, _>(
        "main_hud",
        WindowSpec::with_priority(-10)
            .exempt_from_auto_hide()
            .exempt_from_input(),
        || MainHud,
    )?;
    prototypes.register::<PauseMenu, _>("pause_menu", WindowSpec::with_priority(50), || {
        PauseMenu { points: 0 }
    })?;
    prototypes.register::<Toast, _>("toast", WindowSpec::with_priority(100), || Toast)?;
    prototypes.register::<DebugConsole, _>(
        "debug_console",
        WindowSpec::with_priority(200),
        || DebugConsole,
    )?;
    Ok(prototypes)
}

/// Locate the asset directory whether the binary runs from the workspace
/// root or from the crate directory.
fn asset_dir() -> PathBuf {
    let local = PathBuf::from("assets");
    if local.is_dir() {
        local
    } else {
        PathBuf::from("overlay_app/assets")
    }
}

fn main() -> Result<(), CatalogError> {
    env_logger::init();

    log::info!("loading catalog manifest...");
    let manifest = CatalogManifest::load_from_dir(&asset_dir())?;
    for error in manifest.validate() {
        log::error!("manifest validation: {error}");
    }

    let platform = PlatformGroup::current();
    log::info!("assembling catalog for {platform:?}");
    let catalog = Catalog::assemble(&manifest, register_prototypes()?, platform);
    log::info!("catalog ready with {} window types", catalog.len());

    let mut registry = WindowRegistry::new(catalog);
    registry.change_root(Box::new(LogCanvas));

    registry
        .on_show()
        .subscribe(|id| log::info!("shown: {id:?}"));
    registry
        .on_hide()
        .subscribe(|id| log::info!("hidden: {id:?}"));

    // The HUD comes up first and stays up for the whole session.
    let hud = registry
        .show::<MainHud>()
        .expect("main_hud is in the catalog");

    // Pausing stacks the menu above the HUD and wires its dependencies.
    let deps = DependencySet::new().with(ScoreFeed { points: 1280 });
    let menu = registry
        .show_with::<PauseMenu>(&deps)
        .expect("pause_menu is in the catalog");
    let click = registry.graph_mut().insert(ClickSound);
    registry.graph_mut().connect(menu, click, &deps);

    // A toast outranks everything currently visible.
    registry.show::<Toast>().expect("toast is in the catalog");
    log::info!(
        "visible stack (bottom to top): {:?}",
        registry.visible_windows().collect::<Vec<_>>()
    );
    assert_eq!(registry.top(), registry.visible_windows().last());

    // The hide button pops the toast, then the menu; the HUD survives the
    // bulk hide because it is exempt.
    registry.hide();
    registry.hide_all();
    assert_eq!(registry.visible_count(), 1);
    assert!(registry.is_visible(hud));
    assert!(!registry.blocks_input());

    // Scene teardown destroys the menu and its click sound with it.
    registry.destroy_window(menu);
    log::info!(
        "session over, {} protocol violations",
        registry.graph().violations()
    );

    Ok(())
}
