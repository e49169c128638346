mod ui;

use anyhow::Context as _;
use gpui::{AppContext, Application, WindowOptions};
use tracing::{error, info};

use ring_light::bridge::CommandBridge;
use ring_light::control::{ControllerOptions, RingController};
use ring_light::logging;
use ring_light::monitor::{enumerate_displays, snapshot_or_synthetic};
use ring_light::settings::{self, PanelSettings};

use crate::ui::Controller;

#[cfg(windows)]
pub type Backend = ring_light::overlay::Win32Backend;
/// Placeholder backend type; no bridge is built on this platform.
#[cfg(not(windows))]
pub type Backend = ring_light::overlay::HeadlessBackend;

/// The overlay bridge, where the platform can draw overlays at all.
#[cfg(windows)]
fn platform_bridge() -> Option<CommandBridge<Backend>> {
    use std::sync::Arc;

    use ring_light::control::LoggingSink;
    use ring_light::overlay::{ManagerOptions, OverlayManager, Win32Backend};

    let manager = OverlayManager::start(Win32Backend::new(), ManagerOptions::default());
    Some(CommandBridge::new(manager, Arc::new(LoggingSink)))
}

#[cfg(not(windows))]
fn platform_bridge() -> Option<CommandBridge<Backend>> {
    None
}

fn main() -> anyhow::Result<()> {
    let settings_path = settings::resolve_settings_path().ok();
    let panel_settings = settings_path
        .as_deref()
        .map(PanelSettings::load_or_default)
        .unwrap_or_default();
    logging::init(panel_settings.debug_logging);
    info!("=== Ring Light ===");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("ring-light-worker")
        .build()
        .context("start async runtime")?;
    // Overlay manager and controller spawn their tasks on this runtime.
    let _guard = runtime.enter();

    let displays = snapshot_or_synthetic(enumerate_displays());
    info!("Found {} display(s):", displays.len());
    for target in &displays {
        info!(
            "  {} at ({}, {}){}",
            target.label(),
            target.bounds.x,
            target.bounds.y,
            if target.is_primary { " [primary]" } else { "" }
        );
    }

    let controller = RingController::new(
        platform_bridge(),
        ControllerOptions {
            selection: panel_settings.preferred_monitor,
            settings_path,
            ..ControllerOptions::default()
        },
        runtime.handle().clone(),
    );

    let panel_controller = controller.clone();
    Application::new().run(move |app: &mut gpui::App| {
        let opened = app.open_window(
            WindowOptions {
                titlebar: Some(gpui::TitlebarOptions {
                    title: Some("Ring Light".into()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            |_, cx| cx.new(move |cx| Controller::new(panel_controller, displays, cx)),
        );
        if let Err(e) = opened {
            error!("Failed to open the control panel: {e:#}");
            app.quit();
        }
    });

    runtime.block_on(controller.shutdown());
    Ok(())
}
