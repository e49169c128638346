use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::runtime::Handle;

use ring_light::OverlayError;
use ring_light::bridge::{BridgeRequest, CommandBridge};
use ring_light::control::{
    ControlKind, ControlSink, ControllerOptions, PowerState, RenderMode, RingController, SliderId,
};
use ring_light::monitor::{Display, DisplayBounds, MonitorSelection};
use ring_light::overlay::{HeadlessBackend, ManagerOptions, OverlayManager, RingPatch};

#[derive(Default)]
struct CountingSink {
    calls: Mutex<Vec<(ControlKind, u8)>>,
}

impl ControlSink for CountingSink {
    fn apply(&self, kind: ControlKind, value: u8) -> Result<(), OverlayError> {
        self.calls.lock().expect("sink lock").push((kind, value));
        Ok(())
    }
}

fn displays() -> Vec<Display> {
    vec![
        Display {
            id: 0,
            name: "DISPLAY1".into(),
            bounds: DisplayBounds {
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
            },
            is_primary: true,
        },
        Display {
            id: 1,
            name: "DISPLAY2".into(),
            bounds: DisplayBounds {
                x: -1280,
                y: 0,
                width: 1280,
                height: 1024,
            },
            is_primary: false,
        },
    ]
}

fn headless_bridge(
    backend: &HeadlessBackend,
    sink: Arc<CountingSink>,
) -> CommandBridge<HeadlessBackend> {
    CommandBridge::new(
        OverlayManager::start(backend.clone(), ManagerOptions::default()),
        sink,
    )
}

async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn all_displays_power_cycle_over_the_bridge() {
    let backend = HeadlessBackend::new(displays());
    let bridge = headless_bridge(&backend, Arc::default());

    let request = |value: serde_json::Value| -> BridgeRequest {
        serde_json::from_value(value).expect("request")
    };

    let created = bridge
        .dispatch(request(json!({ "op": "createOverlays", "monitor": "all" })))
        .await;
    assert_eq!(created, json!({ "success": true, "count": 2 }));

    let updated = bridge
        .dispatch(request(json!({
            "op": "broadcastParameters",
            "params": { "thickness": 75 }
        })))
        .await;
    assert_eq!(updated, json!({ "success": true, "updated": 2 }));

    let destroyed = bridge
        .dispatch(request(json!({ "op": "destroyOverlays" })))
        .await;
    assert_eq!(destroyed, json!({ "success": true }));
    assert!(backend.live_surfaces().is_empty());

    let listed = bridge
        .dispatch(request(json!({ "op": "listDisplays" })))
        .await;
    assert_eq!(listed["displays"].as_array().map(Vec::len), Some(2));

    let recreated = bridge
        .dispatch(request(json!({ "op": "createOverlays", "monitor": "all" })))
        .await;
    assert_eq!(recreated, json!({ "success": true, "count": 2 }));
    assert_eq!(backend.live_surfaces().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn controller_drives_both_displays() {
    let backend = HeadlessBackend::new(displays());
    let sink = Arc::new(CountingSink::default());
    let controller = RingController::new(
        Some(headless_bridge(&backend, sink.clone())),
        ControllerOptions {
            selection: MonitorSelection::All,
            ..ControllerOptions::default()
        },
        Handle::current(),
    );

    assert!(controller.toggle_power());
    wait(1100).await;
    assert_eq!(controller.snapshot().render, RenderMode::Overlay { surfaces: 2 });

    controller.update_slider(SliderId::Thickness, 75.0);
    controller.update_slider(SliderId::Brightness, 35.0);
    wait(600).await;

    let surfaces = backend.live_surfaces();
    assert_eq!(surfaces.len(), 2);
    let left = surfaces
        .iter()
        .find(|s| s.config.bounds.x < 0)
        .expect("surface on the left display");
    assert_eq!(left.config.bounds.width, 1280);
    let last = left.delivered.last().expect("delivered parameters");
    assert_eq!(last.thickness, 75.0);
    assert_eq!(last.brightness, 35.0);
    assert_eq!(
        *sink.calls.lock().expect("sink lock"),
        vec![(ControlKind::Brightness, 35)]
    );

    assert!(controller.toggle_power());
    wait(1100).await;
    assert_eq!(controller.snapshot().power, PowerState::Off);
    assert!(backend.live_surfaces().is_empty());

    assert!(controller.toggle_power());
    wait(1100).await;
    assert_eq!(backend.live_surfaces().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn teardown_during_slow_creation_leaves_nothing_behind() {
    let backend = HeadlessBackend::new(displays()).with_creation_delay(Duration::from_millis(200));
    let bridge = headless_bridge(&backend, Arc::default());

    let creating = {
        let bridge = bridge.clone();
        tokio::spawn(async move {
            bridge
                .create_overlays(MonitorSelection::All, Default::default())
                .await
        })
    };
    wait(250).await;
    assert!(bridge.destroy_overlays().await.is_success());

    let result = creating.await.expect("join");
    assert!(!result.is_success());
    wait(2000).await;

    assert!(backend.live_surfaces().is_empty());
    assert_eq!(bridge.overlays().live_count(), 0);
    let reached = bridge.broadcast_parameters(RingPatch::size(10.0)).await;
    assert_eq!(reached.ok().map(|u| u.updated), Some(0));
}
