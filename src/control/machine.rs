use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::bridge::{BridgeResult, CommandBridge, Created};
use crate::error::OverlayError;
use crate::monitor::MonitorSelection;
use crate::overlay::{RingParameters, RingPatch, SurfaceBackend};
use crate::settings::PanelSettings;

use super::debounce::DebounceTable;
use super::sink::ControlKind;
use super::state::{ControlState, ControlTiming, PowerState, RenderMode, SliderId};

/// Startup configuration for a [`RingController`].
#[derive(Clone, Debug, Default)]
pub struct ControllerOptions {
    pub timing: ControlTiming,
    /// Selection restored from the previous session.
    pub selection: MonitorSelection,
    /// Where selection changes are persisted. `None` keeps them in memory.
    pub settings_path: Option<PathBuf>,
}

/// Work that touches the overlay surfaces, executed one at a time in
/// submission order.
enum Lifecycle {
    Show,
    Hide,
    Broadcast(RingPatch),
    MouseTransparent(bool),
    External(ControlKind, f32),
    Shutdown(oneshot::Sender<()>),
}

struct Inner {
    state: ControlState,
    timers: DebounceTable,
}

struct Shared<B: SurfaceBackend> {
    inner: Mutex<Inner>,
    bridge: Option<CommandBridge<B>>,
    timing: ControlTiming,
    settings_path: Option<PathBuf>,
    runtime: Handle,
    lifecycle: mpsc::UnboundedSender<Lifecycle>,
    updates: watch::Sender<ControlState>,
}

/// The control state machine: sole owner of power state, slider values and
/// debounce timers.
///
/// Input methods are synchronous and never wait on overlay work, so they can
/// be called straight from the UI thread. Overlay requests are queued to a
/// single lifecycle worker; timers run on the runtime captured at
/// construction. Without a bridge the ring is drawn in the panel.
pub struct RingController<B: SurfaceBackend> {
    shared: Arc<Shared<B>>,
}

impl<B: SurfaceBackend> Clone for RingController<B> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<B: SurfaceBackend> RingController<B> {
    pub fn new(
        bridge: Option<CommandBridge<B>>,
        options: ControllerOptions,
        runtime: Handle,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = ControlState::new(options.selection);
        let (updates, _) = watch::channel(state.clone());

        if bridge.is_none() {
            info!("{}, the ring will be drawn in the panel", OverlayError::BridgeUnavailable);
        }

        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                state,
                timers: DebounceTable::new(),
            }),
            bridge,
            timing: options.timing,
            settings_path: options.settings_path,
            runtime: runtime.clone(),
            lifecycle: tx,
            updates,
        });
        runtime.spawn(run_lifecycle(Arc::downgrade(&shared), rx));

        Self { shared }
    }

    pub fn snapshot(&self) -> ControlState {
        self.shared.lock().state.clone()
    }

    pub fn parameters(&self) -> RingParameters {
        self.shared.lock().state.parameters()
    }

    /// Receives a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ControlState> {
        self.shared.updates.subscribe()
    }

    /// The overlay bridge, or [`OverlayError::BridgeUnavailable`] when the
    /// ring is drawn in the panel.
    pub fn bridge(&self) -> Result<&CommandBridge<B>, OverlayError> {
        self.shared.bridge()
    }

    /// Flip the power. Returns `false` if the request was dropped because a
    /// previous toggle is still cooling down.
    pub fn toggle_power(&self) -> bool {
        let shared = &self.shared;
        {
            let mut inner = shared.lock();
            let next = match inner.state.power {
                power if power.is_toggling() => {
                    debug!("Power toggle in progress, ignoring request");
                    return false;
                }
                PowerState::Off => PowerState::TogglingOn,
                _ => PowerState::TogglingOff,
            };
            inner.state.power = next;

            if next.is_on() {
                info!("Power toggled to ON");
                inner.state.render = if shared.bridge.is_some() {
                    RenderMode::Pending
                } else {
                    RenderMode::InPanel
                };
                shared.submit(Lifecycle::Show);
            } else {
                info!("Power toggled to OFF");
                let cancelled = inner.timers.cancel_all();
                if cancelled > 0 {
                    debug!("Cancelled {} pending control timer(s)", cancelled);
                }
                inner.state.clear_drags();
                inner.state.render = RenderMode::Hidden;
                shared.submit(Lifecycle::Hide);
            }
            shared.publish(&inner.state);
        }

        shared.schedule_settle();
        true
    }

    /// Set a slider value. While the ring is on the change is broadcast at
    /// once and the external control is applied after input settles.
    pub fn update_slider(&self, id: SliderId, value: f32) {
        let shared = &self.shared;
        let mut inner = shared.lock();
        let value = inner.state.set_value(id, value);

        if inner.state.power.is_on() {
            shared.submit(Lifecycle::Broadcast(id.patch(value)));
            if !inner.state.initializing {
                shared.arm_debounce(&mut inner, id);
            }
        }
        shared.publish(&inner.state);
    }

    pub fn start_drag(&self, id: SliderId) {
        let mut inner = self.shared.lock();
        if !inner.state.power.is_on() {
            return;
        }
        inner.state.slider_mut(id).is_dragging = true;
        self.shared.publish(&inner.state);
    }

    /// End a drag: the final value is applied now instead of after the
    /// debounce window.
    pub fn stop_drag(&self, id: SliderId) {
        let mut inner = self.shared.lock();
        if !inner.state.power.is_on() {
            return;
        }
        inner.state.slider_mut(id).is_dragging = false;
        inner.timers.cancel(id);
        self.shared.apply_control(&mut inner, id);
        self.shared.publish(&inner.state);
    }

    /// Apply restored slider values without triggering external controls.
    pub fn restore(&self, values: impl IntoIterator<Item = (SliderId, f32)>) {
        self.shared.lock().state.initializing = true;
        for (id, value) in values {
            self.update_slider(id, value);
        }
        let mut inner = self.shared.lock();
        inner.state.initializing = false;
        self.shared.publish(&inner.state);
    }

    /// Change the target display(s). While on, this is a full teardown
    /// followed by a recreate against the new targets.
    pub fn select_monitor(&self, selection: MonitorSelection) {
        let shared = &self.shared;
        {
            let mut inner = shared.lock();
            if inner.state.selection == selection {
                return;
            }
            inner.state.selection = selection;
            info!("Monitor selection changed to {}", selection);

            if inner.state.power.is_on() && shared.bridge.is_some() {
                inner.state.render = RenderMode::Pending;
                shared.submit(Lifecycle::Hide);
                shared.submit(Lifecycle::Show);
            }
            shared.publish(&inner.state);
        }

        if let Some(path) = &shared.settings_path {
            if let Err(e) = PanelSettings::store_preferred_monitor(path, selection) {
                warn!("Failed to save monitor preference: {e:#}");
            }
        }
    }

    /// Let the overlay capture the pointer (`true`) or pass it through.
    ///
    /// The mode outlives the current surfaces: overlays recreated later pick
    /// it up again.
    pub fn set_overlay_interactive(&self, interactive: bool) {
        let mut inner = self.shared.lock();
        if inner.state.overlay_interactive == interactive {
            return;
        }
        inner.state.overlay_interactive = interactive;
        self.shared.submit(Lifecycle::MouseTransparent(!interactive));
        self.shared.publish(&inner.state);
    }

    /// Cancel all timers, switch off and wait until the overlays are gone.
    pub async fn shutdown(&self) {
        {
            let mut inner = self.shared.lock();
            inner.timers.cancel_all();
            inner.state.clear_drags();
            inner.state.power = PowerState::Off;
            inner.state.render = RenderMode::Hidden;
            self.shared.publish(&inner.state);
        }

        let (done_tx, done_rx) = oneshot::channel();
        if self.shared.lifecycle.send(Lifecycle::Shutdown(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
        info!("Ring controller shut down");
    }
}

impl<B: SurfaceBackend> Shared<B> {
    fn bridge(&self) -> Result<&CommandBridge<B>, OverlayError> {
        self.bridge.as_ref().ok_or(OverlayError::BridgeUnavailable)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &ControlState) {
        self.updates.send_replace(state.clone());
    }

    fn submit(&self, command: Lifecycle) {
        if self.lifecycle.send(command).is_err() {
            debug!("Lifecycle worker stopped, dropping overlay command");
        }
    }

    fn schedule_settle(self: &Arc<Self>) {
        let shared = Arc::downgrade(self);
        let cooldown = self.timing.toggle_cooldown;
        self.runtime.spawn(async move {
            tokio::time::sleep(cooldown).await;
            if let Some(shared) = shared.upgrade() {
                let mut inner = shared.lock();
                inner.state.power = inner.state.power.settle();
                shared.publish(&inner.state);
            }
        });
    }

    fn arm_debounce(self: &Arc<Self>, inner: &mut Inner, id: SliderId) {
        let ticket = inner.timers.next_ticket();
        let shared = Arc::downgrade(self);
        let delay = self.timing.debounce;
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = shared.upgrade() {
                shared.debounce_fired(id, ticket);
            }
        });
        inner.timers.arm(id, ticket, task.abort_handle());
    }

    fn debounce_fired(&self, id: SliderId, ticket: u64) {
        let mut inner = self.lock();
        if !inner.timers.complete(id, ticket) {
            return;
        }
        if !inner.state.power.is_on() || inner.state.initializing {
            return;
        }
        self.apply_control(&mut inner, id);
    }

    /// Issue the external control for a slider's current value, unless the
    /// same whole percent was the last one issued.
    fn apply_control(&self, inner: &mut Inner, id: SliderId) {
        if self.bridge.is_none() {
            return;
        }
        let slider = inner.state.slider_mut(id);
        let value = slider.current_value;
        // The sink only sees whole percents.
        let percent = value.round();
        if slider.last_applied == Some(percent) {
            debug!("{} already applied at {}%", id.label(), percent);
            return;
        }
        slider.last_applied = Some(percent);

        match id.control_kind() {
            Some(kind) => self.submit(Lifecycle::External(kind, percent)),
            None => self.submit(Lifecycle::Broadcast(RingPatch::thickness(value))),
        }
    }

    fn set_render_if_on(&self, render: RenderMode) {
        let mut inner = self.lock();
        if inner.state.power.is_on() {
            inner.state.render = render;
            self.publish(&inner.state);
        }
    }

    async fn show(&self) {
        let (selection, params) = {
            let inner = self.lock();
            if !inner.state.power.is_on() {
                return;
            }
            (inner.state.selection, inner.state.parameters())
        };
        let bridge = match self.bridge() {
            Ok(bridge) => bridge,
            Err(e) => {
                debug!("Drawing the ring in the panel: {}", e);
                self.set_render_if_on(RenderMode::InPanel);
                return;
            }
        };

        let render = match bridge.create_overlays(selection, params).await {
            BridgeResult::Success(Created { count }) if count > 0 => {
                info!("Ring overlay window(s) created for {} display(s)", count);
                // Picks up changes made while creation was in flight.
                let (latest, interactive) = {
                    let inner = self.lock();
                    (inner.state.parameters(), inner.state.overlay_interactive)
                };
                if let BridgeResult::Failure { error } =
                    bridge.broadcast_parameters(latest.into()).await
                {
                    warn!("Initial ring broadcast failed: {}", error);
                }
                // New surfaces start click-through.
                if interactive {
                    if let BridgeResult::Failure { error } =
                        bridge.set_mouse_transparent(false).await
                    {
                        warn!("Failed to restore overlay mouse mode: {}", error);
                    }
                }
                RenderMode::Overlay { surfaces: count }
            }
            BridgeResult::Success(_) => {
                warn!("No overlay surfaces were created, drawing the ring in the panel");
                RenderMode::InPanel
            }
            BridgeResult::Failure { error } => {
                warn!("Falling back to the in-panel ring: {}", error);
                RenderMode::InPanel
            }
        };
        self.set_render_if_on(render);
    }

    async fn hide(&self) {
        let Some(bridge) = &self.bridge else {
            return;
        };
        if let BridgeResult::Failure { error } = bridge.destroy_overlays().await {
            warn!("Failed to destroy ring overlay: {}", error);
        }
    }

    async fn run(&self, command: Lifecycle) {
        let Some(bridge) = &self.bridge else {
            return;
        };
        match command {
            Lifecycle::Broadcast(patch) => {
                if let BridgeResult::Failure { error } = bridge.broadcast_parameters(patch).await {
                    warn!("Ring broadcast failed: {}", error);
                }
            }
            Lifecycle::MouseTransparent(transparent) => {
                if let BridgeResult::Failure { error } =
                    bridge.set_mouse_transparent(transparent).await
                {
                    warn!("Failed to change overlay mouse mode: {}", error);
                }
            }
            Lifecycle::External(kind, value) => {
                if let BridgeResult::Failure { error } =
                    bridge.apply_external_control(kind, value).await
                {
                    warn!("{}", error);
                }
            }
            Lifecycle::Show | Lifecycle::Hide | Lifecycle::Shutdown(_) => {}
        }
    }
}

async fn run_lifecycle<B: SurfaceBackend>(
    shared: Weak<Shared<B>>,
    mut commands: mpsc::UnboundedReceiver<Lifecycle>,
) {
    while let Some(command) = commands.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        match command {
            Lifecycle::Show => shared.show().await,
            Lifecycle::Hide => shared.hide().await,
            Lifecycle::Shutdown(done) => {
                shared.hide().await;
                let _ = done.send(());
                break;
            }
            other => shared.run(other).await,
        }
    }
    debug!("Lifecycle worker stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::runtime::Handle;

    use super::{ControllerOptions, RingController};
    use crate::bridge::CommandBridge;
    use crate::control::{ControlKind, PowerState, RenderMode, SliderId};
    use crate::error::OverlayError;
    use crate::monitor::MonitorSelection;
    use crate::overlay::{HeadlessBackend, ManagerOptions, OverlayManager};
    use crate::settings::PanelSettings;
    use crate::testing::{RecordingSink, side_by_side};

    struct Rig {
        controller: RingController<HeadlessBackend>,
        backend: HeadlessBackend,
        sink: Arc<RecordingSink>,
    }

    fn rig_with(displays: usize, options: ControllerOptions) -> Rig {
        let backend = HeadlessBackend::new(side_by_side(displays));
        let sink = Arc::new(RecordingSink::default());
        let bridge = CommandBridge::new(
            OverlayManager::start(backend.clone(), ManagerOptions::default()),
            sink.clone(),
        );
        Rig {
            controller: RingController::new(Some(bridge), options, Handle::current()),
            backend,
            sink,
        }
    }

    fn rig(displays: usize) -> Rig {
        rig_with(displays, ControllerOptions::default())
    }

    async fn wait(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Toggle and wait out the cool-down.
    async fn toggle(controller: &RingController<HeadlessBackend>) {
        assert!(controller.toggle_power());
        wait(1100).await;
    }

    #[tokio::test(start_paused = true)]
    async fn power_on_creates_overlays_and_settles() {
        let rig = rig(1);
        assert!(rig.controller.toggle_power());
        assert_eq!(rig.controller.snapshot().power, PowerState::TogglingOn);
        assert!(rig.controller.snapshot().sliders_enabled());

        wait(1100).await;
        let state = rig.controller.snapshot();
        assert_eq!(state.power, PowerState::On);
        assert_eq!(state.render, RenderMode::Overlay { surfaces: 1 });
        assert_eq!(rig.backend.live_surfaces().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_issues_one_call_with_the_last_value() {
        let rig = rig(1);
        toggle(&rig.controller).await;

        rig.controller.update_slider(SliderId::Brightness, 10.0);
        wait(100).await;
        rig.controller.update_slider(SliderId::Brightness, 20.0);
        wait(100).await;
        rig.controller.update_slider(SliderId::Brightness, 30.0);
        wait(600).await;

        assert_eq!(rig.sink.calls(), vec![(ControlKind::Brightness, 30)]);
        assert_eq!(
            rig.controller.snapshot().slider(SliderId::Brightness).last_applied,
            Some(30.0)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slider_updates_reach_surfaces_immediately() {
        let rig = rig(2);
        toggle(&rig.controller).await;

        rig.controller.update_slider(SliderId::Size, 60.0);
        wait(5).await;
        for surface in rig.backend.live_surfaces() {
            let last = surface.delivered.last().expect("delivered");
            assert_eq!(last.size, 60.0);
        }
        assert!(rig.sink.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timers_are_independent_per_slider() {
        let rig = rig(1);
        toggle(&rig.controller).await;

        rig.controller.update_slider(SliderId::Brightness, 70.0);
        wait(300).await;
        rig.controller.update_slider(SliderId::Warmth, 80.0);
        wait(600).await;

        assert_eq!(
            rig.sink.calls(),
            vec![(ControlKind::Brightness, 70), (ControlKind::ColorTemp, 80)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_drag_applies_now_and_cancels_the_timer() {
        let rig = rig(1);
        toggle(&rig.controller).await;

        rig.controller.start_drag(SliderId::Size);
        assert!(rig.controller.snapshot().slider(SliderId::Size).is_dragging);
        rig.controller.update_slider(SliderId::Size, 40.0);
        rig.controller.stop_drag(SliderId::Size);
        wait(5).await;
        assert_eq!(rig.sink.calls(), vec![(ControlKind::RingSize, 40)]);
        assert!(!rig.controller.snapshot().slider(SliderId::Size).is_dragging);

        wait(600).await;
        assert_eq!(rig.sink.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drag_is_ignored_while_off() {
        let rig = rig(1);
        rig.controller.start_drag(SliderId::Brightness);
        rig.controller.update_slider(SliderId::Brightness, 55.0);
        rig.controller.stop_drag(SliderId::Brightness);
        wait(600).await;

        let state = rig.controller.snapshot();
        assert!(!state.slider(SliderId::Brightness).is_dragging);
        assert_eq!(state.value(SliderId::Brightness), 55.0);
        assert!(rig.sink.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn same_value_is_not_applied_twice() {
        let rig = rig(1);
        toggle(&rig.controller).await;

        rig.controller.update_slider(SliderId::Warmth, 30.0);
        wait(600).await;
        rig.controller.update_slider(SliderId::Warmth, 30.0);
        wait(600).await;

        assert_eq!(rig.sink.calls(), vec![(ControlKind::ColorTemp, 30)]);
    }

    #[tokio::test(start_paused = true)]
    async fn thickness_settles_into_a_rebroadcast() {
        let rig = rig(1);
        toggle(&rig.controller).await;

        rig.controller.update_slider(SliderId::Thickness, 75.0);
        wait(600).await;

        assert!(rig.sink.calls().is_empty());
        let surface = &rig.backend.live_surfaces()[0];
        let thickness: Vec<f32> = surface.delivered.iter().map(|p| p.thickness).collect();
        assert_eq!(thickness[thickness.len() - 2..], [75.0, 75.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn toggles_during_cooldown_are_dropped() {
        let rig = rig(1);
        assert!(rig.controller.toggle_power());
        wait(300).await;
        assert!(!rig.controller.toggle_power());
        assert_eq!(rig.controller.snapshot().power, PowerState::TogglingOn);

        wait(800).await;
        assert_eq!(rig.controller.snapshot().power, PowerState::On);
        assert!(rig.controller.toggle_power());
        assert_eq!(rig.controller.snapshot().power, PowerState::TogglingOff);
    }

    #[tokio::test(start_paused = true)]
    async fn power_off_cancels_pending_controls() {
        let rig = rig(1);
        toggle(&rig.controller).await;

        rig.controller.start_drag(SliderId::Brightness);
        rig.controller.update_slider(SliderId::Brightness, 42.0);
        assert!(rig.controller.toggle_power());
        wait(1100).await;

        let state = rig.controller.snapshot();
        assert_eq!(state.power, PowerState::Off);
        assert_eq!(state.render, RenderMode::Hidden);
        assert!(!state.slider(SliderId::Brightness).is_dragging);
        assert!(rig.sink.calls().is_empty());
        assert!(rig.backend.live_surfaces().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_toggle_pairs_never_leak_surfaces() {
        let rig = rig_with(
            2,
            ControllerOptions {
                selection: MonitorSelection::All,
                ..ControllerOptions::default()
            },
        );

        for _ in 0..4 {
            toggle(&rig.controller).await;
            assert_eq!(rig.backend.live_surfaces().len(), 2);
            toggle(&rig.controller).await;
            assert!(rig.backend.live_surfaces().is_empty());
        }
        toggle(&rig.controller).await;
        assert_eq!(rig.backend.live_surfaces().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn creation_failure_keeps_power_on_with_in_panel_ring() {
        let rig = rig(1);
        rig.backend.fail_creation_at(0);
        toggle(&rig.controller).await;

        let state = rig.controller.snapshot();
        assert_eq!(state.power, PowerState::On);
        assert_eq!(state.render, RenderMode::InPanel);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_bridge_renders_in_panel() {
        let controller: RingController<HeadlessBackend> =
            RingController::new(None, ControllerOptions::default(), Handle::current());
        assert_eq!(controller.bridge().err(), Some(OverlayError::BridgeUnavailable));

        assert!(controller.toggle_power());
        assert_eq!(controller.snapshot().render, RenderMode::InPanel);
        controller.update_slider(SliderId::Warmth, 90.0);
        wait(1100).await;

        let state = controller.snapshot();
        assert_eq!(state.power, PowerState::On);
        assert_eq!(state.value(SliderId::Warmth), 90.0);
        assert_eq!(state.slider(SliderId::Warmth).last_applied, None);
    }

    #[tokio::test(start_paused = true)]
    async fn selection_change_recreates_and_persists() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("settings.json");
        let rig = rig_with(
            3,
            ControllerOptions {
                settings_path: Some(path.clone()),
                ..ControllerOptions::default()
            },
        );
        toggle(&rig.controller).await;
        assert_eq!(rig.backend.live_surfaces().len(), 1);

        rig.controller.select_monitor(MonitorSelection::All);
        wait(50).await;
        assert_eq!(rig.backend.live_surfaces().len(), 3);
        assert_eq!(
            rig.controller.snapshot().render,
            RenderMode::Overlay { surfaces: 3 }
        );

        rig.controller.select_monitor(MonitorSelection::Specific(2));
        wait(50).await;
        let live = rig.backend.live_surfaces();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].config.bounds.x, 3840);

        let saved = PanelSettings::load_from_path(&path).expect("load");
        assert_eq!(saved.preferred_monitor, MonitorSelection::Specific(2));
    }

    #[tokio::test(start_paused = true)]
    async fn restored_values_skip_external_controls() {
        let rig = rig(1);
        toggle(&rig.controller).await;

        rig.controller.restore([(SliderId::Brightness, 20.0), (SliderId::Size, 70.0)]);
        wait(600).await;

        let state = rig.controller.snapshot();
        assert!(!state.initializing);
        assert_eq!(state.value(SliderId::Size), 70.0);
        assert!(rig.sink.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn interactive_overlay_captures_the_pointer() {
        let rig = rig(1);
        toggle(&rig.controller).await;

        rig.controller.set_overlay_interactive(true);
        wait(5).await;
        assert!(!rig.backend.live_surfaces()[0].mouse_transparent);
        rig.controller.set_overlay_interactive(false);
        wait(5).await;
        assert!(rig.backend.live_surfaces()[0].mouse_transparent);
    }

    #[tokio::test(start_paused = true)]
    async fn pointer_capture_survives_recreation() {
        let rig = rig(2);
        toggle(&rig.controller).await;
        rig.controller.set_overlay_interactive(true);
        assert!(rig.controller.snapshot().overlay_interactive);

        rig.controller.select_monitor(MonitorSelection::All);
        wait(50).await;
        let live = rig.backend.live_surfaces();
        assert_eq!(live.len(), 2);
        assert!(live.iter().all(|s| !s.mouse_transparent));

        toggle(&rig.controller).await;
        toggle(&rig.controller).await;
        let live = rig.backend.live_surfaces();
        assert_eq!(live.len(), 2);
        assert!(live.iter().all(|s| !s.mouse_transparent));
        assert!(rig.controller.snapshot().overlay_interactive);
    }

    #[tokio::test(start_paused = true)]
    async fn values_rounding_to_the_same_percent_apply_once() {
        let rig = rig(1);
        toggle(&rig.controller).await;

        rig.controller.update_slider(SliderId::Brightness, 30.4);
        wait(600).await;
        rig.controller.update_slider(SliderId::Brightness, 30.2);
        wait(600).await;

        assert_eq!(rig.sink.calls(), vec![(ControlKind::Brightness, 30)]);
        assert_eq!(
            rig.controller.snapshot().slider(SliderId::Brightness).last_applied,
            Some(30.0)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_tears_everything_down() {
        let rig = rig(2);
        toggle(&rig.controller).await;
        rig.controller.update_slider(SliderId::Brightness, 10.0);

        rig.controller.shutdown().await;
        wait(600).await;

        assert!(rig.backend.live_surfaces().is_empty());
        assert!(rig.sink.calls().is_empty());
        assert_eq!(rig.controller.snapshot().power, PowerState::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_state_changes() {
        let rig = rig(1);
        let mut updates = rig.controller.subscribe();

        rig.controller.update_slider(SliderId::Thickness, 12.0);
        updates.changed().await.expect("update");
        assert_eq!(updates.borrow_and_update().value(SliderId::Thickness), 12.0);
    }
}
