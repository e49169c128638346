use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::error::OverlayError;
use crate::monitor::{Display, DisplayBounds};
use crate::overlay::backend::{SurfaceBackend, SurfaceEvent, SurfaceEvents, SurfaceHandle};
use crate::overlay::config::{OverlayConfig, RingParameters, RingPatch};

/// Tunables for the [`OverlayManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Longest a broadcast is held back waiting for a new surface's first render.
    pub ready_timeout: Duration,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            ready_timeout: Duration::from_secs(1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateOutcome {
    pub count: usize,
}

/// Read-only view of one live surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceStatus {
    pub index: usize,
    pub handle: SurfaceHandle,
    pub bounds: DisplayBounds,
    pub ready: bool,
}

struct SurfaceSlot {
    index: usize,
    handle: SurfaceHandle,
    bounds: DisplayBounds,
    /// Last-known parameters; partial broadcasts merge into these.
    params: RingParameters,
    ready: bool,
    /// Parameters changed while the surface was not ready yet.
    held: bool,
}

#[derive(Default)]
struct ManagerState {
    /// Live surfaces in creation order.
    surfaces: Vec<SurfaceSlot>,
    /// Bumped by every teardown; creations started under an older generation lose.
    generation: u64,
    creating: bool,
    /// `Ready` events that beat their `create_surface` call back.
    early_ready: HashSet<SurfaceHandle>,
}

/// Owns the lifecycle of the per-display overlay surfaces.
///
/// All surface handles live in here and every destroy is routed through it,
/// so a handle can never be torn down twice by two different owners.
/// Operations report failures through their `Result` and never panic into the
/// caller.
pub struct OverlayManager<B: SurfaceBackend> {
    backend: B,
    state: Mutex<ManagerState>,
    /// Serialises `create_all` calls; `destroy_all` never waits on it.
    creation: tokio::sync::Mutex<()>,
    events: SurfaceEvents,
    options: ManagerOptions,
    /// Dropped with the manager, which stops the event pump.
    _pump_guard: oneshot::Sender<()>,
}

impl<B: SurfaceBackend> OverlayManager<B> {
    /// Create a manager and spawn its event pump on the current tokio runtime.
    pub fn start(backend: B, options: ManagerOptions) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (guard, closed) = oneshot::channel();
        let manager = Arc::new(Self {
            backend,
            state: Mutex::new(ManagerState::default()),
            creation: tokio::sync::Mutex::new(()),
            events: tx,
            options,
            _pump_guard: guard,
        });
        tokio::spawn(pump_events(Arc::downgrade(&manager), rx, closed));
        manager
    }

    pub fn displays(&self) -> Result<Vec<Display>, OverlayError> {
        self.backend.displays()
    }

    /// Returns the number of surfaces that are currently alive.
    pub fn live_count(&self) -> usize {
        self.state().surfaces.len()
    }

    pub fn surfaces(&self) -> Vec<SurfaceStatus> {
        self.state()
            .surfaces
            .iter()
            .map(|slot| SurfaceStatus {
                index: slot.index,
                handle: slot.handle,
                bounds: slot.bounds,
                ready: slot.ready,
            })
            .collect()
    }

    /// Spawn one surface per target, in target order.
    ///
    /// Every target is attempted; if any fail, the ones that succeeded stay
    /// live and the error carries the success count. A `destroy_all` that
    /// lands while this is running wins: the surface that was mid-creation is
    /// destroyed as soon as it appears and `Superseded` is returned.
    pub async fn create_all(
        &self,
        targets: &[Display],
        initial: RingParameters,
    ) -> Result<CreateOutcome, OverlayError> {
        let _serial = self.creation.lock().await;

        let generation = {
            let mut state = self.state();
            if !state.surfaces.is_empty() {
                warn!(
                    "create_all called with {} live surface(s), tearing them down first",
                    state.surfaces.len()
                );
                self.teardown_locked(&mut state);
            }
            state.creating = true;
            state.generation
        };

        let result = self.create_targets(targets, initial, generation).await;

        let mut state = self.state();
        state.creating = false;
        state.early_ready.clear();
        result
    }

    async fn create_targets(
        &self,
        targets: &[Display],
        initial: RingParameters,
        generation: u64,
    ) -> Result<CreateOutcome, OverlayError> {
        let requested = targets.len();
        let mut created = 0;
        let mut first_failure: Option<String> = None;

        for (index, target) in targets.iter().enumerate() {
            let bounds = target.bounds;
            let config = OverlayConfig {
                index,
                bounds,
                params: initial,
                mouse_transparent: true,
            };

            let handle = match self.backend.create_surface(config, self.events.clone()).await {
                Ok(handle) => handle,
                Err(e) => {
                    error!("Overlay window {} failed to create: {}", index + 1, e);
                    first_failure.get_or_insert_with(|| e.to_string());
                    continue;
                }
            };

            {
                let mut state = self.state();
                if state.generation != generation {
                    drop(state);
                    info!(
                        "Overlay window {} finished creating after a teardown, destroying it",
                        index + 1
                    );
                    self.destroy_handle(handle);
                    return Err(OverlayError::Superseded);
                }
                let ready = state.early_ready.remove(&handle);
                state.surfaces.push(SurfaceSlot {
                    index,
                    handle,
                    bounds,
                    params: initial,
                    ready,
                    held: false,
                });
            }
            created += 1;
            self.arm_ready_timeout(handle);
            debug!(
                "Overlay window {} created at ({}, {}) {}x{}",
                index + 1,
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height
            );
        }

        match first_failure {
            None => Ok(CreateOutcome { count: created }),
            Some(reason) => Err(OverlayError::SurfaceCreation {
                created,
                requested,
                reason,
            }),
        }
    }

    /// Close every live surface. Safe to call any number of times.
    pub fn destroy_all(&self) -> Result<(), OverlayError> {
        let destroyed = {
            let mut state = self.state();
            self.teardown_locked(&mut state)
        };
        if destroyed > 0 {
            info!("Destroyed {} overlay surface(s)", destroyed);
        }
        Ok(())
    }

    /// Merge `patch` into every live surface and push the result.
    ///
    /// Surfaces that have not rendered yet keep the merged parameters until
    /// they report ready. Surfaces that vanished are dropped silently.
    /// Returns how many surfaces the update reached.
    pub fn broadcast(&self, patch: &RingPatch) -> Result<usize, OverlayError> {
        let mut state = self.state();
        let mut updated = 0;
        let mut stale = Vec::new();

        for slot in state.surfaces.iter_mut() {
            slot.params.apply(patch);
            if !slot.ready {
                slot.held = true;
                updated += 1;
                continue;
            }
            match self.backend.push_params(slot.handle, &slot.params) {
                Ok(()) => updated += 1,
                Err(e) if e.is_stale() => stale.push(slot.handle),
                Err(e) => warn!("Failed to update overlay window {}: {}", slot.index + 1, e),
            }
        }

        Self::forget_locked(&mut state, &stale);
        Ok(updated)
    }

    /// Switch every live surface between click-through and pointer-capturing.
    pub fn set_mouse_transparent(&self, transparent: bool) -> Result<(), OverlayError> {
        let mut state = self.state();
        let mut stale = Vec::new();

        for slot in &state.surfaces {
            match self.backend.set_mouse_transparent(slot.handle, transparent) {
                Ok(()) => {}
                Err(e) if e.is_stale() => stale.push(slot.handle),
                Err(e) => warn!(
                    "Failed to change mouse mode of overlay window {}: {}",
                    slot.index + 1,
                    e
                ),
            }
        }

        Self::forget_locked(&mut state, &stale);
        debug!("Overlay mouse pass-through set to {}", transparent);
        Ok(())
    }

    fn handle_event(&self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Ready(handle) | SurfaceEvent::ReadyTimeout(handle) => {
                let timed_out = matches!(event, SurfaceEvent::ReadyTimeout(_));
                let mut state = self.state();

                let Some(slot) = state.surfaces.iter_mut().find(|s| s.handle == handle) else {
                    if timed_out {
                        return;
                    }
                    if state.creating {
                        state.early_ready.insert(handle);
                        return;
                    }
                    drop(state);
                    debug!("Overlay surface {} became ready after teardown", handle);
                    self.destroy_handle(handle);
                    return;
                };

                if slot.ready {
                    return;
                }
                if timed_out {
                    debug!(
                        "Overlay window {} did not report readiness in time, delivering anyway",
                        slot.index + 1
                    );
                }
                slot.ready = true;
                if !slot.held {
                    return;
                }
                slot.held = false;

                match self.backend.push_params(slot.handle, &slot.params) {
                    Ok(()) => {}
                    Err(e) if e.is_stale() => Self::forget_locked(&mut state, &[handle]),
                    Err(e) => warn!("Failed to deliver held parameters to {}: {}", handle, e),
                }
            }
            SurfaceEvent::Closed(handle) => {
                let mut state = self.state();
                if state.surfaces.iter().any(|s| s.handle == handle) {
                    info!("Overlay surface {} closed externally", handle);
                    Self::forget_locked(&mut state, &[handle]);
                }
            }
        }
    }

    fn arm_ready_timeout(&self, handle: SurfaceHandle) {
        let events = self.events.clone();
        let timeout = self.options.ready_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = events.send(SurfaceEvent::ReadyTimeout(handle));
        });
    }

    fn teardown_locked(&self, state: &mut ManagerState) -> usize {
        state.generation += 1;
        state.early_ready.clear();
        let slots = std::mem::take(&mut state.surfaces);
        for slot in &slots {
            self.destroy_handle(slot.handle);
        }
        slots.len()
    }

    fn destroy_handle(&self, handle: SurfaceHandle) {
        match self.backend.destroy_surface(handle) {
            Ok(()) => {}
            Err(e) if e.is_stale() => debug!("Overlay surface {} already gone", handle),
            Err(e) => warn!("Failed to destroy overlay surface {}: {}", handle, e),
        }
    }

    fn forget_locked(state: &mut ManagerState, handles: &[SurfaceHandle]) {
        if handles.is_empty() {
            return;
        }
        state.surfaces.retain(|slot| !handles.contains(&slot.handle));
        debug!("Dropped {} stale overlay surface(s)", handles.len());
    }

    fn state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn pump_events<B: SurfaceBackend>(
    manager: Weak<OverlayManager<B>>,
    mut rx: mpsc::UnboundedReceiver<SurfaceEvent>,
    mut closed: oneshot::Receiver<()>,
) {
    loop {
        let event = tokio::select! {
            _ = &mut closed => break,
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        let Some(manager) = manager.upgrade() else {
            break;
        };
        manager.handle_event(event);
    }
    debug!("Overlay event pump stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::{ManagerOptions, OverlayManager};
    use crate::error::OverlayError;
    use crate::monitor::{Display, DisplayBounds};
    use crate::overlay::headless::HeadlessBackend;
    use crate::overlay::{RingParameters, RingPatch};

    fn displays(n: usize) -> Vec<Display> {
        (0..n)
            .map(|id| Display {
                id,
                name: format!("DISPLAY{}", id + 1),
                bounds: DisplayBounds {
                    x: id as i32 * 1920,
                    y: 0,
                    width: 1920,
                    height: 1080,
                },
                is_primary: id == 0,
            })
            .collect()
    }

    fn manager(backend: &HeadlessBackend) -> Arc<OverlayManager<HeadlessBackend>> {
        OverlayManager::start(backend.clone(), ManagerOptions::default())
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn creates_one_surface_per_target_covering_its_bounds() {
        let backend = HeadlessBackend::new(displays(2));
        let manager = manager(&backend);

        let outcome = manager
            .create_all(&displays(2), RingParameters::default())
            .await
            .expect("create");
        assert_eq!(outcome.count, 2);
        assert_eq!(manager.live_count(), 2);

        let live = backend.live_surfaces();
        assert_eq!(live.len(), 2);
        assert_eq!(live[1].config.bounds.x, 1920);
        assert!(live.iter().all(|s| s.mouse_transparent));
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_all_is_idempotent() {
        let backend = HeadlessBackend::new(displays(2));
        let manager = manager(&backend);

        manager.destroy_all().expect("destroy with nothing live");
        manager
            .create_all(&displays(2), RingParameters::default())
            .await
            .expect("create");
        manager.destroy_all().expect("first destroy");
        manager.destroy_all().expect("second destroy");

        assert_eq!(manager.live_count(), 0);
        assert_eq!(backend.live_surfaces().len(), 0);
        assert_eq!(backend.destroy_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn partial_creation_failure_keeps_created_surfaces() {
        let backend = HeadlessBackend::new(displays(3));
        backend.fail_creation_at(1);
        let manager = manager(&backend);

        let err = manager
            .create_all(&displays(3), RingParameters::default())
            .await
            .expect_err("second surface fails");
        match err {
            OverlayError::SurfaceCreation {
                created, requested, ..
            } => {
                assert_eq!(created, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(manager.live_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn broadcast_before_ready_is_held_then_delivered_in_full() {
        let backend =
            HeadlessBackend::new(displays(1)).with_ready_delay(Some(Duration::from_millis(300)));
        let manager = manager(&backend);
        manager
            .create_all(&displays(1), RingParameters::default())
            .await
            .expect("create");

        assert_eq!(manager.broadcast(&RingPatch::thickness(75.0)), Ok(1));
        assert_eq!(manager.broadcast(&RingPatch::size(60.0)), Ok(1));
        let handle = manager.surfaces()[0].handle;
        assert!(backend.delivered(handle).is_empty());

        tokio::time::sleep(Duration::from_millis(400)).await;
        let delivered = backend.delivered(handle);
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].thickness, 75.0);
        assert_eq!(delivered[0].size, 60.0);
        assert_eq!(delivered[0].brightness, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_surface_gets_held_parameters_after_timeout() {
        let backend = HeadlessBackend::new(displays(1)).with_ready_delay(None);
        let manager = manager(&backend);
        manager
            .create_all(&displays(1), RingParameters::default())
            .await
            .expect("create");
        manager.broadcast(&RingPatch::brightness(40.0)).expect("broadcast");
        let handle = manager.surfaces()[0].handle;

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert!(backend.delivered(handle).is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(backend.delivered(handle).len(), 1);
        assert!(manager.surfaces()[0].ready);
    }

    #[tokio::test(start_paused = true)]
    async fn broadcasts_arrive_in_issue_order() {
        let backend = HeadlessBackend::new(displays(2));
        let manager = manager(&backend);
        manager
            .create_all(&displays(2), RingParameters::default())
            .await
            .expect("create");
        settle().await;

        for value in [10.0, 20.0, 30.0, 40.0] {
            assert_eq!(manager.broadcast(&RingPatch::thickness(value)), Ok(2));
        }
        for status in manager.surfaces() {
            let seen: Vec<f32> = backend
                .delivered(status.handle)
                .iter()
                .map(|p| p.thickness)
                .collect();
            assert_eq!(seen, vec![10.0, 20.0, 30.0, 40.0]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn vanished_surfaces_are_skipped_not_errors() {
        let backend = HeadlessBackend::new(displays(2));
        let manager = manager(&backend);
        manager
            .create_all(&displays(2), RingParameters::default())
            .await
            .expect("create");
        settle().await;

        let gone = manager.surfaces()[0].handle;
        backend.vanish(gone);

        assert_eq!(manager.broadcast(&RingPatch::thickness(75.0)), Ok(1));
        assert_eq!(manager.live_count(), 1);
        manager.destroy_all().expect("destroy tolerates vanished surfaces");
    }

    #[tokio::test(start_paused = true)]
    async fn externally_closed_surface_is_forgotten() {
        let backend = HeadlessBackend::new(displays(2));
        let manager = manager(&backend);
        manager
            .create_all(&displays(2), RingParameters::default())
            .await
            .expect("create");

        backend.close_externally(manager.surfaces()[1].handle);
        settle().await;
        assert_eq!(manager.live_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_during_create_wins() {
        let backend =
            HeadlessBackend::new(displays(3)).with_creation_delay(Duration::from_millis(100));
        let manager = manager(&backend);

        let creating = {
            let manager = manager.clone();
            tokio::spawn(async move {
                manager
                    .create_all(&displays(3), RingParameters::default())
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(150)).await;
        manager.destroy_all().expect("destroy");

        let result = creating.await.expect("join");
        assert_eq!(result, Err(OverlayError::Superseded));
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(manager.live_count(), 0);
        assert!(backend.live_surfaces().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn mouse_mode_applies_to_all_live_surfaces() {
        let backend = HeadlessBackend::new(displays(2));
        let manager = manager(&backend);
        manager
            .create_all(&displays(2), RingParameters::default())
            .await
            .expect("create");

        manager.set_mouse_transparent(false).expect("capture");
        assert!(backend.live_surfaces().iter().all(|s| !s.mouse_transparent));
        manager.set_mouse_transparent(true).expect("pass through");
        assert!(backend.live_surfaces().iter().all(|s| s.mouse_transparent));
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_create_never_leaks_surfaces() {
        let backend = HeadlessBackend::new(displays(2));
        let manager = manager(&backend);

        for _ in 0..3 {
            manager
                .create_all(&displays(2), RingParameters::default())
                .await
                .expect("create");
        }
        assert_eq!(manager.live_count(), 2);
        assert_eq!(backend.live_surfaces().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn event_pump_stops_when_the_manager_is_dropped() {
        let backend = HeadlessBackend::new(displays(1));
        let manager = manager(&backend);
        let events = manager.events.clone();
        settle().await;
        assert!(!events.is_closed());

        drop(manager);
        settle().await;
        assert!(events.is_closed());
    }
}
