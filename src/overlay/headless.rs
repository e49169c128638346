use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::error::OverlayError;
use crate::monitor::Display;

use super::backend::{SurfaceBackend, SurfaceEvent, SurfaceEvents, SurfaceHandle};
use super::config::{OverlayConfig, RingParameters};

/// A surface as the headless backend remembers it.
#[derive(Clone, Debug)]
pub struct HeadlessSurface {
    pub handle: SurfaceHandle,
    pub config: OverlayConfig,
    pub mouse_transparent: bool,
    /// Every parameter set pushed after creation, oldest first.
    pub delivered: Vec<RingParameters>,
}

struct Inner {
    displays: Vec<Display>,
    creation_delay: Duration,
    ready_delay: Option<Duration>,
    failing: HashSet<usize>,
    next_handle: u64,
    surfaces: BTreeMap<SurfaceHandle, (HeadlessSurface, SurfaceEvents)>,
    destroy_calls: usize,
}

/// In-memory surface backend.
///
/// Used where no compositor is available and by the test suite; it records
/// every call so callers can assert on what a real display would have shown.
#[derive(Clone)]
pub struct HeadlessBackend {
    inner: Arc<Mutex<Inner>>,
}

impl HeadlessBackend {
    pub fn new(displays: Vec<Display>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                displays,
                creation_delay: Duration::ZERO,
                ready_delay: Some(Duration::from_millis(1)),
                failing: HashSet::new(),
                next_handle: 1,
                surfaces: BTreeMap::new(),
                destroy_calls: 0,
            })),
        }
    }

    /// How long `create_surface` takes to complete.
    pub fn with_creation_delay(self, delay: Duration) -> Self {
        self.lock().creation_delay = delay;
        self
    }

    /// Delay before a new surface reports ready; `None` means it never does.
    pub fn with_ready_delay(self, delay: Option<Duration>) -> Self {
        self.lock().ready_delay = delay;
        self
    }

    /// Make creation of the surface with this creation-order index fail.
    pub fn fail_creation_at(&self, index: usize) {
        self.lock().failing.insert(index);
    }

    pub fn live_surfaces(&self) -> Vec<HeadlessSurface> {
        self.lock()
            .surfaces
            .values()
            .map(|(surface, _)| surface.clone())
            .collect()
    }

    pub fn delivered(&self, handle: SurfaceHandle) -> Vec<RingParameters> {
        self.lock()
            .surfaces
            .get(&handle)
            .map(|(surface, _)| surface.delivered.clone())
            .unwrap_or_default()
    }

    pub fn destroy_calls(&self) -> usize {
        self.lock().destroy_calls
    }

    /// Drop a surface without telling anyone, like a window whose display
    /// was unplugged between two pushes.
    pub fn vanish(&self, handle: SurfaceHandle) {
        self.lock().surfaces.remove(&handle);
    }

    /// Drop a surface and report it closed.
    pub fn close_externally(&self, handle: SurfaceHandle) {
        if let Some((_, events)) = self.lock().surfaces.remove(&handle) {
            let _ = events.send(SurfaceEvent::Closed(handle));
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SurfaceBackend for HeadlessBackend {
    fn displays(&self) -> Result<Vec<Display>, OverlayError> {
        Ok(self.lock().displays.clone())
    }

    async fn create_surface(
        &self,
        config: OverlayConfig,
        events: SurfaceEvents,
    ) -> Result<SurfaceHandle, OverlayError> {
        let delay = self.lock().creation_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let (handle, ready_delay) = {
            let mut inner = self.lock();
            if inner.failing.contains(&config.index) {
                return Err(OverlayError::Platform(format!(
                    "surface {} refused to open",
                    config.index + 1
                )));
            }
            let handle = SurfaceHandle(inner.next_handle);
            inner.next_handle += 1;
            inner.surfaces.insert(
                handle,
                (
                    HeadlessSurface {
                        handle,
                        mouse_transparent: config.mouse_transparent,
                        config,
                        delivered: Vec::new(),
                    },
                    events.clone(),
                ),
            );
            (handle, inner.ready_delay)
        };

        if let Some(ready_delay) = ready_delay {
            tokio::spawn(async move {
                tokio::time::sleep(ready_delay).await;
                let _ = events.send(SurfaceEvent::Ready(handle));
            });
        }
        debug!("Headless surface {} created", handle);
        Ok(handle)
    }

    fn push_params(
        &self,
        handle: SurfaceHandle,
        params: &RingParameters,
    ) -> Result<(), OverlayError> {
        let mut inner = self.lock();
        let (surface, _) = inner
            .surfaces
            .get_mut(&handle)
            .ok_or(OverlayError::StaleHandle(handle))?;
        surface.delivered.push(*params);
        Ok(())
    }

    fn set_mouse_transparent(
        &self,
        handle: SurfaceHandle,
        transparent: bool,
    ) -> Result<(), OverlayError> {
        let mut inner = self.lock();
        let (surface, _) = inner
            .surfaces
            .get_mut(&handle)
            .ok_or(OverlayError::StaleHandle(handle))?;
        surface.mouse_transparent = transparent;
        Ok(())
    }

    fn destroy_surface(&self, handle: SurfaceHandle) -> Result<(), OverlayError> {
        let mut inner = self.lock();
        match inner.surfaces.remove(&handle) {
            Some(_) => {
                inner.destroy_calls += 1;
                Ok(())
            }
            None => Err(OverlayError::StaleHandle(handle)),
        }
    }
}
