use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, error, warn};
use windows::Win32::Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, CreatePen, CreateSolidBrush, DeleteObject, Ellipse, EndPaint, FillRect,
    GetStockObject, HBRUSH, HDC, InvalidateRect, NULL_BRUSH, PAINTSTRUCT, PS_INSIDEFRAME,
    SelectObject, UpdateWindow,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CS_HREDRAW, CS_VREDRAW, CreateWindowExW, DefWindowProcW, DispatchMessageW, GWL_EXSTYLE,
    GWL_STYLE, GetClientRect, GetMessageW, GetWindowLongW, HWND_TOPMOST, LWA_ALPHA, LWA_COLORKEY,
    MSG, PostMessageW, PostQuitMessage, RegisterClassW, SW_SHOWNOACTIVATE, SWP_FRAMECHANGED,
    SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER, SWP_SHOWWINDOW,
    SetLayeredWindowAttributes, SetWindowLongW, SetWindowPos, ShowWindow, TranslateMessage,
    WINDOW_EX_STYLE, WM_CLOSE, WM_DESTROY, WM_PAINT, WM_USER, WNDCLASSW, WS_DISABLED,
    WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT,
    WS_POPUP,
};
use windows::core::{PCWSTR, w};

use crate::error::OverlayError;
use crate::monitor::{Display, enumerate_displays};

use super::backend::{SurfaceBackend, SurfaceEvent, SurfaceEvents, SurfaceHandle};
use super::config::{OverlayConfig, RingParameters};

/// Re-read the shared parameters and repaint.
const WM_UPDATE_RING: u32 = WM_USER + 1;
/// `WPARAM` is 1 for click-through, 0 for pointer-capturing.
const WM_SET_PASSTHROUGH: u32 = WM_USER + 2;

/// Pixels painted in this color are keyed out by the layered window.
const KEY_COLOR: COLORREF = COLORREF(0x0000_0000);

const CLASS_NAME: PCWSTR = w!("RingLightOverlayClass");
const CREATE_TIMEOUT: Duration = Duration::from_secs(2);

struct WindowEntry {
    hwnd: usize,
    params: Arc<Mutex<RingParameters>>,
}

type WindowMap = Arc<Mutex<HashMap<SurfaceHandle, WindowEntry>>>;

/// Per-thread state read by the window procedure.
struct SurfaceState {
    handle: SurfaceHandle,
    params: Arc<Mutex<RingParameters>>,
    events: SurfaceEvents,
    windows: WindowMap,
    announced: bool,
}

thread_local! {
    static SURFACE: RefCell<Option<SurfaceState>> = const { RefCell::new(None) };
}

/// Layered Win32 windows, one message-loop thread per surface.
pub struct Win32Backend {
    windows: WindowMap,
    next_handle: AtomicU64,
}

impl Win32Backend {
    pub fn new() -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            next_handle: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SurfaceHandle, WindowEntry>> {
        lock_map(&self.windows)
    }

    fn post(&self, handle: SurfaceHandle, msg: u32, wparam: WPARAM) -> Result<(), OverlayError> {
        let hwnd = self
            .lock()
            .get(&handle)
            .map(|entry| entry.hwnd)
            .ok_or(OverlayError::StaleHandle(handle))?;
        unsafe { PostMessageW(Some(hwnd_from(hwnd)), msg, wparam, LPARAM(0)) }
            .map_err(|_| OverlayError::StaleHandle(handle))
    }
}

impl Default for Win32Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceBackend for Win32Backend {
    fn displays(&self) -> Result<Vec<Display>, OverlayError> {
        enumerate_displays()
    }

    async fn create_surface(
        &self,
        config: OverlayConfig,
        events: SurfaceEvents,
    ) -> Result<SurfaceHandle, OverlayError> {
        let handle = SurfaceHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let params = Arc::new(Mutex::new(config.params));
        let (hwnd_tx, hwnd_rx) = oneshot::channel();

        let state = SurfaceState {
            handle,
            params: params.clone(),
            events,
            windows: self.windows.clone(),
            announced: false,
        };
        std::thread::Builder::new()
            .name(format!("ring-overlay-{}", config.index + 1))
            .spawn(move || run_surface(config, state, hwnd_tx))
            .map_err(|e| OverlayError::Platform(format!("failed to spawn overlay thread: {e}")))?;

        let hwnd = match tokio::time::timeout(CREATE_TIMEOUT, hwnd_rx).await {
            Ok(Ok(Ok(hwnd))) => hwnd,
            Ok(Ok(Err(reason))) => return Err(OverlayError::Platform(reason)),
            Ok(Err(_)) => {
                return Err(OverlayError::Platform(
                    "overlay thread exited before creating its window".into(),
                ));
            }
            Err(_) => {
                return Err(OverlayError::Platform(
                    "timed out waiting for the overlay window".into(),
                ));
            }
        };

        self.lock().insert(handle, WindowEntry { hwnd, params });
        Ok(handle)
    }

    fn push_params(
        &self,
        handle: SurfaceHandle,
        params: &RingParameters,
    ) -> Result<(), OverlayError> {
        let shared = self
            .lock()
            .get(&handle)
            .map(|entry| entry.params.clone())
            .ok_or(OverlayError::StaleHandle(handle))?;
        *shared.lock().unwrap_or_else(PoisonError::into_inner) = *params;
        self.post(handle, WM_UPDATE_RING, WPARAM(0))
    }

    fn set_mouse_transparent(
        &self,
        handle: SurfaceHandle,
        transparent: bool,
    ) -> Result<(), OverlayError> {
        self.post(handle, WM_SET_PASSTHROUGH, WPARAM(usize::from(transparent)))
    }

    fn destroy_surface(&self, handle: SurfaceHandle) -> Result<(), OverlayError> {
        let entry = self
            .lock()
            .remove(&handle)
            .ok_or(OverlayError::StaleHandle(handle))?;
        unsafe { PostMessageW(Some(hwnd_from(entry.hwnd)), WM_CLOSE, WPARAM(0), LPARAM(0)) }
            .map_err(|_| OverlayError::StaleHandle(handle))
    }
}

fn lock_map(map: &WindowMap) -> MutexGuard<'_, HashMap<SurfaceHandle, WindowEntry>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

fn hwnd_from(raw: usize) -> HWND {
    HWND(raw as *mut _)
}

fn register_class() -> Result<(), String> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| {
            let wc = WNDCLASSW {
                lpfnWndProc: Some(wnd_proc),
                hInstance: HINSTANCE(std::ptr::null_mut()),
                lpszClassName: CLASS_NAME,
                style: CS_HREDRAW | CS_VREDRAW,
                hbrBackground: HBRUSH(std::ptr::null_mut()),
                ..Default::default()
            };
            if unsafe { RegisterClassW(&wc) } == 0 {
                Err("failed to register overlay window class".into())
            } else {
                Ok(())
            }
        })
        .clone()
}

/// Body of a surface thread: create the window, hand its HWND back, pump
/// messages until the window is destroyed.
fn run_surface(
    config: OverlayConfig,
    state: SurfaceState,
    hwnd_tx: oneshot::Sender<Result<usize, String>>,
) {
    if let Err(reason) = register_class() {
        let _ = hwnd_tx.send(Err(reason));
        return;
    }

    let handle = state.handle;
    let bounds = config.bounds;
    let mut ex_style =
        WS_EX_LAYERED.0 | WS_EX_TOPMOST.0 | WS_EX_TOOLWINDOW.0 | WS_EX_NOACTIVATE.0;
    let mut style = WS_POPUP;
    if config.mouse_transparent {
        ex_style |= WS_EX_TRANSPARENT.0;
        style = style | WS_DISABLED;
    }

    SURFACE.with(|slot| *slot.borrow_mut() = Some(state));

    let hwnd = match unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(ex_style),
            CLASS_NAME,
            w!("Ring Light Overlay"),
            style,
            bounds.x,
            bounds.y,
            bounds.width,
            bounds.height,
            None,
            None,
            Some(HINSTANCE(std::ptr::null_mut())),
            None,
        )
    } {
        Ok(hwnd) if !hwnd.0.is_null() => hwnd,
        Ok(_) => {
            let _ = hwnd_tx.send(Err("CreateWindowExW returned a null window".into()));
            return;
        }
        Err(e) => {
            let _ = hwnd_tx.send(Err(format!("CreateWindowExW failed: {e}")));
            return;
        }
    };

    if hwnd_tx.send(Ok(hwnd.0 as usize)).is_err() {
        // Creation was abandoned on the async side.
        warn!("Overlay {} created after its caller gave up, closing it", handle);
        unsafe {
            let _ = PostMessageW(Some(hwnd), WM_CLOSE, WPARAM(0), LPARAM(0));
        }
    }

    unsafe {
        apply_alpha(hwnd, &config.params);
        let _ = ShowWindow(hwnd, SW_SHOWNOACTIVATE);
        let _ = SetWindowPos(
            hwnd,
            Some(HWND_TOPMOST),
            bounds.x,
            bounds.y,
            bounds.width,
            bounds.height,
            SWP_SHOWWINDOW | SWP_NOACTIVATE,
        );
        let _ = UpdateWindow(hwnd);

        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
    debug!("Overlay {} message loop finished", handle);
}

fn current_params() -> Option<RingParameters> {
    SURFACE.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|state| *state.params.lock().unwrap_or_else(PoisonError::into_inner))
    })
}

unsafe fn apply_alpha(hwnd: HWND, params: &RingParameters) {
    let alpha = params.geometry().alpha();
    unsafe {
        if let Err(e) =
            SetLayeredWindowAttributes(hwnd, KEY_COLOR, alpha, LWA_ALPHA | LWA_COLORKEY)
        {
            error!("SetLayeredWindowAttributes failed: {}", e);
        }
    }
}

unsafe fn paint_ring(hdc: HDC, client: &RECT, params: &RingParameters) {
    let geometry = params.geometry();
    let color = params.color;
    let ring_color =
        COLORREF(u32::from(color.r) | (u32::from(color.g) << 8) | (u32::from(color.b) << 16));

    let cx = (client.left + client.right) / 2;
    let cy = (client.top + client.bottom) / 2;
    let radius = (geometry.diameter / 2.0).round() as i32;

    unsafe {
        let background = CreateSolidBrush(KEY_COLOR);
        if !background.is_invalid() {
            let _ = FillRect(hdc, client, background);
            let _ = DeleteObject(background.into());
        }

        let pen = CreatePen(PS_INSIDEFRAME, geometry.border_width.round() as i32, ring_color);
        if pen.is_invalid() {
            return;
        }
        let old_pen = SelectObject(hdc, pen.into());
        let old_brush = SelectObject(hdc, GetStockObject(NULL_BRUSH));
        let _ = Ellipse(hdc, cx - radius, cy - radius, cx + radius, cy + radius);
        let _ = SelectObject(hdc, old_brush);
        let _ = SelectObject(hdc, old_pen);
        let _ = DeleteObject(pen.into());
    }
}

unsafe fn set_passthrough(hwnd: HWND, transparent: bool) {
    unsafe {
        let ex_style = GetWindowLongW(hwnd, GWL_EXSTYLE) as u32;
        let style = GetWindowLongW(hwnd, GWL_STYLE) as u32;
        let (ex_style, style) = if transparent {
            (ex_style | WS_EX_TRANSPARENT.0, style | WS_DISABLED.0)
        } else {
            (ex_style & !WS_EX_TRANSPARENT.0, style & !WS_DISABLED.0)
        };
        SetWindowLongW(hwnd, GWL_EXSTYLE, ex_style as i32);
        SetWindowLongW(hwnd, GWL_STYLE, style as i32);
        let _ = SetWindowPos(
            hwnd,
            None,
            0,
            0,
            0,
            0,
            SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE | SWP_FRAMECHANGED,
        );
    }
}

unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    unsafe {
        match msg {
            WM_PAINT => {
                let mut ps = PAINTSTRUCT::default();
                let hdc = BeginPaint(hwnd, &mut ps);
                if !hdc.is_invalid() {
                    let mut client = RECT::default();
                    let _ = GetClientRect(hwnd, &mut client);
                    if let Some(params) = current_params() {
                        paint_ring(hdc, &client, &params);
                    }
                    let _ = EndPaint(hwnd, &ps);
                }
                SURFACE.with(|slot| {
                    if let Some(state) = slot.borrow_mut().as_mut() {
                        if !state.announced {
                            state.announced = true;
                            let _ = state.events.send(SurfaceEvent::Ready(state.handle));
                        }
                    }
                });
                LRESULT(0)
            }
            WM_UPDATE_RING => {
                if let Some(params) = current_params() {
                    apply_alpha(hwnd, &params);
                }
                let _ = InvalidateRect(Some(hwnd), None, true);
                LRESULT(0)
            }
            WM_SET_PASSTHROUGH => {
                set_passthrough(hwnd, wparam.0 != 0);
                LRESULT(0)
            }
            WM_DESTROY => {
                SURFACE.with(|slot| {
                    if let Some(state) = slot.borrow_mut().take() {
                        lock_map(&state.windows).remove(&state.handle);
                        let _ = state.events.send(SurfaceEvent::Closed(state.handle));
                    }
                });
                PostQuitMessage(0);
                LRESULT(0)
            }
            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }
}
