use crate::error::OverlayError;

use super::types::Display;

/// Enumerate all monitors currently connected to the system.
///
/// Uses the Win32 `EnumDisplayMonitors` API to walk every active display and
/// collects geometry, device name and the primary flag. Ordinals follow
/// enumeration order.
#[cfg(windows)]
pub fn enumerate_displays() -> Result<Vec<Display>, OverlayError> {
    use windows::Win32::Foundation::{LPARAM, RECT};
    use windows::Win32::Graphics::Gdi::{
        EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFOEXW,
        MONITORINFOF_PRIMARY,
    };

    use super::types::DisplayBounds;

    unsafe extern "system" fn enum_proc(
        hmonitor: HMONITOR,
        _hdc: HDC,
        _rect: *mut RECT,
        lparam: LPARAM,
    ) -> windows::core::BOOL {
        unsafe {
            let displays = &mut *(lparam.0 as *mut Vec<Display>);

            let mut info = MONITORINFOEXW::default();
            info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;

            if GetMonitorInfoW(hmonitor, &mut info as *mut _ as *mut _).as_bool() {
                let rc = info.monitorInfo.rcMonitor;
                let device_name = &info.szDevice;
                let name_len = device_name
                    .iter()
                    .position(|&c| c == 0)
                    .unwrap_or(device_name.len());

                displays.push(Display {
                    id: displays.len(),
                    name: String::from_utf16_lossy(&device_name[..name_len]),
                    bounds: DisplayBounds {
                        x: rc.left,
                        y: rc.top,
                        width: rc.right - rc.left,
                        height: rc.bottom - rc.top,
                    },
                    is_primary: info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY != 0,
                });
            }

            windows::core::BOOL(1) // continue enumeration
        }
    }

    let mut displays: Vec<Display> = Vec::new();
    let ok = unsafe {
        EnumDisplayMonitors(
            None,
            None,
            Some(enum_proc),
            LPARAM(&mut displays as *mut Vec<Display> as isize),
        )
    };

    if !ok.as_bool() && displays.is_empty() {
        return Err(OverlayError::Enumeration(
            "EnumDisplayMonitors failed".to_string(),
        ));
    }
    Ok(displays)
}

/// Without a native overlay backend there is nothing to enumerate.
#[cfg(not(windows))]
pub fn enumerate_displays() -> Result<Vec<Display>, OverlayError> {
    Err(OverlayError::Enumeration(
        "display enumeration is only implemented for Windows".to_string(),
    ))
}

/// Take a display snapshot, degrading to one synthetic full-screen target when
/// enumeration fails or comes back empty.
pub fn snapshot_or_synthetic(result: Result<Vec<Display>, OverlayError>) -> Vec<Display> {
    match result {
        Ok(displays) if !displays.is_empty() => displays,
        Ok(_) => {
            tracing::warn!("No displays reported, using a synthetic full-screen target");
            vec![Display::synthetic()]
        }
        Err(e) => {
            tracing::warn!("{e}; using a synthetic full-screen target");
            vec![Display::synthetic()]
        }
    }
}
