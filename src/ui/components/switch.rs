use gpui::prelude::*;
use gpui::{MouseButton, div, px, rgb};

/// Pill-shaped on/off switch.
///
/// A disabled switch is dimmed and ignores clicks; the power switch is
/// disabled while a toggle is cooling down.
pub fn switch(
    checked: bool,
    enabled: bool,
    on_click: impl Fn(&bool, &mut gpui::Window, &mut gpui::App) + 'static,
) -> impl IntoElement {
    let track = match (checked, enabled) {
        (true, true) => rgb(0xffb300),
        (true, false) => rgb(0x7a5a10),
        (false, _) => rgb(0x333333),
    };

    let knob = div()
        .w(px(16.0))
        .h(px(16.0))
        .rounded_full()
        .bg(if enabled { rgb(0xffffff) } else { rgb(0x999999) })
        .ml(if checked { px(24.0) } else { px(4.0) });

    let base = div()
        .flex()
        .items_center()
        .w(px(44.0))
        .h(px(24.0))
        .rounded(px(12.0))
        .bg(track)
        .border_1()
        .border_color(if checked { track } else { rgb(0x555555) })
        .child(knob);

    if enabled {
        base.cursor_pointer()
            .on_mouse_down(MouseButton::Left, move |_, window, cx| {
                on_click(&checked, window, cx);
            })
    } else {
        base
    }
}
