use gpui::prelude::*;
use gpui::{div, px, rgb};

/// Round marker in front of a single-choice row; filled when selected.
pub fn option_mark(selected: bool) -> impl IntoElement {
    div()
        .flex()
        .items_center()
        .justify_center()
        .w(px(20.0))
        .h(px(20.0))
        .rounded_full()
        .border_2()
        .border_color(if selected { rgb(0xffb300) } else { rgb(0x666666) })
        .child(
            div()
                .w(px(10.0))
                .h(px(10.0))
                .rounded_full()
                .bg(if selected { rgb(0xffb300) } else { rgb(0x1e1e1e) }),
        )
}
