use gpui::prelude::*;
use gpui::{FontWeight, MouseButton, div, px, rgb};

use ring_light::monitor::{Display, MonitorSelection};

use crate::ui::components::option_mark;
use crate::ui::controller::Controller;

/// Build the monitor picker: "primary", "all", then one row per display.
///
/// Picking a row while the ring is on recreates the overlay on the new
/// target(s). The active row carries a marker while overlays are live.
pub fn monitor_list(
    displays: &[Display],
    selection: MonitorSelection,
    overlay_live: bool,
    cx: &mut gpui::Context<Controller>,
) -> impl IntoElement + use<> {
    let mut list = div().flex().flex_col().gap_2().w_full().max_w(px(500.0));

    let primary_detail = displays
        .iter()
        .find(|d| d.is_primary)
        .or_else(|| displays.first())
        .map(|d| format!("{}x{}", d.bounds.width, d.bounds.height))
        .unwrap_or_default();

    list = list.child(option_row(
        MonitorSelection::Primary,
        "Primary display".to_string(),
        primary_detail,
        selection,
        overlay_live,
        cx,
    ));
    if displays.len() > 1 {
        list = list.child(option_row(
            MonitorSelection::All,
            "All displays".to_string(),
            format!("{} connected", displays.len()),
            selection,
            overlay_live,
            cx,
        ));
    }

    for display in displays {
        let name = display.name.replace("\\\\.\\", "");
        let title = if name.is_empty() {
            display.label()
        } else {
            format!("{} ({})", display.label(), name)
        };
        let detail = format!(
            "pos: ({}, {}){}",
            display.bounds.x,
            display.bounds.y,
            if display.is_primary { " · primary" } else { "" }
        );
        list = list.child(option_row(
            MonitorSelection::Specific(display.id),
            title,
            detail,
            selection,
            overlay_live,
            cx,
        ));
    }

    list
}

fn option_row(
    option: MonitorSelection,
    title: String,
    detail: String,
    selection: MonitorSelection,
    overlay_live: bool,
    cx: &mut gpui::Context<Controller>,
) -> impl IntoElement + use<> {
    let is_selected = option == selection;
    let status = if is_selected && overlay_live { "● active" } else { "" };

    div()
        .flex()
        .items_center()
        .gap_3()
        .px_4()
        .py_2()
        .w_full()
        .rounded(px(8.0))
        .bg(if is_selected { rgb(0x3a2e12) } else { rgb(0x1e1e1e) })
        .border_1()
        .border_color(if is_selected { rgb(0xffb300) } else { rgb(0x333333) })
        .cursor_pointer()
        .on_mouse_down(
            MouseButton::Left,
            cx.listener(move |this, _, _window, cx| {
                this.ring.select_monitor(option);
                cx.notify();
            }),
        )
        .child(option_mark(is_selected))
        .child(
            div()
                .flex()
                .flex_col()
                .gap(px(2.0))
                .flex_grow()
                .child(
                    div()
                        .text_color(rgb(0xffffff))
                        .font_weight(FontWeight::MEDIUM)
                        .child(title),
                )
                .child(div().text_sm().text_color(rgb(0x888888)).child(detail)),
        )
        .child(
            div()
                .text_sm()
                .text_color(rgb(0xffb300))
                .child(status.to_string()),
        )
}
