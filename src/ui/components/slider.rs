use std::cell::Cell;
use std::rc::Rc;

use gpui::prelude::*;
use gpui::{Bounds, FontWeight, MouseButton, Pixels, div, px, rgb};

use ring_light::control::SliderId;

use crate::ui::controller::Controller;

/// Width of the slider track in pixels.
const SLIDER_WIDTH: f32 = 400.0;

pub type TrackBounds = Rc<Cell<Option<Bounds<Pixels>>>>;

/// One labelled ring slider: header with the current value, then the track.
///
/// Pressing the track starts a drag on the controller, releasing it (inside or
/// outside the track) ends it so the final value is applied at once.
pub fn ring_slider(
    id: SliderId,
    value: f32,
    caption: String,
    track_bounds: &TrackBounds,
    enabled: bool,
    cx: &mut gpui::Context<Controller>,
) -> impl IntoElement + use<> {
    let accent = if enabled { rgb(0xffb300) } else { rgb(0x555555) };

    div()
        .flex()
        .flex_col()
        .gap_2()
        .w_full()
        .max_w(px(500.0))
        .child(
            div()
                .flex()
                .items_center()
                .justify_between()
                .child(
                    div()
                        .text_base()
                        .font_weight(FontWeight::MEDIUM)
                        .text_color(rgb(0xcccccc))
                        .child(id.label()),
                )
                .child(
                    div()
                        .px_3()
                        .py_1()
                        .bg(rgb(0x2a2a2a))
                        .rounded(px(6.0))
                        .text_sm()
                        .font_weight(FontWeight::BOLD)
                        .text_color(accent)
                        .child(caption),
                ),
        )
        .child(slider_track(id, value, track_bounds, enabled, cx))
}

fn slider_track(
    id: SliderId,
    value: f32,
    track_bounds: &TrackBounds,
    enabled: bool,
    cx: &mut gpui::Context<Controller>,
) -> impl IntoElement + use<> {
    let knob_position = value / 100.0 * SLIDER_WIDTH;
    let fill = if enabled { rgb(0xffb300) } else { rgb(0x444444) };

    let track = div()
        .relative()
        .w(px(SLIDER_WIDTH))
        .h(px(28.0))
        .flex()
        .items_center()
        .child(
            div()
                .absolute()
                .left(px(0.0))
                .top(px(10.0))
                .w(px(SLIDER_WIDTH))
                .h(px(8.0))
                .rounded(px(4.0))
                .bg(rgb(0x333333)),
        )
        .child(
            div()
                .absolute()
                .left(px(0.0))
                .top(px(10.0))
                .w(px(knob_position))
                .h(px(8.0))
                .rounded(px(4.0))
                .bg(fill),
        )
        .child(
            div()
                .absolute()
                .left(px(knob_position - 8.0))
                .top(px(6.0))
                .w(px(16.0))
                .h(px(16.0))
                .rounded_full()
                .bg(if enabled { rgb(0xffffff) } else { rgb(0x777777) })
                .border_2()
                .border_color(fill),
        );

    let track = if enabled {
        track
            .cursor_pointer()
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(move |this, ev: &gpui::MouseDownEvent, _window, cx| {
                    this.ring.start_drag(id);
                    this.dragging = Some(id);
                    let bounds = &this.track_bounds[id.index()];
                    if let Some(value) = value_from_mouse(ev.position.x, bounds) {
                        this.ring.update_slider(id, value);
                    }
                    cx.notify();
                }),
            )
            .on_mouse_move(cx.listener(move |this, ev: &gpui::MouseMoveEvent, _window, cx| {
                if this.dragging != Some(id) || ev.pressed_button != Some(MouseButton::Left) {
                    return;
                }
                let bounds = &this.track_bounds[id.index()];
                if let Some(value) = value_from_mouse(ev.position.x, bounds) {
                    if (value - this.ring.snapshot().value(id)).abs() >= 0.5 {
                        this.ring.update_slider(id, value);
                        cx.notify();
                    }
                }
            }))
            .on_mouse_up(
                MouseButton::Left,
                cx.listener(move |this, _: &gpui::MouseUpEvent, _window, cx| {
                    this.finish_drag(id);
                    cx.notify();
                }),
            )
            .on_mouse_up_out(
                MouseButton::Left,
                cx.listener(move |this, _: &gpui::MouseUpEvent, _window, cx| {
                    this.finish_drag(id);
                    cx.notify();
                }),
            )
    } else {
        track
    };

    div()
        // Wrapper: records the track bounds so window-space mouse positions can
        // be turned into a fraction of the track.
        .on_children_prepainted({
            let bounds_cell = track_bounds.clone();
            move |bounds, _window, _cx| {
                if let Some(b) = bounds.first() {
                    bounds_cell.set(Some(*b));
                }
            }
        })
        .child(track)
}

/// Convert a mouse X position (in window coordinates) to a slider percentage.
///
/// Returns `None` until the track has been painted once.
fn value_from_mouse(mouse_x: Pixels, track_bounds: &TrackBounds) -> Option<f32> {
    let bounds = track_bounds.get()?;
    let origin_x: f32 = bounds.origin.x.into();
    let width: f32 = bounds.size.width.into();
    let mx: f32 = mouse_x.into();
    let fraction = ((mx - origin_x) / width).clamp(0.0, 1.0);
    Some((fraction * 100.0).round())
}
