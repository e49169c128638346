use std::rc::Rc;

use gpui::prelude::*;
use gpui::{FontWeight, div, px, rgb, rgba};

use ring_light::control::{ControlState, RenderMode, RingController, SliderId};
use ring_light::monitor::Display;
use ring_light::overlay::{RingGeometry, RingParameters, temperature_label};

use crate::Backend;
use crate::ui::components::{TrackBounds, ring_slider, switch};
use crate::ui::monitor_list::monitor_list;

/// Size of the in-panel ring preview box.
const PREVIEW_SIZE: f32 = 220.0;

/// The control panel window.
///
/// All ring state lives in the [`RingController`]; this view only forwards
/// input to it and re-renders whenever it publishes a new snapshot.
pub struct Controller {
    pub ring: RingController<Backend>,
    /// Displays known at startup, listed in the monitor picker.
    pub displays: Vec<Display>,
    /// Slider currently held down, if any.
    pub dragging: Option<SliderId>,
    /// Per-slider track bounds, written during prepaint.
    pub track_bounds: [TrackBounds; SliderId::COUNT],
}

impl Controller {
    pub fn new(
        ring: RingController<Backend>,
        displays: Vec<Display>,
        cx: &mut gpui::Context<Self>,
    ) -> Self {
        let mut updates = ring.subscribe();
        cx.spawn(async move |this, cx| {
            while updates.changed().await.is_ok() {
                if this.update(cx, |_, cx| cx.notify()).is_err() {
                    break;
                }
            }
        })
        .detach();

        Self {
            ring,
            displays,
            dragging: None,
            track_bounds: std::array::from_fn(|_| Rc::default()),
        }
    }

    pub fn finish_drag(&mut self, id: SliderId) {
        if self.dragging == Some(id) {
            self.dragging = None;
            self.ring.stop_drag(id);
        }
    }
}

fn slider_caption(id: SliderId, value: f32) -> String {
    match id {
        SliderId::Warmth => format!("{} · {}%", temperature_label(value), value.round()),
        _ => format!("{}%", value.round()),
    }
}

fn status_line(state: &ControlState) -> String {
    match state.render {
        RenderMode::Hidden => "Ring is off".to_string(),
        RenderMode::Pending => "Opening overlay…".to_string(),
        RenderMode::Overlay { surfaces } => format!("Ring shown on {} display(s)", surfaces),
        RenderMode::InPanel => "Overlay unavailable, showing the ring here".to_string(),
    }
}

/// Ring drawn inside the panel when no overlay surface is available.
fn ring_preview(params: &RingParameters) -> impl IntoElement {
    let geometry = params.geometry();
    let scale = PREVIEW_SIZE / RingGeometry::MAX_DIAMETER;
    let outer = geometry.diameter * scale;
    let inner = (outer - 2.0 * geometry.border_width * scale).max(0.0);
    let color = params.color;
    let fill = rgba((color.packed_rgb() << 8) | u32::from(geometry.alpha()));

    div()
        .flex()
        .items_center()
        .justify_center()
        .w(px(PREVIEW_SIZE))
        .h(px(PREVIEW_SIZE))
        .child(
            div()
                .flex()
                .items_center()
                .justify_center()
                .w(px(outer))
                .h(px(outer))
                .rounded_full()
                .bg(fill)
                .child(div().w(px(inner)).h(px(inner)).rounded_full().bg(rgb(0x0e0e0e))),
        )
}

impl Render for Controller {
    fn render(
        &mut self,
        _window: &mut gpui::Window,
        cx: &mut gpui::Context<Self>,
    ) -> impl IntoElement {
        let state = self.ring.snapshot();
        let power_on = state.power.is_on();
        let enabled = state.sliders_enabled();
        let overlay_live = matches!(state.render, RenderMode::Overlay { .. });

        let mut sliders = div().flex().flex_col().gap_4().w_full().max_w(px(500.0));
        for id in SliderId::ALL {
            let value = state.value(id);
            sliders = sliders.child(ring_slider(
                id,
                value,
                slider_caption(id, value),
                &self.track_bounds[id.index()],
                enabled,
                cx,
            ));
        }

        let power_panel = div()
            .flex()
            .items_center()
            .justify_between()
            .w_full()
            .max_w(px(500.0))
            .px_4()
            .py_4()
            .rounded(px(12.0))
            .bg(if power_on { rgb(0x3a2e12) } else { rgb(0x1e1e1e) })
            .border_1()
            .border_color(if power_on { rgb(0xffb300) } else { rgb(0x333333) })
            .child(
                div()
                    .flex()
                    .flex_col()
                    .gap(px(2.0))
                    .child(
                        div()
                            .text_lg()
                            .font_weight(FontWeight::BOLD)
                            .text_color(rgb(0xffffff))
                            .child(if power_on { "ON" } else { "OFF" }),
                    )
                    .child(
                        div()
                            .text_sm()
                            .text_color(rgb(0x888888))
                            .child(status_line(&state)),
                    ),
            )
            .child(switch(
                power_on,
                !state.power.is_toggling(),
                cx.listener(|this, _, _window, cx| {
                    this.dragging = None;
                    this.ring.toggle_power();
                    cx.notify();
                }),
            ));

        let pointer_row = div()
            .flex()
            .items_center()
            .justify_between()
            .w_full()
            .max_w(px(500.0))
            .child(
                div()
                    .text_sm()
                    .text_color(rgb(0xcccccc))
                    .child("Overlay captures the mouse"),
            )
            .child(switch(
                state.overlay_interactive,
                overlay_live,
                cx.listener(|this, _, _window, cx| {
                    let interactive = this.ring.snapshot().overlay_interactive;
                    this.ring.set_overlay_interactive(!interactive);
                    cx.notify();
                }),
            ));

        let monitors = monitor_list(&self.displays, state.selection, overlay_live, cx);
        let sep = || div().w_full().max_w(px(500.0)).h(px(1.0)).bg(rgb(0x333333));

        let mut layout = div()
            .flex()
            .flex_col()
            .gap_5()
            .size_full()
            .p_6()
            .items_center()
            .bg(rgb(0x0e0e0e))
            .child(
                div()
                    .text_2xl()
                    .font_weight(FontWeight::BOLD)
                    .text_color(rgb(0xffffff))
                    .child("Ring Light"),
            )
            .child(power_panel);

        if state.render == RenderMode::InPanel {
            layout = layout.child(ring_preview(&state.parameters()));
        }

        layout
            .child(sep())
            .child(sliders)
            .child(sep())
            .child(
                div()
                    .w_full()
                    .max_w(px(500.0))
                    .text_lg()
                    .font_weight(FontWeight::MEDIUM)
                    .text_color(rgb(0xcccccc))
                    .child(format!("Monitors ({})", self.displays.len())),
            )
            .child(monitors)
            .child(sep())
            .child(pointer_row)
    }
}
