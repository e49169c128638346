use std::time::Duration;

use crate::monitor::MonitorSelection;
use crate::overlay::{RingParameters, RingPatch, clamp_percent};

use super::sink::ControlKind;

/// The four sliders on the control panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SliderId {
    Brightness,
    Thickness,
    Size,
    Warmth,
}

impl SliderId {
    pub const COUNT: usize = 4;
    pub const ALL: [SliderId; Self::COUNT] = [
        SliderId::Brightness,
        SliderId::Thickness,
        SliderId::Size,
        SliderId::Warmth,
    ];

    pub const fn index(self) -> usize {
        match self {
            SliderId::Brightness => 0,
            SliderId::Thickness => 1,
            SliderId::Size => 2,
            SliderId::Warmth => 3,
        }
    }

    pub const fn default_value(self) -> f32 {
        match self {
            SliderId::Brightness => 100.0,
            SliderId::Thickness => 50.0,
            SliderId::Size => 25.0,
            SliderId::Warmth => 50.0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SliderId::Brightness => "Brightness",
            SliderId::Thickness => "Thickness",
            SliderId::Size => "Size",
            SliderId::Warmth => "Warmth",
        }
    }

    /// External control this slider drives once input settles. Thickness has
    /// none; settling it only re-broadcasts the value.
    pub const fn control_kind(self) -> Option<ControlKind> {
        match self {
            SliderId::Brightness => Some(ControlKind::Brightness),
            SliderId::Thickness => None,
            SliderId::Size => Some(ControlKind::RingSize),
            SliderId::Warmth => Some(ControlKind::ColorTemp),
        }
    }

    /// The partial broadcast carrying just this slider's value.
    pub fn patch(self, value: f32) -> RingPatch {
        match self {
            SliderId::Brightness => RingPatch::brightness(value),
            SliderId::Thickness => RingPatch::thickness(value),
            SliderId::Size => RingPatch::size(value),
            SliderId::Warmth => RingPatch::warmth(value),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliderState {
    pub current_value: f32,
    pub is_dragging: bool,
    /// Whole percent last handed to the external control sink. Only updated
    /// when a call is actually issued.
    pub last_applied: Option<f32>,
}

impl SliderState {
    fn new(id: SliderId) -> Self {
        Self {
            current_value: id.default_value(),
            is_dragging: false,
            last_applied: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PowerState {
    #[default]
    Off,
    On,
    /// Just switched on; further toggles are dropped until the cool-down ends.
    TogglingOn,
    /// Just switched off; further toggles are dropped until the cool-down ends.
    TogglingOff,
}

impl PowerState {
    /// Whether the user intent is "ring on".
    pub fn is_on(self) -> bool {
        matches!(self, PowerState::On | PowerState::TogglingOn)
    }

    pub fn is_toggling(self) -> bool {
        matches!(self, PowerState::TogglingOn | PowerState::TogglingOff)
    }

    /// State after the toggle cool-down elapses.
    pub fn settle(self) -> Self {
        match self {
            PowerState::TogglingOn => PowerState::On,
            PowerState::TogglingOff => PowerState::Off,
            settled => settled,
        }
    }
}

/// Where the ring is currently being drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    #[default]
    Hidden,
    /// Overlay creation has been requested and not answered yet.
    Pending,
    Overlay {
        surfaces: usize,
    },
    /// No overlay surface is available; the panel draws the ring itself.
    InPanel,
}

/// Everything the panel needs to draw itself.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlState {
    pub power: PowerState,
    pub sliders: [SliderState; SliderId::COUNT],
    pub render: RenderMode,
    pub selection: MonitorSelection,
    /// Set while restoring values at startup; suppresses external control.
    pub initializing: bool,
    /// Overlay surfaces capture the pointer instead of passing it through.
    pub overlay_interactive: bool,
}

impl ControlState {
    pub fn new(selection: MonitorSelection) -> Self {
        Self {
            power: PowerState::Off,
            sliders: SliderId::ALL.map(SliderState::new),
            render: RenderMode::Hidden,
            selection,
            initializing: false,
            overlay_interactive: false,
        }
    }

    pub fn slider(&self, id: SliderId) -> &SliderState {
        &self.sliders[id.index()]
    }

    pub fn slider_mut(&mut self, id: SliderId) -> &mut SliderState {
        &mut self.sliders[id.index()]
    }

    pub fn value(&self, id: SliderId) -> f32 {
        self.slider(id).current_value
    }

    /// Sliders are interactive only while the ring is on.
    pub fn sliders_enabled(&self) -> bool {
        self.power.is_on()
    }

    /// Current ring parameters, derived from the slider values.
    pub fn parameters(&self) -> RingParameters {
        RingParameters::new(
            self.value(SliderId::Thickness),
            self.value(SliderId::Brightness),
            self.value(SliderId::Size),
            self.value(SliderId::Warmth),
        )
    }

    pub(crate) fn set_value(&mut self, id: SliderId, value: f32) -> f32 {
        let value = clamp_percent(value);
        self.slider_mut(id).current_value = value;
        value
    }

    pub(crate) fn clear_drags(&mut self) {
        for slider in &mut self.sliders {
            slider.is_dragging = false;
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new(MonitorSelection::default())
    }
}

/// Timing constants of the control state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlTiming {
    /// Quiet period before a slider's value goes to the external control sink.
    pub debounce: Duration,
    /// How long toggles are ignored after a power change.
    pub toggle_cooldown: Duration,
}

impl Default for ControlTiming {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            toggle_cooldown: Duration::from_secs(1),
        }
    }
}
