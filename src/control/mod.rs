pub mod debounce;
pub mod machine;
pub mod sink;
pub mod state;

pub use debounce::DebounceTable;
pub use machine::{ControllerOptions, RingController};
pub use sink::{ControlKind, ControlSink, LoggingSink};
pub use state::{ControlState, ControlTiming, PowerState, RenderMode, SliderId, SliderState};
