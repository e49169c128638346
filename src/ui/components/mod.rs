pub mod option_mark;
pub mod slider;
pub mod switch;

pub use option_mark::option_mark;
pub use slider::{TrackBounds, ring_slider};
pub use switch::switch;
