//! Ring-light overlay core: display targeting, per-display overlay surfaces,
//! parameter broadcast and the control state machine that drives them.

pub mod bridge;
pub mod control;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod overlay;
pub mod settings;

#[cfg(test)]
mod testing;

pub use error::OverlayError;
