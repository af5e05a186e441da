//! Trading decision logic.
//!
//! - [`SignalEngine`] / [`compute_signal`]: last close against the SMA of
//!   the window
//! - [`PositionReconciler`]: close/open actions for a signal and the
//!   positions currently held

mod reconciler;
mod signal;

pub use reconciler::PositionReconciler;
pub use signal::{compute_signal, SignalEngine};
