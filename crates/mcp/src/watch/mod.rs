//! Streaming observation of a single workflow.
//!
//! [`observe`] opens one event subscription, folds every workflow snapshot
//! into an [`InterpretedState`], and stops at the first terminal phase, a
//! clean stream close, the deadline, or caller cancellation. The result is an
//! [`OutputRecord`] that the tool layer serializes or renders as a narrative.

mod controller;
mod duration;
mod error;
mod interpret;
mod scope;
mod synthesize;
mod target;

pub use controller::{ObserveOptions, StopReason, observe};
pub use duration::{DurationParseError, MAX_TIMEOUT, format_duration, format_time_delta, format_timeout, parse_positive_duration};
pub use error::WatchError;
pub use interpret::{InterpretedState, interpret};
pub use synthesize::{EventSummary, NO_EVENTS_MESSAGE, OutputRecord, UNKNOWN_PHASE, render_narrative};
pub use target::WatchTarget;
