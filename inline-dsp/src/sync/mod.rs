//! Lock-free handoff between the audio task and the control task.
//!
//! | Direction | Type | Carries |
//! |-----------|------|---------|
//! | control → audio | [`ParamCell`] | whole configuration records |
//! | audio → control | [`EventQueue`] | limiter transitions |

pub mod param_cell;
pub mod event_queue;

pub use param_cell::{ParamCell, Publisher, Subscriber};
pub use event_queue::{EventQueue, EventReceiver, EventSender};
