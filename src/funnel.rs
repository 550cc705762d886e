//! Intake funnel state machine
//!
//! Pure stage transitions in the Elm Architecture style: the transition
//! function never performs I/O, it returns the next stage, the change to the
//! captured client data and a list of effects for the runtime to execute.

mod effect;
pub mod event;
pub mod stage;
pub(crate) mod texts;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{ChatTarget, Effect, Keyboard};
pub use event::Event;
pub use stage::{Capture, ChatId, ClientProfile, FunnelContext, MessageId, PhotoRef, Stage};
pub use transition::{transition, CaptureUpdate};
#[allow(unused_imports)] // Public API re-exports
pub use transition::{TransitionError, TransitionResult};
