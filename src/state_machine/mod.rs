//! Per-user conversation state machine.
//!
//! Pure state transitions: step handlers validate input and declare the next
//! state plus effects; all I/O lives in the dispatcher.

pub mod effect;
pub mod event;
pub mod registry;
pub mod state;

#[cfg(test)]
mod proptests;

pub use effect::{ButtonSpec, CommitAction, Effect, Outgoing};
pub use event::{ButtonPayload, Command, InboundEvent, Incoming, InputKind};
pub use registry::{Registry, StepHandler, StepInput, StepOutcome};
pub use state::{FieldKey, FieldValue, FlowState, PendingFields, Session};
