//! The state machine registry: an immutable (flow, step) → handler table.
//!
//! Built once at startup and shared by reference with the dispatcher. Each
//! handler is a pure function over the pending fields and the step input;
//! the flow modules under `crate::flows` register their steps here.

use crate::flows;
use crate::state_machine::effect::Effect;
use crate::state_machine::event::{ButtonPayload, InputKind};
use crate::state_machine::state::{FieldKey, FieldValue, FlowState, PendingFields};
use std::collections::HashMap;

/// Input for a single step invocation, already kind-checked by the
/// dispatcher.
#[derive(Debug, Clone, Copy)]
pub enum StepInput<'a> {
    Text(&'a str),
    Button(&'a ButtonPayload),
}

impl StepInput<'_> {
    pub fn kind(&self) -> InputKind {
        match self {
            StepInput::Text(_) => InputKind::Text,
            StepInput::Button(_) => InputKind::Button,
        }
    }
}

/// What a step handler decided.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Valid input: advance to `next`, merging `fields` into the pending set
    /// and executing `effects` in order.
    Continue {
        next: FlowState,
        fields: Vec<(FieldKey, FieldValue)>,
        effects: Vec<Effect>,
    },
    /// Invalid input: state unchanged, the user is re-prompted.
    Retry { message: String },
    /// Flow complete: execute `effects`, then clear the session.
    Terminate { effects: Vec<Effect> },
    /// Flow cancelled (corrupted session): clear without committing.
    Abort,
}

impl StepOutcome {
    pub fn retry(message: impl Into<String>) -> Self {
        StepOutcome::Retry {
            message: message.into(),
        }
    }

    /// The stock response for a payload outside the step's choice set.
    pub fn unexpected_input() -> Self {
        StepOutcome::retry("I wasn't expecting that. Please answer the current question.")
    }
}

pub type HandlerFn = fn(&PendingFields, StepInput<'_>) -> StepOutcome;

pub struct StepHandler {
    /// Which input kind this step accepts; the other kind is rejected with a
    /// generic retry before the handler runs.
    pub expects: InputKind,
    pub handle: HandlerFn,
}

/// Immutable dispatch table, one entry per (flow, step) pair.
pub struct Registry {
    table: HashMap<FlowState, StepHandler>,
}

impl Registry {
    pub fn new() -> Self {
        let mut table = HashMap::new();
        flows::onboarding::register(&mut table);
        flows::expense::register(&mut table);
        flows::income::register(&mut table);
        flows::account::register(&mut table);
        flows::debt::register(&mut table);
        flows::pay_debt::register(&mut table);
        flows::goal::register(&mut table);
        Self { table }
    }

    pub fn resolve(&self, state: FlowState) -> Option<&StepHandler> {
        self.table.get(&state)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper for flow modules: insert a step, panicking on a duplicate
/// registration (a startup-time programming error, not a runtime condition).
pub(crate) fn register_step(
    table: &mut HashMap<FlowState, StepHandler>,
    state: FlowState,
    expects: InputKind,
    handle: HandlerFn,
) {
    let previous = table.insert(state, StepHandler { expects, handle });
    assert!(
        previous.is_none(),
        "duplicate step registration for {state:?}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_flow_state_has_a_handler() {
        let registry = Registry::new();
        for state in FlowState::all() {
            assert!(
                registry.resolve(state).is_some(),
                "no handler registered for {state:?}"
            );
        }
        assert_eq!(registry.len(), FlowState::all().len());
    }

    #[test]
    fn handlers_reject_the_wrong_input_kind() {
        // The dispatcher kind-checks before invoking, but handlers must not
        // misbehave if fed the wrong variant anyway.
        let registry = Registry::new();
        let fields = PendingFields::default();
        for state in FlowState::all() {
            let handler = registry.resolve(state).unwrap();
            let wrong = match handler.expects {
                InputKind::Text => StepInput::Button(&ButtonPayload::Unknown),
                InputKind::Button => StepInput::Text("free text"),
            };
            let outcome = (handler.handle)(&fields, wrong);
            assert!(
                matches!(outcome, StepOutcome::Retry { .. }),
                "{state:?} accepted the wrong input kind"
            );
        }
    }
}
