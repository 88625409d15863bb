//! Effects requested by step handlers.
//!
//! Handlers are pure: they describe what should happen (send a message,
//! commit a record) and the dispatcher is the only component that performs
//! the I/O.

use crate::domain::{AccountKind, DebtId, DebtStrategy, GoalKind};
use crate::state_machine::event::ButtonPayload;
use rust_decimal::Decimal;
use serde::Serialize;

/// One button of an outgoing keyboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ButtonSpec {
    pub label: String,
    pub data: String,
}

impl ButtonSpec {
    pub fn new(label: impl Into<String>, payload: &ButtonPayload) -> Self {
        Self {
            label: label.into(),
            data: payload.encode(),
        }
    }
}

/// An output instruction: text plus an optional choice set. The dispatcher
/// hands these to the output sink verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outgoing {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<ButtonSpec>,
}

impl Outgoing {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    pub fn with_buttons(text: impl Into<String>, buttons: Vec<ButtonSpec>) -> Self {
        Self {
            text: text.into(),
            buttons,
        }
    }
}

/// A write-through to the persistence collaborator. Each action awards its
/// score exactly once when executed.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitAction {
    CreateDebt {
        name: String,
        amount: Decimal,
        rate: Decimal,
        min_payment: Decimal,
        due_day: u8,
    },
    SetStrategy(DebtStrategy),
    SetMonthlyIncome(Decimal),
    CreateAccount {
        kind: AccountKind,
        name: String,
        balance: Decimal,
    },
    /// Marks the profile complete and produces the welcome/level output.
    FinishOnboarding,
    RecordExpense {
        amount: Decimal,
        category: &'static str,
        description: String,
    },
    RecordIncome {
        amount: Decimal,
        description: String,
    },
    CreateGoal {
        kind: GoalKind,
        name: String,
        target: Decimal,
    },
    RecordDebtPayment {
        debt_id: DebtId,
        amount: Decimal,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Deliver a message to the conversation.
    Send(Outgoing),
    /// Persist a record and award its score; the confirmation is delivered
    /// afterwards, with a level-up line appended when one fires.
    Commit {
        action: CommitAction,
        confirmation: String,
    },
}

impl Effect {
    pub fn send(message: Outgoing) -> Self {
        Effect::Send(message)
    }

    pub fn commit(action: CommitAction, confirmation: impl Into<String>) -> Self {
        Effect::Commit {
            action,
            confirmation: confirmation.into(),
        }
    }
}
