//! Add-account flow: type → name → balance → commit.

use crate::domain::{fmt_money, points, AccountKind};
use crate::parse;
use crate::state_machine::registry::{register_step, StepHandler};
use crate::state_machine::state::AccountStep as S;
use crate::state_machine::{
    ButtonPayload, CommitAction, Effect, FieldKey, FieldValue, FlowState, InputKind, Outgoing,
    PendingFields, StepInput, StepOutcome,
};
use std::collections::HashMap;

pub fn entry() -> (FlowState, Outgoing) {
    (
        FlowState::AddAccount(S::ChooseKind),
        Outgoing::with_buttons(
            "Pick an account type:",
            super::account_kind_keyboard(&AccountKind::ALL),
        ),
    )
}

pub(crate) fn register(table: &mut HashMap<FlowState, StepHandler>) {
    register_step(table, FlowState::AddAccount(S::ChooseKind), InputKind::Button, on_kind);
    register_step(table, FlowState::AddAccount(S::AskName), InputKind::Text, on_name);
    register_step(table, FlowState::AddAccount(S::AskBalance), InputKind::Text, on_balance);
}

fn on_kind(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Button(ButtonPayload::AccountKind(kind)) = input else {
        return StepOutcome::unexpected_input();
    };
    StepOutcome::Continue {
        next: FlowState::AddAccount(S::AskName),
        fields: vec![(FieldKey::AccountKind, FieldValue::AccountKind(*kind))],
        effects: vec![Effect::send(Outgoing::text(
            "What should this account be called? (e.g. Main card, Salary card):",
        ))],
    }
}

fn on_name(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(name) = input else {
        return StepOutcome::unexpected_input();
    };
    StepOutcome::Continue {
        next: FlowState::AddAccount(S::AskBalance),
        fields: vec![(FieldKey::AccountName, FieldValue::Text(name.to_string()))],
        effects: vec![Effect::send(Outgoing::text(
            "What is the current balance on this account? (numbers only)",
        ))],
    }
}

fn on_balance(fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(raw) = input else {
        return StepOutcome::unexpected_input();
    };
    let Some(balance) = parse::parse_amount(raw) else {
        return StepOutcome::retry("Please enter a valid amount");
    };
    let (Some(kind), Some(name)) = (fields.account_kind(), fields.text(FieldKey::AccountName))
    else {
        return StepOutcome::Abort;
    };
    let confirmation = format!(
        "✅ Account added: {} — {}\n\n+{} XP!",
        name,
        fmt_money(balance),
        points::ACCOUNT_ADDED
    );
    StepOutcome::Terminate {
        effects: vec![Effect::commit(
            CommitAction::CreateAccount {
                kind,
                name: name.to_string(),
                balance,
            },
            confirmation,
        )],
    }
}
