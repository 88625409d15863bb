//! Add-income flow: amount → optional description → commit.

use crate::domain::{fmt_money, points};
use crate::parse;
use crate::state_machine::registry::{register_step, StepHandler};
use crate::state_machine::state::IncomeStep as S;
use crate::state_machine::{
    ButtonPayload, CommitAction, Effect, FieldKey, FieldValue, FlowState, InputKind, Outgoing,
    PendingFields, StepInput, StepOutcome,
};
use std::collections::HashMap;

pub fn entry() -> (FlowState, Outgoing) {
    (
        FlowState::AddIncome(S::AskAmount),
        Outgoing::text("💰 Enter the income amount:"),
    )
}

pub(crate) fn register(table: &mut HashMap<FlowState, StepHandler>) {
    register_step(table, FlowState::AddIncome(S::AskAmount), InputKind::Text, on_amount);
    register_step(table, FlowState::AddIncome(S::DescribeOrSkip), InputKind::Button, on_describe_choice);
    register_step(table, FlowState::AddIncome(S::AskDescription), InputKind::Text, on_description);
}

fn on_amount(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(raw) = input else {
        return StepOutcome::unexpected_input();
    };
    let Some(amount) = parse::parse_amount(raw) else {
        return StepOutcome::retry("Please enter a valid amount");
    };
    StepOutcome::Continue {
        next: FlowState::AddIncome(S::DescribeOrSkip),
        fields: vec![(FieldKey::Amount, FieldValue::Amount(amount))],
        effects: vec![Effect::send(Outgoing::with_buttons(
            "Add a description?",
            super::describe_or_skip_keyboard(),
        ))],
    }
}

fn on_describe_choice(fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    match input {
        StepInput::Button(ButtonPayload::Skip) => commit(fields, String::new()),
        StepInput::Button(ButtonPayload::Describe) => StepOutcome::Continue {
            next: FlowState::AddIncome(S::AskDescription),
            fields: vec![],
            effects: vec![Effect::send(Outgoing::text("Enter the income description:"))],
        },
        _ => StepOutcome::unexpected_input(),
    }
}

fn on_description(fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(description) = input else {
        return StepOutcome::unexpected_input();
    };
    commit(fields, description.to_string())
}

fn commit(fields: &PendingFields, description: String) -> StepOutcome {
    let Some(amount) = fields.amount(FieldKey::Amount) else {
        return StepOutcome::Abort;
    };
    let confirmation = format!(
        "✅ Income recorded: {}\n\n+{} XP!",
        fmt_money(amount),
        points::TRANSACTION
    );
    StepOutcome::Terminate {
        effects: vec![Effect::commit(
            CommitAction::RecordIncome {
                amount,
                description,
            },
            confirmation,
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn amount_advances_to_describe_choice() {
        let outcome = on_amount(&PendingFields::default(), StepInput::Text("120 000"));
        let StepOutcome::Continue { next, fields, .. } = outcome else {
            panic!("expected Continue");
        };
        assert_eq!(next, FlowState::AddIncome(S::DescribeOrSkip));
        assert_eq!(
            fields,
            vec![(FieldKey::Amount, FieldValue::Amount(Decimal::from(120_000)))]
        );
    }

    #[test]
    fn skip_commits_immediately() {
        let mut fields = PendingFields::default();
        fields.insert(FieldKey::Amount, FieldValue::Amount(Decimal::from(500)));
        let outcome = on_describe_choice(&fields, StepInput::Button(&ButtonPayload::Skip));
        assert!(matches!(outcome, StepOutcome::Terminate { .. }));
    }

    #[test]
    fn commit_without_amount_aborts() {
        let outcome =
            on_describe_choice(&PendingFields::default(), StepInput::Button(&ButtonPayload::Skip));
        assert_eq!(outcome, StepOutcome::Abort);
    }
}
