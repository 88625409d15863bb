//! Add-expense flow: amount → category → optional description → commit.

use crate::domain::{fmt_money, points};
use crate::parse;
use crate::state_machine::registry::{register_step, StepHandler};
use crate::state_machine::state::ExpenseStep as S;
use crate::state_machine::{
    ButtonPayload, CommitAction, Effect, FieldKey, FieldValue, FlowState, InputKind, Outgoing,
    PendingFields, StepInput, StepOutcome,
};
use std::collections::HashMap;

pub fn entry() -> (FlowState, Outgoing) {
    (
        FlowState::AddExpense(S::AskAmount),
        Outgoing::text("💸 Enter the expense amount (numbers only):"),
    )
}

pub(crate) fn register(table: &mut HashMap<FlowState, StepHandler>) {
    register_step(table, FlowState::AddExpense(S::AskAmount), InputKind::Text, on_amount);
    register_step(table, FlowState::AddExpense(S::ChooseCategory), InputKind::Button, on_category);
    register_step(table, FlowState::AddExpense(S::DescribeOrSkip), InputKind::Button, on_describe_choice);
    register_step(table, FlowState::AddExpense(S::AskDescription), InputKind::Text, on_description);
}

fn on_amount(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(raw) = input else {
        return StepOutcome::unexpected_input();
    };
    let Some(amount) = parse::parse_amount(raw) else {
        return StepOutcome::retry("Please enter a valid amount");
    };
    StepOutcome::Continue {
        next: FlowState::AddExpense(S::ChooseCategory),
        fields: vec![(FieldKey::Amount, FieldValue::Amount(amount))],
        effects: vec![Effect::send(Outgoing::with_buttons(
            "Pick a category:",
            super::category_keyboard(),
        ))],
    }
}

fn on_category(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Button(ButtonPayload::Category(category)) = input else {
        return StepOutcome::unexpected_input();
    };
    StepOutcome::Continue {
        next: FlowState::AddExpense(S::DescribeOrSkip),
        fields: vec![(FieldKey::Category, FieldValue::Category(category))],
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
            next: FlowState::AddExpense(S::AskDescription),
            fields: vec![],
            effects: vec![Effect::send(Outgoing::text("Enter the expense description:"))],
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
    let (Some(amount), Some(category)) = (fields.amount(FieldKey::Amount), fields.category())
    else {
        return StepOutcome::Abort;
    };
    let confirmation = format!(
        "✅ Expense recorded: {}\nCategory: {}\n\n+{} XP!",
        fmt_money(amount),
        category,
        points::TRANSACTION
    );
    StepOutcome::Terminate {
        effects: vec![Effect::commit(
            CommitAction::RecordExpense {
                amount,
                category,
                description,
            },
            confirmation,
        )],
    }
}
