//! Add-debt flow: name → amount → rate → minimum payment → due day → commit.

use crate::domain::{fmt_money, points};
use crate::parse;
use crate::state_machine::registry::{register_step, StepHandler};
use crate::state_machine::state::DebtStep as S;
use crate::state_machine::{
    CommitAction, Effect, FieldKey, FieldValue, FlowState, InputKind, Outgoing, PendingFields,
    StepInput, StepOutcome,
};
use std::collections::HashMap;

pub fn entry() -> (FlowState, Outgoing) {
    (
        FlowState::AddDebt(S::AskName),
        Outgoing::text("What is the debt called? (e.g. Bank loan, Money owed to a friend):"),
    )
}

pub(crate) fn register(table: &mut HashMap<FlowState, StepHandler>) {
    register_step(table, FlowState::AddDebt(S::AskName), InputKind::Text, on_name);
    register_step(table, FlowState::AddDebt(S::AskAmount), InputKind::Text, on_amount);
    register_step(table, FlowState::AddDebt(S::AskRate), InputKind::Text, on_rate);
    register_step(table, FlowState::AddDebt(S::AskPayment), InputKind::Text, on_payment);
    register_step(table, FlowState::AddDebt(S::AskDueDay), InputKind::Text, on_due_day);
}

fn on_name(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(name) = input else {
        return StepOutcome::unexpected_input();
    };
    StepOutcome::Continue {
        next: FlowState::AddDebt(S::AskAmount),
        fields: vec![(FieldKey::DebtName, FieldValue::Text(name.to_string()))],
        effects: vec![Effect::send(Outgoing::text(
            "What is the total amount owed? (numbers only)",
        ))],
    }
}

fn on_amount(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(raw) = input else {
        return StepOutcome::unexpected_input();
    };
    let Some(amount) = parse::parse_amount(raw) else {
        return StepOutcome::retry("Please enter a valid amount (numbers only)");
    };
    StepOutcome::Continue {
        next: FlowState::AddDebt(S::AskRate),
        fields: vec![(FieldKey::DebtAmount, FieldValue::Amount(amount))],
        effects: vec![Effect::send(Outgoing::text(
            "What is the interest rate? (e.g. 15.5)",
        ))],
    }
}

fn on_rate(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(raw) = input else {
        return StepOutcome::unexpected_input();
    };
    let Some(rate) = parse::parse_rate(raw) else {
        return StepOutcome::retry("Please enter a valid interest rate");
    };
    StepOutcome::Continue {
        next: FlowState::AddDebt(S::AskPayment),
        fields: vec![(FieldKey::DebtRate, FieldValue::Amount(rate))],
        effects: vec![Effect::send(Outgoing::text(
            "What is the minimum monthly payment? (numbers only)",
        ))],
    }
}

fn on_payment(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(raw) = input else {
        return StepOutcome::unexpected_input();
    };
    let Some(payment) = parse::parse_amount(raw) else {
        return StepOutcome::retry("Please enter a valid payment amount");
    };
    StepOutcome::Continue {
        next: FlowState::AddDebt(S::AskDueDay),
        fields: vec![(FieldKey::DebtPayment, FieldValue::Amount(payment))],
        effects: vec![Effect::send(Outgoing::text(
            "What day of the month is the payment due? (e.g. 15)",
        ))],
    }
}

fn on_due_day(fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(raw) = input else {
        return StepOutcome::unexpected_input();
    };
    let Some(due_day) = parse::parse_day(raw) else {
        return StepOutcome::retry("Please enter a day between 1 and 31");
    };
    let (Some(name), Some(amount), Some(rate), Some(min_payment)) = (
        fields.text(FieldKey::DebtName),
        fields.amount(FieldKey::DebtAmount),
        fields.amount(FieldKey::DebtRate),
        fields.amount(FieldKey::DebtPayment),
    ) else {
        return StepOutcome::Abort;
    };
    let confirmation = format!(
        "✅ Debt added: {} — {}\n\nTrack it with /debts\n\n+{} XP!",
        name,
        fmt_money(amount),
        points::DEBT_ADDED
    );
    StepOutcome::Terminate {
        effects: vec![Effect::commit(
            CommitAction::CreateDebt {
                name: name.to_string(),
                amount,
                rate,
                min_payment,
                due_day,
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
    fn rate_without_bounds_is_accepted() {
        let outcome = on_rate(&PendingFields::default(), StepInput::Text("150"));
        assert!(matches!(outcome, StepOutcome::Continue { .. }));
    }

    #[test]
    fn due_day_terminates_with_full_debt() {
        let mut fields = PendingFields::default();
        fields.insert(FieldKey::DebtName, FieldValue::Text("Car loan".into()));
        fields.insert(FieldKey::DebtAmount, FieldValue::Amount(Decimal::from(800_000)));
        fields.insert(FieldKey::DebtRate, FieldValue::Amount(Decimal::new(99, 1)));
        fields.insert(FieldKey::DebtPayment, FieldValue::Amount(Decimal::from(22_000)));

        let outcome = on_due_day(&fields, StepInput::Text("5"));
        let StepOutcome::Terminate { effects } = outcome else {
            panic!("expected Terminate");
        };
        assert!(matches!(
            &effects[0],
            Effect::Commit {
                action: CommitAction::CreateDebt { due_day: 5, .. },
                ..
            }
        ));
    }

    #[test]
    fn fractional_day_retries() {
        assert!(matches!(
            on_due_day(&PendingFields::default(), StepInput::Text("15.5")),
            StepOutcome::Retry { .. }
        ));
    }
}
