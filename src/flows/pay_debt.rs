//! Pay-debt flow: pick one of the active debts, then enter the payment.
//!
//! The entry keyboard is data-dependent (it lists the caller's active debts),
//! so the dispatcher builds it from a persistence read before opening the
//! flow. Ownership of the selected debt id is re-checked at commit time.

use crate::domain::{fmt_money, points, Debt};
use crate::parse;
use crate::state_machine::registry::{register_step, StepHandler};
use crate::state_machine::state::PayDebtStep as S;
use crate::state_machine::{
    ButtonPayload, CommitAction, Effect, FieldKey, FieldValue, FlowState, InputKind, Outgoing,
    PendingFields, StepInput, StepOutcome,
};
use std::collections::HashMap;

pub fn entry(debts: &[Debt]) -> (FlowState, Outgoing) {
    (
        FlowState::PayDebt(S::ChooseDebt),
        Outgoing::with_buttons("Which debt are you paying?", super::debt_keyboard(debts)),
    )
}

pub(crate) fn register(table: &mut HashMap<FlowState, StepHandler>) {
    register_step(table, FlowState::PayDebt(S::ChooseDebt), InputKind::Button, on_choose_debt);
    register_step(table, FlowState::PayDebt(S::AskAmount), InputKind::Text, on_amount);
}

fn on_choose_debt(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Button(ButtonPayload::Debt(debt_id)) = input else {
        return StepOutcome::unexpected_input();
    };
    StepOutcome::Continue {
        next: FlowState::PayDebt(S::AskAmount),
        fields: vec![(FieldKey::DebtId, FieldValue::DebtId(*debt_id))],
        effects: vec![Effect::send(Outgoing::text(
            "Enter the payment amount (numbers only):",
        ))],
    }
}

fn on_amount(fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(raw) = input else {
        return StepOutcome::unexpected_input();
    };
    let Some(amount) = parse::parse_amount(raw) else {
        return StepOutcome::retry("Please enter a valid payment amount");
    };
    let Some(debt_id) = fields.debt_id() else {
        return StepOutcome::Abort;
    };
    let confirmation = format!(
        "✅ Payment recorded: {}\n\n+{} XP!",
        fmt_money(amount),
        points::DEBT_PAYMENT
    );
    StepOutcome::Terminate {
        effects: vec![Effect::commit(
            CommitAction::RecordDebtPayment { debt_id, amount },
            confirmation,
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn selection_stores_the_debt_id() {
        let outcome = on_choose_debt(
            &PendingFields::default(),
            StepInput::Button(&ButtonPayload::Debt(7)),
        );
        let StepOutcome::Continue { next, fields, .. } = outcome else {
            panic!("expected Continue");
        };
        assert_eq!(next, FlowState::PayDebt(S::AskAmount));
        assert_eq!(fields, vec![(FieldKey::DebtId, FieldValue::DebtId(7))]);
    }

    #[test]
    fn payment_commits_against_the_selected_debt() {
        let mut fields = PendingFields::default();
        fields.insert(FieldKey::DebtId, FieldValue::DebtId(7));
        let outcome = on_amount(&fields, StepInput::Text("5 000"));
        let StepOutcome::Terminate { effects } = outcome else {
            panic!("expected Terminate");
        };
        assert!(matches!(
            &effects[0],
            Effect::Commit {
                action: CommitAction::RecordDebtPayment {
                    debt_id: 7,
                    amount
                },
                ..
            } if *amount == Decimal::from(5_000)
        ));
    }

    #[test]
    fn non_debt_button_retries() {
        let outcome = on_choose_debt(
            &PendingFields::default(),
            StepInput::Button(&ButtonPayload::Yes),
        );
        assert!(matches!(outcome, StepOutcome::Retry { .. }));
    }
}
