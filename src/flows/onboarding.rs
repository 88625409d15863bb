//! Onboarding: eleven ordered steps with one branch at the has-debts
//! question. Debt, strategy, and income are committed mid-flow as soon as
//! they are complete, matching the conversational rhythm of prompting and
//! confirming one thing at a time.

use crate::domain::{fmt_money, points, AccountKind, BudgetGroup};
use crate::parse;
use crate::state_machine::registry::{register_step, StepHandler};
use crate::state_machine::state::OnboardingStep as S;
use crate::state_machine::{
    ButtonPayload, CommitAction, Effect, FieldKey, FieldValue, FlowState, InputKind, Outgoing,
    PendingFields, StepInput, StepOutcome,
};
use std::collections::HashMap;

pub fn entry() -> (FlowState, Outgoing) {
    (
        FlowState::Onboarding(S::AskHasDebts),
        Outgoing::with_buttons(
            "📊 Do you currently have any debts or loans?",
            super::yes_no_keyboard(),
        ),
    )
}

pub(crate) fn register(table: &mut HashMap<FlowState, StepHandler>) {
    register_step(table, FlowState::Onboarding(S::AskHasDebts), InputKind::Button, on_has_debts);
    register_step(table, FlowState::Onboarding(S::AskDebtName), InputKind::Text, on_debt_name);
    register_step(table, FlowState::Onboarding(S::AskDebtAmount), InputKind::Text, on_debt_amount);
    register_step(table, FlowState::Onboarding(S::AskDebtRate), InputKind::Text, on_debt_rate);
    register_step(table, FlowState::Onboarding(S::AskDebtPayment), InputKind::Text, on_debt_payment);
    register_step(table, FlowState::Onboarding(S::AskDebtDueDay), InputKind::Text, on_debt_due_day);
    register_step(table, FlowState::Onboarding(S::ChooseStrategy), InputKind::Button, on_strategy);
    register_step(table, FlowState::Onboarding(S::AskIncome), InputKind::Text, on_income);
    register_step(table, FlowState::Onboarding(S::ChooseAccountType), InputKind::Button, on_account_type);
    register_step(table, FlowState::Onboarding(S::AskAccountName), InputKind::Text, on_account_name);
    register_step(table, FlowState::Onboarding(S::AskAccountBalance), InputKind::Text, on_account_balance);
}

fn on_has_debts(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    match input {
        StepInput::Button(ButtonPayload::Yes) => StepOutcome::Continue {
            next: FlowState::Onboarding(S::AskDebtName),
            fields: vec![],
            effects: vec![Effect::send(Outgoing::text(
                "Let's add your first debt.\n\nWhat is it called? (e.g. Bank loan, Money owed to a friend):",
            ))],
        },
        StepInput::Button(ButtonPayload::No) => StepOutcome::Continue {
            next: FlowState::Onboarding(S::AskIncome),
            fields: vec![],
            effects: vec![Effect::send(Outgoing::text(
                "Great, no debts! 🎉\n\nWhat is your average monthly income?",
            ))],
        },
        _ => StepOutcome::unexpected_input(),
    }
}

fn on_debt_name(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(name) = input else {
        return StepOutcome::unexpected_input();
    };
    StepOutcome::Continue {
        next: FlowState::Onboarding(S::AskDebtAmount),
        fields: vec![(FieldKey::DebtName, FieldValue::Text(name.to_string()))],
        effects: vec![Effect::send(Outgoing::text(
            "What is the total amount owed? (numbers only)",
        ))],
    }
}

fn on_debt_amount(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(raw) = input else {
        return StepOutcome::unexpected_input();
    };
    let Some(amount) = parse::parse_amount(raw) else {
        return StepOutcome::retry("Please enter a valid amount (numbers only)");
    };
    StepOutcome::Continue {
        next: FlowState::Onboarding(S::AskDebtRate),
        fields: vec![(FieldKey::DebtAmount, FieldValue::Amount(amount))],
        effects: vec![Effect::send(Outgoing::text(
            "What is the interest rate? (e.g. 15.5)",
        ))],
    }
}

fn on_debt_rate(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(raw) = input else {
        return StepOutcome::unexpected_input();
    };
    let Some(rate) = parse::parse_rate(raw) else {
        return StepOutcome::retry("Please enter a valid interest rate");
    };
    StepOutcome::Continue {
        next: FlowState::Onboarding(S::AskDebtPayment),
        fields: vec![(FieldKey::DebtRate, FieldValue::Amount(rate))],
        effects: vec![Effect::send(Outgoing::text(
            "What is the minimum monthly payment? (numbers only)",
        ))],
    }
}

fn on_debt_payment(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(raw) = input else {
        return StepOutcome::unexpected_input();
    };
    let Some(payment) = parse::parse_amount(raw) else {
        return StepOutcome::retry("Please enter a valid payment amount");
    };
    StepOutcome::Continue {
        next: FlowState::Onboarding(S::AskDebtDueDay),
        fields: vec![(FieldKey::DebtPayment, FieldValue::Amount(payment))],
        effects: vec![Effect::send(Outgoing::text(
            "What day of the month is the payment due? (e.g. 15)",
        ))],
    }
}

fn on_debt_due_day(fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
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
        "✅ Debt added: {} — {}\n\n+{} XP!",
        name,
        fmt_money(amount),
        points::DEBT_ADDED
    );
    StepOutcome::Continue {
        next: FlowState::Onboarding(S::ChooseStrategy),
        fields: vec![],
        effects: vec![
            Effect::commit(
                CommitAction::CreateDebt {
                    name: name.to_string(),
                    amount,
                    rate,
                    min_payment,
                    due_day,
                },
                confirmation,
            ),
            Effect::send(Outgoing::with_buttons(
                "💡 Pick a debt paydown strategy:\n\n\
                 🔥 Avalanche — highest interest rate first\n\
                 ❄️ Snowball — smallest debt first\n\
                 ⚡️ Hybrid — a mix of both",
                super::strategy_keyboard(),
            )),
        ],
    }
}

fn on_strategy(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Button(ButtonPayload::Strategy(strategy)) = input else {
        return StepOutcome::unexpected_input();
    };
    StepOutcome::Continue {
        next: FlowState::Onboarding(S::AskIncome),
        fields: vec![],
        effects: vec![
            Effect::commit(
                CommitAction::SetStrategy(*strategy),
                format!("✅ Strategy selected: {}", strategy.label()),
            ),
            Effect::send(Outgoing::text(
                "💵 What is your average monthly income?",
            )),
        ],
    }
}

fn on_income(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(raw) = input else {
        return StepOutcome::unexpected_input();
    };
    let Some(income) = parse::parse_amount(raw) else {
        return StepOutcome::retry("Please enter a valid income amount");
    };
    let confirmation = format!(
        "✅ Income saved: {}\n\n📊 50/30/20 budget:\n\
         • Essentials (50%): {}\n\
         • Lifestyle (30%): {}\n\
         • Savings (20%): {}\n\n+{} XP!",
        fmt_money(income),
        fmt_money(income * BudgetGroup::Essentials.share()),
        fmt_money(income * BudgetGroup::Lifestyle.share()),
        fmt_money(income * BudgetGroup::Savings.share()),
        points::INCOME_SET
    );
    StepOutcome::Continue {
        next: FlowState::Onboarding(S::ChooseAccountType),
        fields: vec![],
        effects: vec![
            Effect::commit(CommitAction::SetMonthlyIncome(income), confirmation),
            Effect::send(Outgoing::with_buttons(
                "Add your first account:",
                super::account_kind_keyboard(&AccountKind::ONBOARDING),
            )),
        ],
    }
}

fn on_account_type(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Button(ButtonPayload::AccountKind(kind)) = input else {
        return StepOutcome::unexpected_input();
    };
    StepOutcome::Continue {
        next: FlowState::Onboarding(S::AskAccountName),
        fields: vec![(FieldKey::AccountKind, FieldValue::AccountKind(*kind))],
        effects: vec![Effect::send(Outgoing::text(
            "What should this account be called? (e.g. Main card, Salary card):",
        ))],
    }
}

fn on_account_name(_fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
    let StepInput::Text(name) = input else {
        return StepOutcome::unexpected_input();
    };
    StepOutcome::Continue {
        next: FlowState::Onboarding(S::AskAccountBalance),
        fields: vec![(FieldKey::AccountName, FieldValue::Text(name.to_string()))],
        effects: vec![Effect::send(Outgoing::text(
            "What is the current balance on this account? (numbers only)",
        ))],
    }
}

fn on_account_balance(fields: &PendingFields, input: StepInput<'_>) -> StepOutcome {
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
    StepOutcome::Terminate {
        effects: vec![
            // The welcome message produced by FinishOnboarding covers the
            // account confirmation, so this commit stays silent.
            Effect::commit(
                CommitAction::CreateAccount {
                    kind,
                    name: name.to_string(),
                    balance,
                },
                String::new(),
            ),
            Effect::commit(CommitAction::FinishOnboarding, String::new()),
        ],
    }
}
