//! Flow definitions: one module per conversation, each registering its steps
//! into the state machine registry and exposing its entry prompt.

pub mod account;
pub mod debt;
pub mod expense;
pub mod goal;
pub mod income;
pub mod onboarding;
pub mod pay_debt;

use crate::domain::{fmt_money, AccountKind, Debt, DebtStrategy, GoalKind, CATEGORIES};
use crate::state_machine::{ButtonPayload, ButtonSpec};

// Keyboard builders shared between flows.

pub(crate) fn yes_no_keyboard() -> Vec<ButtonSpec> {
    vec![
        ButtonSpec::new("Yes", &ButtonPayload::Yes),
        ButtonSpec::new("No", &ButtonPayload::No),
    ]
}

pub(crate) fn strategy_keyboard() -> Vec<ButtonSpec> {
    DebtStrategy::ALL
        .iter()
        .map(|s| ButtonSpec::new(s.label(), &ButtonPayload::Strategy(*s)))
        .collect()
}

pub(crate) fn account_kind_keyboard(kinds: &[AccountKind]) -> Vec<ButtonSpec> {
    kinds
        .iter()
        .map(|k| ButtonSpec::new(k.label(), &ButtonPayload::AccountKind(*k)))
        .collect()
}

pub(crate) fn category_keyboard() -> Vec<ButtonSpec> {
    CATEGORIES
        .iter()
        .map(|c| ButtonSpec::new(c.name, &ButtonPayload::Category(c.name)))
        .collect()
}

pub(crate) fn goal_kind_keyboard() -> Vec<ButtonSpec> {
    GoalKind::ALL
        .iter()
        .map(|g| ButtonSpec::new(g.label(), &ButtonPayload::GoalKind(*g)))
        .collect()
}

pub(crate) fn describe_or_skip_keyboard() -> Vec<ButtonSpec> {
    vec![
        ButtonSpec::new("✍️ Add a description", &ButtonPayload::Describe),
        ButtonSpec::new("⏭ Skip", &ButtonPayload::Skip),
    ]
}

pub(crate) fn debt_keyboard(debts: &[Debt]) -> Vec<ButtonSpec> {
    debts
        .iter()
        .map(|d| {
            ButtonSpec::new(
                format!("{} — {} left", d.name, fmt_money(d.remaining)),
                &ButtonPayload::Debt(d.id),
            )
        })
        .collect()
}
