//! Conversation flow and step types.

use crate::domain::{AccountKind, DebtId, GoalKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Flow steps
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    AskHasDebts,
    AskDebtName,
    AskDebtAmount,
    AskDebtRate,
    AskDebtPayment,
    AskDebtDueDay,
    ChooseStrategy,
    AskIncome,
    ChooseAccountType,
    AskAccountName,
    AskAccountBalance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStep {
    AskAmount,
    ChooseCategory,
    DescribeOrSkip,
    AskDescription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeStep {
    AskAmount,
    DescribeOrSkip,
    AskDescription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStep {
    ChooseKind,
    AskName,
    AskBalance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStep {
    AskName,
    AskAmount,
    AskRate,
    AskPayment,
    AskDueDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayDebtStep {
    ChooseDebt,
    AskAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStep {
    ChooseKind,
    AskName,
    AskTarget,
}

/// Where a conversation currently is. Absence of a session record means no
/// flow is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "flow", content = "step", rename_all = "snake_case")]
pub enum FlowState {
    Onboarding(OnboardingStep),
    AddExpense(ExpenseStep),
    AddIncome(IncomeStep),
    AddAccount(AccountStep),
    AddDebt(DebtStep),
    PayDebt(PayDebtStep),
    AddGoal(GoalStep),
}

impl FlowState {
    pub fn flow_name(self) -> &'static str {
        match self {
            FlowState::Onboarding(_) => "onboarding",
            FlowState::AddExpense(_) => "add_expense",
            FlowState::AddIncome(_) => "add_income",
            FlowState::AddAccount(_) => "add_account",
            FlowState::AddDebt(_) => "add_debt",
            FlowState::PayDebt(_) => "pay_debt",
            FlowState::AddGoal(_) => "add_goal",
        }
    }

    /// Every reachable (flow, step) pair. Used to prove registry coverage.
    pub fn all() -> Vec<FlowState> {
        let mut states = Vec::new();
        states.extend(
            [
                OnboardingStep::AskHasDebts,
                OnboardingStep::AskDebtName,
                OnboardingStep::AskDebtAmount,
                OnboardingStep::AskDebtRate,
                OnboardingStep::AskDebtPayment,
                OnboardingStep::AskDebtDueDay,
                OnboardingStep::ChooseStrategy,
                OnboardingStep::AskIncome,
                OnboardingStep::ChooseAccountType,
                OnboardingStep::AskAccountName,
                OnboardingStep::AskAccountBalance,
            ]
            .map(FlowState::Onboarding),
        );
        states.extend(
            [
                ExpenseStep::AskAmount,
                ExpenseStep::ChooseCategory,
                ExpenseStep::DescribeOrSkip,
                ExpenseStep::AskDescription,
            ]
            .map(FlowState::AddExpense),
        );
        states.extend(
            [
                IncomeStep::AskAmount,
                IncomeStep::DescribeOrSkip,
                IncomeStep::AskDescription,
            ]
            .map(FlowState::AddIncome),
        );
        states.extend(
            [
                AccountStep::ChooseKind,
                AccountStep::AskName,
                AccountStep::AskBalance,
            ]
            .map(FlowState::AddAccount),
        );
        states.extend(
            [
                DebtStep::AskName,
                DebtStep::AskAmount,
                DebtStep::AskRate,
                DebtStep::AskPayment,
                DebtStep::AskDueDay,
            ]
            .map(FlowState::AddDebt),
        );
        states.extend([PayDebtStep::ChooseDebt, PayDebtStep::AskAmount].map(FlowState::PayDebt));
        states.extend(
            [GoalStep::ChooseKind, GoalStep::AskName, GoalStep::AskTarget].map(FlowState::AddGoal),
        );
        states
    }
}

// ============================================================================
// Pending fields
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    DebtName,
    DebtAmount,
    DebtRate,
    DebtPayment,
    Amount,
    Category,
    AccountKind,
    AccountName,
    GoalKind,
    GoalName,
    DebtId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Amount(Decimal),
    AccountKind(AccountKind),
    Category(&'static str),
    GoalKind(GoalKind),
    DebtId(DebtId),
}

/// Accumulated, not-yet-committed input for the in-progress flow instance.
///
/// Typed accessors return `None` on a missing key or a type mismatch; a
/// handler that hits that case aborts the flow rather than guessing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingFields(HashMap<FieldKey, FieldValue>);

impl PendingFields {
    pub fn insert(&mut self, key: FieldKey, value: FieldValue) {
        self.0.insert(key, value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn text(&self, key: FieldKey) -> Option<&str> {
        match self.0.get(&key) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn amount(&self, key: FieldKey) -> Option<Decimal> {
        match self.0.get(&key) {
            Some(FieldValue::Amount(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn account_kind(&self) -> Option<AccountKind> {
        match self.0.get(&FieldKey::AccountKind) {
            Some(FieldValue::AccountKind(k)) => Some(*k),
            _ => None,
        }
    }

    pub fn category(&self) -> Option<&'static str> {
        match self.0.get(&FieldKey::Category) {
            Some(FieldValue::Category(c)) => Some(c),
            _ => None,
        }
    }

    pub fn goal_kind(&self) -> Option<GoalKind> {
        match self.0.get(&FieldKey::GoalKind) {
            Some(FieldValue::GoalKind(k)) => Some(*k),
            _ => None,
        }
    }

    pub fn debt_id(&self) -> Option<DebtId> {
        match self.0.get(&FieldKey::DebtId) {
            Some(FieldValue::DebtId(id)) => Some(*id),
            _ => None,
        }
    }
}

/// One conversation's active flow: the current step plus its pending fields.
/// Stored and replaced as a unit so state and fields never diverge.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub state: FlowState,
    pub fields: PendingFields,
}

impl Session {
    pub fn new(state: FlowState) -> Self {
        Self {
            state,
            fields: PendingFields::default(),
        }
    }
}
