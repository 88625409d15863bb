//! In-memory test doubles for the dispatcher's collaborators.

use crate::dispatch::{OutputSink, Persistence};
use crate::domain::{
    Account, AccountKind, Debt, DebtId, DebtPayment, DebtStrategy, Goal, GoalKind, LevelUp,
    MonthSummary, ProgressStats, TxKind, UserId, UserProfile, DEBT_PAYDOWN_CATEGORY, LEVELS,
};
use crate::state_machine::Outgoing;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct TxRecord {
    pub kind: TxKind,
    pub amount: Decimal,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: HashMap<i64, UserProfile>,
    accounts: Vec<(UserId, Account)>,
    debts: Vec<(UserId, Debt, bool)>,
    goals: Vec<(UserId, Goal)>,
    txs: Vec<(UserId, TxRecord)>,
    fail_next: bool,
}

impl Inner {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn take_failure(&mut self) -> Result<(), String> {
        if self.fail_next {
            self.fail_next = false;
            return Err("injected write failure".to_string());
        }
        Ok(())
    }
}

/// [`Persistence`] backed by hash maps, with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub async fn seed_completed_user(&self, chat_id: i64) {
        let mut inner = self.inner.lock().unwrap();
        let user_id = inner.id();
        inner.users.insert(
            chat_id,
            UserProfile {
                user_id,
                chat_id,
                first_name: Some("Alex".to_string()),
                level: 1,
                total_score: 0,
                monthly_income: Decimal::from(100_000),
                onboarding_completed: true,
                strategy: None,
            },
        );
    }

    pub fn seed_debt(&self, user_id: UserId, name: &str, amount: Decimal) -> DebtId {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.id();
        inner.debts.push((
            user_id,
            Debt {
                id,
                name: name.to_string(),
                total: amount,
                remaining: amount,
                rate: Decimal::ZERO,
                min_payment: Decimal::ZERO,
                due_day: 1,
            },
            true,
        ));
        id
    }

    pub fn set_score(&self, user_id: UserId, score: i64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.values_mut().find(|u| u.user_id == user_id) {
            user.total_score = score;
        }
    }

    pub fn fail_next_write(&self) {
        self.inner.lock().unwrap().fail_next = true;
    }

    pub fn transactions(&self, user_id: UserId) -> Vec<TxRecord> {
        self.inner
            .lock()
            .unwrap()
            .txs
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, tx)| tx.clone())
            .collect()
    }

    pub fn account_count(&self, user_id: UserId) -> usize {
        self.inner
            .lock()
            .unwrap()
            .accounts
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .count()
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn ensure_user(
        &self,
        chat_id: i64,
        first_name: Option<&str>,
    ) -> Result<UserProfile, String> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.get(&chat_id) {
            return Ok(user.clone());
        }
        let user_id = inner.id();
        let user = UserProfile {
            user_id,
            chat_id,
            first_name: first_name.map(str::to_string),
            level: 1,
            total_score: 0,
            monthly_income: Decimal::ZERO,
            onboarding_completed: false,
            strategy: None,
        };
        inner.users.insert(chat_id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, chat_id: i64) -> Result<Option<UserProfile>, String> {
        Ok(self.inner.lock().unwrap().users.get(&chat_id).cloned())
    }

    async fn add_score(&self, user_id: UserId, points: i64) -> Result<Option<LevelUp>, String> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .values_mut()
            .find(|u| u.user_id == user_id)
            .ok_or("user not found")?;
        user.total_score += points;
        for def in LEVELS {
            if def.level > user.level && user.total_score >= def.score {
                user.level = def.level;
                return Ok(Some(LevelUp {
                    level: def.level,
                    name: def.name,
                }));
            }
        }
        Ok(None)
    }

    async fn set_monthly_income(&self, user_id: UserId, income: Decimal) -> Result<(), String> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;
        let user = inner
            .users
            .values_mut()
            .find(|u| u.user_id == user_id)
            .ok_or("user not found")?;
        user.monthly_income = income;
        Ok(())
    }

    async fn set_strategy(&self, user_id: UserId, strategy: DebtStrategy) -> Result<(), String> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;
        let user = inner
            .users
            .values_mut()
            .find(|u| u.user_id == user_id)
            .ok_or("user not found")?;
        user.strategy = Some(strategy);
        Ok(())
    }

    async fn complete_onboarding(&self, user_id: UserId) -> Result<(), String> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;
        let user = inner
            .users
            .values_mut()
            .find(|u| u.user_id == user_id)
            .ok_or("user not found")?;
        user.onboarding_completed = true;
        Ok(())
    }

    async fn insert_account(
        &self,
        user_id: UserId,
        kind: AccountKind,
        name: &str,
        balance: Decimal,
    ) -> Result<(), String> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;
        let id = inner.id();
        inner.accounts.push((
            user_id,
            Account {
                id,
                kind,
                name: name.to_string(),
                balance,
            },
        ));
        Ok(())
    }

    async fn insert_debt(
        &self,
        user_id: UserId,
        name: &str,
        amount: Decimal,
        rate: Decimal,
        min_payment: Decimal,
        due_day: u8,
    ) -> Result<(), String> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;
        let id = inner.id();
        inner.debts.push((
            user_id,
            Debt {
                id,
                name: name.to_string(),
                total: amount,
                remaining: amount,
                rate,
                min_payment,
                due_day,
            },
            true,
        ));
        Ok(())
    }

    async fn insert_goal(
        &self,
        user_id: UserId,
        kind: GoalKind,
        name: &str,
        target: Decimal,
    ) -> Result<(), String> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;
        let id = inner.id();
        inner.goals.push((
            user_id,
            Goal {
                id,
                kind,
                name: name.to_string(),
                target,
                saved: Decimal::ZERO,
            },
        ));
        Ok(())
    }

    async fn insert_transaction(
        &self,
        user_id: UserId,
        kind: TxKind,
        amount: Decimal,
        category: &str,
        description: &str,
        date: NaiveDate,
    ) -> Result<(), String> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;
        inner.txs.push((
            user_id,
            TxRecord {
                kind,
                amount,
                category: category.to_string(),
                description: description.to_string(),
                date,
            },
        ));
        Ok(())
    }

    async fn apply_debt_payment(
        &self,
        user_id: UserId,
        debt_id: DebtId,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<DebtPayment, String> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;
        let (_, debt, active) = inner
            .debts
            .iter_mut()
            .find(|(owner, debt, active)| *owner == user_id && debt.id == debt_id && *active)
            .ok_or("debt not found")?;
        debt.remaining = (debt.remaining - amount).max(Decimal::ZERO);
        let closed = debt.remaining == Decimal::ZERO;
        if closed {
            *active = false;
        }
        let payment = DebtPayment {
            debt_name: debt.name.clone(),
            remaining: debt.remaining,
            closed,
        };
        inner.txs.push((
            user_id,
            TxRecord {
                kind: TxKind::Expense,
                amount,
                category: DEBT_PAYDOWN_CATEGORY.to_string(),
                description: format!("Payment: {}", payment.debt_name),
                date,
            },
        ));
        Ok(payment)
    }

    async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>, String> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .accounts
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, account)| account.clone())
            .collect())
    }

    async fn list_active_debts(&self, user_id: UserId) -> Result<Vec<Debt>, String> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .debts
            .iter()
            .filter(|(owner, _, active)| *owner == user_id && *active)
            .map(|(_, debt, _)| debt.clone())
            .collect())
    }

    async fn list_active_goals(&self, user_id: UserId) -> Result<Vec<Goal>, String> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .goals
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, goal)| goal.clone())
            .collect())
    }

    async fn month_summary(
        &self,
        user_id: UserId,
        from: NaiveDate,
    ) -> Result<MonthSummary, String> {
        let inner = self.inner.lock().unwrap();
        let mut summary = MonthSummary::default();
        for (_, tx) in inner
            .txs
            .iter()
            .filter(|(owner, tx)| *owner == user_id && tx.date >= from)
        {
            match tx.kind {
                TxKind::Income => summary.income += tx.amount,
                TxKind::Expense => summary.expense += tx.amount,
            }
        }
        Ok(summary)
    }

    async fn month_expenses_by_category(
        &self,
        user_id: UserId,
        from: NaiveDate,
    ) -> Result<Vec<(String, Decimal)>, String> {
        let inner = self.inner.lock().unwrap();
        let mut totals: HashMap<String, Decimal> = HashMap::new();
        for (_, tx) in inner.txs.iter().filter(|(owner, tx)| {
            *owner == user_id && tx.kind == TxKind::Expense && tx.date >= from
        }) {
            *totals.entry(tx.category.clone()).or_default() += tx.amount;
        }
        let mut out: Vec<_> = totals.into_iter().collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    async fn progress_stats(&self, user_id: UserId) -> Result<ProgressStats, String> {
        let inner = self.inner.lock().unwrap();
        Ok(ProgressStats {
            transactions: inner
                .txs
                .iter()
                .filter(|(owner, _)| *owner == user_id)
                .count() as i64,
            active_debts: inner
                .debts
                .iter()
                .filter(|(owner, _, active)| *owner == user_id && *active)
                .count() as i64,
            active_goals: inner
                .goals
                .iter()
                .filter(|(owner, _)| *owner == user_id)
                .count() as i64,
        })
    }
}

/// [`OutputSink`] that records every delivered message, with one-shot
/// failure injection.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(i64, Outgoing)>>,
    fail_once_containing: Mutex<Option<String>>,
}

impl RecordingSink {
    /// Fail the next delivery whose text contains `needle`, then recover.
    pub fn fail_once_when(&self, needle: &str) {
        *self.fail_once_containing.lock().unwrap() = Some(needle.to_string());
    }

    pub fn texts(&self, chat_id: i64) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, message)| message.text.clone())
            .collect()
    }

}

#[async_trait]
impl OutputSink for RecordingSink {
    async fn deliver(&self, chat_id: i64, message: Outgoing) -> Result<(), String> {
        let mut trigger = self.fail_once_containing.lock().unwrap();
        if trigger
            .as_deref()
            .is_some_and(|needle| message.text.contains(needle))
        {
            *trigger = None;
            return Err("injected delivery failure".to_string());
        }
        drop(trigger);
        self.sent.lock().unwrap().push((chat_id, message));
        Ok(())
    }
}
