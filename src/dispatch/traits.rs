//! Collaborator traits at the dispatcher's seams.
//!
//! The dispatcher talks to persistence and to the message delivery channel
//! through these traits, so scenario tests can swap in in-memory fakes and
//! a recording sink.

use crate::db::Database;
use crate::domain::{
    Account, AccountKind, Debt, DebtId, DebtPayment, DebtStrategy, Goal, GoalKind, LevelUp,
    MonthSummary, ProgressStats, TxKind, UserId, UserProfile,
};
use crate::state_machine::Outgoing;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Everything the dispatcher needs from storage.
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn ensure_user(
        &self,
        chat_id: i64,
        first_name: Option<&str>,
    ) -> Result<UserProfile, String>;
    async fn get_user(&self, chat_id: i64) -> Result<Option<UserProfile>, String>;
    async fn add_score(&self, user_id: UserId, points: i64) -> Result<Option<LevelUp>, String>;
    async fn set_monthly_income(&self, user_id: UserId, income: Decimal) -> Result<(), String>;
    async fn set_strategy(&self, user_id: UserId, strategy: DebtStrategy) -> Result<(), String>;
    async fn complete_onboarding(&self, user_id: UserId) -> Result<(), String>;

    async fn insert_account(
        &self,
        user_id: UserId,
        kind: AccountKind,
        name: &str,
        balance: Decimal,
    ) -> Result<(), String>;
    async fn insert_debt(
        &self,
        user_id: UserId,
        name: &str,
        amount: Decimal,
        rate: Decimal,
        min_payment: Decimal,
        due_day: u8,
    ) -> Result<(), String>;
    async fn insert_goal(
        &self,
        user_id: UserId,
        kind: GoalKind,
        name: &str,
        target: Decimal,
    ) -> Result<(), String>;
    async fn insert_transaction(
        &self,
        user_id: UserId,
        kind: TxKind,
        amount: Decimal,
        category: &str,
        description: &str,
        date: NaiveDate,
    ) -> Result<(), String>;
    async fn apply_debt_payment(
        &self,
        user_id: UserId,
        debt_id: DebtId,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<DebtPayment, String>;

    async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>, String>;
    async fn list_active_debts(&self, user_id: UserId) -> Result<Vec<Debt>, String>;
    async fn list_active_goals(&self, user_id: UserId) -> Result<Vec<Goal>, String>;
    async fn month_summary(&self, user_id: UserId, from: NaiveDate)
        -> Result<MonthSummary, String>;
    async fn month_expenses_by_category(
        &self,
        user_id: UserId,
        from: NaiveDate,
    ) -> Result<Vec<(String, Decimal)>, String>;
    async fn progress_stats(&self, user_id: UserId) -> Result<ProgressStats, String>;
}

#[async_trait]
impl<T: Persistence + ?Sized> Persistence for Arc<T> {
    async fn ensure_user(
        &self,
        chat_id: i64,
        first_name: Option<&str>,
    ) -> Result<UserProfile, String> {
        (**self).ensure_user(chat_id, first_name).await
    }

    async fn get_user(&self, chat_id: i64) -> Result<Option<UserProfile>, String> {
        (**self).get_user(chat_id).await
    }

    async fn add_score(&self, user_id: UserId, points: i64) -> Result<Option<LevelUp>, String> {
        (**self).add_score(user_id, points).await
    }

    async fn set_monthly_income(&self, user_id: UserId, income: Decimal) -> Result<(), String> {
        (**self).set_monthly_income(user_id, income).await
    }

    async fn set_strategy(&self, user_id: UserId, strategy: DebtStrategy) -> Result<(), String> {
        (**self).set_strategy(user_id, strategy).await
    }

    async fn complete_onboarding(&self, user_id: UserId) -> Result<(), String> {
        (**self).complete_onboarding(user_id).await
    }

    async fn insert_account(
        &self,
        user_id: UserId,
        kind: AccountKind,
        name: &str,
        balance: Decimal,
    ) -> Result<(), String> {
        (**self).insert_account(user_id, kind, name, balance).await
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
        (**self)
            .insert_debt(user_id, name, amount, rate, min_payment, due_day)
            .await
    }

    async fn insert_goal(
        &self,
        user_id: UserId,
        kind: GoalKind,
        name: &str,
        target: Decimal,
    ) -> Result<(), String> {
        (**self).insert_goal(user_id, kind, name, target).await
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
        (**self)
            .insert_transaction(user_id, kind, amount, category, description, date)
            .await
    }

    async fn apply_debt_payment(
        &self,
        user_id: UserId,
        debt_id: DebtId,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<DebtPayment, String> {
        (**self)
            .apply_debt_payment(user_id, debt_id, amount, date)
            .await
    }

    async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>, String> {
        (**self).list_accounts(user_id).await
    }

    async fn list_active_debts(&self, user_id: UserId) -> Result<Vec<Debt>, String> {
        (**self).list_active_debts(user_id).await
    }

    async fn list_active_goals(&self, user_id: UserId) -> Result<Vec<Goal>, String> {
        (**self).list_active_goals(user_id).await
    }

    async fn month_summary(
        &self,
        user_id: UserId,
        from: NaiveDate,
    ) -> Result<MonthSummary, String> {
        (**self).month_summary(user_id, from).await
    }

    async fn month_expenses_by_category(
        &self,
        user_id: UserId,
        from: NaiveDate,
    ) -> Result<Vec<(String, Decimal)>, String> {
        (**self).month_expenses_by_category(user_id, from).await
    }

    async fn progress_stats(&self, user_id: UserId) -> Result<ProgressStats, String> {
        (**self).progress_stats(user_id).await
    }
}

/// Delivery channel for outgoing messages.
#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn deliver(&self, chat_id: i64, message: Outgoing) -> Result<(), String>;
}

#[async_trait]
impl<T: OutputSink + ?Sized> OutputSink for Arc<T> {
    async fn deliver(&self, chat_id: i64, message: Outgoing) -> Result<(), String> {
        (**self).deliver(chat_id, message).await
    }
}

#[async_trait]
impl<T: OutputSink + ?Sized> OutputSink for Box<T> {
    async fn deliver(&self, chat_id: i64, message: Outgoing) -> Result<(), String> {
        (**self).deliver(chat_id, message).await
    }
}

// ============================================================================
// Production adapters
// ============================================================================

/// [`Persistence`] backed by the sqlite [`Database`].
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

macro_rules! stringify_err {
    ($expr:expr) => {
        $expr.map_err(|e| e.to_string())
    };
}

#[async_trait]
impl Persistence for SqliteStore {
    async fn ensure_user(
        &self,
        chat_id: i64,
        first_name: Option<&str>,
    ) -> Result<UserProfile, String> {
        stringify_err!(self.db.ensure_user(chat_id, first_name))
    }

    async fn get_user(&self, chat_id: i64) -> Result<Option<UserProfile>, String> {
        stringify_err!(self.db.get_user(chat_id))
    }

    async fn add_score(&self, user_id: UserId, points: i64) -> Result<Option<LevelUp>, String> {
        stringify_err!(self.db.add_score(user_id, points))
    }

    async fn set_monthly_income(&self, user_id: UserId, income: Decimal) -> Result<(), String> {
        stringify_err!(self.db.set_monthly_income(user_id, income))
    }

    async fn set_strategy(&self, user_id: UserId, strategy: DebtStrategy) -> Result<(), String> {
        stringify_err!(self.db.set_strategy(user_id, strategy))
    }

    async fn complete_onboarding(&self, user_id: UserId) -> Result<(), String> {
        stringify_err!(self.db.complete_onboarding(user_id))
    }

    async fn insert_account(
        &self,
        user_id: UserId,
        kind: AccountKind,
        name: &str,
        balance: Decimal,
    ) -> Result<(), String> {
        stringify_err!(self.db.insert_account(user_id, kind, name, balance)).map(|_| ())
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
        stringify_err!(self
            .db
            .insert_debt(user_id, name, amount, rate, min_payment, due_day))
        .map(|_| ())
    }

    async fn insert_goal(
        &self,
        user_id: UserId,
        kind: GoalKind,
        name: &str,
        target: Decimal,
    ) -> Result<(), String> {
        stringify_err!(self.db.insert_goal(user_id, kind, name, target)).map(|_| ())
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
        stringify_err!(self
            .db
            .insert_transaction(user_id, kind, amount, category, description, date))
        .map(|_| ())
    }

    async fn apply_debt_payment(
        &self,
        user_id: UserId,
        debt_id: DebtId,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<DebtPayment, String> {
        stringify_err!(self.db.apply_debt_payment(user_id, debt_id, amount, date))
    }

    async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>, String> {
        stringify_err!(self.db.list_accounts(user_id))
    }

    async fn list_active_debts(&self, user_id: UserId) -> Result<Vec<Debt>, String> {
        stringify_err!(self.db.list_active_debts(user_id))
    }

    async fn list_active_goals(&self, user_id: UserId) -> Result<Vec<Goal>, String> {
        stringify_err!(self.db.list_active_goals(user_id))
    }

    async fn month_summary(
        &self,
        user_id: UserId,
        from: NaiveDate,
    ) -> Result<MonthSummary, String> {
        stringify_err!(self.db.month_summary(user_id, from))
    }

    async fn month_expenses_by_category(
        &self,
        user_id: UserId,
        from: NaiveDate,
    ) -> Result<Vec<(String, Decimal)>, String> {
        stringify_err!(self.db.month_expenses_by_category(user_id, from))
    }

    async fn progress_stats(&self, user_id: UserId) -> Result<ProgressStats, String> {
        stringify_err!(self.db.progress_stats(user_id))
    }
}

/// Delivers messages by POSTing them to a configured webhook URL.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[derive(serde::Serialize)]
struct WebhookBody<'a> {
    chat_id: i64,
    #[serde(flatten)]
    message: &'a Outgoing,
}

#[async_trait]
impl OutputSink for WebhookSink {
    async fn deliver(&self, chat_id: i64, message: Outgoing) -> Result<(), String> {
        let body = WebhookBody {
            chat_id,
            message: &message,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("delivery request failed: {e}"))?;
        if !response.status().is_success() {
            return Err(format!("delivery returned {}", response.status()));
        }
        Ok(())
    }
}

/// Logs outgoing messages instead of delivering them. Used when no delivery
/// URL is configured.
pub struct TraceSink;

#[async_trait]
impl OutputSink for TraceSink {
    async fn deliver(&self, chat_id: i64, message: Outgoing) -> Result<(), String> {
        tracing::info!(chat_id, text = %message.text, buttons = message.buttons.len(), "outgoing");
        Ok(())
    }
}
