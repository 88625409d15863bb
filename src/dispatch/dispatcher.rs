//! The dispatcher: the only component that touches I/O.
//!
//! It decodes nothing itself (events arrive pre-decoded), looks up the
//! current session, runs the pure step handler, and then performs whatever
//! the handler asked for: sends through the output sink, commits through the
//! persistence collaborator. Commands short-circuit the state machine and
//! are handled here directly.

use crate::dispatch::{OutputSink, Persistence};
use crate::domain::{points, TxKind, UserProfile};
use crate::flows;
use crate::session::SessionStore;
use crate::state_machine::{
    Command, CommitAction, Effect, InboundEvent, Incoming, Outgoing, Registry, Session, StepInput,
    StepOutcome,
};
use crate::views;
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("delivery error: {0}")]
    Delivery(String),
}

pub struct Dispatcher<P, O> {
    registry: Arc<Registry>,
    sessions: Arc<SessionStore>,
    store: P,
    sink: O,
}

impl<P: Persistence, O: OutputSink> Dispatcher<P, O> {
    pub fn new(registry: Arc<Registry>, sessions: Arc<SessionStore>, store: P, sink: O) -> Self {
        Self {
            registry,
            sessions,
            store,
            sink,
        }
    }

    /// Process one inbound event to completion.
    pub async fn handle_event(&self, event: InboundEvent) -> Result<(), DispatchError> {
        let chat_id = event.chat_id;
        match event.incoming {
            Incoming::Command(cmd) => {
                self.handle_command(chat_id, event.sender_name.as_deref(), cmd)
                    .await
            }
            Incoming::Text(text) => self.handle_step(chat_id, StepInput::Text(&text)).await,
            Incoming::Button(payload) => {
                self.handle_step(chat_id, StepInput::Button(&payload)).await
            }
        }
    }

    async fn send(&self, chat_id: i64, message: Outgoing) -> Result<(), DispatchError> {
        self.sink
            .deliver(chat_id, message)
            .await
            .map_err(DispatchError::Delivery)
    }

    // ==================== Commands ====================

    async fn handle_command(
        &self,
        chat_id: i64,
        sender_name: Option<&str>,
        cmd: Command,
    ) -> Result<(), DispatchError> {
        let user = self
            .store
            .ensure_user(chat_id, sender_name)
            .await
            .map_err(DispatchError::Persistence)?;

        match cmd {
            Command::Start => return self.handle_start(&user).await,
            Command::Help => return self.send(chat_id, Outgoing::text(views::help())).await,
            _ => {}
        }

        // Everything past /start and /help needs a finished profile.
        if !user.onboarding_completed {
            return self
                .send(chat_id, Outgoing::text(views::finish_setup_first()))
                .await;
        }

        if cmd.starts_flow() {
            return self.enter_flow(&user, cmd).await;
        }
        self.handle_view_command(&user, cmd).await
    }

    async fn handle_start(&self, user: &UserProfile) -> Result<(), DispatchError> {
        let chat_id = user.chat_id;
        if user.onboarding_completed {
            // A completed user keeps whatever flow is in progress.
            return self
                .send(chat_id, Outgoing::text(views::welcome_back(user)))
                .await;
        }
        let greeting = if self.sessions.get(chat_id).await.is_some() {
            views::resume_setup()
        } else {
            views::welcome_new(user.first_name.as_deref())
        };
        self.send(chat_id, Outgoing::text(greeting)).await?;

        let (state, prompt) = flows::onboarding::entry();
        self.sessions.set(chat_id, Session::new(state)).await;
        self.send(chat_id, prompt).await
    }

    /// Open a flow: set the session to the entry state (replacing any flow in
    /// progress without comment) and send the entry prompt.
    async fn enter_flow(&self, user: &UserProfile, cmd: Command) -> Result<(), DispatchError> {
        let chat_id = user.chat_id;
        let (state, prompt) = match cmd {
            Command::AddExpense => flows::expense::entry(),
            Command::AddIncome => flows::income::entry(),
            Command::AddAccount => flows::account::entry(),
            Command::AddDebt => flows::debt::entry(),
            Command::AddGoal => flows::goal::entry(),
            Command::PayDebt => {
                let debts = self
                    .store
                    .list_active_debts(user.user_id)
                    .await
                    .map_err(DispatchError::Persistence)?;
                if debts.is_empty() {
                    return self
                        .send(chat_id, Outgoing::text(views::no_debts_to_pay()))
                        .await;
                }
                flows::pay_debt::entry(&debts)
            }
            _ => unreachable!("enter_flow called for a non-flow command"),
        };
        if let Some(old) = self.sessions.get(chat_id).await {
            tracing::debug!(chat_id, replaced = old.state.flow_name(), "flow replaced");
        }
        self.sessions.set(chat_id, Session::new(state)).await;
        self.send(chat_id, prompt).await
    }

    async fn handle_view_command(
        &self,
        user: &UserProfile,
        cmd: Command,
    ) -> Result<(), DispatchError> {
        let text = match cmd {
            Command::Accounts => {
                let accounts = self
                    .store
                    .list_accounts(user.user_id)
                    .await
                    .map_err(DispatchError::Persistence)?;
                views::accounts(&accounts)
            }
            Command::Debts => {
                let debts = self
                    .store
                    .list_active_debts(user.user_id)
                    .await
                    .map_err(DispatchError::Persistence)?;
                views::debts(&debts)
            }
            Command::Goals => {
                let goals = self
                    .store
                    .list_active_goals(user.user_id)
                    .await
                    .map_err(DispatchError::Persistence)?;
                views::goals(&goals)
            }
            Command::Budget => {
                let spent = self
                    .store
                    .month_expenses_by_category(user.user_id, month_start())
                    .await
                    .map_err(DispatchError::Persistence)?;
                views::budget(user.monthly_income, &spent)
            }
            Command::Summary => {
                let summary = self
                    .store
                    .month_summary(user.user_id, month_start())
                    .await
                    .map_err(DispatchError::Persistence)?;
                views::summary(&summary)
            }
            Command::Level => views::level(user),
            Command::Progress => {
                let stats = self
                    .store
                    .progress_stats(user.user_id)
                    .await
                    .map_err(DispatchError::Persistence)?;
                views::progress(user, &stats)
            }
            Command::Motivation => views::motivation(user.level),
            _ => unreachable!("handle_view_command called for a non-view command"),
        };
        self.send(user.chat_id, Outgoing::text(text)).await
    }

    // ==================== Steps ====================

    async fn handle_step(&self, chat_id: i64, input: StepInput<'_>) -> Result<(), DispatchError> {
        let Some(session) = self.sessions.get(chat_id).await else {
            return self
                .send(chat_id, Outgoing::text(views::no_active_flow()))
                .await;
        };
        let Some(handler) = self.registry.resolve(session.state) else {
            // A session pointing at an unregistered state cannot make
            // progress; drop it rather than wedge the conversation.
            tracing::error!(chat_id, state = ?session.state, "session in unregistered state");
            self.sessions.clear(chat_id).await;
            return self
                .send(chat_id, Outgoing::text(views::no_active_flow()))
                .await;
        };
        if handler.expects != input.kind() {
            return self
                .send(
                    chat_id,
                    Outgoing::text("I wasn't expecting that. Please answer the current question."),
                )
                .await;
        }

        match (handler.handle)(&session.fields, input) {
            StepOutcome::Continue {
                next,
                fields,
                effects,
            } => {
                if !self.run_effects(chat_id, effects).await {
                    // Commit failed: state unchanged so the user can retry.
                    return self.send(chat_id, Outgoing::text(views::try_again())).await;
                }
                let mut session = session;
                session.state = next;
                for (key, value) in fields {
                    session.fields.insert(key, value);
                }
                self.sessions.set(chat_id, session).await;
                Ok(())
            }
            StepOutcome::Retry { message } => self.send(chat_id, Outgoing::text(message)).await,
            StepOutcome::Terminate { effects } => {
                if !self.run_effects(chat_id, effects).await {
                    return self.send(chat_id, Outgoing::text(views::try_again())).await;
                }
                self.sessions.clear(chat_id).await;
                Ok(())
            }
            StepOutcome::Abort => {
                tracing::warn!(chat_id, state = ?session.state, "flow aborted, session dropped");
                self.sessions.clear(chat_id).await;
                self.send(chat_id, Outgoing::text(views::flow_reset())).await
            }
        }
    }

    /// Execute a step's effects in order. Returns `false` when a commit
    /// failed against persistence. Message delivery is best effort: once a
    /// commit in the list has persisted, a bounced prompt must not hold the
    /// flow at the old step, or answering again would re-run the commit.
    async fn run_effects(&self, chat_id: i64, effects: Vec<Effect>) -> bool {
        for effect in effects {
            match effect {
                Effect::Send(message) => {
                    if let Err(error) = self.sink.deliver(chat_id, message).await {
                        tracing::warn!(chat_id, %error, "prompt delivery failed");
                    }
                }
                Effect::Commit {
                    action,
                    confirmation,
                } => {
                    if let Err(error) = self.run_commit(chat_id, action, confirmation).await {
                        tracing::error!(chat_id, %error, "commit failed");
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Persist one committed record, award its score exactly once, and send
    /// the confirmation (with a level-up line appended when one fires).
    async fn run_commit(
        &self,
        chat_id: i64,
        action: CommitAction,
        confirmation: String,
    ) -> Result<(), String> {
        let user = self
            .store
            .get_user(chat_id)
            .await?
            .ok_or_else(|| format!("no profile for chat {chat_id}"))?;
        let user_id = user.user_id;

        let mut message = confirmation;
        let score = match action {
            CommitAction::CreateDebt {
                name,
                amount,
                rate,
                min_payment,
                due_day,
            } => {
                self.store
                    .insert_debt(user_id, &name, amount, rate, min_payment, due_day)
                    .await?;
                points::DEBT_ADDED
            }
            CommitAction::SetStrategy(strategy) => {
                self.store.set_strategy(user_id, strategy).await?;
                0
            }
            CommitAction::SetMonthlyIncome(income) => {
                self.store.set_monthly_income(user_id, income).await?;
                points::INCOME_SET
            }
            CommitAction::CreateAccount {
                kind,
                name,
                balance,
            } => {
                self.store
                    .insert_account(user_id, kind, &name, balance)
                    .await?;
                points::ACCOUNT_ADDED
            }
            CommitAction::FinishOnboarding => {
                self.store.complete_onboarding(user_id).await?;
                let user = self
                    .store
                    .get_user(chat_id)
                    .await?
                    .ok_or_else(|| format!("no profile for chat {chat_id}"))?;
                message = views::onboarding_complete(&user);
                0
            }
            CommitAction::RecordExpense {
                amount,
                category,
                description,
            } => {
                self.store
                    .insert_transaction(
                        user_id,
                        TxKind::Expense,
                        amount,
                        category,
                        &description,
                        today(),
                    )
                    .await?;
                points::TRANSACTION
            }
            CommitAction::RecordIncome {
                amount,
                description,
            } => {
                self.store
                    .insert_transaction(
                        user_id,
                        TxKind::Income,
                        amount,
                        "Income",
                        &description,
                        today(),
                    )
                    .await?;
                points::TRANSACTION
            }
            CommitAction::CreateGoal { kind, name, target } => {
                self.store.insert_goal(user_id, kind, &name, target).await?;
                points::GOAL_ADDED
            }
            CommitAction::RecordDebtPayment { debt_id, amount } => {
                let payment = self
                    .store
                    .apply_debt_payment(user_id, debt_id, amount, today())
                    .await?;
                if payment.closed {
                    message.push_str(&format!("\n🎉 {} is fully paid off!", payment.debt_name));
                } else {
                    message.push_str(&format!(
                        "\nRemaining on {}: {}",
                        payment.debt_name,
                        crate::domain::fmt_money(payment.remaining),
                    ));
                }
                points::DEBT_PAYMENT
            }
        };

        if score > 0 {
            if let Some(level_up) = self.store.add_score(user_id, score).await? {
                message.push_str(&views::level_up_line(level_up.name));
            }
        }
        if !message.is_empty() {
            // Confirmation delivery is best effort; the record is already
            // durable.
            if let Err(error) = self.sink.deliver(chat_id, Outgoing::text(message)).await {
                tracing::warn!(chat_id, %error, "confirmation delivery failed");
            }
        }
        Ok(())
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn month_start() -> NaiveDate {
    let now = today();
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1).unwrap_or(now)
}
