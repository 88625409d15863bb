//! Inbound events, decoded once at the boundary.
//!
//! Button callback data arrives as prefixed strings ("acc_card",
//! "strategy_avalanche", "cat_<name>", "debt_<id>"). They are decoded into a
//! tagged [`ButtonPayload`] here so step handlers never re-parse raw strings.

use crate::domain::{
    category_by_name, AccountKind, ConversationId, DebtId, DebtStrategy, GoalKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Button,
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    AddExpense,
    AddIncome,
    AddAccount,
    Accounts,
    Budget,
    AddDebt,
    Debts,
    PayDebt,
    AddGoal,
    Goals,
    Level,
    Progress,
    Summary,
    Motivation,
}

impl Command {
    /// Parse a leading slash command, ignoring any trailing arguments.
    pub fn parse(text: &str) -> Option<Command> {
        let word = text.trim().split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        // Tolerate the "@botname" suffix some clients append.
        let name = name.split('@').next().unwrap_or(name);
        let cmd = match name {
            "start" => Command::Start,
            "help" => Command::Help,
            "add_expense" => Command::AddExpense,
            "add_income" => Command::AddIncome,
            "add_account" => Command::AddAccount,
            "accounts" => Command::Accounts,
            "budget" => Command::Budget,
            "add_debt" => Command::AddDebt,
            "debts" => Command::Debts,
            "pay_debt" => Command::PayDebt,
            "add_goal" => Command::AddGoal,
            "goals" => Command::Goals,
            "level" => Command::Level,
            "progress" => Command::Progress,
            "summary" => Command::Summary,
            "motivation" => Command::Motivation,
            _ => return None,
        };
        Some(cmd)
    }

    /// Commands that enter a multi-step flow (and therefore replace any flow
    /// already in progress).
    pub fn starts_flow(self) -> bool {
        matches!(
            self,
            Command::Start
                | Command::AddExpense
                | Command::AddIncome
                | Command::AddAccount
                | Command::AddDebt
                | Command::PayDebt
                | Command::AddGoal
        )
    }
}

// ============================================================================
// Button payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ButtonPayload {
    Yes,
    No,
    Strategy(DebtStrategy),
    AccountKind(AccountKind),
    Category(&'static str),
    GoalKind(GoalKind),
    Describe,
    Skip,
    Debt(DebtId),
    /// Callback data that matched no known encoding. Handlers treat it like
    /// any other out-of-set payload: a retry, never a crash.
    Unknown,
}

impl ButtonPayload {
    pub fn decode(data: &str) -> Self {
        match data {
            "yes" => return ButtonPayload::Yes,
            "no" => return ButtonPayload::No,
            "desc_add" => return ButtonPayload::Describe,
            "desc_skip" => return ButtonPayload::Skip,
            _ => {}
        }
        if let Some(slug) = data.strip_prefix("strategy_") {
            if let Some(s) = DebtStrategy::from_slug(slug) {
                return ButtonPayload::Strategy(s);
            }
        }
        if let Some(slug) = data.strip_prefix("acc_") {
            if let Some(k) = AccountKind::from_slug(slug) {
                return ButtonPayload::AccountKind(k);
            }
        }
        if let Some(name) = data.strip_prefix("cat_") {
            if let Some(c) = category_by_name(name) {
                return ButtonPayload::Category(c.name);
            }
        }
        if let Some(slug) = data.strip_prefix("goal_") {
            if let Some(g) = GoalKind::from_slug(slug) {
                return ButtonPayload::GoalKind(g);
            }
        }
        if let Some(id) = data.strip_prefix("debt_") {
            if let Ok(id) = id.parse::<DebtId>() {
                return ButtonPayload::Debt(id);
            }
        }
        ButtonPayload::Unknown
    }

    /// Inverse of [`decode`](Self::decode) for building keyboards.
    pub fn encode(&self) -> String {
        match self {
            ButtonPayload::Yes => "yes".to_string(),
            ButtonPayload::No => "no".to_string(),
            ButtonPayload::Describe => "desc_add".to_string(),
            ButtonPayload::Skip => "desc_skip".to_string(),
            ButtonPayload::Strategy(s) => format!("strategy_{}", s.slug()),
            ButtonPayload::AccountKind(k) => format!("acc_{}", k.slug()),
            ButtonPayload::Category(name) => format!("cat_{name}"),
            ButtonPayload::GoalKind(g) => format!("goal_{}", g.slug()),
            ButtonPayload::Debt(id) => format!("debt_{id}"),
            ButtonPayload::Unknown => String::new(),
        }
    }
}

// ============================================================================
// Inbound events
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Command(Command),
    Text(String),
    Button(ButtonPayload),
}

impl Incoming {
    /// Decode a raw text update: slash commands become [`Incoming::Command`],
    /// everything else stays free text for the current step.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        match Command::parse(&text) {
            Some(cmd) => Incoming::Command(cmd),
            None => Incoming::Text(text),
        }
    }

    pub fn from_button(data: &str) -> Self {
        Incoming::Button(ButtonPayload::decode(data))
    }
}

/// One inbound update: who sent it plus what they sent.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub chat_id: ConversationId,
    pub sender_name: Option<String>,
    pub incoming: Incoming,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_with_noise() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("  /add_expense  "), Some(Command::AddExpense));
        assert_eq!(Command::parse("/pay_debt@finquest_bot"), Some(Command::PayDebt));
        assert_eq!(Command::parse("/summary now"), Some(Command::Summary));
        assert_eq!(Command::parse("/unknown"), None);
        assert_eq!(Command::parse("hello"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn button_payloads_round_trip() {
        let payloads = [
            ButtonPayload::Yes,
            ButtonPayload::No,
            ButtonPayload::Describe,
            ButtonPayload::Skip,
            ButtonPayload::Strategy(DebtStrategy::Avalanche),
            ButtonPayload::AccountKind(AccountKind::Deposit),
            ButtonPayload::Category("Groceries 🛒"),
            ButtonPayload::GoalKind(GoalKind::SafetyCushion),
            ButtonPayload::Debt(42),
        ];
        for payload in payloads {
            assert_eq!(ButtonPayload::decode(&payload.encode()), payload);
        }
    }

    #[test]
    fn unknown_callback_data_is_tagged_not_fatal() {
        assert_eq!(ButtonPayload::decode("cat_No Such Category"), ButtonPayload::Unknown);
        assert_eq!(ButtonPayload::decode("debt_abc"), ButtonPayload::Unknown);
        assert_eq!(ButtonPayload::decode("strategy_yolo"), ButtonPayload::Unknown);
        assert_eq!(ButtonPayload::decode(""), ButtonPayload::Unknown);
    }

    #[test]
    fn text_updates_split_commands_from_free_text() {
        assert_eq!(Incoming::from_text("/help"), Incoming::Command(Command::Help));
        assert_eq!(
            Incoming::from_text("Bank loan"),
            Incoming::Text("Bank loan".to_string())
        );
    }
}
