//! Domain records and the fixed gamification tables.
//!
//! Everything here is plain data: the committed artifacts that a completed
//! conversation flow turns into, plus the level thresholds, budget category
//! table, and score values that feed the commit path.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One conversation per chat, so the chat id doubles as the conversation id.
pub type ConversationId = i64;
pub type UserId = i64;
pub type DebtId = i64;

// ============================================================================
// Enumerated choice sets
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Card,
    Cash,
    Deposit,
    Asset,
}

impl AccountKind {
    pub const ALL: [AccountKind; 4] = [
        AccountKind::Card,
        AccountKind::Cash,
        AccountKind::Deposit,
        AccountKind::Asset,
    ];

    /// The subset offered during onboarding.
    pub const ONBOARDING: [AccountKind; 3] =
        [AccountKind::Card, AccountKind::Cash, AccountKind::Deposit];

    pub fn slug(self) -> &'static str {
        match self {
            AccountKind::Card => "card",
            AccountKind::Cash => "cash",
            AccountKind::Deposit => "deposit",
            AccountKind::Asset => "asset",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }

    pub fn label(self) -> &'static str {
        match self {
            AccountKind::Card => "Bank card 💳",
            AccountKind::Cash => "Cash 💵",
            AccountKind::Deposit => "Deposit 🏦",
            AccountKind::Asset => "Asset 📊",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStrategy {
    Avalanche,
    Snowball,
    Hybrid,
}

impl DebtStrategy {
    pub const ALL: [DebtStrategy; 3] = [
        DebtStrategy::Avalanche,
        DebtStrategy::Snowball,
        DebtStrategy::Hybrid,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            DebtStrategy::Avalanche => "avalanche",
            DebtStrategy::Snowball => "snowball",
            DebtStrategy::Hybrid => "hybrid",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.slug() == slug)
    }

    pub fn label(self) -> &'static str {
        match self {
            DebtStrategy::Avalanche => "🔥 Avalanche (highest rate first)",
            DebtStrategy::Snowball => "❄️ Snowball (smallest debt first)",
            DebtStrategy::Hybrid => "⚡️ Hybrid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    DebtFree,
    SafetyCushion,
    Savings,
    Investments,
}

impl GoalKind {
    pub const ALL: [GoalKind; 4] = [
        GoalKind::DebtFree,
        GoalKind::SafetyCushion,
        GoalKind::Savings,
        GoalKind::Investments,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            GoalKind::DebtFree => "debt_free",
            GoalKind::SafetyCushion => "cushion",
            GoalKind::Savings => "savings",
            GoalKind::Investments => "investments",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.slug() == slug)
    }

    pub fn label(self) -> &'static str {
        match self {
            GoalKind::DebtFree => "Debt paydown 💳",
            GoalKind::SafetyCushion => "Safety cushion 💰",
            GoalKind::Savings => "Savings 💎",
            GoalKind::Investments => "Investments 📈",
        }
    }
}

// ============================================================================
// 50/30/20 budget categories
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetGroup {
    Essentials,
    Lifestyle,
    Savings,
}

impl BudgetGroup {
    pub const ALL: [BudgetGroup; 3] = [
        BudgetGroup::Essentials,
        BudgetGroup::Lifestyle,
        BudgetGroup::Savings,
    ];

    /// Share of monthly income allotted to this group.
    pub fn share(self) -> Decimal {
        match self {
            BudgetGroup::Essentials => Decimal::new(5, 1),
            BudgetGroup::Lifestyle => Decimal::new(3, 1),
            BudgetGroup::Savings => Decimal::new(2, 1),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BudgetGroup::Essentials => "Essentials (50%)",
            BudgetGroup::Lifestyle => "Lifestyle (30%)",
            BudgetGroup::Savings => "Savings (20%)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub group: BudgetGroup,
}

pub const CATEGORIES: &[Category] = &[
    Category { name: "Groceries 🛒", group: BudgetGroup::Essentials },
    Category { name: "Housing & utilities 🏠", group: BudgetGroup::Essentials },
    Category { name: "Transport 🚗", group: BudgetGroup::Essentials },
    Category { name: "Healthcare 💊", group: BudgetGroup::Essentials },
    Category { name: "Phone & internet 📱", group: BudgetGroup::Essentials },
    Category { name: "Clothing 👕", group: BudgetGroup::Essentials },
    Category { name: "Education 📚", group: BudgetGroup::Essentials },
    Category { name: "Dining out 🍽️", group: BudgetGroup::Lifestyle },
    Category { name: "Entertainment 🎬", group: BudgetGroup::Lifestyle },
    Category { name: "Subscriptions 📺", group: BudgetGroup::Lifestyle },
    Category { name: "Sports 💪", group: BudgetGroup::Lifestyle },
    Category { name: "Beauty 💅", group: BudgetGroup::Lifestyle },
    Category { name: "Hobbies 🎨", group: BudgetGroup::Lifestyle },
    Category { name: "Travel ✈️", group: BudgetGroup::Lifestyle },
    Category { name: "Shopping 🛍️", group: BudgetGroup::Lifestyle },
    Category { name: "Safety cushion 💰", group: BudgetGroup::Savings },
    Category { name: "Debt paydown 💳", group: BudgetGroup::Savings },
    Category { name: "Investments 📈", group: BudgetGroup::Savings },
    Category { name: "Savings 🎯", group: BudgetGroup::Savings },
];

pub fn category_by_name(name: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.name == name)
}

/// Category used for the transaction recorded by a debt payment.
pub const DEBT_PAYDOWN_CATEGORY: &str = "Debt paydown 💳";

// ============================================================================
// Levels and score values
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelDef {
    pub level: u8,
    pub name: &'static str,
    pub score: i64,
}

pub const LEVELS: &[LevelDef] = &[
    LevelDef { level: 1, name: "🔴 Financial Awakening", score: 0 },
    LevelDef { level: 2, name: "🟠 Control & Survival", score: 400 },
    LevelDef { level: 3, name: "🟡 Stability", score: 1400 },
    LevelDef { level: 4, name: "🟢 Growth & Investing", score: 3400 },
    LevelDef { level: 5, name: "🔵 Financial Independence", score: 5400 },
    LevelDef { level: 6, name: "💎 Financial Freedom", score: 9400 },
];

pub fn level_def(level: u8) -> &'static LevelDef {
    LEVELS.iter().find(|l| l.level == level).unwrap_or(&LEVELS[0])
}

/// Experience points awarded per committed record.
pub mod points {
    pub const DEBT_ADDED: i64 = 100;
    pub const INCOME_SET: i64 = 50;
    pub const ACCOUNT_ADDED: i64 = 50;
    pub const GOAL_ADDED: i64 = 50;
    pub const DEBT_PAYMENT: i64 = 50;
    pub const TRANSACTION: i64 = 10;
}

// ============================================================================
// Committed records
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub chat_id: ConversationId,
    pub first_name: Option<String>,
    pub level: u8,
    pub total_score: i64,
    pub monthly_income: Decimal,
    pub onboarding_completed: bool,
    pub strategy: Option<DebtStrategy>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub kind: AccountKind,
    pub name: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Debt {
    pub id: DebtId,
    pub name: String,
    pub total: Decimal,
    pub remaining: Decimal,
    pub rate: Decimal,
    pub min_payment: Decimal,
    pub due_day: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub id: i64,
    pub kind: GoalKind,
    pub name: String,
    pub target: Decimal,
    pub saved: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    Income,
    Expense,
}

impl TxKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TxKind::Income => "income",
            TxKind::Expense => "expense",
        }
    }
}

/// Returned by `add_score` when the new total crosses a level threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub level: u8,
    pub name: &'static str,
}

/// Result of applying a payment to a debt.
#[derive(Debug, Clone, PartialEq)]
pub struct DebtPayment {
    pub debt_name: String,
    pub remaining: Decimal,
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressStats {
    pub transactions: i64,
    pub active_debts: i64,
    pub active_goals: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonthSummary {
    pub income: Decimal,
    pub expense: Decimal,
}

// ============================================================================
// Formatting
// ============================================================================

/// Whole-ruble rendering with spaces as thousands separators.
pub fn fmt_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(0);
    let raw = rounded.to_string();
    let (sign, digits) = raw
        .strip_prefix('-')
        .map_or(("", raw.as_str()), |rest| ("-", rest));
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped} ₽")
}
