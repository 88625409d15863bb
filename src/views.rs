//! Message rendering.
//!
//! Every function here is a pure formatter over domain records; the
//! dispatcher decides when to call them. Keeping them side-effect free makes
//! the copy easy to test and to change.

use crate::domain::{
    fmt_money, level_def, Account, BudgetGroup, Debt, Goal, MonthSummary, ProgressStats,
    UserProfile, CATEGORIES, LEVELS,
};
use rand::seq::SliceRandom;
use rust_decimal::Decimal;

pub fn help() -> String {
    "📖 Commands:\n\n\
     /start — begin or resume setup\n\
     /add_expense — record an expense\n\
     /add_income — record income\n\
     /add_account — add an account\n\
     /add_debt — add a debt\n\
     /pay_debt — record a debt payment\n\
     /add_goal — create a goal\n\n\
     /accounts — your accounts\n\
     /debts — your debts\n\
     /goals — your goals\n\
     /budget — 50/30/20 budget for this month\n\
     /summary — income and expenses this month\n\
     /level — your level and score\n\
     /progress — activity stats\n\
     /motivation — a nudge for your level"
        .to_string()
}

pub fn welcome_new(first_name: Option<&str>) -> String {
    let name = first_name.unwrap_or("there");
    format!(
        "👋 Hi {name}! I'm your personal finance coach.\n\n\
         I'll help you track money, pay down debts, and build savings.\n\
         Answer a few questions and we're off.",
    )
}

pub fn resume_setup() -> String {
    "Your setup isn't finished yet, so let's run through it again from the top.".to_string()
}

pub fn welcome_back(user: &UserProfile) -> String {
    let def = level_def(user.level);
    let name = user.first_name.as_deref().unwrap_or("there");
    format!(
        "👋 Welcome back, {name}!\n\n\
         Level {}: {}\n\
         Score: {} XP\n\n\
         /help to see what I can do.",
        def.level, def.name, user.total_score,
    )
}

pub fn onboarding_complete(user: &UserProfile) -> String {
    let def = level_def(user.level);
    format!(
        "🎯 Onboarding complete!\n\n\
         Level {}: {}\n\
         Score: {} XP\n\n\
         Record your first expense with /add_expense, or /help for the full list.",
        def.level, def.name, user.total_score,
    )
}

pub fn accounts(accounts: &[Account]) -> String {
    if accounts.is_empty() {
        return "You have no accounts yet. Add one with /add_account.".to_string();
    }
    let mut out = String::from("💼 Your accounts:\n");
    let mut total = Decimal::ZERO;
    for account in accounts {
        out.push_str(&format!(
            "\n{} — {} ({})",
            account.name,
            fmt_money(account.balance),
            account.kind.label(),
        ));
        total += account.balance;
    }
    out.push_str(&format!("\n\nTotal: {}", fmt_money(total)));
    out
}

pub fn debts(debts: &[Debt]) -> String {
    if debts.is_empty() {
        return "No active debts. 🎉".to_string();
    }
    let mut out = String::from("💳 Your debts:\n");
    for debt in debts {
        let paid_pct = if debt.total > Decimal::ZERO {
            ((debt.total - debt.remaining) / debt.total * Decimal::from(100)).round_dp(0)
        } else {
            Decimal::ZERO
        };
        out.push_str(&format!(
            "\n{} — {} left of {} ({paid_pct}% paid)\n\
             Rate {}%, minimum {} by day {}",
            debt.name,
            fmt_money(debt.remaining),
            fmt_money(debt.total),
            debt.rate,
            fmt_money(debt.min_payment),
            debt.due_day,
        ));
    }
    out.push_str("\n\nRecord a payment with /pay_debt.");
    out
}

pub fn goals(goals: &[Goal]) -> String {
    if goals.is_empty() {
        return "No goals yet. Create one with /add_goal.".to_string();
    }
    let mut out = String::from("🎯 Your goals:\n");
    for goal in goals {
        out.push_str(&format!(
            "\n{} ({}) — {} of {}",
            goal.name,
            goal.kind.label(),
            fmt_money(goal.saved),
            fmt_money(goal.target),
        ));
    }
    out
}

pub fn level(user: &UserProfile) -> String {
    let def = level_def(user.level);
    let mut out = format!(
        "🏆 Level {}: {}\nScore: {} XP",
        def.level, def.name, user.total_score,
    );
    if let Some(next) = LEVELS.iter().find(|l| l.score > user.total_score) {
        out.push_str(&format!(
            "\n\n{} XP to reach {}",
            next.score - user.total_score,
            next.name,
        ));
    } else {
        out.push_str("\n\nYou've reached the top level. 💎");
    }
    out
}

/// 50/30/20 budget: the income split per group against what was actually
/// spent this month. Spending in categories outside the fixed table does
/// not count against any group.
pub fn budget(income: Decimal, spent_by_category: &[(String, Decimal)]) -> String {
    if income == Decimal::ZERO {
        return "Set your monthly income first by finishing setup with /start.".to_string();
    }
    let mut out = format!("📊 Budget for {} of income:\n", fmt_money(income));
    for group in BudgetGroup::ALL {
        let limit = income * group.share();
        let spent: Decimal = spent_by_category
            .iter()
            .filter(|(name, _)| {
                CATEGORIES
                    .iter()
                    .any(|c| c.name == name.as_str() && c.group == group)
            })
            .map(|(_, amount)| *amount)
            .sum();
        let left = limit - spent;
        out.push_str(&format!(
            "\n{}\nSpent {} of {} — {} {}",
            group.label(),
            fmt_money(spent),
            fmt_money(limit),
            fmt_money(left.abs()),
            if left < Decimal::ZERO { "over ⚠️" } else { "left" },
        ));
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub fn summary(summary: &MonthSummary) -> String {
    let net = summary.income - summary.expense;
    format!(
        "📅 This month:\n\n\
         Income: {}\n\
         Expenses: {}\n\
         Net: {}",
        fmt_money(summary.income),
        fmt_money(summary.expense),
        fmt_money(net),
    )
}

pub fn progress(user: &UserProfile, stats: &ProgressStats) -> String {
    let def = level_def(user.level);
    format!(
        "📈 Your progress:\n\n\
         Level {}: {}\n\
         Score: {} XP\n\
         Transactions recorded: {}\n\
         Active debts: {}\n\
         Active goals: {}",
        def.level, def.name, user.total_score, stats.transactions, stats.active_debts,
        stats.active_goals,
    )
}

const MOTIVATION_EARLY: &[&str] = &[
    "💪 Every expense you record is a step toward control.",
    "🔥 Debts shrink one payment at a time. Keep going.",
    "🌱 Small consistent steps beat big occasional ones.",
];

const MOTIVATION_MID: &[&str] = &[
    "⚖️ Stability is built, not found. You're building it.",
    "📊 Your budget is a plan, not a punishment.",
    "🧱 Every month on budget is another brick in the wall.",
];

const MOTIVATION_LATE: &[&str] = &[
    "🚀 Money you invest today works for you tomorrow.",
    "💎 Freedom is choices. You're buying yours back.",
    "🏔 The view from financial independence is worth the climb.",
];

/// A random nudge keyed to the user's level band.
pub fn motivation(level: u8) -> String {
    let pool = match level {
        0..=2 => MOTIVATION_EARLY,
        3..=4 => MOTIVATION_MID,
        _ => MOTIVATION_LATE,
    };
    (*pool.choose(&mut rand::thread_rng()).unwrap_or(&pool[0])).to_string()
}

pub fn no_active_flow() -> String {
    "No question is waiting for an answer right now. /help lists the commands.".to_string()
}

pub fn flow_reset() -> String {
    "That conversation lost its place, so I've reset it. /help lists the commands.".to_string()
}

pub fn no_debts_to_pay() -> String {
    "You have no active debts to pay. 🎉".to_string()
}

pub fn finish_setup_first() -> String {
    "Finish setup first with /start, then this command will be available.".to_string()
}

pub fn level_up_line(name: &str) -> String {
    format!("\n\n🎉 LEVEL UP!\nYou reached: {name}!")
}

pub fn try_again() -> String {
    "Something went wrong while saving. Please try again.".to_string()
}
