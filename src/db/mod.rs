//! Persistence for user profiles, accounts, debts, goals, and transactions.
//!
//! A thread-safe handle over a single sqlite connection, following the
//! usual pattern of cloning the handle and locking per call. Scoring lives
//! here too: `add_score` adds points and reports a level-up when the new
//! total crosses the next threshold.

mod schema;

pub use schema::SCHEMA;

use crate::domain::{
    Account, AccountKind, Debt, DebtId, DebtPayment, DebtStrategy, Goal, GoalKind, LevelUp,
    MonthSummary, ProgressStats, TxKind, UserId, UserProfile, LEVELS,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("User not found: {0}")]
    UserNotFound(UserId),
    #[error("Debt not found or already closed: {0}")]
    DebtNotFound(DebtId),
    #[error("Stored value could not be decoded: {0}")]
    Decode(String),
}

pub type DbResult<T> = Result<T, DbError>;

fn parse_money(raw: &str) -> DbResult<Decimal> {
    raw.parse::<Decimal>()
        .map_err(|_| DbError::Decode(format!("bad decimal '{raw}'")))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<(UserProfile, Option<String>, String)> {
    // Decimal/enum columns come back raw; the caller finishes decoding so
    // decode failures surface as DbError instead of rusqlite errors.
    Ok((
        UserProfile {
            user_id: row.get(0)?,
            chat_id: row.get(1)?,
            first_name: row.get(2)?,
            level: row.get::<_, i64>(3)?.try_into().unwrap_or(1),
            total_score: row.get(4)?,
            monthly_income: Decimal::ZERO,
            onboarding_completed: row.get(6)?,
            strategy: None,
        },
        row.get(7)?,
        row.get(5)?,
    ))
}

const USER_COLUMNS: &str = "user_id, chat_id, first_name, current_level, total_score, \
                            monthly_income, onboarding_completed, debt_strategy";

/// Thread-safe database handle.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Users ====================

    pub fn get_user(&self, chat_id: i64) -> DbResult<Option<UserProfile>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE chat_id = ?1"),
                params![chat_id],
                user_from_row,
            )
            .optional()?;
        row.map(Self::finish_user).transpose()
    }

    /// Fetch the profile, creating it on first contact.
    pub fn ensure_user(&self, chat_id: i64, first_name: Option<&str>) -> DbResult<UserProfile> {
        if let Some(user) = self.get_user(chat_id)? {
            return Ok(user);
        }
        {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO users (chat_id, first_name) VALUES (?1, ?2)",
                params![chat_id, first_name],
            )?;
        }
        self.get_user(chat_id)?
            .ok_or(DbError::UserNotFound(chat_id))
    }

    fn finish_user(
        (mut user, strategy, income): (UserProfile, Option<String>, String),
    ) -> DbResult<UserProfile> {
        user.monthly_income = parse_money(&income)?;
        user.strategy = match strategy {
            // Tolerate values written by other builds rather than failing
            // the whole profile read.
            Some(slug) => DebtStrategy::from_slug(&slug),
            None => None,
        };
        Ok(user)
    }

    pub fn set_monthly_income(&self, user_id: UserId, income: Decimal) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE users SET monthly_income = ?1 WHERE user_id = ?2",
            params![income.to_string(), user_id],
        )?;
        if updated == 0 {
            return Err(DbError::UserNotFound(user_id));
        }
        Ok(())
    }

    pub fn set_strategy(&self, user_id: UserId, strategy: DebtStrategy) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE users SET debt_strategy = ?1 WHERE user_id = ?2",
            params![strategy.slug(), user_id],
        )?;
        if updated == 0 {
            return Err(DbError::UserNotFound(user_id));
        }
        Ok(())
    }

    pub fn complete_onboarding(&self, user_id: UserId) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE users SET onboarding_completed = 1 WHERE user_id = ?1",
            params![user_id],
        )?;
        if updated == 0 {
            return Err(DbError::UserNotFound(user_id));
        }
        Ok(())
    }

    /// Add points and promote the user when the new total crosses the next
    /// level threshold. One promotion per call.
    pub fn add_score(&self, user_id: UserId, points: i64) -> DbResult<Option<LevelUp>> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE users SET total_score = total_score + ?1 WHERE user_id = ?2",
            params![points, user_id],
        )?;
        if updated == 0 {
            return Err(DbError::UserNotFound(user_id));
        }
        let (total, level): (i64, i64) = conn.query_row(
            "SELECT total_score, current_level FROM users WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        for def in LEVELS {
            if i64::from(def.level) > level && total >= def.score {
                conn.execute(
                    "UPDATE users SET current_level = ?1 WHERE user_id = ?2",
                    params![def.level, user_id],
                )?;
                return Ok(Some(LevelUp {
                    level: def.level,
                    name: def.name,
                }));
            }
        }
        Ok(None)
    }

    // ==================== Accounts ====================

    pub fn insert_account(
        &self,
        user_id: UserId,
        kind: AccountKind,
        name: &str,
        balance: Decimal,
    ) -> DbResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO accounts (user_id, account_type, account_name, balance)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, kind.slug(), name, balance.to_string()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_accounts(&self, user_id: UserId) -> DbResult<Vec<Account>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT account_id, account_type, account_name, balance
             FROM accounts WHERE user_id = ?1 ORDER BY account_id",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut accounts = Vec::new();
        for row in rows {
            let (id, kind, name, balance) = row?;
            accounts.push(Account {
                id,
                kind: AccountKind::from_slug(&kind)
                    .ok_or_else(|| DbError::Decode(format!("bad account type '{kind}'")))?,
                name,
                balance: parse_money(&balance)?,
            });
        }
        Ok(accounts)
    }

    // ==================== Debts ====================

    pub fn insert_debt(
        &self,
        user_id: UserId,
        name: &str,
        amount: Decimal,
        rate: Decimal,
        min_payment: Decimal,
        due_day: u8,
    ) -> DbResult<DebtId> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO debts (user_id, debt_name, total_amount, remaining_amount,
                                interest_rate, minimum_payment, due_day, status)
             VALUES (?1, ?2, ?3, ?3, ?4, ?5, ?6, 'active')",
            params![
                user_id,
                name,
                amount.to_string(),
                rate.to_string(),
                min_payment.to_string(),
                due_day,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_active_debts(&self, user_id: UserId) -> DbResult<Vec<Debt>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT debt_id, debt_name, total_amount, remaining_amount,
                    interest_rate, minimum_payment, due_day
             FROM debts WHERE user_id = ?1 AND status = 'active' ORDER BY debt_id",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Option<i64>>(6)?,
            ))
        })?;
        let mut debts = Vec::new();
        for row in rows {
            let (id, name, total, remaining, rate, min_payment, due_day) = row?;
            debts.push(Debt {
                id,
                name,
                total: parse_money(&total)?,
                remaining: parse_money(&remaining)?,
                rate: parse_money(&rate)?,
                min_payment: parse_money(&min_payment)?,
                due_day: due_day.and_then(|d| u8::try_from(d).ok()).unwrap_or(1),
            });
        }
        Ok(debts)
    }

    /// Apply a payment: decrement the remaining amount, close the debt at
    /// zero, and record the payment as a savings-group transaction, all in
    /// one database transaction.
    pub fn apply_debt_payment(
        &self,
        user_id: UserId,
        debt_id: DebtId,
        amount: Decimal,
        date: NaiveDate,
    ) -> DbResult<DebtPayment> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let row: Option<(String, String)> = tx
            .query_row(
                "SELECT debt_name, remaining_amount FROM debts
                 WHERE debt_id = ?1 AND user_id = ?2 AND status = 'active'",
                params![debt_id, user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((debt_name, remaining_raw)) = row else {
            return Err(DbError::DebtNotFound(debt_id));
        };

        let remaining = (parse_money(&remaining_raw)? - amount).max(Decimal::ZERO);
        let closed = remaining == Decimal::ZERO;
        tx.execute(
            "UPDATE debts SET remaining_amount = ?1, status = ?2 WHERE debt_id = ?3",
            params![
                remaining.to_string(),
                if closed { "paid" } else { "active" },
                debt_id,
            ],
        )?;
        tx.execute(
            "INSERT INTO transactions
                 (user_id, amount, transaction_type, category, description, transaction_date)
             VALUES (?1, ?2, 'expense', ?3, ?4, ?5)",
            params![
                user_id,
                amount.to_string(),
                crate::domain::DEBT_PAYDOWN_CATEGORY,
                format!("Payment: {debt_name}"),
                date.to_string(),
            ],
        )?;
        tx.commit()?;

        Ok(DebtPayment {
            debt_name,
            remaining,
            closed,
        })
    }

    // ==================== Goals ====================

    pub fn insert_goal(
        &self,
        user_id: UserId,
        kind: GoalKind,
        name: &str,
        target: Decimal,
    ) -> DbResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO goals (user_id, goal_type, goal_name, target_amount)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, kind.slug(), name, target.to_string()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_active_goals(&self, user_id: UserId) -> DbResult<Vec<Goal>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT goal_id, goal_type, goal_name, target_amount, current_amount
             FROM goals WHERE user_id = ?1 AND status = 'active' ORDER BY goal_id",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;
        let mut goals = Vec::new();
        for row in rows {
            let (id, kind, name, target, saved) = row?;
            goals.push(Goal {
                id,
                kind: GoalKind::from_slug(&kind)
                    .ok_or_else(|| DbError::Decode(format!("bad goal type '{kind}'")))?,
                name,
                target: parse_money(&target)?,
                saved: parse_money(&saved)?,
            });
        }
        Ok(goals)
    }

    // ==================== Transactions & reports ====================

    pub fn insert_transaction(
        &self,
        user_id: UserId,
        kind: TxKind,
        amount: Decimal,
        category: &str,
        description: &str,
        date: NaiveDate,
    ) -> DbResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO transactions
                 (user_id, amount, transaction_type, category, description, transaction_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                amount.to_string(),
                kind.as_str(),
                category,
                description,
                date.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Income and expense totals for transactions on or after `from`.
    pub fn month_summary(&self, user_id: UserId, from: NaiveDate) -> DbResult<MonthSummary> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT transaction_type, amount FROM transactions
             WHERE user_id = ?1 AND transaction_date >= ?2",
        )?;
        let rows = stmt.query_map(params![user_id, from.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut summary = MonthSummary::default();
        for row in rows {
            let (kind, amount) = row?;
            let amount = parse_money(&amount)?;
            match kind.as_str() {
                "income" => summary.income += amount,
                _ => summary.expense += amount,
            }
        }
        Ok(summary)
    }

    /// Expense totals per category for transactions on or after `from`.
    pub fn month_expenses_by_category(
        &self,
        user_id: UserId,
        from: NaiveDate,
    ) -> DbResult<Vec<(String, Decimal)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT COALESCE(category, ''), amount FROM transactions
             WHERE user_id = ?1 AND transaction_type = 'expense' AND transaction_date >= ?2",
        )?;
        let rows = stmt.query_map(params![user_id, from.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut totals: HashMap<String, Decimal> = HashMap::new();
        for row in rows {
            let (category, amount) = row?;
            *totals.entry(category).or_default() += parse_money(&amount)?;
        }
        let mut out: Vec<_> = totals.into_iter().collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    pub fn progress_stats(&self, user_id: UserId) -> DbResult<ProgressStats> {
        let conn = self.conn.lock().unwrap();
        let transactions = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        let active_debts = conn.query_row(
            "SELECT COUNT(*) FROM debts WHERE user_id = ?1 AND status = 'active'",
            params![user_id],
            |row| row.get(0),
        )?;
        let active_goals = conn.query_row(
            "SELECT COUNT(*) FROM goals WHERE user_id = ?1 AND status = 'active'",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(ProgressStats {
            transactions,
            active_debts,
            active_goals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn ensure_user_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let first = db.ensure_user(100, Some("Alex")).unwrap();
        let second = db.ensure_user(100, Some("Alex")).unwrap();
        assert_eq!(first.user_id, second.user_id);
        assert_eq!(first.level, 1);
        assert!(!first.onboarding_completed);
    }

    #[test]
    fn add_score_promotes_on_threshold() {
        let db = Database::open_in_memory().unwrap();
        let user = db.ensure_user(100, None).unwrap();

        assert_eq!(db.add_score(user.user_id, 399).unwrap(), None);
        let up = db.add_score(user.user_id, 1).unwrap().unwrap();
        assert_eq!(up.level, 2);

        // One promotion per call, even when the total skips a threshold.
        let up = db.add_score(user.user_id, 5000).unwrap().unwrap();
        assert_eq!(up.level, 3);

        let user = db.get_user(100).unwrap().unwrap();
        assert_eq!(user.total_score, 5400);
        assert_eq!(user.level, 3);
    }

    #[test]
    fn profile_round_trips_income_and_strategy() {
        let db = Database::open_in_memory().unwrap();
        let user = db.ensure_user(100, None).unwrap();
        db.set_monthly_income(user.user_id, Decimal::new(120_000_50, 2))
            .unwrap();
        db.set_strategy(user.user_id, DebtStrategy::Snowball).unwrap();
        db.complete_onboarding(user.user_id).unwrap();

        let user = db.get_user(100).unwrap().unwrap();
        assert_eq!(user.monthly_income, Decimal::new(120_000_50, 2));
        assert_eq!(user.strategy, Some(DebtStrategy::Snowball));
        assert!(user.onboarding_completed);
    }

    #[test]
    fn debt_payment_decrements_and_closes() {
        let db = Database::open_in_memory().unwrap();
        let user = db.ensure_user(100, None).unwrap();
        let debt_id = db
            .insert_debt(
                user.user_id,
                "Bank loan",
                Decimal::from(10_000),
                Decimal::new(155, 1),
                Decimal::from(1_000),
                15,
            )
            .unwrap();

        let payment = db
            .apply_debt_payment(user.user_id, debt_id, Decimal::from(4_000), date("2026-08-23"))
            .unwrap();
        assert_eq!(payment.remaining, Decimal::from(6_000));
        assert!(!payment.closed);

        // Overpayment clamps to zero and closes the debt.
        let payment = db
            .apply_debt_payment(user.user_id, debt_id, Decimal::from(7_000), date("2026-08-24"))
            .unwrap();
        assert_eq!(payment.remaining, Decimal::ZERO);
        assert!(payment.closed);
        assert!(db.list_active_debts(user.user_id).unwrap().is_empty());

        // A closed debt cannot be paid again.
        let err = db
            .apply_debt_payment(user.user_id, debt_id, Decimal::ONE, date("2026-08-25"))
            .unwrap_err();
        assert!(matches!(err, DbError::DebtNotFound(_)));
    }

    #[test]
    fn debt_payment_checks_ownership() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.ensure_user(100, None).unwrap();
        let other = db.ensure_user(200, None).unwrap();
        let debt_id = db
            .insert_debt(
                owner.user_id,
                "Bank loan",
                Decimal::from(10_000),
                Decimal::ZERO,
                Decimal::ZERO,
                1,
            )
            .unwrap();

        let err = db
            .apply_debt_payment(other.user_id, debt_id, Decimal::ONE, date("2026-08-23"))
            .unwrap_err();
        assert!(matches!(err, DbError::DebtNotFound(_)));
    }

    #[test]
    fn month_summary_sums_exactly() {
        let db = Database::open_in_memory().unwrap();
        let user = db.ensure_user(100, None).unwrap();
        db.insert_transaction(
            user.user_id,
            TxKind::Income,
            Decimal::new(1_000_10, 2),
            "Income",
            "",
            date("2026-08-01"),
        )
        .unwrap();
        db.insert_transaction(
            user.user_id,
            TxKind::Expense,
            Decimal::new(200_05, 2),
            "Groceries 🛒",
            "",
            date("2026-08-02"),
        )
        .unwrap();
        // Older than the window: ignored.
        db.insert_transaction(
            user.user_id,
            TxKind::Expense,
            Decimal::from(999),
            "Groceries 🛒",
            "",
            date("2026-07-31"),
        )
        .unwrap();

        let summary = db.month_summary(user.user_id, date("2026-08-01")).unwrap();
        assert_eq!(summary.income, Decimal::new(1_000_10, 2));
        assert_eq!(summary.expense, Decimal::new(200_05, 2));

        let by_cat = db
            .month_expenses_by_category(user.user_id, date("2026-08-01"))
            .unwrap();
        assert_eq!(by_cat, vec![("Groceries 🛒".to_string(), Decimal::new(200_05, 2))]);
    }

    #[test]
    fn on_disk_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finquest.db");
        {
            let db = Database::open(&path).unwrap();
            db.ensure_user(100, Some("Alex")).unwrap();
        }
        let db = Database::open(&path).unwrap();
        let user = db.get_user(100).unwrap().unwrap();
        assert_eq!(user.first_name.as_deref(), Some("Alex"));
    }
}
