//! SQLite storage for leveling and moderation cases.

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Result as SqlResult, Row, params};
use serenity::all::UserId;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// One row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: UserId,
    pub xp: u64,
    pub level_notifs: bool,
    pub last_message_time: Option<DateTime<Utc>>,
}

impl UserRecord {
    fn from_row(row: &Row<'_>) -> SqlResult<Self> {
        Ok(Self {
            user_id: UserId::new(row.get(0)?),
            xp: row.get(1)?,
            level_notifs: row.get(2)?,
            last_message_time: row.get(3)?,
        })
    }
}

/// A leaderboard row: the user plus their rank among everyone stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedUser {
    pub rank: u64,
    pub user: UserRecord,
}

/// Outcome of awarding message XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpAward {
    pub old_xp: u64,
    pub new_xp: u64,
    pub level_notifs: bool,
    /// Whether the user had a row before this award.
    pub existed: bool,
}

/// The kinds of action that open a moderation case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseType {
    Warning,
    Timeout,
    Kick,
    Ban,
}

impl CaseType {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseType::Warning => "WARNING",
            CaseType::Timeout => "TIMEOUT",
            CaseType::Kick => "KICK",
            CaseType::Ban => "BAN",
        }
    }
}

impl ToSql for CaseType {
    fn to_sql(&self) -> SqlResult<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CaseType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "WARNING" => Ok(CaseType::Warning),
            "TIMEOUT" => Ok(CaseType::Timeout),
            "KICK" => Ok(CaseType::Kick),
            "BAN" => Ok(CaseType::Ban),
            other => Err(FromSqlError::Other(
                format!("unknown case type {}", other).into(),
            )),
        }
    }
}

/// A case about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCase {
    pub case_type: CaseType,
    pub user_id: UserId,
    pub moderator_id: UserId,
    pub reason: String,
    /// Timeout length for timeouts. For bans, the wait before the user may
    /// appeal, where `None` means never.
    pub duration: Option<Duration>,
}

/// One row of the `cases` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRecord {
    pub id: u64,
    pub case_type: CaseType,
    pub user_id: UserId,
    pub moderator_id: UserId,
    pub reason: String,
    pub duration: Option<Duration>,
    pub created_at: DateTime<Utc>,
}

impl CaseRecord {
    fn from_row(row: &Row<'_>) -> SqlResult<Self> {
        let duration: Option<u64> = row.get(5)?;
        Ok(Self {
            id: row.get(0)?,
            case_type: row.get(1)?,
            user_id: UserId::new(row.get(2)?),
            moderator_id: UserId::new(row.get(3)?),
            reason: row.get(4)?,
            duration: duration.map(Duration::from_secs),
            created_at: row.get(6)?,
        })
    }
}

const CASE_COLUMNS: &str =
    "id, type, user_id, moderator_id, reason, duration_secs, created_at";

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> SqlResult<Self> {
        let path = path.as_ref();
        debug!("Opening database at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> SqlResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> SqlResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                xp INTEGER NOT NULL DEFAULT 0,
                level_notifs BOOLEAN NOT NULL DEFAULT 1,
                last_message_time TEXT
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                moderator_id INTEGER NOT NULL,
                reason TEXT NOT NULL,
                duration_secs INTEGER,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS cases_by_user ON cases (user_id, id)",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// A panic while holding the lock can't leave a half-applied statement
    /// behind, so a poisoned lock is still usable.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get_user(&self, user_id: UserId) -> SqlResult<Option<UserRecord>> {
        self.conn()
            .query_row(
                "SELECT user_id, xp, level_notifs, last_message_time FROM users WHERE user_id = ?1",
                params![user_id.get()],
                UserRecord::from_row,
            )
            .optional()
    }

    /// Adds `amount` XP and stamps the message time, creating the user if needed.
    pub fn award_xp(&self, user_id: UserId, amount: u64, at: DateTime<Utc>) -> SqlResult<XpAward> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let existing: Option<(u64, bool)> = tx
            .query_row(
                "SELECT xp, level_notifs FROM users WHERE user_id = ?1",
                params![user_id.get()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (old_xp, level_notifs) = existing.unwrap_or((0, true));
        let new_xp = old_xp.saturating_add(amount);

        tx.execute(
            "INSERT INTO users (user_id, xp, last_message_time) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET xp = excluded.xp, last_message_time = excluded.last_message_time",
            params![user_id.get(), new_xp, at],
        )?;
        tx.commit()?;

        Ok(XpAward {
            old_xp,
            new_xp,
            level_notifs,
            existed: existing.is_some(),
        })
    }

    pub fn set_xp(&self, user_id: UserId, xp: u64) -> SqlResult<()> {
        self.conn().execute(
            "INSERT INTO users (user_id, xp) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET xp = excluded.xp",
            params![user_id.get(), xp],
        )?;
        Ok(())
    }

    pub fn set_level_notifs(&self, user_id: UserId, enabled: bool) -> SqlResult<()> {
        self.conn().execute(
            "INSERT INTO users (user_id, level_notifs) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET level_notifs = excluded.level_notifs",
            params![user_id.get(), enabled],
        )?;
        Ok(())
    }

    /// 1-based rank of a user holding `xp`: everyone with strictly more XP, plus one.
    pub fn rank_for_xp(&self, xp: u64) -> SqlResult<u64> {
        let above: u64 = self.conn().query_row(
            "SELECT COUNT(*) FROM users WHERE xp > ?1",
            params![xp],
            |row| row.get(0),
        )?;
        Ok(above + 1)
    }

    /// Highest XP first; ties are listed by user id but share the rank
    /// [`Self::rank_for_xp`] gives them.
    pub fn top_users(&self, limit: usize) -> SqlResult<Vec<RankedUser>> {
        let conn = self.conn();
        let mut statement = conn.prepare(
            "SELECT user_id, xp, level_notifs, last_message_time,
                    (SELECT COUNT(*) FROM users AS above WHERE above.xp > users.xp) + 1
             FROM users
             ORDER BY xp DESC, user_id ASC LIMIT ?1",
        )?;
        let rows = statement.query_map(params![limit as u64], |row| {
            Ok(RankedUser {
                rank: row.get(4)?,
                user: UserRecord::from_row(row)?,
            })
        })?;
        rows.collect()
    }

    pub fn user_count(&self) -> SqlResult<u64> {
        self.conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
    }

    /// Records a case and hands back the stored row with its id.
    pub fn create_case(&self, case: &NewCase, at: DateTime<Utc>) -> SqlResult<CaseRecord> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO cases (type, user_id, moderator_id, reason, duration_secs, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                case.case_type,
                case.user_id.get(),
                case.moderator_id.get(),
                case.reason,
                case.duration.map(|duration| duration.as_secs()),
                at,
            ],
        )?;
        let id = conn.last_insert_rowid() as u64;
        debug!("Opened case #{} ({})", id, case.case_type.as_str());

        Ok(CaseRecord {
            id,
            case_type: case.case_type,
            user_id: case.user_id,
            moderator_id: case.moderator_id,
            reason: case.reason.clone(),
            duration: case.duration,
            created_at: at,
        })
    }

    pub fn get_case(&self, id: u64) -> SqlResult<Option<CaseRecord>> {
        self.conn()
            .query_row(
                &format!("SELECT {} FROM cases WHERE id = ?1", CASE_COLUMNS),
                params![id],
                CaseRecord::from_row,
            )
            .optional()
    }

    /// A user's cases, newest first.
    pub fn cases_for_user(
        &self,
        user_id: UserId,
        limit: usize,
        offset: usize,
    ) -> SqlResult<Vec<CaseRecord>> {
        let conn = self.conn();
        let mut statement = conn.prepare(&format!(
            "SELECT {} FROM cases WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2 OFFSET ?3",
            CASE_COLUMNS
        ))?;
        let rows = statement.query_map(
            params![user_id.get(), limit as u64, offset as u64],
            CaseRecord::from_row,
        )?;
        rows.collect()
    }

    pub fn case_count_for_user(&self, user_id: UserId) -> SqlResult<u64> {
        self.conn().query_row(
            "SELECT COUNT(*) FROM cases WHERE user_id = ?1",
            params![user_id.get()],
            |row| row.get(0),
        )
    }

    /// Returns whether a case with that id existed.
    pub fn delete_case(&self, id: u64) -> SqlResult<bool> {
        let deleted = self
            .conn()
            .execute("DELETE FROM cases WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn db() -> Database {
        Database::open_in_memory().expect("in-memory database")
    }

    #[test]
    fn first_award_creates_the_user() {
        let db = db();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let award = db.award_xp(UserId::new(7), 5, at).unwrap();
        assert_eq!(
            award,
            XpAward {
                old_xp: 0,
                new_xp: 5,
                level_notifs: true,
                existed: false,
            }
        );

        let user = db.get_user(UserId::new(7)).unwrap().unwrap();
        assert_eq!(user.xp, 5);
        assert!(user.level_notifs);
        assert_eq!(user.last_message_time, Some(at));
    }

    #[test]
    fn awards_accumulate_and_keep_preferences() {
        let db = db();
        let user = UserId::new(7);
        db.set_level_notifs(user, false).unwrap();
        db.award_xp(user, 5, Utc::now()).unwrap();

        let award = db.award_xp(user, 5, Utc::now()).unwrap();
        assert_eq!(award.old_xp, 5);
        assert_eq!(award.new_xp, 10);
        assert!(!award.level_notifs);
        assert!(award.existed);
    }

    #[test]
    fn set_xp_overwrites() {
        let db = db();
        let user = UserId::new(3);
        db.award_xp(user, 5, Utc::now()).unwrap();
        db.set_xp(user, 1234).unwrap();

        assert_eq!(db.get_user(user).unwrap().unwrap().xp, 1234);
        assert_eq!(db.get_user(UserId::new(4)).unwrap(), None);
    }

    #[test]
    fn ranks_and_ordering() {
        let db = db();
        db.set_xp(UserId::new(1), 50).unwrap();
        db.set_xp(UserId::new(2), 300).unwrap();
        db.set_xp(UserId::new(3), 300).unwrap();
        db.set_xp(UserId::new(4), 10).unwrap();

        assert_eq!(db.rank_for_xp(300).unwrap(), 1);
        assert_eq!(db.rank_for_xp(50).unwrap(), 3);
        assert_eq!(db.rank_for_xp(10).unwrap(), 4);
        assert_eq!(db.user_count().unwrap(), 4);

        let board: Vec<(u64, u64)> = db
            .top_users(3)
            .unwrap()
            .iter()
            .map(|row| (row.rank, row.user.user_id.get()))
            .collect();
        assert_eq!(board, vec![(1, 2), (1, 3), (3, 1)]);
    }

    fn warning(user: u64, reason: &str) -> NewCase {
        NewCase {
            case_type: CaseType::Warning,
            user_id: UserId::new(user),
            moderator_id: UserId::new(99),
            reason: reason.to_string(),
            duration: None,
        }
    }

    #[test]
    fn cases_get_sequential_ids_and_round_trip() {
        let db = db();
        let at = Utc.with_ymd_and_hms(2024, 6, 2, 8, 30, 0).unwrap();

        let first = db.create_case(&warning(5, "spam"), at).unwrap();
        let timeout = NewCase {
            case_type: CaseType::Timeout,
            duration: Some(Duration::from_secs(600)),
            ..warning(5, "more spam")
        };
        let second = db.create_case(&timeout, at).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(db.get_case(2).unwrap(), Some(second));
        assert_eq!(db.get_case(3).unwrap(), None);
    }

    #[test]
    fn lists_a_users_cases_newest_first() {
        let db = db();
        for reason in ["one", "two", "three"] {
            db.create_case(&warning(5, reason), Utc::now()).unwrap();
        }
        db.create_case(&warning(6, "someone else"), Utc::now()).unwrap();

        assert_eq!(db.case_count_for_user(UserId::new(5)).unwrap(), 3);
        let page: Vec<String> = db
            .cases_for_user(UserId::new(5), 2, 0)
            .unwrap()
            .into_iter()
            .map(|case| case.reason)
            .collect();
        assert_eq!(page, vec!["three", "two"]);

        let rest = db.cases_for_user(UserId::new(5), 2, 2).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].reason, "one");
    }

    #[test]
    fn deleting_a_case() {
        let db = db();
        let case = db.create_case(&warning(5, "oops"), Utc::now()).unwrap();

        assert!(db.delete_case(case.id).unwrap());
        assert!(!db.delete_case(case.id).unwrap());
        assert_eq!(db.case_count_for_user(UserId::new(5)).unwrap(), 0);
    }

    #[test]
    fn unknown_case_types_are_an_error() {
        let db = db();
        db.conn()
            .execute(
                "INSERT INTO cases (type, user_id, moderator_id, reason, created_at)
                 VALUES ('NOTE', 1, 2, 'x', '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();
        assert!(db.get_case(1).is_err());
    }
}
