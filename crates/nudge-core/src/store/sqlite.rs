//! SQLite-backed context store.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorCode, NudgeError, NudgeResult};
use crate::traits::ContextStore;
use crate::types::{
    Goal, GoalPriority, GoalStatus, Message, MessageKind, NewGoal, Preferences, Sender, UserProfile,
};

/// Counters reported by the stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_messages: u64,
    pub total_goals: u64,
    pub active_goals: u64,
    /// `healthy` or `disconnected`.
    pub health: String,
}

/// SQLite-based store for the message log, goals and the user profile.
///
/// Every write is a single statement, so appends are atomic without extra
/// locking in the caller.
#[derive(Clone)]
pub struct SqliteContextStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteContextStore {
    /// Open (or create) a store at `db_path`. `:memory:` opens an in-memory database.
    pub fn new(db_path: impl AsRef<Path>) -> NudgeResult<Self> {
        let path = db_path.as_ref();
        let conn = if path.to_str() == Some(":memory:") {
            Connection::open_in_memory()
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Connection::open(path)
        }
        .map_err(|e| NudgeError::Store {
            message: format!("failed to open {}: {}", path.display(), e),
            code: ErrorCode::DbConnectionFailed,
            source: Some(Box::new(e)),
        })?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.create_tables()?;
        Ok(store)
    }

    /// In-memory store, mostly for tests and the simulation transport.
    pub fn in_memory() -> NudgeResult<Self> {
        Self::new(":memory:")
    }

    fn conn(&self) -> NudgeResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| NudgeError::Store {
            message: "connection lock poisoned".to_string(),
            code: ErrorCode::DbLockPoisoned,
            source: None,
        })
    }

    fn create_tables(&self) -> NudgeResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id           TEXT PRIMARY KEY,
                sender       TEXT NOT NULL,
                content      TEXT NOT NULL,
                timestamp_ms INTEGER NOT NULL,
                kind         TEXT NOT NULL,
                channel      TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp_ms);
            CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender, timestamp_ms);

            CREATE TABLE IF NOT EXISTS goals (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                title         TEXT NOT NULL,
                description   TEXT NOT NULL DEFAULT '',
                status        TEXT NOT NULL,
                priority      TEXT NOT NULL,
                priority_rank INTEGER NOT NULL,
                deadline_ms   INTEGER,
                created_at_ms INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_goals_status ON goals(status);

            CREATE TABLE IF NOT EXISTS user_profile (
                id             INTEGER PRIMARY KEY CHECK (id = 1),
                name           TEXT NOT NULL,
                contact        TEXT,
                preferences    TEXT NOT NULL,
                social_handles TEXT NOT NULL,
                updated_at_ms  INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Insert a goal and return it with its assigned id.
    pub fn add_goal(&self, goal: &NewGoal) -> NudgeResult<Goal> {
        let title = goal.title.trim();
        if title.is_empty() {
            return Err(NudgeError::validation("goal title must not be empty"));
        }
        let created_at = Utc::now();
        let status = GoalStatus::Active;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO goals (title, description, status, priority, priority_rank, deadline_ms, created_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                title,
                goal.description,
                status.to_string(),
                goal.priority.to_string(),
                goal.priority.rank(),
                goal.deadline.map(|d| d.timestamp_millis()),
                created_at.timestamp_millis(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(goal_id = id, title = %title, "Stored goal");

        Ok(Goal {
            id,
            title: title.to_string(),
            description: goal.description.clone(),
            status,
            priority: goal.priority,
            deadline: goal.deadline.map(truncate_millis),
            created_at: truncate_millis(created_at),
        })
    }

    /// All goals, optionally filtered by status, highest priority first.
    pub fn list_goals(&self, status: Option<GoalStatus>) -> NudgeResult<Vec<Goal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, title, description, status, priority, deadline_ms, created_at_ms
            FROM goals
            WHERE ?1 IS NULL OR status = ?1
            ORDER BY priority_rank DESC, created_at_ms ASC, id ASC
            "#,
        )?;
        let rows = stmt
            .query_map([status.map(|s| s.to_string())], GoalRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(GoalRow::into_goal).collect()
    }

    /// Change a goal's status.
    pub fn update_goal_status(&self, id: i64, status: GoalStatus) -> NudgeResult<Goal> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE goals SET status = ?1 WHERE id = ?2",
            params![status.to_string(), id],
        )?;
        if updated == 0 {
            return Err(NudgeError::goal_not_found(id));
        }
        let row = conn.query_row(
            r#"
            SELECT id, title, description, status, priority, deadline_ms, created_at_ms
            FROM goals WHERE id = ?1
            "#,
            [id],
            GoalRow::from_row,
        )?;
        tracing::info!(goal_id = id, status = %status, "Updated goal status");
        row.into_goal()
    }

    /// Insert or replace the singleton profile.
    pub fn save_user_profile(&self, profile: &UserProfile) -> NudgeResult<()> {
        let preferences = serde_json::to_string(&profile.preferences)?;
        let social = serde_json::to_string(&profile.social_handles)?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO user_profile (id, name, contact, preferences, social_handles, updated_at_ms)
            VALUES (1, ?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                contact = excluded.contact,
                preferences = excluded.preferences,
                social_handles = excluded.social_handles,
                updated_at_ms = excluded.updated_at_ms
            "#,
            params![
                profile.name,
                profile.contact,
                preferences,
                social,
                Utc::now().timestamp_millis()
            ],
        )?;
        tracing::info!(name = %profile.name, "Updated user profile");
        Ok(())
    }

    /// Message and goal counters.
    pub fn stats(&self) -> NudgeResult<StoreStats> {
        let conn = self.conn()?;
        let count = |sql: &str| -> NudgeResult<u64> {
            let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n.max(0) as u64)
        };
        let total_messages = count("SELECT COUNT(*) FROM messages")?;
        let total_goals = count("SELECT COUNT(*) FROM goals")?;
        let active_goals = count("SELECT COUNT(*) FROM goals WHERE status = 'active'")?;
        Ok(StoreStats {
            total_messages,
            total_goals,
            active_goals,
            health: "healthy".to_string(),
        })
    }

    fn query_messages(&self, limit: usize) -> NudgeResult<Vec<Message>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, sender, content, timestamp_ms, kind, channel
            FROM messages
            ORDER BY timestamp_ms DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map([limit], MessageRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(MessageRow::into_message).collect()
    }
}

#[async_trait]
impl ContextStore for SqliteContextStore {
    async fn append_message(&self, message: &Message) -> NudgeResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO messages (id, sender, content, timestamp_ms, kind, channel)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                message.id.to_string(),
                message.sender.to_string(),
                message.content,
                message.timestamp.timestamp_millis(),
                message.kind.to_string(),
                message.channel,
            ],
        )?;
        tracing::debug!(sender = %message.sender, kind = %message.kind, "Stored message");
        Ok(())
    }

    async fn recent_messages(&self, limit: usize) -> NudgeResult<Vec<Message>> {
        self.query_messages(limit)
    }

    async fn active_goals(&self) -> NudgeResult<Vec<Goal>> {
        self.list_goals(Some(GoalStatus::Active))
    }

    async fn user_profile(&self) -> NudgeResult<Option<UserProfile>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT name, contact, preferences, social_handles FROM user_profile WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((name, contact, preferences, social)) = row else {
            return Ok(None);
        };
        let preferences: Preferences = serde_json::from_str(&preferences)?;
        let social_handles = serde_json::from_str(&social)?;
        Ok(Some(UserProfile {
            name,
            contact,
            preferences,
            social_handles,
        }))
    }

    async fn last_user_message_time(&self) -> NudgeResult<Option<DateTime<Utc>>> {
        let conn = self.conn()?;
        let ms: Option<i64> = conn.query_row(
            "SELECT MAX(timestamp_ms) FROM messages WHERE sender = ?1",
            [Sender::User.to_string()],
            |row| row.get(0),
        )?;
        ms.map(millis_to_datetime).transpose()
    }
}

struct MessageRow {
    id: String,
    sender: String,
    content: String,
    timestamp_ms: i64,
    kind: String,
    channel: String,
}

impl MessageRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            sender: row.get(1)?,
            content: row.get(2)?,
            timestamp_ms: row.get(3)?,
            kind: row.get(4)?,
            channel: row.get(5)?,
        })
    }

    fn into_message(self) -> NudgeResult<Message> {
        Ok(Message {
            id: Uuid::parse_str(&self.id).map_err(|e| corrupt("message id", &self.id, e))?,
            sender: parse_column("sender", &self.sender)?,
            content: self.content,
            timestamp: millis_to_datetime(self.timestamp_ms)?,
            kind: parse_column::<MessageKind>("kind", &self.kind)?,
            channel: self.channel,
        })
    }
}

struct GoalRow {
    id: i64,
    title: String,
    description: String,
    status: String,
    priority: String,
    deadline_ms: Option<i64>,
    created_at_ms: i64,
}

impl GoalRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            status: row.get(3)?,
            priority: row.get(4)?,
            deadline_ms: row.get(5)?,
            created_at_ms: row.get(6)?,
        })
    }

    fn into_goal(self) -> NudgeResult<Goal> {
        Ok(Goal {
            id: self.id,
            title: self.title,
            description: self.description,
            status: parse_column::<GoalStatus>("status", &self.status)?,
            priority: parse_column::<GoalPriority>("priority", &self.priority)?,
            deadline: self.deadline_ms.map(millis_to_datetime).transpose()?,
            created_at: millis_to_datetime(self.created_at_ms)?,
        })
    }
}

fn parse_column<T: FromStr>(column: &str, value: &str) -> NudgeResult<T>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| corrupt(column, value, e))
}

fn corrupt(column: &str, value: &str, err: impl std::fmt::Display) -> NudgeError {
    NudgeError::store(format!("invalid {} '{}' in database: {}", column, value, err))
}

fn millis_to_datetime(ms: i64) -> NudgeResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| NudgeError::store(format!("timestamp {} out of range", ms)))
}

fn truncate_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or(dt)
}
