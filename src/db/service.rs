use crate::db::models::{Message, User, UserSummary};
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{params, Connection, Result as DbResult, Row};
use uuid::Uuid;

pub struct DbService;

const USER_COLS: &str = "id, subject, username, display_name, avatar_url, is_online, \
     CAST(last_seen AS VARCHAR), CAST(created_at AS VARCHAR)";

const MESSAGE_COLS: &str = "m.id, m.sender_id, m.receiver_id, m.content, m.is_read, \
     CAST(m.sent_at AS VARCHAR), u.id, u.username, u.display_name, u.avatar_url";

impl DbService {
    // DuckDB returns timestamps without an offset when cast to VARCHAR, so we
    // try the naive format first and fall back to RFC 3339.
    fn parse_ts(raw: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
            .map(|n| n.and_utc())
            .or_else(|_| raw.parse::<DateTime<Utc>>())
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_user(row: &Row) -> DbResult<User> {
        let last_seen: String = row.get(6)?;
        let created_at: String = row.get(7)?;

        Ok(User {
            id: row.get::<_, String>(0)?.parse().unwrap_or_default(),
            subject: row.get(1)?,
            username: row.get(2)?,
            display_name: row.get(3)?,
            avatar_url: row.get(4)?,
            is_online: row.get(5)?,
            last_seen: Self::parse_ts(&last_seen),
            created_at: Self::parse_ts(&created_at),
        })
    }

    fn row_to_message(row: &Row) -> DbResult<Message> {
        let sent_at: String = row.get(5)?;

        Ok(Message {
            id: row.get(0)?,
            sender_id: row.get::<_, String>(1)?.parse().unwrap_or_default(),
            receiver_id: row.get::<_, String>(2)?.parse().unwrap_or_default(),
            content: row.get(3)?,
            is_read: row.get(4)?,
            sent_at: Self::parse_ts(&sent_at),
            sender: UserSummary {
                id: row.get::<_, String>(6)?.parse().unwrap_or_default(),
                username: row.get(7)?,
                display_name: row.get(8)?,
                avatar_url: row.get(9)?,
            },
        })
    }

    // --- User Operations ---

    pub fn create_user(
        conn: &Connection,
        subject: &str,
        username: &str,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> DbResult<User> {
        let id = Uuid::new_v4();

        conn.execute(
            "INSERT INTO users (id, subject, username, display_name, avatar_url) \
             VALUES (?, ?, ?, ?, ?)",
            params![id.to_string(), subject, username, display_name, avatar_url],
        )?;

        Self::get_user(conn, id).map(|u| u.unwrap())
    }

    pub fn get_user(conn: &Connection, id: Uuid) -> DbResult<Option<User>> {
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM users WHERE id = ?", USER_COLS))?;
        let mut rows = stmt.query_map(params![id.to_string()], Self::row_to_user)?;

        if let Some(row) = rows.next() {
            Ok(Some(row?))
        } else {
            Ok(None)
        }
    }

    pub fn find_user_by_subject(conn: &Connection, subject: &str) -> DbResult<Option<User>> {
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM users WHERE subject = ?", USER_COLS))?;
        let mut rows = stmt.query_map(params![subject], Self::row_to_user)?;

        if let Some(row) = rows.next() {
            Ok(Some(row?))
        } else {
            Ok(None)
        }
    }

    /// Mirror a presence transition into the durable store. `last_seen` is
    /// refreshed on both edges so it doubles as a connect timestamp.
    pub fn set_presence(conn: &Connection, id: Uuid, online: bool) -> DbResult<()> {
        conn.execute(
            "UPDATE users SET is_online = ?, last_seen = CURRENT_TIMESTAMP WHERE id = ?",
            params![online, id.to_string()],
        )?;
        Ok(())
    }

    // --- Message Operations ---

    pub fn insert_message(
        conn: &Connection,
        sender: &User,
        receiver_id: Uuid,
        content: &str,
    ) -> DbResult<Message> {
        conn.execute(
            "INSERT INTO messages (sender_id, receiver_id, content) VALUES (?, ?, ?)",
            params![sender.id.to_string(), receiver_id.to_string(), content],
        )?;

        // Fetch the message we just inserted (the ID comes from a sequence)
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM messages m JOIN users u ON u.id = m.sender_id \
             WHERE m.sender_id = ? AND m.receiver_id = ? \
             ORDER BY m.id DESC LIMIT 1",
            MESSAGE_COLS
        ))?;
        let mut rows = stmt.query_map(
            params![sender.id.to_string(), receiver_id.to_string()],
            Self::row_to_message,
        )?;

        Ok(rows.next().unwrap()?)
    }

    /// Flip the read flag on the given messages, scoped to the reader's own
    /// inbox. Ids addressed to other receivers are left untouched. Returns
    /// the (message id, original sender) pairs that actually flipped, so the
    /// caller can echo read receipts to the right users.
    pub fn mark_read(
        conn: &Connection,
        reader_id: Uuid,
        message_ids: &[i64],
    ) -> DbResult<Vec<(i64, Uuid)>> {
        let mut flipped = Vec::new();

        for &id in message_ids {
            let mut stmt = conn.prepare(
                "SELECT sender_id FROM messages \
                 WHERE id = ? AND receiver_id = ? AND is_read = FALSE",
            )?;
            let mut rows = stmt.query_map(params![id, reader_id.to_string()], |row| {
                row.get::<_, String>(0)
            })?;

            let sender_id = match rows.next() {
                Some(raw) => raw?.parse::<Uuid>().unwrap_or_default(),
                None => continue,
            };

            conn.execute("UPDATE messages SET is_read = TRUE WHERE id = ?", params![id])?;
            flipped.push((id, sender_id));
        }

        Ok(flipped)
    }

    /// Conversation history between two users, oldest first within the page.
    pub fn conversation(
        conn: &Connection,
        user_id: Uuid,
        other_id: Uuid,
        limit: usize,
        offset: usize,
    ) -> DbResult<Vec<Message>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM messages m JOIN users u ON u.id = m.sender_id \
             WHERE (m.sender_id = ? AND m.receiver_id = ?) \
                OR (m.sender_id = ? AND m.receiver_id = ?) \
             ORDER BY m.sent_at DESC, m.id DESC LIMIT ? OFFSET ?",
            MESSAGE_COLS
        ))?;

        let rows = stmt.query_map(
            params![
                user_id.to_string(),
                other_id.to_string(),
                other_id.to_string(),
                user_id.to_string(),
                limit as i64,
                offset as i64
            ],
            Self::row_to_message,
        )?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        // Page is fetched newest-first; callers want chronological order.
        messages.reverse();
        Ok(messages)
    }

    pub fn conversation_total(conn: &Connection, user_id: Uuid, other_id: Uuid) -> DbResult<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM messages \
             WHERE (sender_id = ? AND receiver_id = ?) OR (sender_id = ? AND receiver_id = ?)",
            params![
                user_id.to_string(),
                other_id.to_string(),
                other_id.to_string(),
                user_id.to_string()
            ],
            |row| row.get(0),
        )
    }

    pub fn unread_count(conn: &Connection, user_id: Uuid) -> DbResult<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = ? AND is_read = FALSE",
            params![user_id.to_string()],
            |row| row.get(0),
        )
    }
}
