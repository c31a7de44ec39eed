use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use super::{StoreError, UserStore};
use crate::models::UserRecord;

/// SQLite-backed player store. Each operation is a single conditional
/// statement, so the connection lock is never held across an await.
pub struct SqliteUserStore {
    conn: Mutex<Connection>,
}

impl SqliteUserStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            // Create parent directories if needed
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
            Connection::open(path)
        }
        .map_err(|e| StoreError::Database(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                avatar_url TEXT NOT NULL,
                points INTEGER NOT NULL DEFAULT 0,
                prompt TEXT NOT NULL DEFAULT '',
                updated INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::info!("User store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let conn = self.lock()?;

        let user = conn.query_row(
            "SELECT id, username, avatar_url, points, prompt, updated FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(UserRecord {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    avatar_url: row.get(2)?,
                    points: row.get::<_, i64>(3)?.max(0) as u64,
                    prompt: row.get(4)?,
                    updated: row.get(5)?,
                })
            },
        )
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(user)
    }

    async fn create_user(&self, user: &UserRecord) -> Result<bool, StoreError> {
        let conn = self.lock()?;

        let inserted = conn
            .execute(
                "INSERT INTO users (id, username, avatar_url, points, prompt, updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO NOTHING",
                params![
                    user.id,
                    user.username,
                    user.avatar_url,
                    user.points as i64,
                    user.prompt,
                    user.updated,
                ],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if inserted > 0 {
            tracing::info!("Created new user: {} ({})", user.id, user.username);
        }
        Ok(inserted > 0)
    }

    async fn update_prompt(
        &self,
        id: &str,
        prompt: &str,
        expected_updated: i64,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;

        let changed = conn
            .execute(
                "UPDATE users SET prompt = ?1, updated = ?2 WHERE id = ?3 AND updated = ?4",
                params![prompt, now_ms, id, expected_updated],
            )
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(missing_or_conflict(&conn, id)?);
        }
        tracing::debug!("Updated prompt for user: {}", id);
        Ok(())
    }

    async fn award_points(
        &self,
        id: &str,
        points: u64,
        expected_updated: i64,
        now_ms: i64,
    ) -> Result<u64, StoreError> {
        let conn = self.lock()?;

        let total: Option<i64> = conn
            .query_row(
                "UPDATE users SET points = points + ?1, prompt = '', updated = ?2
                 WHERE id = ?3 AND updated = ?4
                 RETURNING points",
                params![points as i64, now_ms, id, expected_updated],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match total {
            Some(total) => Ok(total.max(0) as u64),
            None => Err(missing_or_conflict(&conn, id)?),
        }
    }
}

/// Tell apart the two reasons a conditional update touched no row.
fn missing_or_conflict(conn: &Connection, id: &str) -> Result<StoreError, StoreError> {
    let exists: Option<i64> = conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", params![id], |row| row.get(0))
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(match exists {
        Some(_) => StoreError::Conflict,
        None => StoreError::NotFound,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteUserStore {
        SqliteUserStore::new(":memory:").unwrap()
    }

    fn player(id: &str) -> UserRecord {
        UserRecord::new(id, "ada", "https://example.com/ada.png")
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let store = store();
        assert!(store.get_user("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_is_conditional() {
        let store = store();
        assert!(store.create_user(&player("u1")).await.unwrap());

        let mut again = player("u1");
        again.points = 999;
        assert!(!store.create_user(&again).await.unwrap());

        let user = store.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.points, 0);
        assert_eq!(user.prompt, "");
        assert_eq!(user.updated, 0);
    }

    #[tokio::test]
    async fn test_update_prompt_stamps_updated() {
        let store = store();
        store.create_user(&player("u1")).await.unwrap();

        store.update_prompt("u1", "A luggage cart", 0, 1_000).await.unwrap();

        let user = store.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.prompt, "A luggage cart");
        assert_eq!(user.updated, 1_000);
    }

    #[tokio::test]
    async fn test_update_prompt_requires_record() {
        let store = store();
        let err = store.update_prompt("ghost", "A clock", 0, 1_000).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
        assert!(store.get_user("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_prompt_with_stale_timestamp_conflicts() {
        let store = store();
        store.create_user(&player("u1")).await.unwrap();
        store.update_prompt("u1", "A luggage cart", 0, 1_000).await.unwrap();

        let err = store.update_prompt("u1", "A clock", 0, 1_500).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        let user = store.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.prompt, "A luggage cart");
        assert_eq!(user.updated, 1_000);
    }

    #[tokio::test]
    async fn test_award_adds_points_and_clears_prompt() {
        let store = store();
        store.create_user(&player("u1")).await.unwrap();
        store.update_prompt("u1", "A luggage cart", 0, 1_000).await.unwrap();

        let total = store.award_points("u1", 595, 1_000, 6_000).await.unwrap();
        assert_eq!(total, 595);

        let user = store.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.points, 595);
        assert_eq!(user.prompt, "");
        assert_eq!(user.updated, 6_000);
    }

    #[tokio::test]
    async fn test_award_with_stale_timestamp_conflicts() {
        let store = store();
        store.create_user(&player("u1")).await.unwrap();
        store.update_prompt("u1", "A luggage cart", 0, 1_000).await.unwrap();

        store.award_points("u1", 500, 1_000, 2_000).await.unwrap();
        let err = store.award_points("u1", 500, 1_000, 2_500).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        let user = store.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.points, 500);
    }

    #[tokio::test]
    async fn test_award_missing_user() {
        let store = store();
        let err = store.award_points("ghost", 10, 0, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("nested/skyhunt.db").display());

        {
            let store = SqliteUserStore::new(&url).unwrap();
            store.create_user(&player("u1")).await.unwrap();
            store.update_prompt("u1", "A window seat", 0, 42).await.unwrap();
        }

        let store = SqliteUserStore::new(&url).unwrap();
        let user = store.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.prompt, "A window seat");
        assert_eq!(user.updated, 42);
    }
}
