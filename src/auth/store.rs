// Session persistence
// Three key-value entries in a local SQLite database, loaded once at open
// and written through on every mutation.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use tokio::sync::RwLock;

use super::types::{Session, UserProfile};

const KEY_ACCESS_TOKEN: &str = "access_token";
const KEY_REFRESH_TOKEN: &str = "refresh_token";
const KEY_USER: &str = "user";

/// Persisted session store
///
/// Holds the session in memory behind a lock and mirrors every mutation to
/// the database, so a restarted process comes back signed in.
pub struct SessionStore {
    /// Path to the SQLite database
    db_path: PathBuf,

    /// In-memory copy of the persisted state
    session: RwLock<Session>,
}

impl SessionStore {
    /// Open (or create) the store and load the persisted session
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create session directory: {}", parent.display())
            })?;
        }

        let conn = open_connection(&db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS session_kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .context("Failed to create session table")?;

        let session = load_session(&conn)?;
        tracing::debug!(
            authenticated = session.is_authenticated(),
            "Loaded session from {}",
            db_path.display()
        );

        Ok(Self {
            db_path,
            session: RwLock::new(session),
        })
    }

    /// Snapshot of the current session
    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.session.read().await.access_token.clone()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.session.read().await.refresh_token.clone()
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.session.read().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_authenticated()
    }

    /// Replace the access token; `None` removes it
    pub async fn set_access_token(&self, token: Option<&str>) -> Result<()> {
        let mut session = self.session.write().await;
        self.put(KEY_ACCESS_TOKEN, token)?;
        session.access_token = token.map(str::to_string);
        Ok(())
    }

    /// Replace the refresh token; `None` removes it
    pub async fn set_refresh_token(&self, token: Option<&str>) -> Result<()> {
        let mut session = self.session.write().await;
        self.put(KEY_REFRESH_TOKEN, token)?;
        session.refresh_token = token.map(str::to_string);
        Ok(())
    }

    /// Replace the stored user record; `None` removes it
    pub async fn set_user(&self, user: Option<&UserProfile>) -> Result<()> {
        let mut session = self.session.write().await;
        let json = user
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to serialize user record")?;
        self.put(KEY_USER, json.as_deref())?;
        session.user = user.cloned();
        Ok(())
    }

    /// Store a full token pair and user record in one step (login path)
    pub async fn store_login(
        &self,
        access_token: &str,
        refresh_token: &str,
        user: &UserProfile,
    ) -> Result<()> {
        let mut session = self.session.write().await;
        let user_json =
            serde_json::to_string(user).context("Failed to serialize user record")?;

        self.put(KEY_ACCESS_TOKEN, Some(access_token))?;
        self.put(KEY_REFRESH_TOKEN, Some(refresh_token))?;
        self.put(KEY_USER, Some(&user_json))?;

        session.access_token = Some(access_token.to_string());
        session.refresh_token = Some(refresh_token.to_string());
        session.user = Some(user.clone());
        Ok(())
    }

    /// Drop all persisted state (logout / irrecoverable auth failure)
    pub async fn clear(&self) -> Result<()> {
        let mut session = self.session.write().await;

        let conn = open_connection(&self.db_path)?;
        conn.execute("DELETE FROM session_kv", [])
            .context("Failed to clear session table")?;

        *session = Session::default();
        tracing::debug!("Session cleared");
        Ok(())
    }

    /// Write or delete a single key
    fn put(&self, key: &str, value: Option<&str>) -> Result<()> {
        let conn = open_connection(&self.db_path)?;
        match value {
            Some(v) => {
                conn.execute(
                    "INSERT OR REPLACE INTO session_kv (key, value) VALUES (?1, ?2)",
                    [key, v],
                )
                .with_context(|| format!("Failed to persist session key: {}", key))?;
            }
            None => {
                conn.execute("DELETE FROM session_kv WHERE key = ?1", [key])
                    .with_context(|| format!("Failed to remove session key: {}", key))?;
            }
        }
        Ok(())
    }
}

fn open_connection(path: &std::path::Path) -> Result<Connection> {
    Connection::open(path)
        .with_context(|| format!("Failed to open session database: {}", path.display()))
}

/// Read the three persisted entries into a `Session`
fn load_session(conn: &Connection) -> Result<Session> {
    let get = |key: &str| -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM session_kv WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("Failed to read session key: {}", key))
    };

    let user = match get(KEY_USER)? {
        Some(json) => match serde_json::from_str(&json) {
            Ok(user) => Some(user),
            Err(e) => {
                // A malformed user record should not lock the user out
                tracing::warn!("Discarding unreadable user record: {}", e);
                None
            }
        },
        None => None,
    };

    Ok(Session {
        access_token: get(KEY_ACCESS_TOKEN)?,
        refresh_token: get(KEY_REFRESH_TOKEN)?,
        user,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_user() -> UserProfile {
        UserProfile {
            id: 1,
            username: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            first_name: None,
            last_name: None,
            role: Some("user".to_string()),
            department: None,
        }
    }

    #[tokio::test]
    async fn test_open_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::open(dir.path().join("session.sqlite3")).unwrap();

        assert!(!store.is_authenticated().await);
        assert_eq!(store.access_token().await, None);
        assert_eq!(store.refresh_token().await, None);
        assert_eq!(store.user().await, None);
    }

    #[tokio::test]
    async fn test_login_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.sqlite3");

        let store = SessionStore::open(&path).unwrap();
        store
            .store_login("a1", "r1", &test_user())
            .await
            .unwrap();
        drop(store);

        let store = SessionStore::open(&path).unwrap();
        assert_eq!(store.access_token().await.as_deref(), Some("a1"));
        assert_eq!(store.refresh_token().await.as_deref(), Some("r1"));
        assert_eq!(store.user().await.unwrap().username, "alice");
        assert!(store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_set_access_token_none_removes_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.sqlite3");

        let store = SessionStore::open(&path).unwrap();
        store.set_access_token(Some("a1")).await.unwrap();
        store.set_access_token(None).await.unwrap();
        drop(store);

        let store = SessionStore::open(&path).unwrap();
        assert_eq!(store.access_token().await, None);
    }

    #[tokio::test]
    async fn test_clear_wipes_everything() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.sqlite3");

        let store = SessionStore::open(&path).unwrap();
        store
            .store_login("a1", "r1", &test_user())
            .await
            .unwrap();
        store.clear().await.unwrap();

        assert!(!store.is_authenticated().await);
        drop(store);

        let store = SessionStore::open(&path).unwrap();
        assert_eq!(store.access_token().await, None);
        assert_eq!(store.refresh_token().await, None);
        assert_eq!(store.user().await, None);
    }

    #[tokio::test]
    async fn test_corrupt_user_record_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.sqlite3");

        {
            let store = SessionStore::open(&path).unwrap();
            store.set_access_token(Some("a1")).await.unwrap();
        }

        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO session_kv (key, value) VALUES ('user', 'not json')",
            [],
        )
        .unwrap();
        drop(conn);

        let store = SessionStore::open(&path).unwrap();
        assert_eq!(store.user().await, None);
        // tokens are unaffected
        assert_eq!(store.access_token().await.as_deref(), Some("a1"));
    }
}
