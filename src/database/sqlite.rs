//! # SQLite Database
//!
//! Relational backend for users and gadgets.
//!
//! ## Invariants
//! - `users.email` and `gadgets.name` are UNIQUE; duplicate writes surface as
//!   `EmailAlreadyExists` / `NameTaken`, never as a second row
//! - Gadget read-modify-write runs inside an `IMMEDIATE` transaction
//! - One connection behind a mutex; every call is short and bounded by the
//!   busy timeout

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::info;
use uuid::Uuid;

use crate::auth::{AuthError, AuthResult, User, UserRepository};
use crate::gadgets::store::GadgetChange;
use crate::gadgets::{Gadget, GadgetError, GadgetResult, GadgetStatus, GadgetStore};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
      id TEXT PRIMARY KEY,
      name TEXT NOT NULL,
      email TEXT NOT NULL UNIQUE,
      password_hash TEXT NOT NULL,
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS gadgets (
      id TEXT PRIMARY KEY,
      name TEXT NOT NULL UNIQUE,
      status TEXT NOT NULL
        CHECK (status IN ('available', 'deployed', 'destroyed', 'decommissioned')),
      success_probability REAL NOT NULL,
      created_at TEXT NOT NULL,
      updated_at TEXT NOT NULL,
      decommissioned_at TEXT,
      destroyed_at TEXT,
      created_by_id TEXT NOT NULL REFERENCES users(id)
    );
    CREATE INDEX IF NOT EXISTS idx_gadgets_status ON gadgets(status);
    CREATE INDEX IF NOT EXISTS idx_gadgets_created ON gadgets(created_at);
"#;

const GADGET_COLUMNS: &str = "id, name, status, success_probability, created_at, updated_at, \
                              decommissioned_at, destroyed_at, created_by_id";

const CLOSED: &str = "database is closed";

/// SQLite-backed user and gadget store
pub struct SqliteDatabase {
    conn: Mutex<Option<Connection>>,
}

impl SqliteDatabase {
    /// Open (or create) a database file and ensure the schema exists
    pub fn open(path: &Path, busy_timeout: Duration) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::prepare(conn, Some(path), busy_timeout)
    }

    /// Private in-memory database, used by tests
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::prepare(Connection::open_in_memory()?, None, Duration::from_secs(5))
    }

    fn prepare(
        conn: Connection,
        path: Option<&Path>,
        busy_timeout: Duration,
    ) -> rusqlite::Result<Self> {
        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;

        info!(path = ?path, "database opened");
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Close the connection. Later calls fail with a storage error.
    pub fn close(&self) -> Result<(), String> {
        let conn = self.lock()?.take();
        if let Some(conn) = conn {
            conn.close().map_err(|(_, e)| e.to_string())?;
            info!("database closed");
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Connection>>, String> {
        self.conn
            .lock()
            .map_err(|_| "connection lock poisoned".to_string())
    }

    /// Run `f` with the open connection; `storage` wraps lock/closed failures
    fn with_connection<T, E>(
        &self,
        storage: impl Fn(String) -> E,
        f: impl FnOnce(&mut Connection) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut guard = self.lock().map_err(&storage)?;
        let conn = guard.as_mut().ok_or_else(|| storage(CLOSED.to_string()))?;
        f(conn)
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Fixed-width RFC 3339 so text order matches time order
fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp '{value}': {e}"))
}

fn parse_optional_timestamp(value: Option<&str>) -> Result<Option<DateTime<Utc>>, String> {
    value.map(parse_timestamp).transpose()
}

fn parse_uuid(value: &str) -> Result<Uuid, String> {
    Uuid::parse_str(value).map_err(|e| format!("bad uuid '{value}': {e}"))
}

// ==================
// Users
// ==================

fn auth_storage(e: rusqlite::Error) -> AuthError {
    AuthError::StorageError(e.to_string())
}

struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    created_at: String,
}

impl UserRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn into_user(self) -> AuthResult<User> {
        Ok(User {
            id: parse_uuid(&self.id).map_err(AuthError::StorageError)?,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            created_at: parse_timestamp(&self.created_at).map_err(AuthError::StorageError)?,
        })
    }
}

impl SqliteDatabase {
    fn find_user(&self, column: &str, value: &str) -> AuthResult<Option<User>> {
        let sql =
            format!("SELECT id, name, email, password_hash, created_at FROM users WHERE {column} = ?1");
        self.with_connection(AuthError::StorageError, |conn| {
            conn.query_row(&sql, params![value], UserRow::read)
                .optional()
                .map_err(auth_storage)?
                .map(UserRow::into_user)
                .transpose()
        })
    }
}

impl UserRepository for SqliteDatabase {
    fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        self.find_user("id", &id.to_string())
    }

    fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        self.find_user("email", email)
    }

    fn email_exists(&self, email: &str) -> AuthResult<bool> {
        self.with_connection(AuthError::StorageError, |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                params![email],
                |row| row.get(0),
            )
            .map_err(auth_storage)
        })
    }

    fn create(&self, user: &User) -> AuthResult<()> {
        self.with_connection(AuthError::StorageError, |conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.id.to_string(),
                    user.name,
                    user.email,
                    user.password_hash,
                    format_timestamp(&user.created_at),
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::EmailAlreadyExists
                } else {
                    auth_storage(e)
                }
            })?;
            Ok(())
        })
    }
}

// ==================
// Gadgets
// ==================

fn gadget_storage(e: rusqlite::Error) -> GadgetError {
    GadgetError::Storage(e.to_string())
}

/// Map a write failure, turning a unique violation into `NameTaken`
fn gadget_write_error(e: rusqlite::Error, name: &str) -> GadgetError {
    if is_unique_violation(&e) {
        GadgetError::NameTaken(name.to_string())
    } else {
        gadget_storage(e)
    }
}

struct GadgetRow {
    id: String,
    name: String,
    status: String,
    success_probability: f64,
    created_at: String,
    updated_at: String,
    decommissioned_at: Option<String>,
    destroyed_at: Option<String>,
    created_by_id: String,
}

impl GadgetRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            status: row.get(2)?,
            success_probability: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
            decommissioned_at: row.get(6)?,
            destroyed_at: row.get(7)?,
            created_by_id: row.get(8)?,
        })
    }

    fn into_gadget(self) -> GadgetResult<Gadget> {
        self.convert().map_err(GadgetError::Storage)
    }

    fn convert(self) -> Result<Gadget, String> {
        Ok(Gadget {
            id: parse_uuid(&self.id)?,
            status: self
                .status
                .parse::<GadgetStatus>()
                .map_err(|e| e.to_string())?,
            success_probability: self.success_probability,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            decommissioned_at: parse_optional_timestamp(self.decommissioned_at.as_deref())?,
            destroyed_at: parse_optional_timestamp(self.destroyed_at.as_deref())?,
            created_by_id: parse_uuid(&self.created_by_id)?,
            name: self.name,
        })
    }
}

fn select_gadget(conn: &Connection, id: Uuid) -> GadgetResult<Option<Gadget>> {
    conn.query_row(
        &format!("SELECT {GADGET_COLUMNS} FROM gadgets WHERE id = ?1"),
        params![id.to_string()],
        GadgetRow::read,
    )
    .optional()
    .map_err(gadget_storage)?
    .map(GadgetRow::into_gadget)
    .transpose()
}

impl GadgetStore for SqliteDatabase {
    fn insert(&self, gadget: &Gadget) -> GadgetResult<()> {
        self.with_connection(GadgetError::Storage, |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO gadgets ({GADGET_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    gadget.id.to_string(),
                    gadget.name,
                    gadget.status.as_str(),
                    gadget.success_probability,
                    format_timestamp(&gadget.created_at),
                    format_timestamp(&gadget.updated_at),
                    gadget.decommissioned_at.as_ref().map(format_timestamp),
                    gadget.destroyed_at.as_ref().map(format_timestamp),
                    gadget.created_by_id.to_string(),
                ],
            )
            .map_err(|e| gadget_write_error(e, &gadget.name))?;
            Ok(())
        })
    }

    fn find_by_id(&self, id: Uuid) -> GadgetResult<Option<Gadget>> {
        self.with_connection(GadgetError::Storage, |conn| select_gadget(conn, id))
    }

    fn list(&self, status: Option<GadgetStatus>) -> GadgetResult<Vec<Gadget>> {
        self.with_connection(GadgetError::Storage, |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {GADGET_COLUMNS} FROM gadgets
                     WHERE ?1 IS NULL OR status = ?1
                     ORDER BY created_at, rowid"
                ))
                .map_err(gadget_storage)?;

            let rows = stmt
                .query_map(params![status.map(|s| s.as_str())], GadgetRow::read)
                .map_err(gadget_storage)?;

            let gadgets = rows
                .map(|row| row.map_err(gadget_storage)?.into_gadget())
                .collect::<GadgetResult<Vec<_>>>();
            gadgets
        })
    }

    fn modify(&self, id: Uuid, change: GadgetChange<'_>) -> GadgetResult<Gadget> {
        self.with_connection(GadgetError::Storage, |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(gadget_storage)?;

            let mut gadget = select_gadget(&tx, id)?.ok_or(GadgetError::NotFound(id))?;
            // Dropping `tx` on an early return rolls back
            change(&mut gadget)?;

            tx.execute(
                "UPDATE gadgets
                 SET name = ?2, status = ?3, updated_at = ?4,
                     decommissioned_at = ?5, destroyed_at = ?6
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    gadget.name,
                    gadget.status.as_str(),
                    format_timestamp(&gadget.updated_at),
                    gadget.decommissioned_at.as_ref().map(format_timestamp),
                    gadget.destroyed_at.as_ref().map(format_timestamp),
                ],
            )
            .map_err(|e| gadget_write_error(e, &gadget.name))?;

            tx.commit().map_err(gadget_storage)?;
            Ok(gadget)
        })
    }
}
