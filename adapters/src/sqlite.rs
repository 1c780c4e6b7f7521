//! SQLite implementation of the storage traits.
//!
//! This file contains the relational adapter: a `sqlx` connection pool over a
//! `requests` table and a `users` table with auto-incrementing keys and
//! uniqueness constraints on `username` and `email`. Partial updates are
//! built from the shared field-map, so only allow-listed columns ever appear
//! in generated SQL and every value is bound.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, Pool, QueryBuilder, Sqlite};

use crate::errors::StoreResult;
use crate::models::{
    NewServiceRequest, NewUser, RequestPatch, RequestStatus, ServiceRequest, User, UserSummary,
};
use crate::{IdentityStore, RequestStore, Storage};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL,
    email TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    phone TEXT NOT NULL,
    email TEXT,
    address TEXT NOT NULL,
    brand TEXT NOT NULL,
    model TEXT,
    problem TEXT NOT NULL,
    preferred_time TEXT,
    status TEXT NOT NULL DEFAULT 'new',
    created_at TEXT NOT NULL,
    updated_at TEXT,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_requests_created_at ON requests (created_at);
"#;

#[derive(FromRow)]
struct RequestRow {
    id: i64,
    name: String,
    phone: String,
    email: Option<String>,
    address: String,
    brand: String,
    model: Option<String>,
    problem: String,
    preferred_time: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<RequestRow> for ServiceRequest {
    type Error = crate::errors::StoreError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        Ok(ServiceRequest {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            address: row.address,
            brand: row.brand,
            model: row.model,
            problem: row.problem,
            preferred_time: row.preferred_time,
            status: RequestStatus::from_str(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Connects to `url` (e.g. `sqlite://data/reparo.db` or
    /// `sqlite::memory:`) and creates the schema if missing.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        if let Some(parent) = opts.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // A single connection keeps `sqlite::memory:` databases coherent and
        // avoids "database is locked" under concurrent writers.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::info!(url, "Using SQLite storage");
        Ok(store)
    }

    async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl RequestStore for SqliteStore {
    async fn create_request(&self, new: NewServiceRequest) -> StoreResult<i64> {
        let result = sqlx::query(
            "INSERT INTO requests \
             (name, phone, email, address, brand, model, problem, preferred_time, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new.name)
        .bind(new.phone)
        .bind(new.email)
        .bind(new.address)
        .bind(new.brand)
        .bind(new.model)
        .bind(new.problem)
        .bind(new.preferred_time)
        .bind(RequestStatus::New.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn get_request(&self, id: i64) -> StoreResult<Option<ServiceRequest>> {
        let row = sqlx::query_as::<_, RequestRow>("SELECT * FROM requests WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ServiceRequest::try_from).transpose()
    }

    async fn list_requests(&self) -> StoreResult<Vec<ServiceRequest>> {
        let rows = sqlx::query_as::<_, RequestRow>(
            "SELECT * FROM requests ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ServiceRequest::try_from).collect()
    }

    async fn update_request(&self, id: i64, patch: &RequestPatch) -> StoreResult<bool> {
        if patch.is_empty() {
            return Ok(false);
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE requests SET ");
        let mut sets = query.separated(", ");
        for (field, value) in patch.iter() {
            sets.push(field.column())
                .push_unseparated(" = ")
                .push_bind_unseparated(value.map(str::to_owned));
        }
        sets.push("updated_at = ").push_bind_unseparated(Utc::now());
        query.push(" WHERE id = ").push_bind(id);

        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn complete_request(&self, id: i64) -> StoreResult<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE requests SET status = ?, completed_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(RequestStatus::Completed.as_str())
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_request(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl IdentityStore for SqliteStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<i64> {
        let result = sqlx::query(
            "INSERT INTO users (username, email, name, password_hash, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(new.username)
        .bind(new.email)
        .bind(new.name)
        .bind(new.password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn list_users(&self) -> StoreResult<Vec<UserSummary>> {
        let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|row| User::from(row).summary()).collect())
    }

    async fn count_users(&self) -> StoreResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

#[async_trait]
impl Storage for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
