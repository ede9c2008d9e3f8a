use crate::db::schema::SQLITE_INIT;
use crate::error::BridgeError;
use crate::intuit::QboCredential;
use crate::intuit::credentials::parse_issued_at;
use chrono::SecondsFormat;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

/// Open (creating if missing) the database and apply the schema.
///
/// In-memory databases live and die with a single connection, so the pool is
/// pinned to one connection that never idles out.
pub async fn connect(database_url: &str) -> Result<SqlitePool, BridgeError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let in_memory = database_url.contains(":memory:");
    let pool = SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 5 })
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(connect_opts)
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Initialize the schema by executing the bundled DDL.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), BridgeError> {
    // sqlx::query runs one statement at a time
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}

/// Storage for the single current [`QboCredential`].
#[derive(Clone)]
pub struct CredentialsStorage {
    pool: SqlitePool,
}

impl CredentialsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Most recently issued credential, if any.
    pub async fn get_latest(&self) -> Result<Option<QboCredential>, BridgeError> {
        let row = sqlx::query(
            r#"SELECT access_token, refresh_token, expires_in, realm_id, token_type, issued_at
               FROM credentials ORDER BY issued_at DESC LIMIT 1"#,
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_model).transpose()
    }

    /// Delete every stored credential and insert `cred`, in one transaction.
    pub async fn replace_all(&self, cred: &QboCredential) -> Result<(), BridgeError> {
        let issued_at = cred.issued_at.to_rfc3339_opts(SecondsFormat::Micros, true);
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM credentials")
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO credentials (
                access_token, refresh_token, expires_in, realm_id, token_type, issued_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&cred.access_token)
        .bind(&cred.refresh_token)
        .bind(cred.expires_in)
        .bind(&cred.realm_id)
        .bind(&cred.token_type)
        .bind(issued_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, BridgeError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM credentials")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    fn row_to_model(row: SqliteRow) -> Result<QboCredential, BridgeError> {
        let issued_at_str: String = row.try_get("issued_at")?;
        let issued_at =
            parse_issued_at(&issued_at_str).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(QboCredential {
            access_token: row.try_get("access_token")?,
            refresh_token: row.try_get("refresh_token")?,
            expires_in: row.try_get("expires_in")?,
            realm_id: row.try_get("realm_id")?,
            token_type: row.try_get("token_type")?,
            issued_at,
        })
    }
}
