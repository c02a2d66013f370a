//! Postgres reachability probe.
//!
//! The vector store keeps its tables in a dedicated schema. Before the memory service is
//! configured, the server opens one short-lived connection, makes sure that schema exists, and
//! closes the connection again. Statements run outside any explicit transaction, so each one
//! commits on its own.

use async_trait::async_trait;
use sqlx::{Connection, PgConnection};
use thiserror::Error;

/// Schema the pgvector collections live in.
pub const VECTOR_SCHEMA: &str = "vecs";

const SCHEMA_EXISTS: &str =
    "SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1)";
const CREATE_SCHEMA: &str = "CREATE SCHEMA IF NOT EXISTS vecs";

/// Errors raised while probing the database.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No connection string was configured.
    #[error("DATABASE_URL is not set")]
    MissingUrl,
    /// Connecting or querying failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What the probe had to do to the vector schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    /// The schema was already present.
    Existing,
    /// The schema was missing and has been created.
    Created,
}

/// Connect to `database_url` and create the vector schema when it is missing.
pub async fn ensure_vector_schema(database_url: &str) -> Result<SchemaStatus, ProbeError> {
    let mut conn = PgConnection::connect(database_url).await?;

    let exists: bool = sqlx::query_scalar(SCHEMA_EXISTS)
        .bind(VECTOR_SCHEMA)
        .fetch_one(&mut conn)
        .await?;

    let status = if exists {
        SchemaStatus::Existing
    } else {
        tracing::debug!(schema = VECTOR_SCHEMA, "Creating vector schema");
        sqlx::query(CREATE_SCHEMA).execute(&mut conn).await?;
        SchemaStatus::Created
    };

    conn.close().await?;
    Ok(status)
}

/// Report whether the database is usable. Never fails: every error is logged and mapped to
/// `false`.
pub async fn test_db_connection(database_url: Option<&str>) -> bool {
    let result = match database_url {
        Some(url) => ensure_vector_schema(url).await,
        None => Err(ProbeError::MissingUrl),
    };

    match result {
        Ok(status) => {
            tracing::debug!(schema = VECTOR_SCHEMA, ?status, "Database connection successful");
            true
        }
        Err(error) => {
            tracing::error!(error = %error, "Database connection test failed");
            false
        }
    }
}

/// Startup check deciding whether the backing store is usable.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Return `true` when the store at `database_url` can be used.
    async fn check(&self, database_url: Option<&str>) -> bool;
}

/// [`ConnectivityProbe`] backed by [`test_db_connection`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresProbe;

#[async_trait]
impl ConnectivityProbe for PostgresProbe {
    async fn check(&self, database_url: Option<&str>) -> bool {
        test_db_connection(database_url).await
    }
}
