//! Call log storage
//!
//! Append-only audit trail of function invocations. The store is written
//! synchronously after each dispatch but is never on the correctness path
//! of answering the user: a storage failure is reported and swallowed.
//! Records are immutable once written; retention and read access are an
//! external concern.

pub mod entities;
pub mod migration;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use migration::Migrator;

/// Call log write failure
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying database error
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// One function invocation, as recorded in the audit log
///
/// Created once per resolved-and-attempted dispatch (successful or not);
/// never updated or deleted.
#[derive(Debug, Clone)]
pub struct CallLogRecord {
    /// Record id
    pub id: Uuid,
    /// Identifier tying the record to the originating chat request
    pub correlation_id: Uuid,
    /// Function name
    pub function_name: String,
    /// Validated (or, for rejected calls, raw) arguments
    pub arguments: Value,
    /// Result payload; absent when the call was rejected before execution
    pub result: Option<Value>,
    /// Failure kind, when the call did not succeed
    pub error_kind: Option<String>,
    /// Dispatch start time
    pub started_at: DateTime<Utc>,
    /// Dispatch end time
    pub finished_at: DateTime<Utc>,
}

/// Append-only call log sink
///
/// Implementations must tolerate concurrent appends; there is no
/// deduplication — identical calls produce independent records.
#[async_trait::async_trait]
pub trait CallLogStore: Send + Sync {
    /// Append one record
    async fn record(&self, record: CallLogRecord) -> Result<(), StorageError>;
}

/// SQLite-backed call log
pub struct SqliteCallLog {
    db: DatabaseConnection,
}

impl SqliteCallLog {
    /// Connect and run migrations
    pub async fn new(config: &DatabaseConfig) -> Result<Self, StorageError> {
        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.connection_timeout))
            .acquire_timeout(Duration::from_secs(30))
            .sqlx_logging(false);

        let db = Database::connect(options).await?;
        Migrator::up(&db, None).await?;
        info!(url = %config.url, "call log database ready");

        Ok(Self { db })
    }

    /// Access the underlying connection (tests)
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait::async_trait]
impl CallLogStore for SqliteCallLog {
    async fn record(&self, record: CallLogRecord) -> Result<(), StorageError> {
        debug!(
            function = %record.function_name,
            correlation_id = %record.correlation_id,
            "recording function call"
        );

        entities::call_log::ActiveModel {
            id: Set(record.id.to_string()),
            correlation_id: Set(record.correlation_id.to_string()),
            function_name: Set(record.function_name),
            arguments_json: Set(record.arguments.to_string()),
            result_json: Set(record.result.map(|v| v.to_string())),
            error_kind: Set(record.error_kind),
            started_at: Set(record.started_at),
            finished_at: Set(record.finished_at),
        }
        .insert(&self.db)
        .await?;

        Ok(())
    }
}

/// In-memory call log, used when the database is disabled and by tests
#[derive(Default)]
pub struct MemoryCallLog {
    records: Mutex<Vec<CallLogRecord>>,
}

impl MemoryCallLog {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub async fn records(&self) -> Vec<CallLogRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl CallLogStore for MemoryCallLog {
    async fn record(&self, record: CallLogRecord) -> Result<(), StorageError> {
        self.records.lock().await.push(record);
        Ok(())
    }
}
