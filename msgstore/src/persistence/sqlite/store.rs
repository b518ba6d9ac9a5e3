use std::sync::Arc;

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{error::SqlError, queries::Queries};
use crate::{
    codec::{MessageCodec, ProstCodec},
    constants::{DEFAULT_REGION, DEFAULT_TABLE_PREFIX},
    key::canonical_key,
    persistence::MessageStore,
    util::now_millis,
    Message,
};

/// The DDL shipped as a migration, written against the default prefix.
const SCHEMA: &str = include_str!("../../../migrations/20231015120000_message_store.sql");

/// A message and message group store backed by sqlite.
///
/// Cloning is cheap and clones share the pool. All configuration is fixed
/// once built.
#[derive(Clone)]
pub struct SqliteMessageStore {
    /// Connection pool
    pub(super) pool: SqlitePool,
    pub(super) region: Arc<str>,
    table_prefix: Arc<str>,
    pub(super) codec: Arc<dyn MessageCodec>,
    pub(super) queries: Arc<Queries>,
}

impl SqliteMessageStore {
    /// A store in the default region with the default table prefix and
    /// codec.
    pub fn new(pool: SqlitePool) -> Self {
        Self::from_parts(
            pool,
            DEFAULT_REGION.into(),
            DEFAULT_TABLE_PREFIX.into(),
            Arc::new(ProstCodec::new()),
        )
    }

    pub fn builder() -> SqliteMessageStoreBuilder {
        SqliteMessageStoreBuilder::default()
    }

    fn from_parts(
        pool: SqlitePool,
        region: Arc<str>,
        table_prefix: Arc<str>,
        codec: Arc<dyn MessageCodec>,
    ) -> Self {
        let queries = Arc::new(Queries::new(&table_prefix));
        Self {
            pool,
            region,
            table_prefix,
            codec,
            queries,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create this store's tables (under its table prefix) if they don't
    /// exist yet. Stores using the default prefix may run the bundled
    /// migrations instead.
    pub async fn initialize_schema(&self) -> Result<(), SqlError> {
        info!(
            "Creating message store tables with prefix '{}' if not exist",
            self.table_prefix
        );
        let ddl = SCHEMA.replace(DEFAULT_TABLE_PREFIX, &self.table_prefix);
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    /// Decode the payload column of a message row.
    pub(super) fn decode_row(&self, row: &SqliteRow) -> Result<Message, SqlError> {
        let bytes = row.try_get::<Vec<u8>, _>("MESSAGE_BYTES")?;
        Ok(self.codec.decode(&bytes)?)
    }
}

#[async_trait::async_trait]
impl MessageStore for SqliteMessageStore {
    type Error = SqlError;

    async fn add_message(&self, message: Message) -> Result<Message, Self::Error> {
        if message.is_saved() && message.created_date().is_some() {
            if let Some(saved) = self.get_message(message.id()).await? {
                if saved == message {
                    return Ok(message);
                }
                // same id, different content: the insert below surfaces the
                // conflict
            }
        }

        let created_date = now_millis();
        let message = message.mark_saved(created_date);
        let message_id = canonical_key(&message.id());
        let bytes = self.codec.encode(&message)?;

        debug!("Inserting message with id key={}", message_id);
        sqlx::query(&self.queries.create_message)
            .bind(&message_id)
            .bind(&*self.region)
            .bind(created_date)
            .bind(bytes)
            .execute(&self.pool)
            .await?;
        Ok(message)
    }

    async fn get_message(&self, id: Uuid) -> Result<Option<Message>, Self::Error> {
        let maybe_row = sqlx::query(&self.queries.get_message)
            .bind(canonical_key(&id))
            .bind(&*self.region)
            .fetch_optional(&self.pool)
            .await?;
        maybe_row.map(|row| self.decode_row(&row)).transpose()
    }

    async fn remove_message(&self, id: Uuid) -> Result<Option<Message>, Self::Error> {
        let Some(message) = self.get_message(id).await? else {
            return Ok(None);
        };
        let message_id = canonical_key(&id);
        debug!("Removing message with id key={}", message_id);
        let result = sqlx::query(&self.queries.delete_message)
            .bind(&message_id)
            .bind(&*self.region)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            warn!("Message {} was removed concurrently", message_id);
            return Ok(None);
        }
        Ok(Some(message))
    }

    async fn message_count(&self) -> Result<u64, Self::Error> {
        let row = sqlx::query(&self.queries.count_messages)
            .bind(&*self.region)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>(0)? as u64)
    }
}

/// Configures a [SqliteMessageStore]. Only the pool is mandatory.
///
/// There is no large-object handling to configure: encoded messages are
/// bound as plain sqlite BLOBs, and their size is bounded by the
/// [codec](Self::codec) (see [ProstCodec::with_max_size]).
#[derive(Default)]
pub struct SqliteMessageStoreBuilder {
    pool: Option<SqlitePool>,
    region: Option<String>,
    table_prefix: Option<String>,
    codec: Option<Arc<dyn MessageCodec>>,
}

impl SqliteMessageStoreBuilder {
    pub fn pool(mut self, pool: SqlitePool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Partition for every row this store reads or writes. Defaults to
    /// [DEFAULT_REGION].
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Prepended to every table name. Defaults to [DEFAULT_TABLE_PREFIX].
    pub fn table_prefix(mut self, table_prefix: impl Into<String>) -> Self {
        self.table_prefix = Some(table_prefix.into());
        self
    }

    /// Defaults to [ProstCodec].
    pub fn codec(mut self, codec: impl MessageCodec) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    pub fn build(self) -> Result<SqliteMessageStore, SqlError> {
        let pool = self
            .pool
            .ok_or(SqlError::Precondition("a sqlite pool must be provided"))?;
        let table_prefix = self
            .table_prefix
            .unwrap_or_else(|| DEFAULT_TABLE_PREFIX.to_string());
        // the prefix is spliced in to SQL text, it can't be bound
        if !table_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(SqlError::Precondition(
                "table prefix may only contain ASCII letters, digits and underscores",
            ));
        }
        let region = self.region.unwrap_or_else(|| DEFAULT_REGION.to_string());
        let codec = self
            .codec
            .unwrap_or_else(|| Arc::new(ProstCodec::new()) as Arc<dyn MessageCodec>);
        Ok(SqliteMessageStore::from_parts(
            pool,
            region.into(),
            table_prefix.into(),
            codec,
        ))
    }
}
