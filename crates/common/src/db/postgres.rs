//! PostgreSQL document store
//!
//! Each collection is a table of JSONB documents. `seq` records insertion
//! order so scans come back in the order documents were written.

use super::models::{Document, DocumentId, StoredDocument};
use super::{Collection, DocumentStore};
use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Statement,
};
use tracing::{debug, info};
use uuid::Uuid;

/// Document store backed by a SeaORM connection pool
#[derive(Clone)]
pub struct PgDocumentStore {
    conn: DatabaseConnection,
}

impl PgDocumentStore {
    /// Connect using the configured credentials and make sure the tables exist
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(host = %config.host, database = %config.name, "Connecting to database...");

        let mut opts = ConnectOptions::new(config.connection_url()?);
        opts
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(config.connect_timeout())
            .idle_timeout(config.idle_timeout())
            .sqlx_logging(false);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e),
            })?;

        let store = Self::from_connection(conn);
        store.ensure_schema().await?;

        info!("Database connection established");
        Ok(store)
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create the collection tables if they are missing
    pub async fn ensure_schema(&self) -> Result<()> {
        for collection in Collection::ALL {
            let table = collection.table_name();
            let sql = format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id UUID PRIMARY KEY,
                    seq BIGSERIAL NOT NULL,
                    document JSONB NOT NULL,
                    inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );
                CREATE INDEX IF NOT EXISTS {table}_seq_idx ON {table} (seq);
                "#
            );
            self.conn.execute_unprepared(&sql).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: Collection, document: Document) -> Result<DocumentId> {
        let id = Uuid::new_v4();

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            format!("INSERT INTO {} (id, document) VALUES ($1, $2)", collection.table_name()),
            vec![id.into(), serde_json::Value::Object(document).into()],
        );

        self.conn.execute(stmt).await?;
        debug!(%collection, %id, "Document inserted");

        Ok(id)
    }

    async fn scan(&self, collection: Collection) -> Result<Vec<StoredDocument>> {
        let stmt = Statement::from_string(
            DbBackend::Postgres,
            format!("SELECT id, document FROM {} ORDER BY seq", collection.table_name()),
        );

        let rows = self.conn.query_all(stmt).await?;
        let mut documents = Vec::with_capacity(rows.len());

        for row in rows {
            let id = row.try_get_by_index::<Uuid>(0).map_err(DbErr::from)?;
            let document = match row
                .try_get_by_index::<serde_json::Value>(1)
                .map_err(DbErr::from)?
            {
                serde_json::Value::Object(map) => map,
                _ => {
                    return Err(AppError::InvalidFormat {
                        message: format!("{} document {} is not a JSON object", collection, id),
                    })
                }
            };
            documents.push(StoredDocument { id, document });
        }

        debug!(%collection, count = documents.len(), "Collection scanned");
        Ok(documents)
    }

    async fn close(&self) -> Result<()> {
        // The pool is shared between clones; closing one handle closes it for all.
        self.conn.clone().close().await?;
        info!("Database connection closed");
        Ok(())
    }
}
