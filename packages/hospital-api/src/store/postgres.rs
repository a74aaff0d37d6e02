use super::{prepare_insert, prepare_patch, unique_fields, Document, DocumentStore, Precondition};
use crate::config::DatabaseConfig;
use crate::connect;
use crate::error::{Error, StoreError};
use crate::log::STORE;
use async_trait::async_trait;
use hospital_model::{Collection, ID_FIELD};
use serde_json::Value;
use tokio_postgres::{error::SqlState, Client, Row};
use tracing::debug;
use uuid::Uuid;

///
/// Document store backed by PostgreSQL.
///
/// Each collection is a table of JSONB documents:
///
/// ```text
/// seq   BIGSERIAL     insertion order
/// id    UUID          primary key, mirrors `_id`
/// data  JSONB         the document
/// ```
///
pub struct PostgresStore {
    client: Client,
}

impl PostgresStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, Error> {
        let client = connect::database(config).await?;
        Ok(PostgresStore { client })
    }

    ///
    /// Creates the collection tables and unique indexes if missing
    ///
    pub async fn migrate(&self) -> Result<(), Error> {
        for collection in Collection::ALL {
            let table = collection.name();

            let sql = format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    seq BIGSERIAL,
                    id UUID PRIMARY KEY,
                    data JSONB NOT NULL
                )"
            );
            self.client.batch_execute(&sql).await?;

            for field in unique_fields(collection) {
                let sql = format!(
                    "CREATE UNIQUE INDEX IF NOT EXISTS {table}_{field}_key ON {table} ((data->>'{field}'))"
                );
                self.client.batch_execute(&sql).await?;
            }

            debug!(target: STORE, msg = "Collection ready", %collection);
        }
        Ok(())
    }
}

fn to_document(collection: Collection, row: &Row) -> Result<Document, Error> {
    match row.try_get::<_, Value>("data")? {
        Value::Object(document) => Ok(document),
        _ => Err(StoreError::MissingId { collection }.into()),
    }
}

fn to_documents(collection: Collection, rows: &[Row]) -> Result<Vec<Document>, Error> {
    rows.iter().map(|row| to_document(collection, row)).collect()
}

///
/// Unique violations surface as `StoreError::UniqueViolation`, everything else as a database error
///
fn map_error(collection: Collection, err: tokio_postgres::Error) -> Error {
    if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        let field = err
            .as_db_error()
            .and_then(|db| db.constraint())
            .and_then(|constraint| {
                unique_fields(collection).find(|field| constraint.contains(field))
            })
            .unwrap_or(ID_FIELD);

        return StoreError::UniqueViolation {
            field: field.to_string(),
        }
        .into();
    }
    err.into()
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, Error> {
        let sql = format!("SELECT data FROM {} ORDER BY seq", collection.name());
        let rows = self.client.query(&sql, &[]).await?;
        to_documents(collection, &rows)
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<Document>, Error> {
        let sql = format!("SELECT data FROM {} WHERE id = $1", collection.name());
        let row = self.client.query_opt(&sql, &[&id]).await?;
        row.map(|row| to_document(collection, &row)).transpose()
    }

    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, Error> {
        let sql = format!(
            "SELECT data FROM {} WHERE data->>$1 = $2 ORDER BY seq LIMIT 1",
            collection.name()
        );
        let row = self.client.query_opt(&sql, &[&field, &value]).await?;
        row.map(|row| to_document(collection, &row)).transpose()
    }

    async fn insert(&self, collection: Collection, document: Document) -> Result<Document, Error> {
        let (id, document) = prepare_insert(document);
        let data = Value::Object(document);

        let sql = format!(
            "INSERT INTO {} (id, data) VALUES ($1, $2) RETURNING data",
            collection.name()
        );

        debug!(target: STORE, msg = "Insert", %collection, %id);

        let row = self
            .client
            .query_one(&sql, &[&id, &data])
            .await
            .map_err(|err| map_error(collection, err))?;
        to_document(collection, &row)
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Document,
        precondition: Option<Precondition>,
    ) -> Result<Option<Document>, Error> {
        let patch = Value::Object(prepare_patch(patch));
        let table = collection.name();

        debug!(target: STORE, msg = "Update", %collection, %id);

        let row = match &precondition {
            Some(precondition) => {
                let sql = format!(
                    "UPDATE {table} SET data = data || $2 WHERE id = $1 AND data->>$3 = $4 RETURNING data"
                );
                self.client
                    .query_opt(
                        &sql,
                        &[&id, &patch, &precondition.field, &precondition.expected],
                    )
                    .await
            }
            None => {
                let sql = format!("UPDATE {table} SET data = data || $2 WHERE id = $1 RETURNING data");
                self.client.query_opt(&sql, &[&id, &patch]).await
            }
        }
        .map_err(|err| map_error(collection, err))?;

        match (row, precondition) {
            (Some(row), _) => Ok(Some(to_document(collection, &row)?)),
            (None, None) => Ok(None),
            // Nothing matched the guarded update, find out which half failed
            (None, Some(precondition)) => match self.find_by_id(collection, id).await? {
                Some(_) => Err(StoreError::PreconditionFailed {
                    field: precondition.field.to_string(),
                    expected: precondition.expected,
                }
                .into()),
                None => Ok(None),
            },
        }
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, Error> {
        let sql = format!("DELETE FROM {} WHERE id = $1", collection.name());
        let deleted = self.client.execute(&sql, &[&id]).await?;

        debug!(target: STORE, msg = "Delete", %collection, %id, deleted);
        Ok(deleted > 0)
    }

    async fn delete_all(&self, collection: Collection) -> Result<u64, Error> {
        let sql = format!("DELETE FROM {}", collection.name());
        let deleted = self.client.execute(&sql, &[]).await?;

        debug!(target: STORE, msg = "Delete all", %collection, deleted);
        Ok(deleted)
    }
}
