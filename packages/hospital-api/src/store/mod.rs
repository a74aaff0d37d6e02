mod memory;
mod postgres;
mod repository;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use repository::Repository;

use crate::{config::DatabaseConfig, error::Error, log::STORE};
use async_trait::async_trait;
use chrono::Utc;
use hospital_model::{Collection, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// A stored JSON object, including `_id`, `createdAt` and `updatedAt`
pub type Document = Map<String, Value>;

/// Fields that must be unique across a collection
pub const UNIQUE_FIELDS: &[(Collection, &str)] = &[(Collection::Users, "email")];

///
/// Compare-and-set guard for `DocumentStore::update`.
/// The update is only applied while the top-level string `field` still equals `expected`.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Precondition {
    pub field: &'static str,
    pub expected: String,
}

impl Precondition {
    pub fn new(field: &'static str, expected: impl Into<String>) -> Self {
        Precondition {
            field,
            expected: expected.into(),
        }
    }

    fn holds(&self, document: &Document) -> bool {
        document.get(self.field).and_then(Value::as_str) == Some(self.expected.as_str())
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in insertion order
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, Error>;

    async fn find_by_id(&self, collection: Collection, id: Uuid)
        -> Result<Option<Document>, Error>;

    /// First document whose top-level string `field` equals `value`
    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, Error>;

    /// Stores a new document, assigning `_id` and timestamps
    async fn insert(&self, collection: Collection, document: Document) -> Result<Document, Error>;

    ///
    /// Shallow-merges `patch` into the stored document.
    /// Returns `None` if no document has the id.
    ///
    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Document,
        precondition: Option<Precondition>,
    ) -> Result<Option<Document>, Error>;

    /// Returns false if no document has the id
    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, Error>;

    async fn delete_all(&self, collection: Collection) -> Result<u64, Error>;
}

pub type SharedStore = Arc<dyn DocumentStore>;

///
/// Connects the backend named in config
///
pub async fn connect(config: &DatabaseConfig) -> Result<SharedStore, Error> {
    if config.is_memory() {
        info!(target: STORE, msg = "Using in-memory document store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = PostgresStore::connect(config).await?;
    store.migrate().await?;
    info!(target: STORE, msg = "Document store connected", database = %config);
    Ok(Arc::new(store))
}

///
/// Prepares a document for insertion: assigns an id unless a valid one is present
/// and stamps both timestamps
///
pub(crate) fn prepare_insert(mut document: Document) -> (Uuid, Document) {
    let id = document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let now = Value::String(Utc::now().to_rfc3339());

    document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    document.insert(CREATED_AT_FIELD.to_string(), now.clone());
    document.insert(UPDATED_AT_FIELD.to_string(), now);

    (id, document)
}

///
/// Strips the managed fields from a patch and stamps `updatedAt`
///
pub(crate) fn prepare_patch(mut patch: Document) -> Document {
    patch.remove(ID_FIELD);
    patch.remove(CREATED_AT_FIELD);
    patch.insert(
        UPDATED_AT_FIELD.to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    patch
}

pub(crate) fn unique_fields(collection: Collection) -> impl Iterator<Item = &'static str> {
    UNIQUE_FIELDS
        .iter()
        .filter(move |(c, _)| *c == collection)
        .map(|(_, field)| *field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn insert_assigns_id_and_timestamps() {
        let (id, doc) = prepare_insert(document(json!({"name": "Jane"})));

        assert_eq!(doc[ID_FIELD], json!(id.to_string()));
        assert!(doc.contains_key(CREATED_AT_FIELD));
        assert_eq!(doc[CREATED_AT_FIELD], doc[UPDATED_AT_FIELD]);
    }

    #[test]
    fn insert_keeps_a_supplied_id() {
        let id = Uuid::new_v4();
        let (assigned, _) = prepare_insert(document(json!({"_id": id.to_string()})));
        assert_eq!(assigned, id);

        let (assigned, _) = prepare_insert(document(json!({"_id": "not-a-uuid"})));
        assert_ne!(assigned.to_string(), "not-a-uuid");
    }

    #[test]
    fn patch_cannot_rewrite_managed_fields() {
        let patch = prepare_patch(document(json!({
            "_id": "x",
            "createdAt": "yesterday",
            "status": "Treated"
        })));

        assert!(!patch.contains_key(ID_FIELD));
        assert!(!patch.contains_key(CREATED_AT_FIELD));
        assert!(patch.contains_key(UPDATED_AT_FIELD));
        assert_eq!(patch["status"], json!("Treated"));
    }

    #[test]
    fn precondition_compares_string_fields() {
        let doc = document(json!({"status": "Pending"}));
        assert!(Precondition::new("status", "Pending").holds(&doc));
        assert!(!Precondition::new("status", "Confirmed").holds(&doc));
        assert!(!Precondition::new("missing", "Pending").holds(&doc));
    }

    #[test]
    fn users_have_a_unique_email() {
        assert_eq!(unique_fields(Collection::Users).collect::<Vec<_>>(), ["email"]);
        assert_eq!(unique_fields(Collection::Patients).count(), 0);
    }
}
