use super::{prepare_insert, prepare_patch, unique_fields, Document, DocumentStore, Precondition};
use crate::error::{Error, StoreError};
use crate::log::STORE;
use async_trait::async_trait;
use hospital_model::{Collection, ID_FIELD};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

///
/// Document store held in process memory.
/// Each collection keeps insertion order.
///
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn has_id(document: &Document, id: Uuid) -> bool {
    document.get(ID_FIELD).and_then(Value::as_str) == Some(id.to_string().as_str())
}

fn field_eq(document: &Document, field: &str, value: &str) -> bool {
    document.get(field).and_then(Value::as_str) == Some(value)
}

///
/// Rejects a write that would duplicate a unique field held by another document
///
fn check_unique(
    collection: Collection,
    documents: &[Document],
    candidate: &Document,
    skip: Option<Uuid>,
) -> Result<(), StoreError> {
    for field in unique_fields(collection) {
        let Some(value) = candidate.get(field).and_then(Value::as_str) else {
            continue;
        };

        let taken = documents
            .iter()
            .filter(|doc| skip.is_none_or(|id| !has_id(doc, id)))
            .any(|doc| field_eq(doc, field, value));

        if taken {
            return Err(StoreError::UniqueViolation {
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, Error> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<Document>, Error> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| has_id(doc, id)))
            .cloned())
    }

    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, Error> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| field_eq(doc, field, value)))
            .cloned())
    }

    async fn insert(&self, collection: Collection, document: Document) -> Result<Document, Error> {
        let (id, document) = prepare_insert(document);

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection).or_default();

        if documents.iter().any(|doc| has_id(doc, id)) {
            return Err(StoreError::UniqueViolation {
                field: ID_FIELD.to_string(),
            }
            .into());
        }
        check_unique(collection, documents, &document, None)?;

        debug!(target: STORE, msg = "Insert", %collection, %id);
        documents.push(document.clone());
        Ok(document)
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Document,
        precondition: Option<Precondition>,
    ) -> Result<Option<Document>, Error> {
        let patch = prepare_patch(patch);

        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(&collection) else {
            return Ok(None);
        };

        let Some(index) = documents.iter().position(|doc| has_id(doc, id)) else {
            return Ok(None);
        };

        if let Some(precondition) = precondition {
            if !precondition.holds(&documents[index]) {
                return Err(StoreError::PreconditionFailed {
                    field: precondition.field.to_string(),
                    expected: precondition.expected,
                }
                .into());
            }
        }

        let mut merged = documents[index].clone();
        merged.extend(patch);
        check_unique(collection, documents, &merged, Some(id))?;

        debug!(target: STORE, msg = "Update", %collection, %id);
        documents[index] = merged.clone();
        Ok(Some(merged))
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, Error> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(&collection) else {
            return Ok(false);
        };

        let before = documents.len();
        documents.retain(|doc| !has_id(doc, id));

        debug!(target: STORE, msg = "Delete", %collection, %id);
        Ok(documents.len() < before)
    }

    async fn delete_all(&self, collection: Collection) -> Result<u64, Error> {
        let mut collections = self.collections.write().await;
        let deleted = collections
            .remove(&collection)
            .map(|docs| docs.len() as u64)
            .unwrap_or_default();

        debug!(target: STORE, msg = "Delete all", %collection, deleted);
        Ok(deleted)
    }
}
