use super::{Document, Precondition, SharedStore};
use crate::error::{Error, StoreError};
use crate::prometheus::DOCUMENTS_CREATED_TOTAL;
use hospital_model::{Entity, ValidationError};
use metrics::counter;
use serde_json::Value;
use std::marker::PhantomData;
use uuid::Uuid;

///
/// Typed access to one collection of the document store.
///
/// Entities are validated before every write. A patch is merged into the
/// stored document and the result is checked against the entity schema
/// before it is written.
///
pub struct Repository<T> {
    store: SharedStore,
    entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Repository {
            store: self.store.clone(),
            entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: SharedStore) -> Self {
        Repository {
            store,
            entity: PhantomData,
        }
    }

    pub async fn all(&self) -> Result<Vec<T>, Error> {
        self.store
            .find_all(T::COLLECTION)
            .await?
            .into_iter()
            .map(from_stored)
            .collect()
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<T>, Error> {
        self.store
            .find_by_id(T::COLLECTION, id)
            .await?
            .map(from_stored)
            .transpose()
    }

    pub async fn find_by(&self, field: &str, value: &str) -> Result<Option<T>, Error> {
        self.find_document_by(field, value)
            .await?
            .map(from_stored)
            .transpose()
    }

    /// The raw stored document, including fields the entity type does not carry
    pub async fn find_document_by(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, Error> {
        self.store.find_by_field(T::COLLECTION, field, value).await
    }

    pub async fn create(&self, entity: &T) -> Result<T, Error> {
        self.create_with(entity, Document::new()).await
    }

    ///
    /// Creates the entity with additional fields stored alongside it.
    /// The extra fields are never returned in the entity.
    ///
    pub async fn create_with(&self, entity: &T, extra: Document) -> Result<T, Error> {
        entity.validate()?;

        let mut document = to_document(entity)?;
        document.extend(extra);

        let stored = self.store.insert(T::COLLECTION, document).await?;

        counter!(DOCUMENTS_CREATED_TOTAL, "collection" => T::COLLECTION.name()).increment(1);

        from_stored(stored)
    }

    pub async fn patch(&self, id: Uuid, patch: Document) -> Result<Option<T>, Error> {
        self.patch_if(id, patch, None).await
    }

    ///
    /// Applies `patch` if the document exists and the merged result is a valid entity.
    /// Returns `None` if no document has the id.
    ///
    pub async fn patch_if(
        &self,
        id: Uuid,
        patch: Document,
        precondition: Option<Precondition>,
    ) -> Result<Option<T>, Error> {
        let Some(mut current) = self.store.find_by_id(T::COLLECTION, id).await? else {
            return Ok(None);
        };

        current.extend(patch.clone());
        let merged: T = serde_json::from_value(Value::Object(current))
            .map_err(ValidationError::from)?;
        merged.validate()?;

        self.store
            .update(T::COLLECTION, id, patch, precondition)
            .await?
            .map(from_stored)
            .transpose()
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, Error> {
        self.store.delete(T::COLLECTION, id).await
    }

    pub async fn delete_all(&self) -> Result<u64, Error> {
        self.store.delete_all(T::COLLECTION).await
    }
}

pub(crate) fn to_document<T: Entity>(entity: &T) -> Result<Document, Error> {
    match serde_json::to_value(entity).map_err(StoreError::from)? {
        Value::Object(document) => Ok(document),
        _ => Err(ValidationError::Schema {
            message: format!("{} must be a JSON object", T::COLLECTION.label()),
        }
        .into()),
    }
}

/// Stored documents that no longer match the schema are a server fault, not a client one
fn from_stored<T: Entity>(document: Document) -> Result<T, Error> {
    let entity = serde_json::from_value(Value::Object(document)).map_err(StoreError::from)?;
    Ok(entity)
}
