#![forbid(unsafe_code)]

use super::entity::Tx;
use super::error::{RecordKind, StoreError};
use super::folders::CascadeCount;
use super::SqliteStore;
use folio_core::ids::CollectionId;
use folio_core::{
    Collection, CollectionPatch, DEFAULT_COLLECTION_DESCRIPTION, DEFAULT_COLLECTION_NAME,
    NewCollection, Validate,
};
use rusqlite::params;

fn delete_collection_tx(tx: &Tx<'_>, id: CollectionId) -> Result<CascadeCount, StoreError> {
    if !tx.exists::<Collection>(id)? {
        return Err(StoreError::not_found(RecordKind::Collection, id));
    }
    let requests = tx
        .conn()
        .execute("DELETE FROM requests WHERE collection_id = ?1", params![id.get()])?;
    // One statement: the self-referencing key is checked once it completes.
    let folders = tx
        .conn()
        .execute("DELETE FROM folders WHERE collection_id = ?1", params![id.get()])?;
    tx.delete::<Collection>(id)?;
    Ok(CascadeCount { folders, requests })
}

impl SqliteStore {
    pub fn create_collection(&mut self, draft: &NewCollection) -> Result<Collection, StoreError> {
        draft.validate()?;
        self.run_in_transaction("create_collection", |tx| tx.create::<Collection>(draft))
    }

    pub fn get_collection(&mut self, id: CollectionId) -> Result<Collection, StoreError> {
        self.read("get_collection", |tx| tx.get::<Collection>(id))
    }

    pub fn list_collections(&mut self) -> Result<Vec<Collection>, StoreError> {
        self.read("list_collections", |tx| tx.list::<Collection>(&[]))
    }

    pub fn update_collection(
        &mut self,
        id: CollectionId,
        patch: &CollectionPatch,
    ) -> Result<Collection, StoreError> {
        self.run_in_transaction("update_collection", |tx| {
            tx.update::<Collection, _>(id, patch)
        })
    }

    /// Deletes the collection with every folder and request it owns.
    pub fn delete_collection(&mut self, id: CollectionId) -> Result<CascadeCount, StoreError> {
        let count =
            self.run_in_transaction("delete_collection", |tx| delete_collection_tx(tx, id))?;
        log::info!(
            "deleted collection {id} with {} folder(s) and {} request(s)",
            count.folders,
            count.requests
        );
        Ok(count)
    }

    /// Returns the first collection in list order, creating the stock
    /// "My Requests" collection when none exists yet.
    pub fn ensure_default_collection(&mut self) -> Result<Collection, StoreError> {
        self.run_in_transaction("ensure_default_collection", |tx| {
            if let Some(first) = tx.list::<Collection>(&[])?.into_iter().next() {
                return Ok(first);
            }
            let mut draft = NewCollection::new(DEFAULT_COLLECTION_NAME);
            draft.description = Some(DEFAULT_COLLECTION_DESCRIPTION.to_string());
            let created = tx.create::<Collection>(&draft)?;
            log::info!("created default collection {}", created.id);
            Ok(created)
        })
    }
}
