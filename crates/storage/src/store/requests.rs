#![forbid(unsafe_code)]

use super::entity::{Filter, Tx};
use super::error::{RecordKind, StoreError};
use super::folders::folder_in_collection_tx;
use super::SqliteStore;
use folio_core::ids::{CollectionId, FolderId, RequestId};
use folio_core::{Collection, Folder, NewRequest, RequestPatch, SavedRequest, Validate};
use rusqlite::params;

fn move_request_tx(
    tx: &Tx<'_>,
    id: RequestId,
    new_folder: Option<FolderId>,
) -> Result<SavedRequest, StoreError> {
    let request = tx.get::<SavedRequest>(id)?;
    if request.folder_id == new_folder {
        return Ok(request);
    }
    if let Some(folder_id) = new_folder {
        folder_in_collection_tx(tx, folder_id, request.collection_id, "folder_id")?;
    }
    tx.conn().execute(
        "UPDATE requests SET folder_id = ?1, updated_at_ms = ?2 WHERE id = ?3",
        params![new_folder.map(FolderId::get), tx.now_ms(), id.get()],
    )?;
    tx.get::<SavedRequest>(id)
}

impl SqliteStore {
    /// Saves a request into a collection, either at its root or inside one of
    /// its folders.
    pub fn create_request(&mut self, draft: &NewRequest) -> Result<SavedRequest, StoreError> {
        draft.validate()?;
        self.run_in_transaction("create_request", |tx| {
            if !tx.exists::<Collection>(draft.collection_id)? {
                return Err(StoreError::not_found(
                    RecordKind::Collection,
                    draft.collection_id,
                ));
            }
            if let Some(folder_id) = draft.folder_id {
                folder_in_collection_tx(tx, folder_id, draft.collection_id, "folder_id")?;
            }
            tx.create::<SavedRequest>(draft)
        })
    }

    /// `None` detaches the request to its collection root.
    pub fn move_request(
        &mut self,
        id: RequestId,
        new_folder: Option<FolderId>,
    ) -> Result<SavedRequest, StoreError> {
        self.run_in_transaction("move_request", |tx| move_request_tx(tx, id, new_folder))
    }

    pub fn update_request(
        &mut self,
        id: RequestId,
        patch: &RequestPatch,
    ) -> Result<SavedRequest, StoreError> {
        self.run_in_transaction("update_request", |tx| {
            tx.update::<SavedRequest, _>(id, patch)
        })
    }

    pub fn delete_request(&mut self, id: RequestId) -> Result<(), StoreError> {
        self.run_in_transaction("delete_request", |tx| tx.delete::<SavedRequest>(id))
    }

    pub fn get_request(&mut self, id: RequestId) -> Result<SavedRequest, StoreError> {
        self.read("get_request", |tx| tx.get::<SavedRequest>(id))
    }

    /// Every request of the collection, wherever it sits in the hierarchy.
    pub fn list_requests(
        &mut self,
        collection_id: CollectionId,
    ) -> Result<Vec<SavedRequest>, StoreError> {
        self.read("list_requests", |tx| {
            if !tx.exists::<Collection>(collection_id)? {
                return Err(StoreError::not_found(RecordKind::Collection, collection_id));
            }
            tx.list::<SavedRequest>(&[Filter::eq("collection_id", collection_id)])
        })
    }

    pub fn list_requests_in_folder(
        &mut self,
        folder_id: FolderId,
    ) -> Result<Vec<SavedRequest>, StoreError> {
        self.read("list_requests_in_folder", |tx| {
            if !tx.exists::<Folder>(folder_id)? {
                return Err(StoreError::not_found(RecordKind::Folder, folder_id));
            }
            tx.list::<SavedRequest>(&[Filter::eq("folder_id", folder_id)])
        })
    }
}
