#![forbid(unsafe_code)]

use super::entity::{Filter, Tx};
use super::error::StoreError;
use super::SqliteStore;
use folio_core::ids::CollectionId;
use folio_core::{
    Collection, CollectionTreeNode, Folder, HierarchySnapshot, SavedRequest, assemble_all,
    assemble_tree,
};

fn snapshot_tx(tx: &Tx<'_>, collection_id: CollectionId) -> Result<HierarchySnapshot, StoreError> {
    let collection = tx.get::<Collection>(collection_id)?;
    let owned = [Filter::eq("collection_id", collection_id)];
    Ok(HierarchySnapshot {
        collection,
        folders: tx.list::<Folder>(&owned)?,
        requests: tx.list::<SavedRequest>(&owned)?,
    })
}

impl SqliteStore {
    /// The collection with all of its folders and requests, read in one
    /// transaction.
    pub fn snapshot(&mut self, collection_id: CollectionId) -> Result<HierarchySnapshot, StoreError> {
        self.read("snapshot", |tx| snapshot_tx(tx, collection_id))
    }

    pub fn get_collection_tree(
        &mut self,
        collection_id: CollectionId,
    ) -> Result<CollectionTreeNode, StoreError> {
        let snapshot = self.snapshot(collection_id)?;
        Ok(assemble_tree(&snapshot)?)
    }

    /// One tree per collection, in collection list order. A collection whose
    /// rows cannot be read or assembled is left out and logged; only
    /// contention and failures to list the collections are returned.
    pub fn get_all_collection_trees(&mut self) -> Result<Vec<CollectionTreeNode>, StoreError> {
        let snapshots = self.read("get_all_collection_trees", |tx| {
            let mut snapshots = Vec::new();
            for collection in tx.list::<Collection>(&[])? {
                match snapshot_tx(tx, collection.id) {
                    Ok(snapshot) => snapshots.push(snapshot),
                    Err(err) if err.is_transient() => return Err(err),
                    Err(err) => {
                        log::warn!("skipping tree for collection {}: {err}", collection.id);
                    }
                }
            }
            Ok(snapshots)
        })?;

        let assembled = assemble_all(snapshots);
        for skipped in &assembled.skipped {
            log::warn!(
                "skipping tree for collection {}: {}",
                skipped.collection_id,
                skipped.error
            );
        }
        Ok(assembled.trees)
    }
}
