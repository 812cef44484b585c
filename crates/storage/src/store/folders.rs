#![forbid(unsafe_code)]

use super::entity::{Filter, Tx};
use super::error::{RecordKind, StoreError};
use super::SqliteStore;
use folio_core::ids::{CollectionId, FolderId};
use folio_core::{
    Collection, Folder, FolderPatch, MAX_FOLDER_DEPTH, NewFolder, Validate, ValidationError,
};
use rusqlite::{OptionalExtension, params};
use std::collections::{HashMap, HashSet, VecDeque};

/// Rows removed by a cascading delete. A deleted collection is not itself
/// counted; a deleted folder is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CascadeCount {
    pub folders: usize,
    pub requests: usize,
}

impl CascadeCount {
    pub fn total(&self) -> usize {
        self.folders + self.requests
    }
}

/// Loads `folder_id` and checks it lives in `collection_id`.
pub(super) fn folder_in_collection_tx(
    tx: &Tx<'_>,
    folder_id: FolderId,
    collection_id: CollectionId,
    field: &'static str,
) -> Result<Folder, StoreError> {
    let folder = tx.get::<Folder>(folder_id)?;
    if folder.collection_id != collection_id {
        return Err(ValidationError::new(
            field,
            format!(
                "folder {folder_id} belongs to collection {}, not {collection_id}",
                folder.collection_id
            ),
        )
        .into());
    }
    Ok(folder)
}

fn parent_of_tx(tx: &Tx<'_>, id: FolderId) -> Result<Option<FolderId>, StoreError> {
    Ok(tx
        .conn()
        .query_row(
            "SELECT parent_folder_id FROM folders WHERE id = ?1",
            params![id.get()],
            |row| row.get::<_, Option<i64>>(0),
        )
        .optional()?
        .flatten()
        .map(FolderId::new))
}

/// Depth of `start` (a folder directly under its collection is at depth 1),
/// failing if `moving` is met on the way up. The walk is bounded by the
/// collection's folder count; running past it means the stored chain already
/// loops.
fn depth_of_tx(
    tx: &Tx<'_>,
    start: FolderId,
    collection_id: CollectionId,
    moving: Option<FolderId>,
) -> Result<usize, StoreError> {
    let bound = tx.count::<Folder>(&[Filter::eq("collection_id", collection_id)])?;
    let circular = StoreError::CircularReference {
        folder_id: moving.unwrap_or(start).get(),
    };

    let mut cursor = Some(start);
    let mut depth = 0usize;
    while let Some(current) = cursor {
        if Some(current) == moving || depth > bound {
            return Err(circular);
        }
        depth += 1;
        cursor = parent_of_tx(tx, current)?;
    }
    Ok(depth)
}

fn ensure_depth_allowed(depth: usize) -> Result<(), StoreError> {
    if depth > MAX_FOLDER_DEPTH {
        return Err(ValidationError::new(
            "parent_folder_id",
            format!("folders cannot be nested deeper than {MAX_FOLDER_DEPTH} levels"),
        )
        .into());
    }
    Ok(())
}

fn move_folder_tx(
    tx: &Tx<'_>,
    id: FolderId,
    new_parent: Option<FolderId>,
) -> Result<Folder, StoreError> {
    let folder = tx.get::<Folder>(id)?;
    if folder.parent_folder_id == new_parent {
        return Ok(folder);
    }
    if let Some(parent_id) = new_parent {
        folder_in_collection_tx(tx, parent_id, folder.collection_id, "parent_folder_id")?;
        let parent_depth = depth_of_tx(tx, parent_id, folder.collection_id, Some(id))?;
        let height = subtree_tx(tx, &folder)?
            .iter()
            .map(|(_, level)| *level)
            .max()
            .unwrap_or(1);
        ensure_depth_allowed(parent_depth + height)?;
    }
    tx.conn().execute(
        "UPDATE folders SET parent_folder_id = ?1, updated_at_ms = ?2 WHERE id = ?3",
        params![new_parent.map(FolderId::get), tx.now_ms(), id.get()],
    )?;
    tx.get::<Folder>(id)
}

/// Breadth-first over the collection's folders, starting at `root`. Each id
/// comes with its level below `root`, which is level 1.
fn subtree_tx(tx: &Tx<'_>, root: &Folder) -> Result<Vec<(FolderId, usize)>, StoreError> {
    let mut children: HashMap<FolderId, Vec<FolderId>> = HashMap::new();
    for folder in tx.list::<Folder>(&[Filter::eq("collection_id", root.collection_id)])? {
        if let Some(parent) = folder.parent_folder_id {
            children.entry(parent).or_default().push(folder.id);
        }
    }

    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([(root.id, 1usize)]);
    while let Some((current, level)) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }
        order.push((current, level));
        if let Some(kids) = children.get(&current) {
            queue.extend(kids.iter().map(|kid| (*kid, level + 1)));
        }
    }
    Ok(order)
}

fn delete_folder_tx(tx: &Tx<'_>, id: FolderId) -> Result<CascadeCount, StoreError> {
    let root = tx.get::<Folder>(id)?;
    let subtree = subtree_tx(tx, &root)?;

    let mut count = CascadeCount::default();
    for (folder_id, _) in &subtree {
        count.requests += tx.conn().execute(
            "DELETE FROM requests WHERE folder_id = ?1",
            params![folder_id.get()],
        )?;
    }
    // Leaves first, so no remaining folder ever points at a deleted parent.
    for (folder_id, _) in subtree.iter().rev() {
        tx.delete::<Folder>(*folder_id)?;
        count.folders += 1;
    }
    Ok(count)
}

impl SqliteStore {
    /// Creates a folder in an existing collection, optionally under a parent
    /// folder of that same collection.
    pub fn create_folder(&mut self, draft: &NewFolder) -> Result<Folder, StoreError> {
        draft.validate()?;
        self.run_in_transaction("create_folder", |tx| {
            if !tx.exists::<Collection>(draft.collection_id)? {
                return Err(StoreError::not_found(
                    RecordKind::Collection,
                    draft.collection_id,
                ));
            }
            if let Some(parent_id) = draft.parent_folder_id {
                folder_in_collection_tx(tx, parent_id, draft.collection_id, "parent_folder_id")?;
                let parent_depth = depth_of_tx(tx, parent_id, draft.collection_id, None)?;
                ensure_depth_allowed(parent_depth + 1)?;
            }
            tx.create::<Folder>(draft)
        })
    }

    /// Re-parents a folder within its collection; `None` attaches it to the
    /// collection root. Fails with [`StoreError::SelfParent`] or
    /// [`StoreError::CircularReference`] rather than introduce a cycle, and
    /// with a validation error when the moved subtree would end up deeper than
    /// [`MAX_FOLDER_DEPTH`].
    pub fn move_folder(
        &mut self,
        id: FolderId,
        new_parent: Option<FolderId>,
    ) -> Result<Folder, StoreError> {
        if new_parent == Some(id) {
            return Err(StoreError::SelfParent);
        }
        self.run_in_transaction("move_folder", |tx| move_folder_tx(tx, id, new_parent))
    }

    pub fn rename_folder(&mut self, id: FolderId, name: &str) -> Result<Folder, StoreError> {
        let patch = FolderPatch {
            name: Some(name.to_string()),
        };
        self.run_in_transaction("rename_folder", |tx| tx.update::<Folder, _>(id, &patch))
    }

    pub fn get_folder(&mut self, id: FolderId) -> Result<Folder, StoreError> {
        self.read("get_folder", |tx| tx.get::<Folder>(id))
    }

    pub fn list_folders(&mut self, collection_id: CollectionId) -> Result<Vec<Folder>, StoreError> {
        self.read("list_folders", |tx| {
            if !tx.exists::<Collection>(collection_id)? {
                return Err(StoreError::not_found(RecordKind::Collection, collection_id));
            }
            tx.list::<Folder>(&[Filter::eq("collection_id", collection_id)])
        })
    }

    /// Deletes the folder, every descendant folder, and every request attached
    /// to any of them, in one transaction.
    pub fn delete_folder(&mut self, id: FolderId) -> Result<CascadeCount, StoreError> {
        let count = self.run_in_transaction("delete_folder", |tx| delete_folder_tx(tx, id))?;
        log::info!(
            "deleted folder {id} with {} folder(s) and {} request(s)",
            count.folders,
            count.requests
        );
        Ok(count)
    }
}
