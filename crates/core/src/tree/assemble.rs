#![forbid(unsafe_code)]

use super::{CollectionTreeNode, HierarchySnapshot, TreeError};
use crate::ids::{CollectionId, FolderId};
use crate::model::{Folder, MAX_FOLDER_DEPTH, SavedRequest};
use std::collections::{HashMap, HashSet};

/// Snapshot adjacency: `None` keys the collection root.
struct TreeIndex<'a> {
    child_folders: HashMap<Option<FolderId>, Vec<&'a Folder>>,
    requests: HashMap<Option<FolderId>, Vec<&'a SavedRequest>>,
}

/// Builds the nested tree for one collection in time linear in the number of
/// folders and requests (plus the per-level name sort).
///
/// At every level folders come before requests; both are ordered by name,
/// ties broken by id.
pub fn assemble_tree(snapshot: &HierarchySnapshot) -> Result<CollectionTreeNode, TreeError> {
    let collection_id = snapshot.collection.id;
    let index = index_snapshot(snapshot, collection_id)?;

    let mut root = CollectionTreeNode::for_collection(&snapshot.collection);
    let mut visited = HashSet::with_capacity(snapshot.folders.len());
    attach_children(&mut root, None, 0, &index, &mut visited)?;

    // Folders whose parent chain never reaches the root hang off a cycle.
    if visited.len() != snapshot.folders.len() {
        let stranded = snapshot
            .folders
            .iter()
            .map(|folder| folder.id)
            .filter(|id| !visited.contains(id))
            .min();
        if let Some(folder_id) = stranded {
            return Err(TreeError::FolderCycle { folder_id });
        }
    }

    Ok(root)
}

fn index_snapshot(
    snapshot: &HierarchySnapshot,
    collection_id: CollectionId,
) -> Result<TreeIndex<'_>, TreeError> {
    let mut known = HashSet::with_capacity(snapshot.folders.len());
    for folder in &snapshot.folders {
        if folder.collection_id != collection_id {
            return Err(TreeError::ForeignFolder {
                folder_id: folder.id,
                collection_id: folder.collection_id,
            });
        }
        known.insert(folder.id);
    }

    let mut child_folders: HashMap<Option<FolderId>, Vec<&Folder>> = HashMap::new();
    for folder in &snapshot.folders {
        if let Some(parent_folder_id) = folder.parent_folder_id
            && !known.contains(&parent_folder_id)
        {
            return Err(TreeError::DanglingParent {
                folder_id: folder.id,
                parent_folder_id,
            });
        }
        child_folders
            .entry(folder.parent_folder_id)
            .or_default()
            .push(folder);
    }

    let mut requests: HashMap<Option<FolderId>, Vec<&SavedRequest>> = HashMap::new();
    for request in &snapshot.requests {
        if request.collection_id != collection_id {
            return Err(TreeError::ForeignRequest {
                request_id: request.id,
                collection_id: request.collection_id,
            });
        }
        if let Some(folder_id) = request.folder_id
            && !known.contains(&folder_id)
        {
            return Err(TreeError::DanglingRequest {
                request_id: request.id,
                folder_id,
            });
        }
        requests.entry(request.folder_id).or_default().push(request);
    }

    for folders in child_folders.values_mut() {
        folders.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    }
    for leaves in requests.values_mut() {
        leaves.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    }

    Ok(TreeIndex {
        child_folders,
        requests,
    })
}

fn attach_children(
    node: &mut CollectionTreeNode,
    key: Option<FolderId>,
    depth: usize,
    index: &TreeIndex<'_>,
    visited: &mut HashSet<FolderId>,
) -> Result<(), TreeError> {
    if let Some(folders) = index.child_folders.get(&key) {
        for folder in folders {
            if !visited.insert(folder.id) {
                return Err(TreeError::FolderCycle {
                    folder_id: folder.id,
                });
            }
            if depth >= MAX_FOLDER_DEPTH {
                return Err(TreeError::DepthExceeded {
                    folder_id: folder.id,
                });
            }
            let mut child = CollectionTreeNode::for_folder(folder);
            attach_children(&mut child, Some(folder.id), depth + 1, index, visited)?;
            node.children.push(child);
        }
    }

    if let Some(leaves) = index.requests.get(&key) {
        node.children
            .extend(leaves.iter().map(|request| CollectionTreeNode::for_request(request)));
    }

    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedTree {
    pub collection_id: CollectionId,
    pub error: TreeError,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssembledTrees {
    pub trees: Vec<CollectionTreeNode>,
    pub skipped: Vec<SkippedTree>,
}

/// Assembles one tree per snapshot, in input order. A snapshot that fails to
/// assemble is reported in `skipped` and does not prevent the others.
pub fn assemble_all<I>(snapshots: I) -> AssembledTrees
where
    I: IntoIterator<Item = HierarchySnapshot>,
{
    let mut out = AssembledTrees::default();
    for snapshot in snapshots {
        match assemble_tree(&snapshot) {
            Ok(tree) => out.trees.push(tree),
            Err(error) => out.skipped.push(SkippedTree {
                collection_id: snapshot.collection.id,
                error,
            }),
        }
    }
    out
}
