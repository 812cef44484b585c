#![forbid(unsafe_code)]

use crate::ids::{CollectionId, FolderId, RequestId};
use crate::model::{Collection, Folder, HttpMethod, MAX_FOLDER_DEPTH, SavedRequest};
use serde::Serialize;

/// Everything needed to render one collection, read from a single
/// consistent view of the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchySnapshot {
    pub collection: Collection,
    pub folders: Vec<Folder>,
    pub requests: Vec<SavedRequest>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Collection,
    Folder,
    Request,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Collection => "collection",
            NodeKind::Folder => "folder",
            NodeKind::Request => "request",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CollectionTreeNode {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub children: Vec<CollectionTreeNode>,
}

impl CollectionTreeNode {
    pub(crate) fn for_collection(collection: &Collection) -> Self {
        Self {
            id: collection.id.get(),
            name: collection.name.clone(),
            kind: NodeKind::Collection,
            method: None,
            url: None,
            body: None,
            description: collection.description.clone(),
            children: Vec::new(),
        }
    }

    pub(crate) fn for_folder(folder: &Folder) -> Self {
        Self {
            id: folder.id.get(),
            name: folder.name.clone(),
            kind: NodeKind::Folder,
            method: None,
            url: None,
            body: None,
            description: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn for_request(request: &SavedRequest) -> Self {
        Self {
            id: request.id.get(),
            name: request.name.clone(),
            kind: NodeKind::Request,
            method: Some(request.method),
            url: Some(request.url.clone()),
            body: request.body.clone(),
            description: request.description.clone(),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(CollectionTreeNode::node_count)
            .sum::<usize>()
    }

    pub fn child(&self, name: &str) -> Option<&CollectionTreeNode> {
        self.children.iter().find(|child| child.name == name)
    }
}

/// A snapshot that cannot be turned into a tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    FolderCycle {
        folder_id: FolderId,
    },
    ForeignFolder {
        folder_id: FolderId,
        collection_id: CollectionId,
    },
    ForeignRequest {
        request_id: RequestId,
        collection_id: CollectionId,
    },
    DanglingParent {
        folder_id: FolderId,
        parent_folder_id: FolderId,
    },
    DanglingRequest {
        request_id: RequestId,
        folder_id: FolderId,
    },
    DepthExceeded {
        folder_id: FolderId,
    },
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FolderCycle { folder_id } => {
                write!(f, "folder {folder_id} is part of a parent cycle")
            }
            Self::ForeignFolder {
                folder_id,
                collection_id,
            } => write!(
                f,
                "folder {folder_id} belongs to collection {collection_id}, not the snapshot collection"
            ),
            Self::ForeignRequest {
                request_id,
                collection_id,
            } => write!(
                f,
                "request {request_id} belongs to collection {collection_id}, not the snapshot collection"
            ),
            Self::DanglingParent {
                folder_id,
                parent_folder_id,
            } => write!(
                f,
                "folder {folder_id} references missing parent folder {parent_folder_id}"
            ),
            Self::DepthExceeded { folder_id } => write!(
                f,
                "folder {folder_id} is nested deeper than {MAX_FOLDER_DEPTH} levels"
            ),
            Self::DanglingRequest {
                request_id,
                folder_id,
            } => write!(
                f,
                "request {request_id} references missing folder {folder_id}"
            ),
        }
    }
}

impl std::error::Error for TreeError {}
