use super::*;
use crate::ids::{CollectionId, FolderId, RequestId};
use crate::model::{Collection, Folder, HttpMethod, MAX_FOLDER_DEPTH, SavedRequest};

const COLLECTION: CollectionId = CollectionId::new(1);

fn collection(name: &str) -> Collection {
    Collection {
        id: COLLECTION,
        name: name.to_string(),
        description: None,
        created_at_ms: 0,
        updated_at_ms: 0,
    }
}

fn folder(id: i64, name: &str, parent: Option<i64>) -> Folder {
    Folder {
        id: FolderId::new(id),
        name: name.to_string(),
        parent_folder_id: parent.map(FolderId::new),
        collection_id: COLLECTION,
        created_at_ms: 0,
        updated_at_ms: 0,
    }
}

fn request(id: i64, name: &str, folder: Option<i64>) -> SavedRequest {
    SavedRequest {
        id: RequestId::new(id),
        name: name.to_string(),
        method: HttpMethod::Get,
        url: format!("/{name}"),
        body: None,
        description: None,
        folder_id: folder.map(FolderId::new),
        collection_id: COLLECTION,
        created_at_ms: 0,
        updated_at_ms: 0,
    }
}

fn names(node: &CollectionTreeNode) -> Vec<&str> {
    node.children.iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn nests_folders_and_requests() {
    let snapshot = HierarchySnapshot {
        collection: collection("Requests"),
        folders: vec![folder(1, "A", None), folder(2, "B", Some(1))],
        requests: vec![request(1, "R1", Some(2))],
    };

    let tree = assemble_tree(&snapshot).unwrap();
    assert_eq!(tree.kind, NodeKind::Collection);
    assert_eq!(tree.name, "Requests");

    let a = tree.child("A").unwrap();
    assert_eq!(a.kind, NodeKind::Folder);
    let b = a.child("B").unwrap();
    let r1 = b.child("R1").unwrap();
    assert_eq!(r1.kind, NodeKind::Request);
    assert_eq!(r1.method, Some(HttpMethod::Get));
    assert_eq!(r1.url.as_deref(), Some("/R1"));
    assert!(r1.children.is_empty());
}

#[test]
fn orders_folders_before_requests_by_name_then_id() {
    let snapshot = HierarchySnapshot {
        collection: collection("c"),
        folders: vec![
            folder(3, "zeta", None),
            folder(2, "alpha", None),
            folder(1, "alpha", None),
        ],
        requests: vec![
            request(9, "beta", None),
            request(8, "aaa", None),
            request(7, "beta", None),
        ],
    };

    let tree = assemble_tree(&snapshot).unwrap();
    assert_eq!(names(&tree), vec!["alpha", "alpha", "zeta", "aaa", "beta", "beta"]);
    let ids: Vec<i64> = tree.children.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 8, 7, 9]);
}

#[test]
fn node_count_matches_snapshot_size() {
    let mut folders = Vec::new();
    let mut requests = Vec::new();
    for id in 1..=20 {
        let parent = if id == 1 { None } else { Some(id / 2) };
        folders.push(folder(id, &format!("f{id:02}"), parent));
        requests.push(request(id, &format!("r{id:02}"), parent));
    }
    requests.push(request(100, "root-request", None));
    let snapshot = HierarchySnapshot {
        collection: collection("big"),
        folders,
        requests,
    };

    let tree = assemble_tree(&snapshot).unwrap();
    assert_eq!(
        tree.node_count(),
        1 + snapshot.folders.len() + snapshot.requests.len()
    );
}

#[test]
fn empty_collection_is_a_single_node() {
    let snapshot = HierarchySnapshot {
        collection: collection("empty"),
        folders: Vec::new(),
        requests: Vec::new(),
    };
    let tree = assemble_tree(&snapshot).unwrap();
    assert_eq!(tree.node_count(), 1);
    assert!(tree.children.is_empty());
}

#[test]
fn detects_parent_cycle() {
    let snapshot = HierarchySnapshot {
        collection: collection("corrupt"),
        folders: vec![
            folder(1, "root", None),
            folder(2, "x", Some(3)),
            folder(3, "y", Some(2)),
        ],
        requests: Vec::new(),
    };
    assert_eq!(
        assemble_tree(&snapshot).unwrap_err(),
        TreeError::FolderCycle {
            folder_id: FolderId::new(2)
        }
    );
}

fn chain(depth: usize) -> Vec<Folder> {
    (1..=depth as i64)
        .map(|id| folder(id, &format!("level{id}"), (id > 1).then(|| id - 1)))
        .collect()
}

#[test]
fn accepts_chain_at_max_depth() {
    let snapshot = HierarchySnapshot {
        collection: collection("deep"),
        folders: chain(MAX_FOLDER_DEPTH),
        requests: vec![request(1, "leaf", Some(MAX_FOLDER_DEPTH as i64))],
    };
    let tree = assemble_tree(&snapshot).unwrap();
    assert_eq!(tree.node_count(), MAX_FOLDER_DEPTH + 2);
    serde_json::to_string(&tree).unwrap();
}

#[test]
fn rejects_chain_deeper_than_max_depth() {
    let snapshot = HierarchySnapshot {
        collection: collection("too deep"),
        folders: chain(MAX_FOLDER_DEPTH * 40),
        requests: Vec::new(),
    };
    assert_eq!(
        assemble_tree(&snapshot).unwrap_err(),
        TreeError::DepthExceeded {
            folder_id: FolderId::new(MAX_FOLDER_DEPTH as i64 + 1)
        }
    );

    let assembled = assemble_all(vec![snapshot]);
    assert!(assembled.trees.is_empty());
    assert_eq!(assembled.skipped.len(), 1);
}

#[test]
fn detects_dangling_references() {
    let snapshot = HierarchySnapshot {
        collection: collection("c"),
        folders: vec![folder(1, "a", Some(42))],
        requests: Vec::new(),
    };
    assert!(matches!(
        assemble_tree(&snapshot),
        Err(TreeError::DanglingParent { .. })
    ));

    let snapshot = HierarchySnapshot {
        collection: collection("c"),
        folders: Vec::new(),
        requests: vec![request(5, "orphan", Some(7))],
    };
    assert_eq!(
        assemble_tree(&snapshot).unwrap_err(),
        TreeError::DanglingRequest {
            request_id: RequestId::new(5),
            folder_id: FolderId::new(7)
        }
    );
}

#[test]
fn rejects_records_from_other_collections() {
    let mut stray = folder(1, "a", None);
    stray.collection_id = CollectionId::new(2);
    let snapshot = HierarchySnapshot {
        collection: collection("c"),
        folders: vec![stray],
        requests: Vec::new(),
    };
    assert!(matches!(
        assemble_tree(&snapshot),
        Err(TreeError::ForeignFolder { .. })
    ));
}

#[test]
fn assemble_all_skips_broken_collections() {
    let good = HierarchySnapshot {
        collection: collection("good"),
        folders: vec![folder(1, "a", None)],
        requests: Vec::new(),
    };
    let mut bad_collection = collection("bad");
    bad_collection.id = CollectionId::new(2);
    let mut cyclic = folder(5, "loop", Some(5));
    cyclic.collection_id = bad_collection.id;
    let bad = HierarchySnapshot {
        collection: bad_collection,
        folders: vec![cyclic],
        requests: Vec::new(),
    };

    let out = assemble_all(vec![bad, good]);
    assert_eq!(out.trees.len(), 1);
    assert_eq!(out.trees[0].name, "good");
    assert_eq!(out.skipped.len(), 1);
    assert_eq!(out.skipped[0].collection_id, CollectionId::new(2));
}

#[test]
fn serializes_with_type_tag() {
    let snapshot = HierarchySnapshot {
        collection: collection("Requests"),
        folders: vec![folder(1, "A", None)],
        requests: vec![request(1, "R1", Some(1))],
    };
    let tree = assemble_tree(&snapshot).unwrap();
    let value = serde_json::to_value(&tree).unwrap();

    assert_eq!(value["type"], "collection");
    assert!(value.get("method").is_none());
    let folder = &value["children"][0];
    assert_eq!(folder["type"], "folder");
    let leaf = &folder["children"][0];
    assert_eq!(leaf["type"], "request");
    assert_eq!(leaf["method"], "GET");
    assert_eq!(leaf["url"], "/R1");
}
