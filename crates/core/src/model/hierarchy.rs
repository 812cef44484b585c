#![forbid(unsafe_code)]

use super::{Patch, Validate, ValidationError, require_name, require_text};
use crate::ids::{CollectionId, FolderId, RequestId};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COLLECTION_NAME: &str = "My Requests";
pub const DEFAULT_COLLECTION_DESCRIPTION: &str = "Default collection for REST requests";
/// Deepest allowed folder nesting; a folder directly under its collection is
/// at depth 1.
pub const MAX_FOLDER_DEPTH: usize = 128;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub description: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Validate for Collection {
    fn validate(&self) -> Result<(), ValidationError> {
        require_name("name", &self.name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct NewCollection {
    pub name: String,
    pub description: Option<String>,
}

impl NewCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

impl Validate for NewCollection {
    fn validate(&self) -> Result<(), ValidationError> {
        require_name("name", &self.name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CollectionPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl Patch<Collection> for CollectionPatch {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    fn apply_to(&self, record: &mut Collection) {
        if let Some(name) = &self.name {
            record.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
    }
}

/// A node of the folder forest. `parent_folder_id = None` attaches the folder
/// directly to its collection; `collection_id` never changes after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub parent_folder_id: Option<FolderId>,
    pub collection_id: CollectionId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Validate for Folder {
    fn validate(&self) -> Result<(), ValidationError> {
        require_name("name", &self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NewFolder {
    pub name: String,
    pub parent_folder_id: Option<FolderId>,
    pub collection_id: CollectionId,
}

impl NewFolder {
    pub fn new(name: impl Into<String>, collection_id: CollectionId) -> Self {
        Self {
            name: name.into(),
            parent_folder_id: None,
            collection_id,
        }
    }

    pub fn under(mut self, parent_folder_id: FolderId) -> Self {
        self.parent_folder_id = Some(parent_folder_id);
        self
    }
}

impl Validate for NewFolder {
    fn validate(&self) -> Result<(), ValidationError> {
        require_name("name", &self.name)
    }
}

/// Renames only; re-parenting goes through the hierarchy's move operation so
/// the cycle check cannot be bypassed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct FolderPatch {
    pub name: Option<String>,
}

impl Patch<Folder> for FolderPatch {
    fn is_empty(&self) -> bool {
        self.name.is_none()
    }

    fn apply_to(&self, record: &mut Folder) {
        if let Some(name) = &self.name {
            record.name = name.trim().to_string();
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A saved request: a leaf of the hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SavedRequest {
    pub id: RequestId,
    pub name: String,
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<String>,
    pub description: Option<String>,
    pub folder_id: Option<FolderId>,
    pub collection_id: CollectionId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Validate for SavedRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_name("name", &self.name)?;
        require_text("url", &self.url)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NewRequest {
    pub name: String,
    pub method: Option<HttpMethod>,
    pub url: String,
    pub body: Option<String>,
    pub description: Option<String>,
    pub folder_id: Option<FolderId>,
    pub collection_id: CollectionId,
}

impl NewRequest {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        collection_id: CollectionId,
    ) -> Self {
        Self {
            name: name.into(),
            method: None,
            url: url.into(),
            body: None,
            description: None,
            folder_id: None,
            collection_id,
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn in_folder(mut self, folder_id: FolderId) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    pub fn method_or_default(&self) -> HttpMethod {
        self.method.unwrap_or_default()
    }
}

impl Validate for NewRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_name("name", &self.name)?;
        require_text("url", &self.url)
    }
}

/// Field edits for a saved request. Folder placement changes through the
/// hierarchy's move operation; the owning collection never changes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RequestPatch {
    pub name: Option<String>,
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub body: Option<Option<String>>,
    pub description: Option<Option<String>>,
}

impl Patch<SavedRequest> for RequestPatch {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.method.is_none()
            && self.url.is_none()
            && self.body.is_none()
            && self.description.is_none()
    }

    fn apply_to(&self, record: &mut SavedRequest) {
        if let Some(name) = &self.name {
            record.name = name.trim().to_string();
        }
        if let Some(method) = self.method {
            record.method = method;
        }
        if let Some(url) = &self.url {
            record.url = url.clone();
        }
        if let Some(body) = &self.body {
            record.body = body.clone();
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
    }
}
