#![forbid(unsafe_code)]

use super::entity::Record;
use super::error::RecordKind;
use folio_core::ids::{CollectionId, FolderId, ProfileId, RequestId};
use folio_core::{
    AuthMethod, Collection, ConnectionProfile, Folder, HttpMethod, NewCollection, NewFolder,
    NewProfile, NewRequest, SavedRequest, ValidationError,
};
use rusqlite::Row;
use rusqlite::types::{Type, Value};

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn opt_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, text)
}

fn opt_id(value: Option<impl Into<i64>>) -> Value {
    value.map_or(Value::Null, |id| Value::Integer(id.into()))
}

fn enum_column<T>(
    row: &Row<'_>,
    column: &'static str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    parse(&raw).ok_or_else(|| {
        let index = row.as_ref().column_index(column).unwrap_or_default();
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            Box::new(ValidationError::new(
                column,
                format!("unrecognized stored value {raw:?}"),
            )),
        )
    })
}

fn port_column(row: &Row<'_>) -> rusqlite::Result<u16> {
    let raw: i64 = row.get("port")?;
    u16::try_from(raw).map_err(|err| {
        let index = row.as_ref().column_index("port").unwrap_or_default();
        rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(err))
    })
}

impl Record for ConnectionProfile {
    type Id = ProfileId;
    type Draft = NewProfile;

    const KIND: RecordKind = RecordKind::Profile;
    const TABLE: &'static str = "profiles";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "env_indicator_color",
        "host",
        "port",
        "use_tls",
        "auth_method",
        "username",
        "password",
        "api_key",
    ];
    const READ_ONLY: &'static [&'static str] = &["is_default"];
    const ORDER_BY: &'static str = "name ASC, id ASC";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: ProfileId::new(row.get("id")?),
            name: row.get("name")?,
            env_indicator_color: row.get("env_indicator_color")?,
            host: row.get("host")?,
            port: port_column(row)?,
            use_tls: row.get("use_tls")?,
            auth_method: enum_column(row, "auth_method", AuthMethod::parse)?,
            username: row.get("username")?,
            password: row.get("password")?,
            api_key: row.get("api_key")?,
            is_default: row.get("is_default")?,
            created_at_ms: row.get("created_at_ms")?,
            updated_at_ms: row.get("updated_at_ms")?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            text(&self.env_indicator_color),
            text(&self.host),
            Value::Integer(i64::from(self.port)),
            Value::Integer(i64::from(self.use_tls)),
            text(self.auth_method.as_str()),
            opt_text(self.username.as_deref()),
            opt_text(self.password.as_deref()),
            opt_text(self.api_key.as_deref()),
        ]
    }

    fn draft_values(draft: &NewProfile) -> Vec<Value> {
        vec![
            text(draft.name.trim()),
            text(draft.color_or_default()),
            text(&draft.host),
            Value::Integer(i64::from(draft.port_or_default())),
            Value::Integer(i64::from(draft.use_tls)),
            text(draft.auth_method_or_default().as_str()),
            opt_text(draft.username.as_deref()),
            opt_text(draft.password.as_deref()),
            opt_text(draft.api_key.as_deref()),
        ]
    }
}

impl Record for Collection {
    type Id = CollectionId;
    type Draft = NewCollection;

    const KIND: RecordKind = RecordKind::Collection;
    const TABLE: &'static str = "collections";
    const COLUMNS: &'static [&'static str] = &["name", "description"];
    const ORDER_BY: &'static str = "name ASC, id ASC";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: CollectionId::new(row.get("id")?),
            name: row.get("name")?,
            description: row.get("description")?,
            created_at_ms: row.get("created_at_ms")?,
            updated_at_ms: row.get("updated_at_ms")?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![text(&self.name), opt_text(self.description.as_deref())]
    }

    fn draft_values(draft: &NewCollection) -> Vec<Value> {
        vec![text(draft.name.trim()), opt_text(draft.description.as_deref())]
    }
}

impl Record for Folder {
    type Id = FolderId;
    type Draft = NewFolder;

    const KIND: RecordKind = RecordKind::Folder;
    const TABLE: &'static str = "folders";
    const COLUMNS: &'static [&'static str] = &["name", "parent_folder_id", "collection_id"];
    const ORDER_BY: &'static str = "name ASC, id ASC";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: FolderId::new(row.get("id")?),
            name: row.get("name")?,
            parent_folder_id: row.get::<_, Option<i64>>("parent_folder_id")?.map(FolderId::new),
            collection_id: CollectionId::new(row.get("collection_id")?),
            created_at_ms: row.get("created_at_ms")?,
            updated_at_ms: row.get("updated_at_ms")?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            opt_id(self.parent_folder_id),
            Value::Integer(self.collection_id.get()),
        ]
    }

    fn draft_values(draft: &NewFolder) -> Vec<Value> {
        vec![
            text(draft.name.trim()),
            opt_id(draft.parent_folder_id),
            Value::Integer(draft.collection_id.get()),
        ]
    }
}

impl Record for SavedRequest {
    type Id = RequestId;
    type Draft = NewRequest;

    const KIND: RecordKind = RecordKind::Request;
    const TABLE: &'static str = "requests";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "method",
        "url",
        "body",
        "description",
        "folder_id",
        "collection_id",
    ];
    const ORDER_BY: &'static str = "name ASC, id ASC";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: RequestId::new(row.get("id")?),
            name: row.get("name")?,
            method: enum_column(row, "method", HttpMethod::parse)?,
            url: row.get("url")?,
            body: row.get("body")?,
            description: row.get("description")?,
            folder_id: row.get::<_, Option<i64>>("folder_id")?.map(FolderId::new),
            collection_id: CollectionId::new(row.get("collection_id")?),
            created_at_ms: row.get("created_at_ms")?,
            updated_at_ms: row.get("updated_at_ms")?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            text(self.method.as_str()),
            text(&self.url),
            opt_text(self.body.as_deref()),
            opt_text(self.description.as_deref()),
            opt_id(self.folder_id),
            Value::Integer(self.collection_id.get()),
        ]
    }

    fn draft_values(draft: &NewRequest) -> Vec<Value> {
        vec![
            text(draft.name.trim()),
            text(draft.method_or_default().as_str()),
            text(&draft.url),
            opt_text(draft.body.as_deref()),
            opt_text(draft.description.as_deref()),
            opt_id(draft.folder_id),
            Value::Integer(draft.collection_id.get()),
        ]
    }
}
