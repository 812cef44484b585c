#![forbid(unsafe_code)]

use super::{Patch, Validate, ValidationError, require_name, require_present, require_text};
use crate::ids::ProfileId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 9200;
pub const DEFAULT_INDICATOR_COLOR: &str = "blue";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    #[default]
    None,
    Basic,
    ApiKey,
}

impl AuthMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::Basic => "basic",
            AuthMethod::ApiKey => "api-key",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Some(AuthMethod::None),
            "basic" => Some(AuthMethod::Basic),
            "api-key" | "apikey" | "api_key" => Some(AuthMethod::ApiKey),
            _ => None,
        }
    }
}

/// A named connection to a search cluster. At most one profile in a store
/// carries `is_default = true`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConnectionProfile {
    pub id: ProfileId,
    pub name: String,
    pub env_indicator_color: String,
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub auth_method: AuthMethod,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub is_default: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Validate for ConnectionProfile {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_profile_fields(ProfileFields {
            name: &self.name,
            host: &self.host,
            port: self.port,
            auth_method: self.auth_method,
            username: self.username.as_deref(),
            api_key: self.api_key.as_deref(),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct NewProfile {
    pub name: String,
    pub host: String,
    pub port: Option<u16>,
    #[serde(default)]
    pub use_tls: bool,
    pub auth_method: Option<AuthMethod>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub env_indicator_color: Option<String>,
}

impl NewProfile {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn auth_method_or_default(&self) -> AuthMethod {
        self.auth_method.unwrap_or_default()
    }

    pub fn color_or_default(&self) -> &str {
        match self.env_indicator_color.as_deref() {
            Some(color) if !color.trim().is_empty() => color,
            _ => DEFAULT_INDICATOR_COLOR,
        }
    }
}

impl Validate for NewProfile {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_profile_fields(ProfileFields {
            name: &self.name,
            host: &self.host,
            port: self.port_or_default(),
            auth_method: self.auth_method_or_default(),
            username: self.username.as_deref(),
            api_key: self.api_key.as_deref(),
        })
    }
}

/// Partial profile update.
///
/// `set_as_default` is not a record field: the store routes it through the
/// default-flag registry instead of writing it with the other columns, so it
/// does not count towards [`Patch::is_empty`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub env_indicator_color: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub use_tls: Option<bool>,
    pub auth_method: Option<AuthMethod>,
    pub username: Option<Option<String>>,
    pub password: Option<Option<String>>,
    pub api_key: Option<Option<String>>,
    pub set_as_default: Option<bool>,
}

impl Patch<ConnectionProfile> for ProfilePatch {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.env_indicator_color.is_none()
            && self.host.is_none()
            && self.port.is_none()
            && self.use_tls.is_none()
            && self.auth_method.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.api_key.is_none()
    }

    fn apply_to(&self, record: &mut ConnectionProfile) {
        if let Some(name) = &self.name {
            record.name = name.trim().to_string();
        }
        if let Some(color) = &self.env_indicator_color {
            record.env_indicator_color = color.clone();
        }
        if let Some(host) = &self.host {
            record.host = host.clone();
        }
        if let Some(port) = self.port {
            record.port = port;
        }
        if let Some(use_tls) = self.use_tls {
            record.use_tls = use_tls;
        }
        if let Some(auth_method) = self.auth_method {
            record.auth_method = auth_method;
        }
        if let Some(username) = &self.username {
            record.username = username.clone();
        }
        if let Some(password) = &self.password {
            record.password = password.clone();
        }
        if let Some(api_key) = &self.api_key {
            record.api_key = api_key.clone();
        }
    }
}

struct ProfileFields<'a> {
    name: &'a str,
    host: &'a str,
    port: u16,
    auth_method: AuthMethod,
    username: Option<&'a str>,
    api_key: Option<&'a str>,
}

fn validate_profile_fields(fields: ProfileFields<'_>) -> Result<(), ValidationError> {
    require_name("name", fields.name)?;
    require_text("host", fields.host)?;
    if fields.host.chars().any(char::is_whitespace) {
        return Err(ValidationError::new("host", "must not contain whitespace"));
    }
    if fields.port == 0 {
        return Err(ValidationError::new("port", "must be between 1 and 65535"));
    }
    match fields.auth_method {
        AuthMethod::None => Ok(()),
        AuthMethod::Basic => require_present(
            "username",
            fields.username,
            "is required for basic authentication",
        ),
        AuthMethod::ApiKey => require_present(
            "api_key",
            fields.api_key,
            "is required for api-key authentication",
        ),
    }
}
