use super::*;
use crate::ids::{CollectionId, ProfileId};
use rstest::rstest;

fn profile() -> ConnectionProfile {
    ConnectionProfile {
        id: ProfileId::new(1),
        name: "local".to_string(),
        env_indicator_color: DEFAULT_INDICATOR_COLOR.to_string(),
        host: "localhost".to_string(),
        port: DEFAULT_PORT,
        use_tls: false,
        auth_method: AuthMethod::None,
        username: None,
        password: None,
        api_key: None,
        is_default: true,
        created_at_ms: 1,
        updated_at_ms: 1,
    }
}

#[rstest]
#[case("", "localhost", None, "name")]
#[case("   ", "localhost", None, "name")]
#[case("prod", "", None, "host")]
#[case("prod", "my host", None, "host")]
#[case("prod", "localhost", Some(0), "port")]
fn new_profile_rejects_bad_fields(
    #[case] name: &str,
    #[case] host: &str,
    #[case] port: Option<u16>,
    #[case] field: &str,
) {
    let mut draft = NewProfile::new(name, host);
    draft.port = port;
    let err = draft.validate().unwrap_err();
    assert_eq!(err.field, field);
}

#[rstest]
#[case(AuthMethod::Basic, None, None, Some("username"))]
#[case(AuthMethod::Basic, Some("elastic"), None, None)]
#[case(AuthMethod::ApiKey, Some("elastic"), None, Some("api_key"))]
#[case(AuthMethod::ApiKey, None, Some("c2VjcmV0"), None)]
#[case(AuthMethod::None, None, None, None)]
fn auth_method_requires_matching_credentials(
    #[case] auth_method: AuthMethod,
    #[case] username: Option<&str>,
    #[case] api_key: Option<&str>,
    #[case] failing_field: Option<&str>,
) {
    let mut draft = NewProfile::new("cluster", "es.internal");
    draft.auth_method = Some(auth_method);
    draft.username = username.map(str::to_string);
    draft.api_key = api_key.map(str::to_string);
    assert_eq!(draft.validate().err().map(|e| e.field), failing_field);
}

#[test]
fn new_profile_defaults() {
    let draft = NewProfile::new("local", "localhost");
    assert_eq!(draft.port_or_default(), 9200);
    assert_eq!(draft.auth_method_or_default(), AuthMethod::None);
    assert_eq!(draft.color_or_default(), "blue");

    let mut draft = draft;
    draft.env_indicator_color = Some("  ".to_string());
    assert_eq!(draft.color_or_default(), "blue");
}

#[test]
fn auth_method_round_trips_through_text() {
    for method in [AuthMethod::None, AuthMethod::Basic, AuthMethod::ApiKey] {
        assert_eq!(AuthMethod::parse(method.as_str()), Some(method));
    }
    assert_eq!(AuthMethod::parse("API_KEY"), Some(AuthMethod::ApiKey));
    assert_eq!(AuthMethod::parse("kerberos"), None);
}

#[test]
fn profile_patch_merges_only_present_fields() {
    let mut record = profile();
    let patch = ProfilePatch {
        host: Some("es.prod".to_string()),
        username: Some(None),
        set_as_default: Some(false),
        ..ProfilePatch::default()
    };
    assert!(!patch.is_empty());
    patch.apply_to(&mut record);

    assert_eq!(record.host, "es.prod");
    assert_eq!(record.name, "local");
    assert_eq!(record.port, DEFAULT_PORT);
    assert!(record.is_default, "patch must never touch the default flag");
}

#[test]
fn profile_patch_with_only_default_flag_is_empty() {
    let patch = ProfilePatch {
        set_as_default: Some(true),
        ..ProfilePatch::default()
    };
    assert!(patch.is_empty());
}

#[test]
fn http_method_parse_is_case_insensitive() {
    assert_eq!(HttpMethod::parse("get"), Some(HttpMethod::Get));
    assert_eq!(HttpMethod::parse(" Delete "), Some(HttpMethod::Delete));
    assert_eq!(HttpMethod::parse("BREW"), None);
    assert_eq!(HttpMethod::default().as_str(), "GET");
}

#[test]
fn new_request_requires_name_and_url() {
    let collection = CollectionId::new(1);
    assert_eq!(
        NewRequest::new("", "/_search", collection)
            .validate()
            .unwrap_err()
            .field,
        "name"
    );
    assert_eq!(
        NewRequest::new("search", " ", collection)
            .validate()
            .unwrap_err()
            .field,
        "url"
    );
    assert!(
        NewRequest::new("search", "/_search", collection)
            .validate()
            .is_ok()
    );
}

#[test]
fn names_are_bounded() {
    let long = "x".repeat(MAX_NAME_LEN + 1);
    let err = NewCollection::new(long).validate().unwrap_err();
    assert_eq!(err.field, "name");
    assert!(NewCollection::new("x".repeat(MAX_NAME_LEN)).validate().is_ok());
}

#[test]
fn request_patch_clears_optional_fields() {
    let mut request = SavedRequest {
        id: crate::ids::RequestId::new(4),
        name: "health".to_string(),
        method: HttpMethod::Get,
        url: "/_cluster/health".to_string(),
        body: Some("{}".to_string()),
        description: Some("cluster health".to_string()),
        folder_id: None,
        collection_id: CollectionId::new(1),
        created_at_ms: 0,
        updated_at_ms: 0,
    };
    RequestPatch {
        body: Some(None),
        method: Some(HttpMethod::Post),
        ..RequestPatch::default()
    }
    .apply_to(&mut request);

    assert_eq!(request.body, None);
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.description.as_deref(), Some("cluster health"));
}

#[test]
fn patched_names_are_trimmed() {
    let mut record = profile();
    ProfilePatch {
        name: Some("  staging \t".to_string()),
        ..ProfilePatch::default()
    }
    .apply_to(&mut record);
    assert_eq!(record.name, "staging");
}
