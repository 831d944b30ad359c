use super::*;

// =============================================================
// Helpers
// =============================================================

fn make_user() -> User {
    User {
        id: 7,
        email: "ada@example.com".to_owned(),
        username: "ada".to_owned(),
        first_name: "Ada".to_owned(),
        last_name: "Lovelace".to_owned(),
        role: Role::Employee,
        is_active: true,
        created_at: None,
        updated_at: None,
    }
}

// =============================================================
// SessionToken
// =============================================================

#[test]
fn session_token_trims_whitespace() {
    let token = SessionToken::new("  abc123\n").unwrap();
    assert_eq!(token.expose(), "abc123");
}

#[test]
fn session_token_rejects_blank() {
    assert!(SessionToken::new("").is_none());
    assert!(SessionToken::new("   \n").is_none());
}

#[test]
fn session_token_debug_is_redacted() {
    let token = SessionToken::new("super-secret").unwrap();
    let rendered = format!("{token:?}");
    assert!(!rendered.contains("super-secret"));
}

#[test]
fn token_response_defaults_token_type() {
    let body: TokenResponse = serde_json::from_str(r#"{"access_token":"abc123"}"#).unwrap();
    assert_eq!(body.access_token, "abc123");
    assert_eq!(body.token_type, "bearer");
}

// =============================================================
// Credentials / Registration
// =============================================================

#[test]
fn credentials_debug_hides_secret() {
    let creds = Credentials::new("ada@example.com", "hunter2");
    let rendered = format!("{creds:?}");
    assert!(rendered.contains("ada@example.com"));
    assert!(!rendered.contains("hunter2"));
}

#[test]
fn registration_credentials_use_email_and_password() {
    let registration = Registration {
        email: "ada@example.com".to_owned(),
        username: "ada".to_owned(),
        password: "hunter2".to_owned(),
        first_name: "Ada".to_owned(),
        last_name: "Lovelace".to_owned(),
        role: Role::Employee,
    };
    assert_eq!(registration.credentials(), Credentials::new("ada@example.com", "hunter2"));
    assert!(!format!("{registration:?}").contains("hunter2"));
}

#[test]
fn registration_serializes_backend_fields() {
    let registration = Registration {
        email: "ada@example.com".to_owned(),
        username: "ada".to_owned(),
        password: "hunter2".to_owned(),
        first_name: "Ada".to_owned(),
        last_name: "Lovelace".to_owned(),
        role: Role::Manager,
    };
    let value = serde_json::to_value(&registration).unwrap();
    assert_eq!(value["email"], "ada@example.com");
    assert_eq!(value["password"], "hunter2");
    assert_eq!(value["role"], "manager");
}

// =============================================================
// Role
// =============================================================

#[test]
fn role_parses_case_insensitively() {
    assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
    assert_eq!(" employee ".parse::<Role>().unwrap(), Role::Employee);
    assert!("owner".parse::<Role>().is_err());
}

#[test]
fn role_unknown_wire_value_maps_to_other() {
    let role: Role = serde_json::from_str("\"contractor\"").unwrap();
    assert_eq!(role, Role::Other);
}

// =============================================================
// User
// =============================================================

#[test]
fn user_deserializes_backend_payload() {
    let json = r#"{
        "id": 1,
        "email": "user@example.com",
        "username": "testuser",
        "first_name": "Test",
        "last_name": "User",
        "role": "admin",
        "is_active": true,
        "created_at": "2023-01-01T00:00:00",
        "updated_at": "2023-01-01T00:00:00"
    }"#;
    let user: User = serde_json::from_str(json).unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.created_at.as_deref(), Some("2023-01-01T00:00:00"));
}

#[test]
fn user_missing_optional_fields_uses_defaults() {
    let json = r#"{"id":2,"email":"e@x","username":"e","first_name":"E","last_name":"X"}"#;
    let user: User = serde_json::from_str(json).unwrap();
    assert_eq!(user.role, Role::Employee);
    assert!(user.is_active);
    assert!(user.created_at.is_none());
}

#[test]
fn user_missing_required_field_fails() {
    let json = r#"{"id":2,"email":"e@x"}"#;
    assert!(serde_json::from_str::<User>(json).is_err());
}

#[test]
fn display_name_falls_back_to_user() {
    let mut user = make_user();
    assert_eq!(user.display_name(), "Ada");
    user.first_name = "  ".to_owned();
    assert_eq!(user.display_name(), "User");
}

#[test]
fn full_name_skips_empty_parts() {
    let mut user = make_user();
    assert_eq!(user.full_name(), "Ada Lovelace");
    user.last_name = String::new();
    assert_eq!(user.full_name(), "Ada");
}
