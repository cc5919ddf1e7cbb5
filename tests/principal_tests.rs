mod support;

use oragrant::principal::{AccountState, Authentication, User, UserChanges};
use oragrant::{Error, GrantsMode, Target};

use support::{seeded_client, test_table};

#[test]
fn created_users_read_back_with_defaults_and_supplied_attributes() {
    let mut client = seeded_client();
    let user = User {
        default_tablespace: Some("data".to_string()),
        state: Some(AccountState::Locked),
        ..User::with_password("app_owner", "s3cret")
    };

    client.create_user(&user).expect("create should succeed");

    assert!(client.user_exists("APP_OWNER").expect("exists query"));
    let info = client.read_user("app_owner").expect("read should succeed");
    assert_eq!(info.username, "APP_OWNER");
    assert_eq!(info.default_tablespace.as_deref(), Some("DATA"));
    assert_eq!(info.temporary_tablespace.as_deref(), Some("TEMP"));
    assert_eq!(info.profile.as_deref(), Some("DEFAULT"));
    assert_eq!(info.authentication_type.as_deref(), Some("PASSWORD"));
    assert_eq!(info.account_status.as_deref(), Some("LOCKED"));
}

#[test]
fn modify_changes_only_supplied_fields() {
    let mut client = seeded_client();
    let mut changes = UserChanges::new("testuser");
    changes.state = Some(AccountState::Locked);
    changes.profile = Some("app_profile".to_string());

    client.modify_user(&changes).expect("modify should succeed");

    let info = client.read_user("testuser").expect("read should succeed");
    assert_eq!(info.account_status.as_deref(), Some("LOCKED"));
    assert_eq!(info.profile.as_deref(), Some("APP_PROFILE"));
    assert_eq!(info.default_tablespace.as_deref(), Some("USERS"));

    let seed = client.session().executed().len();
    client
        .modify_user(&UserChanges::new("testuser"))
        .expect("empty modify should succeed");
    assert_eq!(client.session().executed().len(), seed);
}

#[test]
fn passwords_are_sent_but_never_logged_or_reported() {
    let mut client = seeded_client();
    client
        .session_mut()
        .fail_when("CREATE USER LEAKY", "ORA-01031: insufficient privileges");

    let err = client
        .create_user(&User::with_password("leaky", "hunter2"))
        .expect_err("injected failure");

    assert!(!err.to_string().contains("hunter2"));
}

#[test]
fn external_users_report_their_authentication_type() {
    let mut client = seeded_client();
    let user = User {
        authentication: Authentication::External,
        ..User::with_password("ops", "unused")
    };

    client.create_user(&user).expect("create should succeed");

    let info = client.read_user("ops").expect("read should succeed");
    assert_eq!(info.authentication_type.as_deref(), Some("EXTERNAL"));
}

#[test]
fn cascade_drop_removes_a_user_holding_grants() {
    let mut client = seeded_client();
    client
        .grant_object_privileges("testuser", Some("system"), "test_table", &["SELECT"], GrantsMode::Append)
        .expect("grant should succeed");
    client
        .grant_roles("testuser", &["test_role"], GrantsMode::Append)
        .expect("role grant should succeed");
    client
        .execute_sql("CREATE TABLE TESTUSER.NOTES (ID NUMBER)")
        .expect("owned object should be created");

    client.drop_user("testuser").expect("drop should succeed");

    assert!(!client.user_exists("testuser").expect("exists query"));
    assert!(client
        .current_privileges("testuser", &test_table())
        .expect("catalog read")
        .is_empty());
}

#[test]
fn reading_absent_principals_is_not_found() {
    let mut client = seeded_client();

    assert!(matches!(
        client.read_user("nobody"),
        Err(Error::NotFound { kind: "user", .. })
    ));
    assert!(matches!(
        client.read_role("nobody"),
        Err(Error::NotFound { kind: "role", .. })
    ));
}

#[test]
fn roles_are_created_read_and_dropped_with_their_grants() {
    let mut client = seeded_client();
    client.create_role("auditor").expect("create should succeed");
    client
        .grant_system_privileges("auditor", &["SELECT ANY DICTIONARY"], GrantsMode::Append)
        .expect("grant to role should succeed");
    client
        .grant_roles("testuser", &["auditor"], GrantsMode::Append)
        .expect("role grant should succeed");

    assert!(client.role_exists("AUDITOR").expect("exists query"));
    assert_eq!(client.read_role("auditor").expect("read").name, "AUDITOR");

    client.drop_role("auditor").expect("drop should succeed");

    assert!(!client.role_exists("auditor").expect("exists query"));
    assert!(client
        .current_privileges("testuser", &Target::Role)
        .expect("catalog read")
        .is_empty());
}

#[test]
fn duplicate_principals_are_rejected_by_the_authority() {
    let mut client = seeded_client();

    let err = client
        .create_role("testuser")
        .expect_err("name already used by a user");

    assert!(err.to_string().contains("ORA-01921"), "{err}");
}

#[test]
fn existence_checks_accept_quoted_and_padded_names() {
    let mut client = seeded_client();

    assert!(client.user_exists(r#""testuser""#).expect("exists query"));
    assert!(client.role_exists(" test_role ").expect("exists query"));
    assert_eq!(client.read_user(r#" "TestUser" "#).expect("read").username, "TESTUSER");
}
