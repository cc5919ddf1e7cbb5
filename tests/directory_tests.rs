mod support;

use oragrant::directory::Directory;
use oragrant::{Error, GrantsMode};

use support::{held, seeded_client, test_dir};

#[test]
fn create_or_replace_updates_the_path_without_duplicating() {
    let mut client = seeded_client();
    client
        .grant_directory_privileges("testuser", "test_dir", &["READ"], GrantsMode::Append)
        .expect("grant should succeed");

    client
        .create_directory(&Directory::new("test_dir", "/srv/new_dir"))
        .expect("replace should succeed");

    let directory = client.read_directory("TEST_DIR").expect("read should succeed");
    assert_eq!(directory, Directory::new("test_dir", "/srv/new_dir"));
    assert_eq!(client.session().snapshot().directories.len(), 1);
    assert_eq!(held(&mut client, "testuser", &test_dir()), vec!["READ"]);
}

#[test]
fn directory_names_read_back_lower_cased() {
    let mut client = seeded_client();

    client
        .create_directory(&Directory::new("Data-Dir", "/data"))
        .expect("create should succeed");

    assert!(client.directory_exists("data-dir").expect("exists query"));
    assert_eq!(client.read_directory("data-dir").expect("read").name, "data-dir");
}

#[test]
fn dropping_a_directory_removes_it_and_its_grants() {
    let mut client = seeded_client();
    client
        .grant_directory_privileges("testuser", "test_dir", &["READ", "WRITE"], GrantsMode::Append)
        .expect("grant should succeed");

    client.drop_directory("test_dir").expect("drop should succeed");

    assert!(!client.directory_exists("test_dir").expect("exists query"));
    assert!(matches!(
        client.read_directory("test_dir"),
        Err(Error::NotFound { kind: "directory", .. })
    ));
    assert!(held(&mut client, "testuser", &test_dir()).is_empty());
}

#[test]
fn raw_sql_is_executed_verbatim() {
    let mut client = seeded_client();

    client
        .execute_sql("CREATE OR REPLACE DIRECTORY RAW_DIR AS '/raw'")
        .expect("raw statement should succeed");

    assert_eq!(
        client.session().executed().last().map(String::as_str),
        Some("CREATE OR REPLACE DIRECTORY RAW_DIR AS '/raw'")
    );
    assert!(client.directory_exists("raw_dir").expect("exists query"));
}

#[test]
fn quoted_directory_names_read_the_same_entry() {
    let mut client = seeded_client();

    assert!(client.directory_exists(r#""test_dir""#).expect("exists query"));
    assert_eq!(client.read_directory(" test_dir ").expect("read").path, "/tmp/test_dir");
}
