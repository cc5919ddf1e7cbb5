#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use oragrant::{Client, MemoryAuthority, Session, Target};

pub(crate) fn fixture_dir(fixture: &str) -> PathBuf {
    PathBuf::from("tests/fixtures").join(fixture)
}

pub(crate) fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}_{nanos}"));
    std::fs::create_dir_all(&dir).expect("should create temp dir");
    dir
}

/// An authority holding user `TESTUSER`, role `TEST_ROLE`, table
/// `SYSTEM.TEST_TABLE` and directory `TEST_DIR`.
pub(crate) fn seeded_client() -> Client<MemoryAuthority> {
    let mut authority = MemoryAuthority::new();
    for sql in [
        r#"CREATE USER TESTUSER IDENTIFIED BY "testpassword""#,
        "CREATE ROLE TEST_ROLE",
        "CREATE TABLE SYSTEM.TEST_TABLE (ID NUMBER)",
        "CREATE OR REPLACE DIRECTORY TEST_DIR AS '/tmp/test_dir'",
    ] {
        authority
            .execute(sql)
            .unwrap_or_else(|e| panic!("seed statement `{sql}` failed: {e}"));
    }
    Client::new(authority)
}

/// Held privileges of `principal` on `target`, rendered with their options.
pub(crate) fn held(
    client: &mut Client<MemoryAuthority>,
    principal: &str,
    target: &Target,
) -> Vec<String> {
    client
        .current_privileges(principal, target)
        .expect("catalog read should succeed")
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Statements executed after the seed, in order.
pub(crate) fn executed_since(client: &Client<MemoryAuthority>, seed: usize) -> Vec<String> {
    client.session().executed()[seed..].to_vec()
}

pub(crate) fn test_table() -> Target {
    Target::Object {
        owner: Some("system".to_string()),
        object: "test_table".to_string(),
    }
}

pub(crate) fn test_dir() -> Target {
    Target::Directory {
        directory: "test_dir".to_string(),
    }
}
