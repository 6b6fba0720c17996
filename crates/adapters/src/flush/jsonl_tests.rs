// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn path_uses_namespace_when_present() {
    let flush = JsonlFlush::new("/out");
    assert_eq!(
        flush.path_for(&StreamIdentity::namespaced("public", "users")),
        PathBuf::from("/out/public.users.jsonl")
    );
    assert_eq!(
        flush.path_for(&StreamIdentity::named("users")),
        PathBuf::from("/out/users.jsonl")
    );
    assert_eq!(
        flush.path_for(&StreamIdentity::named("a/b")),
        PathBuf::from("/out/a%2Fb.jsonl")
    );
}

#[test]
fn dotted_names_do_not_share_a_file() {
    let flush = JsonlFlush::new("/out");
    let left = flush.path_for(&StreamIdentity::namespaced("a.b", "c"));
    let right = flush.path_for(&StreamIdentity::namespaced("a", "b.c"));
    let bare = flush.path_for(&StreamIdentity::named("a.b.c"));

    assert_eq!(left, PathBuf::from("/out/a%2Eb.c.jsonl"));
    assert_eq!(right, PathBuf::from("/out/a.b%2Ec.jsonl"));
    assert_eq!(bare, PathBuf::from("/out/a%2Eb%2Ec.jsonl"));
    assert_ne!(
        flush.path_for(&StreamIdentity::named("50%2E")),
        flush.path_for(&StreamIdentity::named("50."))
    );
}

#[test]
fn threshold_is_at_least_the_default_floor() {
    let small = JsonlFlush::new("/out").with_optimal_batch_size(1024);
    assert_eq!(
        small.queue_flush_threshold_bytes(),
        crate::flush::DEFAULT_QUEUE_FLUSH_THRESHOLD_BYTES
    );

    let large = JsonlFlush::new("/out");
    assert_eq!(
        large.queue_flush_threshold_bytes(),
        DEFAULT_OPTIMAL_BATCH_SIZE_BYTES
    );
}

#[tokio::test]
async fn appends_records_as_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let flush = JsonlFlush::new(dir.path().join("out"));
    let users = StreamIdentity::named("users");

    flush
        .flush(
            &users,
            vec![
                RecordMessage::new(users.clone(), 1, r#"{"id":1}"#),
                RecordMessage::new(users.clone(), 2, r#"{"id":2}"#),
            ],
        )
        .await
        .unwrap();
    flush
        .flush(&users, vec![RecordMessage::new(users.clone(), 3, "null")])
        .await
        .unwrap();

    let content = std::fs::read_to_string(flush.path_for(&users)).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["data"]["id"], 1);
    assert_eq!(lines[1]["emitted_at"], 2);
    assert!(lines[2]["data"].is_null());
}

#[tokio::test]
async fn unwritable_directory_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "").unwrap();
    let flush = JsonlFlush::new(blocker.join("out"));
    let users = StreamIdentity::named("users");

    let err = flush.flush(&users, vec![]).await.unwrap_err();
    assert!(matches!(err, FlushError::Io { .. }));
}
