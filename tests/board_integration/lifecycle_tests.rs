//! Service lifecycle tests over the in-memory store.

use super::helpers::{MemoryBoard, memory_board, payload};
use message_board::board::services::BoardError;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn full_lifecycle_round_trip(memory_board: MemoryBoard) -> Result<(), eyre::Report> {
    let created = memory_board.add_message(&payload("Hello", "World")).await?;
    let fetched = memory_board.get_message(created.id()).await?;
    eyre::ensure!(fetched == created, "fetched message differs from created");

    let updated = memory_board
        .update_message(created.id(), &payload("Hello", "again"))
        .await?;
    eyre::ensure!(updated.id() == created.id(), "update changed identifier");
    eyre::ensure!(updated.body() == "again", "update did not change body");
    eyre::ensure!(
        updated.created_at() == created.created_at(),
        "update changed creation time"
    );

    let removed = memory_board.delete_message(created.id()).await?;
    eyre::ensure!(removed == updated, "delete returned a stale record");
    eyre::ensure!(
        memory_board.list_messages().await?.is_empty(),
        "board should be empty after delete"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn extra_payload_keys_are_ignored(memory_board: MemoryBoard) -> Result<(), eyre::Report> {
    let created = memory_board
        .add_message(&json!({
            "title": "t",
            "body": "b",
            "attachmentURL": "https://example.com/a.png",
            "author": "someone",
        }))
        .await?;

    let encoded = serde_json::to_value(&created)?;
    eyre::ensure!(encoded.get("author").is_none(), "unexpected author field");
    eyre::ensure!(
        encoded.get("attachmentURL") == Some(&json!("https://example.com/a.png")),
        "attachment not encoded under attachmentURL"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn non_string_field_is_rejected(memory_board: MemoryBoard) -> Result<(), eyre::Report> {
    let result = memory_board
        .add_message(&json!({ "title": 1, "body": "b", "attachmentURL": "" }))
        .await;

    eyre::ensure!(
        matches!(result, Err(BoardError::InvalidPayload(_))),
        "expected InvalidPayload, got {result:?}"
    );
    eyre::ensure!(
        memory_board.list_messages().await?.is_empty(),
        "rejected payload was stored"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn not_found_message_names_the_identifier(
    memory_board: MemoryBoard,
) -> Result<(), eyre::Report> {
    let Err(err) = memory_board.get_message(&"missing".into()).await else {
        eyre::bail!("expected lookup of unknown id to fail");
    };
    eyre::ensure!(
        err.to_string() == "a message with id=missing not found",
        "unexpected error text: {err}"
    );
    Ok(())
}
