// tests/vault_tests.rs
mod common;

use common::TestContext;
use vaultkeep::{
    client::IntegrityError,
    core::crypto::hashing::{empty_leaf_hash, hash_blob},
    storage::MerkleTree,
    utils::error::NodeError,
    VaultClient,
};

#[test_log::test(tokio::test)]
async fn test_rats_like_cheese() {
    let ctx = TestContext::new(3).await;
    let mut client = ctx.client();

    let first_root = client.put(0, "ilikerats", b"rats like cheese").await.unwrap();
    assert_eq!(
        client.get(0, "ilikerats").await.unwrap(),
        Some(b"rats like cheese".to_vec())
    );

    // The second put's old-root check is built from the hash of the first blob.
    let first_blob = client.get_blob(0).await.unwrap().unwrap();
    let proof = ctx.app.service().proof(0).unwrap();
    assert_eq!(proof.reconstruct_root(&hash_blob(&first_blob)), first_root);

    let second_root = client.put(0, "cheeselover", b"cheese likes rats").await.unwrap();
    assert_ne!(first_root, second_root);
    assert_eq!(client.trusted_root(), Some(second_root));
    assert_eq!(
        client.get(0, "cheeselover").await.unwrap(),
        Some(b"cheese likes rats".to_vec())
    );

    assert_eq!(client.get(5, "ilikerats").await.unwrap(), None);
    assert_eq!(ctx.app.service().proof(5).unwrap().reconstruct_root(&empty_leaf_hash()), second_root);

    ctx.shutdown().await;
}

#[tokio::test]
async fn test_stale_password_is_authentication_not_integrity() {
    let ctx = TestContext::new(3).await;
    let mut client = ctx.client();

    client.put(1, "first", b"v1").await.unwrap();
    client.put(1, "second", b"v2").await.unwrap();

    assert!(matches!(client.get(1, "first").await, Err(NodeError::Authentication)));
    assert_eq!(client.get(1, "second").await.unwrap(), Some(b"v2".to_vec()));

    ctx.shutdown().await;
}

#[tokio::test]
async fn test_out_of_range_slot_is_rejected_locally() {
    let ctx = TestContext::new(3).await;
    let mut client = ctx.client();

    assert!(matches!(client.put(8, "pw", b"x").await, Err(NodeError::Validation(_))));
    assert!(matches!(client.get(8, "pw").await, Err(NodeError::Validation(_))));
    assert_eq!(ctx.app.service().current_root(), MerkleTree::empty_root(3).unwrap());

    ctx.shutdown().await;
}

#[tokio::test]
async fn test_second_client_detects_foreign_write() {
    let ctx = TestContext::new(3).await;
    let mut alice = ctx.client();
    let mut bob = ctx.client();

    alice.put(2, "alice", b"alice's file").await.unwrap();
    let alice_root = alice.trusted_root().unwrap();

    // Bob's write moves the server root past what Alice trusts.
    bob.put(6, "bob", b"bob's file").await.unwrap();

    let result = alice.put(2, "alice", b"alice's file, v2").await;
    assert!(matches!(
        result,
        Err(NodeError::Integrity(IntegrityError::TrustedRootMismatch))
    ));
    assert_eq!(alice.trusted_root(), Some(alice_root));

    ctx.shutdown().await;
}

#[tokio::test]
async fn test_client_resumes_from_saved_root() {
    let ctx = TestContext::new(4).await;

    let saved = {
        let mut client = ctx.client();
        client.put(9, "pw", b"before restart").await.unwrap()
    };

    let mut client = ctx.client().with_trusted_root(saved).unwrap();
    client.put(9, "pw", b"after restart").await.unwrap();
    assert_eq!(client.get(9, "pw").await.unwrap(), Some(b"after restart".to_vec()));

    ctx.shutdown().await;
}

#[tokio::test]
async fn test_connect_uses_configured_address() {
    let ctx = TestContext::new(2).await;

    let mut client = VaultClient::connect(&ctx.config).await.unwrap();
    assert!(client.transport().is_connected());
    client.put(3, "pw", b"over the wire").await.unwrap();
    assert_eq!(client.trusted_root(), Some(ctx.app.service().current_root()));

    ctx.shutdown().await;
}
