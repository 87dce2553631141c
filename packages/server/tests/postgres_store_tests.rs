//! Postgres store tests. Need Docker: `cargo test -- --ignored`.

mod common;

use chrono::{Duration, Utc};
use test_context::test_context;

use auth_core::domains::auth::actions::{request_passcode, verify_passcode, who_am_i};
use auth_core::domains::auth::{AuthError, PasscodeRequestInput};
use auth_core::kernel::test_dependencies::TestDeps;
use auth_core::kernel::{BaseIdentityStore, BasePasscodeStore};

use crate::common::TestHarness;

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn upsert_keeps_first_identity(ctx: &TestHarness) {
    let email = TestHarness::unique_email("ana");

    let first = ctx
        .store
        .upsert_if_absent(Some("Ana"), &email, Some("+4915112345678"))
        .await
        .unwrap();
    let second = ctx
        .store
        .upsert_if_absent(Some("Someone Else"), &email, None)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.name.as_deref(), Some("Ana"));
    assert_eq!(second.phone.as_deref(), Some("+4915112345678"));

    let by_id = ctx.store.find_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(by_id, first);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn unknown_identity_is_none(ctx: &TestHarness) {
    let email = TestHarness::unique_email("ghost");
    assert!(ctx.store.find_by_email(&email).await.unwrap().is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn latest_active_is_newest_unconsumed(ctx: &TestHarness) {
    let email = TestHarness::unique_email("ana");
    let expires_at = Utc::now() + Duration::minutes(5);

    let older = ctx.store.insert(&email, "hash-1", expires_at).await.unwrap();
    let newer = ctx.store.insert(&email, "hash-2", expires_at).await.unwrap();
    assert!(newer.id.into_inner() > older.id.into_inner());
    assert!(!newer.consumed);
    assert_eq!(newer.attempts, 0);

    let latest = ctx.store.find_latest_active(&email).await.unwrap().unwrap();
    assert_eq!(latest.id, newer.id);
    assert_eq!(latest.code_hash, "hash-2");

    assert!(ctx.store.mark_consumed(newer.id).await.unwrap());
    let latest = ctx.store.find_latest_active(&email).await.unwrap().unwrap();
    assert_eq!(latest.id, older.id);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn mark_consumed_swaps_once(ctx: &TestHarness) {
    let email = TestHarness::unique_email("ana");
    let row = ctx
        .store
        .insert(&email, "hash", Utc::now() + Duration::minutes(5))
        .await
        .unwrap();

    assert!(ctx.store.mark_consumed(row.id).await.unwrap());
    assert!(!ctx.store.mark_consumed(row.id).await.unwrap());
    assert!(ctx.store.find_latest_active(&email).await.unwrap().is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn concurrent_mark_consumed_has_one_winner(ctx: &TestHarness) {
    let email = TestHarness::unique_email("ana");
    let row = ctx
        .store
        .insert(&email, "hash", Utc::now() + Duration::minutes(5))
        .await
        .unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let store = ctx.store.clone();
            tokio::spawn(async move { store.mark_consumed(row.id).await.unwrap() })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn attempts_stop_at_limit(ctx: &TestHarness) {
    let email = TestHarness::unique_email("ana");
    let row = ctx
        .store
        .insert(&email, "hash", Utc::now() + Duration::minutes(5))
        .await
        .unwrap();

    assert_eq!(ctx.store.reserve_attempt(row.id, 2).await.unwrap(), Some(1));
    assert_eq!(ctx.store.reserve_attempt(row.id, 2).await.unwrap(), Some(2));
    assert_eq!(ctx.store.reserve_attempt(row.id, 2).await.unwrap(), None);

    let latest = ctx.store.find_latest_active(&email).await.unwrap().unwrap();
    assert_eq!(latest.attempts, 2);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn concurrent_reservations_respect_limit(ctx: &TestHarness) {
    let email = TestHarness::unique_email("ana");
    let row = ctx
        .store
        .insert(&email, "hash", Utc::now() + Duration::minutes(5))
        .await
        .unwrap();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let store = ctx.store.clone();
            tokio::spawn(async move { store.reserve_attempt(row.id, 5).await.unwrap() })
        })
        .collect();

    let mut reserved = 0;
    for handle in handles {
        if handle.await.unwrap().is_some() {
            reserved += 1;
        }
    }
    assert_eq!(reserved, 5);

    let latest = ctx.store.find_latest_active(&email).await.unwrap().unwrap();
    assert_eq!(latest.attempts, 5);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn ping_answers(ctx: &TestHarness) {
    ctx.store.ping().await.unwrap();
    assert_eq!(ctx.store.backend(), "postgres");
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn login_flow_against_postgres(ctx: &TestHarness) {
    let mut t = TestDeps::new();
    let deps = ctx.deps_with(&t.deps);
    let email = TestHarness::unique_email("Ana");

    request_passcode(
        PasscodeRequestInput {
            name: Some("Ana".to_string()),
            email: email.to_uppercase(),
            phone: None,
        },
        &deps,
    )
    .await
    .unwrap();
    let code = t.inbox.next_code().await;

    let session = verify_passcode(&email, &code, &deps).await.unwrap();
    assert_eq!(session.identity.email, email.to_lowercase());

    let again = verify_passcode(&email, &code, &deps).await;
    assert!(matches!(again, Err(AuthError::InvalidCode)));

    let identity = who_am_i(&session.token, &deps).await.unwrap();
    assert_eq!(identity.id, session.identity.id);
}
