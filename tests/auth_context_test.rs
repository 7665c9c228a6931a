mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeIdentity, school};
use portal::auth::AuthContext;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn starts_signed_out_then_follows_sign_in() {
    let identity = FakeIdentity::signed_out();
    let ctx = Arc::new(AuthContext::new(identity.clone(), school()));
    assert!(ctx.snapshot().loading);

    let shutdown = CancellationToken::new();
    let task = ctx.spawn(shutdown.clone());

    let initial = timeout(Duration::from_secs(1), ctx.loaded()).await.unwrap();
    assert!(initial.user.is_none());
    assert!(initial.profile.is_none());

    let mut rx = ctx.subscribe();
    identity.set_user(Some("stu-2"));
    let snapshot = timeout(
        Duration::from_secs(1),
        rx.wait_for(|s| s.profile.is_some()),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert_eq!(snapshot.user.unwrap().uid, "stu-2");
    assert_eq!(snapshot.profile.unwrap().id, "p3");

    identity.set_user(None);
    timeout(Duration::from_secs(1), rx.wait_for(|s| s.user.is_none()))
        .await
        .unwrap()
        .unwrap();
    assert!(ctx.snapshot().profile.is_none());

    shutdown.cancel();
    timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
}

#[tokio::test]
async fn missing_profile_leaves_user_without_profile() {
    let identity = FakeIdentity::signed_in("ghost");
    let ctx = Arc::new(AuthContext::new(identity, school()));
    let shutdown = CancellationToken::new();
    ctx.spawn(shutdown.clone());

    let snapshot = timeout(Duration::from_secs(1), ctx.loaded()).await.unwrap();
    assert_eq!(snapshot.user.unwrap().uid, "ghost");
    assert!(snapshot.profile.is_none());
    shutdown.cancel();
}

#[tokio::test]
async fn backend_failure_does_not_block_loading() {
    let backend = school();
    backend.fail_with("down");
    let ctx = Arc::new(AuthContext::new(FakeIdentity::signed_in("stu-1"), backend));
    let shutdown = CancellationToken::new();
    ctx.spawn(shutdown.clone());

    let snapshot = timeout(Duration::from_secs(1), ctx.loaded()).await.unwrap();
    assert!(!snapshot.loading);
    assert!(snapshot.user.is_some());
    assert!(snapshot.profile.is_none());
    shutdown.cancel();
}
