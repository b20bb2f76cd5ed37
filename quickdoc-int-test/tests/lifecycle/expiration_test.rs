use quickdoc::collection::AllOptions;
use quickdoc::common::Value;
use quickdoc::errors::QuickDocResult;
use quickdoc::CleanupStrategy;
use quickdoc_int_test::test_util::{
    cleanup, create_test_context, create_test_context_with, run_async_test, TestContext,
};
use std::time::Duration;

async fn manual_context() -> QuickDocResult<TestContext> {
    create_test_context_with(CleanupStrategy::Manual).await
}

async fn disabled_context() -> QuickDocResult<TestContext> {
    create_test_context_with(CleanupStrategy::Disabled).await
}

#[tokio::test]
async fn test_expired_values_disappear() {
    run_async_test(create_test_context, expired_values_disappear, cleanup).await
}

async fn expired_values_disappear(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set_with_ttl("session", "token", 1).await?;
    assert_eq!(db.get("session").await?, Some(Value::from("token")));
    assert!(db.has("session").await?);

    ctx.clock().advance_millis(1_001);
    assert_eq!(db.get("session").await?, None);
    assert!(!db.has("session").await?);
    assert_eq!(db.count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_expiry_is_inclusive() {
    run_async_test(create_test_context, expiry_is_inclusive, cleanup).await
}

async fn expiry_is_inclusive(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set_with_ttl("k", 1, 10).await?;
    ctx.clock().advance_millis(9_999);
    assert!(db.has("k").await?);

    ctx.clock().advance_millis(1);
    assert!(!db.has("k").await?);
    Ok(())
}

#[tokio::test]
async fn test_set_replaces_expired_record() {
    run_async_test(create_test_context, set_replaces_expired_record, cleanup).await
}

async fn set_replaces_expired_record(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set_with_ttl("user.name", "Ada", 5).await?;
    ctx.clock().advance_secs(6);

    // the stale sibling does not leak into the fresh record
    db.set("user.email", "ada@example.com").await?;
    assert_eq!(db.get("user.name").await?, None);
    assert_eq!(db.get("user.email").await?, Some(Value::from("ada@example.com")));
    assert_eq!(db.ttl("user").await?, None);
    Ok(())
}

#[tokio::test]
async fn test_plain_set_clears_ttl() {
    run_async_test(create_test_context, plain_set_clears_ttl, cleanup).await
}

async fn plain_set_clears_ttl(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set_with_ttl("k", 1, 5).await?;
    assert_eq!(db.ttl("k").await?, Some(Duration::from_secs(5)));

    db.set("k", 2).await?;
    assert_eq!(db.ttl("k").await?, None);

    ctx.clock().advance_secs(60);
    assert_eq!(db.get("k").await?, Some(Value::I64(2)));

    db.set_with_ttl("zero", 1, 0).await?;
    db.set_with_ttl("negative", 1, -5).await?;
    assert_eq!(db.ttl("zero").await?, None);
    assert_eq!(db.ttl("negative").await?, None);
    Ok(())
}

#[tokio::test]
async fn test_counters_keep_ttl() {
    run_async_test(create_test_context, counters_keep_ttl, cleanup).await
}

async fn counters_keep_ttl(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set_with_ttl("hits", 0, 30).await?;
    ctx.clock().advance_secs(10);
    db.add("hits", 1).await?;
    assert_eq!(db.ttl("hits").await?, Some(Duration::from_secs(20)));

    ctx.clock().advance_secs(20);
    assert_eq!(db.get("hits").await?, None);

    // after expiry the counter starts over without a TTL
    assert_eq!(db.add("hits", 1).await?, Value::I64(1));
    assert_eq!(db.ttl("hits").await?, None);
    Ok(())
}

#[tokio::test]
async fn test_on_read_purges_backend() {
    run_async_test(create_test_context, on_read_purges_backend, cleanup).await
}

async fn on_read_purges_backend(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set_with_ttl("a", 1, 1).await?;
    db.set_with_ttl("b", 2, 1).await?;
    db.set("c", 3).await?;
    assert_eq!(db.stats().await?.record_count, 3);

    ctx.clock().advance_secs(2);
    assert_eq!(db.get("a").await?, None);
    assert_eq!(db.stats().await?.record_count, 2);

    let entries = db.all(AllOptions::new()).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(db.stats().await?.record_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_delete_expired_record() {
    run_async_test(manual_context, delete_expired_record, cleanup).await
}

async fn delete_expired_record(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set_with_ttl("gone", 1, 1).await?;
    ctx.clock().advance_secs(2);

    // the backend still holds the record, so a whole-key delete reports it
    assert!(db.delete("gone").await?);
    assert!(!db.delete("gone").await?);
    Ok(())
}

#[tokio::test]
async fn test_manual_purge() {
    run_async_test(manual_context, manual_purge, cleanup).await
}

async fn manual_purge(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set_with_ttl("a", 1, 1).await?;
    db.set_with_ttl("b", 2, 100).await?;
    db.set("c", 3).await?;

    ctx.clock().advance_secs(5);
    assert_eq!(db.get("a").await?, None);
    assert_eq!(db.count().await?, 2);
    assert_eq!(db.stats().await?.record_count, 3);

    assert_eq!(db.purge_expired().await?, 1);
    assert_eq!(db.stats().await?.record_count, 2);
    assert_eq!(db.purge_expired().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_disabled_expiration() {
    run_async_test(disabled_context, disabled_expiration, cleanup).await
}

async fn disabled_expiration(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set_with_ttl("k", "kept", 1).await?;
    ctx.clock().advance_secs(3_600);

    assert_eq!(db.get("k").await?, Some(Value::from("kept")));
    assert_eq!(db.count().await?, 1);
    assert_eq!(db.ttl("k").await?, None);
    assert_eq!(db.purge_expired().await?, 0);
    Ok(())
}
