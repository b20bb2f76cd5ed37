use quickdoc::common::Value;
use quickdoc::doc;
use quickdoc::errors::{ErrorKind, QuickDocResult};
use quickdoc_int_test::test_util::{cleanup, create_test_context, run_async_test, TestContext};

#[tokio::test]
async fn test_set_then_get() {
    run_async_test(create_test_context, set_then_get, cleanup).await
}

async fn set_then_get(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    let stored = db.set("name", "Ada").await?;
    assert_eq!(stored, Value::from("Ada"));
    assert_eq!(db.get("name").await?, Some(Value::from("Ada")));
    assert_eq!(db.fetch("name").await?, Some(Value::from("Ada")));

    db.set("name", 42).await?;
    assert_eq!(db.get("name").await?, Some(Value::I64(42)));

    assert_eq!(db.get("missing").await?, None);
    assert!(!db.has("missing").await?);
    Ok(())
}

#[tokio::test]
async fn test_dotted_keys() {
    run_async_test(create_test_context, dotted_keys, cleanup).await
}

async fn dotted_keys(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    let master = db.set("a.b", 1).await?;
    assert_eq!(master, Value::Document(doc! { b: 1 }));
    assert_eq!(db.get("a").await?, Some(Value::Document(doc! { b: 1 })));
    assert_eq!(db.get("a.b").await?, Some(Value::I64(1)));

    db.set("a.c.d", "deep").await?;
    assert_eq!(
        db.get("a").await?,
        Some(Value::Document(doc! { b: 1, c: { d: "deep" } }))
    );
    assert_eq!(db.get("a.c.missing").await?, None);
    assert_eq!(db.get("a.b.c").await?, None);

    // a scalar in the way is replaced by a document
    db.set("a.b.x", true).await?;
    assert_eq!(db.get("a.b").await?, Some(Value::Document(doc! { x: true })));
    Ok(())
}

#[tokio::test]
async fn test_values_round_trip_unchanged() {
    run_async_test(create_test_context, values_round_trip_unchanged, cleanup).await
}

async fn values_round_trip_unchanged(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    let profile = doc! {
        name: "Grace",
        age: 85,
        ratio: 0.25,
        admin: false,
        tags: ["navy", "cobol"],
        address: { city: "Arlington", zip: "22201" },
        nickname: (Value::Null)
    };

    db.set("profile", profile.clone()).await?;
    assert_eq!(db.get("profile").await?, Some(Value::Document(profile)));
    assert_eq!(db.get("profile.age").await?, Some(Value::I64(85)));
    assert_eq!(db.get("profile.ratio").await?, Some(Value::F64(0.25)));
    assert_eq!(db.get("profile.tags.1").await?, Some(Value::from("cobol")));
    assert_eq!(db.get("profile.nickname").await?, Some(Value::Null));
    Ok(())
}

#[tokio::test]
async fn test_has() {
    run_async_test(create_test_context, has, cleanup).await
}

async fn has(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set("user.name", "Ada").await?;
    db.set("user.nickname", Value::Null).await?;
    db.set("flag", false).await?;
    db.set("zero", 0).await?;

    assert!(db.has("user").await?);
    assert!(db.has("user.name").await?);
    assert!(!db.has("user.nickname").await?);
    assert!(!db.has("user.email").await?);
    assert!(db.has("flag").await?);
    assert!(db.has("zero").await?);
    Ok(())
}

#[tokio::test]
async fn test_delete() {
    run_async_test(create_test_context, delete, cleanup).await
}

async fn delete(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set("user", doc! { name: "Ada", email: "ada@example.com" }).await?;

    assert!(db.delete("user.email").await?);
    assert!(!db.delete("user.email").await?);
    assert_eq!(db.get("user").await?, Some(Value::Document(doc! { name: "Ada" })));

    // the emptied master stays behind
    assert!(db.delete("user.name").await?);
    assert_eq!(db.get("user").await?, Some(Value::Document(doc! {})));
    assert_eq!(db.count().await?, 1);

    assert!(db.delete("user").await?);
    assert!(!db.delete("user").await?);
    assert_eq!(db.get("user").await?, None);
    assert!(!db.delete("ghost.field").await?);
    Ok(())
}

#[tokio::test]
async fn test_delete_all_and_count() {
    run_async_test(create_test_context, delete_all_and_count, cleanup).await
}

async fn delete_all_and_count(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    for i in 0..5 {
        db.set(&format!("key{}", i), i).await?;
    }
    assert_eq!(db.count().await?, 5);

    assert!(db.delete_all().await?);
    assert!(db.delete_all().await?);
    assert_eq!(db.count().await?, 0);
    assert_eq!(db.get("key1").await?, None);
    Ok(())
}

#[tokio::test]
async fn test_invalid_keys() {
    run_async_test(create_test_context, invalid_keys, cleanup).await
}

async fn invalid_keys(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    for key in ["", ".a", "a..b", "a."] {
        let err = db.set(key, 1).await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidKey, "key {:?}", key);

        let err = db.get(key).await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidKey, "key {:?}", key);
    }
    assert_eq!(db.count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_stats_ping_and_metadata() {
    run_async_test(create_test_context, stats_ping_and_metadata, cleanup).await
}

async fn stats_ping_and_metadata(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    db.set("a", 1).await?;
    db.set("b", 2).await?;

    let stats = db.stats().await?;
    assert_eq!(stats.collection, "JSON");
    assert_eq!(stats.record_count, 2);

    db.ping().await?;

    let metadata = db.metadata();
    assert_eq!(metadata.collection_name, "JSON");
    assert!(!metadata.is_child);
    assert!(metadata.owns_connection);

    let info = metadata.get_info();
    assert_eq!(info.get("collection_name"), Some(&Value::from("JSON")));
    Ok(())
}
