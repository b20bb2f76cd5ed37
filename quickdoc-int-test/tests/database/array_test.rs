use quickdoc::common::Value;
use quickdoc::doc;
use quickdoc::errors::QuickDocResult;
use quickdoc_int_test::test_util::{cleanup, create_test_context, run_async_test, TestContext};

fn strings(values: &[&str]) -> Value {
    Value::from_vec(values.to_vec())
}

#[tokio::test]
async fn test_push_and_pull() {
    run_async_test(create_test_context, push_and_pull, cleanup).await
}

async fn push_and_pull(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    assert_eq!(db.push("list", "a").await?, strings(&["a"]));
    assert_eq!(db.push("list", "b").await?, strings(&["a", "b"]));
    assert_eq!(db.pull("list", "a", false).await?, Some(strings(&["b"])));
    assert_eq!(db.get("list").await?, Some(strings(&["b"])));
    Ok(())
}

#[tokio::test]
async fn test_push_into_nested_field() {
    run_async_test(create_test_context, push_into_nested_field, cleanup).await
}

async fn push_into_nested_field(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    db.set("user.name", "Ada").await?;

    let master = db.push("user.tags", "admin").await?;
    assert_eq!(master, Value::Document(doc! { name: "Ada", tags: ["admin"] }));

    // an array argument is appended element by element
    db.push("user.tags", vec!["ops", "dev"]).await?;
    assert_eq!(
        db.get("user.tags").await?,
        Some(strings(&["admin", "ops", "dev"]))
    );
    Ok(())
}

#[tokio::test]
async fn test_push_wraps_scalars() {
    run_async_test(create_test_context, push_wraps_scalars, cleanup).await
}

async fn push_wraps_scalars(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set("single", "first").await?;
    assert_eq!(db.push("single", "second").await?, strings(&["first", "second"]));

    db.set("nothing", Value::Null).await?;
    assert_eq!(db.push("nothing", 1).await?, Value::from_vec(vec![1]));
    Ok(())
}

#[tokio::test]
async fn test_pull_first_or_every_match() {
    run_async_test(create_test_context, pull_first_or_every_match, cleanup).await
}

async fn pull_first_or_every_match(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set("list", vec!["a", "b", "a", "c", "a"]).await?;
    assert_eq!(
        db.pull("list", "a", false).await?,
        Some(strings(&["b", "a", "c", "a"]))
    );
    assert_eq!(db.pull("list", "a", true).await?, Some(strings(&["b", "c"])));

    db.set("list", vec!["a", "b", "c", "b"]).await?;
    assert_eq!(
        db.pull("list", vec!["b", "c"], false).await?,
        Some(strings(&["a", "b"]))
    );

    // nothing matches, the array is written back untouched
    assert_eq!(db.pull("list", "z", true).await?, Some(strings(&["a", "b"])));
    Ok(())
}

#[tokio::test]
async fn test_pull_without_array() {
    run_async_test(create_test_context, pull_without_array, cleanup).await
}

async fn pull_without_array(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    assert_eq!(db.pull("absent", "a", false).await?, None);

    db.set("scalar", "a").await?;
    assert_eq!(db.pull("scalar", "a", false).await?, None);
    assert_eq!(db.get("scalar").await?, Some(Value::from("a")));

    db.set("user.name", "Ada").await?;
    assert_eq!(db.pull("user.tags", "a", false).await?, None);
    Ok(())
}

#[tokio::test]
async fn test_array_operations_keep_expiration() {
    run_async_test(create_test_context, array_operations_keep_expiration, cleanup).await
}

async fn array_operations_keep_expiration(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set_with_ttl("queue", vec!["a"], 60).await?;
    db.push("queue", "b").await?;
    db.pull("queue", "a", false).await?;
    assert!(db.ttl("queue").await?.is_some());

    ctx.clock().advance_secs(61);
    assert_eq!(db.get("queue").await?, None);
    Ok(())
}
