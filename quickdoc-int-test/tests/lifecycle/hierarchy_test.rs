use quickdoc::common::Value;
use quickdoc::errors::{ErrorKind, QuickDocResult};
use quickdoc::store::ConnectionState;
use quickdoc_int_test::test_util::{cleanup, create_test_context, run_async_test, TestContext};

#[tokio::test]
async fn test_shared_child() {
    run_async_test(create_test_context, shared_child, cleanup).await
}

async fn shared_child(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    let child = db.instantiate_child(None, None).await?;

    assert_eq!(child.collection_name(), "JSON_CHILD");
    assert!(child.is_child());
    assert!(!child.owns_connection());
    assert_eq!(child.url(), db.url());
    assert!(child.parent().is_some());
    assert!(!db.is_child());

    db.set("k", "parent").await?;
    child.set("k", "child").await?;
    assert_eq!(db.get("k").await?, Some(Value::from("parent")));
    assert_eq!(child.get("k").await?, Some(Value::from("child")));

    child.delete_all().await?;
    assert_eq!(child.count().await?, 0);
    assert_eq!(db.count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_named_children_are_isolated() {
    run_async_test(create_test_context, named_children_are_isolated, cleanup).await
}

async fn named_children_are_isolated(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    let users = db.instantiate_child(Some("users"), None).await?;
    let orders = db.instantiate_child(Some("orders"), None).await?;

    users.set("u1.name", "Ada").await?;
    orders.push("u1", "order-1").await?;

    assert_eq!(users.get("u1.name").await?, Some(Value::from("Ada")));
    assert_eq!(orders.get("u1.name").await?, None);
    assert_eq!(db.get("u1").await?, None);

    // a second handle on the same collection sees the same records
    let users_again = db.instantiate_child(Some("users"), None).await?;
    assert_eq!(users_again.get("u1.name").await?, Some(Value::from("Ada")));
    Ok(())
}

#[tokio::test]
async fn test_closing_shared_child_keeps_connection() {
    run_async_test(create_test_context, closing_shared_child_keeps_connection, cleanup).await
}

async fn closing_shared_child_keeps_connection(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    let child = db.instantiate_child(Some("cache"), None).await?;
    child.set("k", 1).await?;

    child.close().await?;
    assert!(child.is_closed());
    assert_eq!(child.get("k").await.unwrap_err().kind(), &ErrorKind::NotReady);

    assert_eq!(db.connection_state(), ConnectionState::Connected);
    db.set("still", "open").await?;

    let reopened = db.instantiate_child(Some("cache"), None).await?;
    assert_eq!(reopened.get("k").await?, Some(Value::I64(1)));
    Ok(())
}

#[tokio::test]
async fn test_closing_parent_stops_shared_children() {
    run_async_test(create_test_context, closing_parent_stops_shared_children, cleanup).await
}

async fn closing_parent_stops_shared_children(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    let child = db.instantiate_child(None, None).await?;

    db.close().await?;
    assert_eq!(child.connection_state(), ConnectionState::Disconnected);
    assert_eq!(child.set("k", 1).await.unwrap_err().kind(), &ErrorKind::NotReady);
    assert_eq!(
        db.instantiate_child(None, None).await.unwrap_err().kind(),
        &ErrorKind::NotReady
    );
    Ok(())
}

#[tokio::test]
async fn test_child_with_own_connection() {
    run_async_test(create_test_context, child_with_own_connection, cleanup).await
}

async fn child_with_own_connection(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    db.set("greeting", "hello").await?;

    let url = db.url().to_string();
    let child = db.instantiate_child(None, Some(&url)).await?;
    assert_eq!(child.collection_name(), "JSON");
    assert!(child.owns_connection());
    assert!(child.is_child());

    // same url and collection, so the parent's records are visible
    assert_eq!(child.get("greeting").await?, Some(Value::from("hello")));
    child.set("reply", "hi").await?;
    assert_eq!(db.get("reply").await?, Some(Value::from("hi")));

    child.close().await?;
    assert_eq!(child.connection_state(), ConnectionState::Disconnected);
    assert_eq!(db.connection_state(), ConnectionState::Connected);
    assert_eq!(db.get("reply").await?, Some(Value::from("hi")));
    Ok(())
}

#[tokio::test]
async fn test_grandchildren() {
    run_async_test(create_test_context, grandchildren, cleanup).await
}

async fn grandchildren(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    let child = db.instantiate_child(Some("level1"), None).await?;
    let grandchild = child.instantiate_child(Some("level2"), None).await?;

    grandchild.set("depth", 2).await?;
    assert_eq!(grandchild.get("depth").await?, Some(Value::I64(2)));
    assert_eq!(child.get("depth").await?, None);

    let parent = grandchild.parent().map(|parent| parent.collection_name().to_string());
    assert_eq!(parent.as_deref(), Some("level1"));
    Ok(())
}

#[tokio::test]
async fn test_invalid_child_collection() {
    run_async_test(create_test_context, invalid_child_collection, cleanup).await
}

async fn invalid_child_collection(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    let err = db.instantiate_child(Some(""), None).await.unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    Ok(())
}
