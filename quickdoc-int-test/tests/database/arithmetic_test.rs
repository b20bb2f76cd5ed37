use quickdoc::common::Value;
use quickdoc::doc;
use quickdoc::errors::{ErrorKind, QuickDocResult};
use quickdoc_int_test::test_util::{cleanup, create_test_context, run_async_test, TestContext};

#[tokio::test]
async fn test_add_and_subtract() {
    run_async_test(create_test_context, add_and_subtract, cleanup).await
}

async fn add_and_subtract(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    assert_eq!(db.add("n", 5).await?, Value::I64(5));
    assert_eq!(db.subtract("n", 2).await?, Value::I64(3));
    assert_eq!(db.subtract("n", 10).await?, Value::I64(-7));

    let err = db.add("n", "x").await.unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::TypeMismatch);
    assert_eq!(db.get("n").await?, Some(Value::I64(-7)));
    Ok(())
}

#[tokio::test]
async fn test_nested_counters() {
    run_async_test(create_test_context, nested_counters, cleanup).await
}

async fn nested_counters(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    db.set("stats.name", "page").await?;

    let master = db.add("stats.views", 1).await?;
    assert_eq!(master, Value::Document(doc! { name: "page", views: 1 }));

    db.add("stats.views", 1).await?;
    assert_eq!(db.get("stats.views").await?, Some(Value::I64(2)));

    db.set("stats.nothing", Value::Null).await?;
    db.subtract("stats.nothing", 4).await?;
    assert_eq!(db.get("stats.nothing").await?, Some(Value::I64(-4)));
    Ok(())
}

#[tokio::test]
async fn test_decimal_arithmetic() {
    run_async_test(create_test_context, decimal_arithmetic, cleanup).await
}

async fn decimal_arithmetic(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set("price", 10).await?;
    assert_eq!(db.add("price", 0.5).await?, Value::F64(10.5));
    assert_eq!(db.subtract("price", 0.25).await?, Value::F64(10.25));
    Ok(())
}

#[tokio::test]
async fn test_type_mismatch() {
    run_async_test(create_test_context, type_mismatch, cleanup).await
}

async fn type_mismatch(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set("name", "Ada").await?;
    let err = db.add("name", 1).await.unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::TypeMismatch);
    assert_eq!(db.get("name").await?, Some(Value::from("Ada")));

    db.set("flags", vec![true]).await?;
    let err = db.subtract("flags", 1).await.unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::TypeMismatch);

    let err = db.add("fresh", Value::Null).await.unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::TypeMismatch);
    assert_eq!(db.get("fresh").await?, None);
    Ok(())
}

#[tokio::test]
async fn test_overflow() {
    run_async_test(create_test_context, overflow, cleanup).await
}

async fn overflow(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();

    db.set("big", i64::MAX).await?;
    let err = db.add("big", 1).await.unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::TypeMismatch);
    assert_eq!(db.get("big").await?, Some(Value::I64(i64::MAX)));
    Ok(())
}
