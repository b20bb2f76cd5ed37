use quickdoc::collection::{filter_by, limit_to, order_by, AllOptions};
use quickdoc::common::{SortOrder, Value};
use quickdoc::errors::{ErrorKind, QuickDocResult};
use quickdoc::{doc, Database};
use quickdoc_int_test::test_util::{cleanup, create_test_context, run_async_test, TestContext};

async fn seed_scores(db: &Database) -> QuickDocResult<()> {
    db.set("p1", doc! { name: "one", score: 3 }).await?;
    db.set("p2", doc! { name: "two", score: 1 }).await?;
    db.set("p3", doc! { name: "three", score: 2 }).await?;
    Ok(())
}

fn ids(entries: &[quickdoc::RecordEntry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.id.as_str()).collect()
}

#[tokio::test]
async fn test_sort_and_limit() {
    run_async_test(create_test_context, sort_and_limit, cleanup).await
}

async fn sort_and_limit(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    seed_scores(&db).await?;

    let entries = db.all(order_by("score", SortOrder::Ascending).limit(2)).await?;
    let scores: Vec<Value> = entries
        .iter()
        .filter_map(|entry| entry.data.as_document()?.get("score").cloned())
        .collect();
    assert_eq!(scores, vec![Value::I64(1), Value::I64(2)]);

    let entries = db.all(order_by("score", SortOrder::Descending)).await?;
    assert_eq!(ids(&entries), vec!["p1", "p3", "p2"]);

    let entries = db.all(AllOptions::new().sort_by("score")).await?;
    assert_eq!(ids(&entries), vec!["p2", "p3", "p1"]);
    Ok(())
}

#[tokio::test]
async fn test_all_returns_everything_by_default() {
    run_async_test(create_test_context, all_returns_everything, cleanup).await
}

async fn all_returns_everything(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    assert!(db.all(AllOptions::new()).await?.is_empty());

    seed_scores(&db).await?;
    let entries = db.all(AllOptions::new()).await?;
    assert_eq!(entries.len(), 3);
    assert_eq!(db.all(limit_to(0)).await?.len(), 3);
    assert_eq!(db.all(limit_to(10)).await?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_filter() {
    run_async_test(create_test_context, filter, cleanup).await
}

async fn filter(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    seed_scores(&db).await?;
    db.set("plain", "not a document").await?;

    let entries = db
        .all(filter_by(|data, _| {
            data.as_document()
                .and_then(|doc| doc.get("score"))
                .and_then(Value::as_i64)
                .is_some_and(|score| *score >= 2)
        }))
        .await?;
    assert_eq!(ids(&entries), vec!["p1", "p3"]);

    // indices count visible records in retrieval order
    let entries = db.all(filter_by(|_, index| index % 2 == 0)).await?;
    assert_eq!(entries.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_missing_sort_field_sorts_first() {
    run_async_test(create_test_context, missing_sort_field_sorts_first, cleanup).await
}

async fn missing_sort_field_sorts_first(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    seed_scores(&db).await?;
    db.set("p0", doc! { name: "no score" }).await?;

    let entries = db.all(order_by("score", SortOrder::Ascending)).await?;
    assert_eq!(ids(&entries), vec!["p0", "p2", "p3", "p1"]);
    Ok(())
}

#[tokio::test]
async fn test_sort_ties_keep_retrieval_order() {
    run_async_test(create_test_context, sort_ties_keep_retrieval_order, cleanup).await
}

async fn sort_ties_keep_retrieval_order(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    db.set("a", doc! { rank: 1 }).await?;
    db.set("b", doc! { rank: 0 }).await?;
    db.set("c", doc! { rank: 1 }).await?;
    db.set("d", doc! { rank: 0 }).await?;

    let entries = db.all(order_by("rank", SortOrder::Ascending)).await?;
    assert_eq!(ids(&entries), vec!["b", "d", "a", "c"]);
    Ok(())
}

#[tokio::test]
async fn test_invalid_sort_field() {
    run_async_test(create_test_context, invalid_sort_field, cleanup).await
}

async fn invalid_sort_field(ctx: TestContext) -> QuickDocResult<()> {
    let db = ctx.db();
    seed_scores(&db).await?;

    let err = db.all(AllOptions::new().sort_by("a..b")).await.unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidKey);
    Ok(())
}
