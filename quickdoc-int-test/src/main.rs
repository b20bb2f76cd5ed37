use quickdoc::collection::AllOptions;
use quickdoc::common::SortOrder;
use quickdoc::doc;
use quickdoc::errors::QuickDocResult;
use quickdoc_int_test::test_util::{cleanup, create_test_context};
use std::time::Instant;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> QuickDocResult<()> {
    colog::init();

    let ctx = create_test_context().await?;
    let db = ctx.db();
    let count: i64 = 10_000;

    let start = Instant::now();
    for i in 0..count {
        db.set(
            &format!("user{}", i),
            doc! {
                name: (format!("user {}", i)),
                score: (i % 97),
                failed: (i % 10 == 0),
            },
        )
        .await?;
    }
    println!("Inserted {} records in {:?}", count, start.elapsed());

    let start = Instant::now();
    let mut handles = Vec::new();
    for worker in 0..8 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            for i in (worker..count).step_by(8) {
                db.add(&format!("user{}.visits", i), 1).await?;
            }
            QuickDocResult::Ok(())
        }));
    }
    for handle in handles {
        if let Ok(result) = handle.await {
            result?;
        }
    }
    println!("Counted visits from 8 workers in {:?}", start.elapsed());

    let start = Instant::now();
    let failed = db
        .all(
            AllOptions::new()
                .filter(|data, _| {
                    data.as_document()
                        .and_then(|doc| doc.get("failed"))
                        .and_then(|v| v.as_bool().copied())
                        .unwrap_or(false)
                })
                .sort_by("score")
                .sort_order(SortOrder::Descending),
        )
        .await?;
    println!("Found {} failed records in {:?}", failed.len(), start.elapsed());

    let start = Instant::now();
    println!("Counted {} records in {:?}", db.count().await?, start.elapsed());

    cleanup(ctx).await
}
