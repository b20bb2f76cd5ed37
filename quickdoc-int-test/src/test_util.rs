use quickdoc::common::ManualClock;
use quickdoc::errors::QuickDocResult;
use quickdoc::{CleanupStrategy, Database};
use std::future::Future;
use std::time::{Duration, Instant};
use std::{env, fs};

/// Runs an async test between `before` and `after`.
///
/// A test returning an error is retried with a fresh context; `after` runs
/// after every attempt. Assertion panics are not retried.
pub async fn run_async_test<B, BF, T, TF, A, AF>(before: B, test: T, after: A)
where
    B: Fn() -> BF,
    BF: Future<Output = QuickDocResult<TestContext>>,
    T: Fn(TestContext) -> TF,
    TF: Future<Output = QuickDocResult<()>>,
    A: Fn(TestContext) -> AF,
    AF: Future<Output = QuickDocResult<()>>,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = match before().await {
            Ok(ctx) => {
                let test_result = test(ctx.clone()).await;
                let after_result = after(ctx).await;
                match (test_result, after_result) {
                    (Ok(_), Ok(_)) => Ok(()),
                    (Err(e), _) => Err(format!("Test failed: {:?}", e)),
                    (Ok(_), Err(e)) => Err(format!("After run failed: {:?}", e)),
                }
            }
            Err(e) => Err(format!("Before run failed: {:?}", e)),
        };

        match result {
            Ok(_) => return,
            Err(e) => {
                if attempt < MAX_RETRIES {
                    eprintln!(
                        "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                        attempt,
                        MAX_RETRIES,
                        start_time.elapsed()
                    );
                    eprintln!("Error: {}", e);
                    eprintln!("Retrying in {}ms...\n", 100 * attempt);
                    tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                }
                last_error = Some(e);
            }
        }
    }

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

/// A database under test plus the handles a test needs to drive it.
#[derive(Clone)]
pub struct TestContext {
    path: Option<String>,
    db: Database,
    clock: ManualClock,
}

impl TestContext {
    pub fn new(path: Option<String>, db: Database, clock: ManualClock) -> Self {
        Self { path, db, clock }
    }

    /// Directory of the store, for persistent backends.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn db(&self) -> Database {
        self.db.clone()
    }

    /// The clock the database reads; advance it to expire records.
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }
}

pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    env::temp_dir()
        .join(format!("quickdoc-{}", id))
        .to_string_lossy()
        .to_string()
}

pub async fn create_test_context() -> QuickDocResult<TestContext> {
    create_test_context_with(CleanupStrategy::OnRead).await
}

#[cfg(not(feature = "memory"))]
pub async fn create_test_context_with(strategy: CleanupStrategy) -> QuickDocResult<TestContext> {
    use quickdoc::errors::{ErrorKind, QuickDocError};
    use quickdoc_fjall_adapter::{FjallConfig, FjallConnector};

    const MAX_ATTEMPTS: u32 = 3;
    let mut last_error: Option<QuickDocError> = None;

    for attempt in 1..=MAX_ATTEMPTS {
        let path = random_path();
        if std::path::Path::new(&path).exists() {
            let _ = fs::remove_dir_all(&path);
        }

        // small caches keep many parallel test keyspaces cheap
        let config = FjallConfig::new();
        config.set_block_cache_capacity(1_024 * 1_024);
        config.set_max_write_buffer_size(8 * 1_024 * 1_024);

        let clock = ManualClock::starting_now();
        match Database::builder()
            .connector(FjallConnector::with_config(config))
            .url(&path)
            .clock(clock.clone())
            .cleanup_strategy(strategy)
            .open()
            .await
        {
            Ok(db) => return Ok(TestContext::new(Some(path), db, clock)),
            Err(e) => {
                let _ = fs::remove_dir_all(&path);
                if attempt < MAX_ATTEMPTS {
                    eprintln!(
                        "Warning: Failed to create test context (attempt {}/{}): {:?}",
                        attempt, MAX_ATTEMPTS, e
                    );
                    tokio::time::sleep(Duration::from_millis(50 * attempt as u64)).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        QuickDocError::new("Failed to create test context", ErrorKind::InternalError)
    }))
}

#[cfg(feature = "memory")]
pub async fn create_test_context_with(strategy: CleanupStrategy) -> QuickDocResult<TestContext> {
    use quickdoc::store::memory::InMemoryConnector;

    let clock = ManualClock::starting_now();
    let db = Database::builder()
        .connector(InMemoryConnector::new())
        .url(&format!("memory://{}", uuid::Uuid::new_v4()))
        .clock(clock.clone())
        .cleanup_strategy(strategy)
        .open()
        .await?;
    Ok(TestContext::new(None, db, clock))
}

pub async fn cleanup(ctx: TestContext) -> QuickDocResult<()> {
    if let Err(e) = ctx.db().close().await {
        eprintln!("Warning: Failed to close database: {:?}", e);
    }

    let Some(path) = ctx.path() else {
        return Ok(());
    };

    let max_retries = 10;
    for retry in 0..max_retries {
        if !std::path::Path::new(path).exists() {
            return Ok(());
        }
        match fs::remove_dir_all(path) {
            Ok(_) => return Ok(()),
            Err(e) if retry < max_retries - 1 => {
                log::debug!("Retrying removal of {}: {}", path, e);
                tokio::time::sleep(Duration::from_millis(50 * (retry + 1) as u64)).await;
            }
            Err(e) => {
                eprintln!("Warning: Failed to remove {}: {}", path, e);
            }
        }
    }
    Ok(())
}

/// Waits up to `timeout_ms` for `check` to hold.
pub fn wait_for<F: Fn() -> bool>(timeout_ms: u64, check: F) {
    awaitility::at_most(Duration::from_millis(timeout_ms)).until(check);
}
