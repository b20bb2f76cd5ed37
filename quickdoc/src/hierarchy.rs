//! Child databases.
//!
//! A child is a [Database] bound to another collection. It either borrows its
//! parent's connection or opens one of its own through the parent's
//! connector, and in both cases holds only a weak reference to the parent.

use crate::common::DEFAULT_COLLECTION;
use crate::database::Database;
use crate::errors::{ErrorKind, QuickDocError, QuickDocResult};

pub(crate) async fn instantiate_child(
    parent: &Database,
    collection_name: Option<&str>,
    url: Option<&str>,
) -> QuickDocResult<Database> {
    if let Some(name) = collection_name {
        if name.trim().is_empty() {
            log::error!("Child collection name cannot be empty");
            return Err(QuickDocError::new(
                "Child collection name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
    }

    let config = parent.config();
    if url.is_some() || !config.share_connection_from_parent() {
        let target = url.unwrap_or_else(|| parent.url());
        let collection = collection_name.unwrap_or(DEFAULT_COLLECTION);
        let backend = parent.connector().connect(target).await?;
        backend.handshake().await?;

        log::debug!(
            "Opened child connection '{}' for collection '{}'",
            target,
            collection
        );
        let child_config = config.derive_child(collection, Some(target));
        return Ok(Database::attach(child_config, backend, true, Some(parent)));
    }

    let default_collection = shared_default_collection(
        config.child_collection_name(),
        parent.collection_name(),
    );
    let collection = collection_name.unwrap_or(&default_collection);
    log::debug!(
        "Sharing connection '{}' with child collection '{}'",
        parent.url(),
        collection
    );
    let child_config = config.derive_child(collection, None);
    Ok(Database::attach(
        child_config,
        parent.backend().clone(),
        false,
        Some(parent),
    ))
}

/// Default collection of a child sharing its parent's connection. It never
/// equals the parent's collection; `_CHILD` is appended until it differs.
fn shared_default_collection(configured: String, parent_collection: &str) -> String {
    let mut collection = configured;
    while collection == parent_collection {
        collection.push_str("_CHILD");
    }
    collection
}
