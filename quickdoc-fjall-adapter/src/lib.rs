//! Persistent [quickdoc](quickdoc) backend on top of the fjall LSM-tree.
//!
//! ```rust,ignore
//! use quickdoc::Database;
//! use quickdoc_fjall_adapter::FjallConnector;
//!
//! let db = Database::builder()
//!     .connector(FjallConnector::new())
//!     .url("fjall://./data")
//!     .open()
//!     .await?;
//! db.set("user.name", "Ada").await?;
//! db.close().await?;
//! ```

mod backend;
mod codec;
mod config;
mod connector;
mod version;

pub use backend::FjallBackend;
pub use codec::{RecordCodecError, RecordCodecResult};
pub use config::*;
pub use connector::*;
