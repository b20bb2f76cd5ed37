//! Records and the values they carry.
//!
//! A collection is a set of [Record]s identified by master key. Each record
//! holds a [Value] payload, and the payload's nested [Document]s are what a
//! dotted key addresses.
//!
//! ```rust,ignore
//! use quickdoc::doc;
//!
//! db.set("profile", doc!{ name: "Alice", address: { city: "Oslo" } }).await?;
//! let city = db.get("profile.address.city").await?;
//! ```

mod all_options;
mod document;
mod record;

pub use all_options::*;
pub use document::*;
pub use record::*;
