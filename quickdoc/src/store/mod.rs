//! Document backends and their connections.
//!
//! A [Database](crate::Database) never talks to storage directly. It holds a
//! [DocumentBackend], a cloneable handle to one open connection implementing
//! [DocumentBackendProvider], and opens further connections through a
//! [Connector].
//!
//! # Backends
//! - **In-memory**: [memory::InMemoryBackend], opened by [memory::InMemoryConnector]
//! - **Fjall**: `quickdoc-fjall-adapter` for persistent, LSM-based storage
//!
//! # Connection state
//!
//! Every connection carries a [ConnectionMonitor]. Databases refuse data
//! operations unless it reports [ConnectionState::Connected], and subscribers
//! are told about every transition.

mod backend;
mod connection;
mod connector;
mod filter;
pub mod memory;
mod stats;

pub use backend::*;
pub use connection::*;
pub use connector::*;
pub use filter::*;
pub use stats::*;
