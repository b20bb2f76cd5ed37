mod backend;
mod config;
mod connector;

pub use backend::*;
pub use config::*;
pub use connector::*;
