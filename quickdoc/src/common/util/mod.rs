mod date_utils;
mod type_utils;

pub use date_utils::*;
pub use type_utils::*;
