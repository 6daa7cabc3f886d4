//! Command implementations.

pub mod fetch;
pub mod lock;
pub mod sync;
