//! Shared utilities

pub mod context;
pub mod errors;
pub mod io;
pub mod nimcfg;
pub mod process;
pub mod runlock;

pub use context::GlobalContext;
pub use errors::FetchError;
pub use io::Io;
pub use runlock::RunLock;
