//! Listener implementations
//!
//! Contains LogListener and FileListener.

mod file;
mod log;

pub use self::file::FileListener;
pub use self::log::LogListener;
