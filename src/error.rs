//! Error type for the few fallible operations in this crate.
//!
//! Cache operations themselves are infallible; misses are `None`. Errors only
//! arise when turning outside input into cache settings.

extern crate alloc;

use alloc::string::String;

/// Errors returned by this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The text did not name a known eviction policy.
    #[error("unknown eviction policy `{0}`, expected `lru` or `lfu`")]
    UnknownPolicy(String),
}

/// Convenience alias for results carrying [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
