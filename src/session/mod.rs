//! Per-session result sets and callback correlation.
//!
//! A search stores its results under the chat's key; inline buttons carry a
//! [`CallbackToken`] that is resolved back to the stored item when pressed.

pub mod store;
pub mod token;

pub use store::{ResultSet, SessionResultStore};
pub use token::{CallbackAction, CallbackParseError, CallbackToken, Generation};

use thiserror::Error;

/// Why a callback token did not resolve.
///
/// All variants mean the same thing to the user ("invalid selection"); the
/// distinction only matters for logs.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NotFound {
    /// The session has no active result set.
    #[error("No active result set for session")]
    EmptySession,
    /// The index is past the end of the active result set.
    #[error("Index {index} out of range for {len} results")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Size of the active set.
        len: usize,
    },
    /// The token was issued for a result set that has since been replaced.
    #[error("Stale token: issued for generation {token}, active is {active}")]
    StaleToken {
        /// Generation carried by the token.
        token: Generation,
        /// Generation of the active set.
        active: Generation,
    },
}
