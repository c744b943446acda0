//! Shared error-code contract.
//!
//! Every error type in the crate carries a grepable `E_*` code and a
//! retryable flag so the UI shell can surface failures uniformly through
//! [`crate::observer::SyncFailure`].

/// Grepable code + retry hint for a displayable error.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
