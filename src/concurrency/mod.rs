//! Cooperative cancellation (§5 "Cancellation").

pub mod cancel_token;

pub use cancel_token::CancelToken;
