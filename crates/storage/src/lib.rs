#![forbid(unsafe_code)]

mod config;
mod retry;
mod store;

pub use config::*;
pub use retry::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_UNIT, RetryPolicy};
pub use store::*;
