#![forbid(unsafe_code)]

mod assemble;
mod types;

pub use assemble::*;
pub use types::*;

#[cfg(test)]
mod tests;
