#![forbid(unsafe_code)]

mod hierarchy;
mod profile;
mod validation;

pub use hierarchy::*;
pub use profile::*;
pub use validation::*;

/// Typed partial update: every `Some` field replaces the stored value, every
/// `None` field leaves it untouched.
pub trait Patch<R> {
    fn is_empty(&self) -> bool;
    fn apply_to(&self, record: &mut R);
}

#[cfg(test)]
mod tests;
