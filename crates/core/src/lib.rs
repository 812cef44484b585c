#![forbid(unsafe_code)]

pub mod model;
pub mod tree;

pub mod ids {
    use serde::{Deserialize, Serialize};

    macro_rules! record_id {
        ($name:ident) => {
            #[derive(
                Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(i64);

            impl $name {
                pub const fn new(value: i64) -> Self {
                    Self(value)
                }

                pub const fn get(self) -> i64 {
                    self.0
                }
            }

            impl From<$name> for i64 {
                fn from(value: $name) -> Self {
                    value.0
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        };
    }

    record_id!(ProfileId);
    record_id!(CollectionId);
    record_id!(FolderId);
    record_id!(RequestId);
}

pub use model::*;
pub use tree::*;
