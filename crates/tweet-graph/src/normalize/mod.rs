//! Response normalization.
//!
//! Turns raw v2 response pages into tweet, user, media and referenced-tweet
//! tables, and derives the user-to-user interaction edges.

mod classifier;
mod normalizer;
mod tables;

pub use classifier::{classify, AuthorIndex, AuthorLookup};
pub use normalizer::{interaction_edges, normalize, MissingSection, NormalizedPage};
pub(crate) use normalizer::decode_users;
pub use tables::{TableCounts, Tables};
