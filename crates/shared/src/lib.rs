//! Wire types and identifiers shared by the capsule client crates.

pub mod domain;
pub mod error;
pub mod protocol;
